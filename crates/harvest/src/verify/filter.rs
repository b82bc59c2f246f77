//! Which files a verification run looks at.

use derive_more::{Display, Error};
use podanchor_storage::encode_name;
use time::Date;
use time::macros::format_description;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// One file, picked by date (and time, for graph files)
    Single,
    /// Every file in the device folder
    All,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    /// Daily tabular files
    Csv,
    /// Per-observation graph documents
    Ttl,
}

impl FileFormat {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Ttl => "TTL",
        }
    }
}

/// A verification request that cannot be carried out as given.
///
/// The display form is the exact message shown to the user.
#[derive(Debug, Display, Error, Clone, Copy, PartialEq, Eq)]
pub enum UsageError {
    #[display("Error - Please enter a date (YYYY-MM-DD) and time (HH:MM:SS) to verify a single file.")]
    MissingDateAndTime,
    #[display("Error - Please enter a date (YYYY-MM-DD) to verify a single file.")]
    MissingDate,
    #[display("Error - Please enter a time (HH:MM:SS) to verify a single file.")]
    MissingTime,
    #[display("Error - Date is not in the format YYYY-MM-DD")]
    MalformedDate,
    #[display("Error - Time is not in the format HH:MM:SS")]
    MalformedTime,
}

/// A verification request as given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub mode: Mode,
    pub format: FileFormat,
    pub date: Option<String>,
    pub time: Option<String>,
}

/// A validated [`Query`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    format: FileFormat,
    single: Option<Single>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Single {
    date: String,
    time: Option<String>,
}

fn is_date(value: &str) -> bool {
    Date::parse(value, format_description!("[year]-[month]-[day]")).is_ok()
}

fn is_time(value: &str) -> bool {
    time::Time::parse(value, format_description!("[hour]:[minute]:[second]")).is_ok()
}

impl Query {
    /// Check the filters before anything is fetched.
    ///
    /// Checks run in a fixed order (missing values first, then formats) so a
    /// request with several problems always reports the same one. Tabular
    /// files are one per day, so they only need a date.
    pub fn validate(&self) -> Result<Selection, UsageError> {
        let single = match self.mode {
            Mode::All => None,
            Mode::Single => {
                let needs_time = self.format == FileFormat::Ttl;
                let (date, time) = match (&self.date, &self.time) {
                    (None, None) if needs_time => return Err(UsageError::MissingDateAndTime),
                    (None, _) => return Err(UsageError::MissingDate),
                    (Some(_), None) if needs_time => return Err(UsageError::MissingTime),
                    (Some(date), time) => (date, time),
                };
                if !is_date(date) {
                    return Err(UsageError::MalformedDate);
                }
                let time = match needs_time {
                    true => time.clone(),
                    false => None,
                };
                if let Some(time) = &time
                    && !is_time(time)
                {
                    return Err(UsageError::MalformedTime);
                }
                Some(Single {
                    date: date.clone(),
                    time,
                })
            },
        };
        Ok(Selection {
            format: self.format,
            single,
        })
    }
}

impl Selection {
    pub fn format(&self) -> FileFormat {
        self.format
    }

    /// Whether a file, by its name as the pod lists it (escaped), is selected.
    pub fn matches(&self, remote_name: &str) -> bool {
        match &self.single {
            None => true,
            Some(Single { date, time }) => {
                remote_name.contains(date.as_str())
                    && time.as_deref().is_none_or(|time| remote_name.contains(&encode_name(time)))
            },
        }
    }

    /// What to tell the user when nothing was selected.
    pub fn empty_summary(&self) -> String {
        match (&self.single, self.format) {
            (Some(Single { date, time: Some(time) }), FileFormat::Ttl) => format!("No TTL files exist for: {date} {time}"),
            (Some(Single { date, .. }), FileFormat::Ttl) => format!("No TTL files exist for: {date}"),
            (Some(Single { date, .. }), FileFormat::Csv) => format!("No CSV file exists for: {date}"),
            (None, format) => format!("No {} files exist in this AQM folder", format.label()),
        }
    }
}
