//! Reading formatter.
//!
//! Turns aligned channel values into comma separated text. Values are written
//! with their JSON textual form, so `1.0` stays `1.0` and `7` stays `7`. There
//! is no quoting or escaping: channel names and numbers never need it.

use crate::Channels;
use serde_json::Number;
use time::PrimitiveDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

/// `YYYY-MM-DD`
pub const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
/// `HH:MM:SS`
pub const TIME_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]:[second]");

/// Header of a daily tabular file: `date,time,` followed by the channel names.
pub fn tabular_header(channels: &Channels) -> String {
    std::iter::once("date")
        .chain(std::iter::once("time"))
        .chain(channels.names().iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(",")
}

/// Data row of a daily tabular file, stamped with `at`.
pub fn tabular_row(at: PrimitiveDateTime, values: &[Number]) -> String {
    let mut fields = vec![format_date(at), format_time(at)];
    fields.extend(values.iter().map(Number::to_string));
    fields.join(",")
}

pub fn format_date(at: PrimitiveDateTime) -> String {
    // Formatting with a static description into a String cannot fail.
    at.format(DATE_FORMAT).unwrap_or_default()
}

pub fn format_time(at: PrimitiveDateTime) -> String {
    at.format(TIME_FORMAT).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PropertySet;
    use rstest::rstest;
    use time::macros::datetime;

    fn reading() -> (Channels, Vec<Number>) {
        let properties = PropertySet::from_json(br#"{"o3": 1.0, "no2": 2.0}"#).unwrap();
        let channels = Channels::resolve(&properties);
        let values = channels.align(&properties).unwrap();
        (channels, values)
    }

    #[test]
    fn test_tabular() {
        let (channels, values) = reading();
        assert_eq!(tabular_header(&channels), "date,time,o3,no2");
        assert_eq!(tabular_row(datetime!(2022-03-21 11:19:47), &values), "2022-03-21,11:19:47,1.0,2.0");
    }

    #[rstest]
    #[case::midnight(datetime!(2022-01-01 0:00:00), "2022-01-01", "00:00:00")]
    #[case::padded(datetime!(2022-03-05 7:08:09.5), "2022-03-05", "07:08:09")]
    #[case::last_second(datetime!(2022-12-31 23:59:59.999), "2022-12-31", "23:59:59")]
    fn test_date_time(#[case] at: PrimitiveDateTime, #[case] date: &str, #[case] time: &str) {
        assert_eq!(format_date(at), date);
        assert_eq!(format_time(at), time);
    }

    #[test]
    fn test_integers_stay_integers() {
        let properties = PropertySet::from_json(br#"{"humidity": 41, "temperature": -3.25}"#).unwrap();
        let channels = Channels::resolve(&properties);
        let row = tabular_row(datetime!(2022-03-21 11:19:47), &channels.align(&properties).unwrap());
        assert_eq!(row, "2022-03-21,11:19:47,41,-3.25");
    }
}
