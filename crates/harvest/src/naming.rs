//! File names of harvested data.
//!
//! Names here are the decoded, human-readable form. Pods store them
//! URL-escaped (see [`encode_name`](podanchor_storage::encode_name)).

use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{Date, PrimitiveDateTime};

pub const TABULAR_EXTENSION: &str = "csv";
pub const GRAPH_EXTENSION: &str = "ttl";

const SNAPSHOT_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:6]");

/// `YYYY-MM-DD.csv`
pub fn daily_file_name(date: Date) -> String {
    format!("{}.{TABULAR_EXTENSION}", date)
}

/// `YYYY-MM-DD HH:MM:SS.ffffff.ttl`, always with six fractional digits.
pub fn snapshot_file_name(at: PrimitiveDateTime) -> String {
    // Formatting with a static description into a String cannot fail.
    format!("{}.{GRAPH_EXTENSION}", at.format(SNAPSHOT_FORMAT).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use podanchor_storage::encode_name;
    use rstest::rstest;
    use time::macros::{date, datetime};

    #[test]
    fn test_daily_file_name() {
        assert_eq!(daily_file_name(date!(2022-03-21)), "2022-03-21.csv");
        assert_eq!(daily_file_name(date!(2022-01-05)), "2022-01-05.csv");
    }

    #[rstest]
    #[case::whole_second(datetime!(2022-03-21 11:19:47), "2022-03-21 11:19:47.000000.ttl")]
    #[case::micros(datetime!(2022-03-21 11:19:47.123456), "2022-03-21 11:19:47.123456.ttl")]
    #[case::truncates_nanos(datetime!(2022-03-21 1:02:03.123456789), "2022-03-21 01:02:03.123456.ttl")]
    fn test_snapshot_file_name(#[case] at: PrimitiveDateTime, #[case] expected: &str) {
        assert_eq!(snapshot_file_name(at), expected);
    }

    #[test]
    fn test_snapshot_remote_name() {
        let name = snapshot_file_name(datetime!(2022-03-21 11:19:47));
        assert_eq!(encode_name(&name), "2022-03-21%2011%3A19%3A47.000000.ttl");
    }
}
