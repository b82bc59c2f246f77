//! Turtle observation documents.
//!
//! One document per reading, using the SOSA vocabulary:
//!
//! ```turtle
//! @prefix sosa: <http://www.w3.org/ns/sosa/> .
//! @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .
//!
//! <> sosa:resultTime "2022-03-21T11:19:47.000000"^^xsd:dateTime .
//!
//! [] sosa:Sensor "o3" ;
//!     sosa:hasSimpleResult "1.0" .
//! ```

use podanchor_sensor::Channels;
use serde_json::Number;
use std::fmt::Write;
use time::PrimitiveDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

const RESULT_TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:6]");

/// Render an observation taken at `at`.
///
/// `channels` is the snapshot header and `values` the snapshot data; one
/// node is emitted per pair, in header order.
pub fn observation(at: PrimitiveDateTime, channels: &Channels, values: &[Number]) -> String {
    let mut document = String::from("@prefix sosa: <http://www.w3.org/ns/sosa/> .\n");
    document.push_str("@prefix xsd: <http://www.w3.org/2001/XMLSchema#> .\n\n");
    // Writing into a String cannot fail.
    let result_time = at.format(RESULT_TIME_FORMAT).unwrap_or_default();
    let _ = writeln!(document, "<> sosa:resultTime \"{result_time}\"^^xsd:dateTime .");
    for (channel, value) in channels.names().iter().zip(values) {
        let _ = write!(
            document,
            "\n[] sosa:Sensor \"{}\" ;\n    sosa:hasSimpleResult \"{value}\" .\n",
            escape(channel)
        );
    }
    document
}

/// Escape a Turtle short string literal.
fn escape(literal: &str) -> String {
    let mut escaped = String::with_capacity(literal.len());
    for c in literal.chars() {
        match c {
            '"' => escaped.push_str("\\\""),
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            other => escaped.push(other),
        }
    }
    escaped
}
