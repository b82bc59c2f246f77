//! Resource name escaping.
//!
//! Pods address every resource by URL, so names containing spaces or colons
//! (timestamps, mostly) are stored and listed in their percent-encoded form.
//! Everything that is not an unreserved URL character is escaped.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

const RESOURCE_NAME: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Escapes a human-readable name into the form a pod stores and lists.
///
/// ```
/// use podanchor_storage::encode_name;
/// assert_eq!(encode_name("2022-03-21 11:19:47.ttl"), "2022-03-21%2011%3A19%3A47.ttl");
/// assert_eq!(encode_name("2022-03-21.csv"), "2022-03-21.csv");
/// ```
pub fn encode(name: &str) -> String {
    utf8_percent_encode(name, RESOURCE_NAME).to_string()
}

/// Recovers the human-readable form of a stored name. Invalid UTF-8 sequences
/// are replaced rather than rejected.
pub fn decode(name: &str) -> String {
    percent_decode_str(name).decode_utf8_lossy().into_owned()
}
