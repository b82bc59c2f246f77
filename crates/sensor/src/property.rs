//! Property sets and channel alignment.
//!
//! A device answers a property query with a flat JSON object mapping channel
//! names to numbers. The order of the keys in that object is the order the
//! channels are reported in for the rest of the run.

use crate::error::{ErrorKind, Result};
use serde_json::{Map, Number, Value};
use std::fmt;

/// Ordered (channel, value) pairs from a single fetch.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PropertySet(Vec<(String, Number)>);

impl PropertySet {
    pub fn new(properties: impl IntoIterator<Item = (impl Into<String>, impl Into<Number>)>) -> Self {
        Self(properties.into_iter().map(|(name, value)| (name.into(), value.into())).collect())
    }

    /// Parse a device response body, keeping the key order of the document.
    pub fn from_json(body: &[u8]) -> Result<Self> {
        let object: Map<String, Value> = serde_json::from_slice(body)
            .map_err(|e| ErrorKind::InvalidResponse(format!("expected a JSON object of numbers: {e}")))?;
        let mut properties = Vec::with_capacity(object.len());
        for (name, value) in object {
            match value {
                Value::Number(number) => properties.push((name, number)),
                other => exn::bail!(ErrorKind::InvalidResponse(format!("channel {name} is not numeric: {other}"))),
            }
        }
        Ok(Self(properties))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|(name, _)| name.as_str())
    }

    pub fn get(&self, channel: &str) -> Option<&Number> {
        self.0.iter().find(|(name, _)| name == channel).map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// The channel names a run reports, in header order.
///
/// Resolved once from the first successful fetch, then every later property
/// set is [aligned](Channels::align) against it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channels(Vec<String>);

impl Channels {
    pub fn resolve(properties: &PropertySet) -> Self {
        Self(properties.names().map(str::to_string).collect())
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    /// Values of `properties` in header order.
    ///
    /// A response with the same channels in a different order is re-ordered.
    /// Any missing, extra or duplicated channel is a
    /// [`ChannelMismatch`](ErrorKind::ChannelMismatch).
    pub fn align(&self, properties: &PropertySet) -> Result<Vec<Number>> {
        let mismatch = || ErrorKind::ChannelMismatch {
            expected: self.to_string(),
            found: properties.names().collect::<Vec<_>>().join(","),
        };
        if properties.len() != self.0.len() {
            exn::bail!(mismatch());
        }
        let mut values = Vec::with_capacity(self.0.len());
        for channel in &self.0 {
            match properties.get(channel) {
                Some(value) => values.push(value.clone()),
                None => exn::bail!(mismatch()),
            }
        }
        Ok(values)
    }
}

impl fmt::Display for Channels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn number(value: f64) -> Number {
        Number::from_f64(value).unwrap()
    }

    #[test]
    fn test_from_json_keeps_document_order() {
        let properties = PropertySet::from_json(br#"{"pm25": 3.5, "o3": 1.0, "no2": 7}"#).unwrap();
        assert_eq!(properties.names().collect::<Vec<_>>(), vec!["pm25", "o3", "no2"]);
        assert_eq!(properties.get("o3").unwrap().to_string(), "1.0");
        assert_eq!(properties.get("no2").unwrap().to_string(), "7");
    }

    #[rstest]
    #[case::not_an_object(br#"[1, 2]"#.as_slice())]
    #[case::string_value(br#"{"o3": "high"}"#.as_slice())]
    #[case::nested(br#"{"o3": {"value": 1.0}}"#.as_slice())]
    #[case::garbage(b"<html>".as_slice())]
    fn test_from_json_rejects(#[case] body: &[u8]) {
        let err = PropertySet::from_json(body).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidResponse(_)));
    }

    #[test]
    fn test_align_reorders() {
        let channels = Channels::resolve(&PropertySet::new([("o3", number(1.0)), ("no2", number(2.0))]));
        let values = channels.align(&PropertySet::new([("no2", number(4.0)), ("o3", number(3.0))])).unwrap();
        assert_eq!(values, vec![number(3.0), number(4.0)]);
    }

    #[rstest]
    #[case::missing(vec![("o3", 1.0)])]
    #[case::extra(vec![("o3", 1.0), ("no2", 2.0), ("pm10", 3.0)])]
    #[case::renamed(vec![("o3", 1.0), ("so2", 2.0)])]
    fn test_align_mismatch(#[case] found: Vec<(&str, f64)>) {
        let channels = Channels::resolve(&PropertySet::new([("o3", number(1.0)), ("no2", number(2.0))]));
        let found = PropertySet::new(found.into_iter().map(|(name, value)| (name, number(value))));
        let err = channels.align(&found).unwrap_err();
        assert!(matches!(&*err, ErrorKind::ChannelMismatch { .. }));
    }

    #[test]
    fn test_channels_display() {
        let channels = Channels::resolve(&PropertySet::new([("o3", 1), ("no2", 2)]));
        assert_eq!(channels.to_string(), "o3,no2");
    }
}
