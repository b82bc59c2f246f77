//! Sensor devices and the readings they report.
//!
//! A [`Sensor`] answers "what are the latest readings?" with a
//! [`PropertySet`]. The first successful answer of a run fixes its
//! [`Channels`]; the [`format`] module turns aligned values into tabular text.

pub mod error;
pub mod format;
#[cfg(feature = "http")]
mod http;
mod property;
pub mod simulated;

#[cfg(feature = "http")]
pub use crate::http::HttpSensor;
pub use crate::property::{Channels, PropertySet};
pub use crate::simulated::SimulatedSensor;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait Sensor: Send + Sync {
    /// Name of the device (used for logging only).
    fn name(&self) -> &str;

    /// Fetch the latest reading set, or fail.
    async fn fetch(&self) -> error::Result<PropertySet>;
}

pub type SensorHandle = Arc<dyn Sensor + Send + Sync>;
