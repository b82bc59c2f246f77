//! Simulated air-quality monitor.
//!
//! Stands in for a real device when none is available: every fetch produces a
//! fresh random reading for each pollutant and environmental channel, plus the
//! fixed location the monitor was configured with.

use crate::error::{ErrorKind, Result};
use crate::{PropertySet, Sensor};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::Number;
use tokio::sync::Mutex;

/// Channels reported by the simulated monitor, in response order.
pub const CHANNELS: [&str; 8] = ["o3", "no2", "pm25", "pm10", "humidity", "temperature", "latitude", "longitude"];

/// WHO air quality guideline limits for the pollutant channels.
pub const WHO_LIMITS: [(&str, f64); 4] = [("o3", 60.0), ("no2", 10.0), ("pm25", 5.0), ("pm10", 15.0)];

/// A pollutant reading above its WHO guideline limit.
#[derive(Debug, Clone, PartialEq)]
pub struct Exceedance {
    pub channel: &'static str,
    pub limit: f64,
    pub reading: f64,
}
impl Exceedance {
    /// Event name as the monitor would publish it, e.g. `o3LevelExceedsWHOGuidelines`.
    pub fn event(&self) -> String {
        format!("{}LevelExceedsWHOGuidelines", self.channel)
    }
}

/// Every pollutant in `properties` that exceeds its guideline limit.
pub fn exceedances(properties: &PropertySet) -> Vec<Exceedance> {
    WHO_LIMITS
        .iter()
        .filter_map(|&(channel, limit)| {
            let reading = properties.get(channel)?.as_f64()?;
            (reading > limit).then_some(Exceedance { channel, limit, reading })
        })
        .collect()
}

pub struct SimulatedSensor {
    latitude: f64,
    longitude: f64,
    rng: Mutex<StdRng>,
}

impl SimulatedSensor {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self::with_rng(latitude, longitude, StdRng::from_entropy())
    }

    /// Deterministic readings, for tests and reproducible demos.
    pub fn seeded(latitude: f64, longitude: f64, seed: u64) -> Self {
        Self::with_rng(latitude, longitude, StdRng::seed_from_u64(seed))
    }

    fn with_rng(latitude: f64, longitude: f64, rng: StdRng) -> Self {
        Self {
            latitude,
            longitude,
            rng: Mutex::new(rng),
        }
    }

    /// `|70 * r1 * (r2 - 0.5)|`, so readings land in `[0, 35)`.
    fn next_reading(rng: &mut StdRng) -> f64 {
        let scale: f64 = rng.gen_range(0.0..1.0);
        let offset: f64 = rng.gen_range(0.0..1.0);
        (70.0 * scale * (offset - 0.5)).abs()
    }
}

fn number(channel: &str, value: f64) -> Result<Number> {
    Ok(Number::from_f64(value).ok_or_else(|| ErrorKind::InvalidResponse(format!("channel {channel} is not finite")))?)
}

#[async_trait]
impl Sensor for SimulatedSensor {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn fetch(&self) -> Result<PropertySet> {
        let mut rng = self.rng.lock().await;
        let mut properties = Vec::with_capacity(CHANNELS.len());
        for channel in CHANNELS {
            let value = match channel {
                "latitude" => self.latitude,
                "longitude" => self.longitude,
                _ => Self::next_reading(&mut rng),
            };
            properties.push((channel, number(channel, value)?));
        }
        let properties = PropertySet::new(properties);
        for exceedance in exceedances(&properties) {
            tracing::warn!(
                event = %exceedance.event(),
                channel = exceedance.channel,
                limit = exceedance.limit,
                reading = exceedance.reading,
                "Reading exceeds WHO guideline"
            );
        }
        Ok(properties)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_channels_and_location() {
        let sensor = SimulatedSensor::seeded(51.5, -0.12, 7);
        let properties = sensor.fetch().await.unwrap();
        assert_eq!(properties.names().collect::<Vec<_>>(), CHANNELS.to_vec());
        assert_eq!(properties.get("latitude").unwrap().as_f64(), Some(51.5));
        assert_eq!(properties.get("longitude").unwrap().as_f64(), Some(-0.12));
    }

    #[tokio::test]
    async fn test_readings_in_range() {
        let sensor = SimulatedSensor::seeded(0.0, 0.0, 42);
        for _ in 0..50 {
            let properties = sensor.fetch().await.unwrap();
            for channel in &CHANNELS[..6] {
                let value = properties.get(channel).unwrap().as_f64().unwrap();
                assert!((0.0..35.0).contains(&value), "{channel} out of range: {value}");
            }
        }
    }

    #[tokio::test]
    async fn test_seeded_is_deterministic() {
        let first = SimulatedSensor::seeded(0.0, 0.0, 3).fetch().await.unwrap();
        let second = SimulatedSensor::seeded(0.0, 0.0, 3).fetch().await.unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_exceedances() {
        let properties = PropertySet::new([
            ("o3", Number::from_f64(61.0).unwrap()),
            ("no2", Number::from_f64(10.0).unwrap()),
            ("pm25", Number::from_f64(5.5).unwrap()),
            ("pm10", Number::from_f64(1.0).unwrap()),
        ]);
        let found = exceedances(&properties);
        assert_eq!(found.iter().map(Exceedance::event).collect::<Vec<_>>(), vec![
            "o3LevelExceedsWHOGuidelines",
            "pm25LevelExceedsWHOGuidelines"
        ]);
    }
}
