//! Networked sensor device.

use crate::error::{ErrorKind, Result};
use crate::{PropertySet, Sensor};
use async_trait::async_trait;
use exn::ResultExt;
use reqwest::Client;
use std::time::Duration;

/// A device exposing its latest readings at `{url}:{port}/properties`.
#[derive(Debug, Clone)]
pub struct HttpSensor {
    client: Client,
    endpoint: String,
}

impl HttpSensor {
    pub fn new(url: &str, port: u16, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .or_raise(|| ErrorKind::Unreachable("unable to construct HTTP client".to_string()))?;
        Ok(Self {
            client,
            endpoint: format!("{}:{port}/properties", url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Sensor for HttpSensor {
    fn name(&self) -> &str {
        &self.endpoint
    }

    async fn fetch(&self) -> Result<PropertySet> {
        let unreachable = |e: reqwest::Error| ErrorKind::Unreachable(e.to_string());
        let response = self.client.get(&self.endpoint).send().await.map_err(unreachable)?;
        let body = response.error_for_status().map_err(unreachable)?.bytes().await.map_err(unreachable)?;
        tracing::trace!(endpoint = %self.endpoint, bytes = body.len(), "Fetched sensor properties");
        PropertySet::from_json(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint() {
        let sensor = HttpSensor::new("http://localhost/", 8888, Duration::from_secs(5)).unwrap();
        assert_eq!(sensor.endpoint(), "http://localhost:8888/properties");
    }
}
