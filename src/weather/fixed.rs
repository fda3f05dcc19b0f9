use super::{WeatherProvider, WeatherReading};
use crate::error::WeatherError;
use crate::Result;
use async_trait::async_trait;
use std::sync::Mutex;

/// Provider that always answers with the same reading, or always fails.
/// Records the queries it receives.
#[derive(Debug, Default)]
pub struct StaticWeather {
    reading: Option<WeatherReading>,
    queries: Mutex<Vec<String>>,
}

impl StaticWeather {
    pub fn new(reading: WeatherReading) -> Self {
        Self {
            reading: Some(reading),
            queries: Mutex::new(Vec::new()),
        }
    }

    /// A provider whose every query fails.
    pub fn failing() -> Self {
        Self::default()
    }

    /// Queries received so far.
    pub fn queries(&self) -> Vec<String> {
        self.queries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl WeatherProvider for StaticWeather {
    async fn query(&self, location_query: &str) -> Result<WeatherReading> {
        self.queries
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(location_query.to_string());
        self.reading
            .clone()
            .ok_or_else(|| WeatherError::Request("no reading configured".into()).into())
    }
}
