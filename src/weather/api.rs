//! weatherapi.com `current.json` client (requires `full` feature).

use super::{WeatherProvider, WeatherReading};
use crate::config::WeatherConfig;
use crate::error::WeatherError;
use crate::Result;
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Deserialize)]
struct CurrentResponse {
    location: Location,
    current: Current,
}

#[derive(Deserialize)]
struct Location {
    name: String,
}

#[derive(Deserialize)]
struct Current {
    temp_c: f64,
    condition: ConditionBody,
}

#[derive(Deserialize)]
struct ConditionBody {
    text: String,
}

impl From<CurrentResponse> for WeatherReading {
    fn from(r: CurrentResponse) -> Self {
        Self {
            condition_text: r.current.condition.text,
            location_name: r.location.name,
            temperature_c: r.current.temp_c,
        }
    }
}

/// HTTP weather provider.
pub struct WeatherApiClient {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl WeatherApiClient {
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(WeatherError::MissingApiKey)?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| WeatherError::Request(e.to_string()))?;
        Ok(Self {
            http,
            api_url: config.api_url.clone(),
            api_key,
        })
    }

    fn url(&self, location_query: &str) -> String {
        format!(
            "{}?q={}&key={}&aqi=no",
            self.api_url, location_query, self.api_key
        )
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiClient {
    async fn query(&self, location_query: &str) -> Result<WeatherReading> {
        tracing::debug!(location = location_query, "weather request");
        let response = self
            .http
            .get(self.url(location_query))
            .send()
            .await
            .map_err(|e| WeatherError::Request(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Status(status.as_u16()).into());
        }
        let body: CurrentResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Malformed(e.to_string()))?;
        Ok(body.into())
    }
}
