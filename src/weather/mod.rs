//! Weather lookup seam and condition classification.

#[cfg(feature = "full")]
mod api;
mod fixed;

#[cfg(feature = "full")]
pub use api::WeatherApiClient;
pub use fixed::StaticWeather;

use crate::types::Rgb;
use crate::Result;
use async_trait::async_trait;

/// Reply sent when a lookup fails.
pub const ERROR_REPLY: &str = "Weather lookup failed";

/// Current conditions for one location.
#[derive(Clone, Debug, PartialEq)]
pub struct WeatherReading {
    pub condition_text: String,
    pub location_name: String,
    pub temperature_c: f64,
}

/// Async weather source.
#[async_trait]
pub trait WeatherProvider: Send + Sync {
    /// Look up current conditions. `location_query` is already URL-escaped.
    async fn query(&self, location_query: &str) -> Result<WeatherReading>;
}

/// Coarse condition derived from the free-text description.
///
/// Matching is a case-insensitive substring search in a fixed priority
/// order: rain, then sunny/clear, then cloudy.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Condition {
    Rain,
    Sunny,
    Cloudy,
    Other,
}

impl Condition {
    pub fn classify(condition_text: &str) -> Self {
        let text = condition_text.to_lowercase();
        if text.contains("rain") {
            Self::Rain
        } else if text.contains("sunny") || text.contains("clear") {
            Self::Sunny
        } else if text.contains("cloudy") {
            Self::Cloudy
        } else {
            Self::Other
        }
    }

    /// LED color for the condition; `Other` clears the ring.
    pub fn color(self) -> Rgb {
        match self {
            Self::Rain => Rgb::RAIN,
            Self::Sunny => Rgb::SUNNY,
            Self::Cloudy => Rgb::CLOUDY,
            Self::Other => Rgb::OFF,
        }
    }

    pub fn mist(self) -> bool {
        self == Self::Rain
    }
}

/// Percent-escape a free-text location so it can go in a query string
/// as a single value. Unreserved characters pass through.
pub fn normalize_location(raw: &str) -> String {
    use std::fmt::Write;

    let mut out = String::with_capacity(raw.len());
    for b in raw.trim().bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' | b',' => {
                out.push(b as char)
            }
            _ => {
                let _ = write!(out, "%{b:02X}");
            }
        }
    }
    out
}

/// `"<location>: <condition>, <temp>°C"` with the condition lowercased.
pub fn format_report(reading: &WeatherReading) -> String {
    format!(
        "{}: {}, {}°C",
        reading.location_name,
        reading.condition_text.to_lowercase(),
        reading.temperature_c
    )
}
