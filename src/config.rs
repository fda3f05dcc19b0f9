//! Client configuration.
//!
//! Defaults match the lamp's factory setup. [`Config::from_env`] overlays
//! `LAMP_*` and `WEATHER_*` environment variables; the struct also
//! deserializes with serde (durations in milliseconds).

use crate::error::Error;
use crate::socket::DEFAULT_MAX_FRAME_SIZE;
use crate::types::DeviceId;
use crate::Result;
use serde::{Deserialize, Deserializer};
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "192.168.200.169";
pub const DEFAULT_PORT: u16 = 8765;
pub const DEFAULT_DEVICE_ID: &str = "LAMPE123";
pub const DEFAULT_WEATHER_API_URL: &str = "http://api.weatherapi.com/v1/current.json";

fn millis<'de, D>(d: D) -> std::result::Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    u64::deserialize(d).map(Duration::from_millis)
}

/// Connection and behavior settings for [`Client`](crate::Client).
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub path: String,
    pub device_id: DeviceId,
    /// Fixed pause between session attempts.
    #[serde(deserialize_with = "millis")]
    pub retry_delay: Duration,
    /// How often the button is read while waiting for frames.
    #[serde(deserialize_with = "millis")]
    pub poll_interval: Duration,
    #[serde(deserialize_with = "millis")]
    pub handshake_timeout: Duration,
    /// Largest inbound payload accepted.
    pub max_frame_size: usize,
    pub weather: WeatherConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            path: "/".to_string(),
            device_id: DEFAULT_DEVICE_ID.to_string(),
            retry_delay: Duration::from_secs(5),
            poll_interval: Duration::from_millis(50),
            handshake_timeout: Duration::from_secs(10),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            weather: WeatherConfig::default(),
        }
    }
}

/// Weather HTTP API settings.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    #[serde(deserialize_with = "millis")]
    pub timeout: Duration,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_WEATHER_API_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Defaults overlaid with environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overlaid with values from `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(v) = lookup("LAMP_HOST") {
            config.host = v;
        }
        if let Some(v) = parse(&lookup, "LAMP_PORT")? {
            config.port = v;
        }
        if let Some(v) = lookup("LAMP_PATH") {
            config.path = v;
        }
        if let Some(v) = lookup("LAMP_DEVICE_ID") {
            config.device_id = v;
        }
        if let Some(ms) = parse(&lookup, "LAMP_RETRY_DELAY_MS")? {
            config.retry_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = parse(&lookup, "LAMP_POLL_INTERVAL_MS")? {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(v) = parse(&lookup, "LAMP_MAX_FRAME_SIZE")? {
            config.max_frame_size = v;
        }
        if let Some(v) = lookup("WEATHER_API_URL") {
            config.weather.api_url = v;
        }
        if let Some(v) = lookup("WEATHER_API_KEY") {
            config.weather.api_key = Some(v);
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject settings the session cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(Error::Config("host is empty".into()));
        }
        if !self.path.starts_with('/') {
            return Err(Error::Config(format!("path {:?} must start with '/'", self.path)));
        }
        if self.poll_interval.is_zero() {
            return Err(Error::Config("poll interval must be non-zero".into()));
        }
        Ok(())
    }
}

fn parse<F, T>(lookup: &F, name: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(name)
        .map(|raw| {
            raw.trim()
                .parse()
                .map_err(|e| Error::Config(format!("{name}={raw:?}: {e}")))
        })
        .transpose()
}
