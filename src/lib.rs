//! # weather-lamp
//!
//! Client for an always-connected weather lamp.
//!
//! ## Features
//!
//! - Minimal WebSocket client: upgrade handshake, masked client frames,
//!   7/16/64-bit payload lengths
//! - Registration with the controller and automatic reconnection after a
//!   fixed delay
//! - `on` / `off` / `ville` commands, gated on the lamp's power state
//! - Physical power button with the same effects as the remote commands
//! - Weather lookups mapped to LED colors and the mist maker
//!   (HTTP provider behind the `full` feature)
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use weather_lamp::{device::{RecordingActuators, ScriptedButton}, weather::StaticWeather};
//! use weather_lamp::{Client, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let weather = Arc::new(StaticWeather::failing());
//!     let mut client = Client::new(config, RecordingActuators::new(), ScriptedButton::released(), weather);
//!     client.run().await;
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod device;
pub mod error;
pub mod events;
pub mod socket;
pub mod transport;
pub mod types;
pub mod weather;

pub use client::{Client, Command, Outcome, SessionState};
pub use config::{Config, WeatherConfig};
pub use device::{Actuators, ButtonInput, DeviceState};
pub use error::{Error, Result};
pub use events::{Event, PowerSource};
pub use transport::Transport;
pub use types::{DeviceId, Level, Rgb};
pub use weather::{Condition, WeatherProvider, WeatherReading};
