//! Run the lamp client without hardware: actuator calls are logged, the
//! button is never pressed.
//!
//! Run with: `cargo run --example lamp`
//! (add `--features full` and set `WEATHER_API_KEY` for live weather)

use std::sync::Arc;
use weather_lamp::device::{RecordingActuators, ScriptedButton};
use weather_lamp::{Client, Config, Event, WeatherProvider};

#[cfg(feature = "full")]
fn weather(config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    Ok(Arc::new(weather_lamp::weather::WeatherApiClient::new(
        &config.weather,
    )?))
}

#[cfg(not(feature = "full"))]
fn weather(_config: &Config) -> anyhow::Result<Arc<dyn WeatherProvider>> {
    Ok(Arc::new(weather_lamp::weather::StaticWeather::new(
        weather_lamp::WeatherReading {
            condition_text: "Partly cloudy".into(),
            location_name: "San Francisco".into(),
            temperature_c: 16.0,
        },
    )))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,weather_lamp=debug".into()),
        )
        .try_init()
        .ok();

    let config = Config::from_env()?;
    let weather = weather(&config)?;
    println!(
        "Connecting to ws://{}:{}{} as {}",
        config.host, config.port, config.path, config.device_id
    );

    let mut client = Client::new(
        config,
        RecordingActuators::new(),
        ScriptedButton::released(),
        weather,
    );
    client.add_event_handler(|evt| match evt {
        Event::Registered { id } => println!("[Event] Registered as {}", id),
        Event::PowerChanged { powered, source } => {
            println!("[Event] Power {} ({:?})", if powered { "on" } else { "off" }, source)
        }
        Event::Reply { text } => println!("[Event] Replied: {}", text),
        Event::Disconnected { reason } => println!("[Event] Disconnected: {}", reason),
        _ => {}
    });

    client.run().await;
    Ok(())
}
