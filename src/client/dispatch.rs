//! Inbound command handling.

use crate::device::{Actuators, DeviceState};
use crate::error::CommandError;
use crate::transport::Transport;
use crate::weather::{format_report, normalize_location, Condition, WeatherProvider, ERROR_REPLY};
use crate::Result;
use serde::Deserialize;

/// A classified inbound message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// No `action` field: registration acknowledgement or other info.
    RegisterAck,
    PowerOn,
    PowerOff,
    SetLocation(String),
    Unrecognized(String),
}

#[derive(Deserialize)]
struct RawCommand {
    action: Option<String>,
    /// Only `ville` reads it; other actions accept any shape.
    value: Option<serde_json::Value>,
}

impl Command {
    pub fn parse(raw: &str) -> std::result::Result<Self, CommandError> {
        let cmd: RawCommand = serde_json::from_str(raw)?;
        let Some(action) = cmd.action else {
            return Ok(Self::RegisterAck);
        };
        Ok(match action.as_str() {
            "on" => Self::PowerOn,
            "off" => Self::PowerOff,
            "ville" => match cmd.value {
                Some(serde_json::Value::String(location)) => Self::SetLocation(location),
                _ => return Err(CommandError::MissingValue(action)),
            },
            _ => Self::Unrecognized(action),
        })
    }
}

/// What a dispatch did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Informational message, nothing to do.
    Ignored,
    /// Dropped because the lamp is off.
    Gated,
    /// Power switched to the given state.
    Power(bool),
    /// Weather applied and this report sent back.
    Reported(String),
    /// Weather lookup failed; the error reply was sent.
    LookupFailed,
    Unrecognized(String),
    Malformed,
}

/// Collaborators a command may touch.
pub struct Dispatcher<'a> {
    pub actuators: &'a mut dyn Actuators,
    pub weather: &'a dyn WeatherProvider,
    pub reply: &'a dyn Transport,
}

impl Dispatcher<'_> {
    /// Apply one raw text message to `state`.
    ///
    /// Malformed input is logged and dropped. The only error is a failed
    /// reply write, which ends the session.
    pub async fn dispatch(&mut self, raw: &str, state: &mut DeviceState) -> Result<Outcome> {
        let command = match Command::parse(raw) {
            Ok(command) => command,
            Err(e) => {
                tracing::warn!(error = %e, payload = raw, "dropping malformed command");
                return Ok(Outcome::Malformed);
            }
        };

        if !state.powered && !matches!(command, Command::PowerOn | Command::RegisterAck) {
            tracing::debug!(?command, "lamp is off, command dropped");
            return Ok(Outcome::Gated);
        }

        match command {
            Command::RegisterAck => {
                tracing::debug!(payload = raw, "informational message");
                Ok(Outcome::Ignored)
            }
            Command::PowerOn => {
                tracing::info!("command: power on");
                state.set_power(true, &mut *self.actuators);
                Ok(Outcome::Power(true))
            }
            Command::PowerOff => {
                tracing::info!("command: power off");
                state.set_power(false, &mut *self.actuators);
                Ok(Outcome::Power(false))
            }
            Command::SetLocation(location) => self.show_weather(&location).await,
            Command::Unrecognized(action) => {
                tracing::warn!(action = %action, "unrecognized action");
                Ok(Outcome::Unrecognized(action))
            }
        }
    }

    async fn show_weather(&mut self, location: &str) -> Result<Outcome> {
        let query = normalize_location(location);
        tracing::info!(location, query = %query, "command: set location");
        match self.weather.query(&query).await {
            Ok(reading) => {
                let condition = Condition::classify(&reading.condition_text);
                tracing::debug!(?condition, text = %reading.condition_text, "weather classified");
                self.actuators.set_mist(condition.mist());
                self.actuators.set_visual(condition.color());
                let report = format_report(&reading);
                self.reply.send(&report).await?;
                Ok(Outcome::Reported(report))
            }
            Err(e) => {
                tracing::warn!(error = %e, query = %query, "weather lookup failed");
                self.reply.send(ERROR_REPLY).await?;
                Ok(Outcome::LookupFailed)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{ActuatorCall, RecordingActuators, ScriptedButton};
    use crate::transport::RecordingTransport;
    use crate::types::{Level, Rgb};
    use crate::weather::{StaticWeather, WeatherReading};

    fn reading(text: &str) -> WeatherReading {
        WeatherReading {
            condition_text: text.into(),
            location_name: "London".into(),
            temperature_c: 12.5,
        }
    }

    struct Harness {
        actuators: RecordingActuators,
        weather: StaticWeather,
        reply: RecordingTransport,
        state: DeviceState,
    }

    impl Harness {
        fn new(weather: StaticWeather) -> Self {
            Self {
                actuators: RecordingActuators::new(),
                weather,
                reply: RecordingTransport::default(),
                state: DeviceState::new(),
            }
        }

        fn powered(weather: StaticWeather) -> Self {
            let mut h = Self::new(weather);
            h.state.powered = true;
            h
        }

        async fn dispatch(&mut self, raw: &str) -> Result<Outcome> {
            let mut actuators = self.actuators.clone();
            let mut d = Dispatcher {
                actuators: &mut actuators,
                weather: &self.weather,
                reply: &self.reply,
            };
            d.dispatch(raw, &mut self.state).await
        }
    }

    #[test]
    fn parse_taxonomy() {
        assert_eq!(Command::parse(r#"{"action":"on"}"#).unwrap(), Command::PowerOn);
        assert_eq!(Command::parse(r#"{"action":"off"}"#).unwrap(), Command::PowerOff);
        assert_eq!(
            Command::parse(r#"{"action":"ville","value":"Paris"}"#).unwrap(),
            Command::SetLocation("Paris".into())
        );
        assert_eq!(
            Command::parse(r#"{"type":"registered","id":"LAMPE123"}"#).unwrap(),
            Command::RegisterAck
        );
        assert_eq!(
            Command::parse(r#"{"action":"dance"}"#).unwrap(),
            Command::Unrecognized("dance".into())
        );
        assert!(matches!(
            Command::parse(r#"{"action":"ville"}"#),
            Err(CommandError::MissingValue(_))
        ));
        assert!(matches!(
            Command::parse(r#"{"action":"ville","value":42}"#),
            Err(CommandError::MissingValue(_))
        ));
        assert!(matches!(Command::parse("not json"), Err(CommandError::Json(_))));
        assert!(matches!(Command::parse("[1,2]"), Err(CommandError::Json(_))));
    }

    #[tokio::test]
    async fn power_commands_ignore_extra_value() {
        for raw in [
            r#"{"action":"on","value":1}"#,
            r#"{"action":"on","value":true}"#,
            r#"{"action":"on","value":{"x":1}}"#,
        ] {
            let mut h = Harness::new(StaticWeather::failing());
            assert_eq!(h.dispatch(raw).await.unwrap(), Outcome::Power(true), "{raw}");
            assert!(h.state.powered);
        }
        assert_eq!(
            Command::parse(r#"{"action":"off","value":[1]}"#).unwrap(),
            Command::PowerOff
        );
    }

    #[tokio::test]
    async fn on_while_off_powers_up_without_reply() {
        let mut h = Harness::new(StaticWeather::failing());
        let outcome = h.dispatch(r#"{"action":"on"}"#).await.unwrap();
        assert_eq!(outcome, Outcome::Power(true));
        assert!(h.state.powered);
        assert_eq!(h.actuators.power_indicator(), Some(true));
        assert_eq!(h.actuators.visual(), Some(Rgb::ON));
        assert!(h.reply.sent().is_empty());
    }

    #[tokio::test]
    async fn location_while_off_is_gated() {
        let mut h = Harness::new(StaticWeather::new(reading("Sunny")));
        let before = h.state;
        let outcome = h
            .dispatch(r#"{"action":"ville","value":"New York"}"#)
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::Gated);
        assert!(h.weather.queries().is_empty());
        assert!(h.reply.sent().is_empty());
        assert!(h.actuators.calls().is_empty());
        assert_eq!(h.state, before);
    }

    #[tokio::test]
    async fn everything_but_on_is_gated_while_off() {
        for raw in [
            r#"{"action":"off"}"#,
            r#"{"action":"ville","value":"Paris"}"#,
            r#"{"action":"ville"}"#,
            r#"{"action":"dance"}"#,
            r#"{"type":"registered"}"#,
            "garbage",
        ] {
            let mut h = Harness::new(StaticWeather::new(reading("Rain")));
            let before = h.state;
            h.dispatch(raw).await.unwrap();
            assert_eq!(h.state, before, "{raw}");
            assert!(h.reply.sent().is_empty(), "{raw}");
            assert!(h.actuators.calls().is_empty(), "{raw}");
        }
    }

    #[tokio::test]
    async fn rain_report_turns_on_mist() {
        let mut h = Harness::powered(StaticWeather::new(reading("Patchy rain possible")));
        let outcome = h
            .dispatch(r#"{"action":"ville","value":"London"}"#)
            .await
            .unwrap();
        assert_eq!(
            outcome,
            Outcome::Reported("London: patchy rain possible, 12.5°C".into())
        );
        assert_eq!(h.actuators.mist(), Some(true));
        assert_eq!(h.actuators.visual(), Some(Rgb::RAIN));
        assert_eq!(h.reply.sent(), vec!["London: patchy rain possible, 12.5°C"]);
    }

    #[tokio::test]
    async fn rain_wins_over_cloudy() {
        let mut h = Harness::powered(StaticWeather::new(reading("Cloudy, light rain shower")));
        h.dispatch(r#"{"action":"ville","value":"London"}"#)
            .await
            .unwrap();
        assert_eq!(h.actuators.visual(), Some(Rgb::RAIN));
        assert_eq!(h.actuators.mist(), Some(true));
    }

    #[tokio::test]
    async fn non_rain_conditions_stop_mist() {
        for (text, color) in [
            ("Sunny", Rgb::SUNNY),
            ("Clear", Rgb::SUNNY),
            ("Partly cloudy", Rgb::CLOUDY),
            ("Fog", Rgb::OFF),
        ] {
            let mut h = Harness::powered(StaticWeather::new(reading(text)));
            h.dispatch(r#"{"action":"ville","value":"London"}"#)
                .await
                .unwrap();
            assert_eq!(h.actuators.visual(), Some(color), "{text}");
            assert_eq!(h.actuators.mist(), Some(false), "{text}");
        }
    }

    #[tokio::test]
    async fn location_is_escaped_for_the_query() {
        let mut h = Harness::powered(StaticWeather::new(reading("Sunny")));
        h.dispatch(r#"{"action":"ville","value":"New York"}"#)
            .await
            .unwrap();
        assert_eq!(h.weather.queries(), vec!["New%20York"]);
    }

    #[tokio::test]
    async fn location_cannot_add_query_parameters() {
        let mut h = Harness::powered(StaticWeather::new(reading("Sunny")));
        h.dispatch(r#"{"action":"ville","value":"Paris&key=x#frag"}"#)
            .await
            .unwrap();
        assert_eq!(h.weather.queries(), vec!["Paris%26key%3Dx%23frag"]);
    }

    #[tokio::test]
    async fn failed_lookup_sends_error_reply() {
        let mut h = Harness::powered(StaticWeather::failing());
        let outcome = h
            .dispatch(r#"{"action":"ville","value":"Atlantis"}"#)
            .await
            .unwrap();
        assert_eq!(outcome, Outcome::LookupFailed);
        assert_eq!(h.reply.sent(), vec![ERROR_REPLY]);
        assert!(h.actuators.calls().is_empty());
    }

    #[tokio::test]
    async fn unrecognized_and_malformed_are_dropped_while_on() {
        let mut h = Harness::powered(StaticWeather::new(reading("Sunny")));
        let before = h.state;
        assert_eq!(
            h.dispatch(r#"{"action":"dance"}"#).await.unwrap(),
            Outcome::Unrecognized("dance".into())
        );
        assert_eq!(h.dispatch("{oops").await.unwrap(), Outcome::Malformed);
        assert_eq!(
            h.dispatch(r#"{"action":"ville","value":7}"#).await.unwrap(),
            Outcome::Malformed
        );
        assert_eq!(h.dispatch(r#"{"type":"registered"}"#).await.unwrap(), Outcome::Ignored);
        assert_eq!(h.state, before);
        assert!(h.reply.sent().is_empty());
        assert!(h.actuators.calls().is_empty());
    }

    #[tokio::test]
    async fn reply_failure_propagates() {
        let mut h = Harness::powered(StaticWeather::new(reading("Sunny")));
        h.reply = RecordingTransport::failing();
        let err = h
            .dispatch(r#"{"action":"ville","value":"London"}"#)
            .await
            .unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn button_and_remote_power_are_identical() {
        let mut remote = Harness::new(StaticWeather::failing());
        remote.dispatch(r#"{"action":"on"}"#).await.unwrap();
        remote.dispatch(r#"{"action":"off"}"#).await.unwrap();

        let mut state = DeviceState::new();
        let mut local = RecordingActuators::new();
        let mut button = ScriptedButton::new([Level::Low, Level::High, Level::Low]);
        for _ in 0..3 {
            state.poll_button(&mut button, &mut local);
        }

        assert_eq!(remote.state.powered, state.powered);
        assert_eq!(remote.actuators.calls(), local.calls());
        assert_eq!(
            local.calls()[..2],
            [ActuatorCall::Visual(Rgb::ON), ActuatorCall::PowerIndicator(true)]
        );
    }
}
