//! Device state and the actuator/input seams.
//!
//! [`DeviceState`] is owned by the session loop and passed by reference to
//! the dispatcher; nothing else mutates it.

mod memory;

pub use memory::{ActuatorCall, RecordingActuators, ScriptedButton};

use crate::types::{Level, Rgb};

/// Output side of the lamp: LED ring, mist maker, power LED.
pub trait Actuators: Send {
    fn set_visual(&mut self, color: Rgb);
    fn set_mist(&mut self, active: bool);
    fn set_power_indicator(&mut self, active: bool);
}

/// The physical power button.
pub trait ButtonInput: Send {
    fn read_level(&mut self) -> Level;
}

/// Mutable device state for the lifetime of the process.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DeviceState {
    pub powered: bool,
    pub last_button_level: Level,
}

impl Default for DeviceState {
    fn default() -> Self {
        Self {
            powered: false,
            last_button_level: Level::High,
        }
    }
}

impl DeviceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Switch power and drive the matching actuator effects.
    ///
    /// Both the remote `on`/`off` commands and the button go through here,
    /// so they are observably identical.
    pub fn set_power(&mut self, on: bool, actuators: &mut dyn Actuators) {
        self.powered = on;
        apply_power_effects(on, actuators);
    }

    /// Record `level` and report whether it is a falling edge (press).
    pub fn observe_button(&mut self, level: Level) -> bool {
        let pressed = self.last_button_level == Level::High && level.is_low();
        self.last_button_level = level;
        pressed
    }

    /// Read the button once; on a press, toggle power.
    ///
    /// Returns the new power state when it changed.
    pub fn poll_button(
        &mut self,
        button: &mut dyn ButtonInput,
        actuators: &mut dyn Actuators,
    ) -> Option<bool> {
        if !self.observe_button(button.read_level()) {
            return None;
        }
        let on = !self.powered;
        self.set_power(on, actuators);
        Some(on)
    }
}

fn apply_power_effects(on: bool, actuators: &mut dyn Actuators) {
    if on {
        actuators.set_visual(Rgb::ON);
        actuators.set_power_indicator(true);
    } else {
        actuators.set_visual(Rgb::OFF);
        actuators.set_mist(false);
        actuators.set_power_indicator(false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_off_and_released() {
        let state = DeviceState::new();
        assert!(!state.powered);
        assert_eq!(state.last_button_level, Level::High);
    }

    #[test]
    fn only_falling_edge_is_a_press() {
        let mut state = DeviceState::new();
        assert!(!state.observe_button(Level::High));
        assert!(state.observe_button(Level::Low));
        // Held down: no repeat.
        assert!(!state.observe_button(Level::Low));
        // Release is a rising edge.
        assert!(!state.observe_button(Level::High));
        assert!(state.observe_button(Level::Low));
    }

    #[test]
    fn press_toggles_power() {
        let mut state = DeviceState::new();
        let mut actuators = RecordingActuators::new();
        let mut button =
            ScriptedButton::new([Level::High, Level::Low, Level::Low, Level::High, Level::Low]);

        let changes: Vec<_> = (0..5)
            .map(|_| state.poll_button(&mut button, &mut actuators))
            .collect();
        assert_eq!(changes, vec![None, Some(true), None, None, Some(false)]);
        assert!(!state.powered);
        assert_eq!(
            actuators.calls(),
            vec![
                ActuatorCall::Visual(Rgb::ON),
                ActuatorCall::PowerIndicator(true),
                ActuatorCall::Visual(Rgb::OFF),
                ActuatorCall::Mist(false),
                ActuatorCall::PowerIndicator(false),
            ]
        );
    }

    #[test]
    fn power_off_clears_everything() {
        let mut state = DeviceState {
            powered: true,
            last_button_level: Level::High,
        };
        let mut actuators = RecordingActuators::new();
        actuators.set_mist(true);
        actuators.set_visual(Rgb::RAIN);

        state.set_power(false, &mut actuators);
        assert!(!state.powered);
        assert_eq!(actuators.visual(), Some(Rgb::OFF));
        assert_eq!(actuators.mist(), Some(false));
        assert_eq!(actuators.power_indicator(), Some(false));
    }
}
