use super::{Actuators, ButtonInput};
use crate::types::{Level, Rgb};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// One call made on an [`Actuators`] implementation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActuatorCall {
    Visual(Rgb),
    Mist(bool),
    PowerIndicator(bool),
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory actuators that record every call (for testing or running
/// without hardware). Clones share the same log.
#[derive(Clone, Debug, Default)]
pub struct RecordingActuators {
    calls: Arc<Mutex<Vec<ActuatorCall>>>,
}

impl RecordingActuators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all calls so far.
    pub fn calls(&self) -> Vec<ActuatorCall> {
        lock(&self.calls).clone()
    }

    /// Drain the log.
    pub fn take(&self) -> Vec<ActuatorCall> {
        std::mem::take(&mut *lock(&self.calls))
    }

    /// Last color written to the LED ring.
    pub fn visual(&self) -> Option<Rgb> {
        lock(&self.calls).iter().rev().find_map(|c| match c {
            ActuatorCall::Visual(color) => Some(*color),
            _ => None,
        })
    }

    /// Last mist state written.
    pub fn mist(&self) -> Option<bool> {
        lock(&self.calls).iter().rev().find_map(|c| match c {
            ActuatorCall::Mist(on) => Some(*on),
            _ => None,
        })
    }

    /// Last power indicator state written.
    pub fn power_indicator(&self) -> Option<bool> {
        lock(&self.calls).iter().rev().find_map(|c| match c {
            ActuatorCall::PowerIndicator(on) => Some(*on),
            _ => None,
        })
    }

    fn record(&self, call: ActuatorCall) {
        tracing::debug!(?call, "actuator");
        lock(&self.calls).push(call);
    }
}

impl Actuators for RecordingActuators {
    fn set_visual(&mut self, color: Rgb) {
        self.record(ActuatorCall::Visual(color));
    }

    fn set_mist(&mut self, active: bool) {
        self.record(ActuatorCall::Mist(active));
    }

    fn set_power_indicator(&mut self, active: bool) {
        self.record(ActuatorCall::PowerIndicator(active));
    }
}

/// Button that replays queued levels, then holds the last one.
/// Clones share the queue, so a test can press while the session runs.
#[derive(Clone, Debug)]
pub struct ScriptedButton {
    queue: Arc<Mutex<VecDeque<Level>>>,
    current: Level,
}

impl ScriptedButton {
    pub fn new(levels: impl IntoIterator<Item = Level>) -> Self {
        Self {
            queue: Arc::new(Mutex::new(levels.into_iter().collect())),
            current: Level::High,
        }
    }

    /// A button that is never pressed.
    pub fn released() -> Self {
        Self::new([])
    }

    /// Queue one full press and release.
    pub fn press(&self) {
        let mut queue = lock(&self.queue);
        queue.push_back(Level::Low);
        queue.push_back(Level::High);
    }
}

impl ButtonInput for ScriptedButton {
    fn read_level(&mut self) -> Level {
        if let Some(level) = lock(&self.queue).pop_front() {
            self.current = level;
        }
        self.current
    }
}
