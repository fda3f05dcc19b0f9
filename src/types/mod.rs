mod color;

pub use color::Rgb;

/// Identifier the lamp registers under.
pub type DeviceId = String;

/// Logic level of a digital input pin.
///
/// The button is wired with a pull-up, so `High` means released.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Level {
    Low,
    #[default]
    High,
}

impl Level {
    pub fn is_low(self) -> bool {
        self == Self::Low
    }
}
