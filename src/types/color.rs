use std::fmt;

/// An RGB color for the LED ring.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    /// All LEDs dark.
    pub const OFF: Rgb = Rgb::new(0, 0, 0);
    /// Shown when the lamp is switched on.
    pub const ON: Rgb = Rgb::new(255, 160, 60);
    pub const RAIN: Rgb = Rgb::new(0, 0, 128);
    pub const SUNNY: Rgb = Rgb::new(255, 200, 0);
    pub const CLOUDY: Rgb = Rgb::new(90, 90, 110);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}
