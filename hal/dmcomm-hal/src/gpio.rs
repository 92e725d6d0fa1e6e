//! GPIO pin abstractions
//!
//! Provides traits for the digital pins that make up a prong link: the
//! signal driver, its output-enable, and the digital sense input.

/// Electrical level of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// The opposite level
    pub fn inverted(self) -> Self {
        match self {
            Level::Low => Level::High,
            Level::High => Level::Low,
        }
    }

    /// Level corresponding to a raw pin reading
    pub fn from_high(high: bool) -> Self {
        if high {
            Level::High
        } else {
            Level::Low
        }
    }

    pub fn is_high(self) -> bool {
        self == Level::High
    }
}

/// Digital output pin
///
/// Implementations should handle the actual hardware register manipulation
/// for the specific chip.
pub trait OutputPin {
    /// Set the pin high (logic 1)
    fn set_high(&mut self);

    /// Set the pin low (logic 0)
    fn set_low(&mut self);

    /// Set the pin to a specific level
    fn set_level(&mut self, level: Level) {
        match level {
            Level::High => self.set_high(),
            Level::Low => self.set_low(),
        }
    }

    /// Check if the pin is currently set high
    fn is_set_high(&self) -> bool;
}

/// Digital input pin
///
/// Implementations should handle the actual hardware register reading
/// for the specific chip.
pub trait InputPin {
    /// Check if the pin reads high (logic 1)
    fn is_high(&mut self) -> bool;

    /// Current level of the pin
    fn level(&mut self) -> Level {
        Level::from_high(self.is_high())
    }
}

/// Placeholder for a pin that is not fitted on a given board
///
/// Uninhabited, so code paths holding one are statically unreachable.
#[derive(Debug)]
pub enum NoPin {}

impl OutputPin for NoPin {
    fn set_high(&mut self) {
        match *self {}
    }

    fn set_low(&mut self) {
        match *self {}
    }

    fn is_set_high(&self) -> bool {
        match *self {}
    }
}

impl InputPin for NoPin {
    fn is_high(&mut self) -> bool {
        match *self {}
    }
}
