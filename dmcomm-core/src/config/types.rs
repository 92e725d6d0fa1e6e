//! Configuration type definitions
//!
//! Board wiring and session timing. Parsed at boot from the TOML text
//! embedded in the firmware; defaults match an RP2040 Pico adapter.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Pin configuration with optional inversion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PinConfig {
    /// GPIO pin number (0-29 for RP2040)
    pub pin: u8,
    /// Pin is active-low (inverted)
    pub inverted: bool,
    /// Enable internal pull-up
    pub pull_up: bool,
}

impl PinConfig {
    pub const fn new(pin: u8) -> Self {
        Self {
            pin,
            inverted: false,
            pull_up: false,
        }
    }

    /// Create an inverted (active-low) pin
    pub const fn inverted(pin: u8) -> Self {
        Self {
            pin,
            inverted: true,
            pull_up: false,
        }
    }
}

/// How the prong input is read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SenseMode {
    /// Plain GPIO level
    Digital,
    /// ADC channel compared against the dialect threshold
    #[default]
    Analog,
}

/// Prong wiring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ProngConfig {
    /// Signal driver
    pub out: PinConfig,
    /// Active-low output enable, if the board has a bus switch
    pub not_oe: Option<PinConfig>,
    /// Sense input
    pub input: PinConfig,
    pub sense: SenseMode,
    /// ADC reference in millivolts
    pub adc_reference_mv: u16,
}

impl Default for ProngConfig {
    fn default() -> Self {
        Self {
            out: PinConfig::new(19),
            not_oe: Some(PinConfig::new(21)),
            input: PinConfig::new(26),
            sense: SenseMode::Analog,
            adc_reference_mv: 3300,
        }
    }
}

/// Session timing in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SessionConfig {
    /// Wait for the first message of a session
    pub listen_timeout_ms: u32,
    /// Give up on a partial command line
    pub serial_timeout_ms: u32,
    /// Delay before an initiator's first run
    pub gofirst_delay_ms: u32,
    /// Delay between initiator runs
    pub gofirst_repeat_ms: u32,
    /// Quiet time after a responder's last receive
    pub post_receive_delay_ms: u32,
    /// Poll interval while idle or retrying a busy line
    pub inactive_delay_ms: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            listen_timeout_ms: 5000,
            serial_timeout_ms: 6000,
            gofirst_delay_ms: 1000,
            gofirst_repeat_ms: 5000,
            post_receive_delay_ms: 300,
            inactive_delay_ms: 250,
        }
    }
}

/// Complete board configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoardConfig {
    pub prong: ProngConfig,
    /// Activity LED
    pub led: Option<PinConfig>,
    /// Host UART baud rate
    pub baudrate: u32,
    pub session: SessionConfig,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            prong: ProngConfig::default(),
            led: Some(PinConfig::new(25)),
            baudrate: 9600,
            session: SessionConfig::default(),
        }
    }
}
