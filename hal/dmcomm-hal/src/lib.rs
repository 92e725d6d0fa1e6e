//! dmcomm Hardware Abstraction Layer
//!
//! This crate defines the hardware traits the protocol core is written
//! against. Chip-specific crates implement them so the same core runs on
//! the RP2040 adapter or against a simulated line in host tests.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application (dmcomm-firmware, tests)   │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  dmcomm-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!         ┌───────────┴───────────┐
//!         ▼                       ▼
//! ┌───────────────┐       ┌───────────────┐
//! │  dmcomm-hal-  │       │   simulated   │
//! │    rp2040     │       │  line (tests) │
//! └───────────────┘       └───────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`] - Digital I/O
//! - [`adc::AnalogInput`], [`adc::RawAdc`] - Voltage sensing on a prong
//! - [`time::Clock`] - Microsecond time source for busy-wait timing
//! - [`uart::SerialTx`], [`uart::SerialRx`] - Host command link

#![no_std]
#![deny(unsafe_code)]

pub mod adc;
pub mod gpio;
pub mod time;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use adc::{AnalogInput, RawAdc};
pub use gpio::{InputPin, Level, OutputPin};
pub use time::Clock;
pub use uart::{SerialTx, SerialRx};
