//! RP2040-specific HAL for the prong adapter firmware
//!
//! This crate provides RP2040 implementations of the `dmcomm-hal`
//! traits:
//!
//! - GPIO adapters over `embedded-hal` pins
//! - Dynamic pin allocation for config-driven setup
//! - Blocking ADC channel for analog prong sensing
//! - Microsecond clock on `embassy-time`
//! - Host serial link over `embedded-io`

#![no_std]

pub mod adc;
pub mod gpio;
pub mod pins;
pub mod time;
pub mod uart;

pub use adc::RpAdc;
pub use gpio::{RpInput, RpOutput};
pub use pins::{PinBank, PinBankPeripherals, PinError};
pub use time::EmbassyClock;
pub use uart::{SerialReader, SerialWriter};
