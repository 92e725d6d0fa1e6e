//! Driver implementations
//!
//! Concrete implementations of the core's collaborator traits on top of
//! the HAL traits:
//!
//! - [`led::LedIndicator`] - program activity on a GPIO LED
//! - [`adc::ScaledAdc`] - raw ADC counts to millivolts for analog prong sensing

#![no_std]
#![deny(unsafe_code)]

pub mod adc;
pub mod led;

pub use adc::ScaledAdc;
pub use led::LedIndicator;
