//! ADC channel for analog prong sensing
//!
//! RP2040 has a single ADC with four external channels:
//! - ADC0: GPIO26
//! - ADC1: GPIO27
//! - ADC2: GPIO28
//! - ADC3: GPIO29

use embassy_rp::adc::{Adc, Blocking, Channel, Config};
use embassy_rp::gpio::Pull;
use embassy_rp::peripherals::ADC;
use embassy_rp::Peri;

use dmcomm_hal::RawAdc;

use crate::pins::{PinBankPeripherals, PinError};

/// Check that a GPIO can be sampled by the ADC
pub fn is_adc_gpio(gpio: u8) -> bool {
    (26..=29).contains(&gpio)
}

/// Take an ADC-capable pin out of the peripherals as a channel
///
/// Must be called before the pin bank is built.
pub fn take_channel(p: &mut PinBankPeripherals, gpio: u8) -> Result<Channel<'static>, PinError> {
    let channel = match gpio {
        26 => p.pin26.take().map(|pin| Channel::new_pin(pin, Pull::None)),
        27 => p.pin27.take().map(|pin| Channel::new_pin(pin, Pull::None)),
        28 => p.pin28.take().map(|pin| Channel::new_pin(pin, Pull::None)),
        29 => p.pin29.take().map(|pin| Channel::new_pin(pin, Pull::None)),
        n if n >= 30 => return Err(PinError::InvalidPin),
        _ => return Err(PinError::WrongFunction),
    };
    channel.ok_or(PinError::AlreadyTaken)
}

/// One ADC channel read in blocking mode
///
/// Conversions take about 2 µs, short enough for the pulse timing loops.
pub struct RpAdc {
    adc: Adc<'static, Blocking>,
    channel: Channel<'static>,
}

impl RpAdc {
    pub fn new(adc: Peri<'static, ADC>, channel: Channel<'static>) -> Self {
        Self {
            adc: Adc::new_blocking(adc, Config::default()),
            channel,
        }
    }
}

impl RawAdc for RpAdc {
    fn read_raw(&mut self) -> u16 {
        // A failed conversion reads as 0 V, i.e. an idle line
        self.adc.blocking_read(&mut self.channel).unwrap_or(0)
    }
}
