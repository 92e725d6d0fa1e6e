//! Board assembly
//!
//! Turns the parsed board configuration into the prong link, controller
//! and activity LED.

use defmt::*;
use embassy_rp::gpio::{Input, Level as GpioLevel, Output, Pull};
use embassy_rp::peripherals::ADC;
use embassy_rp::Peri;

use dmcomm_core::config::{BoardConfig, SenseMode};
use dmcomm_core::prong::{Link, ProngInput, ProngOutput};
use dmcomm_core::timing;
use dmcomm_core::Controller;
use dmcomm_drivers::{LedIndicator, ScaledAdc};
use dmcomm_hal_rp2040::{adc, EmbassyClock, PinBank, PinBankPeripherals, PinError, RpAdc, RpInput, RpOutput};
use dmcomm_protocol::Dialect;

pub type FwOutput = ProngOutput<RpOutput, RpOutput>;
pub type FwInput = ProngInput<RpInput, ScaledAdc<RpAdc>>;
pub type FwController = Controller<FwOutput, FwInput, EmbassyClock>;
pub type FwIndicator = Option<LedIndicator<RpOutput>>;

/// Everything the comm task drives
pub struct Board {
    pub controller: FwController,
    pub led: FwIndicator,
}

impl Board {
    /// Claim the configured pins and build the link
    ///
    /// The ADC pin is claimed first since it needs its concrete type.
    pub fn build(
        config: &BoardConfig,
        pins: &mut PinBankPeripherals,
        adc_periph: Peri<'static, ADC>,
    ) -> Result<Self, PinError> {
        let prong = &config.prong;
        if prong.out.inverted || prong.input.inverted {
            warn!("Inversion is ignored on prong pins");
        }

        let adc_channel = match prong.sense {
            SenseMode::Analog => Some(adc::take_channel(pins, prong.input.pin)?),
            SenseMode::Digital => None,
        };
        let mut bank = PinBank::new(pins);

        // Idle high with the driver disabled until the first dialect is set
        let out = RpOutput::new(Output::new(bank.take(prong.out.pin)?, GpioLevel::High), true);
        let not_oe = bank
            .take_optional(prong.not_oe.map(|p| p.pin))?
            .map(|pin| RpOutput::new(Output::new(pin, GpioLevel::High), true));
        let output = ProngOutput::with_optional_enable(out, not_oe);

        let (active, threshold_mv) = timing::signal_params(Dialect::V);
        let input = match adc_channel {
            Some(channel) => {
                info!("Prong sense: ADC on gpio{}", prong.input.pin);
                ProngInput::Analog {
                    adc: ScaledAdc::new(RpAdc::new(adc_periph, channel), prong.adc_reference_mv),
                    active,
                    threshold_mv,
                }
            }
            None => {
                info!("Prong sense: digital on gpio{}", prong.input.pin);
                let pull = if prong.input.pull_up { Pull::Up } else { Pull::None };
                ProngInput::Digital {
                    pin: RpInput::new(Input::new(bank.take(prong.input.pin)?, pull)),
                    active,
                }
            }
        };

        let led = match config.led {
            Some(led) => {
                let pin = RpOutput::new(Output::new(bank.take(led.pin)?, GpioLevel::Low), false);
                Some(LedIndicator::new(pin, led.inverted))
            }
            None => None,
        };

        let link = Link::new(output, input, EmbassyClock);
        let controller = Controller::with_all_codecs(link, config.session.post_receive_delay_ms);

        Ok(Self { controller, led })
    }
}
