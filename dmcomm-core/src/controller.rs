//! Session controller
//!
//! Runs one execution of a DigiROM: picks the codec for its dialect,
//! checks the line is free, then alternates sends and receives according
//! to the program's turn until the program runs out or a receive fails.

use core::fmt;

use heapless::Vec;

use dmcomm_hal::Clock;
use dmcomm_protocol::{Dialect, Turn};

use crate::capture::Capture;
use crate::codec::{Codec, RECEIVE_CAPACITY};
use crate::digirom::DigiRom;
use crate::prong::{Link, SignalInput, SignalOutput};
use crate::timing;

/// Settle time before each prong test sample
pub const PRONG_SETTLE_US: u32 = 2000;

/// Errors that stop an execution before anything is sent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControllerError {
    /// No codec registered for the program's dialect
    UnsupportedDialect(Dialect),
    /// Line reads active while released
    LineBusy,
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::UnsupportedDialect(d) => {
                write!(f, "dialect {} not supported", d.letter())
            }
            ControllerError::LineBusy => f.write_str("line busy"),
        }
    }
}

/// One input sample taken by the prong test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProngSample {
    pub active: bool,
    pub millivolts: Option<u16>,
}

impl fmt::Display for ProngSample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.active { "1" } else { "0" })?;
        if let Some(mv) = self.millivolts {
            write!(f, "/{}mV", mv)?;
        }
        Ok(())
    }
}

/// What the input saw while the output drove idle, drove active and
/// released
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProngReport {
    pub dialect: Dialect,
    pub idle: ProngSample,
    pub active: ProngSample,
    pub released: ProngSample,
}

impl ProngReport {
    /// Idle and released read inactive, active reads active
    pub fn is_ok(&self) -> bool {
        !self.idle.active && self.active.active && !self.released.active
    }
}

impl fmt::Display for ProngReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[prong test {}] idle={} active={} release={}",
            self.dialect.letter(),
            self.idle,
            self.active,
            self.released
        )?;
        if !self.is_ok() {
            f.write_str(" FAIL")?;
        }
        Ok(())
    }
}

/// Owns the link and one codec per dialect family
pub struct Controller<O, I, C> {
    link: Link<O, I, C>,
    codecs: Vec<Codec, 2>,
    post_receive_delay_ms: u32,
}

impl<O: SignalOutput, I: SignalInput, C: Clock> Controller<O, I, C> {
    pub fn new(link: Link<O, I, C>, post_receive_delay_ms: u32) -> Self {
        Self {
            link,
            codecs: Vec::new(),
            post_receive_delay_ms,
        }
    }

    /// Register a codec
    ///
    /// # Panics
    ///
    /// If a codec of the same family is already registered.
    pub fn add(&mut self, codec: Codec) {
        assert!(
            !self.codecs.iter().any(|c| c.same_family(&codec)),
            "codec family registered twice"
        );
        assert!(self.codecs.push(codec).is_ok(), "too many codecs");
    }

    /// Controller with both codec families registered
    pub fn with_all_codecs(link: Link<O, I, C>, post_receive_delay_ms: u32) -> Self {
        let mut controller = Self::new(link, post_receive_delay_ms);
        controller.add(Codec::classic());
        controller.add(Codec::color());
        controller
    }

    pub fn supports(&self, dialect: Dialect) -> bool {
        self.codecs.iter().any(|c| c.handles(dialect))
    }

    pub fn link(&mut self) -> &mut Link<O, I, C> {
        &mut self.link
    }

    pub fn clock(&self) -> &C {
        &self.link.clock
    }

    pub fn capture(&self) -> &Capture {
        &self.link.capture
    }

    /// Run the program once
    ///
    /// The program is rewound first, so its log afterwards describes
    /// exactly this execution. The line is released on return.
    pub fn execute(&mut self, rom: &mut DigiRom, listen_timeout_ms: u32) -> Result<(), ControllerError> {
        let dialect = rom.dialect();
        let codec = self
            .codecs
            .iter_mut()
            .find(|c| c.handles(dialect))
            .ok_or(ControllerError::UnsupportedDialect(dialect))?;
        let link = &mut self.link;

        rom.rewind();
        link.capture.restart();
        codec.prepare(link, dialect, listen_timeout_ms);
        link.release();
        if link.is_active() {
            return Err(ControllerError::LineBusy);
        }

        let mut buffer = [0u16; RECEIVE_CAPACITY];
        let capacity = codec.receive_capacity();

        match rom.turn() {
            Turn::Listen => loop {
                let outcome = codec.receive(link, &mut buffer[..capacity]);
                rom.store(&buffer, &outcome);
                if !outcome.is_received() {
                    break;
                }
            },
            Turn::Initiator => loop {
                let n = rom.next(&mut buffer);
                if n == 0 {
                    break;
                }
                codec.send(link, &buffer[..n]);
                let outcome = codec.receive(link, &mut buffer[..capacity]);
                rom.store(&buffer, &outcome);
                if !outcome.is_received() {
                    break;
                }
            },
            Turn::Responder => loop {
                let outcome = codec.receive(link, &mut buffer[..capacity]);
                rom.store(&buffer, &outcome);
                if !outcome.is_received() {
                    break;
                }
                let n = rom.next(&mut buffer);
                if n == 0 {
                    // Stay quiet so the other side sees the exchange end
                    link.clock.delay_millis(self.post_receive_delay_ms);
                    break;
                }
                codec.send(link, &buffer[..n]);
            },
        }

        link.release();
        Ok(())
    }

    /// Drive the prong through idle, active and released, sampling each
    pub fn prong_test(&mut self, dialect: Dialect) -> ProngReport {
        let (active, threshold_mv) = timing::signal_params(dialect);
        let link = &mut self.link;
        link.configure(active, threshold_mv);

        link.output.drive_idle();
        let idle = Self::sample(link);
        link.output.drive_active();
        let active = Self::sample(link);
        link.release();
        let released = Self::sample(link);

        ProngReport {
            dialect,
            idle,
            active,
            released,
        }
    }

    fn sample(link: &mut Link<O, I, C>) -> ProngSample {
        link.clock.delay_micros(PRONG_SETTLE_US);
        ProngSample {
            active: link.input.is_active(),
            millivolts: link.input.millivolts(),
        }
    }
}
