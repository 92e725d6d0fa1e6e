//! Bit-level codecs
//!
//! One codec per dialect family. The controller owns at most one of each
//! and selects by the program's dialect, so the link is only ever driven
//! by one codec at a time.

mod classic;
mod color;

pub use classic::ClassicCodec;
pub use color::ColorCodec;

use dmcomm_hal::Clock;
use dmcomm_protocol::{Dialect, MAX_MESSAGE_WORDS};

use crate::outcome::{ReceiveOutcome, ReceiveStatus, TIMED_OUT};
use crate::prong::{Link, SignalInput, SignalOutput};

/// Words a receive buffer must hold for any codec
pub const RECEIVE_CAPACITY: usize = MAX_MESSAGE_WORDS;

/// A dialect family codec
#[derive(Debug, Clone)]
pub enum Codec {
    Classic(ClassicCodec),
    Color(ColorCodec),
}

impl Codec {
    pub fn classic() -> Self {
        Codec::Classic(ClassicCodec::new())
    }

    pub fn color() -> Self {
        Codec::Color(ColorCodec::new())
    }

    /// True if this codec speaks `dialect`
    pub fn handles(&self, dialect: Dialect) -> bool {
        match self {
            Codec::Classic(_) => dialect.is_classic(),
            Codec::Color(_) => dialect == Dialect::Color,
        }
    }

    /// True if both codecs are of the same family
    pub fn same_family(&self, other: &Codec) -> bool {
        core::mem::discriminant(self) == core::mem::discriminant(other)
    }

    /// Largest message one receive can return
    pub fn receive_capacity(&self) -> usize {
        match self {
            Codec::Classic(_) => 1,
            Codec::Color(_) => RECEIVE_CAPACITY,
        }
    }

    /// Start a session: set polarity and threshold, arm the first receive
    pub fn prepare<O, I, C>(&mut self, link: &mut Link<O, I, C>, dialect: Dialect, listen_timeout_ms: u32)
    where
        O: SignalOutput,
        I: SignalInput,
        C: Clock,
    {
        match self {
            Codec::Classic(c) => c.prepare(link, dialect, listen_timeout_ms),
            Codec::Color(c) => c.prepare(link, listen_timeout_ms),
        }
    }

    /// Transmit one message; classic sends only the first word
    pub fn send<O, I, C>(&mut self, link: &mut Link<O, I, C>, words: &[u16])
    where
        O: SignalOutput,
        I: SignalInput,
        C: Clock,
    {
        match self {
            Codec::Classic(c) => c.send(link, words[0]),
            Codec::Color(c) => c.send(link, words),
        }
    }

    /// Receive one message into `buffer`
    pub fn receive<O, I, C>(&mut self, link: &mut Link<O, I, C>, buffer: &mut [u16]) -> ReceiveOutcome
    where
        O: SignalOutput,
        I: SignalInput,
        C: Clock,
    {
        assert!(!buffer.is_empty(), "receive buffer must not be empty");
        match self {
            Codec::Classic(c) => c.receive(link, buffer),
            Codec::Color(c) => c.receive(link, buffer),
        }
    }
}

pub(crate) fn millis_to_micros(ms: u32) -> u32 {
    ms.saturating_mul(1000)
}

/// Time the current phase until the line leaves it
///
/// `active` names the phase being measured. Records the position and
/// duration in `outcome` whether or not the phase is in range.
pub(crate) fn measure<O, I, C>(
    link: &mut Link<O, I, C>,
    outcome: &mut ReceiveOutcome,
    bit: i16,
    active: bool,
    min: u32,
    max: u32,
) -> Result<u32, ReceiveStatus>
where
    O: SignalOutput,
    I: SignalInput,
    C: Clock,
{
    outcome.current_bit = bit;
    outcome.current_bit_active = active;
    match link.wait_for(!active, max) {
        None => {
            outcome.last_duration = TIMED_OUT;
            Err(ReceiveStatus::Timeout)
        }
        Some(duration) => {
            outcome.last_duration = duration;
            if duration < min {
                Err(ReceiveStatus::TooShort)
            } else {
                Ok(duration)
            }
        }
    }
}
