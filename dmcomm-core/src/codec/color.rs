//! Variable-length codec for the color dialect

use dmcomm_hal::Clock;

use super::{measure, millis_to_micros};
use crate::outcome::{ReceiveOutcome, ReceiveStatus, PHASE_GO, PHASE_INITIAL, TIMED_OUT};
use crate::prong::{Link, SignalInput, SignalOutput};
use crate::timing::{ColorTiming, TIMING_COLOR};

/// Codec for messages of one or more 16-bit words
///
/// Frame: idle, go pulse (active), then the words back to back, 16 bits
/// each LSB first, each bit a fixed idle half and an active half whose
/// length is the value. The message ends when the line stays idle.
#[derive(Debug, Clone)]
pub struct ColorCodec {
    timing: &'static ColorTiming,
    first_receive: bool,
    listen_timeout_us: u32,
}

impl Default for ColorCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl ColorCodec {
    pub fn new() -> Self {
        Self {
            timing: &TIMING_COLOR,
            first_receive: true,
            listen_timeout_us: 0,
        }
    }

    pub fn prepare<O, I, C>(&mut self, link: &mut Link<O, I, C>, listen_timeout_ms: u32)
    where
        O: SignalOutput,
        I: SignalInput,
        C: Clock,
    {
        self.first_receive = true;
        self.listen_timeout_us = millis_to_micros(listen_timeout_ms);
        link.configure(self.timing.active_level, self.timing.threshold_mv);
    }

    pub fn send<O, I, C>(&mut self, link: &mut Link<O, I, C>, words: &[u16])
    where
        O: SignalOutput,
        I: SignalInput,
        C: Clock,
    {
        let t = self.timing;
        self.first_receive = false;

        link.begin_packet();
        link.hold_idle(t.pre_idle_send);
        link.hold_active(t.pre_active.send);
        for &word in words {
            for i in 0..16 {
                let bit = (word >> i) & 1 != 0;
                link.hold_idle(t.bit_idle.send);
                link.hold_active(t.bit_active.send(bit));
            }
        }
        link.hold_idle(t.cooldown_send);
        link.release();
    }

    pub fn receive<O, I, C>(&mut self, link: &mut Link<O, I, C>, buffer: &mut [u16]) -> ReceiveOutcome
    where
        O: SignalOutput,
        I: SignalInput,
        C: Clock,
    {
        let t = self.timing;
        let first = core::mem::replace(&mut self.first_receive, false);
        let timeout = if first {
            self.listen_timeout_us
        } else {
            millis_to_micros(t.reply_timeout_ms)
        };

        let mut outcome = ReceiveOutcome::new();
        outcome.current_bit = PHASE_INITIAL;
        if link.wait_for(true, timeout).is_none() {
            outcome.last_duration = TIMED_OUT;
            outcome.status = if first {
                ReceiveStatus::Nothing
            } else {
                ReceiveStatus::Timeout
            };
            return outcome;
        }
        link.begin_packet();

        outcome.status = match self.receive_words(link, &mut outcome, buffer) {
            Ok(status) | Err(status) => status,
        };
        outcome
    }

    /// Bit loop; `result_length` tracks completed words throughout
    fn receive_words<O, I, C>(
        &self,
        link: &mut Link<O, I, C>,
        outcome: &mut ReceiveOutcome,
        buffer: &mut [u16],
    ) -> Result<ReceiveStatus, ReceiveStatus>
    where
        O: SignalOutput,
        I: SignalInput,
        C: Clock,
    {
        let t = self.timing;
        measure(link, outcome, PHASE_GO, true, t.pre_active.min, t.pre_active.max)?;

        let mut words = 0usize;
        let mut bit: i16 = 0;
        let mut word: u16 = 0;
        loop {
            let at_boundary = bit % 16 == 0;
            match measure(link, outcome, bit, false, t.bit_idle.min, t.bit_idle.max) {
                Ok(_) => {}
                Err(ReceiveStatus::Timeout) if at_boundary && words > 0 => {
                    return Ok(ReceiveStatus::Received);
                }
                Err(status) => return Err(status),
            }
            if at_boundary && words == buffer.len() {
                return Ok(ReceiveStatus::BufferFull);
            }

            let active = measure(link, outcome, bit, true, t.bit_active.min, t.bit_active.max)?;
            word >>= 1;
            if t.bit_from_active(active) {
                word |= 0x8000;
            }
            outcome.bits = word;
            bit += 1;
            if bit % 16 == 0 {
                buffer[words] = word;
                words += 1;
                word = 0;
                outcome.result_length = words as u16;
            }
        }
    }
}
