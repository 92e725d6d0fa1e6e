//! Single-word codec for the V, X and Y dialects

use dmcomm_hal::Clock;
use dmcomm_protocol::Dialect;

use super::{measure, millis_to_micros};
use crate::outcome::{
    ReceiveOutcome, ReceiveStatus, PHASE_GO, PHASE_INITIAL, PHASE_START_ACTIVE, PHASE_START_IDLE,
    TIMED_OUT,
};
use crate::prong::{Link, SignalInput, SignalOutput};
use crate::timing::{self, ClassicTiming};

/// Codec for one 16-bit word per message
///
/// Frame: idle, go pulse (active), start bit (idle then active), then 16
/// bits LSB first, each an idle half whose length is the value and an
/// active half, then a short idle before release.
#[derive(Debug, Clone)]
pub struct ClassicCodec {
    timing: &'static ClassicTiming,
    first_receive: bool,
    listen_timeout_us: u32,
}

impl Default for ClassicCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassicCodec {
    pub fn new() -> Self {
        Self {
            timing: &timing::TIMING_V,
            first_receive: true,
            listen_timeout_us: 0,
        }
    }

    pub fn timing(&self) -> &'static ClassicTiming {
        self.timing
    }

    pub fn prepare<O, I, C>(&mut self, link: &mut Link<O, I, C>, dialect: Dialect, listen_timeout_ms: u32)
    where
        O: SignalOutput,
        I: SignalInput,
        C: Clock,
    {
        self.timing = timing::classic(dialect);
        self.first_receive = true;
        self.listen_timeout_us = millis_to_micros(listen_timeout_ms);
        link.configure(self.timing.active_level, self.timing.threshold_mv);
    }

    pub fn send<O, I, C>(&mut self, link: &mut Link<O, I, C>, word: u16)
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
        link.hold_idle(t.start_idle.send);
        link.hold_active(t.start_active.send);
        for i in 0..16 {
            let bit = (word >> i) & 1 != 0;
            link.hold_idle(t.bit_idle.send(bit));
            link.hold_active(t.bit_active.send(bit));
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
            // Y toys drop the line when unplugged mid-session
            outcome.status = if first || t.dialect == Dialect::Y {
                ReceiveStatus::Nothing
            } else {
                ReceiveStatus::Timeout
            };
            return outcome;
        }
        link.begin_packet();

        match self.receive_word(link, &mut outcome) {
            Ok(word) => {
                buffer[0] = word;
                outcome.status = ReceiveStatus::Received;
                outcome.result_length = 1;
            }
            Err(status) => {
                outcome.status = status;
                outcome.result_length = 0;
            }
        }
        outcome
    }

    fn receive_word<O, I, C>(&self, link: &mut Link<O, I, C>, outcome: &mut ReceiveOutcome) -> Result<u16, ReceiveStatus>
    where
        O: SignalOutput,
        I: SignalInput,
        C: Clock,
    {
        let t = self.timing;
        measure(link, outcome, PHASE_GO, true, t.pre_active.min, t.pre_active.max)?;
        measure(link, outcome, PHASE_START_IDLE, false, t.start_idle.min, t.start_idle.max)?;
        measure(link, outcome, PHASE_START_ACTIVE, true, t.start_active.min, t.start_active.max)?;

        let mut word: u16 = 0;
        for bit in 0..16i16 {
            let idle = measure(link, outcome, bit, false, t.bit_idle.min, t.bit_idle.max)?;
            word >>= 1;
            if t.bit_from_idle(idle) {
                word |= 0x8000;
            }
            outcome.bits = if t.invert_bit_read { !word } else { word };
            match measure(link, outcome, bit, true, t.bit_active.min, t.bit_active.max) {
                Ok(_) => {}
                // X toys hold the line after the last bit
                Err(ReceiveStatus::Timeout) if bit == 15 && t.dialect == Dialect::X => break,
                Err(status) => return Err(status),
            }
        }

        if t.invert_bit_read {
            word = !word;
        }
        Ok(word)
    }
}
