//! Receive outcome reported by the codecs

/// Sentinel duration for a wait that ran out
pub const TIMED_OUT: u32 = u32::MAX;

/// Phase index of the wait for the first activity
pub const PHASE_INITIAL: i16 = -4;
/// Phase index of the go pulse
pub const PHASE_GO: i16 = -3;
/// Phase index of the start bit's idle half
pub const PHASE_START_IDLE: i16 = -2;
/// Phase index of the start bit's active half
pub const PHASE_START_ACTIVE: i16 = -1;

/// How a receive ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReceiveStatus {
    /// A complete message arrived
    Received,
    /// No activity at all; expected while waiting for a toy
    Nothing,
    /// Message longer than the buffer; what fit was kept
    BufferFull,
    /// A phase ended before its minimum duration
    TooShort,
    /// A phase did not end within its maximum duration
    Timeout,
}

/// Result of one receive attempt
///
/// `current_bit` is the bit index the receiver was on when it stopped,
/// or one of the `PHASE_*` indices for the preamble. Bit indices count
/// across words for Color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReceiveOutcome {
    pub status: ReceiveStatus,
    /// Words written to the buffer
    pub result_length: u16,
    /// Duration of the last measured phase in µs, or [`TIMED_OUT`]
    pub last_duration: u32,
    pub current_bit: i16,
    /// True if the receiver stopped on the active half of a bit
    pub current_bit_active: bool,
    /// Bits of the current word so far, newest in the top bit
    pub bits: u16,
}

impl ReceiveOutcome {
    /// Outcome before anything has been measured
    pub const fn new() -> Self {
        Self {
            status: ReceiveStatus::Nothing,
            result_length: 0,
            last_duration: 0,
            current_bit: PHASE_INITIAL,
            current_bit_active: false,
            bits: 0,
        }
    }

    pub fn is_received(&self) -> bool {
        self.status == ReceiveStatus::Received
    }

    /// Bits of the current word that arrived before the receive stopped,
    /// as `(count, value)` with the value right-aligned
    ///
    /// `None` while still in the preamble.
    pub fn partial_word(&self) -> Option<(u8, u16)> {
        if self.current_bit < 0 {
            return None;
        }
        // The idle half decides the bit, so a stop on the active half
        // already has it
        let count = (self.current_bit % 16) as u8 + self.current_bit_active as u8;
        let value = match count {
            0 => 0,
            n => self.bits >> (16 - n as u32),
        };
        Some((count, value))
    }
}

impl Default for ReceiveOutcome {
    fn default() -> Self {
        Self::new()
    }
}
