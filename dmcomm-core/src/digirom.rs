//! DigiROM programs
//!
//! A DigiROM is what one command line asks for: which dialect to speak,
//! which turn to take, and what to send. It hands words to the
//! controller one message at a time and logs every send and receive so
//! the exchange can be printed back to the host afterwards.
//!
//! Two kinds exist:
//! - [`ClassicRom`] sends one word per `-` group, building each word
//!   from the group's tokens and the last word received
//! - [`WordsRom`] sends all groups as a single multi-word message

use core::fmt::{self, Write};

use heapless::Vec;

use dmcomm_protocol::hex::write_words;
use dmcomm_protocol::{
    Dialect, Digit, ProgramCommand, Segment, Turn, MAX_MESSAGE_WORDS, MAX_SEGMENTS,
};

use crate::outcome::{ReceiveOutcome, ReceiveStatus, PHASE_INITIAL};

/// Events kept per execution
pub const MAX_EVENTS: usize = 32;

/// One message on the line
pub type Message = Vec<u16, MAX_MESSAGE_WORDS>;

fn message(words: &[u16]) -> Message {
    words.iter().take(MAX_MESSAGE_WORDS).copied().collect()
}

/// Something that happened during an execution
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ResultEvent {
    Sent(Message),
    Received(Message),
    /// Message overflowed the buffer; holds what fit
    BufferFull(Message),
    /// Receive ended without a message
    Failed(Failure),
}

/// Where a receive gave up
///
/// Printed as `t` (or `t:s` for a too-short phase), then `:<phase>` once
/// the toy has started a message, then `:<bits>` with the partial word
/// once data bits were being read. Phases before the first data bit are
/// negative: `-3` go pulse, `-2` and `-1` the start bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Failure {
    pub status: ReceiveStatus,
    pub phase: i16,
    /// Bits received of the word being read, right-aligned
    pub partial: Option<(u8, u16)>,
}

impl Failure {
    pub fn from_outcome(outcome: &ReceiveOutcome) -> Self {
        Self {
            status: outcome.status,
            phase: outcome.current_bit,
            partial: outcome.partial_word(),
        }
    }
}

impl From<ReceiveStatus> for Failure {
    /// Failure while waiting for the toy to start
    fn from(status: ReceiveStatus) -> Self {
        Self {
            status,
            phase: PHASE_INITIAL,
            partial: None,
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('t')?;
        if self.status == ReceiveStatus::TooShort {
            f.write_str(":s")?;
        }
        if self.phase > PHASE_INITIAL {
            write!(f, ":{}", self.phase)?;
        }
        if let Some((_, value)) = self.partial {
            write!(f, ":{:04X}", value)?;
        }
        Ok(())
    }
}

impl fmt::Display for ResultEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResultEvent::Sent(m) => {
                f.write_str("s:")?;
                write_words(f, m)
            }
            ResultEvent::Received(m) => {
                f.write_str("r:")?;
                write_words(f, m)
            }
            ResultEvent::BufferFull(m) => {
                if !m.is_empty() {
                    f.write_str("r:")?;
                    write_words(f, m)?;
                    f.write_char(' ')?;
                }
                f.write_str("t:f")
            }
            ResultEvent::Failed(failure) => write!(f, "{}", failure),
        }
    }
}

/// Bounded log of one execution
#[derive(Debug, Clone, Default)]
pub struct ResultLog {
    events: Vec<ResultEvent, MAX_EVENTS>,
    truncated: bool,
}

impl ResultLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.events.clear();
        self.truncated = false;
    }

    /// Append an event, dropping it if the log is full
    pub fn push(&mut self, event: ResultEvent) {
        if self.events.push(event).is_err() {
            self.truncated = true;
        }
    }

    pub fn events(&self) -> &[ResultEvent] {
        &self.events
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// True if any message came in, even a partial one
    pub fn received_anything(&self) -> bool {
        self.events
            .iter()
            .any(|e| matches!(e, ResultEvent::Received(_) | ResultEvent::BufferFull(_)))
    }

    /// Write events separated by spaces
    pub fn write<W: Write>(&self, w: &mut W) -> fmt::Result {
        for (i, event) in self.events.iter().enumerate() {
            if i > 0 {
                w.write_char(' ')?;
            }
            write!(w, "{}", event)?;
        }
        if self.truncated {
            w.write_str(" ...")?;
        }
        Ok(())
    }

    fn record(&mut self, buffer: &[u16], outcome: &ReceiveOutcome) {
        let received = &buffer[..(outcome.result_length as usize).min(buffer.len())];
        let event = match outcome.status {
            ReceiveStatus::Received => ResultEvent::Received(message(received)),
            ReceiveStatus::BufferFull => ResultEvent::BufferFull(message(received)),
            _ => ResultEvent::Failed(Failure::from_outcome(outcome)),
        };
        self.push(event);
    }
}

/// Build the next word to send from a group
///
/// Starts from the nibbles of `last_received`; literals overwrite, `^h`
/// XORs. Every nibble except a check position is added to the running
/// 4-bit `checksum`, then the check nibble is chosen so the checksum
/// lands on its target.
pub fn build_word(segment: &Segment, checksum: &mut u8, last_received: u16) -> u16 {
    let mut digits = [0u8; 4];
    for (i, d) in digits.iter_mut().enumerate() {
        *d = ((last_received >> (12 - 4 * i)) & 0xF) as u8;
    }

    let mut check = None;
    for (i, digit) in segment.digits.iter().enumerate() {
        match *digit {
            Digit::Literal(v) => digits[i] = v & 0xF,
            Digit::Xor(v) => digits[i] ^= v & 0xF,
            Digit::Check(target) => {
                check = Some((i, target & 0xF));
                continue;
            }
        }
        *checksum = (*checksum + digits[i]) & 0xF;
    }

    if let Some((i, target)) = check {
        digits[i] = target.wrapping_sub(*checksum) & 0xF;
        *checksum = target;
    }

    digits.iter().fold(0u16, |acc, &d| (acc << 4) | d as u16)
}

/// Program sending one word per group
#[derive(Debug, Clone)]
pub struct ClassicRom {
    dialect: Dialect,
    turn: Turn,
    segments: Vec<Segment, MAX_SEGMENTS>,
    cursor: usize,
    checksum: u8,
    last_received: u16,
    log: ResultLog,
}

impl ClassicRom {
    pub fn new(dialect: Dialect, turn: Turn, segments: Vec<Segment, MAX_SEGMENTS>) -> Self {
        Self {
            dialect,
            turn,
            segments,
            cursor: 0,
            checksum: 0,
            last_received: 0,
            log: ResultLog::new(),
        }
    }

    fn rewind(&mut self) {
        self.cursor = 0;
        self.checksum = 0;
        self.last_received = 0;
        self.log.clear();
    }

    fn next(&mut self, buffer: &mut [u16]) -> usize {
        let Some(segment) = self.segments.get(self.cursor) else {
            return 0;
        };
        let word = build_word(segment, &mut self.checksum, self.last_received);
        self.cursor += 1;
        buffer[0] = word;
        self.log.push(ResultEvent::Sent(message(&[word])));
        1
    }

    fn store(&mut self, buffer: &[u16], outcome: &ReceiveOutcome) {
        if outcome.is_received() {
            self.last_received = buffer[0];
        }
        self.log.record(buffer, outcome);
    }
}

/// Program sending all groups as one message
#[derive(Debug, Clone)]
pub struct WordsRom {
    dialect: Dialect,
    turn: Turn,
    words: Message,
    sent: bool,
    log: ResultLog,
}

impl WordsRom {
    pub fn new(dialect: Dialect, turn: Turn, words: Message) -> Self {
        Self {
            dialect,
            turn,
            words,
            sent: false,
            log: ResultLog::new(),
        }
    }

    fn rewind(&mut self) {
        self.sent = false;
        self.log.clear();
    }

    fn next(&mut self, buffer: &mut [u16]) -> usize {
        if self.sent || self.words.is_empty() {
            return 0;
        }
        let n = self.words.len().min(buffer.len());
        buffer[..n].copy_from_slice(&self.words[..n]);
        self.sent = true;
        self.log.push(ResultEvent::Sent(message(&self.words[..n])));
        n
    }

    fn store(&mut self, buffer: &[u16], outcome: &ReceiveOutcome) {
        self.log.record(buffer, outcome);
    }
}

/// The active program
#[derive(Debug, Clone)]
pub enum DigiRom {
    Classic(ClassicRom),
    Words(WordsRom),
}

impl DigiRom {
    /// Build the program a parsed command describes
    pub fn from_command(cmd: &ProgramCommand) -> Self {
        if cmd.dialect.is_classic() {
            DigiRom::Classic(ClassicRom::new(cmd.dialect, cmd.turn, cmd.segments.clone()))
        } else {
            let words = cmd
                .segments
                .iter()
                .filter_map(Segment::literal_value)
                .take(MAX_MESSAGE_WORDS)
                .collect();
            DigiRom::Words(WordsRom::new(cmd.dialect, cmd.turn, words))
        }
    }

    pub fn dialect(&self) -> Dialect {
        match self {
            DigiRom::Classic(r) => r.dialect,
            DigiRom::Words(r) => r.dialect,
        }
    }

    pub fn turn(&self) -> Turn {
        match self {
            DigiRom::Classic(r) => r.turn,
            DigiRom::Words(r) => r.turn,
        }
    }

    /// Reset to the first message and clear the log
    pub fn rewind(&mut self) {
        match self {
            DigiRom::Classic(r) => r.rewind(),
            DigiRom::Words(r) => r.rewind(),
        }
    }

    /// Fill `buffer` with the next message and return its length
    ///
    /// Returns 0 when there is nothing left to send.
    pub fn next(&mut self, buffer: &mut [u16]) -> usize {
        match self {
            DigiRom::Classic(r) => r.next(buffer),
            DigiRom::Words(r) => r.next(buffer),
        }
    }

    /// Record the result of a receive
    pub fn store(&mut self, buffer: &[u16], outcome: &ReceiveOutcome) {
        match self {
            DigiRom::Classic(r) => r.store(buffer, outcome),
            DigiRom::Words(r) => r.store(buffer, outcome),
        }
    }

    pub fn log(&self) -> &ResultLog {
        match self {
            DigiRom::Classic(r) => &r.log,
            DigiRom::Words(r) => &r.log,
        }
    }

    pub fn received_anything(&self) -> bool {
        self.log().received_anything()
    }

    /// Write the exchange of the last execution
    pub fn print_result<W: Write>(&self, w: &mut W) -> fmt::Result {
        self.log().write(w)
    }
}

fn write_digit(f: &mut fmt::Formatter<'_>, digit: &Digit) -> fmt::Result {
    match digit {
        Digit::Literal(v) => write!(f, "{:X}", v),
        Digit::Check(v) => write!(f, "@{:X}", v),
        Digit::Xor(v) => write!(f, "^{:X}", v),
    }
}

/// Command-line form of the program
impl fmt::Display for DigiRom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.dialect().letter(), self.turn().digit())?;
        match self {
            DigiRom::Classic(r) => {
                for segment in &r.segments {
                    f.write_char('-')?;
                    for digit in &segment.digits {
                        write_digit(f, digit)?;
                    }
                }
            }
            DigiRom::Words(r) => {
                for word in &r.words {
                    write!(f, "-{:04X}", word)?;
                }
            }
        }
        Ok(())
    }
}
