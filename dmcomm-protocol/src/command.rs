//! Command grammar for the serial line protocol.
//!
//! A command line is one or two op letters, a turn digit for program
//! commands, then zero or more `-`-prefixed groups of four digit tokens:
//!
//! - `V`, `X`, `Y` select a classic dialect, `C` the color dialect
//! - `I` prints build info, `T` runs a prong test; either may be paired
//!   with a dialect letter (`VI`, `YT`) and then takes no turn or data
//! - turn `0` listens only, `1` speaks first, `2` answers
//! - `D` sets up edge capture: `D0`/`DO` off, `D1`/`DD` digital, `D2`/`DA`
//!   analog, optionally followed by `-<n><A|B>` to start capturing at
//!   packet A or B of exchange `n` (hex 1-F)
//!
//! Each group normally holds four hex digits. Classic groups may also use
//! `@h` (check digit: choose this nibble so the running checksum becomes
//! `h`) and `^h` (XOR the matching nibble of the last received word).

use core::fmt;

use heapless::Vec;

use crate::hex::hex_value;

/// Maximum number of `-` groups in one command
pub const MAX_SEGMENTS: usize = 12;

/// Maximum number of 16-bit words in one message on the line
pub const MAX_MESSAGE_WORDS: usize = 8;

/// Signal encoding spoken on the prong
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Dialect {
    V,
    X,
    Y,
    /// Variable-length color dialect
    Color,
}

impl Dialect {
    /// Parse a dialect from its op letter (case-insensitive)
    pub fn from_letter(c: u8) -> Option<Self> {
        match c.to_ascii_uppercase() {
            b'V' => Some(Dialect::V),
            b'X' => Some(Dialect::X),
            b'Y' => Some(Dialect::Y),
            b'C' => Some(Dialect::Color),
            _ => None,
        }
    }

    /// Op letter for this dialect
    pub fn letter(self) -> char {
        match self {
            Dialect::V => 'V',
            Dialect::X => 'X',
            Dialect::Y => 'Y',
            Dialect::Color => 'C',
        }
    }

    /// Single-word dialects sharing the classic pulse layout
    pub fn is_classic(self) -> bool {
        matches!(self, Dialect::V | Dialect::X | Dialect::Y)
    }
}

/// Role taken during an exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Turn {
    /// Receive only
    Listen,
    /// Send first, then alternate
    Initiator,
    /// Receive first, then alternate
    Responder,
}

impl Turn {
    /// Parse a turn from its digit
    pub fn from_digit(c: u8) -> Option<Self> {
        match c {
            b'0' => Some(Turn::Listen),
            b'1' => Some(Turn::Initiator),
            b'2' => Some(Turn::Responder),
            _ => None,
        }
    }

    pub fn digit(self) -> char {
        match self {
            Turn::Listen => '0',
            Turn::Initiator => '1',
            Turn::Responder => '2',
        }
    }
}

/// One nibble position of a group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Digit {
    /// Plain hex digit
    Literal(u8),
    /// `@h`: computed so the running checksum equals `h`
    Check(u8),
    /// `^h`: last received nibble XOR `h`
    Xor(u8),
}

/// One `-` group: exactly four nibble positions, most significant first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Segment {
    pub digits: [Digit; 4],
}

impl Segment {
    /// Group made of the four literal nibbles of `word`
    pub fn literal(word: u16) -> Self {
        let nibble = |shift: u16| Digit::Literal(((word >> shift) & 0xF) as u8);
        Self {
            digits: [nibble(12), nibble(8), nibble(4), nibble(0)],
        }
    }

    /// The word this group spells if it has no `@`/`^` tokens
    pub fn literal_value(&self) -> Option<u16> {
        self.digits.iter().try_fold(0u16, |acc, d| match d {
            Digit::Literal(v) => Some((acc << 4) | *v as u16),
            _ => None,
        })
    }
}

/// What the edge capture records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DebugMode {
    Off,
    /// Line activity and phase durations
    Digital,
    /// Durations plus the voltage at the start of each phase
    Analog,
}

impl DebugMode {
    pub fn name(self) -> &'static str {
        match self {
            DebugMode::Off => "off",
            DebugMode::Digital => "digital",
            DebugMode::Analog => "analog",
        }
    }
}

/// Packet from which capture starts
///
/// Packets are counted through an execution, ours and the toy's alike.
/// Exchange `n` holds packets `2n-1` (A) and `2n` (B).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Trigger {
    /// 1-15
    pub exchange: u8,
    /// B, the second packet of the exchange
    pub second: bool,
}

impl Trigger {
    /// 1-based packet number
    pub fn packet(self) -> u8 {
        self.exchange * 2 - 1 + self.second as u8
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:X}{}", self.exchange, if self.second { 'B' } else { 'A' })
    }
}

/// A command that loads a new program
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ProgramCommand {
    pub dialect: Dialect,
    pub turn: Turn,
    pub segments: Vec<Segment, MAX_SEGMENTS>,
}

/// A parsed command line
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Print build info, plus the timing table of a dialect if given
    Info(Option<Dialect>),
    /// Exercise the prong and report what the input sees
    ProngTest(Option<Dialect>),
    /// Configure edge capture for later executions
    Debug {
        mode: DebugMode,
        trigger: Option<Trigger>,
    },
    /// Load a program
    Program(ProgramCommand),
}

/// Errors that can occur while parsing a command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Nothing on the line
    Empty,
    /// First characters are not a known op letter
    UnknownOp(u8),
    /// More than two op letters
    TooManyOps,
    /// Two dialects, or both info and prong test
    ConflictingOps,
    /// Program command without a turn digit
    MissingTurn,
    /// Turn character is not 0, 1 or 2
    InvalidTurn(u8),
    /// Speaking turn with no words to send
    MissingData,
    /// Data where none is accepted
    UnexpectedData,
    /// Malformed group (index from 0)
    InvalidSegment(usize),
    /// `@`/`^` used outside a classic program (group index)
    TokenNotAllowed(usize),
    /// More groups than fit in a program or message
    TooManySegments,
    /// Debug command without a known mode character
    InvalidDebugMode(u8),
    /// Debug trigger is not `-<1-F><A|B>`
    InvalidTrigger,
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommandError::Empty => f.write_str("empty command"),
            CommandError::UnknownOp(c) => write!(f, "unknown op '{}'", printable(*c)),
            CommandError::TooManyOps => f.write_str("too many op letters"),
            CommandError::ConflictingOps => f.write_str("conflicting op letters"),
            CommandError::MissingTurn => f.write_str("missing turn digit"),
            CommandError::InvalidTurn(c) => write!(f, "bad turn '{}'", printable(*c)),
            CommandError::MissingData => f.write_str("no data to send"),
            CommandError::UnexpectedData => f.write_str("unexpected data"),
            CommandError::InvalidSegment(i) => write!(f, "bad group {}", i + 1),
            CommandError::TokenNotAllowed(i) => write!(f, "token not allowed in group {}", i + 1),
            CommandError::TooManySegments => f.write_str("too many groups"),
            CommandError::InvalidDebugMode(c) => write!(f, "bad debug mode '{}'", printable(*c)),
            CommandError::InvalidTrigger => f.write_str("bad trigger"),
        }
    }
}

fn printable(c: u8) -> char {
    if c.is_ascii_graphic() {
        c as char
    } else {
        '?'
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    Info,
    ProngTest,
}

/// Parse one command line (without terminator)
pub fn parse_command(line: &[u8]) -> Result<Command, CommandError> {
    let first = *line.first().ok_or(CommandError::Empty)?;
    if first.to_ascii_uppercase() == b'D' {
        return parse_debug(&line[1..]);
    }

    let mut dialect = None;
    let mut mode = None;
    let mut pos = 0;
    while pos < line.len() && line[pos].is_ascii_alphabetic() {
        if pos >= 2 {
            return Err(CommandError::TooManyOps);
        }
        let c = line[pos].to_ascii_uppercase();
        match c {
            b'I' | b'T' => {
                if mode.is_some() {
                    return Err(CommandError::ConflictingOps);
                }
                mode = Some(if c == b'I' { Mode::Info } else { Mode::ProngTest });
            }
            _ => {
                let d = Dialect::from_letter(c).ok_or(CommandError::UnknownOp(c))?;
                if dialect.is_some() {
                    return Err(CommandError::ConflictingOps);
                }
                dialect = Some(d);
            }
        }
        pos += 1;
    }
    let rest = &line[pos..];

    let dialect = match (mode, dialect) {
        (Some(mode), dialect) => {
            if !rest.is_empty() {
                return Err(CommandError::UnexpectedData);
            }
            return Ok(match mode {
                Mode::Info => Command::Info(dialect),
                Mode::ProngTest => Command::ProngTest(dialect),
            });
        }
        (None, Some(dialect)) => dialect,
        (None, None) => return Err(CommandError::UnknownOp(first)),
    };

    let turn_char = *rest.first().ok_or(CommandError::MissingTurn)?;
    let turn = Turn::from_digit(turn_char).ok_or(CommandError::InvalidTurn(turn_char))?;
    let segments = parse_segments(&rest[1..], dialect.is_classic())?;

    match turn {
        Turn::Listen if !segments.is_empty() => return Err(CommandError::UnexpectedData),
        Turn::Initiator | Turn::Responder if segments.is_empty() => {
            return Err(CommandError::MissingData)
        }
        _ => {}
    }
    if !dialect.is_classic() && segments.len() > MAX_MESSAGE_WORDS {
        return Err(CommandError::TooManySegments);
    }

    Ok(Command::Program(ProgramCommand {
        dialect,
        turn,
        segments,
    }))
}

fn parse_debug(rest: &[u8]) -> Result<Command, CommandError> {
    let mode = match rest.first().copied() {
        Some(b'0' | b'o' | b'O') => DebugMode::Off,
        Some(b'1' | b'd' | b'D') => DebugMode::Digital,
        Some(b'2' | b'a' | b'A') => DebugMode::Analog,
        Some(c) => return Err(CommandError::InvalidDebugMode(c)),
        None => return Err(CommandError::InvalidDebugMode(b' ')),
    };

    let trigger = match &rest[1..] {
        [] => None,
        [b'-', n, ab] => {
            let exchange = hex_value(*n)
                .filter(|&n| n >= 1)
                .ok_or(CommandError::InvalidTrigger)?;
            let second = match ab.to_ascii_uppercase() {
                b'A' => false,
                b'B' => true,
                _ => return Err(CommandError::InvalidTrigger),
            };
            Some(Trigger { exchange, second })
        }
        _ => return Err(CommandError::InvalidTrigger),
    };

    Ok(Command::Debug { mode, trigger })
}

fn parse_segments(
    data: &[u8],
    allow_tokens: bool,
) -> Result<Vec<Segment, MAX_SEGMENTS>, CommandError> {
    let mut segments = Vec::new();
    let mut pos = 0;

    while pos < data.len() {
        let index = segments.len();
        let bad = CommandError::InvalidSegment(index);
        if data[pos] != b'-' {
            return Err(bad);
        }
        pos += 1;

        let mut digits = [Digit::Literal(0); 4];
        let mut has_check = false;
        for digit in digits.iter_mut() {
            let c = *data.get(pos).ok_or(bad)?;
            match c {
                b'@' | b'^' => {
                    if !allow_tokens {
                        return Err(CommandError::TokenNotAllowed(index));
                    }
                    let v = data.get(pos + 1).copied().and_then(hex_value).ok_or(bad)?;
                    *digit = if c == b'@' {
                        if has_check {
                            return Err(bad);
                        }
                        has_check = true;
                        Digit::Check(v)
                    } else {
                        Digit::Xor(v)
                    };
                    pos += 2;
                }
                _ => {
                    *digit = Digit::Literal(hex_value(c).ok_or(bad)?);
                    pos += 1;
                }
            }
        }

        segments
            .push(Segment { digits })
            .map_err(|_| CommandError::TooManySegments)?;
    }

    Ok(segments)
}
