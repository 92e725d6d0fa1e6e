//! Line assembly for the serial command link.
//!
//! Bytes arrive one at a time from the serial port and are collected until
//! CR or LF. Blank lines are skipped, so CRLF endings produce one line.
//! A line that does not fit is reported once and the rest of it, up to the
//! next terminator, is thrown away.

use heapless::Vec;

/// Maximum command length, excluding the terminator
pub const MAX_LINE_LEN: usize = 63;

/// A complete command line without its terminator
pub type Line = Vec<u8, MAX_LINE_LEN>;

/// Errors that can occur while assembling a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineError {
    /// Line exceeded [`MAX_LINE_LEN`]; remainder will be discarded
    TooLong,
    /// Line was started but not finished before the serial timeout
    TooLate,
}

impl core::fmt::Display for LineError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            LineError::TooLong => f.write_str("too long"),
            LineError::TooLate => f.write_str("too late"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadState {
    /// Collecting bytes into the buffer
    Collecting,
    /// Skipping the tail of an oversized line
    Discarding,
}

/// State machine for assembling incoming lines
#[derive(Debug, Clone)]
pub struct LineReader {
    state: ReadState,
    buffer: Line,
}

impl Default for LineReader {
    fn default() -> Self {
        Self::new()
    }
}

fn is_terminator(byte: u8) -> bool {
    byte == b'\r' || byte == b'\n'
}

impl LineReader {
    /// Create a new line reader
    pub fn new() -> Self {
        Self {
            state: ReadState::Collecting,
            buffer: Vec::new(),
        }
    }

    /// Drop any partial line
    pub fn reset(&mut self) {
        self.state = ReadState::Collecting;
        self.buffer.clear();
    }

    /// True while a line has been started but not terminated
    pub fn is_partial(&self) -> bool {
        self.state == ReadState::Discarding || !self.buffer.is_empty()
    }

    /// Feed a single byte to the reader
    ///
    /// Returns `Ok(Some(line))` when a terminator completes a non-empty
    /// line, `Ok(None)` when more bytes are needed, or `Err` when the line
    /// overflowed.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Line>, LineError> {
        match self.state {
            ReadState::Discarding => {
                if is_terminator(byte) {
                    self.state = ReadState::Collecting;
                }
                Ok(None)
            }
            ReadState::Collecting => {
                if is_terminator(byte) {
                    if self.buffer.is_empty() {
                        return Ok(None);
                    }
                    let line = self.buffer.clone();
                    self.buffer.clear();
                    return Ok(Some(line));
                }
                if self.buffer.push(byte).is_err() {
                    self.buffer.clear();
                    self.state = ReadState::Discarding;
                    return Err(LineError::TooLong);
                }
                Ok(None)
            }
        }
    }

    /// Feed multiple bytes to the reader
    ///
    /// Returns the first complete line found, if any.
    /// Remaining bytes after a complete line are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Result<Option<Line>, LineError> {
        for &byte in bytes {
            if let Some(line) = self.feed(byte)? {
                return Ok(Some(line));
            }
        }
        Ok(None)
    }
}
