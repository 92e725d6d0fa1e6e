//! Serial communication abstractions
//!
//! The host talks to the adapter over a byte stream carrying text lines.
//! Reads are non-blocking so the command loop can keep polling while a
//! program waits for its next run.

/// Serial transmitter
pub trait SerialTx {
    /// Error type for transmit operations
    type Error;

    /// Write data to the link
    ///
    /// Blocks until all data has been written or an error occurs.
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Flush any buffered data
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// Serial receiver
pub trait SerialRx {
    /// Error type for receive operations
    type Error;

    /// Read a single byte if one is available
    ///
    /// Returns `Ok(None)` immediately when nothing has arrived.
    fn try_read_byte(&mut self) -> Result<Option<u8>, Self::Error>;
}

