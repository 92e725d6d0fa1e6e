//! Host serial link
//!
//! Wraps the halves of a buffered UART, which implement the blocking
//! `embedded-io` traits. Reads only happen when bytes are already
//! buffered, so polling never blocks the command loop.

use embedded_io::{Read, ReadReady, Write};

use dmcomm_hal::{SerialRx, SerialTx};

/// Transmit half
pub struct SerialWriter<W> {
    tx: W,
}

impl<W: Write> SerialWriter<W> {
    pub fn new(tx: W) -> Self {
        Self { tx }
    }
}

impl<W: Write> SerialTx for SerialWriter<W> {
    type Error = W::Error;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.tx.write_all(data)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.tx.flush()
    }
}

/// Receive half
pub struct SerialReader<R> {
    rx: R,
}

impl<R: Read + ReadReady> SerialReader<R> {
    pub fn new(rx: R) -> Self {
        Self { rx }
    }
}

impl<R: Read + ReadReady> SerialRx for SerialReader<R> {
    type Error = R::Error;

    fn try_read_byte(&mut self) -> Result<Option<u8>, Self::Error> {
        if !self.rx.read_ready()? {
            return Ok(None);
        }
        let mut byte = [0u8; 1];
        match self.rx.read(&mut byte)? {
            0 => Ok(None),
            _ => Ok(Some(byte[0])),
        }
    }
}
