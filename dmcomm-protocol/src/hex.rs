//! Hex digit helpers for the text protocol

use core::fmt::{self, Write};

/// Value of an ASCII hex digit (either case), or `None`
pub fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// Write words as 4-digit uppercase hex joined by `-`
pub fn write_words<W: Write>(w: &mut W, words: &[u16]) -> fmt::Result {
    for (i, word) in words.iter().enumerate() {
        if i > 0 {
            w.write_char('-')?;
        }
        write!(w, "{:04X}", word)?;
    }
    Ok(())
}

/// Write raw line bytes, replacing anything unprintable with `?`
pub fn write_printable<W: Write>(w: &mut W, bytes: &[u8]) -> fmt::Result {
    for &b in bytes {
        let c = if b.is_ascii_graphic() || b == b' ' {
            b as char
        } else {
            '?'
        };
        w.write_char(c)?;
    }
    Ok(())
}
