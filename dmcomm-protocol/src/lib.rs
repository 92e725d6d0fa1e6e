//! Serial Line Command Protocol
//!
//! This crate defines the text protocol spoken between a host and the
//! prong adapter. The host sends one command per line:
//!
//! ```text
//! ┌─────────┬──────────┬──────┬─────────────────────────┐
//! │ OP1     │ [OP2]    │ TURN │ [-WORD]*                │
//! │ V/X/Y/C │ I/T/...  │ 0-2  │ 4 hex digits per word   │
//! └─────────┴──────────┴──────┴─────────────────────────┘
//! ```
//!
//! `D<mode>[-<n><A|B>]` configures edge capture instead.
//!
//! For example `V1-FC03-ED12` asks the adapter to speak first using the
//! V dialect and send the two words `0xFC03` and `0xED12`, listening for a
//! reply after each. Lines end with CR or LF.
//!
//! The adapter echoes each line, reports `(new DigiROM)` or `(paused)`,
//! and later prints what it sent and received as `s:XXXX r:XXXX ...`.

#![no_std]
#![deny(unsafe_code)]

pub mod command;
pub mod hex;
pub mod line;

pub use command::{
    parse_command, Command, CommandError, DebugMode, Dialect, Digit, ProgramCommand, Segment,
    Trigger, Turn, MAX_MESSAGE_WORDS, MAX_SEGMENTS,
};
pub use line::{Line, LineError, LineReader, MAX_LINE_LEN};
