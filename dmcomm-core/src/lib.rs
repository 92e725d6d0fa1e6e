//! Board-agnostic protocol core for the prong adapter
//!
//! This crate contains everything between the pins and the serial text
//! protocol that does not depend on a particular chip:
//!
//! - Prong signal port over the HAL pin traits
//! - Per-dialect timing tables
//! - Classic (V/X/Y) and Color codecs
//! - DigiROM programs and their result log
//! - Session controller running listen/initiator/responder exchanges
//! - Line protocol front-end driving the whole stack from a host
//! - Edge capture for calibration
//! - Board and session configuration

#![no_std]
#![deny(unsafe_code)]

pub mod capture;
pub mod codec;
pub mod config;
pub mod controller;
pub mod digirom;
pub mod frontend;
pub mod indicator;
pub mod outcome;
pub mod prong;
pub mod timing;

pub use controller::{Controller, ControllerError};
pub use digirom::DigiRom;
pub use frontend::FrontEnd;
pub use outcome::{ReceiveOutcome, ReceiveStatus};
