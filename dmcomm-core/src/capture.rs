//! Edge capture for calibrating against real toys
//!
//! When enabled, the link records every phase it drives or measures
//! during an execution: which side drove it, whether the line was
//! active, and for how long. The front-end prints the log after the run
//! as one line of tokens:
//!
//! ```text
//! d:i3000 a59000 i2083 a917 ... I2012 A60133 ... I3400+
//! ```
//!
//! Lowercase tokens are phases we drove, uppercase ones were measured.
//! `a`/`A` is active, `i`/`I` idle, `+` marks a wait that timed out. In
//! analog mode each token also carries the voltage at the start of the
//! phase as `@<mV>`.

use core::fmt::{self, Write};

use heapless::Vec;

use dmcomm_protocol::{DebugMode, Trigger};

/// Phases kept per execution
pub const CAPTURE_LEN: usize = 160;

/// One captured phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Edge {
    pub active: bool,
    /// We drove the line, rather than measured it
    pub driven: bool,
    pub duration_us: u32,
    pub timed_out: bool,
    pub millivolts: Option<u16>,
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match (self.driven, self.active) {
            (true, true) => 'a',
            (true, false) => 'i',
            (false, true) => 'A',
            (false, false) => 'I',
        };
        write!(f, "{}{}", letter, self.duration_us)?;
        if self.timed_out {
            f.write_char('+')?;
        }
        if let Some(mv) = self.millivolts {
            write!(f, "@{}", mv)?;
        }
        Ok(())
    }
}

/// Bounded per-execution edge log
#[derive(Debug, Clone)]
pub struct Capture {
    mode: DebugMode,
    trigger: Option<Trigger>,
    packet: u8,
    edges: Vec<Edge, CAPTURE_LEN>,
    truncated: bool,
}

impl Default for Capture {
    fn default() -> Self {
        Self::new()
    }
}

impl Capture {
    pub const fn new() -> Self {
        Self {
            mode: DebugMode::Off,
            trigger: None,
            packet: 0,
            edges: Vec::new(),
            truncated: false,
        }
    }

    /// Select what to record from the next execution on
    pub fn configure(&mut self, mode: DebugMode, trigger: Option<Trigger>) {
        self.mode = mode;
        self.trigger = trigger;
        self.restart();
    }

    pub fn mode(&self) -> DebugMode {
        self.mode
    }

    pub fn trigger(&self) -> Option<Trigger> {
        self.trigger
    }

    pub fn is_enabled(&self) -> bool {
        self.mode != DebugMode::Off
    }

    /// Voltages are wanted with each edge
    pub fn is_analog(&self) -> bool {
        self.mode == DebugMode::Analog
    }

    /// Forget the last execution's edges
    pub fn restart(&mut self) {
        self.packet = 0;
        self.edges.clear();
        self.truncated = false;
    }

    /// A packet is starting, sent or received
    pub fn begin_packet(&mut self) {
        self.packet = self.packet.saturating_add(1);
    }

    /// Recording, and the trigger packet has been reached
    pub fn is_armed(&self) -> bool {
        self.is_enabled() && self.packet >= self.trigger.map_or(0, Trigger::packet)
    }

    pub fn record(&mut self, edge: Edge) {
        if !self.is_armed() {
            return;
        }
        if self.edges.push(edge).is_err() {
            self.truncated = true;
        }
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Write the log line, prefixed `d:` or `a:` by mode
    pub fn write<W: Write>(&self, w: &mut W) -> fmt::Result {
        w.write_str(if self.is_analog() { "a:" } else { "d:" })?;
        for (i, edge) in self.edges.iter().enumerate() {
            if i > 0 {
                w.write_char(' ')?;
            }
            write!(w, "{}", edge)?;
        }
        if self.truncated {
            w.write_str(" ...")?;
        }
        Ok(())
    }
}

/// Trigger as printed in the capture header; `0` when capturing from the
/// start
pub struct TriggerText(pub Option<Trigger>);

impl fmt::Display for TriggerText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(t) => write!(f, "{}", t),
            None => f.write_char('0'),
        }
    }
}
