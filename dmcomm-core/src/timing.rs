//! Per-dialect timing tables
//!
//! All durations are in microseconds. Every phase has a minimum and a
//! maximum accepted when receiving plus the nominal value used when
//! sending. Values are hardware-derived and must not be tuned.

use core::fmt::{self, Write};

use dmcomm_hal::Level;
use dmcomm_protocol::Dialect;

/// Accepted range and nominal duration of one protocol phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PhaseRange {
    pub min: u32,
    pub send: u32,
    pub max: u32,
}

impl PhaseRange {
    pub const fn new(min: u32, send: u32, max: u32) -> Self {
        Self { min, send, max }
    }
}

/// Timing of one half of a data bit whose length depends on the bit value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BitPhase {
    pub min: u32,
    pub bit0_send: u32,
    pub bit1_send: u32,
    pub max: u32,
}

impl BitPhase {
    pub const fn new(min: u32, bit0_send: u32, bit1_send: u32, max: u32) -> Self {
        Self {
            min,
            bit0_send,
            bit1_send,
            max,
        }
    }

    /// Nominal duration for sending `bit`
    pub fn send(&self, bit: bool) -> u32 {
        if bit {
            self.bit1_send
        } else {
            self.bit0_send
        }
    }
}

/// Timing table for the single-word dialects
///
/// Only the idle half of each bit carries the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ClassicTiming {
    pub dialect: Dialect,
    /// Level the line is driven to for the active phase
    pub active_level: Level,
    /// Received bits are complemented (set where bit 1 has the short idle)
    pub invert_bit_read: bool,
    /// Analog sensing threshold
    pub threshold_mv: u16,
    pub pre_idle_send: u32,
    pub pre_active: PhaseRange,
    pub start_idle: PhaseRange,
    pub start_active: PhaseRange,
    pub bit_idle: BitPhase,
    /// Idle longer than this reads as 1 (before inversion)
    pub bit_idle_threshold: u32,
    pub bit_active: BitPhase,
    pub cooldown_send: u32,
    pub reply_timeout_ms: u32,
}

impl ClassicTiming {
    /// Raw bit value for a measured idle duration
    ///
    /// Exactly at the threshold reads as 0.
    pub fn bit_from_idle(&self, idle_us: u32) -> bool {
        idle_us > self.bit_idle_threshold
    }
}

/// Timing table for the variable-length color dialect
///
/// The idle half of each bit is fixed; the active half carries the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ColorTiming {
    pub active_level: Level,
    pub threshold_mv: u16,
    pub pre_idle_send: u32,
    pub pre_active: PhaseRange,
    pub bit_idle: PhaseRange,
    pub bit_active: BitPhase,
    /// Active longer than this reads as 1
    pub bit_active_threshold: u32,
    pub cooldown_send: u32,
    pub reply_timeout_ms: u32,
}

impl ColorTiming {
    /// Bit value for a measured active duration
    pub fn bit_from_active(&self, active_us: u32) -> bool {
        active_us > self.bit_active_threshold
    }
}

pub const TIMING_V: ClassicTiming = ClassicTiming {
    dialect: Dialect::V,
    active_level: Level::Low,
    invert_bit_read: false,
    threshold_mv: 1900,
    pre_idle_send: 3000,
    pre_active: PhaseRange::new(40000, 59000, 80000),
    start_idle: PhaseRange::new(1500, 2083, 2700),
    start_active: PhaseRange::new(600, 917, 1400),
    bit_idle: BitPhase::new(800, 1000, 2667, 3400),
    bit_idle_threshold: 1833,
    bit_active: BitPhase::new(1000, 3167, 1667, 4000),
    cooldown_send: 400,
    reply_timeout_ms: 100,
};

pub const TIMING_X: ClassicTiming = ClassicTiming {
    dialect: Dialect::X,
    active_level: Level::Low,
    invert_bit_read: false,
    threshold_mv: 1900,
    pre_idle_send: 3000,
    pre_active: PhaseRange::new(40000, 60000, 80000),
    start_idle: PhaseRange::new(1500, 2200, 3000),
    start_active: PhaseRange::new(1000, 1600, 2200),
    bit_idle: BitPhase::new(1000, 1600, 4000, 5000),
    bit_idle_threshold: 2600,
    bit_active: BitPhase::new(1000, 4000, 1600, 5000),
    cooldown_send: 400,
    reply_timeout_ms: 100,
};

pub const TIMING_Y: ClassicTiming = ClassicTiming {
    dialect: Dialect::Y,
    active_level: Level::High,
    invert_bit_read: true,
    threshold_mv: 1300,
    pre_idle_send: 5000,
    pre_active: PhaseRange::new(30000, 40000, 50000),
    start_idle: PhaseRange::new(9000, 11000, 13000),
    start_active: PhaseRange::new(4000, 6000, 8000),
    bit_idle: BitPhase::new(1000, 4000, 1400, 5200),
    bit_idle_threshold: 3000,
    bit_active: BitPhase::new(1000, 1600, 4400, 5600),
    cooldown_send: 200,
    reply_timeout_ms: 100,
};

pub const TIMING_COLOR: ColorTiming = ColorTiming {
    active_level: Level::Low,
    threshold_mv: 1900,
    pre_idle_send: 3000,
    pre_active: PhaseRange::new(15000, 20000, 25000),
    bit_idle: PhaseRange::new(300, 500, 1000),
    bit_active: BitPhase::new(300, 600, 1500, 2200),
    bit_active_threshold: 1000,
    cooldown_send: 400,
    reply_timeout_ms: 100,
};

/// Table for a classic dialect
///
/// Non-classic dialects fall back to V.
pub fn classic(dialect: Dialect) -> &'static ClassicTiming {
    match dialect {
        Dialect::X => &TIMING_X,
        Dialect::Y => &TIMING_Y,
        _ => &TIMING_V,
    }
}

/// Line polarity and analog threshold used by a dialect
pub fn signal_params(dialect: Dialect) -> (Level, u16) {
    match dialect {
        Dialect::Color => (TIMING_COLOR.active_level, TIMING_COLOR.threshold_mv),
        d => {
            let t = classic(d);
            (t.active_level, t.threshold_mv)
        }
    }
}

fn write_range<W: Write>(w: &mut W, name: &str, r: &PhaseRange) -> fmt::Result {
    write!(w, " {}={}/{}/{}", name, r.min, r.send, r.max)
}

fn write_bits<W: Write>(w: &mut W, name: &str, b: &BitPhase) -> fmt::Result {
    write!(w, " {}={}/{}:{}/{}", name, b.min, b.bit0_send, b.bit1_send, b.max)
}

fn level_char(level: Level) -> char {
    if level.is_high() {
        'H'
    } else {
        'L'
    }
}

/// Write a one-line summary of a dialect's timing table
pub fn write_timing<W: Write>(w: &mut W, dialect: Dialect) -> fmt::Result {
    write!(w, "timing {}:", dialect.letter())?;
    match dialect {
        Dialect::Color => {
            let t = &TIMING_COLOR;
            write!(w, " active={} threshold={}mV", level_char(t.active_level), t.threshold_mv)?;
            write!(w, " pre_idle={}", t.pre_idle_send)?;
            write_range(w, "pre_active", &t.pre_active)?;
            write_range(w, "bit_idle", &t.bit_idle)?;
            write_bits(w, "bit_active", &t.bit_active)?;
            write!(w, " split={}", t.bit_active_threshold)?;
            write!(w, " cooldown={} reply={}ms", t.cooldown_send, t.reply_timeout_ms)
        }
        d => {
            let t = classic(d);
            write!(w, " active={} threshold={}mV", level_char(t.active_level), t.threshold_mv)?;
            if t.invert_bit_read {
                w.write_str(" inverted")?;
            }
            write!(w, " pre_idle={}", t.pre_idle_send)?;
            write_range(w, "pre_active", &t.pre_active)?;
            write_range(w, "start_idle", &t.start_idle)?;
            write_range(w, "start_active", &t.start_active)?;
            write_bits(w, "bit_idle", &t.bit_idle)?;
            write!(w, " split={}", t.bit_idle_threshold)?;
            write_bits(w, "bit_active", &t.bit_active)?;
            write!(w, " cooldown={} reply={}ms", t.cooldown_send, t.reply_timeout_ms)
        }
    }
}
