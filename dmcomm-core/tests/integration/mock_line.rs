//! Simulated prong line for integration tests.
//!
//! One shared state holds simulated time, our pins, scripted toy
//! transmissions and the host serial buffers. Time advances 10 µs every
//! time the clock is read and 1 ms on every yield, so busy-wait loops
//! make progress without real waiting.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::convert::Infallible;
use std::rc::Rc;

use dmcomm_core::config::SessionConfig;
use dmcomm_core::prong::{Link, ProngInput, ProngOutput};
use dmcomm_core::timing::{ClassicTiming, ColorTiming};
use dmcomm_core::{Controller, FrontEnd};
use dmcomm_hal::adc::NoAnalog;
use dmcomm_hal::{AnalogInput, Clock, InputPin, OutputPin, SerialRx, SerialTx};

/// Clock step per read
pub const TICK_US: u64 = 10;

/// Gap between our release and a scripted reply
pub const REPLY_GAP_US: u64 = 2000;

// ── Waveforms ─────────────────────────────────────────────────

/// Levels driven by one side, as (offset µs, line high) edges
#[derive(Debug, Clone, Default)]
pub struct Waveform {
    pub edges: Vec<(u64, bool)>,
    /// Offset at which the sender lets go of the line
    pub end_us: u64,
}

impl Waveform {
    fn level_at(&self, offset: u64) -> Option<bool> {
        if offset >= self.end_us {
            return None;
        }
        self.edges
            .iter()
            .take_while(|(t, _)| *t <= offset)
            .last()
            .map(|(_, high)| *high)
    }

    /// Keep the line at its last level for `extra_us` longer
    pub fn hold_end(mut self, extra_us: u64) -> Self {
        self.end_us += extra_us;
        self
    }
}

/// Builds a waveform phase by phase
pub struct WaveBuilder {
    active_high: bool,
    offset: u64,
    wave: Waveform,
}

impl WaveBuilder {
    pub fn new(active_high: bool) -> Self {
        Self {
            active_high,
            offset: 0,
            wave: Waveform::default(),
        }
    }

    pub fn idle(&mut self, us: u32) -> &mut Self {
        self.wave.edges.push((self.offset, !self.active_high));
        self.offset += us as u64;
        self
    }

    pub fn active(&mut self, us: u32) -> &mut Self {
        self.wave.edges.push((self.offset, self.active_high));
        self.offset += us as u64;
        self
    }

    pub fn finish(&mut self) -> Waveform {
        let mut wave = core::mem::take(&mut self.wave);
        wave.end_us = self.offset;
        wave
    }
}

/// A toy sending one classic word at nominal timing
pub fn toy_classic(t: &ClassicTiming, word: u16) -> Waveform {
    let mut w = WaveBuilder::new(t.active_level.is_high());
    w.idle(t.pre_idle_send)
        .active(t.pre_active.send)
        .idle(t.start_idle.send)
        .active(t.start_active.send);
    for i in 0..16 {
        let bit = (word >> i) & 1 != 0;
        w.idle(t.bit_idle.send(bit)).active(t.bit_active.send(bit));
    }
    w.idle(t.cooldown_send);
    w.finish()
}

/// A toy sending a color message at nominal timing
pub fn toy_color(t: &ColorTiming, words: &[u16]) -> Waveform {
    let mut w = WaveBuilder::new(t.active_level.is_high());
    w.idle(t.pre_idle_send).active(t.pre_active.send);
    for &word in words {
        for i in 0..16 {
            let bit = (word >> i) & 1 != 0;
            w.idle(t.bit_idle.send).active(t.bit_active.send(bit));
        }
    }
    w.idle(t.cooldown_send);
    w.finish()
}

// ── Shared line state ─────────────────────────────────────────

pub struct LineState {
    pub now_us: u64,
    /// Our signal pin level
    pub out_high: bool,
    /// Our output enable is on
    pub driving: bool,
    /// Line forced to a level, e.g. a shorted prong
    pub forced: Option<bool>,
    /// Scheduled toy transmissions (absolute start, waveform)
    pub bursts: Vec<(u64, Waveform)>,
    /// Replies sent after each of our transmissions, in order
    pub replies: VecDeque<Waveform>,
    drove_since_release: bool,
    recording: Option<Vec<(u64, bool)>>,
    last_release_us: u64,
    /// Analog level reported for a high line
    pub high_mv: u16,
    pub serial_in: VecDeque<u8>,
    pub serial_out: Vec<u8>,
}

impl LineState {
    fn line_high(&self) -> bool {
        if let Some(level) = self.forced {
            return level;
        }
        if self.driving {
            return self.out_high;
        }
        for (start, wave) in &self.bursts {
            if self.now_us >= *start {
                if let Some(level) = wave.level_at(self.now_us - start) {
                    return level;
                }
            }
        }
        // Released pin still pulls the line through its resistor
        self.out_high
    }

    fn record(&mut self) {
        if self.driving {
            let now = self.now_us;
            let high = self.out_high;
            if let Some(rec) = self.recording.as_mut() {
                rec.push((now, high));
            }
        }
    }

    fn on_release(&mut self) {
        self.last_release_us = self.now_us;
        if self.drove_since_release {
            self.drove_since_release = false;
            if let Some(reply) = self.replies.pop_front() {
                self.bursts.push((self.now_us + REPLY_GAP_US, reply));
            }
        }
    }
}

/// Handle to the simulated line
#[derive(Clone)]
pub struct MockLine(pub Rc<RefCell<LineState>>);

impl MockLine {
    /// Idle line, released pin resting high
    pub fn new() -> Self {
        Self(Rc::new(RefCell::new(LineState {
            now_us: 0,
            out_high: true,
            driving: false,
            forced: None,
            bursts: Vec::new(),
            replies: VecDeque::new(),
            drove_since_release: false,
            recording: None,
            last_release_us: 0,
            high_mv: 3300,
            serial_in: VecDeque::new(),
            serial_out: Vec::new(),
        })))
    }

    pub fn now_us(&self) -> u64 {
        self.0.borrow().now_us
    }

    /// Jump simulated time, e.g. close to a counter wrap
    pub fn set_now_us(&self, now_us: u64) {
        self.0.borrow_mut().now_us = now_us;
    }

    pub fn advance_ms(&self, ms: u64) {
        self.0.borrow_mut().now_us += ms * 1000;
    }

    /// Toy transmission starting `delay_us` from now
    pub fn schedule_in(&self, delay_us: u64, wave: Waveform) {
        let mut s = self.0.borrow_mut();
        let start = s.now_us + delay_us;
        s.bursts.push((start, wave));
    }

    /// Toy answer to our next transmission
    pub fn queue_reply(&self, wave: Waveform) {
        self.0.borrow_mut().replies.push_back(wave);
    }

    pub fn force(&self, level: Option<bool>) {
        self.0.borrow_mut().forced = level;
    }

    pub fn start_recording(&self) {
        self.0.borrow_mut().recording = Some(Vec::new());
    }

    /// What we drove since [`start_recording`](Self::start_recording),
    /// ending at our last release
    pub fn take_recording(&self) -> Waveform {
        let mut s = self.0.borrow_mut();
        let edges = s.recording.take().unwrap_or_default();
        let first = edges.first().map(|(t, _)| *t).unwrap_or(0);
        Waveform {
            edges: edges.iter().map(|(t, h)| (t - first, *h)).collect(),
            end_us: s.last_release_us.saturating_sub(first),
        }
    }

    pub fn type_line(&self, line: &str) {
        self.0.borrow_mut().serial_in.extend(line.bytes());
    }

    /// Drain everything written to the host so far
    pub fn take_output(&self) -> String {
        let bytes = std::mem::take(&mut self.0.borrow_mut().serial_out);
        String::from_utf8(bytes).expect("output is ASCII")
    }
}

// ── Pins ──────────────────────────────────────────────────────

pub struct SimOut(MockLine);

impl OutputPin for SimOut {
    fn set_high(&mut self) {
        let mut s = self.0 .0.borrow_mut();
        s.out_high = true;
        s.record();
    }

    fn set_low(&mut self) {
        let mut s = self.0 .0.borrow_mut();
        s.out_high = false;
        s.record();
    }

    fn is_set_high(&self) -> bool {
        self.0 .0.borrow().out_high
    }
}

/// Active-low output enable
pub struct SimNotOe(MockLine);

impl OutputPin for SimNotOe {
    fn set_high(&mut self) {
        let mut s = self.0 .0.borrow_mut();
        if s.driving {
            s.driving = false;
            s.on_release();
        }
    }

    fn set_low(&mut self) {
        let mut s = self.0 .0.borrow_mut();
        if !s.driving {
            s.driving = true;
            s.record();
        }
        s.drove_since_release = true;
    }

    fn is_set_high(&self) -> bool {
        !self.0 .0.borrow().driving
    }
}

pub struct SimSense(MockLine);

impl InputPin for SimSense {
    fn is_high(&mut self) -> bool {
        self.0 .0.borrow().line_high()
    }
}

pub struct SimAdc(MockLine);

impl AnalogInput for SimAdc {
    fn read_millivolts(&mut self) -> u16 {
        let s = self.0 .0.borrow();
        if s.line_high() {
            s.high_mv
        } else {
            0
        }
    }
}

pub struct SimClock(MockLine);

impl Clock for SimClock {
    fn now_micros(&self) -> u32 {
        let mut s = self.0 .0.borrow_mut();
        let now = s.now_us;
        s.now_us += TICK_US;
        now as u32
    }

    fn now_millis(&self) -> u32 {
        let mut s = self.0 .0.borrow_mut();
        let now = s.now_us;
        s.now_us += TICK_US;
        (now / 1000) as u32
    }

    fn yield_now(&self) {
        self.0 .0.borrow_mut().now_us += 1000;
    }
}

// ── Serial ────────────────────────────────────────────────────

pub struct SimTx(MockLine);

impl SerialTx for SimTx {
    type Error = Infallible;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Infallible> {
        self.0 .0.borrow_mut().serial_out.extend_from_slice(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Infallible> {
        Ok(())
    }
}

pub struct SimRx(MockLine);

impl SerialRx for SimRx {
    type Error = Infallible;

    fn try_read_byte(&mut self) -> Result<Option<u8>, Infallible> {
        Ok(self.0 .0.borrow_mut().serial_in.pop_front())
    }
}

// ── Assemblies ────────────────────────────────────────────────

pub type SimOutput = ProngOutput<SimOut, SimNotOe>;
pub type SimLink = Link<SimOutput, ProngInput<SimSense, NoAnalog>, SimClock>;
pub type SimController = Controller<SimOutput, ProngInput<SimSense, NoAnalog>, SimClock>;
pub type SimFrontEnd = FrontEnd<SimTx, SimRx, ()>;

impl MockLine {
    pub fn link(&self) -> SimLink {
        Link::new(
            ProngOutput::with_enable(SimOut(self.clone()), SimNotOe(self.clone())),
            ProngInput::digital(SimSense(self.clone())),
            SimClock(self.clone()),
        )
    }

    pub fn analog_link(
        &self,
    ) -> Link<SimOutput, ProngInput<dmcomm_hal::gpio::NoPin, SimAdc>, SimClock> {
        Link::new(
            ProngOutput::with_enable(SimOut(self.clone()), SimNotOe(self.clone())),
            ProngInput::analog(SimAdc(self.clone())),
            SimClock(self.clone()),
        )
    }

    pub fn controller(&self) -> SimController {
        Controller::with_all_codecs(self.link(), 300)
    }

    pub fn frontend(&self) -> SimFrontEnd {
        FrontEnd::new(
            SimTx(self.clone()),
            SimRx(self.clone()),
            (),
            SessionConfig::default(),
        )
    }
}
