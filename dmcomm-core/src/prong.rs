//! Prong signal port
//!
//! A prong link is one output driver and one input sampler on the same
//! physical line, plus the clock used to time them. The output may have a
//! separate active-low output-enable so it can let go of the line entirely.

use dmcomm_hal::adc::NoAnalog;
use dmcomm_hal::gpio::NoPin;
use dmcomm_hal::{AnalogInput, Clock, InputPin, Level, OutputPin};

use crate::capture::{Capture, Edge};

/// Remaining wait above which a wait loop yields between samples
pub const YIELD_THRESHOLD_US: u32 = 250_000;

/// Driving side of a prong
pub trait SignalOutput {
    /// Fix the active level for the rest of the session
    fn set_active_level(&mut self, level: Level);

    fn drive_active(&mut self);

    fn drive_idle(&mut self);

    /// Stop driving; the line must read as idle afterwards
    fn release(&mut self);
}

/// Sensing side of a prong
pub trait SignalInput {
    /// Fix the active level for the rest of the session
    fn set_active_level(&mut self, level: Level);

    /// Analog decision threshold, ignored by digital inputs
    fn set_threshold_mv(&mut self, threshold_mv: u16);

    /// Instantaneous sample
    fn is_active(&mut self) -> bool;

    /// Raw voltage, if the input can measure one
    fn millivolts(&mut self) -> Option<u16> {
        None
    }
}

/// Output driver over a signal pin and optional output-enable pin
///
/// Release drives the signal pin to the idle level with the enable off,
/// which matters on boards where the pin still reaches the line through
/// a pull resistor.
pub struct ProngOutput<P: OutputPin, E: OutputPin = NoPin> {
    out: P,
    not_oe: Option<E>,
    active: Level,
}

impl<P: OutputPin> ProngOutput<P, NoPin> {
    /// Output with no enable pin
    pub fn new(out: P) -> Self {
        Self {
            out,
            not_oe: None,
            active: Level::Low,
        }
    }
}

impl<P: OutputPin, E: OutputPin> ProngOutput<P, E> {
    /// Output gated by an active-low enable
    pub fn with_enable(out: P, not_oe: E) -> Self {
        Self::with_optional_enable(out, Some(not_oe))
    }

    /// Enable pin decided at runtime, e.g. from board configuration
    pub fn with_optional_enable(out: P, not_oe: Option<E>) -> Self {
        Self {
            out,
            not_oe,
            active: Level::Low,
        }
    }

    pub fn active_level(&self) -> Level {
        self.active
    }

    fn enable(&mut self, on: bool) {
        if let Some(oe) = self.not_oe.as_mut() {
            if on {
                oe.set_low();
            } else {
                oe.set_high();
            }
        }
    }
}

impl<P: OutputPin, E: OutputPin> SignalOutput for ProngOutput<P, E> {
    fn set_active_level(&mut self, level: Level) {
        self.active = level;
    }

    fn drive_active(&mut self) {
        self.out.set_level(self.active);
        self.enable(true);
    }

    fn drive_idle(&mut self) {
        self.out.set_level(self.active.inverted());
        self.enable(true);
    }

    fn release(&mut self) {
        self.enable(false);
        self.out.set_level(self.active.inverted());
    }
}

/// Input sampler, either a digital pin or an ADC channel
pub enum ProngInput<D: InputPin = NoPin, A: AnalogInput = NoAnalog> {
    Digital { pin: D, active: Level },
    Analog { adc: A, active: Level, threshold_mv: u16 },
}

impl<D: InputPin> ProngInput<D, NoAnalog> {
    pub fn digital(pin: D) -> Self {
        ProngInput::Digital {
            pin,
            active: Level::Low,
        }
    }
}

impl<A: AnalogInput> ProngInput<NoPin, A> {
    pub fn analog(adc: A) -> Self {
        ProngInput::Analog {
            adc,
            active: Level::Low,
            threshold_mv: 1900,
        }
    }
}

impl<D: InputPin, A: AnalogInput> SignalInput for ProngInput<D, A> {
    fn set_active_level(&mut self, level: Level) {
        match self {
            ProngInput::Digital { active, .. } | ProngInput::Analog { active, .. } => {
                *active = level
            }
        }
    }

    fn set_threshold_mv(&mut self, mv: u16) {
        if let ProngInput::Analog { threshold_mv, .. } = self {
            *threshold_mv = mv;
        }
    }

    fn is_active(&mut self) -> bool {
        match self {
            ProngInput::Digital { pin, active } => pin.level() == *active,
            ProngInput::Analog {
                adc,
                active,
                threshold_mv,
            } => Level::from_high(adc.read_millivolts() >= *threshold_mv) == *active,
        }
    }

    fn millivolts(&mut self) -> Option<u16> {
        match self {
            ProngInput::Digital { .. } => None,
            ProngInput::Analog { adc, .. } => Some(adc.read_millivolts()),
        }
    }
}

/// A prong output, input and clock used together
pub struct Link<O, I, C> {
    pub output: O,
    pub input: I,
    pub clock: C,
    /// Edge log, off unless configured
    pub capture: Capture,
}

impl<O: SignalOutput, I: SignalInput, C: Clock> Link<O, I, C> {
    pub fn new(output: O, input: I, clock: C) -> Self {
        Self {
            output,
            input,
            clock,
            capture: Capture::new(),
        }
    }

    /// Mark the start of a packet for the capture trigger
    pub fn begin_packet(&mut self) {
        self.capture.begin_packet();
    }

    /// Set polarity on both sides and the input threshold
    pub fn configure(&mut self, active: Level, threshold_mv: u16) {
        self.output.set_active_level(active);
        self.input.set_active_level(active);
        self.input.set_threshold_mv(threshold_mv);
    }

    /// Drive idle for `us` microseconds
    pub fn hold_idle(&mut self, us: u32) {
        self.output.drive_idle();
        self.hold(false, us);
    }

    /// Drive active for `us` microseconds
    pub fn hold_active(&mut self, us: u32) {
        self.output.drive_active();
        self.hold(true, us);
    }

    fn hold(&mut self, active: bool, us: u32) {
        let millivolts = self.sample_millivolts();
        self.clock.delay_micros(us);
        if self.capture.is_armed() {
            self.capture.record(Edge {
                active,
                driven: true,
                duration_us: us,
                timed_out: false,
                millivolts,
            });
        }
    }

    fn sample_millivolts(&mut self) -> Option<u16> {
        if self.capture.is_armed() && self.capture.is_analog() {
            self.input.millivolts()
        } else {
            None
        }
    }

    pub fn release(&mut self) {
        self.output.release();
    }

    pub fn is_active(&mut self) -> bool {
        self.input.is_active()
    }

    /// Busy-poll until the input's activity equals `active`
    ///
    /// Returns the elapsed time, or `None` once more than `timeout_us`
    /// has passed. Yields to the clock while the remaining time is long.
    ///
    /// With capture armed, the phase that just ended is recorded.
    pub fn wait_for(&mut self, active: bool, timeout_us: u32) -> Option<u32> {
        let millivolts = self.sample_millivolts();
        let start = self.clock.now_micros();
        let (elapsed, timed_out) = loop {
            let sample = self.input.is_active();
            let elapsed = self.clock.now_micros().wrapping_sub(start);
            if sample == active {
                break (elapsed, false);
            }
            if elapsed > timeout_us {
                break (elapsed, true);
            }
            if timeout_us - elapsed > YIELD_THRESHOLD_US {
                self.clock.yield_now();
            }
        };

        if self.capture.is_armed() {
            self.capture.record(Edge {
                active: !active,
                driven: false,
                duration_us: elapsed,
                timed_out,
                millivolts,
            });
        }
        (!timed_out).then_some(elapsed)
    }
}
