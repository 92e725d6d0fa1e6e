//! Line protocol front-end
//!
//! Reads command lines from the host, keeps the current DigiROM and runs
//! it through the controller whenever it is due. Output goes back over
//! the same serial link as plain text lines.
//!
//! ```text
//!          valid program line
//!   ┌──────┐ ───────────────► ┌────────┐ ──┐ execute when due,
//!   │ Idle │                  │ Active │ ◄─┘ reschedule
//!   └──────┘ ◄─────────────── └────────┘
//!   listen got nothing / dialect unsupported / I, T, D
//! ```
//!
//! Info, prong-test and debug commands also drop the loaded program and
//! return to idle. Rejected lines leave the state as is.
//!
//! With debug capture enabled, each run is followed by a header line
//! `p:timing=<dialect> threshold=<mV> trigger=<n><A|B>` and the edge log.

use core::fmt::{self, Write};

use dmcomm_hal::{Clock, SerialRx, SerialTx};
use dmcomm_protocol::hex::write_printable;
use dmcomm_protocol::{parse_command, Command, Dialect, Line, LineError, LineReader, Turn};

use crate::capture::TriggerText;
use crate::config::SessionConfig;
use crate::controller::{Controller, ControllerError};
use crate::digirom::DigiRom;
use crate::indicator::Indicator;
use crate::prong::{SignalInput, SignalOutput};
use crate::timing;

/// Build identification printed by the info command
pub const BUILD_INFO: &str = concat!("dmcomm-rs ", env!("CARGO_PKG_VERSION"));

/// Serial link failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    Read,
    Write,
}

impl From<fmt::Error> for TransportError {
    fn from(_: fmt::Error) -> Self {
        TransportError::Write
    }
}

/// What a call to [`FrontEnd::poll`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Activity {
    /// No program loaded
    Idle,
    /// Program loaded but not due yet
    Waiting,
    /// Handled a command line
    Command {
        /// The line parsed; rejected lines leave the program as it was
        accepted: bool,
    },
    /// Ran the program
    Executed {
        /// Anything came in during the run
        received: bool,
    },
}

/// `fmt::Write` adapter over a serial transmitter
pub struct TxWriter<'a, T: SerialTx> {
    tx: &'a mut T,
}

impl<'a, T: SerialTx> TxWriter<'a, T> {
    pub fn new(tx: &'a mut T) -> Self {
        Self { tx }
    }
}

impl<T: SerialTx> Write for TxWriter<'_, T> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.tx.write_blocking(s.as_bytes()).map_err(|_| fmt::Error)
    }
}

/// Command loop state
pub struct FrontEnd<T: SerialTx, R: SerialRx, N: Indicator> {
    tx: T,
    rx: R,
    indicator: N,
    config: SessionConfig,
    reader: LineReader,
    line_started_ms: u32,
    rom: Option<DigiRom>,
    next_run_ms: u32,
}

/// True once `now` has reached `deadline` on a wrapping millisecond clock
fn is_due(now: u32, deadline: u32) -> bool {
    (now.wrapping_sub(deadline) as i32) >= 0
}

impl<T: SerialTx, R: SerialRx, N: Indicator> FrontEnd<T, R, N> {
    pub fn new(tx: T, rx: R, indicator: N, config: SessionConfig) -> Self {
        Self {
            tx,
            rx,
            indicator,
            config,
            reader: LineReader::new(),
            line_started_ms: 0,
            rom: None,
            next_run_ms: 0,
        }
    }

    /// The loaded program, if any
    pub fn rom(&self) -> Option<&DigiRom> {
        self.rom.as_ref()
    }

    pub fn indicator(&self) -> &N {
        &self.indicator
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Handle pending input, then run the program if it is due
    pub fn poll<O, I, C>(&mut self, controller: &mut Controller<O, I, C>) -> Result<Activity, TransportError>
    where
        O: SignalOutput,
        I: SignalInput,
        C: Clock,
    {
        let now = controller.clock().now_millis();
        if let Some(line) = self.read_line(now)? {
            let accepted = self.handle_line(&line, controller, now)?;
            return Ok(Activity::Command { accepted });
        }

        match self.rom {
            None => Ok(Activity::Idle),
            Some(_) if !is_due(now, self.next_run_ms) => Ok(Activity::Waiting),
            Some(_) => self.run(controller),
        }
    }

    fn read_line(&mut self, now: u32) -> Result<Option<Line>, TransportError> {
        while let Some(byte) = self.rx.try_read_byte().map_err(|_| TransportError::Read)? {
            if !self.reader.is_partial() {
                self.line_started_ms = now;
            }
            match self.reader.feed(byte) {
                Ok(Some(line)) => return Ok(Some(line)),
                Ok(None) => {}
                Err(e) => self.report_line_error(e)?,
            }
        }

        if self.reader.is_partial()
            && now.wrapping_sub(self.line_started_ms) > self.config.serial_timeout_ms
        {
            self.reader.reset();
            self.report_line_error(LineError::TooLate)?;
        }
        Ok(None)
    }

    fn report_line_error(&mut self, error: LineError) -> Result<(), TransportError> {
        let mut w = TxWriter::new(&mut self.tx);
        writeln!(w, "{}", error)?;
        self.flush()
    }

    fn handle_line<O, I, C>(
        &mut self,
        line: &[u8],
        controller: &mut Controller<O, I, C>,
        now: u32,
    ) -> Result<bool, TransportError>
    where
        O: SignalOutput,
        I: SignalInput,
        C: Clock,
    {
        let mut w = TxWriter::new(&mut self.tx);
        write!(w, "got {} bytes: ", line.len())?;
        write_printable(&mut w, line)?;
        w.write_str(" -> ")?;

        let accepted = match parse_command(line) {
            Ok(Command::Info(dialect)) => {
                self.rom = None;
                writeln!(w, "{}", BUILD_INFO)?;
                if let Some(d) = dialect {
                    timing::write_timing(&mut w, d)?;
                    writeln!(w)?;
                }
                true
            }
            Ok(Command::ProngTest(dialect)) => {
                self.rom = None;
                let report = controller.prong_test(dialect.unwrap_or(Dialect::V));
                writeln!(w, "{} (paused)", report)?;
                true
            }
            Ok(Command::Debug { mode, trigger }) => {
                self.rom = None;
                controller.link().capture.configure(mode, trigger);
                write!(w, "debug {}", mode.name())?;
                if controller.capture().is_enabled() {
                    write!(w, " trigger={}", TriggerText(trigger))?;
                }
                writeln!(w, " (paused)")?;
                true
            }
            Ok(Command::Program(program)) => {
                let rom = DigiRom::from_command(&program);
                write!(w, "{} (new DigiROM)", rom)?;
                writeln!(w)?;
                self.next_run_ms = if rom.turn() == Turn::Initiator {
                    now.wrapping_add(self.config.gofirst_delay_ms)
                } else {
                    now
                };
                self.rom = Some(rom);
                self.indicator.on_new_program();
                true
            }
            Err(e) => {
                writeln!(w, "{} (paused)", e)?;
                self.indicator.on_new_program_rejected();
                false
            }
        };
        self.flush()?;
        Ok(accepted)
    }

    fn run<O, I, C>(&mut self, controller: &mut Controller<O, I, C>) -> Result<Activity, TransportError>
    where
        O: SignalOutput,
        I: SignalInput,
        C: Clock,
    {
        let Some(rom) = self.rom.as_mut() else {
            return Ok(Activity::Idle);
        };

        match controller.execute(rom, self.config.listen_timeout_ms) {
            Err(ControllerError::LineBusy) => {
                let now = controller.clock().now_millis();
                self.next_run_ms = now.wrapping_add(self.config.inactive_delay_ms);
                Ok(Activity::Waiting)
            }
            Err(e @ ControllerError::UnsupportedDialect(_)) => {
                self.rom = None;
                let mut w = TxWriter::new(&mut self.tx);
                writeln!(w, "{} (paused)", e)?;
                self.flush()?;
                Ok(Activity::Idle)
            }
            Ok(()) => {
                let received = rom.received_anything();
                let turn = rom.turn();
                let dialect = rom.dialect();
                self.indicator.on_program_executed(received);

                let mut w = TxWriter::new(&mut self.tx);
                if turn == Turn::Listen && !received {
                    writeln!(w, "(paused)")?;
                    self.rom = None;
                } else {
                    rom.print_result(&mut w)?;
                    writeln!(w)?;
                    let now = controller.clock().now_millis();
                    self.next_run_ms = if turn == Turn::Initiator {
                        now.wrapping_add(self.config.gofirst_repeat_ms)
                    } else {
                        now
                    };
                }

                let capture = controller.capture();
                if capture.is_enabled() {
                    let (_, threshold_mv) = timing::signal_params(dialect);
                    writeln!(
                        w,
                        "p:timing={} threshold={} trigger={}",
                        dialect.letter(),
                        threshold_mv,
                        TriggerText(capture.trigger())
                    )?;
                    capture.write(&mut w)?;
                    writeln!(w)?;
                }
                self.flush()?;
                Ok(Activity::Executed { received })
            }
        }
    }

    fn flush(&mut self) -> Result<(), TransportError> {
        self.tx.flush().map_err(|_| TransportError::Write)
    }
}
