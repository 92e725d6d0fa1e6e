//! Prong communication task
//!
//! Runs the command front-end. Program execution busy-waits on the
//! microsecond clock, so this task only yields between polls.
//!
//! The clock's `yield_now` cannot hand control back to the executor from
//! inside a synchronous poll. While a program runs, including a listen
//! that waits out the whole listen timeout, the heartbeat and every other
//! task on this executor stall until the run returns.

use defmt::*;
use embassy_rp::uart::{BufferedUartRx, BufferedUartTx};
use embassy_time::Timer;

use dmcomm_core::frontend::Activity;
use dmcomm_core::FrontEnd;
use dmcomm_hal_rp2040::{SerialReader, SerialWriter};

use crate::board::{FwController, FwIndicator};

/// Poll interval while a program waits for its next run
const WAITING_POLL_MS: u64 = 10;

pub type FwFrontEnd =
    FrontEnd<SerialWriter<BufferedUartTx>, SerialReader<BufferedUartRx>, FwIndicator>;

#[embassy_executor::task]
pub async fn comm_task(mut frontend: FwFrontEnd, mut controller: FwController) {
    info!("Comm task started");

    let idle_sleep_ms = frontend.config().inactive_delay_ms as u64;

    loop {
        match frontend.poll(&mut controller) {
            Ok(Activity::Idle) => Timer::after_millis(idle_sleep_ms).await,
            Ok(Activity::Waiting) => Timer::after_millis(WAITING_POLL_MS).await,
            Ok(Activity::Command { accepted: true }) => match frontend.rom() {
                Some(rom) => info!("Command accepted, program {:?} turn {:?}", rom.dialect(), rom.turn()),
                None => info!("Command accepted, no program"),
            },
            Ok(Activity::Command { accepted: false }) => warn!("Command rejected"),
            Ok(Activity::Executed { received }) => {
                debug!("Program executed, received={}", received);
                embassy_futures::yield_now().await;
            }
            Err(e) => {
                warn!("Serial error: {:?}", e);
                Timer::after_millis(idle_sleep_ms).await;
            }
        }
    }
}
