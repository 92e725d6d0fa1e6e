//! dmcomm - Digital Monster link adapter firmware
//!
//! Main firmware binary for RP2040-based prong adapters. The board wiring
//! comes from `dmcomm.toml`, compiled into the image; the host drives
//! everything else over the serial command line.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use dmcomm_core::config::{parse_config, BoardConfig};
use dmcomm_core::FrontEnd;
use dmcomm_hal_rp2040::pins::PinBankPeripherals;
use dmcomm_hal_rp2040::{SerialReader, SerialWriter};

mod board;
mod tasks;

/// Embedded board configuration
/// Edit dmcomm.toml and rebuild to customize
const EMBEDDED_CONFIG: &str = include_str!("../dmcomm.toml");

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// UART buffers must live forever
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("dmcomm firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let config = load_config();

    let (mut pins, rest) = PinBankPeripherals::from_peripherals(p);

    // Host link on UART0, GPIO0 TX / GPIO1 RX
    let (Some(tx_pin), Some(rx_pin)) = (pins.pin0.take(), pins.pin1.take()) else {
        defmt::panic!("UART pins unavailable");
    };
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = config.baudrate;
    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);
    let uart = Uart::new_blocking(rest.uart0, tx_pin, rx_pin, uart_config);
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    let (tx, rx) = uart.split();
    info!("UART initialized at {} baud", config.baudrate);

    let hw = match board::Board::build(&config, &mut pins, rest.adc) {
        Ok(hw) => hw,
        Err(e) => {
            error!("Board setup failed: {:?}", e);
            defmt::panic!("invalid pin assignment");
        }
    };

    let frontend = FrontEnd::new(
        SerialWriter::new(tx),
        SerialReader::new(rx),
        hw.led,
        config.session,
    );

    spawner.spawn(tasks::comm_task(frontend, hw.controller)).unwrap();

    info!("Comm task spawned, firmware running");

    loop {
        embassy_time::Timer::after_secs(60).await;
        trace!("Main loop heartbeat");
    }
}

/// Parse the embedded configuration, falling back to defaults
///
/// The build script has already validated the file, so a failure here
/// means the two parsers disagree.
fn load_config() -> BoardConfig {
    match parse_config(EMBEDDED_CONFIG) {
        Ok(config) => {
            info!(
                "Config: out=gpio{} input=gpio{} sense={:?} led={:?}",
                config.prong.out.pin,
                config.prong.input.pin,
                config.prong.sense,
                config.led.map(|l| l.pin)
            );
            config
        }
        Err(e) => {
            error!("Failed to parse embedded config: {:?}", e);
            warn!("Using default board configuration");
            BoardConfig::default()
        }
    }
}
