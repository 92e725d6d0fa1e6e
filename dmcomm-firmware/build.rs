//! Build script for dmcomm-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates dmcomm.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// GPIOs taken by the host UART
const UART_PINS: [i64; 2] = [0, 1];

/// GPIOs wired to ADC channels
const ADC_PINS: std::ops::RangeInclusive<i64> = 26..=29;

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate dmcomm.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=dmcomm.toml");

    let config_path = Path::new("dmcomm.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: dmcomm.toml not found!                                   ║\n\
            ║                                                                  ║\n\
            ║  The firmware embeds a board configuration file.                 ║\n\
            ║  Please create one in the dmcomm-firmware directory.             ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read dmcomm.toml                               ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in dmcomm.toml                       ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    validate_sections(&config, &mut errors);
    validate_prong(&config, &mut errors);
    validate_led(&config, &mut errors);
    validate_numbers(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid board configuration in dmcomm.toml               ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=dmcomm.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Only the sections the firmware's parser knows, each a table
fn validate_sections(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(root) = config.as_table() else {
        return;
    };
    for (name, value) in root {
        if !["prong", "led", "serial", "session"].contains(&name.as_str()) {
            errors.push(format!("unknown section [{}]", name));
        } else if !value.is_table() {
            errors.push(format!("[{}] must be a table", name));
        }
    }
}

/// Parse "gpioN" with optional "!" / "^" prefixes, returning N
fn pin_number(value: &str) -> Option<i64> {
    let number = value.trim_start_matches(['!', '^']).strip_prefix("gpio")?;
    let n: i64 = number.parse().ok()?;
    (0..=29).contains(&n).then_some(n)
}

fn check_pin(
    section: &str,
    key: &str,
    value: Option<&toml::Value>,
    used: &mut Vec<(i64, String)>,
    errors: &mut Vec<String>,
) -> Option<i64> {
    let value = value?;
    let Some(text) = value.as_str() else {
        errors.push(format!("[{}] {} must be a string", section, key));
        return None;
    };
    if text == "none" {
        return None;
    }
    let Some(n) = pin_number(text) else {
        errors.push(format!("[{}] {} = '{}' is not a gpio pin", section, key, text));
        return None;
    };
    if UART_PINS.contains(&n) {
        errors.push(format!("[{}] {} uses gpio{} (host UART)", section, key, n));
    }
    if let Some((_, other)) = used.iter().find(|(p, _)| *p == n) {
        errors.push(format!("[{}] {} reuses gpio{} from {}", section, key, n, other));
    }
    used.push((n, format!("{}.{}", section, key)));
    Some(n)
}

fn validate_prong(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(prong) = config.get("prong") else {
        return;
    };
    let mut used = Vec::new();

    check_pin("prong", "out", prong.get("out"), &mut used, errors);
    check_pin("prong", "not_oe", prong.get("not_oe"), &mut used, errors);
    let input = check_pin("prong", "input", prong.get("input"), &mut used, errors);

    let sense = prong.get("sense").and_then(|s| s.as_str()).unwrap_or("analog");
    match sense {
        "analog" => {
            // Default input is gpio26
            let input = input.unwrap_or(26);
            if !ADC_PINS.contains(&input) {
                errors.push(format!(
                    "[prong] analog sense needs input on gpio26-29, not gpio{}",
                    input
                ));
            }
        }
        "digital" => {}
        other => errors.push(format!(
            "[prong] sense must be 'analog' or 'digital', not '{}'",
            other
        )),
    }
}

fn validate_led(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(led) = config.get("led") else {
        return;
    };
    let mut used = Vec::new();
    check_pin("led", "pin", led.get("pin"), &mut used, errors);
    if let Some(enabled) = led.get("enabled") {
        if !enabled.is_bool() {
            errors.push("[led] enabled must be true or false".to_string());
        }
    }
}

fn validate_numbers(config: &toml::Value, errors: &mut Vec<String>) {
    let checks: &[(&str, &str, i64, i64)] = &[
        ("prong", "adc_reference_mv", 1, u16::MAX as i64),
        ("serial", "baudrate", 300, 4_000_000),
        ("session", "listen_timeout_ms", 0, u32::MAX as i64),
        ("session", "serial_timeout_ms", 0, u32::MAX as i64),
        ("session", "gofirst_delay_ms", 0, u32::MAX as i64),
        ("session", "gofirst_repeat_ms", 0, u32::MAX as i64),
        ("session", "post_receive_delay_ms", 0, u32::MAX as i64),
        ("session", "inactive_delay_ms", 1, u32::MAX as i64),
    ];

    for (section, key, min, max) in checks {
        let Some(value) = config.get(*section).and_then(|s| s.get(*key)) else {
            continue;
        };
        match value.as_integer() {
            Some(n) if (*min..=*max).contains(&n) => {}
            Some(_) => errors.push(format!("[{}] {} must be {}-{}", section, key, min, max)),
            None => errors.push(format!("[{}] {} must be an integer", section, key)),
        }
    }
}
