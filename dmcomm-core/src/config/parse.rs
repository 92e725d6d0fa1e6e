//! Minimal TOML parser for board configuration
//!
//! Handles only the subset the board file uses. It does NOT support the
//! full TOML spec.
//!
//! Supported:
//! - `[section]` headers: `prong`, `led`, `serial`, `session`
//! - `key = value` pairs (string, integer, boolean)
//! - Comments (`# ...`), also after a value
//!
//! Unknown keys are ignored so newer files still load on older firmware.

use super::types::{BoardConfig, PinConfig, SenseMode};

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Value has the wrong type or is out of range
    InvalidValue,
    /// Invalid pin string
    InvalidPin,
    /// Line is neither a header nor `key = value`
    InvalidLine,
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Prong,
    Led,
    Serial,
    Session,
}

/// Parse TOML text into a [`BoardConfig`], starting from defaults
pub fn parse_config(input: &str) -> Result<BoardConfig, ConfigError> {
    let mut config = BoardConfig::default();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') {
            let header = line
                .strip_prefix('[')
                .and_then(|l| l.split('#').next())
                .map(str::trim)
                .and_then(|l| l.strip_suffix(']'))
                .ok_or(ConfigError::InvalidSection)?;
            section = parse_section_header(header)?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ConfigError::InvalidLine)?;
        apply_value(section, key, value, &mut config)?;
    }

    Ok(config)
}

fn parse_section_header(header: &str) -> Result<Section, ConfigError> {
    match header.trim() {
        "prong" => Ok(Section::Prong),
        "led" => Ok(Section::Led),
        "serial" => Ok(Section::Serial),
        "session" => Ok(Section::Session),
        _ => Err(ConfigError::InvalidSection),
    }
}

/// Parse key = value pair
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    // Remove inline comments
    let value = match value.find('#') {
        Some(hash_pos) if value[..hash_pos].matches('"').count() % 2 == 0 => {
            value[..hash_pos].trim()
        }
        _ => value,
    };

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Strip surrounding quotes; bare words are accepted too
fn parse_string(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue)
}

fn parse_bool(value: &str) -> Result<bool, ConfigError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::InvalidValue),
    }
}

/// Parse a pin string like "gpio19", "!gpio25", "^gpio26"
pub fn parse_pin(value: &str) -> Result<PinConfig, ConfigError> {
    let mut s = parse_string(value);
    let mut pin = PinConfig::default();

    loop {
        if let Some(rest) = s.strip_prefix('!') {
            pin.inverted = true;
            s = rest;
        } else if let Some(rest) = s.strip_prefix('^') {
            pin.pull_up = true;
            s = rest;
        } else {
            break;
        }
    }

    let number = s.strip_prefix("gpio").ok_or(ConfigError::InvalidPin)?;
    pin.pin = number.parse().map_err(|_| ConfigError::InvalidPin)?;
    if pin.pin > 29 {
        return Err(ConfigError::InvalidPin);
    }
    Ok(pin)
}

/// Pin that may be left unconnected with "none"
fn parse_optional_pin(value: &str) -> Result<Option<PinConfig>, ConfigError> {
    match parse_string(value) {
        "none" => Ok(None),
        _ => parse_pin(value).map(Some),
    }
}

fn parse_sense(value: &str) -> Result<SenseMode, ConfigError> {
    match parse_string(value) {
        "digital" => Ok(SenseMode::Digital),
        "analog" => Ok(SenseMode::Analog),
        _ => Err(ConfigError::InvalidValue),
    }
}

fn apply_value(
    section: Section,
    key: &str,
    value: &str,
    config: &mut BoardConfig,
) -> Result<(), ConfigError> {
    match section {
        Section::Root => {}
        Section::Prong => {
            let p = &mut config.prong;
            match key {
                "out" => p.out = parse_pin(value)?,
                "not_oe" => p.not_oe = parse_optional_pin(value)?,
                "input" => p.input = parse_pin(value)?,
                "sense" => p.sense = parse_sense(value)?,
                "adc_reference_mv" => p.adc_reference_mv = parse_int(value)?,
                _ => {} // Ignore unknown keys
            }
        }
        Section::Led => match key {
            "pin" => config.led = parse_optional_pin(value)?,
            "enabled" => {
                if !parse_bool(value)? {
                    config.led = None;
                }
            }
            _ => {}
        },
        Section::Serial => {
            if key == "baudrate" {
                config.baudrate = parse_int(value)?;
                if config.baudrate == 0 {
                    return Err(ConfigError::InvalidValue);
                }
            }
        }
        Section::Session => {
            let s = &mut config.session;
            match key {
                "listen_timeout_ms" => s.listen_timeout_ms = parse_int(value)?,
                "serial_timeout_ms" => s.serial_timeout_ms = parse_int(value)?,
                "gofirst_delay_ms" => s.gofirst_delay_ms = parse_int(value)?,
                "gofirst_repeat_ms" => s.gofirst_repeat_ms = parse_int(value)?,
                "post_receive_delay_ms" => s.post_receive_delay_ms = parse_int(value)?,
                "inactive_delay_ms" => s.inactive_delay_ms = parse_int(value)?,
                _ => {}
            }
        }
    }
    Ok(())
}
