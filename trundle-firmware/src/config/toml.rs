//! Simple TOML parser for robot configuration
//!
//! This is a minimal TOML parser that handles only the subset needed for
//! the robot configuration. It does NOT support the full TOML spec.
//!
//! Supported features:
//! - Key = value pairs (string, integer, float, boolean)
//! - [section] headers
//! - Comments (# ...), including trailing comments
//!
//! NOT supported:
//! - Arrays and inline tables
//! - Multi-line strings
//! - Dotted keys

use trundle_core::config::{CorrectionMode, RobotConfig};
use trundle_core::control::RampConfig;
use trundle_core::scheduler::RoutineKind;
use trundle_core::traits::StopMode;

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Line is neither a header nor `key = value`
    InvalidLine,
    /// Invalid value type
    InvalidValue,
    /// Values parse but cannot drive the robot
    InvalidConfig,
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Geometry,
    Velocity,
    Ramp,
    Pid,
    Guard,
    Timing,
    Routine,
}

/// Parse TOML configuration into RobotConfig
///
/// Keys that are not present keep their default values.
pub fn parse_config(input: &str) -> Result<RobotConfig, ParseError> {
    let mut config = RobotConfig::default();
    let mut section = Section::Root;

    // The ramp is off unless the [ramp] section turns it on
    let mut ramp = RampConfig::default();
    let mut ramp_enabled = false;

    for line in input.lines() {
        let line = line.trim();

        // Skip empty lines and comments
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = parse_section_header(&line[1..line.len() - 1])?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ParseError::InvalidLine)?;
        match section {
            Section::Ramp => apply_ramp(key, value, &mut ramp, &mut ramp_enabled)?,
            _ => apply_value(section, key, value, &mut config)?,
        }
    }

    config.ramp = ramp_enabled.then_some(ramp);

    if !config.is_valid() {
        return Err(ParseError::InvalidConfig);
    }
    Ok(config)
}

fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "geometry" => Ok(Section::Geometry),
        "velocity" => Ok(Section::Velocity),
        "ramp" => Ok(Section::Ramp),
        "pid" => Ok(Section::Pid),
        "guard" => Ok(Section::Guard),
        "timing" => Ok(Section::Timing),
        "routine" => Ok(Section::Routine),
        _ => Err(ParseError::InvalidSection),
    }
}

/// Split `key = value`, dropping a trailing comment
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();

    // Remove inline comments
    let value = if let Some(hash_pos) = value.find('#') {
        // Make sure # is not inside a string
        let quote_count = value[..hash_pos].matches('"').count();
        if quote_count % 2 == 0 {
            value[..hash_pos].trim()
        } else {
            value
        }
    } else {
        value
    };

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Parse a string value (removes quotes)
fn parse_string(value: &str) -> &str {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        &value[1..value.len() - 1]
    } else {
        // Allow unquoted strings for simple values
        value
    }
}

/// Parse an integer value
fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue)
}

/// Parse a float value (integers accepted)
fn parse_float(value: &str) -> Result<f32, ParseError> {
    let v: f32 = value.parse().map_err(|_| ParseError::InvalidValue)?;
    if v.is_finite() {
        Ok(v)
    } else {
        Err(ParseError::InvalidValue)
    }
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}

fn parse_stop_mode(value: &str) -> Result<StopMode, ParseError> {
    match parse_string(value) {
        "brake" => Ok(StopMode::Brake),
        "hold" => Ok(StopMode::Hold),
        "coast" => Ok(StopMode::Coast),
        _ => Err(ParseError::InvalidValue),
    }
}

fn parse_correction(value: &str) -> Result<CorrectionMode, ParseError> {
    match parse_string(value) {
        "fixed" => Ok(CorrectionMode::Fixed),
        "pid" => Ok(CorrectionMode::Pid),
        _ => Err(ParseError::InvalidValue),
    }
}

fn apply_ramp(key: &str, value: &str, ramp: &mut RampConfig, enabled: &mut bool) -> Result<(), ParseError> {
    match key {
        "enabled" => *enabled = parse_bool(value)?,
        "seed_pct" => ramp.seed_pct = parse_float(value)?,
        "slow_seed_pct" => ramp.slow_seed_pct = parse_float(value)?,
        "increment_pct" => ramp.increment_pct = parse_float(value)?,
        _ => warn_unknown(key),
    }
    Ok(())
}

fn apply_value(section: Section, key: &str, value: &str, config: &mut RobotConfig) -> Result<(), ParseError> {
    match section {
        Section::Root => warn_unknown(key),
        Section::Geometry => {
            let g = &mut config.geometry;
            match key {
                "wheel_diameter_in" => g.wheel_diameter_in = parse_float(value)?,
                "half_track_in" => g.half_track_in = parse_float(value)?,
                "slip_multiplier" => g.slip_multiplier = parse_float(value)?,
                _ => warn_unknown(key),
            }
        }
        Section::Velocity => {
            let v = &mut config.velocity;
            match key {
                "normal_pct" => v.normal_pct = parse_float(value)?,
                "slow_pct" => v.slow_pct = parse_float(value)?,
                "turn_pct" => v.turn_pct = parse_float(value)?,
                "lift_pct" => v.lift_pct = parse_float(value)?,
                _ => warn_unknown(key),
            }
        }
        Section::Pid => {
            let p = &mut config.pid;
            match key {
                "kp" => p.kp = parse_float(value)?,
                "ki" => p.ki = parse_float(value)?,
                "kd" => p.kd = parse_float(value)?,
                _ => warn_unknown(key),
            }
        }
        Section::Guard => {
            let g = &mut config.guard;
            match key {
                "timeout_ms" => g.timeout_ms = parse_int(value)?,
                "stall_window_ms" => g.stall_window_ms = parse_int(value)?,
                "min_progress_deg" => g.min_progress_deg = parse_float(value)?,
                _ => warn_unknown(key),
            }
        }
        Section::Timing => {
            let t = &mut config.timing;
            match key {
                "tick_ms" => t.tick_ms = parse_int(value)?,
                "settle_ms" => t.settle_ms = parse_int(value)?,
                "pause_ms" => t.pause_ms = parse_int(value)?,
                _ => warn_unknown(key),
            }
        }
        Section::Routine => match key {
            "name" => {
                config.routine = RoutineKind::from_name(parse_string(value)).ok_or(ParseError::InvalidValue)?
            }
            "correction" => config.correction = parse_correction(value)?,
            "drive_stop" => config.drive_stop = parse_stop_mode(value)?,
            _ => warn_unknown(key),
        },
        // Handled by apply_ramp
        Section::Ramp => {}
    }
    Ok(())
}

fn warn_unknown(_key: &str) {
    #[cfg(feature = "defmt")]
    defmt::warn!("Ignoring unknown config key '{}'", _key);
}

#[cfg(test)]
mod tests {
    use super::*;
    use trundle_core::control::PidGains;

    #[test]
    fn test_embedded_config_matches_defaults() {
        let config = parse_config(include_str!("../../robot.toml")).unwrap();
        assert_eq!(config, RobotConfig::default());
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(parse_key_value("kp = 0.5"), Some(("kp", "0.5")));
        assert_eq!(
            parse_key_value("name = \"sentry\"   # patrol"),
            Some(("name", "\"sentry\""))
        );
        assert_eq!(parse_key_value("name = \"a#b\""), Some(("name", "\"a#b\"")));
        assert_eq!(parse_key_value("kp ="), None);
        assert_eq!(parse_key_value("kp 0.5"), None);
    }

    #[test]
    fn test_overrides() {
        let input = r#"
            [pid]
            kp = 0.2
            kd = 0

            [ramp]
            enabled = true
            increment_pct = 0.5

            [routine]
            name = "transport"
            correction = "pid"
            drive_stop = "hold"
        "#;
        let config = parse_config(input).unwrap();
        assert_eq!(config.pid, PidGains::new(0.2, 0.0, 0.0));
        assert_eq!(config.correction, CorrectionMode::Pid);
        assert_eq!(config.drive_stop, StopMode::Hold);
        assert_eq!(config.routine, RoutineKind::Transport);
        let ramp = config.ramp.unwrap();
        assert_eq!(ramp.increment_pct, 0.5);
        assert_eq!(ramp.seed_pct, RampConfig::default().seed_pct);
    }

    #[test]
    fn test_errors() {
        assert_eq!(parse_config("[wheels]"), Err(ParseError::InvalidSection));
        assert_eq!(parse_config("[pid]\nkp"), Err(ParseError::InvalidLine));
        assert_eq!(parse_config("[pid]\nkp = fast"), Err(ParseError::InvalidValue));
        assert_eq!(parse_config("[timing]\ntick_ms = -1"), Err(ParseError::InvalidValue));
        assert_eq!(parse_config("[routine]\nname = \"dance\""), Err(ParseError::InvalidValue));
        assert_eq!(parse_config("[timing]\ntick_ms = 0"), Err(ParseError::InvalidConfig));
        assert_eq!(
            parse_config("[pid]\nkp = 0\nki = 0\nkd = 0\n[routine]\ncorrection = \"pid\""),
            Err(ParseError::InvalidConfig)
        );
    }

    #[test]
    fn test_wait_states_routine() {
        let config = parse_config("[routine]\nname = \"wait_states\"").unwrap();
        assert_eq!(config.routine, RoutineKind::WaitStates);
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let config = parse_config("[velocity]\nturbo = true\nturn_pct = 30").unwrap();
        assert_eq!(config.velocity.turn_pct, 30.0);
    }
}
