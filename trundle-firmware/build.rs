//! Build script for trundle-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates robot.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Routine names the firmware knows
const ROUTINES: &[&str] = &[
    "sentry",
    "rotation_demo",
    "transport",
    "straight_test",
    "turn_test",
    "wait_states",
];

/// Sections the firmware parser understands
const SECTIONS: &[&str] = &["geometry", "velocity", "ramp", "pid", "guard", "timing", "routine"];

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate robot.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=robot.toml");

    let config_path = Path::new("robot.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: robot.toml not found!                                    ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a robot.toml configuration file.          ║\n\
            ║  Please create one in the trundle-firmware directory.            ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read robot.toml                                ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    // Parse and validate TOML syntax
    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in robot.toml                        ║\n\
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
    validate_geometry(&config, &mut errors);
    validate_velocity(&config, &mut errors);
    validate_timing(&config, &mut errors);
    validate_routine(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid robot configuration                              ║\n\
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

    println!("cargo:warning=robot.toml validated successfully");
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

/// Numeric value of a key (integers and floats both accepted)
fn number(section: &toml::value::Table, key: &str) -> Option<f64> {
    match section.get(key) {
        Some(toml::Value::Float(f)) => Some(*f),
        Some(toml::Value::Integer(i)) => Some(*i as f64),
        _ => None,
    }
}

fn section<'a>(config: &'a toml::Value, name: &str) -> Option<&'a toml::value::Table> {
    config.get(name).and_then(|s| s.as_table())
}

/// Only known sections, each a table
fn validate_sections(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(root) = config.as_table() else {
        return;
    };
    for (name, value) in root {
        if !SECTIONS.contains(&name.as_str()) {
            errors.push(format!("Unknown section [{}]", name));
        } else if !value.is_table() {
            errors.push(format!("[{}] must be a table", name));
        }
    }
}

fn validate_geometry(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(geometry) = section(config, "geometry") else {
        return;
    };
    for key in ["wheel_diameter_in", "half_track_in", "slip_multiplier"] {
        if let Some(value) = number(geometry, key) {
            if value <= 0.0 {
                errors.push(format!("[geometry] {} must be positive", key));
            }
        }
    }
}

fn validate_velocity(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(velocity) = section(config, "velocity") else {
        return;
    };
    for key in ["normal_pct", "slow_pct", "turn_pct", "lift_pct"] {
        if let Some(value) = number(velocity, key) {
            if !(0.0..=100.0).contains(&value) {
                errors.push(format!("[velocity] {} must be 0-100", key));
            }
        }
    }
    if let (Some(normal), Some(slow)) = (number(velocity, "normal_pct"), number(velocity, "slow_pct")) {
        if slow > normal {
            errors.push("[velocity] slow_pct must not exceed normal_pct".to_string());
        }
    }
}

fn validate_timing(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(timing) = section(config, "timing") else {
        return;
    };
    if let Some(tick) = number(timing, "tick_ms") {
        if !(1.0..=100.0).contains(&tick) {
            errors.push("[timing] tick_ms must be 1-100".to_string());
        }
    }
}

fn validate_routine(config: &toml::Value, errors: &mut Vec<String>) {
    let Some(routine) = section(config, "routine") else {
        return;
    };

    if let Some(toml::Value::String(name)) = routine.get("name") {
        if !ROUTINES.contains(&name.as_str()) {
            errors.push(format!("[routine] unknown routine '{}'", name));
        }
    }

    if let Some(toml::Value::String(mode)) = routine.get("correction") {
        if !["fixed", "pid"].contains(&mode.as_str()) {
            errors.push("[routine] correction must be 'fixed' or 'pid'".to_string());
        } else if mode == "pid" && !pid_configured(config) {
            errors.push("[pid] pid correction needs at least one non-zero gain".to_string());
        }
    }

    if let Some(toml::Value::String(mode)) = routine.get("drive_stop") {
        if !["brake", "hold", "coast"].contains(&mode.as_str()) {
            errors.push("[routine] drive_stop must be 'brake', 'hold' or 'coast'".to_string());
        }
    }
}

/// Gains as the firmware sees them (missing keys keep their defaults)
fn pid_configured(config: &toml::Value) -> bool {
    let gain = |key: &str, default: f64| {
        section(config, "pid")
            .and_then(|pid| number(pid, key))
            .unwrap_or(default)
    };
    gain("kp", 0.1) != 0.0 || gain("ki", 0.0) != 0.0 || gain("kd", 0.1) != 0.0
}
