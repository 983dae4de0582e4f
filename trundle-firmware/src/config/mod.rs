//! Configuration loading and parsing
//!
//! The robot configuration is compiled in from `robot.toml` and parsed at
//! boot by a small no_std parser.

pub mod toml;

pub use toml::{parse_config, ParseError};
