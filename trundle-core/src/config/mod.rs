//! Configuration types
//!
//! Board-agnostic robot configuration. The firmware fills these in from
//! the `robot.toml` embedded at build time.

pub mod types;

pub use types::*;
