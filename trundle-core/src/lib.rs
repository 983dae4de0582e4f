//! Board-agnostic core logic for the classroom robot firmware
//!
//! This crate contains all application logic that does not depend on
//! specific hardware implementations:
//!
//! - Hardware abstraction traits (motor, rotation sensor, switch, timer, display)
//! - Closed-loop control primitives (ramp, PID, drive-straight, point turn, lift arm)
//! - Segment guards (timeout and stall detection)
//! - Routine sequencer
//! - Configuration type definitions

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod control;
pub mod safety;
pub mod scheduler;
pub mod traits;
