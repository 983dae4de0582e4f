//! Simulated robot
//!
//! Host-side backend for the hardware traits. Shafts integrate commanded
//! velocity over a simulated clock; delays advance the clock instead of
//! sleeping. Full routines run in milliseconds of wall time.

pub mod shaft;
pub mod world;

pub use shaft::{SimMotor, SimRotation, SimShaft, DEFAULT_GAIN};
pub use world::{SimDelay, SimRobot, SimSwitch, SimTimer, SimWorld};
