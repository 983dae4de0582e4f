//! Sensor implementations
//!
//! - Potentiometer on the lift arm pivot
//! - Bump switch (start button)

pub mod pot;
pub mod switch;

pub use pot::{AnalogSource, PotRotationSensor, DEFAULT_DEG_PER_COUNT};
pub use switch::BumpSwitch;
