//! Hardware abstraction traits
//!
//! These traits define the interface between the control logic
//! and hardware-specific implementations.

pub mod display;
pub mod motor;
pub mod sensor;
pub mod timer;

pub use display::{Display, DisplayExt, NullDisplay};
pub use motor::{
    clamp_velocity, AngleUnit, DeviceError, Motor, SpinDirection, StopMode, MAX_VELOCITY_PCT,
};
pub use sensor::{DigitalSwitch, RotationSensor};
pub use timer::{TickTimer, TimeUnit, Timer};
