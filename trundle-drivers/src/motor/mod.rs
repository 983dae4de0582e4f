//! Motor driver implementations
//!
//! - DC motors: PWM speed on an H-bridge with quadrature feedback

pub mod dc;

pub use dc::{DcMotor, DcMotorConfig, DriveState};
