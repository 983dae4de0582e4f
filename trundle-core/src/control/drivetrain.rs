//! Injected hardware groups
//!
//! Controllers never reach for global motor handles. They receive the
//! group of devices they drive, which lets tests substitute a simulated
//! backend without touching control logic.

use crate::traits::{clamp_velocity, DeviceError, Motor, RotationSensor, SpinDirection, StopMode};

/// Both drive encoder readings, in degrees
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EncoderPair {
    /// Right wheel position
    pub right_deg: f32,
    /// Left wheel position
    pub left_deg: f32,
}

/// Velocity command for both wheels (signed percent)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WheelCommand {
    /// Right wheel velocity
    pub right_pct: f32,
    /// Left wheel velocity
    pub left_pct: f32,
}

impl WheelCommand {
    /// Both wheels stopped
    pub const fn stopped() -> Self {
        Self {
            right_pct: 0.0,
            left_pct: 0.0,
        }
    }

    /// Create a command from right and left velocities
    pub const fn new(right_pct: f32, left_pct: f32) -> Self {
        Self {
            right_pct,
            left_pct,
        }
    }
}

/// Two independently driven wheels with encoders
pub struct Drivetrain<L, R> {
    /// Left drive motor
    pub left: L,
    /// Right drive motor
    pub right: R,
}

impl<L: Motor, R: Motor> Drivetrain<L, R> {
    /// Create a drivetrain from its two motors
    pub fn new(left: L, right: R) -> Self {
        Self { left, right }
    }

    /// Apply the same stop behavior to both wheels
    pub fn set_stopping(&mut self, mode: StopMode) {
        self.left.set_stopping(mode);
        self.right.set_stopping(mode);
    }

    /// Zero both encoders
    pub fn reset_encoders(&mut self) -> Result<(), DeviceError> {
        self.left.set_position_deg(0.0)?;
        self.right.set_position_deg(0.0)
    }

    /// Read both encoders
    pub fn encoders(&mut self) -> Result<EncoderPair, DeviceError> {
        Ok(EncoderPair {
            right_deg: self.right.position_deg()?,
            left_deg: self.left.position_deg()?,
        })
    }

    /// Command both wheels (velocities are clamped to the valid range)
    pub fn apply(&mut self, command: WheelCommand) -> Result<(), DeviceError> {
        self.right.drive(command.right_pct)?;
        self.left.drive(command.left_pct)
    }

    /// Stop both wheels
    ///
    /// Both motors are always commanded, even if the first one fails.
    pub fn stop(&mut self) -> Result<(), DeviceError> {
        let right = self.right.stop();
        let left = self.left.stop();
        right.and(left)
    }
}

/// Lift arm: one motor plus the rotation sensor on its pivot
pub struct LiftArm<M, S> {
    /// Lift motor
    pub motor: M,
    /// Rotation sensor on the arm pivot
    pub sensor: S,
}

impl<M: Motor, S: RotationSensor> LiftArm<M, S> {
    /// Create a lift arm from its motor and sensor
    pub fn new(motor: M, sensor: S) -> Self {
        Self { motor, sensor }
    }

    /// Spin the lift motor at a velocity magnitude in a direction
    ///
    /// The sign of `velocity_pct` is ignored; `direction` alone decides
    /// which way the arm moves.
    pub fn spin(&mut self, velocity_pct: f32, direction: SpinDirection) -> Result<(), DeviceError> {
        self.motor.set_velocity(clamp_velocity(libm::fabsf(velocity_pct)))?;
        self.motor.spin(direction)
    }

    /// Stop the lift motor with its configured stop behavior
    pub fn stop(&mut self) -> Result<(), DeviceError> {
        self.motor.stop()
    }
}
