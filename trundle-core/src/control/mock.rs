//! Scripted devices for controller unit tests

use std::vec::Vec;

use crate::traits::{DeviceError, Motor, RotationSensor, SpinDirection, StopMode};

/// Motor whose position is set by the test
#[derive(Debug, Default)]
pub struct MockMotor {
    pub position: f32,
    pub velocity: f32,
    pub spinning: Option<SpinDirection>,
    pub stop_mode: StopMode,
    pub stops: u32,
    /// Signed velocity of every spin command
    pub commands: Vec<f32>,
    pub fail_reads: bool,
}

impl MockMotor {
    pub fn last_command(&self) -> Option<f32> {
        self.commands.last().copied()
    }
}

impl Motor for MockMotor {
    fn set_velocity(&mut self, percent: f32) -> Result<(), DeviceError> {
        self.velocity = percent;
        Ok(())
    }

    fn spin(&mut self, direction: SpinDirection) -> Result<(), DeviceError> {
        self.spinning = Some(direction);
        self.commands.push(self.velocity * direction.sign());
        Ok(())
    }

    fn stop(&mut self) -> Result<(), DeviceError> {
        self.spinning = None;
        self.stops += 1;
        Ok(())
    }

    fn position_deg(&mut self) -> Result<f32, DeviceError> {
        if self.fail_reads {
            Err(DeviceError::Disconnected)
        } else {
            Ok(self.position)
        }
    }

    fn set_position_deg(&mut self, degrees: f32) -> Result<(), DeviceError> {
        self.position = degrees;
        Ok(())
    }

    fn set_stopping(&mut self, mode: StopMode) {
        self.stop_mode = mode;
    }
}

/// Rotation sensor whose angle is set by the test
#[derive(Debug, Default)]
pub struct MockSensor {
    pub angle: f32,
    pub resets: u32,
    pub fail_reads: bool,
}

impl RotationSensor for MockSensor {
    fn position_deg(&mut self) -> Result<f32, DeviceError> {
        if self.fail_reads {
            Err(DeviceError::StaleReading)
        } else {
            Ok(self.angle)
        }
    }

    fn reset_position(&mut self) -> Result<(), DeviceError> {
        self.angle = 0.0;
        self.resets += 1;
        Ok(())
    }
}
