//! Lift arm positioner
//!
//! Drives the lift motor until the pivot rotation sensor crosses a signed
//! target angle, then stops with the motor holding position. The arm
//! carries load against gravity, so the stop behavior is always `Hold`.

use super::drivetrain::LiftArm;
use super::{SegmentController, SegmentStatus};
use crate::safety::{GuardConfig, SafetyStatus, SegmentError, SegmentGuard};
use crate::traits::{Motor, RotationSensor, SpinDirection, StopMode};

/// Arm move request
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ArmTarget {
    /// Signed angle relative to the current position (degrees)
    pub angle_deg: f32,
    /// Lift velocity magnitude (percent)
    pub velocity_pct: f32,
}

impl ArmTarget {
    /// Create an arm target
    pub fn new(angle_deg: f32, velocity_pct: f32) -> Result<Self, SegmentError> {
        if !angle_deg.is_finite() || !velocity_pct.is_finite() {
            #[cfg(feature = "defmt")]
            defmt::warn!("Rejecting arm angle {}", angle_deg);
            return Err(SegmentError::InvalidTarget);
        }
        Ok(Self {
            angle_deg,
            velocity_pct,
        })
    }

    /// Direction implied by the sign of the target
    pub fn direction(&self) -> SpinDirection {
        if self.angle_deg < 0.0 {
            SpinDirection::Reverse
        } else {
            SpinDirection::Forward
        }
    }

    /// Check if `angle_deg` lies strictly beyond the target
    pub fn is_crossed(&self, angle_deg: f32) -> bool {
        if self.angle_deg > 0.0 {
            angle_deg > self.angle_deg
        } else if self.angle_deg < 0.0 {
            angle_deg < self.angle_deg
        } else {
            true
        }
    }
}

/// Arm positioning segment
#[derive(Debug, Clone)]
pub struct ArmPositioner {
    target: ArmTarget,
    guard: SegmentGuard,
    angle_deg: f32,
    finished: bool,
}

impl ArmPositioner {
    /// Create an arm positioner
    pub fn new(target: ArmTarget, guard: GuardConfig) -> Self {
        Self {
            target,
            guard: SegmentGuard::new(guard),
            angle_deg: 0.0,
            finished: false,
        }
    }

    /// Arm request
    pub fn target(&self) -> &ArmTarget {
        &self.target
    }

    /// Most recent sensor reading (degrees)
    pub fn angle_deg(&self) -> f32 {
        self.angle_deg
    }

    fn fail<M: Motor, S: RotationSensor>(&mut self, hw: &mut LiftArm<M, S>, err: SegmentError) -> SegmentError {
        let _ = hw.stop();
        self.finished = true;
        #[cfg(feature = "defmt")]
        defmt::error!("Arm segment aborted: {}", err);
        err
    }

    fn finish<M: Motor, S: RotationSensor>(&mut self, hw: &mut LiftArm<M, S>) -> Result<SegmentStatus, SegmentError> {
        self.finished = true;
        hw.stop()?;
        #[cfg(feature = "defmt")]
        defmt::debug!("Arm holding at {} deg", self.angle_deg);
        Ok(SegmentStatus::Done)
    }
}

impl<M: Motor, S: RotationSensor> SegmentController<LiftArm<M, S>> for ArmPositioner {
    fn start(&mut self, hw: &mut LiftArm<M, S>, now_ms: u32) -> Result<(), SegmentError> {
        self.finished = false;
        self.angle_deg = 0.0;

        if let Err(e) = hw.sensor.reset_position() {
            return Err(self.fail(hw, e.into()));
        }
        hw.motor.set_stopping(StopMode::Hold);
        self.guard.start(now_ms, 0.0);

        if self.target.angle_deg == 0.0 {
            return self.finish(hw).map(|_| ());
        }

        if let Err(e) = hw.spin(self.target.velocity_pct, self.target.direction()) {
            return Err(self.fail(hw, e.into()));
        }
        Ok(())
    }

    fn poll(&mut self, hw: &mut LiftArm<M, S>, now_ms: u32) -> Result<SegmentStatus, SegmentError> {
        if self.finished {
            return Ok(SegmentStatus::Done);
        }

        self.angle_deg = match hw.sensor.position_deg() {
            Ok(angle) => angle,
            Err(e) => return Err(self.fail(hw, e.into())),
        };

        if self.target.is_crossed(self.angle_deg) {
            return self.finish(hw);
        }

        if let SafetyStatus::Fault(err) = self.guard.check(now_ms, self.angle_deg) {
            return Err(self.fail(hw, err));
        }

        Ok(SegmentStatus::Running)
    }

    fn abort(&mut self, hw: &mut LiftArm<M, S>) {
        let _ = hw.stop();
        self.finished = true;
    }
}
