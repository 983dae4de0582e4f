//! Point turn by encoder count
//!
//! Spins the wheels in opposite directions at equal speed until the right
//! encoder has turned far enough.

use super::drivetrain::{Drivetrain, EncoderPair, WheelCommand};
use super::straight::DEFAULT_WHEEL_DIAMETER_IN;
use super::{SegmentController, SegmentStatus};
use crate::safety::{GuardConfig, SafetyStatus, SegmentError, SegmentGuard};
use crate::traits::{Motor, StopMode};

/// Turn direction seen from above
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TurnDirection {
    /// Counter-clockwise: right wheel forward
    Left,
    /// Clockwise: right wheel backward
    Right,
}

impl TurnDirection {
    /// +1.0 left, -1.0 right
    pub fn sign(self) -> f32 {
        match self {
            TurnDirection::Left => 1.0,
            TurnDirection::Right => -1.0,
        }
    }
}

/// Robot geometry used to convert a heading change to encoder degrees
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TurnGeometry {
    /// Distance from the robot center to a wheel (inches)
    pub half_track_in: f32,
    /// Drive wheel diameter (inches)
    pub wheel_diameter_in: f32,
    /// Empirical wheel-slip correction, tuned per robot and floor
    pub slip_multiplier: f32,
}

impl Default for TurnGeometry {
    fn default() -> Self {
        Self {
            half_track_in: 5.5,
            wheel_diameter_in: DEFAULT_WHEEL_DIAMETER_IN,
            slip_multiplier: 1.097,
        }
    }
}

impl TurnGeometry {
    /// Encoder degrees for a heading change of `angle_deg`
    pub fn turn_count(&self, angle_deg: f32) -> f32 {
        self.slip_multiplier * self.half_track_in * libm::fabsf(angle_deg) * 2.0
            / self.wheel_diameter_in
    }
}

/// Point turn request
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TurnTarget {
    /// Right encoder magnitude that ends the turn (degrees)
    pub turn_count_deg: f32,
    /// Wheel velocity magnitude (percent)
    pub velocity_pct: f32,
    /// Turn direction
    pub direction: TurnDirection,
}

impl TurnTarget {
    /// Create a turn from an encoder count
    pub fn new(
        turn_count_deg: f32,
        velocity_pct: f32,
        direction: TurnDirection,
    ) -> Result<Self, SegmentError> {
        if !turn_count_deg.is_finite() || turn_count_deg < 0.0 || !velocity_pct.is_finite() {
            #[cfg(feature = "defmt")]
            defmt::warn!("Rejecting turn count {}", turn_count_deg);
            return Err(SegmentError::InvalidTarget);
        }

        Ok(Self {
            turn_count_deg,
            velocity_pct,
            direction,
        })
    }

    /// Create a turn from a heading change
    pub fn from_angle(
        geometry: &TurnGeometry,
        angle_deg: f32,
        velocity_pct: f32,
        direction: TurnDirection,
    ) -> Result<Self, SegmentError> {
        if !angle_deg.is_finite() {
            return Err(SegmentError::InvalidTarget);
        }
        Self::new(geometry.turn_count(angle_deg), velocity_pct, direction)
    }

    /// Wheel command for this turn
    pub fn command(&self) -> WheelCommand {
        let v = libm::fabsf(self.velocity_pct) * self.direction.sign();
        WheelCommand::new(v, -v)
    }
}

/// Point-turn segment
#[derive(Debug, Clone)]
pub struct PointTurn {
    target: TurnTarget,
    guard: SegmentGuard,
    stop_mode: StopMode,
    encoders: EncoderPair,
    last_command: WheelCommand,
}

impl PointTurn {
    /// Create a point turn
    pub fn new(target: TurnTarget, guard: GuardConfig) -> Self {
        Self {
            target,
            guard: SegmentGuard::new(guard),
            stop_mode: StopMode::Brake,
            encoders: EncoderPair::default(),
            last_command: WheelCommand::stopped(),
        }
    }

    /// Stop behavior applied to both wheels at the end of the turn
    pub fn with_stop_mode(mut self, mode: StopMode) -> Self {
        self.stop_mode = mode;
        self
    }

    /// Turn request
    pub fn target(&self) -> &TurnTarget {
        &self.target
    }

    /// Most recent wheel command
    pub fn last_command(&self) -> WheelCommand {
        self.last_command
    }

    /// Most recent encoder reading
    pub fn encoders(&self) -> EncoderPair {
        self.encoders
    }

    fn fail<L: Motor, R: Motor>(&mut self, hw: &mut Drivetrain<L, R>, err: SegmentError) -> SegmentError {
        let _ = hw.stop();
        self.last_command = WheelCommand::stopped();
        #[cfg(feature = "defmt")]
        defmt::error!("Turn segment aborted: {}", err);
        err
    }
}

impl<L: Motor, R: Motor> SegmentController<Drivetrain<L, R>> for PointTurn {
    fn start(&mut self, hw: &mut Drivetrain<L, R>, now_ms: u32) -> Result<(), SegmentError> {
        hw.set_stopping(self.stop_mode);
        if let Err(e) = hw.reset_encoders() {
            return Err(self.fail(hw, e.into()));
        }

        self.encoders = EncoderPair::default();
        self.last_command = WheelCommand::stopped();
        self.guard.start(now_ms, 0.0);
        Ok(())
    }

    fn poll(&mut self, hw: &mut Drivetrain<L, R>, now_ms: u32) -> Result<SegmentStatus, SegmentError> {
        let encoders = match hw.encoders() {
            Ok(e) => e,
            Err(e) => return Err(self.fail(hw, e.into())),
        };
        self.encoders = encoders;

        let progress = libm::fabsf(encoders.right_deg);
        if progress >= self.target.turn_count_deg {
            self.last_command = WheelCommand::stopped();
            hw.stop()?;
            return Ok(SegmentStatus::Done);
        }

        if let SafetyStatus::Fault(err) = self.guard.check(now_ms, progress) {
            return Err(self.fail(hw, err));
        }

        let command = self.target.command();
        if let Err(e) = hw.apply(command) {
            return Err(self.fail(hw, e.into()));
        }
        self.last_command = command;

        Ok(SegmentStatus::Running)
    }

    fn abort(&mut self, hw: &mut Drivetrain<L, R>) {
        let _ = hw.stop();
        self.last_command = WheelCommand::stopped();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::mock::MockMotor;

    fn drivetrain() -> Drivetrain<MockMotor, MockMotor> {
        Drivetrain::new(MockMotor::default(), MockMotor::default())
    }

    #[test]
    fn test_turn_count_from_angle() {
        let geometry = TurnGeometry {
            slip_multiplier: 1.0,
            ..Default::default()
        };
        // 5.5 * 90 * 2 / 4
        assert_eq!(geometry.turn_count(90.0), 247.5);

        let tuned = TurnGeometry::default();
        assert!((tuned.turn_count(90.0) - 271.5075).abs() < 1e-3);
    }

    #[test]
    fn test_commands_equal_and_opposite() {
        let mut hw = drivetrain();
        let target = TurnTarget::new(90.0, 40.0, TurnDirection::Left).unwrap();
        let mut turn = PointTurn::new(target, GuardConfig::disabled());
        turn.start(&mut hw, 0).unwrap();

        let mut tick = 0u32;
        while turn.poll(&mut hw, tick * 10).unwrap() == SegmentStatus::Running {
            tick += 1;
            hw.right.position += 4.0;
            hw.left.position -= 4.0;
        }

        assert!(!hw.right.commands.is_empty());
        for (right, left) in hw.right.commands.iter().zip(hw.left.commands.iter()) {
            assert_eq!(*right, 40.0);
            assert_eq!(*left, -40.0);
        }
        assert_eq!(hw.right.commands.len(), hw.left.commands.len());
        assert_eq!(hw.right.stops, 1);
        assert_eq!(hw.left.stops, 1);
    }

    #[test]
    fn test_right_turn_reverses_signs() {
        let target = TurnTarget::new(90.0, 40.0, TurnDirection::Right).unwrap();
        assert_eq!(target.command(), WheelCommand::new(-40.0, 40.0));
    }

    #[test]
    fn test_finishes_on_magnitude() {
        let mut hw = drivetrain();
        let target = TurnTarget::new(90.0, 40.0, TurnDirection::Right).unwrap();
        let mut turn = PointTurn::new(target, GuardConfig::disabled());
        turn.start(&mut hw, 0).unwrap();

        hw.right.position = -89.9;
        assert_eq!(turn.poll(&mut hw, 0).unwrap(), SegmentStatus::Running);
        hw.right.position = -90.0;
        assert_eq!(turn.poll(&mut hw, 10).unwrap(), SegmentStatus::Done);
    }

    #[test]
    fn test_zero_count_finishes_immediately() {
        let mut hw = drivetrain();
        let target = TurnTarget::new(0.0, 40.0, TurnDirection::Left).unwrap();
        let mut turn = PointTurn::new(target, GuardConfig::disabled());
        turn.start(&mut hw, 0).unwrap();

        assert_eq!(turn.poll(&mut hw, 0).unwrap(), SegmentStatus::Done);
        assert!(hw.right.commands.is_empty());
    }

    #[test]
    fn test_timeout_stops_wheels() {
        let mut hw = drivetrain();
        let target = TurnTarget::new(90.0, 40.0, TurnDirection::Left).unwrap();
        let guard = GuardConfig {
            timeout_ms: 100,
            stall_window_ms: 0,
            min_progress_deg: 0.0,
        };
        let mut turn = PointTurn::new(target, guard);
        turn.start(&mut hw, 0).unwrap();

        assert!(turn.poll(&mut hw, 50).is_ok());
        assert_eq!(turn.poll(&mut hw, 150), Err(SegmentError::Timeout));
        assert_eq!(hw.right.stops, 1);
        assert_eq!(hw.left.stops, 1);
    }

    #[test]
    fn test_invalid_counts_rejected() {
        assert_eq!(
            TurnTarget::new(-1.0, 40.0, TurnDirection::Left),
            Err(SegmentError::InvalidTarget)
        );
        assert_eq!(
            TurnTarget::from_angle(&TurnGeometry::default(), f32::NAN, 40.0, TurnDirection::Left),
            Err(SegmentError::InvalidTarget)
        );
    }
}
