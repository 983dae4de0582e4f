//! Configuration type definitions
//!
//! Defaults reproduce the tuning the classroom robot shipped with.

use crate::control::{Correction, DriveTarget, PidGains, RampConfig, Travel, TurnGeometry};
use crate::safety::GuardConfig;
use crate::scheduler::RoutineKind;
use crate::traits::StopMode;

/// Velocity settings (percent)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VelocityConfig {
    /// Drive velocity for the lagging wheel
    pub normal_pct: f32,
    /// Drive velocity for the leading wheel (fixed correction)
    pub slow_pct: f32,
    /// Point turn velocity
    pub turn_pct: f32,
    /// Lift arm velocity
    pub lift_pct: f32,
}

impl Default for VelocityConfig {
    fn default() -> Self {
        Self {
            normal_pct: 50.0,
            slow_pct: 44.0,
            turn_pct: 40.0,
            lift_pct: 50.0,
        }
    }
}

/// Which straight-line correction to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CorrectionMode {
    /// Leading wheel drops to the slow velocity
    #[default]
    Fixed,
    /// Leading wheel speed matched by PID
    Pid,
}

/// Sequencer timing (milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimingConfig {
    /// Control tick period
    pub tick_ms: u32,
    /// Delay after the start button so the hand is clear of the robot
    pub settle_ms: u32,
    /// Pause between segments
    pub pause_ms: u32,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            tick_ms: 10,
            settle_ms: 300,
            pause_ms: 500,
        }
    }
}

/// Complete robot configuration
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RobotConfig {
    /// Wheel and track geometry
    pub geometry: TurnGeometry,
    /// Velocities
    pub velocity: VelocityConfig,
    /// Start ramp (None drives at full velocity from the first tick)
    pub ramp: Option<RampConfig>,
    /// Straight-line correction
    pub correction: CorrectionMode,
    /// Gains for PID correction
    pub pid: PidGains,
    /// Segment timeout and stall limits
    pub guard: GuardConfig,
    /// Sequencer timing
    pub timing: TimingConfig,
    /// Stop behavior for the drive wheels
    pub drive_stop: StopMode,
    /// Routine to run
    pub routine: RoutineKind,
}

impl RobotConfig {
    /// Correction with gains attached
    pub fn correction(&self) -> Correction {
        match self.correction {
            CorrectionMode::Fixed => Correction::Fixed,
            CorrectionMode::Pid => Correction::Pid(self.pid),
        }
    }

    /// Drive target using the configured velocities and wheel size
    pub fn drive_target(&self, distance_in: f32, travel: Travel) -> DriveTarget {
        DriveTarget::new(
            distance_in,
            self.velocity.normal_pct,
            self.velocity.slow_pct,
            travel,
        )
        .with_wheel_diameter(self.geometry.wheel_diameter_in)
    }

    /// Check values that would make every segment fail
    pub fn is_valid(&self) -> bool {
        let g = &self.geometry;
        g.wheel_diameter_in > 0.0
            && g.half_track_in > 0.0
            && g.slip_multiplier > 0.0
            && self.velocity.slow_pct <= self.velocity.normal_pct
            && self.timing.tick_ms > 0
            && (self.correction == CorrectionMode::Fixed || self.pid.is_configured())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RobotConfig::default();
        assert_eq!(config.velocity.normal_pct, 50.0);
        assert_eq!(config.velocity.slow_pct, 44.0);
        assert_eq!(config.timing.tick_ms, 10);
        assert_eq!(config.drive_stop, StopMode::Brake);
        assert_eq!(config.correction(), Correction::Fixed);
        assert!(config.ramp.is_none());
        assert!(config.is_valid());
    }

    #[test]
    fn test_pid_correction_carries_gains() {
        let config = RobotConfig {
            correction: CorrectionMode::Pid,
            pid: PidGains::new(0.2, 0.0, 0.05),
            ..Default::default()
        };
        assert_eq!(config.correction(), Correction::Pid(PidGains::new(0.2, 0.0, 0.05)));
    }

    #[test]
    fn test_drive_target_uses_geometry() {
        let mut config = RobotConfig::default();
        config.geometry.wheel_diameter_in = 3.25;

        let target = config.drive_target(24.0, Travel::Reverse);
        assert_eq!(target.wheel_diameter_in, 3.25);
        assert_eq!(target.velocity.slow, 44.0);
        assert_eq!(target.travel, Travel::Reverse);
    }

    #[test]
    fn test_invalid_config() {
        let mut config = RobotConfig::default();
        config.velocity.slow_pct = 60.0;
        assert!(!config.is_valid());
    }

    #[test]
    fn test_pid_correction_needs_gains() {
        let mut config = RobotConfig {
            correction: CorrectionMode::Pid,
            pid: PidGains::new(0.0, 0.0, 0.0),
            ..Default::default()
        };
        assert!(!config.is_valid());

        // Zero gains are harmless while fixed correction is selected
        config.correction = CorrectionMode::Fixed;
        assert!(config.is_valid());
    }
}
