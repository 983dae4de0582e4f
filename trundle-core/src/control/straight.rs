//! Differential drive-straight corrector
//!
//! Both wheels are commanded at the normal velocity while their encoders
//! agree. When one wheel gets ahead it is slowed, either to a fixed slow
//! velocity or by a PID loop matching its speed to the lagging wheel,
//! until the right encoder reaches the target count.

use core::f32::consts::PI;

use super::drivetrain::{Drivetrain, EncoderPair, WheelCommand};
use super::pid::{sanitize_dt, PidGains, PidState, MIN_DT_S};
use super::ramp::{RampConfig, VelocityPair, VelocityRamp};
use super::{elapsed_between, SegmentController, SegmentStatus};
use crate::safety::{GuardConfig, SafetyStatus, SegmentError, SegmentGuard};
use crate::traits::{Motor, StopMode};

/// Drive wheel diameter of the classroom robot (inches)
pub const DEFAULT_WHEEL_DIAMETER_IN: f32 = 4.0;

/// Direction of travel along the drive axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Travel {
    /// Positive encoder direction
    #[default]
    Forward,
    /// Negative encoder direction
    Reverse,
}

impl Travel {
    /// +1.0 forward, -1.0 reverse
    pub fn sign(self) -> f32 {
        match self {
            Travel::Forward => 1.0,
            Travel::Reverse => -1.0,
        }
    }
}

/// Which wheel has covered more ground
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Lead {
    /// Encoders agree
    Level,
    /// Right wheel ahead
    Right,
    /// Left wheel ahead
    Left,
}

/// Compare wheel progress along the direction of travel
pub fn lead(travel: Travel, right_deg: f32, left_deg: f32) -> Lead {
    let right = right_deg * travel.sign();
    let left = left_deg * travel.sign();

    if left > right {
        Lead::Left
    } else if right > left {
        Lead::Right
    } else {
        Lead::Level
    }
}

/// Encoder degrees needed to roll `distance_in` on a wheel of `wheel_diameter_in`
///
/// Always non-negative; direction comes from [`Travel`].
pub fn target_count(distance_in: f32, wheel_diameter_in: f32) -> f32 {
    libm::fabsf(distance_in) / (PI * wheel_diameter_in) * 360.0
}

/// Straight drive request
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DriveTarget {
    /// Distance to travel (inches, positive)
    pub distance_in: f32,
    /// Drive wheel diameter (inches)
    pub wheel_diameter_in: f32,
    /// Normal and slow velocity magnitudes (percent)
    pub velocity: VelocityPair,
    /// Direction of travel
    pub travel: Travel,
}

impl DriveTarget {
    /// Create a drive target on the default wheel diameter
    pub fn new(distance_in: f32, normal_pct: f32, slow_pct: f32, travel: Travel) -> Self {
        Self {
            distance_in,
            wheel_diameter_in: DEFAULT_WHEEL_DIAMETER_IN,
            velocity: VelocityPair::new(normal_pct, slow_pct),
            travel,
        }
    }

    /// Override the wheel diameter
    pub fn with_wheel_diameter(mut self, wheel_diameter_in: f32) -> Self {
        self.wheel_diameter_in = wheel_diameter_in;
        self
    }

    /// Encoder degrees for this target
    pub fn target_count(&self) -> f32 {
        target_count(self.distance_in, self.wheel_diameter_in)
    }

    /// Reject targets that can never be reached
    pub fn validate(&self) -> Result<(), SegmentError> {
        let finite = self.distance_in.is_finite()
            && self.wheel_diameter_in.is_finite()
            && self.velocity.normal.is_finite()
            && self.velocity.slow.is_finite();

        if !finite || self.distance_in <= 0.0 || self.wheel_diameter_in <= 0.0 {
            #[cfg(feature = "defmt")]
            defmt::warn!("Rejecting drive of {} in", self.distance_in);
            return Err(SegmentError::InvalidTarget);
        }
        Ok(())
    }
}

/// How the leading wheel is slowed
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Correction {
    /// Leading wheel runs at the slow velocity
    Fixed,
    /// Leading wheel speed is matched to the lagging wheel
    Pid(PidGains),
}

/// Last encoder sample used for speed estimation
#[derive(Debug, Clone, Copy)]
struct Sample {
    encoders: EncoderPair,
    at_ms: u32,
}

/// Drive-straight segment
#[derive(Debug, Clone)]
pub struct StraightCorrector {
    target: DriveTarget,
    count: f32,
    correction: Correction,
    ramp: VelocityRamp,
    guard: SegmentGuard,
    stop_mode: StopMode,
    /// PID state used while the right wheel leads
    right_pid: PidState,
    /// PID state used while the left wheel leads
    left_pid: PidState,
    prev: Option<Sample>,
    encoders: EncoderPair,
    last_command: WheelCommand,
    ticks: u32,
}

impl StraightCorrector {
    /// Create a corrector for a validated target
    pub fn new(
        target: DriveTarget,
        correction: Correction,
        ramp: Option<RampConfig>,
        guard: GuardConfig,
    ) -> Result<Self, SegmentError> {
        target.validate()?;

        let ramp = match ramp {
            Some(cfg) => VelocityRamp::new(target.velocity, cfg),
            None => VelocityRamp::disabled(target.velocity),
        };

        Ok(Self {
            target,
            count: target.target_count(),
            correction,
            ramp,
            guard: SegmentGuard::new(guard),
            stop_mode: StopMode::Brake,
            right_pid: PidState::new(),
            left_pid: PidState::new(),
            prev: None,
            encoders: EncoderPair::default(),
            last_command: WheelCommand::stopped(),
            ticks: 0,
        })
    }

    /// Stop behavior applied to both wheels at the end of the segment
    pub fn with_stop_mode(mut self, mode: StopMode) -> Self {
        self.stop_mode = mode;
        self
    }

    /// Drive target
    pub fn target(&self) -> &DriveTarget {
        &self.target
    }

    /// Encoder degrees at which the segment ends
    pub fn count(&self) -> f32 {
        self.count
    }

    /// Most recent wheel command
    pub fn last_command(&self) -> WheelCommand {
        self.last_command
    }

    /// Most recent encoder reading
    pub fn encoders(&self) -> EncoderPair {
        self.encoders
    }

    /// Number of ticks that commanded the wheels
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    /// Velocity magnitude for the leading wheel
    fn reduced(&mut self, leader: Lead, velocity: VelocityPair, speeds: (f32, f32), dt_s: f32) -> f32 {
        let gains = match self.correction {
            Correction::Fixed => return velocity.slow,
            Correction::Pid(gains) => gains,
        };

        let (right_speed, left_speed) = speeds;
        let out = match leader {
            Lead::Left => self.left_pid.step(&gains, right_speed, left_speed, dt_s),
            Lead::Right => self.right_pid.step(&gains, left_speed, right_speed, dt_s),
            Lead::Level => return velocity.normal,
        };

        // Only ever slow the leader, never past standstill
        velocity.normal + out.output.max(-velocity.normal).min(0.0)
    }

    /// Compute this tick's wheel command
    fn command(&mut self, encoders: EncoderPair, now_ms: u32) -> WheelCommand {
        let travel = self.target.travel;
        let sign = travel.sign();
        let velocity = self.ramp.advance();

        // Speeds along the travel direction (deg/s)
        let (speeds, dt_s) = match self.prev {
            Some(prev) => {
                let dt_s = sanitize_dt(elapsed_between(prev.at_ms, now_ms) as f32 / 1000.0);
                (
                    (
                        (encoders.right_deg - prev.encoders.right_deg) * sign / dt_s,
                        (encoders.left_deg - prev.encoders.left_deg) * sign / dt_s,
                    ),
                    dt_s,
                )
            }
            None => ((0.0, 0.0), MIN_DT_S),
        };
        self.prev = Some(Sample {
            encoders,
            at_ms: now_ms,
        });

        let leader = lead(travel, encoders.right_deg, encoders.left_deg);
        let (right, left) = match leader {
            Lead::Level => (velocity.normal, velocity.normal),
            Lead::Right => (self.reduced(leader, velocity, speeds, dt_s), velocity.normal),
            Lead::Left => (velocity.normal, self.reduced(leader, velocity, speeds, dt_s)),
        };

        WheelCommand::new(right * sign, left * sign)
    }

    fn fail<L: Motor, R: Motor>(&mut self, hw: &mut Drivetrain<L, R>, err: SegmentError) -> SegmentError {
        let _ = hw.stop();
        self.last_command = WheelCommand::stopped();
        #[cfg(feature = "defmt")]
        defmt::error!("Drive segment aborted: {}", err);
        err
    }
}

impl<L: Motor, R: Motor> SegmentController<Drivetrain<L, R>> for StraightCorrector {
    fn start(&mut self, hw: &mut Drivetrain<L, R>, now_ms: u32) -> Result<(), SegmentError> {
        hw.set_stopping(self.stop_mode);
        if let Err(e) = hw.reset_encoders() {
            return Err(self.fail(hw, e.into()));
        }

        self.ramp.reset();
        self.right_pid.reset();
        self.left_pid.reset();
        self.prev = None;
        self.encoders = EncoderPair::default();
        self.last_command = WheelCommand::stopped();
        self.ticks = 0;
        self.guard.start(now_ms, 0.0);

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "Drive {} in ({} deg), {}",
            self.target.distance_in,
            self.count,
            self.target.travel
        );
        Ok(())
    }

    fn poll(&mut self, hw: &mut Drivetrain<L, R>, now_ms: u32) -> Result<SegmentStatus, SegmentError> {
        let encoders = match hw.encoders() {
            Ok(e) => e,
            Err(e) => return Err(self.fail(hw, e.into())),
        };
        self.encoders = encoders;

        let progress = libm::fabsf(encoders.right_deg);
        if progress >= self.count {
            self.last_command = WheelCommand::stopped();
            hw.stop()?;
            return Ok(SegmentStatus::Done);
        }

        if let SafetyStatus::Fault(err) = self.guard.check(now_ms, progress) {
            return Err(self.fail(hw, err));
        }

        let command = self.command(encoders, now_ms);
        if let Err(e) = hw.apply(command) {
            return Err(self.fail(hw, e.into()));
        }
        self.last_command = command;
        self.ticks = self.ticks.saturating_add(1);

        Ok(SegmentStatus::Running)
    }

    fn abort(&mut self, hw: &mut Drivetrain<L, R>) {
        let _ = hw.stop();
        self.last_command = WheelCommand::stopped();
    }
}
