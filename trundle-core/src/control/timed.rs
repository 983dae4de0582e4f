//! Timed drive
//!
//! Spins both wheels at one velocity for a fixed time, then stops and
//! reports how long the wheels actually ran. No encoder target; the
//! encoders only feed the stall check.

use super::drivetrain::{Drivetrain, EncoderPair, WheelCommand};
use super::{SegmentController, SegmentStatus};
use crate::safety::{GuardConfig, SafetyStatus, SegmentError, SegmentGuard};
use crate::traits::{Motor, StopMode, TickTimer, TimeUnit, Timer};

/// Timed drive request
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimedTarget {
    /// How long to drive (ms)
    pub duration_ms: u32,
    /// Signed velocity for both wheels (percent, negative drives backward)
    pub velocity_pct: f32,
}

impl TimedTarget {
    /// Create a timed drive
    ///
    /// A zero velocity is rejected; use a pause to wait in place.
    pub fn new(duration_ms: u32, velocity_pct: f32) -> Result<Self, SegmentError> {
        if !velocity_pct.is_finite() || velocity_pct == 0.0 {
            #[cfg(feature = "defmt")]
            defmt::warn!("Rejecting timed drive velocity {}", velocity_pct);
            return Err(SegmentError::InvalidTarget);
        }
        Ok(Self {
            duration_ms,
            velocity_pct,
        })
    }

    /// Wheel command for this drive
    pub fn command(&self) -> WheelCommand {
        WheelCommand::new(self.velocity_pct, self.velocity_pct)
    }
}

/// Timed drive segment
#[derive(Debug, Clone)]
pub struct TimedDrive {
    target: TimedTarget,
    guard: SegmentGuard,
    stop_mode: StopMode,
    timer: TickTimer,
    encoders: EncoderPair,
    elapsed_s: f32,
    finished: bool,
}

impl TimedDrive {
    /// Create a timed drive
    ///
    /// The guard timeout counts from the end of the planned duration, so
    /// drives longer than the timeout are not cut short.
    pub fn new(target: TimedTarget, mut guard: GuardConfig) -> Self {
        if guard.timeout_ms > 0 {
            guard.timeout_ms = guard.timeout_ms.saturating_add(target.duration_ms);
        }
        Self {
            target,
            guard: SegmentGuard::new(guard),
            stop_mode: StopMode::Brake,
            timer: TickTimer::default(),
            encoders: EncoderPair::default(),
            elapsed_s: 0.0,
            finished: false,
        }
    }

    /// Stop behavior applied to both wheels when time is up
    pub fn with_stop_mode(mut self, mode: StopMode) -> Self {
        self.stop_mode = mode;
        self
    }

    /// Drive request
    pub fn target(&self) -> &TimedTarget {
        &self.target
    }

    /// Time the wheels ran, valid once the segment is done (seconds)
    pub fn elapsed_s(&self) -> f32 {
        self.elapsed_s
    }

    /// Most recent encoder reading
    pub fn encoders(&self) -> EncoderPair {
        self.encoders
    }

    fn fail<L: Motor, R: Motor>(&mut self, hw: &mut Drivetrain<L, R>, err: SegmentError) -> SegmentError {
        let _ = hw.stop();
        self.finished = true;
        #[cfg(feature = "defmt")]
        defmt::error!("Timed drive aborted: {}", err);
        err
    }

    fn finish<L: Motor, R: Motor>(&mut self, hw: &mut Drivetrain<L, R>) -> Result<SegmentStatus, SegmentError> {
        self.finished = true;
        self.elapsed_s = self.timer.elapsed(TimeUnit::Seconds);
        hw.stop()?;
        #[cfg(feature = "defmt")]
        defmt::debug!("Timed drive ran {} s", self.elapsed_s);
        Ok(SegmentStatus::Done)
    }
}

impl<L: Motor, R: Motor> SegmentController<Drivetrain<L, R>> for TimedDrive {
    fn start(&mut self, hw: &mut Drivetrain<L, R>, now_ms: u32) -> Result<(), SegmentError> {
        self.finished = false;
        self.elapsed_s = 0.0;
        self.encoders = EncoderPair::default();

        hw.set_stopping(self.stop_mode);
        if let Err(e) = hw.reset_encoders() {
            return Err(self.fail(hw, e.into()));
        }
        self.guard.start(now_ms, 0.0);
        self.timer = TickTimer::new(now_ms);

        if self.target.duration_ms == 0 {
            return self.finish(hw).map(|_| ());
        }

        if let Err(e) = hw.apply(self.target.command()) {
            return Err(self.fail(hw, e.into()));
        }
        Ok(())
    }

    fn poll(&mut self, hw: &mut Drivetrain<L, R>, now_ms: u32) -> Result<SegmentStatus, SegmentError> {
        if self.finished {
            return Ok(SegmentStatus::Done);
        }
        self.timer.observe(now_ms);

        self.encoders = match hw.encoders() {
            Ok(e) => e,
            Err(e) => return Err(self.fail(hw, e.into())),
        };

        if self.timer.elapsed_ms() >= self.target.duration_ms {
            return self.finish(hw);
        }

        let progress = libm::fabsf(self.encoders.right_deg);
        if let SafetyStatus::Fault(err) = self.guard.check(now_ms, progress) {
            return Err(self.fail(hw, err));
        }

        Ok(SegmentStatus::Running)
    }

    fn abort(&mut self, hw: &mut Drivetrain<L, R>) {
        let _ = hw.stop();
        self.finished = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::mock::MockMotor;
    use crate::traits::DeviceError;

    fn drivetrain() -> Drivetrain<MockMotor, MockMotor> {
        Drivetrain::new(MockMotor::default(), MockMotor::default())
    }

    #[test]
    fn test_runs_for_duration_then_stops() {
        let mut hw = drivetrain();
        let mut seg = TimedDrive::new(TimedTarget::new(1000, 50.0).unwrap(), GuardConfig::disabled());
        seg.start(&mut hw, 200).unwrap();

        assert_eq!(hw.right.last_command(), Some(50.0));
        assert_eq!(hw.left.last_command(), Some(50.0));
        assert_eq!(hw.right.stop_mode, StopMode::Brake);

        for now in (210..1200).step_by(10) {
            assert_eq!(seg.poll(&mut hw, now).unwrap(), SegmentStatus::Running);
        }
        assert_eq!(hw.right.stops, 0);

        assert_eq!(seg.poll(&mut hw, 1200).unwrap(), SegmentStatus::Done);
        assert_eq!(seg.elapsed_s(), 1.0);
        assert_eq!((hw.right.stops, hw.left.stops), (1, 1));

        assert_eq!(seg.poll(&mut hw, 1210).unwrap(), SegmentStatus::Done);
        assert_eq!(hw.right.stops, 1);
    }

    #[test]
    fn test_negative_velocity_drives_backward() {
        let mut hw = drivetrain();
        let mut seg = TimedDrive::new(TimedTarget::new(500, -30.0).unwrap(), GuardConfig::disabled());
        seg.start(&mut hw, 0).unwrap();
        assert_eq!(hw.right.last_command(), Some(-30.0));
        assert_eq!(hw.left.last_command(), Some(-30.0));
    }

    #[test]
    fn test_zero_duration_stops_at_start() {
        let mut hw = drivetrain();
        let mut seg = TimedDrive::new(TimedTarget::new(0, 50.0).unwrap(), GuardConfig::disabled());
        seg.start(&mut hw, 0).unwrap();
        assert!(hw.right.commands.is_empty());
        assert_eq!(hw.right.stops, 1);
        assert_eq!(seg.poll(&mut hw, 10).unwrap(), SegmentStatus::Done);
    }

    #[test]
    fn test_stalled_wheels_fault() {
        let mut hw = drivetrain();
        let mut seg = TimedDrive::new(TimedTarget::new(5000, 50.0).unwrap(), GuardConfig::default());
        seg.start(&mut hw, 0).unwrap();

        assert_eq!(seg.poll(&mut hw, 500).unwrap(), SegmentStatus::Running);
        assert_eq!(seg.poll(&mut hw, 1000), Err(SegmentError::Stalled));
        assert_eq!((hw.right.stops, hw.left.stops), (1, 1));
    }

    #[test]
    fn test_timeout_counts_past_duration() {
        let guard = GuardConfig {
            timeout_ms: 100,
            stall_window_ms: 0,
            min_progress_deg: 0.0,
        };
        let mut hw = drivetrain();
        let mut seg = TimedDrive::new(TimedTarget::new(1000, 50.0).unwrap(), guard);
        seg.start(&mut hw, 0).unwrap();
        assert_eq!(seg.poll(&mut hw, 990).unwrap(), SegmentStatus::Running);
        assert_eq!(seg.poll(&mut hw, 1000).unwrap(), SegmentStatus::Done);
    }

    #[test]
    fn test_encoder_failure_stops_wheels() {
        let mut hw = drivetrain();
        let mut seg = TimedDrive::new(TimedTarget::new(1000, 50.0).unwrap(), GuardConfig::disabled());
        seg.start(&mut hw, 0).unwrap();

        hw.left.fail_reads = true;
        assert_eq!(
            seg.poll(&mut hw, 10),
            Err(SegmentError::Device(DeviceError::Disconnected))
        );
        assert!(hw.right.spinning.is_none() && hw.left.spinning.is_none());
    }

    #[test]
    fn test_invalid_targets() {
        assert_eq!(TimedTarget::new(1000, 0.0), Err(SegmentError::InvalidTarget));
        assert_eq!(TimedTarget::new(1000, f32::NAN), Err(SegmentError::InvalidTarget));
    }
}
