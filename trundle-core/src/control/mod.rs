//! Closed-loop control primitives
//!
//! Every controller is a polling step function: `start()` once, then
//! `poll()` at a fixed rate from whatever drives time (an embassy ticker
//! on the robot, a simulated clock in tests) until it reports
//! [`SegmentStatus::Done`]. Controllers stop their actuators before
//! returning any error.

pub mod arm;
pub mod drivetrain;
pub mod pid;
pub mod ramp;
pub mod straight;
pub mod timed;
pub mod turn;

#[cfg(test)]
pub(crate) mod mock;

pub use arm::{ArmPositioner, ArmTarget};
pub use drivetrain::{Drivetrain, EncoderPair, LiftArm, WheelCommand};
pub use pid::{PidGains, PidOutput, PidState, MIN_DT_S};
pub use ramp::{ramp_value, RampConfig, VelocityPair, VelocityRamp};
pub use straight::{
    lead, target_count, Correction, DriveTarget, Lead, StraightCorrector, Travel,
    DEFAULT_WHEEL_DIAMETER_IN,
};
pub use timed::{TimedDrive, TimedTarget};
pub use turn::{PointTurn, TurnDirection, TurnGeometry, TurnTarget};

use embedded_hal::delay::DelayNs;

use crate::safety::SegmentError;
use crate::traits::Timer;

/// Result of a single control tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SegmentStatus {
    /// Exit condition not reached yet
    Running,
    /// Target reached and actuators stopped
    Done,
}

/// A control segment operating on hardware `H`
///
/// `H` is the slice of the robot the segment owns for its lifetime
/// (the drivetrain for drives and turns, the lift arm for arm moves).
pub trait SegmentController<H> {
    /// Reset sensors and per-segment state
    fn start(&mut self, hw: &mut H, now_ms: u32) -> Result<(), SegmentError>;

    /// Run one control tick
    fn poll(&mut self, hw: &mut H, now_ms: u32) -> Result<SegmentStatus, SegmentError>;

    /// Stop every actuator this segment drives
    fn abort(&mut self, hw: &mut H);
}

/// Run a segment to completion with a blocking delay between ticks
///
/// Returns the number of ticks that ran before the exit condition was met.
pub fn run_to_completion<C, H, T, D>(
    controller: &mut C,
    hw: &mut H,
    timer: &mut T,
    delay: &mut D,
    tick_ms: u32,
) -> Result<u32, SegmentError>
where
    C: SegmentController<H>,
    T: Timer,
    D: DelayNs,
{
    timer.clear();
    controller.start(hw, timer.elapsed_ms())?;

    let mut ticks: u32 = 0;
    loop {
        if controller.poll(hw, timer.elapsed_ms())? == SegmentStatus::Done {
            return Ok(ticks);
        }
        ticks = ticks.saturating_add(1);
        delay.delay_ms(tick_ms);
    }
}

/// Millisecond difference tolerant of counter wraparound
pub(crate) fn elapsed_between(earlier_ms: u32, now_ms: u32) -> u32 {
    now_ms.wrapping_sub(earlier_ms)
}
