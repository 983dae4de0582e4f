//! Routine sequencer
//!
//! Runs a routine one segment at a time. Like the controllers it drives,
//! the sequencer is a step function: call [`Sequencer::tick`] at the
//! control rate and act on the returned [`Event`]s.

use super::segment::{Routine, Segment};
use crate::config::RobotConfig;
use crate::control::{
    ArmPositioner, ArmTarget, Drivetrain, LiftArm, PointTurn, SegmentController, SegmentStatus,
    StraightCorrector, TimedDrive, TimedTarget, TurnTarget,
};
use crate::safety::SegmentError;
use crate::traits::{DeviceError, DigitalSwitch, Display, DisplayExt, Motor, RotationSensor};

/// All robot hardware, injected into the sequencer on every tick
pub struct Robot<L, R, M, S, B, D> {
    /// Drive wheels
    pub drive: Drivetrain<L, R>,
    /// Lift arm
    pub arm: LiftArm<M, S>,
    /// Start button
    pub bump: B,
    /// Status screen
    pub display: D,
}

impl<L, R, M, S, B, D> Robot<L, R, M, S, B, D>
where
    L: Motor,
    R: Motor,
    M: Motor,
    S: RotationSensor,
    B: DigitalSwitch,
    D: Display,
{
    /// Assemble a robot
    pub fn new(drive: Drivetrain<L, R>, arm: LiftArm<M, S>, bump: B, display: D) -> Self {
        Self {
            drive,
            arm,
            bump,
            display,
        }
    }

    /// Stop every actuator
    ///
    /// All motors are commanded even if one of them fails.
    pub fn stop_all(&mut self) -> Result<(), DeviceError> {
        let drive = self.drive.stop();
        let arm = self.arm.stop();
        drive.and(arm)
    }
}

/// Sequencer phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ExecutionPhase {
    /// Waiting for the bump switch
    AwaitingStart,
    /// Button pressed, waiting for the hand to clear
    Settling,
    /// A segment is running
    Running,
    /// Between segments
    Pausing,
    /// Routine finished and does not repeat
    Complete,
    /// A segment failed; actuators are stopped
    Fault(SegmentError),
}

/// Sequencer output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Bump switch pressed
    Started,
    /// Segment at index started
    SegmentStarted(u8),
    /// Segment at index reached its target
    SegmentFinished(u8),
    /// Last segment finished
    RoutineFinished,
    /// Segment failed
    Faulted(SegmentError),
}

/// Controller for the segment in progress
#[derive(Debug)]
enum Active {
    Drive(StraightCorrector),
    Turn(PointTurn),
    Lift(ArmPositioner),
    Timed(TimedDrive),
    Pause { started_ms: u32, ms: u32 },
}

/// Routine sequencer
#[derive(Debug)]
pub struct Sequencer {
    config: RobotConfig,
    routine: Routine,
    phase: ExecutionPhase,
    /// Index of the current (or last finished) segment
    index: u8,
    /// Start of the current settle or pause (ms)
    phase_started_ms: u32,
    active: Option<Active>,
}

impl Sequencer {
    /// Create a sequencer for a routine
    ///
    /// The routine's tuning overrides the matching `config` values.
    pub fn new(config: RobotConfig, routine: Routine) -> Self {
        Self {
            config: routine.tuning.apply(config),
            routine,
            phase: ExecutionPhase::AwaitingStart,
            index: 0,
            phase_started_ms: 0,
            active: None,
        }
    }

    /// Create a sequencer for the routine named in the config
    pub fn from_config(config: RobotConfig) -> Self {
        Self::new(config, config.routine.build())
    }

    /// Current phase
    pub fn phase(&self) -> ExecutionPhase {
        self.phase
    }

    /// Index of the current segment
    pub fn segment_index(&self) -> u8 {
        self.index
    }

    /// Routine being run
    pub fn routine(&self) -> &Routine {
        &self.routine
    }

    /// Robot configuration with the routine's tuning applied
    pub fn config(&self) -> &RobotConfig {
        &self.config
    }

    /// Clear a fault (or stop a finished routine) and wait for the bump switch
    pub fn reset(&mut self) {
        self.phase = ExecutionPhase::AwaitingStart;
        self.index = 0;
        self.active = None;
    }

    /// Stop the robot and go back to waiting for the bump switch
    pub fn abort<L, R, M, S, B, D>(&mut self, robot: &mut Robot<L, R, M, S, B, D>)
    where
        L: Motor,
        R: Motor,
        M: Motor,
        S: RotationSensor,
        B: DigitalSwitch,
        D: Display,
    {
        let _ = robot.stop_all();
        self.reset();
    }

    /// Advance the routine
    ///
    /// Call at the configured tick rate. Returns an event when a
    /// transition occurs.
    pub fn tick<L, R, M, S, B, D>(
        &mut self,
        robot: &mut Robot<L, R, M, S, B, D>,
        now_ms: u32,
    ) -> Option<Event>
    where
        L: Motor,
        R: Motor,
        M: Motor,
        S: RotationSensor,
        B: DigitalSwitch,
        D: Display,
    {
        match self.phase {
            ExecutionPhase::AwaitingStart => {
                if robot.bump.is_pressed() {
                    self.phase = ExecutionPhase::Settling;
                    self.phase_started_ms = now_ms;
                    Some(Event::Started)
                } else {
                    None
                }
            }
            ExecutionPhase::Settling => {
                if now_ms.wrapping_sub(self.phase_started_ms) >= self.config.timing.settle_ms {
                    self.begin_segment(robot, 0, now_ms)
                } else {
                    None
                }
            }
            ExecutionPhase::Running => self.tick_running(robot, now_ms),
            ExecutionPhase::Pausing => {
                if now_ms.wrapping_sub(self.phase_started_ms) < self.config.timing.pause_ms {
                    return None;
                }
                let next = self.index as usize + 1;
                if next < self.routine.len() {
                    self.begin_segment(robot, next as u8, now_ms)
                } else {
                    Some(self.finish_routine())
                }
            }
            ExecutionPhase::Complete | ExecutionPhase::Fault(_) => None,
        }
    }

    /// Build the controller for a segment
    fn build(&self, segment: &Segment) -> Result<Active, SegmentError> {
        let cfg = &self.config;

        let active = match *segment {
            Segment::Drive {
                distance_in,
                travel,
            } => Active::Drive(
                StraightCorrector::new(
                    cfg.drive_target(distance_in, travel),
                    cfg.correction(),
                    cfg.ramp,
                    cfg.guard,
                )?
                .with_stop_mode(cfg.drive_stop),
            ),
            Segment::Turn {
                angle_deg,
                direction,
            } => {
                let target = TurnTarget::from_angle(
                    &cfg.geometry,
                    angle_deg,
                    cfg.velocity.turn_pct,
                    direction,
                )?;
                Active::Turn(PointTurn::new(target, cfg.guard).with_stop_mode(cfg.drive_stop))
            }
            Segment::TurnCount {
                count_deg,
                direction,
            } => {
                let target = TurnTarget::new(count_deg, cfg.velocity.turn_pct, direction)?;
                Active::Turn(PointTurn::new(target, cfg.guard).with_stop_mode(cfg.drive_stop))
            }
            Segment::Lift { angle_deg } => Active::Lift(ArmPositioner::new(
                ArmTarget::new(angle_deg, cfg.velocity.lift_pct)?,
                cfg.guard,
            )),
            Segment::Timed { ms, velocity_pct } => Active::Timed(
                TimedDrive::new(TimedTarget::new(ms, velocity_pct)?, cfg.guard)
                    .with_stop_mode(cfg.drive_stop),
            ),
            Segment::Pause { ms } => Active::Pause { started_ms: 0, ms },
        };
        Ok(active)
    }

    fn begin_segment<L, R, M, S, B, D>(
        &mut self,
        robot: &mut Robot<L, R, M, S, B, D>,
        index: u8,
        now_ms: u32,
    ) -> Option<Event>
    where
        L: Motor,
        R: Motor,
        M: Motor,
        S: RotationSensor,
        B: DigitalSwitch,
        D: Display,
    {
        let Some(segment) = self.routine.get(index as usize).copied() else {
            return Some(self.finish_routine());
        };
        self.index = index;

        let mut active = match self.build(&segment) {
            Ok(active) => active,
            Err(e) => return Some(self.fault(robot, e)),
        };

        let started = match &mut active {
            Active::Drive(seg) => seg.start(&mut robot.drive, now_ms),
            Active::Turn(seg) => seg.start(&mut robot.drive, now_ms),
            Active::Lift(seg) => {
                let started = seg.start(&mut robot.arm, now_ms);
                robot
                    .display
                    .draw_field(1, 1, "Initial Rotation: ", seg.angle_deg());
                started
            }
            Active::Timed(seg) => {
                let started = seg.start(&mut robot.drive, now_ms);
                robot.display.set_cursor(1, 1);
                robot.display.print("Timer Started");
                started
            }
            Active::Pause { started_ms, .. } => {
                *started_ms = now_ms;
                Ok(())
            }
        };
        if let Err(e) = started {
            return Some(self.fault(robot, e));
        }

        #[cfg(feature = "defmt")]
        defmt::info!("Segment {}: {}", index, segment);

        self.active = Some(active);
        self.phase = ExecutionPhase::Running;
        Some(Event::SegmentStarted(index))
    }

    fn tick_running<L, R, M, S, B, D>(
        &mut self,
        robot: &mut Robot<L, R, M, S, B, D>,
        now_ms: u32,
    ) -> Option<Event>
    where
        L: Motor,
        R: Motor,
        M: Motor,
        S: RotationSensor,
        B: DigitalSwitch,
        D: Display,
    {
        let status = match self.active.as_mut() {
            Some(Active::Drive(seg)) => {
                let status = seg.poll(&mut robot.drive, now_ms);
                robot.display.show_encoders(&seg.encoders());
                status
            }
            Some(Active::Turn(seg)) => seg.poll(&mut robot.drive, now_ms),
            Some(Active::Lift(seg)) => {
                let status = seg.poll(&mut robot.arm, now_ms);
                if status == Ok(SegmentStatus::Done) {
                    robot
                        .display
                        .draw_field(2, 1, "Final Rotation: ", seg.angle_deg());
                }
                status
            }
            Some(Active::Timed(seg)) => {
                let status = seg.poll(&mut robot.drive, now_ms);
                if status == Ok(SegmentStatus::Done) {
                    robot.display.draw_field(2, 1, "Time: ", seg.elapsed_s());
                }
                status
            }
            Some(Active::Pause { started_ms, ms }) => {
                if now_ms.wrapping_sub(*started_ms) >= *ms {
                    Ok(SegmentStatus::Done)
                } else {
                    Ok(SegmentStatus::Running)
                }
            }
            None => Ok(SegmentStatus::Done),
        };

        match status {
            Ok(SegmentStatus::Running) => None,
            Ok(SegmentStatus::Done) => {
                self.active = None;
                self.phase = ExecutionPhase::Pausing;
                self.phase_started_ms = now_ms;
                Some(Event::SegmentFinished(self.index))
            }
            Err(e) => Some(self.fault(robot, e)),
        }
    }

    fn finish_routine(&mut self) -> Event {
        self.active = None;
        self.index = 0;
        self.phase = if self.routine.repeat {
            ExecutionPhase::AwaitingStart
        } else {
            ExecutionPhase::Complete
        };

        #[cfg(feature = "defmt")]
        defmt::info!("Routine {} finished", self.routine.name);
        Event::RoutineFinished
    }

    fn fault<L, R, M, S, B, D>(
        &mut self,
        robot: &mut Robot<L, R, M, S, B, D>,
        err: SegmentError,
    ) -> Event
    where
        L: Motor,
        R: Motor,
        M: Motor,
        S: RotationSensor,
        B: DigitalSwitch,
        D: Display,
    {
        // Stop before reporting
        let _ = robot.stop_all();
        self.active = None;
        self.phase = ExecutionPhase::Fault(err);

        #[cfg(feature = "defmt")]
        defmt::error!("Segment {} faulted: {}", self.index, err);
        Event::Faulted(err)
    }
}
