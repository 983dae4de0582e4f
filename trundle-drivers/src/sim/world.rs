//! Simulated robot and clock

use core::cell::Cell;

use embedded_hal::delay::DelayNs;

use super::shaft::{SimMotor, SimRotation, SimShaft};
use crate::display::TextGrid;
use trundle_core::control::{Drivetrain, LiftArm};
use trundle_core::scheduler::Robot;
use trundle_core::traits::{DigitalSwitch, Timer};

/// Physics step (microseconds)
const STEP_US: u64 = 1000;

/// Robot built from a [`SimWorld`]
pub type SimRobot<'a> = Robot<SimMotor<'a>, SimMotor<'a>, SimMotor<'a>, SimRotation<'a>, SimSwitch<'a>, TextGrid>;

/// Bump switch driven by the test
#[derive(Debug, Clone, Copy)]
pub struct SimSwitch<'a> {
    pressed: &'a Cell<bool>,
}

impl DigitalSwitch for SimSwitch<'_> {
    fn is_pressed(&mut self) -> bool {
        self.pressed.get()
    }
}

/// Two drive shafts, a lift shaft, a bump switch and a clock
#[derive(Debug, Default)]
pub struct SimWorld {
    /// Right drive wheel
    pub right: SimShaft,
    /// Left drive wheel
    pub left: SimShaft,
    /// Lift arm (motor shaft and pivot sensor)
    pub lift: SimShaft,
    /// Bump switch level
    pub bump: Cell<bool>,
    now_us: Cell<u64>,
}

impl SimWorld {
    /// Create a world with identical shafts
    pub fn new() -> Self {
        Self::default()
    }

    /// Hardware handles onto this world
    pub fn robot(&self) -> SimRobot<'_> {
        Robot::new(
            Drivetrain::new(SimMotor::new(&self.left), SimMotor::new(&self.right)),
            LiftArm::new(SimMotor::new(&self.lift), SimRotation::new(&self.lift)),
            SimSwitch { pressed: &self.bump },
            TextGrid::new(),
        )
    }

    /// Current time (milliseconds, wrapping)
    pub fn now_ms(&self) -> u32 {
        (self.now_us.get() / 1000) as u32
    }

    /// Run the physics forward
    pub fn advance_us(&self, us: u64) {
        let mut remaining = us;
        while remaining > 0 {
            let step = remaining.min(STEP_US);
            let dt_s = step as f32 / 1_000_000.0;
            self.right.advance(dt_s);
            self.left.advance(dt_s);
            self.lift.advance(dt_s);
            self.now_us.set(self.now_us.get() + step);
            remaining -= step;
        }
    }

    /// Run the physics forward
    pub fn advance_ms(&self, ms: u32) {
        self.advance_us(ms as u64 * 1000);
    }

    /// Stopwatch on the world clock
    pub fn timer(&self) -> SimTimer<'_> {
        SimTimer {
            world: self,
            start_us: self.now_us.get(),
        }
    }

    /// Delay that advances the world
    pub fn delay(&self) -> SimDelay<'_> {
        SimDelay { world: self }
    }
}

/// Stopwatch on the simulated clock
#[derive(Debug, Clone, Copy)]
pub struct SimTimer<'a> {
    world: &'a SimWorld,
    start_us: u64,
}

impl Timer for SimTimer<'_> {
    fn clear(&mut self) {
        self.start_us = self.world.now_us.get();
    }

    fn elapsed_ms(&self) -> u32 {
        ((self.world.now_us.get() - self.start_us) / 1000) as u32
    }
}

/// Blocking delay that runs the simulation instead of waiting
#[derive(Debug, Clone, Copy)]
pub struct SimDelay<'a> {
    world: &'a SimWorld,
}

impl DelayNs for SimDelay<'_> {
    fn delay_ns(&mut self, ns: u32) {
        self.world.advance_us(ns as u64 / 1000);
    }

    fn delay_us(&mut self, us: u32) {
        self.world.advance_us(us as u64);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.world.advance_ms(ms);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_and_timer() {
        let world = SimWorld::new();
        let mut timer = world.timer();
        world.advance_ms(250);
        assert_eq!(timer.elapsed_ms(), 250);
        timer.clear();
        world.delay().delay_ms(40);
        assert_eq!(timer.elapsed_ms(), 40);
        assert_eq!(world.now_ms(), 290);
    }

    #[test]
    fn test_delay_runs_physics() {
        let world = SimWorld::new();
        let mut robot = world.robot();
        robot.drive.apply(trundle_core::control::WheelCommand::new(50.0, 50.0)).unwrap();
        world.delay().delay_ms(100);
        assert!((world.right.position() - 60.0).abs() < 1e-2);
        assert!((world.left.position() - 60.0).abs() < 1e-2);
    }
}
