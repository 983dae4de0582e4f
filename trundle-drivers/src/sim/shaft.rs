//! Simulated motor shafts
//!
//! A shaft turns at a fixed rate per percent of commanded velocity, plus
//! an optional external load (gravity on the arm, a dragging wheel).
//! What the load does while stopped depends on the stop mode: a holding
//! motor resists it fully, a braked one mostly, a coasting one not at all.

use core::cell::Cell;

use trundle_core::traits::{DeviceError, Motor, RotationSensor, SpinDirection, StopMode};

/// Default shaft rate (degrees per second per percent)
pub const DEFAULT_GAIN: f32 = 12.0;

/// Share of the external load that gets past a braked motor
const BRAKE_LEAK: f32 = 0.1;

/// One simulated shaft
#[derive(Debug)]
pub struct SimShaft {
    position: Cell<f32>,
    velocity_pct: Cell<f32>,
    spinning: Cell<Option<SpinDirection>>,
    stop_mode: Cell<StopMode>,
    gain: Cell<f32>,
    load_deg_per_s: Cell<f32>,
    stalled: Cell<bool>,
    fault: Cell<Option<DeviceError>>,
    stops: Cell<u32>,
}

impl Default for SimShaft {
    fn default() -> Self {
        Self::new(DEFAULT_GAIN)
    }
}

impl SimShaft {
    /// Create a shaft at rest with the given rate
    pub fn new(gain: f32) -> Self {
        Self {
            position: Cell::new(0.0),
            velocity_pct: Cell::new(0.0),
            spinning: Cell::new(None),
            stop_mode: Cell::new(StopMode::Brake),
            gain: Cell::new(gain),
            load_deg_per_s: Cell::new(0.0),
            stalled: Cell::new(false),
            fault: Cell::new(None),
            stops: Cell::new(0),
        }
    }

    /// Shaft angle (degrees)
    pub fn position(&self) -> f32 {
        self.position.get()
    }

    /// Move the shaft by hand
    pub fn set_position(&self, degrees: f32) {
        self.position.set(degrees);
    }

    /// Change the rate per percent
    pub fn set_gain(&self, gain: f32) {
        self.gain.set(gain);
    }

    /// Apply a constant external load (degrees per second)
    pub fn set_load(&self, deg_per_s: f32) {
        self.load_deg_per_s.set(deg_per_s);
    }

    /// Jam the shaft
    pub fn set_stalled(&self, stalled: bool) {
        self.stalled.set(stalled);
    }

    /// Make position reads fail
    pub fn set_fault(&self, fault: Option<DeviceError>) {
        self.fault.set(fault);
    }

    /// Check if the motor is being driven
    pub fn is_spinning(&self) -> bool {
        self.spinning.get().is_some()
    }

    /// Stop behavior currently configured
    pub fn stop_mode(&self) -> StopMode {
        self.stop_mode.get()
    }

    /// Number of stop commands received
    pub fn stops(&self) -> u32 {
        self.stops.get()
    }

    /// Commanded signed velocity (percent)
    pub fn command(&self) -> f32 {
        match self.spinning.get() {
            Some(direction) => self.velocity_pct.get() * direction.sign(),
            None => 0.0,
        }
    }

    /// Integrate motion over `dt_s` seconds
    pub fn advance(&self, dt_s: f32) {
        if self.stalled.get() {
            return;
        }

        let load = self.load_deg_per_s.get();
        let rate = if self.is_spinning() {
            self.command() * self.gain.get() + load
        } else {
            match self.stop_mode.get() {
                StopMode::Hold => 0.0,
                StopMode::Brake => load * BRAKE_LEAK,
                StopMode::Coast => load,
            }
        };
        self.position.set(self.position.get() + rate * dt_s);
    }

    fn check(&self) -> Result<(), DeviceError> {
        match self.fault.get() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Motor handle onto a simulated shaft
#[derive(Debug, Clone, Copy)]
pub struct SimMotor<'a> {
    shaft: &'a SimShaft,
}

impl<'a> SimMotor<'a> {
    /// Drive `shaft`
    pub fn new(shaft: &'a SimShaft) -> Self {
        Self { shaft }
    }
}

impl Motor for SimMotor<'_> {
    fn set_velocity(&mut self, percent: f32) -> Result<(), DeviceError> {
        self.shaft.velocity_pct.set(percent);
        Ok(())
    }

    fn spin(&mut self, direction: SpinDirection) -> Result<(), DeviceError> {
        self.shaft.spinning.set(Some(direction));
        Ok(())
    }

    fn stop(&mut self) -> Result<(), DeviceError> {
        self.shaft.spinning.set(None);
        self.shaft.stops.set(self.shaft.stops.get() + 1);
        Ok(())
    }

    fn position_deg(&mut self) -> Result<f32, DeviceError> {
        self.shaft.check()?;
        Ok(self.shaft.position())
    }

    fn set_position_deg(&mut self, degrees: f32) -> Result<(), DeviceError> {
        self.shaft.check()?;
        self.shaft.set_position(degrees);
        Ok(())
    }

    fn set_stopping(&mut self, mode: StopMode) {
        self.shaft.stop_mode.set(mode);
    }
}

/// Rotation sensor reading a simulated shaft
#[derive(Debug, Clone, Copy)]
pub struct SimRotation<'a> {
    shaft: &'a SimShaft,
    zero: f32,
}

impl<'a> SimRotation<'a> {
    /// Read `shaft`
    pub fn new(shaft: &'a SimShaft) -> Self {
        Self { shaft, zero: 0.0 }
    }
}

impl RotationSensor for SimRotation<'_> {
    fn position_deg(&mut self) -> Result<f32, DeviceError> {
        self.shaft.check()?;
        Ok(self.shaft.position() - self.zero)
    }

    fn reset_position(&mut self) -> Result<(), DeviceError> {
        self.shaft.check()?;
        self.zero = self.shaft.position();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinning_shaft_moves_at_gain() {
        let shaft = SimShaft::new(10.0);
        let mut motor = SimMotor::new(&shaft);
        motor.set_velocity(50.0).unwrap();
        motor.spin(SpinDirection::Reverse).unwrap();

        shaft.advance(0.5);
        assert_eq!(shaft.position(), -250.0);
    }

    #[test]
    fn test_stop_mode_decides_droop() {
        for (mode, expected) in [
            (StopMode::Hold, 0.0),
            (StopMode::Brake, -2.0),
            (StopMode::Coast, -20.0),
        ] {
            let shaft = SimShaft::default();
            shaft.set_load(-20.0);
            let mut motor = SimMotor::new(&shaft);
            motor.set_stopping(mode);
            motor.stop().unwrap();

            shaft.advance(1.0);
            assert!((shaft.position() - expected).abs() < 1e-4, "{:?}", mode);
        }
    }

    #[test]
    fn test_rotation_reads_relative_to_reset() {
        let shaft = SimShaft::default();
        shaft.set_position(30.0);
        let mut sensor = SimRotation::new(&shaft);
        sensor.reset_position().unwrap();
        shaft.set_position(75.0);
        assert_eq!(sensor.position_deg().unwrap(), 45.0);
    }

    #[test]
    fn test_fault_fails_reads_but_not_stop() {
        let shaft = SimShaft::default();
        shaft.set_fault(Some(DeviceError::Disconnected));
        let mut motor = SimMotor::new(&shaft);
        assert_eq!(motor.position_deg(), Err(DeviceError::Disconnected));
        assert!(motor.stop().is_ok());
        assert_eq!(shaft.stops(), 1);
    }
}
