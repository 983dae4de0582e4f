//! Potentiometer rotation sensor
//!
//! The lift arm pivot turns a linear potentiometer wired as a divider
//! across the ADC reference. Angle is linear in the reading; zero is
//! wherever the arm was at the last reset.

use trundle_core::traits::{DeviceError, RotationSensor};

/// Degrees per ADC count for a 250 degree pot on a 12-bit ADC
pub const DEFAULT_DEG_PER_COUNT: f32 = 250.0 / 4096.0;

/// Readings this close to either rail mean a wiring fault
const RAIL_MARGIN: u16 = 10;

/// ADC reading trait for platform abstraction
pub trait AnalogSource {
    /// Read the raw conversion (12-bit, 0-4095)
    fn read_raw(&mut self) -> Result<u16, DeviceError>;
}

/// Potentiometer on the lift arm pivot
pub struct PotRotationSensor<A> {
    adc: A,
    deg_per_count: f32,
    zero_raw: u16,
    /// ADC resolution (typically 4096 for 12-bit)
    adc_max: u16,
}

impl<A: AnalogSource> PotRotationSensor<A> {
    /// Create a sensor with the default scale
    pub fn new(adc: A) -> Self {
        Self::with_scale(adc, DEFAULT_DEG_PER_COUNT)
    }

    /// Create a sensor with a custom scale
    ///
    /// A negative scale reverses the angle direction.
    pub fn with_scale(adc: A, deg_per_count: f32) -> Self {
        Self {
            adc,
            deg_per_count,
            zero_raw: 0,
            adc_max: 4096,
        }
    }

    /// Raw reading that corresponds to zero degrees
    pub fn zero_raw(&self) -> u16 {
        self.zero_raw
    }

    /// Read the ADC and reject readings at either rail
    fn read_checked(&mut self) -> Result<u16, DeviceError> {
        let raw = self.adc.read_raw()?;

        // Wiper or supply disconnected, divider floats high
        if raw >= self.adc_max - RAIL_MARGIN {
            #[cfg(feature = "defmt")]
            defmt::warn!("Pot open circuit (raw {})", raw);
            return Err(DeviceError::Disconnected);
        }

        // Wiper shorted to ground
        if raw < RAIL_MARGIN {
            #[cfg(feature = "defmt")]
            defmt::warn!("Pot short circuit (raw {})", raw);
            return Err(DeviceError::OutOfRange);
        }

        Ok(raw)
    }
}

impl<A: AnalogSource> RotationSensor for PotRotationSensor<A> {
    fn position_deg(&mut self) -> Result<f32, DeviceError> {
        let raw = self.read_checked()?;
        let delta = raw as i32 - self.zero_raw as i32;
        Ok(delta as f32 * self.deg_per_count)
    }

    fn reset_position(&mut self) -> Result<(), DeviceError> {
        self.zero_raw = self.read_checked()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FakeAdc(Result<u16, DeviceError>);

    impl AnalogSource for FakeAdc {
        fn read_raw(&mut self) -> Result<u16, DeviceError> {
            self.0
        }
    }

    #[test]
    fn test_angle_relative_to_reset() {
        let mut pot = PotRotationSensor::with_scale(FakeAdc(Ok(2000)), 0.1);
        pot.reset_position().unwrap();
        assert_eq!(pot.zero_raw(), 2000);
        assert_eq!(pot.position_deg().unwrap(), 0.0);

        pot.adc.0 = Ok(2450);
        assert!((pot.position_deg().unwrap() - 45.0).abs() < 1e-3);

        pot.adc.0 = Ok(1550);
        assert!((pot.position_deg().unwrap() + 45.0).abs() < 1e-3);
    }

    #[test]
    fn test_negative_scale_reverses() {
        let mut pot = PotRotationSensor::with_scale(FakeAdc(Ok(1000)), -0.5);
        pot.reset_position().unwrap();
        pot.adc.0 = Ok(1100);
        assert_eq!(pot.position_deg().unwrap(), -50.0);
    }

    #[test]
    fn test_open_circuit() {
        let mut pot = PotRotationSensor::new(FakeAdc(Ok(4095)));
        assert_eq!(pot.position_deg(), Err(DeviceError::Disconnected));
        assert_eq!(pot.reset_position(), Err(DeviceError::Disconnected));
    }

    #[test]
    fn test_short_circuit() {
        let mut pot = PotRotationSensor::new(FakeAdc(Ok(3)));
        assert_eq!(pot.position_deg(), Err(DeviceError::OutOfRange));
    }

    #[test]
    fn test_adc_error_passes_through() {
        let mut pot = PotRotationSensor::new(FakeAdc(Err(DeviceError::StaleReading)));
        assert_eq!(pot.position_deg(), Err(DeviceError::StaleReading));
    }
}
