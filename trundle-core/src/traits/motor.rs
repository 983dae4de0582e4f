//! Motor driver trait
//!
//! Smart-motor style interface: a signed percentage velocity, a spin
//! direction, an integrated encoder reporting shaft position, and a
//! configurable behavior applied when the motor is stopped.

/// Largest velocity magnitude a motor accepts (percent)
pub const MAX_VELOCITY_PCT: f32 = 100.0;

/// Rotation direction for [`Motor::spin`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SpinDirection {
    /// Positive encoder direction
    #[default]
    Forward,
    /// Negative encoder direction
    Reverse,
}

impl SpinDirection {
    /// Get the opposite direction
    pub fn opposite(self) -> Self {
        match self {
            SpinDirection::Forward => SpinDirection::Reverse,
            SpinDirection::Reverse => SpinDirection::Forward,
        }
    }

    /// +1.0 for forward, -1.0 for reverse
    pub fn sign(self) -> f32 {
        match self {
            SpinDirection::Forward => 1.0,
            SpinDirection::Reverse => -1.0,
        }
    }
}

/// Behavior applied by the motor after [`Motor::stop`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StopMode {
    /// Short the windings: resists motion passively
    #[default]
    Brake,
    /// Actively servo to the stop position against external load
    Hold,
    /// Release the windings: no resistance
    Coast,
}

/// Unit for position reads and writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AngleUnit {
    /// Degrees of shaft rotation
    Degrees,
    /// Full shaft revolutions
    Revolutions,
}

impl AngleUnit {
    /// Convert a value in this unit to degrees
    pub fn to_degrees(self, value: f32) -> f32 {
        match self {
            AngleUnit::Degrees => value,
            AngleUnit::Revolutions => value * 360.0,
        }
    }

    /// Convert a value in degrees to this unit
    pub fn from_degrees(self, degrees: f32) -> f32 {
        match self {
            AngleUnit::Degrees => degrees,
            AngleUnit::Revolutions => degrees / 360.0,
        }
    }
}

/// Errors reported by motors and sensors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceError {
    /// Device not responding / unplugged
    Disconnected,
    /// Reading has not been refreshed within its validity window
    StaleReading,
    /// Reading outside the physically possible range
    OutOfRange,
    /// Bus or peripheral error while talking to the device
    Bus,
}

/// Clamp a velocity command to the valid actuator range
///
/// NaN is treated as a stop request. Out-of-range values are logged.
pub fn clamp_velocity(percent: f32) -> f32 {
    if percent.is_nan() {
        #[cfg(feature = "defmt")]
        defmt::warn!("NaN velocity command, using 0%");
        return 0.0;
    }

    if percent > MAX_VELOCITY_PCT || percent < -MAX_VELOCITY_PCT {
        #[cfg(feature = "defmt")]
        defmt::warn!("Velocity {}% out of range, clamping", percent);
        return percent.clamp(-MAX_VELOCITY_PCT, MAX_VELOCITY_PCT);
    }

    percent
}

/// Trait for a motor with an integrated position encoder
///
/// Positions are cumulative shaft rotation since the last
/// [`set_position`](Motor::set_position).
pub trait Motor {
    /// Set the commanded velocity as a signed percentage (-100..=100)
    ///
    /// Takes effect on the next [`spin`](Motor::spin), or immediately if
    /// the motor is already spinning.
    fn set_velocity(&mut self, percent: f32) -> Result<(), DeviceError>;

    /// Start spinning in the given direction at the commanded velocity
    fn spin(&mut self, direction: SpinDirection) -> Result<(), DeviceError>;

    /// Stop the motor, applying the configured [`StopMode`]
    fn stop(&mut self) -> Result<(), DeviceError>;

    /// Current shaft position in degrees
    fn position_deg(&mut self) -> Result<f32, DeviceError>;

    /// Overwrite the current shaft position (degrees)
    fn set_position_deg(&mut self, degrees: f32) -> Result<(), DeviceError>;

    /// Select the behavior applied on stop
    fn set_stopping(&mut self, mode: StopMode);

    /// Current shaft position in the requested unit
    fn position(&mut self, unit: AngleUnit) -> Result<f32, DeviceError> {
        self.position_deg().map(|deg| unit.from_degrees(deg))
    }

    /// Overwrite the current shaft position in the given unit
    fn set_position(&mut self, value: f32, unit: AngleUnit) -> Result<(), DeviceError> {
        self.set_position_deg(unit.to_degrees(value))
    }

    /// Set a signed velocity and spin forward in one call
    ///
    /// The sign of `percent` selects the direction, matching how the
    /// drivetrain commands asymmetric wheel speeds.
    fn drive(&mut self, percent: f32) -> Result<(), DeviceError> {
        self.set_velocity(clamp_velocity(percent))?;
        self.spin(SpinDirection::Forward)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_velocity() {
        assert_eq!(clamp_velocity(50.0), 50.0);
        assert_eq!(clamp_velocity(-44.0), -44.0);
        assert_eq!(clamp_velocity(140.0), 100.0);
        assert_eq!(clamp_velocity(-250.0), -100.0);
        assert_eq!(clamp_velocity(f32::NAN), 0.0);
    }

    #[test]
    fn test_angle_units() {
        assert_eq!(AngleUnit::Revolutions.to_degrees(1.5), 540.0);
        assert_eq!(AngleUnit::Revolutions.from_degrees(720.0), 2.0);
        assert_eq!(AngleUnit::Degrees.to_degrees(33.0), 33.0);
    }

    #[test]
    fn test_spin_direction() {
        assert_eq!(SpinDirection::Forward.opposite(), SpinDirection::Reverse);
        assert_eq!(SpinDirection::Reverse.sign(), -1.0);
    }
}
