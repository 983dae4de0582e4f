//! Rotation sensor and digital switch traits

use super::motor::DeviceError;

/// Trait for absolute/relative rotation sensors (lift arm angle)
///
/// Implementations should handle the specific sensor type (magnetic
/// encoder, potentiometer, smart rotation sensor).
pub trait RotationSensor {
    /// Current angle in degrees relative to the last reset
    ///
    /// Takes `&mut self` because ADC and bus reads typically require
    /// mutable access.
    fn position_deg(&mut self) -> Result<f32, DeviceError>;

    /// Make the current angle read as zero
    fn reset_position(&mut self) -> Result<(), DeviceError>;
}

/// Trait for a digital contact switch (bump switch start trigger)
pub trait DigitalSwitch {
    /// Check if the switch is currently pressed
    fn is_pressed(&mut self) -> bool;
}
