//! DC motor driver for an H-bridge with encoder feedback
//!
//! This driver provides:
//! - PWM duty cycle control from a signed velocity percentage
//! - Direction control through the bridge's two input pins
//! - Minimum duty cycle handling (below which the motor won't turn)
//! - Brake, coast and hold stop behaviors
//!
//! # Usage
//!
//! Hold is a position servo, so it needs periodic updates. Call
//! `update()` from the control tick; for the other states it is a no-op.
//!
//! ```ignore
//! let mut motor = DcMotor::new(pwm, in_a, in_b, encoder, DcMotorConfig::default());
//! motor.set_stopping(StopMode::Hold);
//! motor.set_velocity(50.0)?;
//! motor.spin(SpinDirection::Forward)?;
//!
//! // In the control loop:
//! motor.update()?;
//! ```

use embedded_hal::digital::OutputPin;
use embedded_hal::pwm::SetDutyCycle;
use libm::{fabsf, roundf};

use crate::encoder::EncoderCounter;
use trundle_core::traits::{clamp_velocity, DeviceError, Motor, SpinDirection, StopMode, MAX_VELOCITY_PCT};

/// DC motor driver configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DcMotorConfig {
    /// Minimum duty cycle percentage (below this the motor won't start)
    pub min_duty_pct: u8,
    /// Encoder counts per output shaft revolution (x4 decoding)
    pub counts_per_rev: f32,
    /// Hold servo gain (percent per degree of error)
    pub hold_kp: f32,
    /// Hold error ignored around the target (degrees)
    pub hold_deadband_deg: f32,
    /// Largest velocity the hold servo may command (percent)
    pub hold_max_pct: f32,
    /// Swap the bridge inputs (motor mounted mirrored)
    pub invert: bool,
}

impl Default for DcMotorConfig {
    fn default() -> Self {
        Self {
            min_duty_pct: 12,
            counts_per_rev: 1800.0,
            hold_kp: 2.0,
            hold_deadband_deg: 1.0,
            hold_max_pct: 40.0,
            invert: false,
        }
    }
}

/// What the bridge is doing
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DriveState {
    /// Braked or coasting
    Stopped,
    /// Driven at the commanded velocity
    Spinning(SpinDirection),
    /// Servoing to a latched position
    Holding {
        /// Position to hold (degrees)
        target_deg: f32,
    },
}

/// DC motor on an H-bridge
///
/// `P` drives the bridge enable/PWM input, `A` and `B` its two direction
/// inputs, and `E` supplies the shaft encoder count.
pub struct DcMotor<P, A, B, E> {
    pwm: P,
    in_a: A,
    in_b: B,
    encoder: E,
    config: DcMotorConfig,
    velocity_pct: f32,
    stop_mode: StopMode,
    state: DriveState,
}

impl<P, A, B, E> DcMotor<P, A, B, E>
where
    P: SetDutyCycle,
    A: OutputPin,
    B: OutputPin,
    E: EncoderCounter,
{
    /// Create a new DC motor driver (initially stopped, brake on stop)
    pub fn new(pwm: P, in_a: A, in_b: B, encoder: E, config: DcMotorConfig) -> Self {
        Self {
            pwm,
            in_a,
            in_b,
            encoder,
            config,
            velocity_pct: 0.0,
            stop_mode: StopMode::Brake,
            state: DriveState::Stopped,
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &DcMotorConfig {
        &self.config
    }

    /// Current bridge state
    pub fn state(&self) -> DriveState {
        self.state
    }

    /// Commanded velocity magnitude (percent)
    pub fn velocity_pct(&self) -> f32 {
        self.velocity_pct
    }

    /// Scale the speed percentage to a duty cycle percentage
    ///
    /// Maps 0-100% to min_duty-100%, so that 0% = off and 100% = full power,
    /// with the dead zone below min_duty handled.
    fn scale_duty(&self, speed_pct: f32) -> f32 {
        let speed = fabsf(speed_pct).min(MAX_VELOCITY_PCT);
        if speed == 0.0 {
            0.0
        } else {
            let min = self.config.min_duty_pct as f32;
            (min + speed * (100.0 - min) / 100.0).min(100.0)
        }
    }

    fn set_duty_pct(&mut self, duty_pct: f32) -> Result<(), DeviceError> {
        let max = self.pwm.max_duty_cycle() as f32;
        let duty = roundf(duty_pct * max / 100.0) as u16;
        self.pwm.set_duty_cycle(duty).map_err(|_| DeviceError::Bus)
    }

    fn set_bridge(&mut self, a_high: bool, b_high: bool) -> Result<(), DeviceError> {
        let (a_high, b_high) = if self.config.invert {
            (b_high, a_high)
        } else {
            (a_high, b_high)
        };
        if a_high {
            self.in_a.set_high().map_err(|_| DeviceError::Bus)?;
        } else {
            self.in_a.set_low().map_err(|_| DeviceError::Bus)?;
        }
        if b_high {
            self.in_b.set_high().map_err(|_| DeviceError::Bus)
        } else {
            self.in_b.set_low().map_err(|_| DeviceError::Bus)
        }
    }

    /// Drive the bridge at a signed velocity
    fn output(&mut self, signed_pct: f32) -> Result<(), DeviceError> {
        if signed_pct > 0.0 {
            self.set_bridge(true, false)?;
        } else if signed_pct < 0.0 {
            self.set_bridge(false, true)?;
        } else {
            return self.brake();
        }
        self.set_duty_pct(self.scale_duty(signed_pct))
    }

    /// Short both motor terminals
    fn brake(&mut self) -> Result<(), DeviceError> {
        self.set_bridge(true, true)?;
        self.pwm.set_duty_cycle_fully_on().map_err(|_| DeviceError::Bus)
    }

    /// Release both motor terminals
    fn coast(&mut self) -> Result<(), DeviceError> {
        self.set_bridge(false, false)?;
        self.pwm.set_duty_cycle_fully_off().map_err(|_| DeviceError::Bus)
    }

    /// Run one step of the hold servo
    ///
    /// Call periodically. Does nothing unless the motor is holding.
    pub fn update(&mut self) -> Result<(), DeviceError> {
        let DriveState::Holding { target_deg } = self.state else {
            return Ok(());
        };

        let error = target_deg - self.position_deg()?;
        if fabsf(error) <= self.config.hold_deadband_deg {
            return self.brake();
        }

        let limit = fabsf(self.config.hold_max_pct);
        let command = (self.config.hold_kp * error).max(-limit).min(limit);
        self.output(command)
    }
}

impl<P, A, B, E> Motor for DcMotor<P, A, B, E>
where
    P: SetDutyCycle,
    A: OutputPin,
    B: OutputPin,
    E: EncoderCounter,
{
    fn set_velocity(&mut self, percent: f32) -> Result<(), DeviceError> {
        self.velocity_pct = clamp_velocity(percent);
        if let DriveState::Spinning(direction) = self.state {
            self.output(self.velocity_pct * direction.sign())?;
        }
        Ok(())
    }

    fn spin(&mut self, direction: SpinDirection) -> Result<(), DeviceError> {
        self.state = DriveState::Spinning(direction);
        self.output(self.velocity_pct * direction.sign())
    }

    fn stop(&mut self) -> Result<(), DeviceError> {
        match self.stop_mode {
            StopMode::Brake => {
                self.state = DriveState::Stopped;
                self.brake()
            }
            StopMode::Coast => {
                self.state = DriveState::Stopped;
                self.coast()
            }
            StopMode::Hold => {
                // Bridge is braked before the encoder is trusted
                self.state = DriveState::Stopped;
                self.brake()?;
                let target_deg = self.position_deg()?;
                #[cfg(feature = "defmt")]
                defmt::debug!("Holding at {} deg", target_deg);
                self.state = DriveState::Holding { target_deg };
                Ok(())
            }
        }
    }

    fn position_deg(&mut self) -> Result<f32, DeviceError> {
        if self.config.counts_per_rev <= 0.0 {
            return Err(DeviceError::OutOfRange);
        }
        let count = self.encoder.count()? as f32;
        Ok(count * 360.0 / self.config.counts_per_rev)
    }

    fn set_position_deg(&mut self, degrees: f32) -> Result<(), DeviceError> {
        if !degrees.is_finite() {
            return Err(DeviceError::OutOfRange);
        }
        let count = roundf(degrees * self.config.counts_per_rev / 360.0) as i32;
        self.encoder.set_count(count)?;
        if let DriveState::Holding { .. } = self.state {
            self.state = DriveState::Holding { target_deg: degrees };
        }
        Ok(())
    }

    fn set_stopping(&mut self, mode: StopMode) {
        self.stop_mode = mode;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;

    #[derive(Default)]
    struct MockPin {
        high: bool,
    }

    impl embedded_hal::digital::ErrorType for MockPin {
        type Error = Infallible;
    }

    impl OutputPin for MockPin {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.high = true;
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockPwm {
        duty: u16,
    }

    impl embedded_hal::pwm::ErrorType for MockPwm {
        type Error = Infallible;
    }

    impl SetDutyCycle for MockPwm {
        fn max_duty_cycle(&self) -> u16 {
            1000
        }

        fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
            self.duty = duty;
            Ok(())
        }
    }

    #[derive(Default)]
    struct MockCounter(i32);

    impl EncoderCounter for MockCounter {
        fn count(&mut self) -> Result<i32, DeviceError> {
            Ok(self.0)
        }

        fn set_count(&mut self, count: i32) -> Result<(), DeviceError> {
            self.0 = count;
            Ok(())
        }
    }

    type TestMotor = DcMotor<MockPwm, MockPin, MockPin, MockCounter>;

    fn motor(config: DcMotorConfig) -> TestMotor {
        DcMotor::new(
            MockPwm::default(),
            MockPin::default(),
            MockPin::default(),
            MockCounter::default(),
            config,
        )
    }

    fn bridge(m: &TestMotor) -> (bool, bool, u16) {
        (m.in_a.high, m.in_b.high, m.pwm.duty)
    }

    #[test]
    fn test_duty_scaling() {
        let m = motor(DcMotorConfig {
            min_duty_pct: 20,
            ..Default::default()
        });
        assert_eq!(m.scale_duty(0.0), 0.0);
        assert_eq!(m.scale_duty(100.0), 100.0);
        // 20 + (50% of 80) = 60
        assert_eq!(m.scale_duty(50.0), 60.0);
        assert_eq!(m.scale_duty(-50.0), 60.0);
    }

    #[test]
    fn test_spin_sets_direction_pins() {
        let mut m = motor(DcMotorConfig {
            min_duty_pct: 0,
            ..Default::default()
        });
        m.set_velocity(50.0).unwrap();
        m.spin(SpinDirection::Forward).unwrap();
        assert_eq!(bridge(&m), (true, false, 500));

        m.spin(SpinDirection::Reverse).unwrap();
        assert_eq!(bridge(&m), (false, true, 500));
    }

    #[test]
    fn test_signed_drive() {
        let mut m = motor(DcMotorConfig {
            min_duty_pct: 0,
            ..Default::default()
        });
        m.drive(-25.0).unwrap();
        assert_eq!(bridge(&m), (false, true, 250));
        assert_eq!(m.state(), DriveState::Spinning(SpinDirection::Forward));
    }

    #[test]
    fn test_velocity_change_while_spinning() {
        let mut m = motor(DcMotorConfig {
            min_duty_pct: 0,
            ..Default::default()
        });
        m.set_velocity(50.0).unwrap();
        m.spin(SpinDirection::Forward).unwrap();
        m.set_velocity(80.0).unwrap();
        assert_eq!(m.pwm.duty, 800);
    }

    #[test]
    fn test_velocity_while_stopped_waits_for_spin() {
        let mut m = motor(DcMotorConfig::default());
        m.set_velocity(80.0).unwrap();
        assert_eq!(m.pwm.duty, 0);
        assert_eq!(m.state(), DriveState::Stopped);
    }

    #[test]
    fn test_brake_and_coast() {
        let mut m = motor(DcMotorConfig::default());
        m.drive(50.0).unwrap();
        m.stop().unwrap();
        assert_eq!(bridge(&m), (true, true, 1000));

        m.set_stopping(StopMode::Coast);
        m.drive(50.0).unwrap();
        m.stop().unwrap();
        assert_eq!(bridge(&m), (false, false, 0));
        assert_eq!(m.state(), DriveState::Stopped);
    }

    #[test]
    fn test_hold_servos_back_to_latched_position() {
        let mut m = motor(DcMotorConfig {
            min_duty_pct: 0,
            counts_per_rev: 360.0,
            hold_kp: 2.0,
            hold_deadband_deg: 1.0,
            hold_max_pct: 40.0,
            invert: false,
        });
        m.encoder.0 = 45;
        m.set_stopping(StopMode::Hold);
        m.stop().unwrap();
        assert_eq!(m.state(), DriveState::Holding { target_deg: 45.0 });

        // Load pulls the arm down 5 degrees: drive up at 2 * 5 = 10%
        m.encoder.0 = 40;
        m.update().unwrap();
        assert_eq!(bridge(&m), (true, false, 100));

        // Large error is limited
        m.encoder.0 = 0;
        m.update().unwrap();
        assert_eq!(m.pwm.duty, 400);

        // Inside the deadband the bridge brakes
        m.encoder.0 = 45;
        m.update().unwrap();
        assert_eq!(bridge(&m), (true, true, 1000));
    }

    #[test]
    fn test_update_is_noop_unless_holding() {
        let mut m = motor(DcMotorConfig::default());
        m.drive(30.0).unwrap();
        let before = bridge(&m);
        m.encoder.0 = 500;
        m.update().unwrap();
        assert_eq!(bridge(&m), before);
    }

    #[test]
    fn test_position_conversion() {
        let mut m = motor(DcMotorConfig {
            counts_per_rev: 1800.0,
            ..Default::default()
        });
        m.encoder.0 = 900;
        assert_eq!(m.position_deg().unwrap(), 180.0);

        m.set_position_deg(90.0).unwrap();
        assert_eq!(m.encoder.0, 450);

        m.set_position_deg(0.0).unwrap();
        assert_eq!(m.position_deg().unwrap(), 0.0);
        assert_eq!(m.set_position_deg(f32::NAN), Err(DeviceError::OutOfRange));
    }

    #[test]
    fn test_inverted_bridge() {
        let mut m = motor(DcMotorConfig {
            min_duty_pct: 0,
            invert: true,
            ..Default::default()
        });
        m.drive(50.0).unwrap();
        assert_eq!(bridge(&m), (false, true, 500));
    }

    struct DeadCounter;

    impl EncoderCounter for DeadCounter {
        fn count(&mut self) -> Result<i32, DeviceError> {
            Err(DeviceError::Disconnected)
        }

        fn set_count(&mut self, _count: i32) -> Result<(), DeviceError> {
            Err(DeviceError::Disconnected)
        }
    }

    #[test]
    fn test_hold_stop_brakes_when_encoder_fails() {
        let mut m = DcMotor::new(
            MockPwm::default(),
            MockPin::default(),
            MockPin::default(),
            DeadCounter,
            DcMotorConfig::default(),
        );
        m.set_stopping(StopMode::Hold);
        m.set_velocity(50.0).unwrap();
        m.spin(SpinDirection::Forward).unwrap();

        assert_eq!(m.stop(), Err(DeviceError::Disconnected));
        assert_eq!(m.state(), DriveState::Stopped);
        assert_eq!((m.in_a.high, m.in_b.high, m.pwm.duty), (true, true, 1000));

        // Nothing latched, so the servo stays idle
        m.update().unwrap();
        assert_eq!(m.pwm.duty, 1000);
    }
}
