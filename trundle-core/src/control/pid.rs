//! PID speed matcher
//!
//! Single-step PID evaluation with caller-owned state. One [`PidState`]
//! exists per axis per segment; it is created fresh when the segment
//! starts and mutated through `&mut` once per tick.

/// Smallest tick interval accepted by the derivative term (seconds)
pub const MIN_DT_S: f32 = 0.001;

/// PID coefficients
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PidGains {
    /// Proportional gain (Kp)
    pub kp: f32,
    /// Integral gain (Ki)
    pub ki: f32,
    /// Derivative gain (Kd)
    pub kd: f32,
}

impl PidGains {
    /// Create gains
    pub const fn new(kp: f32, ki: f32, kd: f32) -> Self {
        Self { kp, ki, kd }
    }

    /// Check if any coefficient is non-zero
    pub fn is_configured(&self) -> bool {
        self.kp != 0.0 || self.ki != 0.0 || self.kd != 0.0
    }
}

impl Default for PidGains {
    fn default() -> Self {
        // Wheel speed matching tuned on the sentry course
        Self::new(0.1, 0.0, 0.1)
    }
}

/// Values produced by one PID step
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PidOutput {
    /// `target - actual` for this tick
    pub error: f32,
    /// Accumulated `error * dt`
    pub integral: f32,
    /// Controller output
    pub output: f32,
}

/// PID state carried between ticks
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PidState {
    prev_error: f32,
    integral: f32,
}

impl PidState {
    /// Create zeroed state
    pub const fn new() -> Self {
        Self {
            prev_error: 0.0,
            integral: 0.0,
        }
    }

    /// Zero the state for a new segment
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Error from the previous tick
    pub fn prev_error(&self) -> f32 {
        self.prev_error
    }

    /// Accumulated integral
    pub fn integral(&self) -> f32 {
        self.integral
    }

    /// Evaluate one tick and store error/integral for the next
    ///
    /// `dt_s` below [`MIN_DT_S`] (including zero, negative and NaN) is
    /// clamped so the derivative term stays finite.
    pub fn step(&mut self, gains: &PidGains, target: f32, actual: f32, dt_s: f32) -> PidOutput {
        let dt_s = sanitize_dt(dt_s);

        let error = target - actual;
        let integral = self.integral + error * dt_s;
        let derivative = (error - self.prev_error) / dt_s;

        self.prev_error = error;
        self.integral = integral;

        PidOutput {
            error,
            integral,
            output: gains.kp * error + gains.ki * integral + gains.kd * derivative,
        }
    }
}

/// Clamp a tick interval to a usable value
pub fn sanitize_dt(dt_s: f32) -> f32 {
    if dt_s >= MIN_DT_S {
        dt_s
    } else {
        #[cfg(feature = "defmt")]
        defmt::debug!("Degenerate tick interval {}s, clamping", dt_s);
        MIN_DT_S
    }
}
