//! Timeout and stall guard for a single control segment
//!
//! A wheel jammed against a wall never reaches its encoder target. The
//! guard turns that into a reported fault instead of an endless loop.

use crate::traits::DeviceError;

/// Default segment time limit (ms)
pub const DEFAULT_TIMEOUT_MS: u32 = 20_000;
/// Default window in which progress must be made (ms)
pub const DEFAULT_STALL_WINDOW_MS: u32 = 1_000;
/// Default progress required per stall window (degrees)
pub const DEFAULT_MIN_PROGRESS_DEG: f32 = 2.0;

/// Reasons a segment ends without reaching its target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SegmentError {
    /// Motor or sensor failure
    Device(DeviceError),
    /// Segment ran longer than its time limit
    Timeout,
    /// No measurable progress within the stall window
    Stalled,
    /// Target rejected before any motion (negative, zero or not finite)
    InvalidTarget,
}

impl From<DeviceError> for SegmentError {
    fn from(err: DeviceError) -> Self {
        SegmentError::Device(err)
    }
}

/// Guard limits
///
/// A zero `timeout_ms` or `stall_window_ms` disables that check.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GuardConfig {
    /// Maximum segment duration (ms)
    pub timeout_ms: u32,
    /// Progress observation window (ms)
    pub stall_window_ms: u32,
    /// Minimum progress per window (degrees)
    pub min_progress_deg: f32,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            stall_window_ms: DEFAULT_STALL_WINDOW_MS,
            min_progress_deg: DEFAULT_MIN_PROGRESS_DEG,
        }
    }
}

impl GuardConfig {
    /// Guard with both checks disabled
    pub const fn disabled() -> Self {
        Self {
            timeout_ms: 0,
            stall_window_ms: 0,
            min_progress_deg: 0.0,
        }
    }
}

/// Guard condition status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SafetyStatus {
    /// Segment may continue
    Ok,
    /// Segment must stop and report
    Fault(SegmentError),
}

/// Per-segment guard state
#[derive(Debug, Clone)]
pub struct SegmentGuard {
    config: GuardConfig,
    /// Segment start time (ms)
    started_ms: u32,
    /// Start of the current stall window (ms)
    window_start_ms: u32,
    /// Progress at the start of the current stall window (degrees)
    window_progress_deg: f32,
}

impl SegmentGuard {
    /// Create a guard
    pub fn new(config: GuardConfig) -> Self {
        Self {
            config,
            started_ms: 0,
            window_start_ms: 0,
            window_progress_deg: 0.0,
        }
    }

    /// Arm the guard at segment start
    ///
    /// `progress_deg` is the progress magnitude at start (usually zero
    /// after an encoder reset).
    pub fn start(&mut self, now_ms: u32, progress_deg: f32) {
        self.started_ms = now_ms;
        self.window_start_ms = now_ms;
        self.window_progress_deg = progress_deg;
    }

    /// Milliseconds since [`start`](Self::start)
    pub fn elapsed_ms(&self, now_ms: u32) -> u32 {
        now_ms.wrapping_sub(self.started_ms)
    }

    /// Check the limits against the current progress magnitude
    pub fn check(&mut self, now_ms: u32, progress_deg: f32) -> SafetyStatus {
        let cfg = self.config;

        if cfg.timeout_ms > 0 && self.elapsed_ms(now_ms) > cfg.timeout_ms {
            #[cfg(feature = "defmt")]
            defmt::warn!("Segment timed out after {}ms", self.elapsed_ms(now_ms));
            return SafetyStatus::Fault(SegmentError::Timeout);
        }

        if cfg.stall_window_ms > 0
            && now_ms.wrapping_sub(self.window_start_ms) >= cfg.stall_window_ms
        {
            let moved = libm::fabsf(progress_deg - self.window_progress_deg);
            if moved < cfg.min_progress_deg {
                #[cfg(feature = "defmt")]
                defmt::warn!(
                    "Segment stalled: {} deg in {}ms",
                    moved,
                    cfg.stall_window_ms
                );
                return SafetyStatus::Fault(SegmentError::Stalled);
            }

            self.window_start_ms = now_ms;
            self.window_progress_deg = progress_deg;
        }

        SafetyStatus::Ok
    }

    /// Guard limits
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_progress() {
        let mut guard = SegmentGuard::new(GuardConfig::default());
        guard.start(0, 0.0);

        for tick in 1..=300u32 {
            let now = tick * 10;
            assert_eq!(guard.check(now, tick as f32 * 6.0), SafetyStatus::Ok);
        }
    }

    #[test]
    fn test_timeout() {
        let mut guard = SegmentGuard::new(GuardConfig {
            timeout_ms: 500,
            stall_window_ms: 0,
            min_progress_deg: 0.0,
        });
        guard.start(1000, 0.0);

        assert_eq!(guard.check(1500, 10.0), SafetyStatus::Ok);
        assert_eq!(
            guard.check(1501, 10.0),
            SafetyStatus::Fault(SegmentError::Timeout)
        );
    }

    #[test]
    fn test_stall() {
        let mut guard = SegmentGuard::new(GuardConfig::default());
        guard.start(0, 0.0);

        // 1 degree in the first second is below the 2 degree minimum
        assert_eq!(guard.check(500, 0.5), SafetyStatus::Ok);
        assert_eq!(
            guard.check(1000, 1.0),
            SafetyStatus::Fault(SegmentError::Stalled)
        );
    }

    #[test]
    fn test_stall_window_slides() {
        let mut guard = SegmentGuard::new(GuardConfig::default());
        guard.start(0, 0.0);

        assert_eq!(guard.check(1000, 50.0), SafetyStatus::Ok);
        // Progress is measured from the new window start
        assert_eq!(guard.check(1500, 50.5), SafetyStatus::Ok);
        assert_eq!(
            guard.check(2000, 51.0),
            SafetyStatus::Fault(SegmentError::Stalled)
        );
    }

    #[test]
    fn test_disabled() {
        let mut guard = SegmentGuard::new(GuardConfig::disabled());
        guard.start(0, 0.0);
        assert_eq!(guard.check(u32::MAX / 2, 0.0), SafetyStatus::Ok);
    }

    #[test]
    fn test_clock_wraparound() {
        let mut guard = SegmentGuard::new(GuardConfig::default());
        guard.start(u32::MAX - 5, 0.0);
        assert_eq!(guard.elapsed_ms(4), 10);
        assert_eq!(guard.check(4, 0.0), SafetyStatus::Ok);
    }

    #[test]
    fn test_device_error_conversion() {
        let err: SegmentError = DeviceError::StaleReading.into();
        assert_eq!(err, SegmentError::Device(DeviceError::StaleReading));
    }
}
