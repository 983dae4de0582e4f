//! Routine steps

use heapless::Vec;

use crate::config::RobotConfig;
use crate::control::{Travel, TurnDirection};

/// Maximum segments per routine
pub const MAX_SEGMENTS: usize = 32;

/// A single routine step
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Segment {
    /// Drive straight
    Drive { distance_in: f32, travel: Travel },
    /// Point turn by heading change
    Turn {
        angle_deg: f32,
        direction: TurnDirection,
    },
    /// Point turn by raw right-encoder count
    TurnCount {
        count_deg: f32,
        direction: TurnDirection,
    },
    /// Move the lift arm by a signed angle
    Lift { angle_deg: f32 },
    /// Wait with all actuators stopped
    Pause { ms: u32 },
    /// Drive both wheels at a signed velocity for a fixed time
    Timed { ms: u32, velocity_pct: f32 },
}

impl Segment {
    /// Drive forward
    pub const fn forward(distance_in: f32) -> Self {
        Segment::Drive {
            distance_in,
            travel: Travel::Forward,
        }
    }

    /// Drive backward
    pub const fn reverse(distance_in: f32) -> Self {
        Segment::Drive {
            distance_in,
            travel: Travel::Reverse,
        }
    }

    /// Turn left by a heading change
    pub const fn left(angle_deg: f32) -> Self {
        Segment::Turn {
            angle_deg,
            direction: TurnDirection::Left,
        }
    }

    /// Turn right by a heading change
    pub const fn right(angle_deg: f32) -> Self {
        Segment::Turn {
            angle_deg,
            direction: TurnDirection::Right,
        }
    }

    /// Turn by a raw right-encoder count
    pub const fn turn_count(count_deg: f32, direction: TurnDirection) -> Self {
        Segment::TurnCount {
            count_deg,
            direction,
        }
    }

    /// Move the lift arm
    pub const fn lift(angle_deg: f32) -> Self {
        Segment::Lift { angle_deg }
    }

    /// Drive for a fixed time
    pub const fn timed(ms: u32, velocity_pct: f32) -> Self {
        Segment::Timed { ms, velocity_pct }
    }
}

/// Tuning a routine was developed with
///
/// Each set field replaces the matching [`RobotConfig`] value while the
/// routine runs. Unset fields keep the configured value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Tuning {
    /// Leading wheel velocity for fixed correction (percent)
    pub slow_pct: Option<f32>,
    /// Point turn velocity (percent)
    pub turn_pct: Option<f32>,
    /// Lift arm velocity (percent)
    pub lift_pct: Option<f32>,
    /// Turn slip multiplier
    pub slip_multiplier: Option<f32>,
    /// Delay after the bump switch (ms)
    pub settle_ms: Option<u32>,
}

impl Tuning {
    /// Configuration with these overrides applied
    pub fn apply(&self, mut config: RobotConfig) -> RobotConfig {
        if let Some(slow) = self.slow_pct {
            config.velocity.slow_pct = slow;
        }
        if let Some(turn) = self.turn_pct {
            config.velocity.turn_pct = turn;
        }
        if let Some(lift) = self.lift_pct {
            config.velocity.lift_pct = lift;
        }
        if let Some(multiplier) = self.slip_multiplier {
            config.geometry.slip_multiplier = multiplier;
        }
        if let Some(settle) = self.settle_ms {
            config.timing.settle_ms = settle;
        }
        config
    }
}

/// A named, bounded list of segments
#[derive(Debug, Clone)]
pub struct Routine {
    /// Display name
    pub name: &'static str,
    /// Steps in order
    pub segments: Vec<Segment, MAX_SEGMENTS>,
    /// Go back to waiting for the bump switch when finished
    pub repeat: bool,
    /// Overrides applied to the robot configuration
    pub tuning: Tuning,
}

impl Routine {
    /// Create an empty routine
    pub fn new(name: &'static str, repeat: bool) -> Self {
        Self {
            name,
            segments: Vec::new(),
            repeat,
            tuning: Tuning::default(),
        }
    }

    /// Attach the tuning this routine was developed with
    pub fn with_tuning(mut self, tuning: Tuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Create a routine from a list of segments
    ///
    /// Segments beyond [`MAX_SEGMENTS`] are dropped.
    pub fn from_segments(name: &'static str, repeat: bool, segments: &[Segment]) -> Self {
        let mut routine = Self::new(name, repeat);
        if segments.len() > MAX_SEGMENTS {
            #[cfg(feature = "defmt")]
            defmt::warn!("Routine {} truncated to {} segments", name, MAX_SEGMENTS);
        }
        for segment in segments.iter().take(MAX_SEGMENTS) {
            let _ = routine.segments.push(*segment);
        }
        routine
    }

    /// Append a segment
    pub fn push(&mut self, segment: Segment) -> Result<(), Segment> {
        self.segments.push(segment)
    }

    /// Number of segments
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Check if the routine has no segments
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segment at `index`
    pub fn get(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncates_long_routines() {
        let segments = [Segment::Pause { ms: 1 }; MAX_SEGMENTS + 4];
        let routine = Routine::from_segments("long", false, &segments);
        assert_eq!(routine.len(), MAX_SEGMENTS);
    }

    #[test]
    fn test_push_until_full() {
        let mut routine = Routine::new("manual", false);
        for _ in 0..MAX_SEGMENTS {
            assert!(routine.push(Segment::lift(10.0)).is_ok());
        }
        assert_eq!(routine.push(Segment::lift(10.0)), Err(Segment::lift(10.0)));
    }

    #[test]
    fn test_tuning_overrides_only_set_fields() {
        let tuning = Tuning {
            turn_pct: Some(70.0),
            settle_ms: Some(500),
            ..Default::default()
        };
        let config = tuning.apply(RobotConfig::default());
        assert_eq!(config.velocity.turn_pct, 70.0);
        assert_eq!(config.timing.settle_ms, 500);
        assert_eq!(config.velocity.lift_pct, RobotConfig::default().velocity.lift_pct);
        assert_eq!(Tuning::default().apply(config), config);
    }

    #[test]
    fn test_helpers() {
        assert_eq!(
            Segment::reverse(12.0),
            Segment::Drive {
                distance_in: 12.0,
                travel: Travel::Reverse
            }
        );
        assert_eq!(
            Segment::left(90.0),
            Segment::Turn {
                angle_deg: 90.0,
                direction: TurnDirection::Left
            }
        );
    }
}
