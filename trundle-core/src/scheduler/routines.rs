//! Built-in routines
//!
//! Courses from the classroom activities. Distances in inches, angles in
//! degrees of robot heading (turns) or arm rotation (lifts).

use super::segment::{Routine, Segment, Tuning};
use crate::control::TurnDirection;

/// Selectable routine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RoutineKind {
    /// Square patrol, repeated on every bump
    #[default]
    Sentry,
    /// Drive, lift, back up, turn, lower
    RotationDemo,
    /// Carry an object across the transport course
    Transport,
    /// A single long straight drive
    StraightTest,
    /// A single left turn by raw encoder count
    TurnTest,
    /// Drive for one second and report the time
    WaitStates,
}

impl RoutineKind {
    /// All routines
    pub const ALL: [RoutineKind; 6] = [
        RoutineKind::Sentry,
        RoutineKind::RotationDemo,
        RoutineKind::Transport,
        RoutineKind::StraightTest,
        RoutineKind::TurnTest,
        RoutineKind::WaitStates,
    ];

    /// Config name
    pub fn name(self) -> &'static str {
        match self {
            RoutineKind::Sentry => "sentry",
            RoutineKind::RotationDemo => "rotation_demo",
            RoutineKind::Transport => "transport",
            RoutineKind::StraightTest => "straight_test",
            RoutineKind::TurnTest => "turn_test",
            RoutineKind::WaitStates => "wait_states",
        }
    }

    /// Look up a routine by config name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.name() == name)
    }

    /// Build the segment list
    pub fn build(self) -> Routine {
        match self {
            RoutineKind::Sentry => sentry(),
            RoutineKind::RotationDemo => rotation_demo(),
            RoutineKind::Transport => transport(),
            RoutineKind::StraightTest => {
                Routine::from_segments(self.name(), false, &[Segment::forward(120.0)])
            }
            RoutineKind::TurnTest => turn_test(),
            RoutineKind::WaitStates => {
                Routine::from_segments(self.name(), false, &[Segment::timed(1000, 50.0)])
            }
        }
    }
}

fn sentry() -> Routine {
    let mut routine = Routine::new(RoutineKind::Sentry.name(), true).with_tuning(Tuning {
        turn_pct: Some(50.0),
        slip_multiplier: Some(1.08),
        settle_ms: Some(500),
        ..Default::default()
    });
    for _ in 0..4 {
        let _ = routine.push(Segment::forward(44.0));
        let _ = routine.push(Segment::left(90.0));
    }
    routine
}

fn turn_test() -> Routine {
    Routine::from_segments(
        RoutineKind::TurnTest.name(),
        true,
        &[Segment::turn_count(570.0, TurnDirection::Left)],
    )
    .with_tuning(Tuning {
        turn_pct: Some(70.0),
        ..Default::default()
    })
}

fn rotation_demo() -> Routine {
    Routine::from_segments(
        RoutineKind::RotationDemo.name(),
        true,
        &[
            Segment::forward(74.0),
            Segment::lift(45.0),
            Segment::reverse(45.0),
            Segment::right(90.0),
            Segment::lift(-45.0),
        ],
    )
}

fn transport() -> Routine {
    Routine::from_segments(
        RoutineKind::Transport.name(),
        true,
        &[
            Segment::forward(73.0),
            Segment::lift(50.0),
            Segment::reverse(12.0),
            Segment::right(90.0),
            Segment::forward(64.0),
            Segment::left(34.0),
            Segment::forward(16.0),
            Segment::lift(-50.0),
            Segment::lift(50.0),
            Segment::reverse(3.0),
            Segment::right(90.0),
            Segment::reverse(18.0),
            Segment::left(56.0),
            Segment::reverse(42.0),
        ],
    )
    .with_tuning(Tuning {
        slow_pct: Some(42.0),
        lift_pct: Some(30.0),
        slip_multiplier: Some(1.1),
        ..Default::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_round_trip() {
        for kind in RoutineKind::ALL {
            assert_eq!(RoutineKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(RoutineKind::from_name("dance"), None);
    }

    #[test]
    fn test_sentry_is_a_repeating_square() {
        let routine = RoutineKind::Sentry.build();
        assert!(routine.repeat);
        assert_eq!(routine.len(), 8);
        assert_eq!(routine.get(0), Some(&Segment::forward(44.0)));
        assert_eq!(routine.get(7), Some(&Segment::left(90.0)));
    }

    #[test]
    fn test_transport_course() {
        let routine = RoutineKind::Transport.build();
        assert_eq!(routine.len(), 14);
        assert_eq!(routine.get(7), Some(&Segment::lift(-50.0)));
        assert_eq!(routine.get(13), Some(&Segment::reverse(42.0)));
    }

    #[test]
    fn test_single_segment_routines() {
        assert!(!RoutineKind::StraightTest.build().repeat);
        assert!(!RoutineKind::WaitStates.build().repeat);
        assert_eq!(RoutineKind::WaitStates.build().get(0), Some(&Segment::timed(1000, 50.0)));

        let turn = RoutineKind::TurnTest.build();
        assert_eq!(turn.len(), 1);
        assert_eq!(turn.get(0), Some(&Segment::turn_count(570.0, TurnDirection::Left)));
        assert_eq!(turn.tuning.turn_pct, Some(70.0));
    }

    #[test]
    fn test_sentry_tuning() {
        let tuning = RoutineKind::Sentry.build().tuning;
        assert_eq!(tuning.turn_pct, Some(50.0));
        assert_eq!(tuning.slip_multiplier, Some(1.08));
        assert_eq!(tuning.settle_ms, Some(500));
        assert_eq!(tuning.lift_pct, None);
    }
}
