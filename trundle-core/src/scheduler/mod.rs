//! Routine sequencing
//!
//! Chains control segments into a fixed routine that starts on a bump
//! switch press.

pub mod executor;
pub mod routines;
pub mod segment;

pub use executor::{Event, ExecutionPhase, Robot, Sequencer};
pub use routines::RoutineKind;
pub use segment::{Routine, Segment, Tuning, MAX_SEGMENTS};
