//! Segment safety
//!
//! Bounds every polling loop in time and progress, and defines the error
//! type a segment reports after it has stopped its actuators.

pub mod guard;

pub use guard::{GuardConfig, SafetyStatus, SegmentError, SegmentGuard};
