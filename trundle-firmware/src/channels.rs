//! Inter-task communication channels
//!
//! Defines the statics shared between Embassy tasks. Encoder counts and
//! the latest lift-pot sample are plain atomics written by their producer
//! task and read by the control task; sequencer events go through a
//! channel to the status task.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use portable_atomic::{AtomicBool, AtomicI32, AtomicU16, AtomicU32};

use trundle_core::scheduler::Event;

/// Channel capacity for sequencer events
const EVENT_CHANNEL_SIZE: usize = 8;

/// Sequencer events (for logging/debugging)
pub static EVENT_CHANNEL: Channel<CriticalSectionRawMutex, Event, EVENT_CHANNEL_SIZE> = Channel::new();

/// Right wheel encoder count (quadrature edges)
pub static RIGHT_COUNT: AtomicI32 = AtomicI32::new(0);

/// Left wheel encoder count (quadrature edges)
pub static LEFT_COUNT: AtomicI32 = AtomicI32::new(0);

/// Lift motor encoder count (quadrature edges)
pub static LIFT_COUNT: AtomicI32 = AtomicI32::new(0);

/// Latest raw lift potentiometer reading
pub static LIFT_RAW: AtomicU16 = AtomicU16::new(0);

/// Uptime of the latest lift potentiometer reading (ms)
pub static LIFT_SAMPLED_MS: AtomicU32 = AtomicU32::new(0);

/// Set once the first lift potentiometer reading is stored
pub static LIFT_VALID: AtomicBool = AtomicBool::new(false);
