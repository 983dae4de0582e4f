//! Embassy async tasks
//!
//! Each task runs independently and communicates via channels/signals.

pub mod analog;
pub mod control;
pub mod encoder;
pub mod status;
pub mod tick;

pub use analog::analog_task;
pub use control::control_task;
pub use encoder::encoder_task;
pub use status::status_task;
pub use tick::tick_task;
