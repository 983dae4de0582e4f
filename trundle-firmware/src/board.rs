//! Glue between the RP2040 peripherals and the driver traits

use embassy_rp::gpio::{Input, Output};
use embassy_rp::pwm::PwmOutput;
use embassy_time::Instant;
use portable_atomic::{AtomicI32, Ordering};

use trundle_core::scheduler::Robot;
use trundle_core::traits::{DeviceError, Display, Timer};
use trundle_drivers::display::TextGrid;
use trundle_drivers::encoder::EncoderCounter;
use trundle_drivers::motor::DcMotor;
use trundle_drivers::sensor::{AnalogSource, BumpSwitch, PotRotationSensor};

use crate::channels::{LIFT_RAW, LIFT_SAMPLED_MS, LIFT_VALID};

/// Pot samples older than this are rejected (ms)
pub const POT_STALE_MS: u32 = 50;

/// Minimum time between status screen dumps (ms)
const SCREEN_FLUSH_MS: u32 = 500;

/// Motor as wired on the board
pub type BoardMotor = DcMotor<PwmOutput<'static>, Output<'static>, Output<'static>, AtomicEncoder>;

/// The whole robot as wired on the board
pub type BoardRobot =
    Robot<BoardMotor, BoardMotor, BoardMotor, PotRotationSensor<LatestSample>, BumpSwitch<Input<'static>>, RttDisplay>;

/// Milliseconds since boot (wrapping)
pub fn uptime_ms() -> u32 {
    Instant::now().as_millis() as u32
}

/// Encoder count kept up to date by an encoder task
pub struct AtomicEncoder {
    count: &'static AtomicI32,
}

impl AtomicEncoder {
    /// Read `count`
    pub fn new(count: &'static AtomicI32) -> Self {
        Self { count }
    }
}

impl EncoderCounter for AtomicEncoder {
    fn count(&mut self) -> Result<i32, DeviceError> {
        Ok(self.count.load(Ordering::Relaxed))
    }

    fn set_count(&mut self, count: i32) -> Result<(), DeviceError> {
        self.count.store(count, Ordering::Relaxed);
        Ok(())
    }
}

/// Latest lift pot sample published by the analog task
#[derive(Default)]
pub struct LatestSample;

impl AnalogSource for LatestSample {
    fn read_raw(&mut self) -> Result<u16, DeviceError> {
        if !LIFT_VALID.load(Ordering::Acquire) {
            return Err(DeviceError::StaleReading);
        }
        let sampled = LIFT_SAMPLED_MS.load(Ordering::Acquire);
        if uptime_ms().wrapping_sub(sampled) > POT_STALE_MS {
            return Err(DeviceError::StaleReading);
        }
        Ok(LIFT_RAW.load(Ordering::Relaxed))
    }
}

/// Status screen mirrored to the RTT log
///
/// Draws into a [`TextGrid`] and dumps changed screens at most every
/// [`SCREEN_FLUSH_MS`].
#[derive(Default)]
pub struct RttDisplay {
    grid: TextGrid,
    dirty: bool,
    last_flush_ms: u32,
}

impl RttDisplay {
    /// Create a blank screen
    pub fn new() -> Self {
        Self::default()
    }

    /// Log the screen if it changed
    pub fn flush(&mut self, now_ms: u32) {
        if !self.dirty || now_ms.wrapping_sub(self.last_flush_ms) < SCREEN_FLUSH_MS {
            return;
        }
        self.dirty = false;
        self.last_flush_ms = now_ms;

        for row in 1..=2 {
            let text = self.grid.row(row);
            if !text.is_empty() {
                defmt::info!("screen {}: {}", row, text.as_str());
            }
        }
    }
}

impl Display for RttDisplay {
    fn set_cursor(&mut self, row: u8, col: u8) {
        self.grid.set_cursor(row, col);
    }

    fn print(&mut self, text: &str) {
        self.grid.print(text);
        self.dirty = true;
    }
}

/// Stopwatch on the embassy clock
pub struct EmbassyTimer {
    start: Instant,
}

impl EmbassyTimer {
    /// Start a stopwatch now
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }
}

impl Default for EmbassyTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer for EmbassyTimer {
    fn clear(&mut self) {
        self.start = Instant::now();
    }

    fn elapsed_ms(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }
}
