//! Tick task for the control loop
//!
//! Provides the fixed-rate timestamp that drives the sequencer.

use defmt::*;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Ticker};

use trundle_core::traits::Timer;

use crate::board::EmbassyTimer;

/// Signal to notify the control task of a tick
pub static TICK_SIGNAL: Signal<CriticalSectionRawMutex, u32> = Signal::new();

/// Tick task - sends periodic tick signals with timestamp
#[embassy_executor::task]
pub async fn tick_task(interval_ms: u32) {
    info!("Tick task started ({} ms)", interval_ms);

    let mut ticker = Ticker::every(Duration::from_millis(interval_ms as u64));
    let timer = EmbassyTimer::new();

    loop {
        ticker.next().await;
        TICK_SIGNAL.signal(timer.elapsed_ms());
    }
}
