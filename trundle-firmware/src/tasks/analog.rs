//! Lift potentiometer sampling task
//!
//! Converts the pot channel at a fixed rate and publishes the latest
//! reading with its timestamp. The control task rejects samples older
//! than [`POT_STALE_MS`](crate::board::POT_STALE_MS), so a stuck ADC stops
//! the lift instead of driving it blind.

use defmt::*;
use embassy_rp::adc::{Adc, Async, Channel};
use embassy_time::{Duration, Ticker};
use portable_atomic::Ordering;

use crate::board::uptime_ms;
use crate::channels::{LIFT_RAW, LIFT_SAMPLED_MS, LIFT_VALID};

/// Sampling period (ms)
const SAMPLE_INTERVAL_MS: u64 = 5;

/// Analog sampling task
#[embassy_executor::task]
pub async fn analog_task(mut adc: Adc<'static, Async>, mut pot: Channel<'static>) {
    info!("Analog task started");

    let mut ticker = Ticker::every(Duration::from_millis(SAMPLE_INTERVAL_MS));
    let mut failures: u32 = 0;

    loop {
        match adc.read(&mut pot).await {
            Ok(raw) => {
                LIFT_RAW.store(raw, Ordering::Relaxed);
                LIFT_SAMPLED_MS.store(uptime_ms(), Ordering::Release);
                LIFT_VALID.store(true, Ordering::Release);
                failures = 0;
            }
            Err(e) => {
                failures = failures.saturating_add(1);
                if failures == 1 {
                    warn!("Lift pot read failed: {:?}", e);
                }
            }
        }

        ticker.next().await;
    }
}
