//! Quadrature encoder task
//!
//! One instance per motor. Waits for an edge on either channel, decodes
//! the new phase and adds the step to the motor's shared count.

use defmt::*;
use embassy_futures::select::select;
use embassy_rp::gpio::Input;
use portable_atomic::{AtomicI32, Ordering};

use trundle_drivers::encoder::QuadratureDecoder;

/// Invalid transitions between warnings
const INVALID_WARN_EVERY: u32 = 100;

/// Encoder task
#[embassy_executor::task(pool_size = 3)]
pub async fn encoder_task(
    name: &'static str,
    mut a: Input<'static>,
    mut b: Input<'static>,
    invert: bool,
    count: &'static AtomicI32,
) {
    info!("Encoder task started: {}", name);

    let mut decoder = QuadratureDecoder::new(a.is_high(), b.is_high());
    if invert {
        decoder = decoder.inverted();
    }
    let mut warned_at = 0;

    loop {
        select(a.wait_for_any_edge(), b.wait_for_any_edge()).await;

        let delta = decoder.update(a.is_high(), b.is_high());
        if delta != 0 {
            count.fetch_add(delta as i32, Ordering::Relaxed);
        }

        let invalid = decoder.invalid_transitions();
        if invalid >= warned_at + INVALID_WARN_EVERY {
            warn!("{} encoder: {} skipped phases", name, invalid);
            warned_at = invalid;
        }
    }
}
