//! Bump switch
//!
//! Momentary contact switch used as the start button. Readings are
//! debounced over consecutive samples; a pin read error reads as
//! released so a flaky input can never start a routine.

use embedded_hal::digital::InputPin;
use embedded_hal_async::digital::Wait;

use trundle_core::traits::{DeviceError, DigitalSwitch};

/// Debounced bump switch
pub struct BumpSwitch<P> {
    pin: P,
    active_low: bool,
    debounce_samples: u8,
    candidate: bool,
    count: u8,
    stable: bool,
}

impl<P: InputPin> BumpSwitch<P> {
    /// Create a switch
    ///
    /// `debounce_samples` consecutive identical samples are needed to
    /// change state (0 and 1 both disable debouncing).
    pub fn new(pin: P, active_low: bool, debounce_samples: u8) -> Self {
        Self {
            pin,
            active_low,
            debounce_samples: debounce_samples.max(1),
            candidate: false,
            count: 0,
            stable: false,
        }
    }

    fn sample(&mut self) -> bool {
        let level = if self.active_low {
            self.pin.is_low()
        } else {
            self.pin.is_high()
        };
        level.unwrap_or(false)
    }

    /// Take one sample and return the debounced state
    pub fn poll(&mut self) -> bool {
        let sample = self.sample();
        if sample == self.candidate {
            self.count = self.count.saturating_add(1);
        } else {
            self.candidate = sample;
            self.count = 1;
        }
        if self.count >= self.debounce_samples {
            self.stable = self.candidate;
        }
        self.stable
    }
}

impl<P: InputPin + Wait> BumpSwitch<P> {
    /// Wait for the switch to be pressed
    ///
    /// Resolves on the pressing edge, then confirms the level once more.
    pub async fn wait_for_press(&mut self) -> Result<(), DeviceError> {
        loop {
            let edge = if self.active_low {
                self.pin.wait_for_falling_edge().await
            } else {
                self.pin.wait_for_rising_edge().await
            };
            edge.map_err(|_| DeviceError::Bus)?;

            if self.sample() {
                self.candidate = true;
                self.count = self.debounce_samples;
                self.stable = true;
                return Ok(());
            }
        }
    }
}

impl<P: InputPin> DigitalSwitch for BumpSwitch<P> {
    fn is_pressed(&mut self) -> bool {
        self.poll()
    }
}
