//! Quadrature (x4) decoder
//!
//! Every edge on either channel counts. Phase state is `(a << 1) | b`;
//! the forward sequence is 00 -> 01 -> 11 -> 10.

use trundle_core::traits::DeviceError;

/// Source of an accumulated encoder count
pub trait EncoderCounter {
    /// Current count (quadrature edges)
    fn count(&mut self) -> Result<i32, DeviceError>;

    /// Overwrite the count
    fn set_count(&mut self, count: i32) -> Result<(), DeviceError>;
}

/// Marker for a transition that skipped a phase
const X: i8 = 0;

/// Count delta, indexed by `prev_state * 4 + new_state`
const TRANSITIONS: [i8; 16] = [
    0, 1, -1, X, // from 00
    -1, 0, X, 1, // from 01
    1, X, 0, -1, // from 10
    X, -1, 1, 0, // from 11
];

/// Check if a transition skipped a phase (both channels changed)
fn is_skip(prev: u8, new: u8) -> bool {
    (prev ^ new) == 0b11
}

/// Software quadrature decoder
#[derive(Debug, Clone)]
pub struct QuadratureDecoder {
    state: u8,
    count: i32,
    invalid: u32,
    invert: bool,
}

impl QuadratureDecoder {
    /// Create a decoder from the current channel levels
    pub fn new(a: bool, b: bool) -> Self {
        Self {
            state: phase(a, b),
            count: 0,
            invalid: 0,
            invert: false,
        }
    }

    /// Count in the opposite direction (encoder mounted mirrored)
    pub fn inverted(mut self) -> Self {
        self.invert = true;
        self
    }

    /// Feed new channel levels, returning the count delta
    ///
    /// Skipped phases leave the count unchanged and are tallied in
    /// [`invalid_transitions`](Self::invalid_transitions).
    pub fn update(&mut self, a: bool, b: bool) -> i8 {
        let new = phase(a, b);
        let prev = self.state;
        self.state = new;

        if is_skip(prev, new) {
            self.invalid = self.invalid.saturating_add(1);
            #[cfg(feature = "defmt")]
            defmt::trace!("Quadrature skip {} -> {}", prev, new);
            return 0;
        }

        let mut delta = TRANSITIONS[(prev * 4 + new) as usize];
        if self.invert {
            delta = -delta;
        }
        self.count = self.count.wrapping_add(delta as i32);
        delta
    }

    /// Accumulated count
    pub fn position(&self) -> i32 {
        self.count
    }

    /// Number of transitions that skipped a phase
    pub fn invalid_transitions(&self) -> u32 {
        self.invalid
    }
}

fn phase(a: bool, b: bool) -> u8 {
    ((a as u8) << 1) | (b as u8)
}

impl EncoderCounter for QuadratureDecoder {
    fn count(&mut self) -> Result<i32, DeviceError> {
        Ok(self.count)
    }

    fn set_count(&mut self, count: i32) -> Result<(), DeviceError> {
        self.count = count;
        Ok(())
    }
}
