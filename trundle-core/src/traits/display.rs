//! Text display trait for the robot's status screen

use core::fmt::Write;

use heapless::String;

use crate::control::EncoderPair;

/// Column where the left encoder readout starts
pub const LEFT_ENCODER_COL: u8 = 25;

/// Trait for a character display
///
/// Rows and columns are 1-based, matching the brain screen the classroom
/// robot ships with. Displays are best-effort: a missing screen must never
/// stop a control loop, so nothing here returns an error.
pub trait Display {
    /// Move the cursor
    fn set_cursor(&mut self, row: u8, col: u8);

    /// Print text at the cursor, advancing it
    fn print(&mut self, text: &str);
}

/// Helper trait for drawing common readouts
pub trait DisplayExt: Display {
    /// Print a float with one decimal place
    fn print_value(&mut self, value: f32) {
        let mut buf: String<16> = String::new();
        if write!(buf, "{:.1}", value).is_err() {
            buf.clear();
            let _ = buf.push_str("###");
        }
        self.print(&buf);
    }

    /// Print a label followed by a value at a position
    fn draw_field(&mut self, row: u8, col: u8, label: &str, value: f32) {
        self.set_cursor(row, col);
        self.print(label);
        self.print_value(value);
    }

    /// Show both drive encoder readings on row 1
    fn show_encoders(&mut self, encoders: &EncoderPair) {
        self.draw_field(1, 1, "Right Encoder: ", encoders.right_deg);
        self.draw_field(1, LEFT_ENCODER_COL, "Left Encoder: ", encoders.left_deg);
    }
}

// Blanket implementation for all Display types
impl<T: Display> DisplayExt for T {}

/// Display that discards everything (headless robots, tests)
#[derive(Debug, Clone, Copy, Default)]
pub struct NullDisplay;

impl Display for NullDisplay {
    fn set_cursor(&mut self, _row: u8, _col: u8) {}

    fn print(&mut self, _text: &str) {}
}
