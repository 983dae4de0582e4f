//! Character grid
//!
//! In-memory copy of a character screen. The simulated robot uses it
//! directly; the firmware renders it over RTT.

use heapless::String;

use trundle_core::traits::Display;

/// Screen rows
pub const ROWS: usize = 12;
/// Screen columns
pub const COLS: usize = 48;

/// Fixed-size character grid
///
/// Rows and columns are 1-based. Text past the right edge is dropped;
/// non-ASCII characters are drawn as `?`.
#[derive(Debug, Clone)]
pub struct TextGrid {
    cells: [[u8; COLS]; ROWS],
    row: usize,
    col: usize,
}

impl Default for TextGrid {
    fn default() -> Self {
        Self {
            cells: [[b' '; COLS]; ROWS],
            row: 0,
            col: 0,
        }
    }
}

impl TextGrid {
    /// Create a blank grid
    pub fn new() -> Self {
        Self::default()
    }

    /// Text on a 1-based row, without trailing blanks
    pub fn row(&self, row: u8) -> String<COLS> {
        let mut text = String::new();
        let Some(cells) = (row as usize).checked_sub(1).and_then(|r| self.cells.get(r)) else {
            return text;
        };
        for &c in cells {
            let _ = text.push(c as char);
        }
        let trimmed = text.trim_end().len();
        text.truncate(trimmed);
        text
    }

    /// Blank the grid
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Cursor position (1-based row, column)
    pub fn cursor(&self) -> (u8, u8) {
        (self.row as u8 + 1, self.col as u8 + 1)
    }
}

impl Display for TextGrid {
    fn set_cursor(&mut self, row: u8, col: u8) {
        self.row = (row as usize).saturating_sub(1);
        self.col = (col as usize).saturating_sub(1);
    }

    fn print(&mut self, text: &str) {
        let Some(cells) = self.cells.get_mut(self.row) else {
            return;
        };
        for c in text.chars() {
            if let Some(cell) = cells.get_mut(self.col) {
                *cell = if c.is_ascii() { c as u8 } else { b'?' };
            }
            self.col += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trundle_core::control::EncoderPair;
    use trundle_core::traits::DisplayExt;

    #[test]
    fn test_encoder_row() {
        let mut screen = TextGrid::new();
        screen.show_encoders(&EncoderPair {
            right_deg: 12.0,
            left_deg: 11.5,
        });
        let row = screen.row(1);
        assert!(row.starts_with("Right Encoder: 12.0"));
        assert_eq!(&row[24..], "Left Encoder: 11.5");
    }

    #[test]
    fn test_overwrite_and_clip() {
        let mut screen = TextGrid::new();
        screen.set_cursor(2, 1);
        screen.print("Initial Rotation: 0.0");
        screen.set_cursor(2, 19);
        screen.print("45.2");
        assert_eq!(screen.row(2).as_str(), "Initial Rotation: 45.2");

        screen.set_cursor(3, 46);
        screen.print("overflow");
        assert_eq!(screen.row(3).as_str().trim_start(), "ove");
        assert_eq!(screen.row(99).as_str(), "");
    }
}
