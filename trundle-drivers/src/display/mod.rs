//! Display implementations

pub mod grid;

pub use grid::{TextGrid, COLS, ROWS};
