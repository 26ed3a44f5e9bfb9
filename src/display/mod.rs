//! Per-cell display state: map images and markers.

mod grid;
mod marker;

pub use grid::DisplayGrid;
pub use marker::{DisplayMarker, FLAG_ANCHOR, FLAG_SIZE, SYMBOL_SIZE};
