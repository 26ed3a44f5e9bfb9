//! Tile-type highlighting.
//!
//! Owns a set of selected tile set names. Every change advances a version
//! counter; display cells key their highlight image on it so a selection
//! change re-renders each visible cell exactly once.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::coords::{GRID_TILES, TileCoord};
use crate::image::{Rgba, RgbaSurface};
use crate::store::MapGrid;

/// Shared tile highlight selection.
#[derive(Debug, Default)]
pub struct TileHighlight {
  selected: RwLock<Arc<HashSet<String>>>,
  version: AtomicU64,
}

impl TileHighlight {
  pub fn new() -> Self {
    Self::default()
  }

  /// Changes whenever the selection changes.
  pub fn version(&self) -> u64 {
    self.version.load(Ordering::Acquire)
  }

  /// Current selection.
  pub fn selected(&self) -> Arc<HashSet<String>> {
    self
      .selected
      .read()
      .unwrap_or_else(|poisoned| poisoned.into_inner())
      .clone()
  }

  pub fn is_empty(&self) -> bool {
    self.selected().is_empty()
  }

  pub fn is_selected(&self, name: &str) -> bool {
    self.selected().contains(name)
  }

  /// Selects or deselects a tile set.
  pub fn set(&self, name: &str, on: bool) {
    self.modify(|set| {
      if on {
        set.insert(name.to_string())
      } else {
        set.remove(name)
      }
    });
  }

  pub fn toggle(&self, name: &str) {
    let on = !self.is_selected(name);
    self.set(name, on);
  }

  pub fn clear(&self) {
    self.modify(|set| {
      let changed = !set.is_empty();
      set.clear();
      changed
    });
  }

  fn modify(&self, f: impl FnOnce(&mut HashSet<String>) -> bool) {
    let mut guard = self
      .selected
      .write()
      .unwrap_or_else(|poisoned| poisoned.into_inner());
    let mut next = HashSet::clone(&guard);
    if f(&mut next) {
      *guard = Arc::new(next);
      self.version.fetch_add(1, Ordering::AcqRel);
    }
  }
}

/// Renders the highlight mask of a grid.
///
/// Only full-resolution grids know their tile types; zoomed grids yield
/// `None`.
pub fn render(grid: &MapGrid, selected: &HashSet<String>, color: Rgba) -> Option<RgbaSurface> {
  let grid = grid.as_full()?;
  let mut img = RgbaSurface::new(GRID_TILES as u32, GRID_TILES as u32);
  for y in 0..GRID_TILES {
    for x in 0..GRID_TILES {
      let tc = TileCoord::new(x, y);
      if grid.tileset(tc).is_some_and(|t| selected.contains(&t.name)) {
        img.set(x as u32, y as u32, color);
      }
    }
  }
  Some(img)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::coords::GridId;
  use crate::store::{DataGrid, TileSet, ZoomGrid};

  #[test]
  fn version_advances_only_on_change() {
    let hl = TileHighlight::new();
    let v0 = hl.version();
    hl.set("gfx/tiles/water", true);
    let v1 = hl.version();
    assert_ne!(v0, v1);
    hl.set("gfx/tiles/water", true);
    assert_eq!(hl.version(), v1);
    hl.toggle("gfx/tiles/water");
    assert!(hl.is_empty());
    assert_ne!(hl.version(), v1);
  }

  #[test]
  fn renders_selected_tiles_of_full_grids_only() {
    let mut grid = DataGrid::new(
      GridId(1),
      vec![
        TileSet::new("gfx/tiles/grass", Rgba::BLACK, 0),
        TileSet::new("gfx/tiles/water", Rgba::BLACK, 1),
      ],
      vec![0; crate::store::GRID_AREA],
    );
    grid.set_tile(TileCoord::new(3, 4), 1);
    let selected: HashSet<String> = ["gfx/tiles/water".to_string()].into();

    let img = render(&MapGrid::Full(grid), &selected, Rgba::RED).unwrap();
    assert_eq!(img[(3, 4)], Rgba::RED);
    assert_eq!(img[(4, 3)], Rgba::TRANSPARENT);

    let zoomed = MapGrid::Zoomed(ZoomGrid::new(RgbaSurface::new(100, 100)));
    assert!(render(&zoomed, &selected, Rgba::RED).is_none());
  }
}
