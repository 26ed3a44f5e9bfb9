//! Full-grid rasterization with neighbor context.
//!
//! Tile borders depend on the tiles across grid edges, so a grid is drawn
//! from a 3x3 neighborhood captured under the store's read lock. Drawing
//! itself happens off-lock on a worker.

use std::sync::Arc;

use rayon::prelude::*;

use super::{MapGrid, MapStore};
use crate::coords::{GRID_TILES, GridCoord, SegmentId, TileCoord};
use crate::image::{Rgba, RgbaSurface};

/// Snapshot of a grid and its eight neighbors.
pub struct MapView {
  /// Row-major, `(dy + 1) * 3 + (dx + 1)`.
  grids: [Option<Arc<MapGrid>>; 9],
}

impl MapView {
  /// Captures the neighborhood of `center` from the store.
  pub fn capture(store: &MapStore, seg: SegmentId, center: GridCoord) -> Self {
    let grids = std::array::from_fn(|i| {
      let (dx, dy) = ((i % 3) as i32 - 1, (i / 3) as i32 - 1);
      store.grid(seg, 0, center.offset(dx, dy))
    });
    Self { grids }
  }

  /// Tile priority and color at a coordinate relative to the center grid's
  /// origin. Returns `None` outside the neighborhood or for missing grids.
  fn tile(&self, rel: TileCoord) -> Option<(u8, Rgba)> {
    let g = rel.grid();
    if !(-1..=1).contains(&g.x) || !(-1..=1).contains(&g.y) {
      return None;
    }
    let grid = self.grids[((g.y + 1) * 3 + (g.x + 1)) as usize].as_deref()?;
    let set = grid.as_full()?.tileset(rel.local())?;
    Some((set.priority, set.color))
  }

  /// Draws the center grid.
  ///
  /// A tile bordering (4-neighborhood) a tile of higher priority is drawn
  /// black, which outlines terrain boundaries. Rows are drawn in parallel.
  pub fn draw(&self) -> RgbaSurface {
    const EDGES: [(i32, i32); 4] = [(0, -1), (1, 0), (0, 1), (-1, 0)];
    let mut img = RgbaSurface::new(GRID_TILES as u32, GRID_TILES as u32);
    img
      .as_slice_mut()
      .par_chunks_mut(GRID_TILES as usize)
      .enumerate()
      .for_each(|(y, row)| {
        for (x, px) in row.iter_mut().enumerate() {
          let tc = TileCoord::new(x as i32, y as i32);
          let Some((prio, color)) = self.tile(tc) else {
            continue;
          };
          let edge = EDGES.iter().any(|&(dx, dy)| {
            self
              .tile(tc + TileCoord::new(dx, dy))
              .is_some_and(|(p, _)| p > prio)
          });
          *px = if edge { Rgba::BLACK } else { color };
        }
      });
    img
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::coords::GridId;
  use crate::store::{DataGrid, TileSet};

  fn grass() -> TileSet {
    TileSet::new("gfx/tiles/grass", Rgba::rgb(0, 128, 0), 1)
  }

  fn water() -> TileSet {
    TileSet::new("gfx/tiles/water", Rgba::rgb(0, 0, 200), 2)
  }

  #[test]
  fn border_drawn_against_higher_priority_neighbor_grid() {
    let seg = SegmentId(1);
    let mut store = MapStore::default();
    store.insert_grid(seg, GridCoord::new(0, 0), DataGrid::uniform(GridId(1), grass()));
    store.insert_grid(seg, GridCoord::new(1, 0), DataGrid::uniform(GridId(2), water()));

    let img = MapView::capture(&store, seg, GridCoord::new(0, 0)).draw();
    let last = (GRID_TILES - 1) as u32;
    assert_eq!(img[(last, 50)], Rgba::BLACK);
    assert_eq!(img[(last - 1, 50)], grass().color);
    assert_eq!(img[(0, 0)], grass().color);

    // The higher-priority side gets no outline.
    let img = MapView::capture(&store, seg, GridCoord::new(1, 0)).draw();
    assert_eq!(img[(0, 50)], water().color);
  }

  #[test]
  fn missing_center_draws_transparent() {
    let store = MapStore::default();
    let img = MapView::capture(&store, SegmentId(1), GridCoord::new(0, 0)).draw();
    assert!(img.as_slice().iter().all(|&p| p == Rgba::TRANSPARENT));
  }
}
