//! Viewport windowing over display cells.
//!
//! The window is a row-major array of cell slots covering the visible cell
//! extent. When the extent moves within the same segment and zoom level,
//! cells still inside it are moved to their new slots and keep their cached
//! images; cells that fall out are dropped, which cancels their work.
//! Empty slots are filled while the store can be read without blocking.

use log::debug;

use crate::coords::{Area, GridCoord, SegmentId};
use crate::display::DisplayGrid;
use crate::store::MapFile;

/// Changes from one [`DisplayWindow::redisplay`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WindowDelta {
  /// The slot array was reallocated.
  pub rebuilt: bool,
  /// Cells carried over from the previous extent.
  pub kept: usize,
  /// Cells dropped with the previous extent.
  pub dropped: usize,
  /// Cells created for empty slots.
  pub created: usize,
}

/// Display cells for the current segment, zoom level and extent.
#[derive(Default)]
pub struct DisplayWindow {
  seg: Option<SegmentId>,
  zoom: u32,
  ext: Area<GridCoord>,
  cells: Vec<Option<DisplayGrid>>,
}

impl DisplayWindow {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn segment(&self) -> Option<SegmentId> {
    self.seg
  }

  pub fn zoom(&self) -> u32 {
    self.zoom
  }

  pub fn extent(&self) -> Area<GridCoord> {
    self.ext
  }

  /// Moves the window to `ext` in `seg` at `zoom`.
  pub fn redisplay(
    &mut self,
    file: &MapFile,
    seg: SegmentId,
    zoom: u32,
    ext: Area<GridCoord>,
  ) -> WindowDelta {
    let mut delta = WindowDelta::default();
    if self.seg != Some(seg) || self.zoom != zoom || self.ext != ext {
      let mut next: Vec<Option<DisplayGrid>> =
        std::iter::repeat_with(|| None).take(ext.len()).collect();
      let migrate = self.seg == Some(seg) && self.zoom == zoom;
      for (c, slot) in self.ext.iter().zip(self.cells.drain(..)) {
        let Some(cell) = slot else {
          continue;
        };
        match ext.index(c) {
          Some(i) if migrate => {
            next[i] = Some(cell);
            delta.kept += 1;
          }
          _ => delta.dropped += 1,
        }
      }
      self.cells = next;
      self.seg = Some(seg);
      self.zoom = zoom;
      self.ext = ext;
      delta.rebuilt = true;
    }

    if self.cells.iter().any(Option::is_none) {
      if let Ok(store) = file.try_read() {
        if store.segment(seg).is_some() {
          for (c, slot) in self.ext.iter().zip(self.cells.iter_mut()) {
            if slot.is_none() {
              *slot = Some(DisplayGrid::new(file.clone(), seg, c, zoom));
              delta.created += 1;
            }
          }
        }
      }
    }

    if delta.rebuilt {
      debug!(
        "minimap window {:?}..{:?} zoom {}: kept {}, dropped {}, created {}",
        ext.ul, ext.br, zoom, delta.kept, delta.dropped, delta.created
      );
    }
    delta
  }

  /// Cell at a cell coordinate, if inside the window and populated.
  pub fn cell(&self, c: GridCoord) -> Option<&DisplayGrid> {
    self.cells.get(self.ext.index(c)?)?.as_ref()
  }

  pub fn cell_mut(&mut self, c: GridCoord) -> Option<&mut DisplayGrid> {
    let i = self.ext.index(c)?;
    self.cells.get_mut(i)?.as_mut()
  }

  /// Populated cells with their coordinates, row-major.
  pub fn cells(&self) -> impl Iterator<Item = (GridCoord, &DisplayGrid)> {
    self
      .ext
      .iter()
      .zip(self.cells.iter())
      .filter_map(|(c, slot)| Some((c, slot.as_ref()?)))
  }

  pub fn cells_mut(&mut self) -> impl Iterator<Item = (GridCoord, &mut DisplayGrid)> {
    self
      .ext
      .iter()
      .zip(self.cells.iter_mut())
      .filter_map(|(c, slot)| Some((c, slot.as_mut()?)))
  }

  /// True if any cell on the window's edge has map data, i.e. zooming out
  /// would show something.
  pub fn has_edge_data(&self) -> bool {
    let (ul, br) = (self.ext.ul, self.ext.br);
    self.cells().any(|(c, cell)| {
      let edge = c.x == ul.x || c.y == ul.y || c.x == br.x - 1 || c.y == br.y - 1;
      edge && matches!(cell.grid(), Ok(Some(_)))
    })
  }

  /// Drops all cells, cancelling their work.
  pub fn clear(&mut self) {
    self.cells.clear();
    self.seg = None;
    self.ext = Area::default();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::coords::GridId;
  use crate::image::Rgba;
  use crate::store::{DataGrid, MapStore, TileSet};

  fn file_with_segment(seg: SegmentId) -> MapFile {
    let mut store = MapStore::default();
    store.insert_grid(
      seg,
      GridCoord::new(0, 0),
      DataGrid::uniform(GridId(1), TileSet::new("gfx/tiles/grass", Rgba::BLACK, 0)),
    );
    MapFile::new(store)
  }

  #[test]
  fn pan_keeps_overlapping_cells() {
    let seg = SegmentId(1);
    let file = file_with_segment(seg);
    let mut window = DisplayWindow::new();

    let a = Area::sized(GridCoord::new(-2, -2), 5, 4);
    let first = window.redisplay(&file, seg, 0, a);
    assert_eq!(first.created, 20);

    let b = Area::sized(GridCoord::new(-1, -2), 5, 4);
    let second = window.redisplay(&file, seg, 0, b);
    assert_eq!(second.kept, 16);
    assert_eq!(second.dropped, 4);
    assert_eq!(second.created, 4);
    assert_eq!(window.cell(GridCoord::new(0, 0)).map(|c| c.sc), Some(GridCoord::new(0, 0)));

    let same = window.redisplay(&file, seg, 0, b);
    assert_eq!(same, WindowDelta::default());
  }

  #[test]
  fn zoom_change_discards_all_cells() {
    let seg = SegmentId(1);
    let file = file_with_segment(seg);
    let mut window = DisplayWindow::new();
    let a = Area::sized(GridCoord::new(0, 0), 2, 2);
    window.redisplay(&file, seg, 0, a);
    let delta = window.redisplay(&file, seg, 1, a);
    assert_eq!(delta.kept, 0);
    assert_eq!(delta.dropped, 4);
    assert!(window.cells().all(|(_, c)| c.zoom == 1));
  }

  #[test]
  fn busy_store_leaves_slots_empty_until_readable() {
    let seg = SegmentId(1);
    let file = file_with_segment(seg);
    let mut window = DisplayWindow::new();
    let a = Area::sized(GridCoord::new(0, 0), 3, 3);
    {
      let _writer = file.write();
      assert_eq!(window.redisplay(&file, seg, 0, a).created, 0);
    }
    assert_eq!(window.cells().count(), 0);
    assert_eq!(window.redisplay(&file, seg, 0, a).created, 9);
  }

  #[test]
  fn unknown_segment_stays_empty() {
    let file = file_with_segment(SegmentId(1));
    let mut window = DisplayWindow::new();
    let delta = window.redisplay(&file, SegmentId(9), 0, Area::sized(GridCoord::new(0, 0), 2, 2));
    assert!(delta.rebuilt);
    assert_eq!(delta.created, 0);
  }

  #[test]
  fn edge_data_detected() {
    let seg = SegmentId(1);
    let file = file_with_segment(seg);
    let mut window = DisplayWindow::new();
    window.redisplay(&file, seg, 0, Area::sized(GridCoord::new(-1, -1), 3, 3));
    assert!(!window.has_edge_data());
    window.redisplay(&file, seg, 0, Area::sized(GridCoord::new(0, 0), 3, 3));
    assert!(window.has_edge_data());
  }
}
