//! Map store adapter.
//!
//! The persistent map is owned elsewhere (a loader or network layer writes
//! into it); the minimap only reads. Reads from the render path go through
//! [`MapFile::try_read`], which never blocks: a store held by a writer is
//! reported as [`Loading::Busy`] and the caller retries next tick.
//!
//! Grid data is handed out as `Arc<MapGrid>`. Writers replace grids by
//! inserting new ones, so pointer identity changes exactly when content
//! changes; image caches key on that identity.

mod grid;
mod marker;
mod view;

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard, TryLockError};

pub use grid::{DataGrid, GRID_AREA, MapGrid, OverlayLayer, TileSet, ZoomGrid};
pub use marker::{Marker, MarkerId, MarkerKind};
pub use view::MapView;

use crate::coords::{GridCoord, GridId, SegmentId};
use crate::error::Loading;

/// Where a grid lives in the segmented map.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridInfo {
  pub id: GridId,
  pub seg: SegmentId,
  /// Grid coordinate within the segment.
  pub sc: GridCoord,
}

/// Connected map region with its own coordinate space.
#[derive(Debug, Default)]
pub struct Segment {
  base: HashMap<GridCoord, GridId>,
  zoomed: HashMap<(u32, GridCoord), Arc<MapGrid>>,
}

impl Segment {
  /// Grid id at a base grid coordinate.
  pub fn grid_id(&self, gc: GridCoord) -> Option<GridId> {
    self.base.get(&gc).copied()
  }

  /// Number of base grids in the segment.
  pub fn len(&self) -> usize {
    self.base.len()
  }

  pub fn is_empty(&self) -> bool {
    self.base.is_empty()
  }
}

/// In-memory map contents.
#[derive(Debug, Default)]
pub struct MapStore {
  segments: HashMap<SegmentId, Segment>,
  info: HashMap<GridId, GridInfo>,
  grids: HashMap<GridId, Arc<MapGrid>>,
  markers: Vec<Marker>,
  next_marker: u64,
  marker_seq: u64,
}

impl MapStore {
  pub fn segment(&self, id: SegmentId) -> Option<&Segment> {
    self.segments.get(&id)
  }

  /// Creates an empty segment if it does not exist yet.
  pub fn ensure_segment(&mut self, id: SegmentId) -> &mut Segment {
    self.segments.entry(id).or_default()
  }

  /// Segment membership of a grid.
  pub fn grid_info(&self, id: GridId) -> Option<GridInfo> {
    self.info.get(&id).copied()
  }

  /// Grid data at a zoom level and coordinate.
  ///
  /// At zoom 0 `gc` is a base grid coordinate. Above zero it is the base
  /// coordinate of the zoomed cell's upper-left grid.
  pub fn grid(&self, seg: SegmentId, zoom: u32, gc: GridCoord) -> Option<Arc<MapGrid>> {
    let segment = self.segments.get(&seg)?;
    if zoom == 0 {
      let id = segment.base.get(&gc)?;
      self.grids.get(id).cloned()
    } else {
      segment.zoomed.get(&(zoom, gc)).cloned()
    }
  }

  /// Stores (or replaces) a full-resolution grid.
  pub fn insert_grid(&mut self, seg: SegmentId, sc: GridCoord, grid: DataGrid) {
    let id = grid.id;
    if let Some(prev) = self.info.get(&id).copied() {
      if (prev.seg, prev.sc) != (seg, sc) {
        if let Some(old) = self.segments.get_mut(&prev.seg) {
          old.base.remove(&prev.sc);
        }
      }
    }
    self.ensure_segment(seg).base.insert(sc, id);
    self.info.insert(id, GridInfo { id, seg, sc });
    self.grids.insert(id, Arc::new(MapGrid::Full(grid)));
  }

  /// Stores (or replaces) a pre-rendered grid. `gc` is the base coordinate
  /// of the cell's upper-left grid.
  pub fn insert_zoom_grid(&mut self, seg: SegmentId, zoom: u32, gc: GridCoord, grid: ZoomGrid) {
    debug_assert!(zoom > 0, "zoom grids start at level 1");
    self
      .ensure_segment(seg)
      .zoomed
      .insert((zoom, gc), Arc::new(MapGrid::Zoomed(grid)));
  }

  /// Current markers.
  pub fn markers(&self) -> &[Marker] {
    &self.markers
  }

  /// Advances on every marker change.
  pub fn marker_seq(&self) -> u64 {
    self.marker_seq
  }

  /// Adds a marker and returns its assigned id.
  pub fn add_marker(&mut self, mut marker: Marker) -> MarkerId {
    self.next_marker += 1;
    marker.id = MarkerId(self.next_marker);
    let id = marker.id;
    self.markers.push(marker);
    self.marker_seq += 1;
    id
  }

  /// Replaces a marker by id. Returns false if it does not exist.
  pub fn update_marker(&mut self, marker: Marker) -> bool {
    let Some(slot) = self.markers.iter_mut().find(|m| m.id == marker.id) else {
      return false;
    };
    *slot = marker;
    self.marker_seq += 1;
    true
  }

  pub fn remove_marker(&mut self, id: MarkerId) -> Option<Marker> {
    let pos = self.markers.iter().position(|m| m.id == id)?;
    self.marker_seq += 1;
    Some(self.markers.remove(pos))
  }
}

/// Shared handle to the map store.
#[derive(Clone, Debug, Default)]
pub struct MapFile(Arc<RwLock<MapStore>>);

impl MapFile {
  pub fn new(store: MapStore) -> Self {
    Self(Arc::new(RwLock::new(store)))
  }

  /// Non-blocking read access for the render path.
  pub fn try_read(&self) -> Result<RwLockReadGuard<'_, MapStore>, Loading> {
    match self.0.try_read() {
      Ok(guard) => Ok(guard),
      Err(TryLockError::WouldBlock) => Err(Loading::Busy),
      // A panicked writer leaves the data as it was; keep reading.
      Err(TryLockError::Poisoned(poisoned)) => Ok(poisoned.into_inner()),
    }
  }

  /// Blocking read access for background work. `None` if a writer
  /// panicked while holding the lock.
  pub fn read(&self) -> Option<RwLockReadGuard<'_, MapStore>> {
    self.0.read().ok()
  }

  /// Deferred reference to the grid data of a display cell.
  pub fn grid_ref(&self, seg: SegmentId, zoom: u32, gc: GridCoord) -> GridRef {
    GridRef::new(self.clone(), seg, zoom, gc)
  }

  /// Blocking write access for loaders.
  pub fn write(&self) -> RwLockWriteGuard<'_, MapStore> {
    self.0.write().unwrap_or_else(|poisoned| poisoned.into_inner())
  }
}

/// Deferred reference to grid data at a (segment, zoom, coordinate).
///
/// Resolution is lazy; each call sees the store's current content.
#[derive(Clone, Debug)]
pub struct GridRef {
  file: MapFile,
  pub seg: SegmentId,
  pub zoom: u32,
  /// Base coordinate of the cell's upper-left grid.
  pub gc: GridCoord,
}

impl GridRef {
  pub fn new(file: MapFile, seg: SegmentId, zoom: u32, gc: GridCoord) -> Self {
    Self { file, seg, zoom, gc }
  }

  /// Current grid data. `Ok(None)` means the store has no data here.
  pub fn get(&self) -> Result<Option<Arc<MapGrid>>, Loading> {
    Ok(self.file.try_read()?.grid(self.seg, self.zoom, self.gc))
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::coords::TileCoord;
  use crate::image::Rgba;

  fn grid(id: u64) -> DataGrid {
    DataGrid::uniform(GridId(id), TileSet::new("gfx/tiles/grass", Rgba::rgb(0, 128, 0), 1))
  }

  #[test]
  fn replacing_grid_changes_identity() {
    let seg = SegmentId(7);
    let mut store = MapStore::default();
    store.insert_grid(seg, GridCoord::new(2, 3), grid(1));
    let first = store.grid(seg, 0, GridCoord::new(2, 3)).unwrap();
    assert!(Arc::ptr_eq(&first, &store.grid(seg, 0, GridCoord::new(2, 3)).unwrap()));

    store.insert_grid(seg, GridCoord::new(2, 3), grid(1));
    let second = store.grid(seg, 0, GridCoord::new(2, 3)).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(
      store.grid_info(GridId(1)),
      Some(GridInfo { id: GridId(1), seg, sc: GridCoord::new(2, 3) })
    );
  }

  #[test]
  fn moved_grid_leaves_old_segment() {
    let mut store = MapStore::default();
    store.insert_grid(SegmentId(1), GridCoord::new(0, 0), grid(5));
    store.insert_grid(SegmentId(2), GridCoord::new(4, 4), grid(5));
    assert!(store.grid(SegmentId(1), 0, GridCoord::new(0, 0)).is_none());
    assert!(store.segment(SegmentId(1)).unwrap().is_empty());
    assert!(store.grid(SegmentId(2), 0, GridCoord::new(4, 4)).is_some());
  }

  #[test]
  fn marker_changes_advance_seq() {
    let mut store = MapStore::default();
    let seq = store.marker_seq();
    let id = store.add_marker(Marker::placed(SegmentId(1), TileCoord::new(5, 5), "home", Rgba::RED));
    assert!(store.marker_seq() > seq);

    let seq = store.marker_seq();
    let mut m = store.markers()[0].clone();
    m.name = "camp".into();
    assert!(store.update_marker(m));
    assert!(store.marker_seq() > seq);

    let seq = store.marker_seq();
    assert_eq!(store.remove_marker(id).map(|m| m.name), Some("camp".to_string()));
    assert!(store.marker_seq() > seq);
    assert!(store.remove_marker(id).is_none());
  }

  #[test]
  fn try_read_reports_busy_while_written() {
    let file = MapFile::default();
    let guard = file.write();
    assert_eq!(file.try_read().err(), Some(Loading::Busy));
    drop(guard);
    assert!(file.try_read().is_ok());
  }
}
