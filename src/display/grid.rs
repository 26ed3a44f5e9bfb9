use std::collections::HashMap;
use std::sync::Arc;

use log::trace;

use super::DisplayMarker;
use crate::cache::{CachedImage, spawn_render};
use crate::coords::{Area, GridCoord, SegmentId, TileCoord, cell_tiles};
use crate::error::Loading;
use crate::highlight::{self, TileHighlight};
use crate::image::{Rgba, RgbaSurface};
use crate::store::{GridRef, MapFile, MapGrid, MapView};

/// Cache key: grid identity plus a caller-owned version.
#[derive(Clone)]
struct GridKey {
  grid: Option<Arc<MapGrid>>,
  version: u64,
}

impl PartialEq for GridKey {
  fn eq(&self, other: &Self) -> bool {
    let same = match (&self.grid, &other.grid) {
      (Some(a), Some(b)) => Arc::ptr_eq(a, b),
      (None, None) => true,
      _ => false,
    };
    same && self.version == other.version
  }
}

type ImageCache = CachedImage<GridKey, RgbaSurface>;

/// One visible cell of the minimap.
///
/// Holds the cell's images and markers. Images are computed on the async
/// pool and recomputed only when the underlying grid is replaced or the
/// relevant version changes.
pub struct DisplayGrid {
  pub seg: SegmentId,
  /// Cell coordinate at `zoom`.
  pub sc: GridCoord,
  pub zoom: u32,
  /// Segment tiles covered by the cell.
  pub mapext: Area<TileCoord>,
  file: MapFile,
  gref: GridRef,
  img: ImageCache,
  overlays: HashMap<String, ImageCache>,
  highlight: ImageCache,
  markers: Vec<DisplayMarker>,
  marker_seq: Option<u64>,
  renders: u32,
}

impl DisplayGrid {
  pub fn new(file: MapFile, seg: SegmentId, sc: GridCoord, zoom: u32) -> Self {
    let size = cell_tiles(zoom);
    let gref = file.grid_ref(seg, zoom, sc.unzoom(zoom));
    Self {
      seg,
      sc,
      zoom,
      mapext: Area::sized(TileCoord::new(sc.x * size, sc.y * size), size, size),
      file,
      gref,
      img: ImageCache::new(),
      overlays: HashMap::new(),
      highlight: ImageCache::new(),
      markers: Vec::new(),
      marker_seq: None,
      renders: 0,
    }
  }

  /// Grid data behind this cell, `Err` while the store is busy.
  pub fn grid(&self) -> Result<Option<Arc<MapGrid>>, Loading> {
    self.gref.get()
  }

  /// Number of map image computations started for this cell.
  pub fn renders(&self) -> u32 {
    self.renders
  }

  /// Map image of the cell.
  ///
  /// Full-resolution grids are drawn with their neighbors for correct
  /// borders; zoomed grids are used as stored.
  pub fn img(&mut self) -> Option<Arc<RgbaSurface>> {
    let Ok(grid) = self.gref.get() else {
      return self.img.current();
    };
    let (file, seg, gc) = (self.file.clone(), self.seg, self.gref.gc);
    let renders = &mut self.renders;
    self.img.get(GridKey { grid, version: 0 }, |key| {
      let grid = key.grid.clone()?;
      *renders += 1;
      trace!("rendering cell {gc:?} in segment {seg:?}");
      Some(spawn_render(move || match &*grid {
        MapGrid::Zoomed(z) => Some(z.bitmap.clone()),
        MapGrid::Full(_) => {
          let view = MapView::capture(&*file.read()?, seg, gc);
          Some(view.draw())
        }
      }))
    })
  }

  /// Image of a named overlay layer. `version` is owned by whoever controls
  /// the layer and bumping it re-renders only this layer.
  pub fn overlay_img(&mut self, tag: &str, version: u64) -> Option<Arc<RgbaSurface>> {
    let cache = self.overlays.entry(tag.to_string()).or_default();
    let Ok(grid) = self.gref.get() else {
      return cache.current();
    };
    cache.get(GridKey { grid, version }, |key| {
      let grid = key.grid.clone()?;
      let tag = tag.to_string();
      Some(spawn_render(move || Some(grid.render_overlay(&tag))))
    })
  }

  /// Image of the tiles selected by `hl`.
  pub fn highlight_img(&mut self, hl: &TileHighlight, color: Rgba) -> Option<Arc<RgbaSurface>> {
    let Ok(grid) = self.gref.get() else {
      return self.highlight.current();
    };
    let version = hl.version();
    self.highlight.get(GridKey { grid, version }, |key| {
      let grid = key.grid.clone()?;
      let selected = hl.selected();
      Some(spawn_render(move || highlight::render(&grid, &selected, color)))
    })
  }

  /// Markers inside the cell.
  ///
  /// With `remark` the list is rebuilt if the store's markers changed since
  /// the last build. A busy store keeps the previous list.
  pub fn markers(&mut self, remark: bool) -> &mut [DisplayMarker] {
    if remark {
      if let Ok(store) = self.file.try_read() {
        if self.marker_seq != Some(store.marker_seq()) {
          self.markers = store
            .markers()
            .iter()
            .filter(|m| m.seg == self.seg && self.mapext.contains(m.tc))
            .cloned()
            .map(DisplayMarker::new)
            .collect();
          self.marker_seq = Some(store.marker_seq());
        }
      }
    }
    &mut self.markers
  }

  /// Markers as of the last rebuild.
  pub fn current_markers(&self) -> &[DisplayMarker] {
    &self.markers
  }
}
