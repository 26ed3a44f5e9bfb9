//! Grid raster data held by the map store.

use std::collections::HashMap;

use crate::coords::{GRID_TILES, GridId, TileCoord};
use crate::image::{Rgba, RgbaSurface};

/// Number of tiles in one grid.
pub const GRID_AREA: usize = (GRID_TILES * GRID_TILES) as usize;

/// Tile set referenced by a grid's tile indices.
#[derive(Clone, Debug, PartialEq)]
pub struct TileSet {
  /// Resource name, e.g. `gfx/tiles/grass`.
  pub name: String,
  /// Average color used for the minimap.
  pub color: Rgba,
  /// Draw priority; a tile bordering a higher-priority tile gets an outline.
  pub priority: u8,
}

impl TileSet {
  pub fn new(name: impl Into<String>, color: Rgba, priority: u8) -> Self {
    Self {
      name: name.into(),
      color,
      priority,
    }
  }
}

/// Per-tile mask for a named overlay (claims, realms, highlights).
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayLayer {
  pub color: Rgba,
  /// Row-major, `GRID_TILES * GRID_TILES` entries.
  pub mask: Vec<bool>,
}

impl OverlayLayer {
  /// Creates an empty layer.
  pub fn new(color: Rgba) -> Self {
    Self {
      color,
      mask: vec![false; GRID_AREA],
    }
  }

  /// Marks a tile (grid-local coordinates) as covered.
  pub fn set(&mut self, local: TileCoord, on: bool) {
    self.mask[local_index(local)] = on;
  }

  fn render(&self) -> RgbaSurface {
    let data = self
      .mask
      .iter()
      .map(|&on| if on { self.color } else { Rgba::TRANSPARENT })
      .collect();
    RgbaSurface::from_vec(GRID_TILES as u32, GRID_TILES as u32, data)
  }
}

/// Full-resolution grid: one tile index per tile.
#[derive(Clone, Debug)]
pub struct DataGrid {
  pub id: GridId,
  pub tilesets: Vec<TileSet>,
  /// Row-major indices into `tilesets`.
  pub tiles: Vec<u8>,
  pub overlays: HashMap<String, OverlayLayer>,
}

impl DataGrid {
  /// Creates a grid. Panics if `tiles` is not `GRID_TILES^2` long.
  pub fn new(id: GridId, tilesets: Vec<TileSet>, tiles: Vec<u8>) -> Self {
    assert_eq!(tiles.len(), GRID_AREA, "grid tile data has wrong size");
    Self {
      id,
      tilesets,
      tiles,
      overlays: HashMap::new(),
    }
  }

  /// Creates a grid covered by a single tile set.
  pub fn uniform(id: GridId, tileset: TileSet) -> Self {
    Self::new(id, vec![tileset], vec![0; GRID_AREA])
  }

  /// Adds a named overlay layer.
  pub fn with_overlay(mut self, tag: impl Into<String>, layer: OverlayLayer) -> Self {
    self.overlays.insert(tag.into(), layer);
    self
  }

  /// Tile index at a grid-local coordinate.
  #[inline]
  pub fn tile(&self, local: TileCoord) -> u8 {
    self.tiles[local_index(local)]
  }

  /// Tile set at a grid-local coordinate, if the index is valid.
  #[inline]
  pub fn tileset(&self, local: TileCoord) -> Option<&TileSet> {
    self.tilesets.get(self.tile(local) as usize)
  }

  /// Sets the tile index at a grid-local coordinate.
  pub fn set_tile(&mut self, local: TileCoord, tile: u8) {
    self.tiles[local_index(local)] = tile;
  }
}

/// Pre-rasterized grid for zoom levels above zero.
///
/// One bitmap of `GRID_TILES x GRID_TILES` pixels covers `2^zoom x 2^zoom`
/// base grids.
#[derive(Clone, Debug)]
pub struct ZoomGrid {
  pub bitmap: RgbaSurface,
  pub overlays: HashMap<String, OverlayLayer>,
}

impl ZoomGrid {
  pub fn new(bitmap: RgbaSurface) -> Self {
    Self {
      bitmap,
      overlays: HashMap::new(),
    }
  }
}

/// Grid data as stored in a segment.
#[derive(Clone, Debug)]
pub enum MapGrid {
  /// Needs redrawing from tile data (with its neighbors).
  Full(DataGrid),
  /// Already rendered.
  Zoomed(ZoomGrid),
}

impl MapGrid {
  /// Named overlay layer, if present.
  pub fn overlay(&self, tag: &str) -> Option<&OverlayLayer> {
    match self {
      Self::Full(grid) => grid.overlays.get(tag),
      Self::Zoomed(grid) => grid.overlays.get(tag),
    }
  }

  /// Renders a named overlay layer. Grids without the layer render fully
  /// transparent so a stale image of a removed layer is replaced.
  pub fn render_overlay(&self, tag: &str) -> RgbaSurface {
    match self.overlay(tag) {
      Some(layer) => layer.render(),
      None => RgbaSurface::new(GRID_TILES as u32, GRID_TILES as u32),
    }
  }

  pub fn as_full(&self) -> Option<&DataGrid> {
    match self {
      Self::Full(grid) => Some(grid),
      Self::Zoomed(_) => None,
    }
  }
}

#[inline]
pub(crate) fn local_index(local: TileCoord) -> usize {
  debug_assert!(local.x >= 0 && local.x < GRID_TILES && local.y >= 0 && local.y < GRID_TILES);
  (local.y * GRID_TILES + local.x) as usize
}
