//! Coordinate types and spatial constants.
//!
//! Defines the coordinate systems used by the minimap:
//! - [`TileCoord`]: Tile position inside a map segment (i32)
//! - [`GridCoord`]: Grid (cell) position, either in base grid units or in
//!   zoomed cell units depending on context
//! - [`Area`]: Half-open rectangle over either of the above
//!
//! World positions are plain [`DVec2`] in world distance units, screen
//! positions are [`IVec2`] pixels.

use std::ops::{Add, Mul, Sub};

use bevy::math::{DVec2, IVec2};

/// Edge length of one grid in tiles.
pub const GRID_TILES: i32 = 100;

/// Deepest supported zoom level. One cell then spans `GRID_TILES << 20`
/// tiles, which still fits an `i32` tile coordinate.
pub const MAX_ZOOM: u32 = 20;

/// Edge length of one tile in world distance units.
pub const TILE_SIZE: f64 = 11.0;

/// Edge length of one server grid in tiles (view range unit).
pub const SERVER_GRID_TILES: i32 = 11;

/// Server grids covered by the view range box on each axis.
pub const VIEW_GRIDS: i32 = 9;

/// Persistent identity of a map segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(pub u64);

/// Persistent identity of a map grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridId(pub u64);

/// Common access to the two integer axes, so [`Area`] can be shared between
/// tile and grid coordinates.
pub trait Axes: Copy {
  fn xy(self) -> (i32, i32);
  fn from_xy(x: i32, y: i32) -> Self;
}

/// Tile position within a segment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
  pub x: i32,
  pub y: i32,
}

impl TileCoord {
  /// Creates a new tile coordinate.
  pub const fn new(x: i32, y: i32) -> Self {
    Self { x, y }
  }

  /// Tile containing the given world position.
  ///
  /// Uses floor division so negative positions round toward negative
  /// infinity.
  pub fn from_world(pos: DVec2) -> Self {
    Self::new(
      (pos.x / TILE_SIZE).floor() as i32,
      (pos.y / TILE_SIZE).floor() as i32,
    )
  }

  /// Center of this tile in world units.
  pub fn world_center(self) -> DVec2 {
    DVec2::new(
      self.x as f64 * TILE_SIZE + TILE_SIZE / 2.0,
      self.y as f64 * TILE_SIZE + TILE_SIZE / 2.0,
    )
  }

  /// Base grid containing this tile.
  pub fn grid(self) -> GridCoord {
    GridCoord::new(self.x.div_euclid(GRID_TILES), self.y.div_euclid(GRID_TILES))
  }

  /// Offset of this tile inside its base grid (0 to GRID_TILES-1).
  pub fn local(self) -> TileCoord {
    TileCoord::new(self.x.rem_euclid(GRID_TILES), self.y.rem_euclid(GRID_TILES))
  }

  /// Floor division of both axes.
  pub fn div_floor(self, d: i32) -> TileCoord {
    TileCoord::new(self.x.div_euclid(d), self.y.div_euclid(d))
  }
}

impl Add for TileCoord {
  type Output = TileCoord;

  fn add(self, rhs: TileCoord) -> TileCoord {
    TileCoord::new(self.x + rhs.x, self.y + rhs.y)
  }
}

impl Sub for TileCoord {
  type Output = TileCoord;

  fn sub(self, rhs: TileCoord) -> TileCoord {
    TileCoord::new(self.x - rhs.x, self.y - rhs.y)
  }
}

impl Mul<i32> for TileCoord {
  type Output = TileCoord;

  fn mul(self, rhs: i32) -> TileCoord {
    TileCoord::new(self.x * rhs, self.y * rhs)
  }
}

impl Axes for TileCoord {
  fn xy(self) -> (i32, i32) {
    (self.x, self.y)
  }

  fn from_xy(x: i32, y: i32) -> Self {
    Self::new(x, y)
  }
}

/// Position in the grid lattice.
///
/// At zoom level `z` a display cell `c` covers base grids
/// `c << z .. (c + 1) << z`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GridCoord {
  pub x: i32,
  pub y: i32,
}

impl GridCoord {
  /// Creates a new grid coordinate.
  pub const fn new(x: i32, y: i32) -> Self {
    Self { x, y }
  }

  /// First tile of this base grid.
  pub fn origin(self) -> TileCoord {
    TileCoord::new(self.x * GRID_TILES, self.y * GRID_TILES)
  }

  /// Base grid coordinate of a zoomed cell coordinate.
  pub fn unzoom(self, zoom: u32) -> GridCoord {
    GridCoord::new(self.x << zoom, self.y << zoom)
  }

  /// Translates by the given offset.
  pub fn offset(self, dx: i32, dy: i32) -> GridCoord {
    GridCoord::new(self.x + dx, self.y + dy)
  }
}

impl Sub for GridCoord {
  type Output = GridCoord;

  fn sub(self, rhs: GridCoord) -> GridCoord {
    GridCoord::new(self.x - rhs.x, self.y - rhs.y)
  }
}

impl Axes for GridCoord {
  fn xy(self) -> (i32, i32) {
    (self.x, self.y)
  }

  fn from_xy(x: i32, y: i32) -> Self {
    Self::new(x, y)
  }
}

impl Axes for IVec2 {
  fn xy(self) -> (i32, i32) {
    (self.x, self.y)
  }

  fn from_xy(x: i32, y: i32) -> Self {
    IVec2::new(x, y)
  }
}

/// Tiles covered by one display cell edge at a zoom level. Valid up to
/// [`MAX_ZOOM`].
#[inline]
pub fn cell_tiles(zoom: u32) -> i32 {
  GRID_TILES << zoom
}

/// Half-open axis-aligned rectangle `[ul, br)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Area<C> {
  pub ul: C,
  pub br: C,
}

impl<C: Axes> Area<C> {
  /// Creates an area from its upper-left corner and size.
  pub fn sized(ul: C, width: i32, height: i32) -> Self {
    let (x, y) = ul.xy();
    Self {
      ul,
      br: C::from_xy(x + width, y + height),
    }
  }

  /// Creates an area from inclusive-exclusive corners.
  pub fn corners(ul: C, br: C) -> Self {
    Self { ul, br }
  }

  pub fn width(&self) -> i32 {
    self.br.xy().0 - self.ul.xy().0
  }

  pub fn height(&self) -> i32 {
    self.br.xy().1 - self.ul.xy().1
  }

  /// Number of coordinates inside the area.
  pub fn len(&self) -> usize {
    (self.width().max(0) as usize) * (self.height().max(0) as usize)
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// Returns true if `c` lies inside the area.
  pub fn contains(&self, c: C) -> bool {
    let (x, y) = c.xy();
    let (ux, uy) = self.ul.xy();
    let (bx, by) = self.br.xy();
    x >= ux && x < bx && y >= uy && y < by
  }

  /// Row-major index of `c`, or `None` if outside.
  pub fn index(&self, c: C) -> Option<usize> {
    if !self.contains(c) {
      return None;
    }
    let (x, y) = c.xy();
    let (ux, uy) = self.ul.xy();
    Some(((y - uy) * self.width() + (x - ux)) as usize)
  }

  /// Iterates all coordinates in row-major order.
  pub fn iter(&self) -> impl Iterator<Item = C> + use<C> {
    let (ux, uy) = self.ul.xy();
    let (bx, by) = self.br.xy();
    (uy..by).flat_map(move |y| (ux..bx).map(move |x| C::from_xy(x, y)))
  }
}
