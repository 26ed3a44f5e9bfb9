//! Segment locations and the locators that produce them.

use std::ops::Sub;
use std::sync::Arc;

use log::trace;

use crate::coords::{SegmentId, TileCoord};
use crate::error::Loading;
use crate::session::{LoadedGrid, Session};
use crate::store::MapStore;

/// A tile position inside a specific segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Location {
  pub seg: SegmentId,
  pub tc: TileCoord,
}

impl Location {
  pub const fn new(seg: SegmentId, tc: TileCoord) -> Self {
    Self { seg, tc }
  }

  /// Offset from `other` to `self`, if both are in the same segment.
  pub fn offset_from(&self, other: &Location) -> Option<TileCoord> {
    (self.seg == other.seg).then(|| self.tc - other.tc)
  }
}

impl Sub for Location {
  type Output = TileCoord;

  /// Panics if the locations are in different segments.
  fn sub(self, rhs: Self) -> TileCoord {
    assert_eq!(self.seg, rhs.seg, "subtracting locations of different segments");
    self.tc - rhs.tc
  }
}

/// Resolves the live session's origin in segment coordinates.
///
/// The result is the segment tile corresponding to session tile (0, 0).
/// The last grid used is remembered and reused while it stays loaded.
#[derive(Debug)]
pub struct SessionLocator {
  session: Arc<Session>,
  last: Option<(Arc<LoadedGrid>, Location)>,
}

impl SessionLocator {
  pub fn new(session: Arc<Session>) -> Self {
    Self {
      session,
      last: None,
    }
  }

  fn locate(&mut self, store: &MapStore) -> Result<Location, Loading> {
    if let Some((grid, loc)) = &self.last {
      let current = self.session.grid(grid.gc);
      if current.is_some_and(|c| Arc::ptr_eq(&c, grid)) {
        return Ok(*loc);
      }
    }
    for grid in self.session.loaded_grids() {
      let Some(info) = store.grid_info(grid.id) else {
        continue;
      };
      if store.segment(info.seg).is_none() {
        continue;
      }
      let loc = Location::new(info.seg, info.sc.origin() - grid.ul());
      trace!("session located via grid {:?} in segment {:?}", grid.id, info.seg);
      self.last = Some((grid, loc));
      return Ok(loc);
    }
    self.last = None;
    Err(Loading::NoMappedGrids)
  }
}

/// Source of a location for the minimap to center on.
#[derive(Debug)]
pub enum Locator {
  /// Origin of the live session.
  Session(SessionLocator),
  /// Follows the session's camera focus.
  View(Arc<Session>),
  /// A fixed location.
  Fixed(Location),
}

impl Locator {
  pub fn session(session: Arc<Session>) -> Self {
    Self::Session(SessionLocator::new(session))
  }

  /// Resolves the locator against the store.
  ///
  /// `Err` is transient and worth retrying; `Ok(None)` means the location
  /// can never be resolved (a fixed location in an unknown segment).
  pub fn locate(&mut self, store: &MapStore) -> Result<Option<Location>, Loading> {
    match self {
      Self::Session(loc) => loc.locate(store).map(Some),
      Self::View(session) => {
        let pos = session.view().ok_or(Loading::NoView)?;
        let mc = TileCoord::from_world(pos);
        let grid = session.grid(mc.grid()).ok_or(Loading::NoView)?;
        let info = store.grid_info(grid.id).ok_or(Loading::NoGridInfo)?;
        if store.segment(info.seg).is_none() {
          return Err(Loading::NoSegment);
        }
        Ok(Some(Location::new(info.seg, info.sc.origin() + (mc - grid.ul()))))
      }
      Self::Fixed(loc) => Ok(store.segment(loc.seg).map(|_| *loc)),
    }
  }
}
