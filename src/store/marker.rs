//! User and object markers stored alongside the map.

use crate::coords::{SegmentId, TileCoord};
use crate::image::Rgba;

/// Store-assigned marker identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(pub u64);

/// What a marker looks like and what it is attached to.
#[derive(Clone, Debug, PartialEq)]
pub enum MarkerKind {
  /// Flag placed by the player.
  Placed { color: Rgba },
  /// Symbol for a known world object. `object` links the marker to live
  /// entities carrying the same id, whose icons are then suppressed.
  Symbol { resource: String, object: Option<u64> },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Marker {
  pub id: MarkerId,
  pub seg: SegmentId,
  pub tc: TileCoord,
  pub name: String,
  pub kind: MarkerKind,
}

impl Marker {
  /// Creates a player-placed flag.
  pub fn placed(seg: SegmentId, tc: TileCoord, name: impl Into<String>, color: Rgba) -> Self {
    Self {
      id: MarkerId(0),
      seg,
      tc,
      name: name.into(),
      kind: MarkerKind::Placed { color },
    }
  }

  /// Creates an object symbol marker.
  pub fn symbol(
    seg: SegmentId,
    tc: TileCoord,
    name: impl Into<String>,
    resource: impl Into<String>,
    object: Option<u64>,
  ) -> Self {
    Self {
      id: MarkerId(0),
      seg,
      tc,
      name: name.into(),
      kind: MarkerKind::Symbol {
        resource: resource.into(),
        object,
      },
    }
  }

  /// Object id this marker stands for, if any.
  pub fn object(&self) -> Option<u64> {
    match &self.kind {
      MarkerKind::Symbol { object, .. } => *object,
      MarkerKind::Placed { .. } => None,
    }
  }
}
