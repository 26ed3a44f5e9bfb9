use bevy::math::IVec2;

use crate::coords::Area;
use crate::painter::{LabelCache, Painter};
use crate::store::{Marker, MarkerKind};

/// Pixel size of a placed flag.
pub const FLAG_SIZE: IVec2 = IVec2::new(20, 24);
/// Flag pole foot, relative to the flag's upper-left corner.
pub const FLAG_ANCHOR: IVec2 = IVec2::new(4, 22);
/// Pixel size of an object symbol, drawn centered.
pub const SYMBOL_SIZE: IVec2 = IVec2::new(24, 24);

/// Marker prepared for display in one cell.
#[derive(Clone, Debug)]
pub struct DisplayMarker {
  pub marker: Marker,
  /// Clickable area relative to the marker's screen position.
  pub hit: Area<IVec2>,
  label: LabelCache,
}

impl DisplayMarker {
  pub fn new(marker: Marker) -> Self {
    let hit = match marker.kind {
      MarkerKind::Placed { .. } => Area::sized(-FLAG_ANCHOR, FLAG_SIZE.x, FLAG_SIZE.y),
      MarkerKind::Symbol { .. } => Area::sized(-SYMBOL_SIZE / 2, SYMBOL_SIZE.x, SYMBOL_SIZE.y),
    };
    Self {
      marker,
      hit,
      label: LabelCache::default(),
    }
  }

  /// True if screen point `c` hits the marker drawn at `at`.
  pub fn hit_test(&self, at: IVec2, c: IVec2) -> bool {
    self.hit.contains(c - at)
  }

  /// Draws the marker at `at`, with its name underneath when `named`.
  pub fn draw(&mut self, painter: &mut dyn Painter, at: IVec2, named: bool) {
    painter.marker(&self.marker, at);
    if !named || self.marker.name.is_empty() {
      return;
    }
    let below = self.hit.br.y;
    let label = self.label.get(painter, &self.marker.name);
    let ul = at + IVec2::new(-label.size.x / 2, below);
    painter.label(label, ul);
  }
}
