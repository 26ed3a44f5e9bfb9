//! Segment tile to screen pixel mapping.
//!
//! One tile spans `f = ui_scale * magnification / 2^zoom` pixels. Tile
//! positions are scaled and floored in absolute coordinates and then offset
//! by the floored, scaled center, so every tile lands on the same pixel grid
//! wherever the view is centered. Screen to tile picks the last tile whose
//! floored position does not pass the pixel, which keeps the round trip exact
//! for any scale, not only dyadic ones.

use bevy::math::{DVec2, IVec2};

use crate::coords::{Area, GridCoord, TILE_SIZE, TileCoord, cell_tiles};

/// Viewport projection for one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projection {
  /// Segment tile at the viewport center.
  pub center: TileCoord,
  pub zoom: u32,
  /// Integer magnification at zoom 0.
  pub magnification: u32,
  pub ui_scale: f64,
  /// Viewport size in pixels.
  pub size: IVec2,
}

impl Projection {
  /// Pixels per tile.
  #[inline]
  pub fn scale(&self) -> f64 {
    self.ui_scale * self.magnification.max(1) as f64 / (1u64 << self.zoom) as f64
  }

  fn anchor(&self) -> DVec2 {
    let f = self.scale();
    DVec2::new(
      (self.center.x as f64 * f).floor(),
      (self.center.y as f64 * f).floor(),
    )
  }

  /// Screen pixel of a tile's upper-left corner.
  pub fn tile_to_screen(&self, tc: TileCoord) -> IVec2 {
    self.tile_pos_to_screen(DVec2::new(tc.x as f64, tc.y as f64))
  }

  /// Screen pixel of a fractional tile position.
  pub fn tile_pos_to_screen(&self, t: DVec2) -> IVec2 {
    let f = self.scale();
    let p = (t * f).floor() - self.anchor();
    IVec2::new(p.x as i32, p.y as i32) + self.size / 2
  }

  /// Tile under a screen pixel.
  pub fn screen_to_tile(&self, sc: IVec2) -> TileCoord {
    let f = self.scale();
    let rel = (sc - self.size / 2).as_dvec2() + self.anchor();
    TileCoord::new(tile_at(rel.x, f), tile_at(rel.y, f))
  }

  /// Screen pixel of a live-session world position, given the segment tile
  /// of session tile (0, 0).
  pub fn world_to_screen(&self, pos: DVec2, session_origin: TileCoord) -> IVec2 {
    let origin = DVec2::new(session_origin.x as f64, session_origin.y as f64);
    self.tile_pos_to_screen(pos / TILE_SIZE + origin)
  }

  /// Upper-left pixel of a display cell at the current zoom.
  pub fn cell_to_screen(&self, c: GridCoord) -> IVec2 {
    let n = cell_tiles(self.zoom);
    self.tile_to_screen(TileCoord::new(c.x * n, c.y * n))
  }

  /// Pixel size of a display cell. Neighboring cells tile without gaps.
  pub fn cell_size(&self, c: GridCoord) -> IVec2 {
    self.cell_to_screen(c.offset(1, 1)) - self.cell_to_screen(c)
  }

  /// Display cells covering the viewport, with one cell of margin on every
  /// side.
  pub fn visible_cells(&self) -> Area<GridCoord> {
    let n = cell_tiles(self.zoom);
    let ul = self.screen_to_tile(IVec2::ZERO).div_floor(n);
    let br = self.screen_to_tile(self.size - IVec2::ONE).div_floor(n);
    Area::corners(
      GridCoord::new(ul.x - 1, ul.y - 1),
      GridCoord::new(br.x + 2, br.y + 2),
    )
  }
}

/// Largest tile `t` with `floor(t * f) <= px`. `px / f` can land a hair
/// off the exact quotient, so the estimate is nudged onto the pixel grid
/// that `tile_pos_to_screen` produces.
fn tile_at(px: f64, f: f64) -> i32 {
  let mut t = (px / f).floor();
  while ((t + 1.0) * f).floor() <= px {
    t += 1.0;
  }
  while (t * f).floor() > px {
    t -= 1.0;
  }
  t as i32
}

#[cfg(test)]
mod tests {
  use super::*;

  fn proj(center: TileCoord, zoom: u32, mag: u32) -> Projection {
    Projection {
      center,
      zoom,
      magnification: mag,
      ui_scale: 1.0,
      size: IVec2::new(300, 200),
    }
  }

  #[test]
  fn center_tile_lands_mid_screen() {
    let p = proj(TileCoord::new(1234, -567), 0, 1);
    assert_eq!(p.tile_to_screen(p.center), IVec2::new(150, 100));
    assert_eq!(p.screen_to_tile(IVec2::new(150, 100)), p.center);
  }

  #[test]
  fn cell_boundaries_round_trip() {
    for zoom in 0..4 {
      for mag in 1..=4 {
        let p = proj(TileCoord::new(-73, 4021), zoom, mag);
        let n = cell_tiles(zoom);
        for k in -3..3 {
          let tc = TileCoord::new(k * n, -k * n);
          assert_eq!(p.screen_to_tile(p.tile_to_screen(tc)), tc, "zoom {zoom} mag {mag}");
        }
      }
    }
  }

  #[test]
  fn fractional_ui_scale_boundaries_round_trip() {
    for ui_scale in [0.9, 1.1, 1.2, 1.25, 1.3, 1.5, 1.75, 2.0] {
      for zoom in 0..5 {
        for mag in 1..=4 {
          let p = Projection {
            ui_scale,
            ..proj(TileCoord::new(-73, 4021), zoom, mag)
          };
          let n = cell_tiles(zoom);
          for k in -20..20 {
            for tc in [TileCoord::new(k * n, -k * n), TileCoord::new(k * n + 1, k * 7)] {
              assert_eq!(
                p.screen_to_tile(p.tile_to_screen(tc)),
                tc,
                "ui {ui_scale} zoom {zoom} mag {mag}"
              );
            }
          }
        }
      }
    }
  }

  #[test]
  fn every_pixel_maps_to_the_tile_covering_it() {
    let p = Projection {
      ui_scale: 1.1,
      ..proj(TileCoord::new(5, 5), 0, 3)
    };
    for x in 0..300 {
      let sc = IVec2::new(x, 100);
      let tc = p.screen_to_tile(sc);
      assert!(p.tile_to_screen(tc).x <= x);
      assert!(p.tile_to_screen(tc + TileCoord::new(1, 0)).x > x, "pixel {x} -> {tc:?}");
    }
  }

  #[test]
  fn fractional_scale_cell_size() {
    let p = Projection {
      ui_scale: 1.25,
      ..proj(TileCoord::new(17, 33), 1, 3)
    };
    // 200 tiles per cell at 1.875 px per tile.
    assert_eq!(p.cell_size(GridCoord::new(2, -2)), IVec2::splat(375));
  }

  #[test]
  fn visible_cells_cover_viewport_with_margin() {
    let p = proj(TileCoord::new(50, 50), 0, 1);
    let cells = p.visible_cells();
    // 300x200 px at one pixel per tile: tiles -100..200 by -50..150.
    assert_eq!(cells.ul, GridCoord::new(-2, -2));
    assert_eq!(cells.br, GridCoord::new(3, 3));
  }
}
