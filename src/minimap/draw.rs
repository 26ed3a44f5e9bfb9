//! Frame drawing.
//!
//! Paint order: map images and overlays, markers, grid lines, view box,
//! icons, party, pointers, biome label.

use bevy::math::IVec2;

use super::{Minimap, Pointer};
use crate::coords::{GRID_TILES, SERVER_GRID_TILES, TileCoord, VIEW_GRIDS};
use crate::icons::remove_party;
use crate::image::Rgba;
use crate::location::Location;
use crate::painter::Painter;
use crate::transform::Projection;

/// Pixels kept between an edge pointer and the minimap border.
const POINTER_INSET: i32 = 10;
/// Radius of the circle under player and party icons, before UI scaling.
const PLAYER_RADIUS: f32 = 5.0;

impl Minimap {
  /// Draws one frame.
  pub fn draw(&mut self, painter: &mut dyn Painter) {
    let Some(loc) = self.curloc else {
      self.dloc = None;
      self.proj = None;
      return;
    };
    let proj = self.redisplay(loc);
    if let Some(session) = self.session.clone() {
      remove_party(&mut self.icons, &session.party());
    }
    self.draw_map(painter);
    self.draw_markers(painter, &proj);
    self.draw_grid(painter, &proj);
    self.draw_view(painter, &proj);
    self.draw_icons(painter);
    self.draw_party(painter);
    self.draw_pointers(painter, &proj);
    self.draw_biome(painter);
  }

  /// Moves the window to cover the viewport around `loc` and refreshes
  /// icon screen positions.
  fn redisplay(&mut self, loc: Location) -> Projection {
    let proj = Projection {
      center: loc.tc,
      zoom: self.zoom,
      magnification: self.magnification,
      ui_scale: self.config.ui_scale,
      size: self.size,
    };
    self
      .window
      .redisplay(&self.file, loc.seg, self.zoom, proj.visible_cells());
    self.dloc = Some(loc);
    self.proj = Some(proj);

    let origin = self.sessloc.filter(|s| s.seg == loc.seg).map(|s| s.tc);
    for icon in &mut self.icons {
      icon.sc = origin.map(|o| proj.world_to_screen(icon.pos, o));
    }
    proj
  }

  fn draw_map(&mut self, painter: &mut dyn Painter) {
    let Some(proj) = self.proj else {
      return;
    };
    let highlight = self.highlight.clone().filter(|h| !h.is_empty());
    let highlight_color = self.config.colors.highlight;
    for (c, cell) in self.window.cells_mut() {
      let (ul, size) = (proj.cell_to_screen(c), proj.cell_size(c));
      if let Some(img) = cell.img() {
        painter.image(&img, ul, size);
      }
      for (tag, version) in &self.overlays {
        if let Some(img) = cell.overlay_img(tag, *version) {
          painter.image(&img, ul, size);
        }
      }
      if let Some(hl) = &highlight {
        if let Some(img) = cell.highlight_img(hl, highlight_color) {
          painter.image(&img, ul, size);
        }
      }
    }
  }

  /// Base grid lines, at zoom levels where grids are still distinguishable.
  fn draw_grid(&self, painter: &mut dyn Painter, proj: &Projection) {
    if !self.config.show_grid || self.zoom > 2 {
      return;
    }
    let ext = self.window.extent();
    let (ul, br) = (ext.ul.unzoom(self.zoom), ext.br.unzoom(self.zoom));
    painter.push_color(self.config.colors.grid);
    for x in ul.x..br.x {
      let sx = proj.tile_to_screen(TileCoord::new(x * GRID_TILES, 0)).x;
      if (0..self.size.x).contains(&sx) {
        painter.line(IVec2::new(sx, 0), IVec2::new(sx, self.size.y), 1.0);
      }
    }
    for y in ul.y..br.y {
      let sy = proj.tile_to_screen(TileCoord::new(0, y * GRID_TILES)).y;
      if (0..self.size.y).contains(&sy) {
        painter.line(IVec2::new(0, sy), IVec2::new(self.size.x, sy), 1.0);
      }
    }
    painter.pop_color();
  }

  /// Box of server grids around the player that the client keeps loaded.
  fn draw_view(&self, painter: &mut dyn Painter, proj: &Projection) {
    if !self.config.show_view || self.zoom > 1 {
      return;
    }
    let (Some(session), Some(sess), Some(dloc)) = (&self.session, self.sessloc, self.dloc) else {
      return;
    };
    if sess.seg != dloc.seg {
      return;
    }
    let Some(pos) = session.player_pos() else {
      return;
    };
    let sg = TileCoord::from_world(pos).div_floor(SERVER_GRID_TILES);
    let half = VIEW_GRIDS / 2;
    let ul = (sg - TileCoord::new(half, half)) * SERVER_GRID_TILES + sess.tc;
    let br = ul + TileCoord::new(VIEW_GRIDS, VIEW_GRIDS) * SERVER_GRID_TILES;
    let (a, b) = (proj.tile_to_screen(ul), proj.tile_to_screen(br));
    painter.push_color(self.config.colors.view_fill);
    painter.fill_rect(a, b - a);
    painter.pop_color();
    painter.push_color(self.config.colors.view_border);
    painter.rect(a, b - a);
    painter.pop_color();
  }

  fn draw_markers(&mut self, painter: &mut dyn Painter, proj: &Projection) {
    let named = self.config.show_marker_names;
    for (_, cell) in self.window.cells_mut() {
      for m in cell.markers(true) {
        let at = proj.tile_to_screen(m.marker.tc);
        m.draw(painter, at, named);
      }
    }
  }

  fn draw_icons(&self, painter: &mut dyn Painter) {
    let (Some(sess), Some(dloc)) = (self.sessloc, self.dloc) else {
      return;
    };
    if sess.seg != dloc.seg {
      return;
    }
    let radius = PLAYER_RADIUS * self.config.ui_scale as f32;
    for icon in &self.icons {
      let Some(sc) = icon.sc else {
        continue;
      };
      if self.is_filtered(icon) {
        continue;
      }
      if icon.icon.player {
        painter.push_color(if icon.kin.is_some() {
          Rgba::WHITE
        } else {
          Rgba::RED
        });
        painter.circle(sc, radius);
        painter.pop_color();
      }
      painter.push_color(icon.color);
      let angle = icon.icon.rotates.then_some(icon.angle);
      painter.icon(&icon.icon, sc, angle, icon.is_down());
      painter.pop_color();
    }
  }

  /// Party members as colored arrows, with names for members out of sight.
  fn draw_party(&mut self, painter: &mut dyn Painter) {
    let Some(session) = self.session.clone() else {
      return;
    };
    let members = session.party().members.clone();
    let radius = PLAYER_RADIUS * self.config.ui_scale as f32;
    for member in &members {
      let Some(sc) = member.pos.and_then(|pos| self.world_to_screen(pos)) else {
        continue;
      };
      painter.push_color(Rgba::WHITE);
      painter.circle(sc, radius);
      painter.pop_color();
      painter.push_color(member.color);
      painter.arrow(sc, member.angle);
      painter.pop_color();

      if session.objects().get(member.entity).is_some() {
        continue;
      }
      if let Some((name, cache)) = self.names.get_mut(&member.entity) {
        let label = cache.get(painter, name);
        painter.label(label, sc + IVec2::new(-5, 5));
      }
    }
  }

  /// Screen position of a pointer, clamped into the minimap. The angle is
  /// set when the target is off-screen and the pointer sits on the edge.
  pub(crate) fn pointer_screen(
    &self,
    proj: &Projection,
    pointer: &Pointer,
  ) -> Option<(IVec2, Option<f64>)> {
    if Some(pointer.seg) != self.dloc.map(|d| d.seg) {
      return None;
    }
    let at = proj.tile_to_screen(pointer.tc);
    let lo = IVec2::splat(POINTER_INSET);
    let hi = (self.size - IVec2::splat(POINTER_INSET)).max(lo);
    let clamped = at.clamp(lo, hi);
    if clamped == at {
      return Some((at, None));
    }
    let d = (at - self.size / 2).as_dvec2();
    Some((clamped, Some(d.y.atan2(d.x))))
  }

  fn draw_pointers(&self, painter: &mut dyn Painter, proj: &Projection) {
    if !self.config.show_pointers {
      return;
    }
    for pointer in &self.pointers {
      let Some((at, angle)) = self.pointer_screen(proj, pointer) else {
        continue;
      };
      painter.push_color(pointer.color);
      match angle {
        Some(angle) => painter.arrow(at, angle),
        None => painter.circle(at, PLAYER_RADIUS),
      }
      painter.pop_color();
    }
  }

  fn draw_biome(&mut self, painter: &mut dyn Painter) {
    let Some(biome) = self.biome.as_deref() else {
      return;
    };
    let label = self.biome_label.get(painter, biome);
    let ul = IVec2::new((self.size.x - label.size.x) / 2, 5);
    painter.push_color(self.config.colors.label_background);
    painter.fill_rect(ul - IVec2::splat(2), label.size + IVec2::splat(4));
    painter.pop_color();
    painter.label(label, ul);
  }
}
