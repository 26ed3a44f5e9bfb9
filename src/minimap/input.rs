//! Pointer input: clicks, drag panning, wheel zoom and tooltips.

use bevy::math::{DVec2, IVec2};

use super::{Drag, Minimap};
use crate::coords::TileCoord;
use crate::display::DisplayMarker;
use crate::icons::DisplayIcon;
use crate::location::Location;
use crate::session::EntityId;
use crate::store::{Marker, MarkerId};

/// Squared pixel distance within which a pointer shows its tooltip.
const POINTER_HOVER_SQ: i32 = 20 * 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ClickButton {
  Left,
  Right,
  Middle,
}

/// World click derived from a minimap location.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapClick {
  /// Session world position at the center of the clicked tile.
  pub pos: DVec2,
  pub button: ClickButton,
  /// Entity clicked through its icon, with its world position.
  pub target: Option<(EntityId, DVec2)>,
}

/// Receives minimap clicks.
///
/// Each click is offered to the icon under the pointer, then the marker,
/// then the bare location, stopping at the first method returning `true`.
/// Every stage is called on press and again on release.
pub trait ClickHandler {
  fn click_icon(
    &mut self,
    _icon: &DisplayIcon,
    _loc: Location,
    _button: ClickButton,
    _press: bool,
  ) -> bool {
    false
  }

  fn click_marker(
    &mut self,
    _marker: &Marker,
    _loc: Location,
    _button: ClickButton,
    _press: bool,
  ) -> bool {
    false
  }

  fn click_location(&mut self, _loc: Location, _button: ClickButton, _press: bool) -> bool {
    false
  }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Press {
  button: ClickButton,
  icon: Option<EntityId>,
  marker: Option<MarkerId>,
}

impl Minimap {
  fn location_at(&self, c: IVec2) -> Option<Location> {
    let (proj, dloc) = (self.proj?, self.dloc?);
    Some(Location::new(dloc.seg, proj.screen_to_tile(c)))
  }

  /// Topmost visible icon under a screen point.
  pub fn icon_at(&self, c: IVec2) -> Option<&DisplayIcon> {
    self
      .icons
      .iter()
      .rev()
      .find(|icon| icon.hit_test(c) && !self.is_filtered(icon))
  }

  /// Topmost marker under a screen point.
  pub fn marker_at(&self, c: IVec2) -> Option<&DisplayMarker> {
    let proj = self.proj?;
    self
      .window
      .cells()
      .flat_map(|(_, cell)| cell.current_markers())
      .filter(|m| m.hit_test(proj.tile_to_screen(m.marker.tc), c))
      .last()
  }

  fn marker_by_id(&self, id: MarkerId) -> Option<&DisplayMarker> {
    self
      .window
      .cells()
      .flat_map(|(_, cell)| cell.current_markers())
      .find(|m| m.marker.id == id)
  }

  fn route(
    &self,
    handler: &mut dyn ClickHandler,
    press: Press,
    loc: Location,
    down: bool,
  ) -> bool {
    let icon = press
      .icon
      .and_then(|id| self.icons.iter().find(|i| i.entity == id));
    if let Some(icon) = icon {
      if handler.click_icon(icon, loc, press.button, down) {
        return true;
      }
    }
    if let Some(m) = press.marker.and_then(|id| self.marker_by_id(id)) {
      if handler.click_marker(&m.marker, loc, press.button, down) {
        return true;
      }
    }
    handler.click_location(loc, press.button, down)
  }

  /// Handles a button press. Unhandled left presses start a potential drag.
  pub fn mouse_down(
    &mut self,
    c: IVec2,
    button: ClickButton,
    handler: &mut dyn ClickHandler,
  ) -> bool {
    let Some(loc) = self.location_at(c) else {
      return false;
    };
    let press = Press {
      button,
      icon: self.icon_at(c).map(|icon| icon.entity),
      marker: self.marker_at(c).map(|m| m.marker.id),
    };
    self.press = Some(press);
    if self.route(handler, press, loc, true) {
      return true;
    }
    if button == ClickButton::Left {
      if let Some(origin) = self.curloc {
        self.drag = Some(Drag {
          start: c,
          origin,
          dragging: false,
        });
      }
    }
    true
  }

  /// Handles a button release. Ends a drag, or routes the release to the
  /// targets found at press time.
  pub fn mouse_up(&mut self, c: IVec2, button: ClickButton, handler: &mut dyn ClickHandler) -> bool {
    if button == ClickButton::Left {
      if let Some(drag) = self.drag.take() {
        if drag.dragging {
          self.press = None;
          return true;
        }
      }
    }
    let Some(press) = self.press.take_if(|p| p.button == button) else {
      return false;
    };
    let Some(loc) = self.location_at(c) else {
      return false;
    };
    self.route(handler, press, loc, false)
  }

  /// Tracks the pointer; pans once a left press moves past the drag
  /// threshold.
  pub fn mouse_move(&mut self, c: IVec2) {
    self.hover = Some(c);
    let (Some(drag), Some(proj)) = (self.drag.as_mut(), self.proj) else {
      return;
    };
    let threshold = self.config.drag_threshold;
    if !drag.dragging && (c - drag.start).length_squared() > threshold * threshold {
      drag.dragging = true;
    }
    if drag.dragging {
      let d = (drag.start - c).as_dvec2() / proj.scale();
      let tc = drag.origin.tc + TileCoord::new(d.x.floor() as i32, d.y.floor() as i32);
      self.curloc = Some(Location::new(drag.origin.seg, tc));
      self.setloc = None;
      self.follow = false;
    }
  }

  pub fn mouse_leave(&mut self) {
    self.hover = None;
  }

  /// Wheel zoom. Positive amounts zoom out: first by lowering
  /// magnification, then by raising the zoom level while there is map data
  /// beyond the edges, at most one level past the displayed one. Negative amounts zoom in, magnifying once zoom level
  /// zero is reached.
  pub fn mouse_wheel(&mut self, amount: i32) -> bool {
    if amount > 0 {
      if self.magnification > 1 {
        self.magnification -= 1;
      } else if self.allows_zoom_out() {
        let displayed = self.window.zoom() + 1;
        self.zoom = (self.zoom + 1).min(displayed).min(self.config.max_zoom);
      }
    } else if amount < 0 {
      if self.zoom == 0 && self.magnification < self.config.max_magnification {
        self.magnification += 1;
      }
      self.zoom = self.zoom.saturating_sub(1);
    }
    true
  }

  /// Tooltip for a screen point: marker name, then icon, then a nearby
  /// pointer.
  pub fn tooltip(&self, c: IVec2) -> Option<String> {
    if let Some(m) = self.marker_at(c) {
      if !m.marker.name.is_empty() {
        return Some(m.marker.name.clone());
      }
    }
    if let Some(icon) = self.icon_at(c) {
      let text = icon.tooltip();
      if !text.is_empty() {
        return Some(text);
      }
    }
    if self.config.show_pointers {
      let proj = self.proj?;
      for pointer in &self.pointers {
        let Some((at, _)) = self.pointer_screen(&proj, pointer) else {
          continue;
        };
        if (at - c).length_squared() <= POINTER_HOVER_SQ {
          return Some(pointer.tooltip.clone());
        }
      }
    }
    None
  }

  /// World click for a minimap location, if it lies in the live session's
  /// segment.
  pub fn map_click(
    &self,
    loc: Location,
    button: ClickButton,
    icon: Option<&DisplayIcon>,
  ) -> Option<MapClick> {
    let offset = loc.offset_from(&self.sessloc?)?;
    Some(MapClick {
      pos: offset.world_center(),
      button,
      target: icon.map(|icon| (icon.entity, icon.pos)),
    })
  }
}
