//! Drawing surface abstraction.
//!
//! The minimap never touches the GPU. It issues calls on a [`Painter`]; the
//! host implements it on top of its renderer. [`DrawList`] records the calls
//! as [`DrawCmd`]s, which is what the Bevy plugin hands to the host and what
//! tests inspect.

use std::sync::Arc;

use bevy::math::IVec2;

use crate::image::{Rgba, RgbaSurface};
use crate::session::IconInfo;
use crate::store::Marker;

/// Rendered text, owned by the painter that created it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Label {
  pub text: String,
  /// Painter-specific handle.
  pub id: u64,
  pub size: IVec2,
}

/// Label that re-renders only when its text changes.
#[derive(Clone, Debug, Default)]
pub struct LabelCache {
  label: Option<Label>,
}

impl LabelCache {
  pub fn get(&mut self, painter: &mut dyn Painter, text: &str) -> &Label {
    let label = match self.label.take() {
      Some(label) if label.text == text => label,
      _ => painter.render_label(text),
    };
    self.label.insert(label)
  }

  pub fn current(&self) -> Option<&Label> {
    self.label.as_ref()
  }
}

/// Host drawing interface. Coordinates are minimap-local pixels.
pub trait Painter {
  /// Sets the color applied to subsequent primitives.
  fn push_color(&mut self, color: Rgba);
  fn pop_color(&mut self);

  /// Draws a map image stretched to `size` at `ul`.
  fn image(&mut self, image: &Arc<RgbaSurface>, ul: IVec2, size: IVec2);
  /// Draws an entity icon centered at `at`, rotated by `angle` radians.
  fn icon(&mut self, icon: &IconInfo, at: IVec2, angle: Option<f64>, gray: bool);
  /// Draws a marker's flag or symbol anchored at `at`.
  fn marker(&mut self, marker: &Marker, at: IVec2);
  /// Draws an arrow pointing along `angle` radians, centered at `at`.
  fn arrow(&mut self, at: IVec2, angle: f64);

  fn render_label(&mut self, text: &str) -> Label;
  /// Draws a label with its upper-left corner at `ul`.
  fn label(&mut self, label: &Label, ul: IVec2);

  fn fill_rect(&mut self, ul: IVec2, size: IVec2);
  fn rect(&mut self, ul: IVec2, size: IVec2);
  fn line(&mut self, a: IVec2, b: IVec2, width: f32);
  fn circle(&mut self, center: IVec2, radius: f32);
}

/// One recorded painter call, with the color active at the time.
#[derive(Clone, Debug)]
pub enum DrawCmd {
  Image {
    image: Arc<RgbaSurface>,
    ul: IVec2,
    size: IVec2,
  },
  Icon {
    resource: String,
    at: IVec2,
    angle: Option<f64>,
    gray: bool,
    color: Rgba,
  },
  Marker {
    name: String,
    at: IVec2,
  },
  Arrow {
    at: IVec2,
    angle: f64,
    color: Rgba,
  },
  Label {
    text: String,
    ul: IVec2,
  },
  FillRect {
    ul: IVec2,
    size: IVec2,
    color: Rgba,
  },
  Rect {
    ul: IVec2,
    size: IVec2,
    color: Rgba,
  },
  Line {
    a: IVec2,
    b: IVec2,
    width: f32,
    color: Rgba,
  },
  Circle {
    center: IVec2,
    radius: f32,
    color: Rgba,
  },
}

/// Painter that records calls.
#[derive(Debug, Default)]
pub struct DrawList {
  pub cmds: Vec<DrawCmd>,
  colors: Vec<Rgba>,
  labels_rendered: u64,
}

impl DrawList {
  pub fn new() -> Self {
    Self::default()
  }

  /// Clears recorded commands, keeping label ids unique across frames.
  pub fn clear(&mut self) {
    self.cmds.clear();
    self.colors.clear();
  }

  /// Labels rendered so far.
  pub fn labels_rendered(&self) -> u64 {
    self.labels_rendered
  }

  fn color(&self) -> Rgba {
    self.colors.last().copied().unwrap_or(Rgba::WHITE)
  }

  /// Recorded map images, in paint order.
  pub fn images(&self) -> impl Iterator<Item = (&Arc<RgbaSurface>, IVec2, IVec2)> {
    self.cmds.iter().filter_map(|c| match c {
      DrawCmd::Image { image, ul, size } => Some((image, *ul, *size)),
      _ => None,
    })
  }

  /// Recorded icon resources, in paint order.
  pub fn icons(&self) -> impl Iterator<Item = &str> {
    self.cmds.iter().filter_map(|c| match c {
      DrawCmd::Icon { resource, .. } => Some(resource.as_str()),
      _ => None,
    })
  }
}

impl Painter for DrawList {
  fn push_color(&mut self, color: Rgba) {
    self.colors.push(color);
  }

  fn pop_color(&mut self) {
    self.colors.pop();
  }

  fn image(&mut self, image: &Arc<RgbaSurface>, ul: IVec2, size: IVec2) {
    self.cmds.push(DrawCmd::Image {
      image: image.clone(),
      ul,
      size,
    });
  }

  fn icon(&mut self, icon: &IconInfo, at: IVec2, angle: Option<f64>, gray: bool) {
    let color = self.color();
    self.cmds.push(DrawCmd::Icon {
      resource: icon.resource.clone(),
      at,
      angle,
      gray,
      color,
    });
  }

  fn marker(&mut self, marker: &Marker, at: IVec2) {
    self.cmds.push(DrawCmd::Marker {
      name: marker.name.clone(),
      at,
    });
  }

  fn arrow(&mut self, at: IVec2, angle: f64) {
    let color = self.color();
    self.cmds.push(DrawCmd::Arrow { at, angle, color });
  }

  fn render_label(&mut self, text: &str) -> Label {
    self.labels_rendered += 1;
    Label {
      text: text.to_string(),
      id: self.labels_rendered,
      // Fixed-width estimate; the host measures real glyphs.
      size: IVec2::new(7 * text.chars().count() as i32, 14),
    }
  }

  fn label(&mut self, label: &Label, ul: IVec2) {
    self.cmds.push(DrawCmd::Label {
      text: label.text.clone(),
      ul,
    });
  }

  fn fill_rect(&mut self, ul: IVec2, size: IVec2) {
    let color = self.color();
    self.cmds.push(DrawCmd::FillRect { ul, size, color });
  }

  fn rect(&mut self, ul: IVec2, size: IVec2) {
    let color = self.color();
    self.cmds.push(DrawCmd::Rect { ul, size, color });
  }

  fn line(&mut self, a: IVec2, b: IVec2, width: f32) {
    let color = self.color();
    self.cmds.push(DrawCmd::Line { a, b, width, color });
  }

  fn circle(&mut self, center: IVec2, radius: f32) {
    let color = self.color();
    self.cmds.push(DrawCmd::Circle {
      center,
      radius,
      color,
    });
  }
}
