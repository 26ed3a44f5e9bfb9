//! CPU-side raster images.
//!
//! A [`Surface`] is a generic 2D buffer. Minimap tiles and overlays are
//! [`RgbaSurface`]s handed to the host painter for upload.
//!
//! # Coordinate System
//!
//! Surfaces follow screen conventions:
//! - **X+** is to the right
//! - **Y+** is downward
//! - **(0, 0)** is the top-left corner
//!
//! Data is stored in row-major order (`y * width + x`).

use std::ops::{Index, IndexMut};

/// RGBA pixel with 8 bits per channel.
#[repr(C)]
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash)]
pub struct Rgba {
  pub r: u8,
  pub g: u8,
  pub b: u8,
  pub a: u8,
}

impl Rgba {
  /// Creates a new RGBA pixel.
  #[inline]
  pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
    Self { r, g, b, a }
  }

  /// Creates an opaque RGB pixel (alpha = 255).
  #[inline]
  pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
    Self { r, g, b, a: 255 }
  }

  /// Transparent black.
  pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

  /// Opaque black.
  pub const BLACK: Self = Self::rgb(0, 0, 0);

  /// Opaque white.
  pub const WHITE: Self = Self::rgb(255, 255, 255);

  /// Opaque red.
  pub const RED: Self = Self::rgb(255, 0, 0);

  /// Same color with a different alpha.
  #[inline]
  pub const fn with_alpha(self, a: u8) -> Self {
    Self::new(self.r, self.g, self.b, a)
  }

  /// Parses `#rrggbb` or `#rrggbbaa`.
  pub fn from_hex(s: &str) -> Option<Self> {
    let s = s.trim_start_matches('#');
    let channel = |i: usize| u8::from_str_radix(s.get(i..i + 2)?, 16).ok();
    match s.len() {
      6 => Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
      8 => Some(Self::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
      _ => None,
    }
  }
}

/// A 2D buffer of elements.
///
/// Data is stored in row-major order (y * width + x).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Surface<T> {
  data: Box<[T]>,
  width: u32,
  height: u32,
}

impl<T: Clone + Default> Surface<T> {
  /// Creates a new surface filled with the default value.
  pub fn new(width: u32, height: u32) -> Self {
    let len = (width as usize) * (height as usize);
    Self {
      data: vec![T::default(); len].into_boxed_slice(),
      width,
      height,
    }
  }
}

impl<T> Surface<T> {
  /// Wraps existing row-major data.
  ///
  /// Panics if `data` does not hold exactly `width * height` elements.
  pub fn from_vec(width: u32, height: u32, data: Vec<T>) -> Self {
    assert_eq!(
      data.len(),
      (width as usize) * (height as usize),
      "surface data does not match its dimensions"
    );
    Self {
      data: data.into_boxed_slice(),
      width,
      height,
    }
  }

  /// Returns the width of the surface.
  #[inline]
  pub fn width(&self) -> u32 {
    self.width
  }

  /// Returns the height of the surface.
  #[inline]
  pub fn height(&self) -> u32 {
    self.height
  }

  /// Converts (x, y) to a linear index, or `None` if out of bounds.
  #[inline]
  fn index_of(&self, x: u32, y: u32) -> Option<usize> {
    if x < self.width && y < self.height {
      Some((y as usize) * (self.width as usize) + (x as usize))
    } else {
      None
    }
  }

  /// Returns a reference to the element at (x, y), or `None` if out of bounds.
  #[inline]
  pub fn get(&self, x: u32, y: u32) -> Option<&T> {
    self.index_of(x, y).map(|i| &self.data[i])
  }

  /// Sets the element at (x, y). Returns `true` if successful, `false` if out
  /// of bounds.
  #[inline]
  pub fn set(&mut self, x: u32, y: u32, value: T) -> bool {
    if let Some(i) = self.index_of(x, y) {
      self.data[i] = value;
      true
    } else {
      false
    }
  }

  /// Returns a slice of the underlying data.
  #[inline]
  pub fn as_slice(&self) -> &[T] {
    &self.data
  }

  /// Returns a mutable slice of the underlying data.
  #[inline]
  pub fn as_slice_mut(&mut self) -> &mut [T] {
    &mut self.data
  }
}

impl<T> Index<(u32, u32)> for Surface<T> {
  type Output = T;

  #[inline]
  fn index(&self, (x, y): (u32, u32)) -> &Self::Output {
    let i = (y as usize) * (self.width as usize) + (x as usize);
    &self.data[i]
  }
}

impl<T> IndexMut<(u32, u32)> for Surface<T> {
  #[inline]
  fn index_mut(&mut self, (x, y): (u32, u32)) -> &mut Self::Output {
    let i = (y as usize) * (self.width as usize) + (x as usize);
    &mut self.data[i]
  }
}

/// A surface containing RGBA pixels, suitable for GPU upload.
pub type RgbaSurface = Surface<Rgba>;

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn hex_colors_parse_with_and_without_alpha() {
    assert_eq!(Rgba::from_hex("#ff0000"), Some(Rgba::RED));
    assert_eq!(Rgba::from_hex("ffffff3c"), Some(Rgba::WHITE.with_alpha(60)));
    assert_eq!(Rgba::from_hex("#fff"), None);
    assert_eq!(Rgba::from_hex("#gg0000"), None);
  }

  #[test]
  fn surface_set_rejects_out_of_bounds() {
    let mut s = RgbaSurface::new(2, 2);
    assert!(s.set(1, 1, Rgba::WHITE));
    assert!(!s.set(2, 0, Rgba::WHITE));
    assert_eq!(s[(1, 1)], Rgba::WHITE);
    assert_eq!(s.get(0, 0), Some(&Rgba::TRANSPARENT));
  }
}
