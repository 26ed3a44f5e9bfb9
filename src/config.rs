//! Minimap configuration.
//!
//! Loaded from TOML; every field has a default so a partial file (or none)
//! is valid:
//!
//! ```toml
//! max_magnification = 4
//! show_grid = true
//!
//! [colors]
//! grid = "#ff0000"
//!
//! [icons]
//! hidden_categories = ["critter"]
//!
//! [icons.icons."gfx/hud/mmap/boar"]
//! show = true
//! category = "animal"
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Deserializer, de};

use crate::error::ConfigError;
use crate::image::Rgba;

#[derive(Resource, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MinimapConfig {
  /// Interface scale factor applied to all map pixels.
  pub ui_scale: f64,
  /// Highest integer magnification at zoom level 0.
  pub max_magnification: u32,
  /// Highest zoom level (each level halves the scale).
  pub max_zoom: u32,
  /// Pointer travel in pixels before a press turns into a drag.
  pub drag_threshold: i32,
  /// Draw base grid lines (zoom 0 to 2).
  pub show_grid: bool,
  /// Draw the view range box around the player (zoom 0 and 1).
  pub show_view: bool,
  /// Show the biome name under the pointer.
  pub show_biome: bool,
  /// Draw off-screen pointers.
  pub show_pointers: bool,
  /// Show marker names under markers.
  pub show_marker_names: bool,
  pub colors: MinimapColors,
  pub icons: IconSettings,
}

impl Default for MinimapConfig {
  fn default() -> Self {
    Self {
      ui_scale: 1.0,
      max_magnification: 4,
      max_zoom: 5,
      drag_threshold: 5,
      show_grid: false,
      show_view: false,
      show_biome: true,
      show_pointers: true,
      show_marker_names: false,
      colors: MinimapColors::default(),
      icons: IconSettings::default(),
    }
  }
}

impl MinimapConfig {
  /// Parses a TOML config.
  pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
    Ok(toml::from_str(s)?)
  }

  /// Reads and parses a TOML config file.
  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let config = Self::from_toml_str(&std::fs::read_to_string(path)?)?;
    info!("Loaded minimap config from {}", path.display());
    Ok(config)
  }

  /// Like [`load`](Self::load), falling back to defaults on any error.
  pub fn load_or_default(path: impl AsRef<Path>) -> Self {
    let path = path.as_ref();
    Self::load(path).unwrap_or_else(|e| {
      warn!("Using default minimap config, {}: {e}", path.display());
      Self::default()
    })
  }
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct MinimapColors {
  #[serde(deserialize_with = "deserialize_hex_color")]
  pub grid: Rgba,
  #[serde(deserialize_with = "deserialize_hex_color")]
  pub view_fill: Rgba,
  #[serde(deserialize_with = "deserialize_hex_color")]
  pub view_border: Rgba,
  #[serde(deserialize_with = "deserialize_hex_color")]
  pub highlight: Rgba,
  #[serde(deserialize_with = "deserialize_hex_color")]
  pub label_background: Rgba,
}

impl Default for MinimapColors {
  fn default() -> Self {
    Self {
      grid: Rgba::RED,
      view_fill: Rgba::new(255, 255, 0, 32),
      view_border: Rgba::new(255, 255, 0, 128),
      highlight: Rgba::new(255, 0, 255, 128),
      label_background: Rgba::new(0, 0, 0, 128),
    }
  }
}

fn deserialize_hex_color<'de, D>(deserializer: D) -> Result<Rgba, D::Error>
where
  D: Deserializer<'de>,
{
  let s: String = Deserialize::deserialize(deserializer)?;
  Rgba::from_hex(&s).ok_or_else(|| de::Error::custom("hex color must be #rrggbb or #rrggbbaa"))
}

/// Grouping used to hide whole classes of icons at once.
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum IconCategory {
  Player,
  Animal,
  Critter,
  Herb,
  Tree,
  Bush,
  Rock,
  Vehicle,
  #[default]
  Other,
}

/// Display setting for one icon resource.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct IconSetting {
  pub show: bool,
  pub category: IconCategory,
}

impl Default for IconSetting {
  fn default() -> Self {
    Self {
      show: true,
      category: IconCategory::Other,
    }
  }
}

/// Which entity icons the minimap shows.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct IconSettings {
  /// Show icons whose resource has no entry in `icons`.
  pub show_unknown: bool,
  pub hidden_categories: HashSet<IconCategory>,
  /// Per-resource settings, keyed by icon resource name.
  pub icons: HashMap<String, IconSetting>,
}

impl Default for IconSettings {
  fn default() -> Self {
    Self {
      show_unknown: true,
      hidden_categories: HashSet::new(),
      icons: HashMap::new(),
    }
  }
}

impl IconSettings {
  /// Setting for an icon resource; `None` if it has no entry and unknown
  /// icons are hidden.
  pub fn get(&self, resource: &str) -> Option<IconSetting> {
    match self.icons.get(resource) {
      Some(setting) => Some(*setting),
      None => self.show_unknown.then(IconSetting::default),
    }
  }

  /// True if an icon with this resource passes both its own setting and its
  /// category filter.
  pub fn is_visible(&self, resource: &str) -> bool {
    self
      .get(resource)
      .is_some_and(|s| s.show && !self.hidden_categories.contains(&s.category))
  }

  pub fn set(&mut self, resource: impl Into<String>, setting: IconSetting) {
    self.icons.insert(resource.into(), setting);
  }

  pub fn set_category_hidden(&mut self, category: IconCategory, hidden: bool) {
    if hidden {
      self.hidden_categories.insert(category);
    } else {
      self.hidden_categories.remove(&category);
    }
  }
}
