//! Bevy integration.

use bevy::prelude::*;

use crate::config::MinimapConfig;
use crate::minimap::Minimap;
use crate::painter::DrawList;

/// System sets for minimap work, in frame order.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MinimapSet {
  /// Locators, icons and names (Update).
  Tick,
  /// Window maintenance and drawing into [`MinimapDrawList`] (PostUpdate).
  Draw,
}

/// Draw commands produced for a minimap entity this frame. The host
/// renderer consumes them.
#[derive(Component, Debug, Default)]
pub struct MinimapDrawList(pub DrawList);

/// Ticks and draws every [`Minimap`] component.
///
/// The plugin's config becomes the [`MinimapConfig`] resource; changes to
/// that resource are pushed to all minimaps.
#[derive(Default)]
pub struct MinimapPlugin {
  pub config: MinimapConfig,
}

impl MinimapPlugin {
  pub fn config(mut self, config: MinimapConfig) -> Self {
    self.config = config;
    self
  }
}

impl Plugin for MinimapPlugin {
  fn build(&self, app: &mut App) {
    app.insert_resource(self.config.clone());
    app.add_systems(Update, tick_minimaps.in_set(MinimapSet::Tick));
    app.add_systems(PostUpdate, draw_minimaps.in_set(MinimapSet::Draw));
  }
}

/// System: Applies config changes and ticks minimaps.
pub fn tick_minimaps(config: Res<MinimapConfig>, mut minimaps: Query<&mut Minimap>) {
  let changed = config.is_changed();
  for mut minimap in &mut minimaps {
    if changed && minimap.config() != &*config {
      debug!("Applying minimap config change");
      minimap.set_config(config.clone());
    }
    minimap.tick();
  }
}

/// System: Draws minimaps into their draw lists.
pub fn draw_minimaps(mut minimaps: Query<(&mut Minimap, &mut MinimapDrawList)>) {
  for (mut minimap, mut list) in &mut minimaps {
    list.0.clear();
    minimap.draw(&mut list.0);
  }
}
