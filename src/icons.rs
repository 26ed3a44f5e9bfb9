//! Live entity icon overlay.
//!
//! Each tick the current entity snapshot is reconciled against the previous
//! tick's proxies: proxies are reused per entity while its icon resource
//! stays the same, keeping spawn time and screen position. Entities whose
//! icon is hidden by the settings are dropped. The result is stably sorted
//! by `z` so equal-z icons keep snapshot (insertion) order.

use std::collections::HashMap;
use std::sync::Arc;

use bevy::math::{DVec2, IVec2};
use web_time::Instant;

use crate::config::IconSettings;
use crate::image::Rgba;
use crate::session::{EntityId, EntityTags, IconInfo, Kin, LiveEntity, Party};

/// Kin group colors, indexed by [`Kin::group`].
pub const GROUP_COLORS: [Rgba; 8] = [
  Rgba::rgb(255, 255, 255),
  Rgba::rgb(0, 255, 0),
  Rgba::rgb(255, 0, 0),
  Rgba::rgb(0, 0, 255),
  Rgba::rgb(0, 255, 255),
  Rgba::rgb(255, 255, 0),
  Rgba::rgb(255, 0, 255),
  Rgba::rgb(255, 128, 0),
];

/// Display proxy for one live entity's icon.
#[derive(Clone, Debug)]
pub struct DisplayIcon {
  pub entity: EntityId,
  pub icon: Arc<IconInfo>,
  /// World position, refreshed every tick.
  pub pos: DVec2,
  pub angle: f64,
  pub z: i32,
  pub color: Rgba,
  pub kin: Option<Kin>,
  pub tags: EntityTags,
  pub marker: Option<u64>,
  /// Screen position from the last redisplay; `None` when the entity's
  /// segment is not the displayed one.
  pub sc: Option<IVec2>,
  /// When the proxy was first created.
  pub spawned: Instant,
}

impl DisplayIcon {
  fn new(entity: &LiveEntity, icon: Arc<IconInfo>) -> Self {
    Self {
      entity: entity.id,
      z: icon.z,
      icon,
      pos: entity.pos,
      angle: entity.angle,
      color: Rgba::WHITE,
      kin: None,
      tags: EntityTags::empty(),
      marker: None,
      sc: None,
      spawned: Instant::now(),
    }
  }

  fn update(&mut self, entity: &LiveEntity, icon: Arc<IconInfo>) {
    self.z = icon.z;
    self.icon = icon;
    self.pos = entity.pos;
    self.angle = entity.angle;
    self.kin = entity.kin.clone();
    self.tags = entity.tags;
    self.marker = entity.marker;
    self.color = match &entity.kin {
      Some(kin) => GROUP_COLORS.get(kin.group).copied().unwrap_or(Rgba::WHITE),
      None => Rgba::WHITE,
    };
  }

  /// Drawn with the gray icon variant.
  pub fn is_down(&self) -> bool {
    self
      .tags
      .intersects(EntityTags::DEAD | EntityTags::KNOCKED_OUT)
  }

  /// Tooltip text for hovering the icon.
  pub fn tooltip(&self) -> String {
    match &self.kin {
      Some(kin) if !kin.name.is_empty() => kin.name.clone(),
      Some(kin) if kin.villager => "Villager".to_string(),
      _ => self.icon.tooltip.clone(),
    }
  }

  /// True if screen point `c` is over the icon.
  pub fn hit_test(&self, c: IVec2) -> bool {
    let Some(sc) = self.sc else {
      return false;
    };
    let half = self.icon.size / 2;
    let d = c - sc;
    d.x >= -half.x && d.x < half.x && d.y >= -half.y && d.y < half.y
  }
}

/// Rebuilds the icon proxies from a snapshot of live entities.
pub fn find_icons(
  prev: Vec<DisplayIcon>,
  entities: &[LiveEntity],
  settings: &IconSettings,
) -> Vec<DisplayIcon> {
  let mut prev: HashMap<EntityId, DisplayIcon> =
    prev.into_iter().map(|icon| (icon.entity, icon)).collect();
  let mut icons: Vec<DisplayIcon> = entities
    .iter()
    .filter_map(|entity| {
      let icon = entity.icon.clone()?;
      if !settings.is_visible(&icon.resource) {
        return None;
      }
      let mut disp = match prev.remove(&entity.id) {
        Some(disp) if disp.icon.resource == icon.resource => disp,
        _ => DisplayIcon::new(entity, icon.clone()),
      };
      disp.update(entity, icon);
      Some(disp)
    })
    .collect();
  icons.sort_by_key(|icon| icon.z);
  icons
}

/// Drops icons of party members; the party overlay draws those.
pub fn remove_party(icons: &mut Vec<DisplayIcon>, party: &Party) {
  if party.is_empty() {
    return;
  }
  icons.retain(|icon| !party.contains(icon.entity));
}
