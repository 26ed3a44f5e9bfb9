//! Icon reconciliation under random entity churn.
//!
//! Each round moves, adds and removes entities at random and checks that
//! the proxy list is z-sorted, that equal-z icons keep snapshot order, and
//! that surviving entities keep their proxy.

use std::collections::HashMap;

use bevy::math::DVec2;
use minimap::icons::find_icons;
use minimap::{EntityId, IconInfo, IconSettings, LiveEntity};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use web_time::Instant;

const RESOURCES: [&str; 4] = [
  "gfx/hud/mmap/boar",
  "gfx/hud/mmap/fox",
  "gfx/hud/mmap/plc",
  "gfx/terobjs/mm/cave",
];

fn spawn(rng: &mut StdRng, id: u64) -> LiveEntity {
  let res = RESOURCES[rng.gen_range(0..RESOURCES.len())];
  let pos = DVec2::new(rng.gen_range(-500.0..500.0), rng.gen_range(-500.0..500.0));
  LiveEntity::new(EntityId(id), pos).with_icon(IconInfo::new(res, rng.gen_range(0..3)))
}

#[test]
fn icons_stay_ordered_under_churn() {
  let mut rng = StdRng::seed_from_u64(0x6d61_7073);
  let settings = IconSettings::default();
  let mut next_id = 0;
  let mut entities: Vec<LiveEntity> = (0..40)
    .map(|_| {
      next_id += 1;
      spawn(&mut rng, next_id)
    })
    .collect();

  let mut icons = find_icons(Vec::new(), &entities, &settings);
  let mut spawned: HashMap<EntityId, Instant> = icons.iter().map(|i| (i.entity, i.spawned)).collect();

  for _ in 0..200 {
    entities.retain(|_| !rng.gen_bool(0.1));
    for e in &mut entities {
      e.pos += DVec2::new(rng.gen_range(-5.0..5.0), rng.gen_range(-5.0..5.0));
    }
    for _ in 0..rng.gen_range(0..5) {
      next_id += 1;
      entities.push(spawn(&mut rng, next_id));
    }

    icons = find_icons(icons, &entities, &settings);
    assert_eq!(icons.len(), entities.len());

    let order: HashMap<EntityId, usize> =
      entities.iter().enumerate().map(|(i, e)| (e.id, i)).collect();
    for pair in icons.windows(2) {
      let (a, b) = (&pair[0], &pair[1]);
      assert!(a.z <= b.z, "icons out of z order");
      if a.z == b.z {
        assert!(order[&a.entity] < order[&b.entity], "equal-z icons reordered");
      }
    }

    for icon in &icons {
      let entity = &entities[order[&icon.entity]];
      assert_eq!(icon.pos, entity.pos);
      if let Some(first) = spawned.get(&icon.entity) {
        assert_eq!(*first, icon.spawned, "proxy for {:?} was recreated", icon.entity);
      }
    }
    spawned = icons.iter().map(|i| (i.entity, i.spawned)).collect();
  }
}

#[test]
fn hidden_resources_are_skipped_under_churn() {
  let mut rng = StdRng::seed_from_u64(7);
  let mut settings = IconSettings::default();
  settings.set(
    "gfx/hud/mmap/fox",
    minimap::IconSetting {
      show: false,
      ..Default::default()
    },
  );
  let entities: Vec<_> = (1..=100).map(|id| spawn(&mut rng, id)).collect();
  let icons = find_icons(Vec::new(), &entities, &settings);
  assert!(icons.iter().all(|i| i.icon.resource != "gfx/hud/mmap/fox"));
  let visible = entities
    .iter()
    .filter(|e| e.icon.as_ref().is_some_and(|i| i.resource != "gfx/hud/mmap/fox"))
    .count();
  assert_eq!(icons.len(), visible);
}
