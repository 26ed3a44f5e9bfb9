//! Live session state the minimap reads from.
//!
//! The session is written by the host (network or simulation) and read by
//! the minimap each tick. Everything sits behind short-lived mutexes; the
//! minimap copies what it needs out through snapshots.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use bevy::math::{DVec2, IVec2};
use bitflags::bitflags;

use crate::coords::{GridCoord, GridId, TileCoord};
use crate::image::Rgba;

/// Live entity identity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

/// A grid currently loaded in the live session.
///
/// The session replaces the `Arc` when the grid at a coordinate changes,
/// so pointer identity tells whether a cached lookup is still valid.
#[derive(Debug)]
pub struct LoadedGrid {
  pub id: GridId,
  /// Session grid coordinate.
  pub gc: GridCoord,
}

impl LoadedGrid {
  /// First session tile of this grid.
  pub fn ul(&self) -> TileCoord {
    self.gc.origin()
  }
}

bitflags! {
  /// Status flags of a live entity.
  #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
  pub struct EntityTags: u8 {
    const DEAD = 1 << 0;
    const KNOCKED_OUT = 1 << 1;
  }
}

/// Minimap icon an entity carries.
#[derive(Clone, Debug, PartialEq)]
pub struct IconInfo {
  /// Icon resource name; also the key for icon settings.
  pub resource: String,
  /// Stacking order, lower is drawn first.
  pub z: i32,
  /// Rotate with the entity's heading.
  pub rotates: bool,
  /// Drawn with a kin-colored circle underneath.
  pub player: bool,
  /// Pixel size of the icon image.
  pub size: IVec2,
  /// Tooltip text.
  pub tooltip: String,
}

impl IconInfo {
  pub fn new(resource: impl Into<String>, z: i32) -> Self {
    Self {
      resource: resource.into(),
      z,
      rotates: false,
      player: false,
      size: IVec2::splat(20),
      tooltip: String::new(),
    }
  }
}

/// Social information attached to a player entity.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Kin {
  /// Index into the group color table.
  pub group: usize,
  /// Known name, empty when unknown.
  pub name: String,
  /// Entity belongs to a village.
  pub villager: bool,
}

#[derive(Clone, Debug)]
pub struct LiveEntity {
  pub id: EntityId,
  /// World position.
  pub pos: DVec2,
  /// Heading in radians.
  pub angle: f64,
  pub icon: Option<Arc<IconInfo>>,
  pub kin: Option<Kin>,
  pub tags: EntityTags,
  /// Map marker object id, when the entity is a marked landmark.
  pub marker: Option<u64>,
}

impl LiveEntity {
  pub fn new(id: EntityId, pos: DVec2) -> Self {
    Self {
      id,
      pos,
      angle: 0.0,
      icon: None,
      kin: None,
      tags: EntityTags::empty(),
      marker: None,
    }
  }

  pub fn with_icon(mut self, icon: IconInfo) -> Self {
    self.icon = Some(Arc::new(icon));
    self
  }
}

/// Live entities in insertion order.
#[derive(Debug, Default)]
pub struct ObjectCache {
  entries: Vec<LiveEntity>,
}

impl ObjectCache {
  /// Inserts or replaces an entity. Replacing keeps its position in order.
  pub fn insert(&mut self, entity: LiveEntity) {
    match self.entries.iter_mut().find(|e| e.id == entity.id) {
      Some(slot) => *slot = entity,
      None => self.entries.push(entity),
    }
  }

  pub fn remove(&mut self, id: EntityId) -> Option<LiveEntity> {
    let pos = self.entries.iter().position(|e| e.id == id)?;
    Some(self.entries.remove(pos))
  }

  pub fn get(&self, id: EntityId) -> Option<&LiveEntity> {
    self.entries.iter().find(|e| e.id == id)
  }

  pub fn get_mut(&mut self, id: EntityId) -> Option<&mut LiveEntity> {
    self.entries.iter_mut().find(|e| e.id == id)
  }

  pub fn iter(&self) -> impl Iterator<Item = &LiveEntity> {
    self.entries.iter()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

#[derive(Clone, Debug, PartialEq)]
pub struct PartyMember {
  pub entity: EntityId,
  /// Last known world position, `None` when unknown.
  pub pos: Option<DVec2>,
  pub angle: f64,
  pub color: Rgba,
}

/// Player's party, in join order.
#[derive(Clone, Debug, Default)]
pub struct Party {
  pub members: Vec<PartyMember>,
}

impl Party {
  pub fn contains(&self, id: EntityId) -> bool {
    self.members.iter().any(|m| m.entity == id)
  }

  pub fn len(&self) -> usize {
    self.members.len()
  }

  pub fn is_empty(&self) -> bool {
    self.members.is_empty()
  }
}

/// Live session view shared with the host.
#[derive(Debug, Default)]
pub struct Session {
  grids: Mutex<HashMap<GridCoord, Arc<LoadedGrid>>>,
  objects: Mutex<ObjectCache>,
  party: Mutex<Party>,
  player: Mutex<Option<EntityId>>,
  view: Mutex<Option<DVec2>>,
  names: Mutex<HashMap<EntityId, String>>,
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
  m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Session {
  pub fn new() -> Self {
    Self::default()
  }

  /// Loads (or reloads) a session grid. A reload is a new identity.
  pub fn load_grid(&self, gc: GridCoord, id: GridId) -> Arc<LoadedGrid> {
    let grid = Arc::new(LoadedGrid { id, gc });
    lock(&self.grids).insert(gc, grid.clone());
    grid
  }

  pub fn unload_grid(&self, gc: GridCoord) {
    lock(&self.grids).remove(&gc);
  }

  /// Loaded grid at a session grid coordinate.
  pub fn grid(&self, gc: GridCoord) -> Option<Arc<LoadedGrid>> {
    lock(&self.grids).get(&gc).cloned()
  }

  /// All loaded grids, ordered by coordinate.
  pub fn loaded_grids(&self) -> Vec<Arc<LoadedGrid>> {
    let mut grids: Vec<_> = lock(&self.grids).values().cloned().collect();
    grids.sort_by_key(|g| (g.gc.y, g.gc.x));
    grids
  }

  /// Mutable access to the object cache.
  pub fn objects(&self) -> MutexGuard<'_, ObjectCache> {
    lock(&self.objects)
  }

  /// Copy of the live entities, in insertion order.
  pub fn snapshot(&self) -> Vec<LiveEntity> {
    lock(&self.objects).iter().cloned().collect()
  }

  pub fn party(&self) -> MutexGuard<'_, Party> {
    lock(&self.party)
  }

  /// Entity controlled by this session.
  pub fn player(&self) -> Option<EntityId> {
    *lock(&self.player)
  }

  pub fn set_player(&self, id: Option<EntityId>) {
    *lock(&self.player) = id;
  }

  /// World position of the controlled entity.
  pub fn player_pos(&self) -> Option<DVec2> {
    let id = self.player()?;
    self.objects().get(id).map(|e| e.pos)
  }

  /// Camera focus in world units, tracked by view locators.
  pub fn view(&self) -> Option<DVec2> {
    *lock(&self.view)
  }

  pub fn set_view(&self, pos: Option<DVec2>) {
    *lock(&self.view) = pos;
  }

  /// Known character name for an entity.
  pub fn name(&self, id: EntityId) -> Option<String> {
    lock(&self.names).get(&id).cloned()
  }

  pub fn set_name(&self, id: EntityId, name: impl Into<String>) {
    lock(&self.names).insert(id, name.into());
  }
}
