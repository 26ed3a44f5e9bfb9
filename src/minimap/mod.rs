//! The minimap widget.
//!
//! [`Minimap`] ties the pieces together: it resolves where to look
//! (locators), keeps a window of display cells over the visible extent,
//! reconciles live entity icons and draws everything through a
//! [`Painter`](crate::painter::Painter). It is a Bevy component; the
//! [`MinimapPlugin`](crate::MinimapPlugin) ticks and draws it every frame.
//!
//! All map access on the frame path is non-blocking. Anything that would
//! wait on the store is skipped and retried on a later tick.

mod draw;
mod input;

use std::collections::HashMap;
use std::sync::Arc;

use bevy::math::{DVec2, IVec2};
use bevy::prelude::*;
pub use input::{ClickButton, ClickHandler, MapClick};

use crate::config::MinimapConfig;
use crate::coords::{MAX_ZOOM, SegmentId, TileCoord};
use crate::display::DisplayMarker;
use crate::error::Loading;
use crate::highlight::TileHighlight;
use crate::icons::{DisplayIcon, find_icons};
use crate::image::Rgba;
use crate::location::{Location, Locator};
use crate::painter::LabelCache;
use crate::plugin::MinimapDrawList;
use crate::session::{EntityId, Session};
use crate::store::{MapFile, MapStore};
use crate::transform::Projection;
use crate::window::DisplayWindow;

/// A tracked target shown as an arrow at the minimap edge while off-screen.
#[derive(Clone, Debug, PartialEq)]
pub struct Pointer {
  pub seg: SegmentId,
  pub tc: TileCoord,
  pub tooltip: String,
  pub color: Rgba,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct Drag {
  pub start: IVec2,
  pub origin: Location,
  pub dragging: bool,
}

/// Minimap state, one per displayed map.
#[derive(Component)]
#[require(MinimapDrawList)]
pub struct Minimap {
  file: MapFile,
  session: Option<Arc<Session>>,
  config: MinimapConfig,
  size: IVec2,
  zoom: u32,
  magnification: u32,
  /// Location to center on.
  curloc: Option<Location>,
  /// Segment location of the live session origin.
  sessloc: Option<Location>,
  setloc: Option<Locator>,
  follow: bool,
  sesslocator: Option<Locator>,
  /// Location the window was last built for.
  dloc: Option<Location>,
  proj: Option<Projection>,
  window: DisplayWindow,
  icons: Vec<DisplayIcon>,
  names: HashMap<EntityId, (String, LabelCache)>,
  highlight: Option<Arc<TileHighlight>>,
  overlays: Vec<(String, u64)>,
  pointers: Vec<Pointer>,
  hover: Option<IVec2>,
  biome: Option<String>,
  biome_label: LabelCache,
  drag: Option<Drag>,
  press: Option<input::Press>,
}

fn resolve(file: &MapFile, locator: &mut Locator) -> Result<Option<Location>, Loading> {
  let store = file.try_read()?;
  locator.locate(&store)
}

impl Minimap {
  pub fn new(file: MapFile) -> Self {
    let config = MinimapConfig::default();
    Self {
      file,
      session: None,
      size: IVec2::new(300, 300),
      zoom: 0,
      magnification: 1,
      config,
      curloc: None,
      sessloc: None,
      setloc: None,
      follow: false,
      sesslocator: None,
      dloc: None,
      proj: None,
      window: DisplayWindow::new(),
      icons: Vec::new(),
      names: HashMap::new(),
      highlight: None,
      overlays: Vec::new(),
      pointers: Vec::new(),
      hover: None,
      biome: None,
      biome_label: LabelCache::default(),
      drag: None,
      press: None,
    }
  }

  /// Attaches the live session; icons, party and the view box come from it.
  pub fn with_session(mut self, session: Arc<Session>) -> Self {
    self.sesslocator = Some(Locator::session(session.clone()));
    self.session = Some(session);
    self
  }

  pub fn with_size(mut self, size: IVec2) -> Self {
    self.size = size;
    self
  }

  pub fn with_config(mut self, config: MinimapConfig) -> Self {
    self.set_config(config);
    self
  }

  /// Replaces the config, clamping zoom and magnification to its limits.
  /// A `max_zoom` past [`MAX_ZOOM`] is capped.
  pub fn set_config(&mut self, mut config: MinimapConfig) {
    if config.max_zoom > MAX_ZOOM {
      warn!("max_zoom {} capped at {}", config.max_zoom, MAX_ZOOM);
      config.max_zoom = MAX_ZOOM;
    }
    self.magnification = self.magnification.clamp(1, config.max_magnification.max(1));
    self.zoom = self.zoom.min(config.max_zoom);
    self.config = config;
  }

  pub fn config(&self) -> &MinimapConfig {
    &self.config
  }

  pub fn size(&self) -> IVec2 {
    self.size
  }

  pub fn resize(&mut self, size: IVec2) {
    self.size = size;
  }

  pub fn zoom(&self) -> u32 {
    self.zoom
  }

  pub fn magnification(&self) -> u32 {
    self.magnification
  }

  pub fn set_zoom(&mut self, zoom: u32, magnification: u32) {
    self.zoom = zoom.min(self.config.max_zoom);
    self.magnification = magnification.clamp(1, self.config.max_magnification.max(1));
  }

  /// Location the minimap is centered on.
  pub fn location(&self) -> Option<Location> {
    self.curloc
  }

  /// Segment location of the live session origin, once resolved.
  pub fn session_location(&self) -> Option<Location> {
    self.sessloc
  }

  /// Projection used for the last drawn frame.
  pub fn projection(&self) -> Option<Projection> {
    self.proj
  }

  pub fn window(&self) -> &DisplayWindow {
    &self.window
  }

  pub fn icons(&self) -> &[DisplayIcon] {
    &self.icons
  }

  pub fn biome(&self) -> Option<&str> {
    self.biome.as_deref()
  }

  /// Resolves a locator against the minimap's store without blocking.
  pub fn resolve(&self, locator: &mut Locator) -> Result<Option<Location>, Loading> {
    resolve(&self.file, locator)
  }

  /// Centers on a location, cancelling any pending locator.
  pub fn center(&mut self, loc: Location) {
    self.curloc = Some(loc);
    self.setloc = None;
    self.follow = false;
  }

  /// Centers on a locator once it resolves.
  pub fn center_on(&mut self, locator: Locator) {
    self.setloc = Some(locator);
    self.follow = false;
  }

  /// Keeps centering on a locator every tick.
  pub fn follow(&mut self, locator: Locator) {
    self.setloc = Some(locator);
    self.follow = true;
  }

  pub fn is_following(&self) -> bool {
    self.follow && self.setloc.is_some()
  }

  pub fn set_tile_highlight(&mut self, highlight: Option<Arc<TileHighlight>>) {
    self.highlight = highlight;
  }

  /// Shows a named overlay layer. Bump `version` when the layer changes.
  pub fn show_overlay(&mut self, tag: &str, version: u64) {
    match self.overlays.iter_mut().find(|(t, _)| t == tag) {
      Some(entry) => entry.1 = version,
      None => self.overlays.push((tag.to_string(), version)),
    }
  }

  pub fn hide_overlay(&mut self, tag: &str) {
    self.overlays.retain(|(t, _)| t != tag);
  }

  pub fn set_pointers(&mut self, pointers: Vec<Pointer>) {
    self.pointers = pointers;
  }

  /// Per-frame update: resolves locators, reconciles icons and party names,
  /// and updates the biome under the pointer.
  pub fn tick(&mut self) {
    if let Some(mut locator) = self.setloc.take() {
      match resolve(&self.file, &mut locator) {
        Ok(Some(loc)) => {
          self.curloc = Some(loc);
          if self.follow {
            self.setloc = Some(locator);
          }
        }
        Ok(None) => {
          debug!("Minimap locator can not be resolved, dropping it");
          self.curloc = None;
          self.follow = false;
        }
        Err(loading) => {
          trace!("Minimap locator pending: {loading}");
          self.setloc = Some(locator);
        }
      }
    }

    if let Some(locator) = self.sesslocator.as_mut() {
      match resolve(&self.file, locator) {
        Ok(loc) => self.sessloc = loc,
        Err(loading) => trace!("Session location pending: {loading}"),
      }
    }

    if let Some(session) = self.session.clone() {
      let snapshot = session.snapshot();
      self.icons = find_icons(std::mem::take(&mut self.icons), &snapshot, &self.config.icons);
      self.resolve_names(&session);
    }

    self.update_biome();
  }

  /// Collects names of other party members for labels. Only needed with
  /// company; names of members that left are forgotten.
  fn resolve_names(&mut self, session: &Session) {
    let party = session.party().clone();
    if party.len() <= 1 {
      self.names.clear();
      return;
    }
    let me = session.player();
    self.names.retain(|id, _| party.contains(*id));
    for member in &party.members {
      if Some(member.entity) == me {
        continue;
      }
      if let Some(name) = session.name(member.entity) {
        match self.names.get_mut(&member.entity) {
          Some(entry) => entry.0 = name,
          None => {
            self.names.insert(member.entity, (name, LabelCache::default()));
          }
        }
      }
    }
  }

  /// Biome under the pointer, or under the player while not hovering.
  fn update_biome(&mut self) {
    let tc = match (self.config.show_biome, self.dloc) {
      (true, Some(dloc)) => match (self.proj, self.hover) {
        (Some(proj), Some(c)) => Some((dloc.seg, proj.screen_to_tile(c))),
        _ => self.player_tile(dloc.seg).map(|tc| (dloc.seg, tc)),
      },
      _ => None,
    };
    let Some((seg, tc)) = tc else {
      self.biome = None;
      return;
    };
    let Ok(store) = self.file.try_read() else {
      return;
    };
    self.biome = biome_at(&store, seg, tc);
  }

  /// Segment tile of the player, if the session is in `seg`.
  fn player_tile(&self, seg: SegmentId) -> Option<TileCoord> {
    let sess = self.sessloc.filter(|s| s.seg == seg)?;
    let pos = self.session.as_ref()?.player_pos()?;
    Some(TileCoord::from_world(pos) + sess.tc)
  }

  /// Displayed marker linked to a live object id.
  pub fn find_marker(&self, object: u64) -> Option<&DisplayMarker> {
    self
      .window
      .cells()
      .flat_map(|(_, cell)| cell.current_markers())
      .find(|m| m.marker.object() == Some(object))
  }

  /// True if an icon is hidden because a marker already shows its entity.
  pub fn is_filtered(&self, icon: &DisplayIcon) -> bool {
    icon
      .marker
      .is_some_and(|object| self.find_marker(object).is_some())
  }

  /// True if zooming out would show any map data.
  pub fn allows_zoom_out(&self) -> bool {
    self.window.has_edge_data()
  }

  /// Screen position of a segment location; `None` on another segment.
  pub fn location_to_screen(&self, loc: Location) -> Option<IVec2> {
    let (proj, dloc) = (self.proj?, self.dloc?);
    (loc.seg == dloc.seg).then(|| proj.tile_to_screen(loc.tc))
  }

  /// Screen position of a session world position, if the session is in
  /// the displayed segment.
  pub fn world_to_screen(&self, pos: DVec2) -> Option<IVec2> {
    let (proj, dloc, sess) = (self.proj?, self.dloc?, self.sessloc?);
    (sess.seg == dloc.seg).then(|| proj.world_to_screen(pos, sess.tc))
  }
}

/// Readable name of the tile set at a segment tile.
fn biome_at(store: &MapStore, seg: SegmentId, tc: TileCoord) -> Option<String> {
  let grid = store.grid(seg, 0, tc.grid())?;
  let name = &grid.as_full()?.tileset(tc.local())?.name;
  let base = name.rsplit('/').next().unwrap_or(name).replace('_', " ");
  let mut chars = base.chars();
  let first = chars.next()?;
  Some(first.to_uppercase().chain(chars).collect())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::coords::{GridCoord, GridId};
  use crate::store::{DataGrid, TileSet};

  #[test]
  fn biome_name_is_readable() {
    let mut store = MapStore::default();
    store.insert_grid(
      SegmentId(1),
      GridCoord::new(0, 0),
      DataGrid::uniform(GridId(1), TileSet::new("gfx/tiles/leaf_forest", Rgba::BLACK, 0)),
    );
    assert_eq!(
      biome_at(&store, SegmentId(1), TileCoord::new(5, 5)).as_deref(),
      Some("Leaf forest")
    );
    assert_eq!(biome_at(&store, SegmentId(1), TileCoord::new(500, 5)), None);
  }

  #[test]
  fn config_clamps_zoom_state() {
    let mut map = Minimap::new(MapFile::default());
    map.set_zoom(9, 9);
    assert_eq!((map.zoom(), map.magnification()), (5, 4));
    map.set_config(MinimapConfig {
      max_zoom: 2,
      max_magnification: 2,
      ..MinimapConfig::default()
    });
    assert_eq!((map.zoom(), map.magnification()), (2, 2));
  }

  #[test]
  fn oversized_max_zoom_is_capped() {
    let mut store = MapStore::default();
    store.insert_grid(
      SegmentId(1),
      GridCoord::new(0, 0),
      DataGrid::uniform(GridId(1), TileSet::new("gfx/tiles/moor", Rgba::BLACK, 0)),
    );
    let mut map = Minimap::new(MapFile::new(store)).with_config(MinimapConfig {
      max_zoom: 40,
      ..MinimapConfig::default()
    });
    assert_eq!(map.config().max_zoom, MAX_ZOOM);
    map.set_zoom(40, 1);
    assert_eq!(map.zoom(), MAX_ZOOM);
    map.center(Location::new(SegmentId(1), TileCoord::new(50, 50)));
    map.tick();
    map.draw(&mut crate::painter::DrawList::new());
    let center = Location::new(SegmentId(1), TileCoord::new(50, 50));
    assert_eq!(map.location_to_screen(center), Some(map.size() / 2));
  }

  #[test]
  fn unresolvable_fixed_locator_is_dropped() {
    let mut map = Minimap::new(MapFile::default());
    map.follow(Locator::Fixed(Location::new(SegmentId(4), TileCoord::new(0, 0))));
    map.tick();
    assert!(!map.is_following());
    assert_eq!(map.location(), None);
  }

  #[test]
  fn vanished_segment_clears_the_display() {
    let here = Location::new(SegmentId(1), TileCoord::new(50, 50));
    let mut map = Minimap::new(MapFile::default());
    map.center(here);
    map.draw(&mut crate::painter::DrawList::new());
    assert!(map.location_to_screen(here).is_some());

    map.center_on(Locator::Fixed(Location::new(SegmentId(4), TileCoord::new(0, 0))));
    map.tick();
    assert_eq!(map.location(), None);
    let mut list = crate::painter::DrawList::new();
    map.draw(&mut list);
    assert!(list.cmds.is_empty());
    assert_eq!(map.location_to_screen(here), None);
  }
}
