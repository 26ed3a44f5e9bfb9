//! Full Bevy E2E minimap test.
//!
//! Runs the plugin under `MinimalPlugins`:
//! 1. Build a store with one mapped grid and a session standing on it
//! 2. Spawn a minimap following the session camera
//! 3. Update until the async cell render lands in the draw list
//! 4. Verify image placement, icons and config propagation

use std::sync::Arc;
use std::time::Duration;

use bevy::app::{TaskPoolOptions, TaskPoolPlugin};
use bevy::math::{DVec2, IVec2};
use bevy::prelude::*;
use minimap::{
  DataGrid, EntityId, GridCoord, GridId, IconInfo, LiveEntity, Location, Locator, MapFile,
  MapStore, Minimap, MinimapConfig, MinimapDrawList, MinimapPlugin, Rgba, SegmentId, Session,
  TileCoord, TileSet,
};

const SEG: SegmentId = SegmentId(1);

struct TestHarness {
  app: App,
  map: Entity,
  session: Arc<Session>,
}

impl TestHarness {
  fn new() -> Self {
    let mut store = MapStore::default();
    store.insert_grid(
      SEG,
      GridCoord::new(10, 10),
      DataGrid::uniform(GridId(7), TileSet::new("gfx/tiles/grass", Rgba::rgb(0, 128, 0), 0)),
    );
    let file = MapFile::new(store);

    // Session grid (0, 0) is segment grid (10, 10).
    let session = Arc::new(Session::new());
    session.load_grid(GridCoord::new(0, 0), GridId(7));
    session.set_view(Some(DVec2::new(550.0, 550.0)));
    session.set_player(Some(EntityId(1)));
    {
      let mut objects = session.objects();
      objects.insert(LiveEntity::new(EntityId(1), DVec2::new(550.0, 550.0)));
      let mut boar = IconInfo::new("gfx/hud/mmap/boar", 1);
      boar.tooltip = "Boar".to_string();
      objects.insert(LiveEntity::new(EntityId(2), DVec2::new(660.0, 550.0)).with_icon(boar));
    }

    let mut app = App::new();
    app.add_plugins(MinimalPlugins.set(TaskPoolPlugin {
      task_pool_options: TaskPoolOptions::with_num_threads(4),
    }));
    app.add_plugins(MinimapPlugin::default());

    let mut minimap = Minimap::new(file)
      .with_session(session.clone())
      .with_size(IVec2::new(300, 300));
    minimap.follow(Locator::View(session.clone()));
    let map = app.world_mut().spawn(minimap).id();

    Self { app, map, session }
  }

  fn minimap(&self) -> &Minimap {
    self.app.world().get::<Minimap>(self.map).unwrap()
  }

  fn draw_list(&self) -> &MinimapDrawList {
    self.app.world().get::<MinimapDrawList>(self.map).unwrap()
  }

  fn run_until_drawn(&mut self) {
    for _ in 0..500 {
      self.app.update();
      if self.draw_list().0.images().next().is_some() {
        return;
      }
      std::thread::sleep(Duration::from_millis(2));
    }
    panic!("cell image never arrived");
  }
}

#[test]
fn follows_session_view_and_draws_cell() {
  let mut h = TestHarness::new();
  h.run_until_drawn();

  // Camera tile (50, 50) in session space lands on segment tile (1050, 1050).
  let map = h.minimap();
  assert_eq!(
    map.location(),
    Some(Location::new(SEG, TileCoord::new(1050, 1050)))
  );
  assert_eq!(
    map.session_location(),
    Some(Location::new(SEG, TileCoord::new(1000, 1000)))
  );
  assert!(map.is_following());

  let images: Vec<_> = h.draw_list().0.images().collect();
  assert_eq!(images.len(), 1);
  let (img, ul, size) = images[0];
  assert_eq!(ul, IVec2::new(100, 100));
  assert_eq!(size, IVec2::new(100, 100));
  assert_eq!(img[(0, 0)], Rgba::rgb(0, 128, 0));
}

#[test]
fn icons_are_placed_by_session_origin() {
  let mut h = TestHarness::new();
  h.run_until_drawn();

  let icons: Vec<_> = h.draw_list().0.icons().collect();
  assert_eq!(icons, vec!["gfx/hud/mmap/boar"]);

  let map = h.minimap();
  let boar = &map.icons()[0];
  assert_eq!(boar.sc, Some(IVec2::new(160, 150)));
  assert_eq!(map.tooltip(IVec2::new(160, 150)).as_deref(), Some("Boar"));
}

#[test]
fn follow_tracks_camera_moves() {
  let mut h = TestHarness::new();
  h.run_until_drawn();

  h.session.set_view(Some(DVec2::new(550.0 + 11.0 * 20.0, 550.0)));
  h.app.update();
  assert_eq!(
    h.minimap().location(),
    Some(Location::new(SEG, TileCoord::new(1070, 1050)))
  );
}

#[test]
fn config_resource_changes_reach_minimaps() {
  let mut h = TestHarness::new();
  h.app.update();
  h.app.world_mut().resource_mut::<MinimapConfig>().max_zoom = 1;
  h.app.update();
  assert_eq!(h.minimap().config().max_zoom, 1);
}
