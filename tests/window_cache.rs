//! Window reuse and render cache invalidation.
//!
//! Cells that stay visible across a pan must not be rendered again, newly
//! exposed cells are rendered exactly once, and a render started for a
//! superseded source never replaces the current image.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use bevy::tasks::{AsyncComputeTaskPool, TaskPool};
use minimap::{
  Area, CachedImage, DataGrid, DisplayWindow, GridCoord, GridId, MapFile, MapStore, Rgba,
  RgbaSurface, SegmentId, TileSet,
};

const SEG: SegmentId = SegmentId(3);

fn mapped_file(radius: i32) -> MapFile {
  let mut store = MapStore::default();
  let mut id = 0;
  for y in -radius..=radius {
    for x in -radius..=radius {
      id += 1;
      let shade = (id * 7 % 255) as u8;
      store.insert_grid(
        SEG,
        GridCoord::new(x, y),
        DataGrid::uniform(GridId(id), TileSet::new("gfx/tiles/moor", Rgba::rgb(shade, 0, 0), 0)),
      );
    }
  }
  MapFile::new(store)
}

/// Polls every cell until all have an image.
fn settle(window: &mut DisplayWindow) {
  let deadline = Instant::now() + Duration::from_secs(10);
  loop {
    let mut done = true;
    for (_, cell) in window.cells_mut() {
      done &= cell.img().is_some();
    }
    if done {
      return;
    }
    assert!(Instant::now() < deadline, "cells never finished rendering");
    std::thread::sleep(Duration::from_millis(2));
  }
}

#[test]
fn one_cell_pan_renders_only_exposed_cells() {
  let file = mapped_file(4);
  let mut window = DisplayWindow::new();

  let a = Area::sized(GridCoord::new(-2, -2), 4, 4);
  window.redisplay(&file, SEG, 0, a);
  settle(&mut window);
  assert!(window.cells().all(|(_, cell)| cell.renders() == 1));
  let before: HashMap<GridCoord, Arc<RgbaSurface>> = window
    .cells_mut()
    .filter_map(|(c, cell)| Some((c, cell.img()?)))
    .collect();

  let b = Area::sized(GridCoord::new(-1, -2), 4, 4);
  let delta = window.redisplay(&file, SEG, 0, b);
  assert_eq!((delta.kept, delta.dropped, delta.created), (12, 4, 4));
  settle(&mut window);
  // Poll again: a settled cell must not resubmit.
  settle(&mut window);

  for (c, cell) in window.cells() {
    assert_eq!(cell.renders(), 1, "cell {c:?} rendered more than once");
  }
  // Shared cells still hand out the very same images.
  for (c, cell) in window.cells_mut() {
    if let Some(old) = before.get(&c) {
      assert!(Arc::ptr_eq(old, &cell.img().unwrap()), "cell {c:?} lost its image");
    }
  }
}

#[test]
fn returning_to_a_dropped_cell_renders_it_again() {
  let file = mapped_file(4);
  let mut window = DisplayWindow::new();
  let a = Area::sized(GridCoord::new(0, 0), 2, 2);
  window.redisplay(&file, SEG, 0, a);
  settle(&mut window);

  window.redisplay(&file, SEG, 0, Area::sized(GridCoord::new(2, 0), 2, 2));
  let delta = window.redisplay(&file, SEG, 0, a);
  assert_eq!(delta.kept, 0);
  assert_eq!(delta.created, 4);
}

#[test]
fn store_update_rerenders_only_the_replaced_cell() {
  let file = mapped_file(2);
  let mut window = DisplayWindow::new();
  window.redisplay(&file, SEG, 0, Area::sized(GridCoord::new(-1, -1), 3, 3));
  settle(&mut window);

  let blue = TileSet::new("gfx/tiles/water", Rgba::rgb(0, 0, 255), 0);
  file
    .write()
    .insert_grid(SEG, GridCoord::new(0, 0), DataGrid::uniform(GridId(99), blue));

  let deadline = Instant::now() + Duration::from_secs(10);
  loop {
    let cell = window.cell_mut(GridCoord::new(0, 0)).unwrap();
    if cell.img().is_some_and(|img| img[(50, 50)] == Rgba::rgb(0, 0, 255)) {
      break;
    }
    assert!(Instant::now() < deadline, "replacement never rendered");
    std::thread::sleep(Duration::from_millis(2));
  }
  settle(&mut window);
  for (c, cell) in window.cells() {
    let expected = if c == GridCoord::new(0, 0) { 2 } else { 1 };
    assert_eq!(cell.renders(), expected, "cell {c:?}");
  }
}

#[test]
fn superseded_renders_never_land() {
  let pool = AsyncComputeTaskPool::get_or_init(TaskPool::new);
  let mut cache = CachedImage::<u32, u32>::new();

  // Two renders held open, then superseded by a third.
  let (tx1, rx1) = async_channel::bounded::<()>(1);
  let (tx2, rx2) = async_channel::bounded::<()>(1);
  let (tx3, rx3) = async_channel::bounded::<()>(1);
  cache.get(1, |_| {
    Some(pool.spawn(async move {
      let _ = rx1.recv().await;
      Some(1)
    }))
  });
  cache.get(2, |_| {
    Some(pool.spawn(async move {
      let _ = rx2.recv().await;
      Some(2)
    }))
  });
  cache.get(3, |_| {
    Some(pool.spawn(async move {
      let _ = rx3.recv().await;
      Some(3)
    }))
  });

  // Releasing the superseded renders must not surface their results.
  let _ = tx1.send_blocking(());
  let _ = tx2.send_blocking(());
  std::thread::sleep(Duration::from_millis(20));
  assert!(cache.current().is_none());

  tx3.send_blocking(()).unwrap();
  let deadline = Instant::now() + Duration::from_secs(5);
  let img = loop {
    if let Some(img) = cache.get(3, |_| unreachable!("same source resubmitted")) {
      break img;
    }
    assert!(Instant::now() < deadline, "current render never landed");
    std::thread::sleep(Duration::from_millis(1));
  };
  assert_eq!(*img, 3);
  assert!(Arc::ptr_eq(&img, &cache.current().unwrap()));
}
