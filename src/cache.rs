//! Asynchronous image cache with source invalidation.
//!
//! A [`CachedImage`] remembers the source its image was computed from and
//! at most one in-flight computation. Asking for an image with a different
//! source cancels that computation (dropping a [`Task`] cancels it) and
//! starts a new one; the previous image is still returned until the new one
//! arrives. Results are collected only from the task started for the current
//! source, so a stale render can never replace a fresh one.

use std::sync::Arc;

use bevy::tasks::{AsyncComputeTaskPool, Task, TaskPool};
use log::trace;

/// Spawns a render job on the async compute pool.
///
/// Initializes the pool on first use when running outside a Bevy app.
pub fn spawn_render<T, F>(job: F) -> Task<Option<T>>
where
  T: Send + 'static,
  F: FnOnce() -> Option<T> + Send + 'static,
{
  AsyncComputeTaskPool::get_or_init(TaskPool::new).spawn(async move { job() })
}

/// Image computed asynchronously from a comparable source key.
pub struct CachedImage<K, T> {
  /// Source of the in-flight task, or of `img` once collected.
  source: Option<K>,
  next: Option<Task<Option<T>>>,
  img: Option<Arc<T>>,
}

impl<K, T> Default for CachedImage<K, T> {
  fn default() -> Self {
    Self {
      source: None,
      next: None,
      img: None,
    }
  }
}

impl<K: PartialEq, T: Send + 'static> CachedImage<K, T> {
  pub fn new() -> Self {
    Self::default()
  }

  /// Returns the latest image for `source`.
  ///
  /// If `source` differs from the last one seen, any in-flight task is
  /// cancelled and `submit` is asked for a new one. `submit` returning
  /// `None` means there is nothing to draw for this source and clears the
  /// image.
  pub fn get<F>(&mut self, source: K, submit: F) -> Option<Arc<T>>
  where
    F: FnOnce(&K) -> Option<Task<Option<T>>>,
  {
    if self.source.as_ref() != Some(&source) {
      if self.next.take().is_some() {
        trace!("cancelled stale image task");
      }
      self.next = submit(&source);
      if self.next.is_none() {
        self.img = None;
      }
      self.source = Some(source);
    }
    self.poll();
    self.img.clone()
  }

  /// Last collected image, without checking for a newer source.
  pub fn current(&mut self) -> Option<Arc<T>> {
    self.poll();
    self.img.clone()
  }

  /// True while a computation is in flight.
  pub fn is_pending(&self) -> bool {
    self.next.is_some()
  }

  fn poll(&mut self) {
    let finished = self.next.as_ref().is_some_and(|task| task.is_finished());
    if !finished {
      return;
    }
    if let Some(mut task) = self.next.take() {
      self.img = bevy::tasks::block_on(&mut task).map(Arc::new);
    }
  }
}

#[cfg(test)]
mod tests {
  use std::time::{Duration, Instant};

  use super::*;

  fn wait<K: PartialEq, T: Send + 'static>(cache: &mut CachedImage<K, T>) -> Option<Arc<T>> {
    let deadline = Instant::now() + Duration::from_secs(5);
    while cache.is_pending() && Instant::now() < deadline {
      std::thread::sleep(Duration::from_millis(1));
      cache.current();
    }
    cache.current()
  }

  #[test]
  fn same_source_submits_once() {
    let mut cache = CachedImage::<u32, u32>::new();
    let mut submits = 0;
    for _ in 0..3 {
      cache.get(1, |&s| {
        submits += 1;
        Some(spawn_render(move || Some(s * 10)))
      });
    }
    assert_eq!(submits, 1);
    assert_eq!(wait(&mut cache).as_deref(), Some(&10));
  }

  #[test]
  fn previous_image_kept_until_replacement_arrives() {
    let mut cache = CachedImage::<u32, u32>::new();
    cache.get(1, |_| Some(spawn_render(|| Some(1))));
    assert_eq!(wait(&mut cache).as_deref(), Some(&1));

    let (tx, rx) = async_channel::bounded::<()>(1);
    let task = AsyncComputeTaskPool::get_or_init(TaskPool::new).spawn(async move {
      let _ = rx.recv().await;
      Some(2)
    });
    let shown = cache.get(2, |_| Some(task));
    assert_eq!(shown.as_deref(), Some(&1));

    tx.send_blocking(()).unwrap();
    assert_eq!(wait(&mut cache).as_deref(), Some(&2));
  }

  #[test]
  fn empty_submit_clears_image() {
    let mut cache = CachedImage::<u32, u32>::new();
    cache.get(1, |_| Some(spawn_render(|| Some(1))));
    wait(&mut cache);
    assert!(cache.get(2, |_| None).is_none());
    assert!(!cache.is_pending());
  }
}
