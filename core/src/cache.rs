//! LRU tile image cache with in-flight load de-duplication.
//!
//! The cache is a cheaply clonable handle around shared state. One instance
//! is constructed at the application composition root and handed to every
//! mounted map view, so concurrent views requesting the same tile collapse
//! into a single fetch. Everything runs on the single UI thread; interior
//! mutability is `RefCell`, not locks.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use futures::FutureExt;
use futures::future::{LocalBoxFuture, Shared};

use crate::coords::TileCoord;

/// Why a tile image could not be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileLoadError {
    pub tile: TileCoord,
    pub reason: String,
}

impl TileLoadError {
    pub fn new(tile: TileCoord, reason: impl Into<String>) -> Self {
        Self {
            tile,
            reason: reason.into(),
        }
    }
}

impl fmt::Display for TileLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to load tile {},{}: {}",
            self.tile.x, self.tile.y, self.reason
        )
    }
}

impl std::error::Error for TileLoadError {}

/// Produces the decoded image for a tile. The client implements this over
/// `HtmlImageElement`; tests inject scripted fetchers.
pub trait TileFetcher: 'static {
    type Image: Clone + 'static;

    fn fetch(&self, tile: TileCoord) -> LocalBoxFuture<'static, Result<Self::Image, TileLoadError>>;
}

/// A pending or completed load, awaitable by any number of callers.
pub type TileLoad<I> = Shared<LocalBoxFuture<'static, Result<I, TileLoadError>>>;

/// Fire-and-forget executor hook for preloads (`spawn_local` in the client,
/// a test pool in tests).
pub type Spawner = Box<dyn Fn(LocalBoxFuture<'static, ()>)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub cached: usize,
    pub loading: usize,
}

struct CachedTile<I> {
    image: I,
    /// Logical access tick, not wall time; strictly increasing per touch.
    last_accessed: u64,
}

struct Inner<F: TileFetcher> {
    fetcher: F,
    max_size: usize,
    spawner: Spawner,
    entries: RefCell<HashMap<TileCoord, CachedTile<F::Image>>>,
    in_flight: RefCell<HashMap<TileCoord, TileLoad<F::Image>>>,
    access_clock: Cell<u64>,
    on_tile_loaded: RefCell<Option<Rc<dyn Fn()>>>,
}

impl<F: TileFetcher> Inner<F> {
    fn tick(&self) -> u64 {
        let next = self.access_clock.get() + 1;
        self.access_clock.set(next);
        next
    }

    fn touch(&self, tile: TileCoord) -> Option<F::Image> {
        let mut entries = self.entries.borrow_mut();
        let cached = entries.get_mut(&tile)?;
        cached.last_accessed = self.tick();
        Some(cached.image.clone())
    }

    fn insert(&self, tile: TileCoord, image: F::Image) {
        let last_accessed = self.tick();
        let mut entries = self.entries.borrow_mut();
        entries.insert(
            tile,
            CachedTile {
                image,
                last_accessed,
            },
        );

        if entries.len() <= self.max_size {
            return;
        }
        let excess = entries.len() - self.max_size;
        let mut by_age: Vec<(TileCoord, u64)> = entries
            .iter()
            .map(|(tile, cached)| (*tile, cached.last_accessed))
            .collect();
        by_age.sort_by_key(|&(_, accessed)| accessed);
        for (oldest, _) in by_age.into_iter().take(excess) {
            entries.remove(&oldest);
        }
    }

    fn notify_loaded(&self) {
        let callback = self.on_tile_loaded.borrow().clone();
        if let Some(callback) = callback {
            callback();
        }
    }
}

pub struct TileCache<F: TileFetcher> {
    inner: Rc<Inner<F>>,
}

impl<F: TileFetcher> Clone for TileCache<F> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<F: TileFetcher> TileCache<F> {
    pub fn new(
        fetcher: F,
        max_size: usize,
        spawner: impl Fn(LocalBoxFuture<'static, ()>) + 'static,
    ) -> Self {
        Self {
            inner: Rc::new(Inner {
                fetcher,
                max_size,
                spawner: Box::new(spawner),
                entries: RefCell::new(HashMap::new()),
                in_flight: RefCell::new(HashMap::new()),
                access_clock: Cell::new(0),
                on_tile_loaded: RefCell::new(None),
            }),
        }
    }

    /// Register the "a tile finished loading" notification (the render
    /// scheduler's dirty mark). Replaces any previous callback.
    pub fn set_on_tile_loaded(&self, callback: impl Fn() + 'static) {
        *self.inner.on_tile_loaded.borrow_mut() = Some(Rc::new(callback));
    }

    /// Synchronous cache lookup. Refreshes the entry's LRU position and
    /// never triggers a load.
    pub fn get_cached(&self, tile: TileCoord) -> Option<F::Image> {
        self.inner.touch(tile)
    }

    /// Load a tile, de-duplicating concurrent requests.
    ///
    /// Cached tiles resolve immediately. If an identical request is in
    /// flight, the same shared future is returned, so every caller observes
    /// one fetch and one eventual image. On success the image is inserted
    /// before the in-flight marker clears and the loaded notification fires,
    /// so a cache read from the notification is guaranteed to see it. On
    /// failure the marker clears and the cache is left untouched.
    pub fn load_tile(&self, tile: TileCoord) -> TileLoad<F::Image> {
        if let Some(image) = self.inner.touch(tile) {
            return futures::future::ready(Ok(image)).boxed_local().shared();
        }

        if let Some(pending) = self.inner.in_flight.borrow().get(&tile) {
            return pending.clone();
        }

        let inner = self.inner.clone();
        let load: TileLoad<F::Image> = async move {
            match inner.fetcher.fetch(tile).await {
                Ok(image) => {
                    inner.insert(tile, image.clone());
                    inner.in_flight.borrow_mut().remove(&tile);
                    inner.notify_loaded();
                    Ok(image)
                }
                Err(err) => {
                    inner.in_flight.borrow_mut().remove(&tile);
                    Err(err)
                }
            }
        }
        .boxed_local()
        .shared();

        self.inner
            .in_flight
            .borrow_mut()
            .insert(tile, load.clone());
        load
    }

    /// Start loads for every tile not already cached or in flight.
    /// Failures are swallowed; callers who care await `load_tile` directly.
    pub fn preload_tiles(&self, tiles: &[TileCoord]) {
        for &tile in tiles {
            if self.inner.entries.borrow().contains_key(&tile)
                || self.inner.in_flight.borrow().contains_key(&tile)
            {
                continue;
            }
            let load = self.load_tile(tile);
            (self.inner.spawner)(
                async move {
                    let _ = load.await;
                }
                .boxed_local(),
            );
        }
    }

    pub fn clear(&self) {
        self.inner.entries.borrow_mut().clear();
        self.inner.in_flight.borrow_mut().clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            cached: self.inner.entries.borrow().len(),
            loading: self.inner.in_flight.borrow().len(),
        }
    }
}
