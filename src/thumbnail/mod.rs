//! Thumbnail resolution through memory, disk and network tiers.
//!
//! # Architecture
//!
//! ```text
//! load_thumbnail → pending registry → worker pool → memory → disk → network
//!                                                    ↑        ↑        │
//!                                                    └─ overlay ─ JPEG ┘
//! ```
//!
//! A request for an ID that is already being resolved only queues its
//! callback; every waiter receives the same `Arc` once the single
//! resolution finishes.
//!
//! # Usage
//!
//! ```rust,ignore
//! use zeitgeist::thumbnail::{ThumbnailCache, ThumbnailConfig};
//!
//! let cache = ThumbnailCache::new(api, cache_dir, &ThumbnailConfig::default())?;
//! cache.load_thumbnail(item, |id, thumbnail| {
//!     // runs on a pool task, hand it over to the UI from here
//! });
//! ```

mod config;
mod disk;
mod memory;
mod overlay;
mod pending;
mod prefetch;

pub use config::ThumbnailConfig;
pub use disk::DiskTier;
pub use memory::MemoryTier;
pub use overlay::VideoOverlay;
pub use pending::{PendingFetches, ThumbnailCallback};
pub use prefetch::ThumbnailPrefetcher;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::DynamicImage;
use tokio::runtime::Handle;
use tokio::sync::{Notify, Semaphore};
use tracing::{debug, error, warn};

use crate::api::FeedApi;
use crate::app::{Result, ZeitgeistError};
use crate::domain::{Item, ItemKind};

/// A decoded thumbnail, shared between the memory tier and every waiter.
pub type Thumbnail = Arc<DynamicImage>;

/// Tiered, deduplicating thumbnail cache. Cloning shares the same cache.
#[derive(Clone)]
pub struct ThumbnailCache {
    inner: Arc<Inner>,
}

struct Inner {
    api: Arc<dyn FeedApi>,
    memory: MemoryTier,
    disk: DiskTier,
    overlay: VideoOverlay,
    pending: PendingFetches,
    semaphore: Arc<Semaphore>,
    idle: Notify,
    runtime: Handle,
}

/// Completes a submitted fetch exactly once, with `None` if the task is
/// dropped or unwinds before it finishes.
struct Completion {
    cache: ThumbnailCache,
    id: u64,
    done: bool,
}

impl Completion {
    fn finish(mut self, thumbnail: Option<Thumbnail>) {
        self.done = true;
        self.cache.complete(self.id, thumbnail);
    }
}

impl Drop for Completion {
    fn drop(&mut self) {
        if !self.done {
            warn!("thumbnail {} abandoned before it finished", self.id);
            self.cache.complete(self.id, None);
        }
    }
}

impl ThumbnailCache {
    /// Create the cache. Must be called from within a tokio runtime, whose
    /// handle is kept to run the worker pool.
    pub fn new(
        api: Arc<dyn FeedApi>,
        cache_dir: impl Into<PathBuf>,
        config: &ThumbnailConfig,
    ) -> Result<Self> {
        let overlay = match &config.video_overlay {
            Some(path) => VideoOverlay::from_file(path)?,
            None => VideoOverlay::default(),
        };
        Self::with_overlay(api, cache_dir, config, overlay)
    }

    pub fn with_overlay(
        api: Arc<dyn FeedApi>,
        cache_dir: impl Into<PathBuf>,
        config: &ThumbnailConfig,
        overlay: VideoOverlay,
    ) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|e| {
            ZeitgeistError::Other(format!("Thumbnail cache needs a tokio runtime: {}", e))
        })?;

        let inner = Inner {
            api,
            memory: MemoryTier::new(config.memory_capacity),
            disk: DiskTier::new(cache_dir, config.quality())?,
            overlay,
            pending: PendingFetches::new(),
            semaphore: Arc::new(Semaphore::new(config.worker_count())),
            idle: Notify::new(),
            runtime,
        };

        Ok(Self {
            inner: Arc::new(inner),
        })
    }

    /// Whether the item's thumbnail is in the memory tier. Does not touch
    /// the eviction order.
    pub fn is_mem_cached(&self, item: &Item) -> bool {
        self.inner.memory.contains(item.id)
    }

    /// Whether the item's thumbnail file exists in the disk tier.
    pub fn is_disk_cached(&self, item: &Item) -> bool {
        self.inner.disk.contains(item.id)
    }

    /// Path of the item's file in the disk tier, whether or not it exists.
    pub fn disk_path(&self, id: u64) -> PathBuf {
        self.inner.disk.path(id)
    }

    /// Directory of the disk tier.
    pub fn cache_dir(&self) -> &Path {
        self.inner.disk.dir()
    }

    /// Number of thumbnails held in memory.
    pub fn memory_len(&self) -> usize {
        self.inner.memory.len()
    }

    /// Whether a resolution for `id` is currently in flight.
    pub fn is_loading(&self, id: u64) -> bool {
        self.inner.pending.is_pending(id)
    }

    /// Resolve the thumbnail through all tiers.
    ///
    /// Returns `None` for items without an image and when the download or
    /// decoding fails; nothing is cached in that case.
    pub async fn get_bitmap_by_item(&self, item: &Item) -> Option<Thumbnail> {
        let Some(path) = item.thumbnail_path() else {
            warn!("item {} has no image", item.id);
            return None;
        };

        if let Some(thumbnail) = self.inner.memory.get(item.id) {
            debug!("thumbnail {} served from memory", item.id);
            return Some(thumbnail);
        }

        let image = match self.load_from_disk(item.id).await {
            Some(image) => image,
            None => self.load_from_web(item.id, path).await?,
        };

        let image = if item.kind == ItemKind::Video {
            self.inner.overlay.composite(&image)
        } else {
            image
        };

        let thumbnail = Arc::new(image);
        self.inner.memory.put(item.id, thumbnail.clone());
        Some(thumbnail)
    }

    /// Resolve on the worker pool and call `callback` from a pool task.
    ///
    /// Concurrent requests for the same ID share one resolution; callbacks run
    /// in the order they were registered.
    pub fn load_thumbnail<F>(&self, item: Arc<Item>, callback: F)
    where
        F: FnOnce(u64, Option<Thumbnail>) + Send + 'static,
    {
        self.submit(item, Some(Box::new(callback)));
    }

    /// Warm both tiers for `item` without waiting on the result.
    pub fn prefetch(&self, item: Arc<Item>) {
        self.submit(item, None);
    }

    fn submit(&self, item: Arc<Item>, callback: Option<ThumbnailCallback>) {
        if !self.inner.pending.register(item.id, callback) {
            debug!("thumbnail {} already loading", item.id);
            return;
        }

        let cache = self.clone();
        let completion = Completion {
            cache: self.clone(),
            id: item.id,
            done: false,
        };
        self.inner.runtime.spawn(async move {
            let thumbnail = match cache.inner.semaphore.acquire().await {
                Ok(_permit) => cache.get_bitmap_by_item(&item).await,
                Err(e) => {
                    error!("thumbnail pool closed: {}", e);
                    None
                }
            };

            if thumbnail.is_none() {
                warn!("no thumbnail for item {}", item.id);
            }
            completion.finish(thumbnail);
        });
    }

    fn complete(&self, id: u64, thumbnail: Option<Thumbnail>) {
        self.inner.pending.complete(id, thumbnail);
        if self.inner.pending.is_empty() {
            self.inner.idle.notify_waiters();
        }
    }

    /// Wait until no thumbnail is being resolved, prefetches included.
    pub async fn idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            tokio::pin!(notified);
            // register before checking so a completion in between is not missed
            notified.as_mut().enable();

            if self.inner.pending.is_empty() {
                return;
            }
            notified.await;
        }
    }

    async fn load_from_disk(&self, id: u64) -> Option<DynamicImage> {
        let disk = self.inner.disk.clone();
        match tokio::task::spawn_blocking(move || disk.load(id)).await {
            Ok(image) => image,
            Err(e) => {
                error!("disk cache task failed: {}", e);
                None
            }
        }
    }

    /// Download, decode and persist to disk before returning.
    async fn load_from_web(&self, id: u64, path: &str) -> Option<DynamicImage> {
        let url = format!("{}{}", self.inner.api.base_url(), path);
        debug!("load thumbnail {} from {}", id, url);

        let bytes = match self.inner.api.download(&url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("unable to download thumbnail {}: {}", url, e);
                return None;
            }
        };

        let disk = self.inner.disk.clone();
        let decoded = tokio::task::spawn_blocking(move || {
            let image = image::load_from_memory(&bytes)?;
            if let Err(e) = disk.store(id, &image) {
                warn!("unable to write thumbnail {} to disk cache: {}", id, e);
            }
            Ok::<_, image::ImageError>(image)
        })
        .await;

        match decoded {
            Ok(Ok(image)) => Some(image),
            Ok(Err(e)) => {
                warn!("unable to decode thumbnail {}: {}", url, e);
                None
            }
            Err(e) => {
                error!("thumbnail decode task failed: {}", e);
                None
            }
        }
    }

    pub fn clear_memory(&self) {
        self.inner.memory.clear();
    }

    /// Delete every thumbnail file of the disk tier.
    pub async fn clear_disk_cache(&self) -> Result<usize> {
        let disk = self.inner.disk.clone();
        tokio::task::spawn_blocking(move || disk.clear())
            .await
            .map_err(|e| ZeitgeistError::Other(format!("disk cache task failed: {}", e)))?
    }
}
