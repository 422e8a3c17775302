use std::sync::Arc;

use crate::domain::Item;
use crate::index::IndexListener;
use crate::thumbnail::ThumbnailCache;

/// Loads thumbnails of freshly merged items before anything asks for them.
pub struct ThumbnailPrefetcher {
    cache: ThumbnailCache,
}

impl ThumbnailPrefetcher {
    pub fn new(cache: ThumbnailCache) -> Self {
        Self { cache }
    }
}

impl IndexListener for ThumbnailPrefetcher {
    fn on_updated(&self, new_items: Option<&[Arc<Item>]>) {
        let Some(items) = new_items else {
            return;
        };

        for item in items.iter().filter(|item| item.image.is_some()) {
            if !self.cache.is_mem_cached(item) {
                self.cache.prefetch(item.clone());
            }
        }
    }

    fn on_error(&self, _message: &str) {}
}
