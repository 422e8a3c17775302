use std::path::PathBuf;
use std::sync::Arc;

use crate::api::{FeedApi, HttpFeedApi};
use crate::app::error::{Result, ZeitgeistError};
use crate::config::Config;
use crate::index::ItemIndex;
use crate::thumbnail::{ThumbnailCache, ThumbnailPrefetcher};

pub struct AppContext {
    pub config: Config,
    pub api: Arc<dyn FeedApi>,
    pub items: ItemIndex,
    pub thumbnails: ThumbnailCache,
}

impl AppContext {
    /// Build every component against the configured Zeitgeist server.
    pub fn new(config: Config) -> Result<Self> {
        let api: Arc<dyn FeedApi> = Arc::new(HttpFeedApi::new(&config.api)?);
        Self::with_api(config, api)
    }

    /// Build every component against a caller-supplied API.
    ///
    /// Must be called from within a tokio runtime.
    pub fn with_api(mut config: Config, api: Arc<dyn FeedApi>) -> Result<Self> {
        if config.items.snapshot_path.is_none() {
            config.items.snapshot_path = Some(Self::default_snapshot_path()?);
        }
        let cache_dir = match &config.thumbnails.cache_dir {
            Some(dir) => dir.clone(),
            None => Self::default_cache_dir()?,
        };

        let items = ItemIndex::spawn(api.clone(), &config.items);
        let thumbnails = ThumbnailCache::new(api.clone(), cache_dir, &config.thumbnails)?;

        if config.thumbnails.prefetch {
            items.subscribe(Arc::new(ThumbnailPrefetcher::new(thumbnails.clone())));
        }

        Ok(Self {
            config,
            api,
            items,
            thumbnails,
        })
    }

    fn default_snapshot_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| ZeitgeistError::Config("Could not find data directory".into()))?;
        Ok(data_dir.join("zeitgeist").join("items.json"))
    }

    fn default_cache_dir() -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| ZeitgeistError::Config("Could not find cache directory".into()))?;
        Ok(cache_dir.join("zeitgeist").join("thumbnails"))
    }
}
