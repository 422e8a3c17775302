use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::index::position::Filter;

/// Configuration for the item index
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Leave video items out of the position index (default: true)
    pub hide_videos: bool,

    /// Leave image items out of the position index (default: false)
    pub hide_images: bool,

    /// Snapshot file used to warm-start the index (default: platform data dir + zeitgeist/items.json)
    pub snapshot_path: Option<PathBuf>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            hide_videos: true,
            hide_images: false,
            snapshot_path: None,
        }
    }
}

impl IndexConfig {
    pub fn filter(&self) -> Filter {
        Filter {
            hide_videos: self.hide_videos,
            hide_images: self.hide_images,
            tag: None,
        }
    }
}
