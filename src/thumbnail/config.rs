use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the thumbnail cache
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThumbnailConfig {
    /// Number of thumbnails kept in memory, least recently used first out (default: 150)
    pub memory_capacity: usize,

    /// Maximum concurrent thumbnail resolutions (default: 8)
    pub workers: usize,

    /// JPEG quality of the disk tier, 1-100 (default: 90)
    pub jpeg_quality: u8,

    /// Directory of the disk tier (default: platform cache dir + zeitgeist/thumbnails)
    pub cache_dir: Option<PathBuf>,

    /// PNG drawn over video thumbnails (default: built-in play glyph)
    pub video_overlay: Option<PathBuf>,

    /// Load thumbnails of newly fetched items ahead of display (default: true)
    pub prefetch: bool,
}

impl Default for ThumbnailConfig {
    fn default() -> Self {
        Self {
            memory_capacity: 150,
            workers: 8,
            jpeg_quality: 90,
            cache_dir: None,
            video_overlay: None,
            prefetch: true,
        }
    }
}

impl ThumbnailConfig {
    /// Quality clamped to the range the JPEG encoder accepts.
    pub fn quality(&self) -> u8 {
        self.jpeg_quality.clamp(1, 100)
    }

    /// Worker count, never zero.
    pub fn worker_count(&self) -> usize {
        self.workers.max(1)
    }
}
