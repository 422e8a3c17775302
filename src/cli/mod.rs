pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "zeitgeist")]
#[command(about = "Sync and browse a Zeitgeist media feed", long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.config/zeitgeist/config.toml
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch new items, then page back through older ones
    Sync {
        /// Number of pages to fetch
        #[arg(short, long, default_value_t = 1)]
        pages: usize,

        /// Only items carrying this tag
        #[arg(short, long)]
        tag: Option<String>,

        /// Include videos
        #[arg(long)]
        show_videos: bool,

        /// Leave out images
        #[arg(long)]
        hide_images: bool,
    },
    /// List cached items, newest first
    List {
        /// Maximum number of items to show
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Add or remove tags, e.g. "cats,-dogs"
    Tag {
        /// Item ID
        id: u64,
        /// Comma separated tags, prefix with '-' to remove
        expression: String,
    },
    /// Delete an item on the server
    Delete {
        /// Item ID
        id: u64,
    },
    /// Load thumbnails of the newest cached items into the disk cache
    Thumbs {
        /// Number of items
        #[arg(short, long, default_value_t = 20)]
        limit: usize,
    },
    /// Remove every cached thumbnail
    ClearCache,
}
