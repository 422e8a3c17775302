//! # Zeitgeist
//!
//! Sync and caching core of a Zeitgeist media feed client.
//!
//! ## Architecture
//!
//! ```text
//! FeedApi → ItemIndex → listeners → ThumbnailCache → UI
//! ```
//!
//! - [`api`]: Zeitgeist HTTP API behind the [`FeedApi`](api::FeedApi) trait
//! - [`index`]: authoritative item set, filters and ID-based paging
//! - [`thumbnail`]: memory, disk and network thumbnail tiers
//!
//! ## Quick Start
//!
//! ```bash
//! # Fetch the newest items and two older pages
//! zeitgeist sync --pages 3
//!
//! # Show what is cached
//! zeitgeist list
//!
//! # Tag an item
//! zeitgeist tag 42 "cats,-dogs"
//!
//! # Warm the thumbnail cache
//! zeitgeist thumbs
//! ```

/// Zeitgeist server API.
///
/// - [`FeedApi`](api::FeedApi): async trait the core depends on
/// - [`HttpFeedApi`](api::HttpFeedApi): reqwest-based implementation
pub mod api;

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires together the API client,
/// the item index and the thumbnail cache.
pub mod app;

/// Command-line interface using clap.
pub mod cli;

/// Configuration loaded from `~/.config/zeitgeist/config.toml`.
pub mod config;

/// Core domain models.
///
/// - [`Item`](domain::Item): one media entry of the feed
/// - [`TagExpression`](domain::TagExpression): parsed `"add,-remove"` tag edits
pub mod domain;

/// Item index running on its own worker task.
pub mod index;

/// Thumbnail cache.
pub mod thumbnail;
