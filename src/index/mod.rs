//! Authoritative item set and its filtered, newest-first position index.
//!
//! # Architecture
//!
//! ```text
//! ItemIndex (any task) ──commands──► IndexWorker (one task)
//!        ▲                                 │
//!        └──── watch<Arc<IndexView>> ◄─────┤
//!                                          └──► IndexListener callbacks
//! ```
//!
//! Every fetch and mutation runs on the worker, one at a time. Reads go to the
//! most recently published [`IndexView`] and never block on the worker.
//!
//! # Usage
//!
//! ```rust,ignore
//! use zeitgeist::index::{IndexConfig, ItemIndex};
//!
//! let index = ItemIndex::spawn(api, &IndexConfig::default());
//! index.subscribe(listener);
//! index.query_first();
//! ```

mod config;
mod listener;
mod position;
mod snapshot;
mod worker;

pub use config::IndexConfig;
pub use listener::{IndexEvent, IndexListener};
pub use position::{build_positions, Filter, IndexView};
pub use snapshot::Snapshot;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{info, warn};

use crate::api::FeedApi;
use crate::app::{Result, ZeitgeistError};
use crate::domain::{Item, ItemKind, TagExpression};
use worker::{IndexCommand, IndexWorker, PageDirection};

/// Handle to an item index. Cloning shares the same index.
#[derive(Clone)]
pub struct ItemIndex {
    tx: mpsc::UnboundedSender<IndexCommand>,
    view: watch::Receiver<Arc<IndexView>>,
    pending_queries: Arc<AtomicUsize>,
}

impl ItemIndex {
    /// Start the worker task, warm-started from the snapshot when one exists.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(api: Arc<dyn FeedApi>, config: &IndexConfig) -> Self {
        let snapshot = config.snapshot_path.clone().map(Snapshot::new);

        let items = match snapshot.as_ref().map(Snapshot::load) {
            Some(Ok(Some(items))) => {
                info!("Loaded {} items from snapshot", items.len());
                items
            }
            Some(Err(e)) => {
                warn!("Ignoring unreadable item snapshot: {}", e);
                Default::default()
            }
            _ => Default::default(),
        };

        let state = IndexView::new(items, config.filter());
        let (view_tx, view) = watch::channel(Arc::new(state.clone()));
        let (tx, rx) = mpsc::unbounded_channel();
        let pending_queries = Arc::new(AtomicUsize::new(0));

        let worker = IndexWorker::new(api, state, snapshot, rx, view_tx, pending_queries.clone());
        tokio::spawn(worker.run());

        Self {
            tx,
            view,
            pending_queries,
        }
    }

    fn send(&self, command: IndexCommand) -> bool {
        if self.tx.send(command).is_err() {
            warn!("Item index worker is gone");
            return false;
        }
        true
    }

    fn query(&self, direction: PageDirection) {
        self.pending_queries.fetch_add(1, Ordering::SeqCst);
        if !self.send(IndexCommand::Query(direction)) {
            self.pending_queries.fetch_sub(1, Ordering::SeqCst);
        }
    }

    async fn request<T>(&self, command: IndexCommand, reply: oneshot::Receiver<T>) -> Result<T> {
        self.tx
            .send(command)
            .map_err(|_| ZeitgeistError::WorkerClosed)?;
        reply.await.map_err(|_| ZeitgeistError::WorkerClosed)
    }

    /// Fetch the newest page for the current tag filter.
    pub fn query_first(&self) {
        self.query(PageDirection::First);
    }

    /// Fetch the page just older than the oldest cached item. Ignored while
    /// another query is outstanding.
    pub fn query_older(&self) {
        if self.is_loading() {
            return;
        }
        self.query(PageDirection::Older);
    }

    /// Fetch the page just newer than the newest cached item.
    pub fn query_newer(&self) {
        self.query(PageDirection::Newer);
    }

    /// The most recently published state.
    pub fn view(&self) -> Arc<IndexView> {
        self.view.borrow().clone()
    }

    /// Resolves once the worker has run everything queued before this call.
    pub async fn flush(&self) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.request(IndexCommand::Flush(reply), rx).await
    }

    /// Item at filtered position `pos`, 0 being the newest.
    ///
    /// # Panics
    ///
    /// Panics if `pos >= self.count()`.
    pub fn get_by_position(&self, pos: usize) -> Arc<Item> {
        self.view.borrow().get_by_position(pos)
    }

    /// Any fetched item, hidden by the filter or not.
    pub fn get_by_id(&self, id: u64) -> Option<Arc<Item>> {
        self.view.borrow().get_by_id(id)
    }

    /// Number of items passing the current filter.
    pub fn count(&self) -> usize {
        self.view.borrow().count()
    }

    /// The next newer visible item, or `id` itself at the top of the list.
    pub fn previous_id(&self, id: u64) -> u64 {
        self.view.borrow().previous_id(id)
    }

    /// The next older visible item, or `id` itself at the end of the list.
    pub fn next_id(&self, id: u64) -> u64 {
        self.view.borrow().next_id(id)
    }

    /// Whether any page query is queued or running.
    pub fn is_loading(&self) -> bool {
        self.pending_queries.load(Ordering::SeqCst) > 0
    }

    /// The last page came back empty; callers should not re-request it yet.
    pub fn is_locked_query(&self) -> bool {
        self.view.borrow().is_locked()
    }

    /// Allow the boundary that returned an empty page to be requested again.
    pub fn reset_locked_query(&self) {
        self.send(IndexCommand::ResetLockedQuery);
    }

    /// Whether items of `kind` pass the filter.
    pub fn is_kind_visible(&self, kind: ItemKind) -> bool {
        self.view.borrow().filter().is_kind_visible(kind)
    }

    /// The tag the index is restricted to, if any.
    pub fn tag_filter(&self) -> Option<String> {
        self.view.borrow().filter().tag.clone()
    }

    /// Show or hide a kind and rebuild. Audio stays hidden.
    pub fn set_kind_visible(&self, kind: ItemKind, visible: bool) {
        self.send(IndexCommand::SetKindVisible { kind, visible });
    }

    /// Restrict the index to one tag, or lift the restriction with `None`.
    /// Fetches the first page when nothing cached matches.
    pub fn set_tag_filter(&self, tag: Option<String>) {
        self.send(IndexCommand::SetTagFilter(tag));
    }

    /// Apply a tag expression like `"cats,-dogs"` and return the server's copy.
    pub async fn update_tags(&self, id: u64, expression: &str) -> Result<Arc<Item>> {
        let expression = TagExpression::parse(expression)?;
        let (reply, rx) = oneshot::channel();
        self.request(
            IndexCommand::UpdateTags {
                id,
                expression,
                reply,
            },
            rx,
        )
        .await?
    }

    /// Delete the item on the server, then drop it from the index.
    pub async fn delete_item(&self, id: u64) -> Result<()> {
        let (reply, rx) = oneshot::channel();
        self.request(IndexCommand::Delete { id, reply }, rx).await?
    }

    /// Write the authoritative set to the configured snapshot file.
    pub async fn save_snapshot(&self) -> Result<usize> {
        let (reply, rx) = oneshot::channel();
        self.request(IndexCommand::SaveSnapshot { reply }, rx).await?
    }

    /// Register a listener for index updates and query errors.
    pub fn subscribe(&self, listener: Arc<dyn IndexListener>) {
        self.send(IndexCommand::Subscribe(listener));
    }

    /// Stop the worker once the commands queued before this have run.
    pub fn shutdown(&self) {
        let _ = self.tx.send(IndexCommand::Shutdown);
    }
}
