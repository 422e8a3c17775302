use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, watch};
use tracing::{debug, error, info, warn};

use crate::api::{list_page, FeedApi, PageRequest};
use crate::app::{Result, ZeitgeistError};
use crate::domain::{Item, ItemKind, TagExpression};
use crate::index::listener::IndexListener;
use crate::index::position::IndexView;
use crate::index::snapshot::Snapshot;

/// Which page a query asks for; the boundary is resolved when it runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PageDirection {
    First,
    Older,
    Newer,
}

/// Message type for the index worker
pub(crate) enum IndexCommand {
    Query(PageDirection),
    SetKindVisible {
        kind: ItemKind,
        visible: bool,
    },
    SetTagFilter(Option<String>),
    ResetLockedQuery,
    UpdateTags {
        id: u64,
        expression: TagExpression,
        reply: oneshot::Sender<Result<Arc<Item>>>,
    },
    Delete {
        id: u64,
        reply: oneshot::Sender<Result<()>>,
    },
    Subscribe(Arc<dyn IndexListener>),
    SaveSnapshot {
        reply: oneshot::Sender<Result<usize>>,
    },
    /// Replies once every command queued before it has run.
    Flush(oneshot::Sender<()>),
    Shutdown,
}

/// Owns the authoritative item set; the only place it is ever mutated.
pub(crate) struct IndexWorker {
    api: Arc<dyn FeedApi>,
    state: IndexView,
    listeners: Vec<Arc<dyn IndexListener>>,
    snapshot: Option<Snapshot>,
    rx: mpsc::UnboundedReceiver<IndexCommand>,
    view_tx: watch::Sender<Arc<IndexView>>,
    pending_queries: Arc<AtomicUsize>,
}

impl IndexWorker {
    pub(crate) fn new(
        api: Arc<dyn FeedApi>,
        state: IndexView,
        snapshot: Option<Snapshot>,
        rx: mpsc::UnboundedReceiver<IndexCommand>,
        view_tx: watch::Sender<Arc<IndexView>>,
        pending_queries: Arc<AtomicUsize>,
    ) -> Self {
        Self {
            api,
            state,
            listeners: Vec::new(),
            snapshot,
            rx,
            view_tx,
            pending_queries,
        }
    }

    /// Run the worker loop until shutdown or until every handle is dropped.
    pub(crate) async fn run(mut self) {
        info!("Item index worker started with {} cached items", self.state.total());

        while let Some(command) = self.rx.recv().await {
            match command {
                IndexCommand::Query(direction) => {
                    self.run_query(direction).await;
                }
                IndexCommand::SetKindVisible { kind, visible } => {
                    self.set_kind_visible(kind, visible);
                }
                IndexCommand::SetTagFilter(tag) => {
                    self.set_tag_filter(tag).await;
                }
                IndexCommand::ResetLockedQuery => {
                    self.state.locked = false;
                    self.publish();
                }
                IndexCommand::UpdateTags {
                    id,
                    expression,
                    reply,
                } => {
                    let result = self.update_tags(id, &expression).await;
                    let _ = reply.send(result);
                }
                IndexCommand::Delete { id, reply } => {
                    let result = self.delete(id).await;
                    let _ = reply.send(result);
                }
                IndexCommand::Subscribe(listener) => {
                    self.listeners.push(listener);
                }
                IndexCommand::SaveSnapshot { reply } => {
                    let _ = reply.send(self.save_snapshot().await);
                }
                IndexCommand::Flush(reply) => {
                    let _ = reply.send(());
                }
                IndexCommand::Shutdown => {
                    info!("Item index worker shutting down");
                    break;
                }
            }
        }
    }

    fn page_request(&self, direction: PageDirection) -> PageRequest {
        let boundary = match direction {
            PageDirection::First => None,
            PageDirection::Older => self.state.oldest_id().map(PageRequest::Before),
            PageDirection::Newer => self.state.newest_id().map(PageRequest::After),
        };
        boundary.unwrap_or(PageRequest::First)
    }

    /// Fetch one page and merge it. Listeners are told only after the
    /// loading count drops, so they observe `is_loading() == false`.
    async fn run_query(&mut self, direction: PageDirection) {
        let outcome = self.query(direction).await;
        self.pending_queries.fetch_sub(1, Ordering::SeqCst);

        match outcome {
            Ok(merged) => self.notify_updated(Some(&merged)),
            Err(message) => self.notify_error(&message),
        }
    }

    async fn query(&mut self, direction: PageDirection) -> std::result::Result<Vec<Arc<Item>>, String> {
        let page = self.page_request(direction);
        let tag = self.state.filter.tag.clone();
        debug!("list items {:?} (tag: {:?})", page, tag);

        match list_page(self.api.as_ref(), tag.as_deref(), page).await {
            Ok(items) => {
                info!("query returned {} items", items.len());
                if items.is_empty() {
                    self.state.locked = true;
                }
                let merged = self.merge(items);
                self.state.rebuild();
                self.publish();
                Ok(merged)
            }
            Err(e) => {
                error!("item query failed: {}", e);
                Err(e.to_string())
            }
        }
    }

    fn merge(&mut self, items: Vec<Item>) -> Vec<Arc<Item>> {
        let merged: Vec<Arc<Item>> = items.into_iter().map(Arc::new).collect();
        for item in &merged {
            self.state.items.insert(item.id, item.clone());
        }
        debug!("{} items in cache", self.state.total());
        merged
    }

    fn set_kind_visible(&mut self, kind: ItemKind, visible: bool) {
        self.state.filter.set_kind_visible(kind, visible);
        self.state.locked = false;
        self.state.rebuild();
        self.publish();
        self.notify_updated(None);
    }

    async fn set_tag_filter(&mut self, tag: Option<String>) {
        debug!("set tag filter to {:?}", tag);
        self.state.filter.tag = tag;
        self.state.rebuild();
        self.state.locked = false;
        self.publish();
        self.notify_updated(None);

        if self.state.is_empty() {
            // nothing cached for this tag yet
            self.pending_queries.fetch_add(1, Ordering::SeqCst);
            self.run_query(PageDirection::First).await;
        }
    }

    async fn update_tags(&mut self, id: u64, expression: &TagExpression) -> Result<Arc<Item>> {
        debug!("update tags of {} with {}", id, expression);
        let item = match self.api.update(id, expression).await {
            Ok(item) => Arc::new(item),
            Err(e) => {
                warn!("tag update of {} failed: {}", id, e);
                return Err(e);
            }
        };

        if self.state.items.contains_key(&id) {
            self.state.items.insert(id, item.clone());
            self.publish();
        }
        Ok(item)
    }

    async fn delete(&mut self, id: u64) -> Result<()> {
        if let Err(e) = self.api.delete(id).await {
            warn!("deleting item {} failed: {}", id, e);
            return Err(e);
        }

        info!("deleted item {}", id);
        if self.state.items.remove(&id).is_some() {
            self.state.rebuild();
            self.publish();
            self.notify_updated(None);
        }
        Ok(())
    }

    async fn save_snapshot(&self) -> Result<usize> {
        let Some(snapshot) = self.snapshot.clone() else {
            return Err(ZeitgeistError::Config(
                "No snapshot path configured".to_string(),
            ));
        };

        let items: Vec<Item> = self.state.items().map(|item| (**item).clone()).collect();
        tokio::task::spawn_blocking(move || snapshot.save(items))
            .await
            .map_err(|e| ZeitgeistError::Other(format!("snapshot task failed: {}", e)))?
    }

    fn publish(&self) {
        self.view_tx.send_replace(Arc::new(self.state.clone()));
    }

    fn notify_updated(&self, new_items: Option<&[Arc<Item>]>) {
        for listener in &self.listeners {
            listener.on_updated(new_items);
        }
    }

    fn notify_error(&self, message: &str) {
        for listener in &self.listeners {
            listener.on_error(message);
        }
    }
}
