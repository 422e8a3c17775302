use std::sync::Arc;

use tokio::sync::mpsc;

use crate::domain::Item;

/// Receives index notifications.
///
/// Callbacks run on the index worker task. Implementations must return
/// quickly and forward to their own context for anything heavier.
pub trait IndexListener: Send + Sync {
    /// The position index changed. `new_items` holds the merged page after a
    /// query and is `None` after a filter change or deletion.
    fn on_updated(&self, new_items: Option<&[Arc<Item>]>);

    /// A page query failed; the index is unchanged.
    fn on_error(&self, message: &str);
}

/// Notification forwarded through a channel.
#[derive(Debug, Clone)]
pub enum IndexEvent {
    Updated(Option<Vec<Arc<Item>>>),
    Error(String),
}

impl IndexListener for mpsc::UnboundedSender<IndexEvent> {
    fn on_updated(&self, new_items: Option<&[Arc<Item>]>) {
        let _ = self.send(IndexEvent::Updated(new_items.map(<[_]>::to_vec)));
    }

    fn on_error(&self, message: &str) {
        let _ = self.send(IndexEvent::Error(message.to_string()));
    }
}
