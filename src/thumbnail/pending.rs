use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::thumbnail::Thumbnail;

/// Completion callback of a thumbnail request: `(item id, thumbnail or None)`.
pub type ThumbnailCallback = Box<dyn FnOnce(u64, Option<Thumbnail>) + Send + 'static>;

/// Callbacks waiting on an in-flight fetch, keyed by item ID.
///
/// An entry exists exactly while a fetch for that ID is running.
#[derive(Default)]
pub struct PendingFetches {
    waiting: Mutex<HashMap<u64, Vec<ThumbnailCallback>>>,
}

impl PendingFetches {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<u64, Vec<ThumbnailCallback>>> {
        self.waiting.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register interest in `id`. Returns true when the caller must start the
    /// fetch, false when one is already running and the callback was queued.
    pub fn register(&self, id: u64, callback: Option<ThumbnailCallback>) -> bool {
        match self.lock().entry(id) {
            Entry::Occupied(mut entry) => {
                entry.get_mut().extend(callback);
                false
            }
            Entry::Vacant(entry) => {
                entry.insert(callback.into_iter().collect());
                true
            }
        }
    }

    /// Remove the entry for `id` and call its waiters in registration order.
    /// Returns the number of callbacks invoked.
    ///
    /// A panicking callback is logged and does not keep the others from running.
    pub fn complete(&self, id: u64, thumbnail: Option<Thumbnail>) -> usize {
        let callbacks = self.lock().remove(&id).unwrap_or_default();
        let count = callbacks.len();
        for callback in callbacks {
            let thumbnail = thumbnail.clone();
            if panic::catch_unwind(AssertUnwindSafe(|| callback(id, thumbnail))).is_err() {
                tracing::error!("thumbnail callback for {} panicked", id);
            }
        }
        count
    }

    pub fn is_pending(&self, id: u64) -> bool {
        self.lock().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
