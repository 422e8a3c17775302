use std::collections::BTreeMap;
use std::sync::Arc;

use crate::domain::{Item, ItemKind};

/// Visibility rules applied when building the position index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub hide_videos: bool,
    pub hide_images: bool,
    /// Only items carrying this exact tag name.
    pub tag: Option<String>,
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            hide_videos: true,
            hide_images: false,
            tag: None,
        }
    }
}

impl Filter {
    pub fn is_kind_visible(&self, kind: ItemKind) -> bool {
        match kind {
            ItemKind::Image => !self.hide_images,
            ItemKind::Video => !self.hide_videos,
            ItemKind::Audio => false,
        }
    }

    /// Audio stays hidden whatever is asked.
    pub fn set_kind_visible(&mut self, kind: ItemKind, visible: bool) {
        match kind {
            ItemKind::Image => self.hide_images = !visible,
            ItemKind::Video => self.hide_videos = !visible,
            ItemKind::Audio => {}
        }
    }

    pub fn admits(&self, item: &Item) -> bool {
        if !self.is_kind_visible(item.kind) {
            return false;
        }
        match &self.tag {
            Some(tag) => item.has_tag(tag),
            None => true,
        }
    }
}

/// Full rebuild: surviving IDs, highest first.
pub fn build_positions(items: &BTreeMap<u64, Arc<Item>>, filter: &Filter) -> Vec<u64> {
    items
        .values()
        .rev()
        .filter(|item| filter.admits(item))
        .map(|item| item.id)
        .collect()
}

/// Immutable state of an item index at one point in time.
///
/// The worker publishes a new view after every change; readers never see a
/// position index that disagrees with its item map.
#[derive(Debug, Clone, Default)]
pub struct IndexView {
    pub(crate) items: BTreeMap<u64, Arc<Item>>,
    pub(crate) positions: Vec<u64>,
    pub(crate) filter: Filter,
    pub(crate) locked: bool,
}

impl IndexView {
    pub(crate) fn new(items: BTreeMap<u64, Arc<Item>>, filter: Filter) -> Self {
        let positions = build_positions(&items, &filter);
        Self {
            items,
            positions,
            filter,
            locked: false,
        }
    }

    pub(crate) fn rebuild(&mut self) {
        self.positions = build_positions(&self.items, &self.filter);
    }

    /// Item at filtered position `pos`, 0 being the newest.
    ///
    /// # Panics
    ///
    /// Panics if `pos >= self.count()`.
    pub fn get_by_position(&self, pos: usize) -> Arc<Item> {
        let id = self.positions[pos];
        self.items[&id].clone()
    }

    pub fn get_by_id(&self, id: u64) -> Option<Arc<Item>> {
        self.items.get(&id).cloned()
    }

    pub fn count(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Filtered IDs, newest first.
    pub fn positions(&self) -> &[u64] {
        &self.positions
    }

    /// Number of items fetched so far, filtered or not.
    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn position_of(&self, id: u64) -> Option<usize> {
        self.positions.iter().position(|&candidate| candidate == id)
    }

    /// The neighbour shown before `id` (the next newer item), or `id` itself
    /// when there is none.
    pub fn previous_id(&self, id: u64) -> u64 {
        match self.position_of(id) {
            Some(pos) if pos > 0 => self.positions[pos - 1],
            _ => id,
        }
    }

    /// The neighbour shown after `id` (the next older item), or `id` itself
    /// when there is none.
    pub fn next_id(&self, id: u64) -> u64 {
        match self.position_of(id) {
            Some(pos) => self.positions.get(pos + 1).copied().unwrap_or(id),
            None => id,
        }
    }

    pub fn filter(&self) -> &Filter {
        &self.filter
    }

    /// The last page query returned no items.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Paging cursor towards older items. Scoped to the tag while one is set.
    pub fn oldest_id(&self) -> Option<u64> {
        match &self.filter.tag {
            Some(tag) => self.items.values().find(|item| item.has_tag(tag)).map(|item| item.id),
            None => self.items.keys().next().copied(),
        }
    }

    /// Paging cursor towards newer items. Scoped to the tag while one is set.
    pub fn newest_id(&self) -> Option<u64> {
        match &self.filter.tag {
            Some(tag) => self
                .items
                .values()
                .rev()
                .find(|item| item.has_tag(tag))
                .map(|item| item.id),
            None => self.items.keys().next_back().copied(),
        }
    }

    pub fn items(&self) -> impl Iterator<Item = &Arc<Item>> {
        self.items.values()
    }
}
