use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::app::Result;
use crate::domain::Item;

const SNAPSHOT_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct SnapshotFile {
    version: u32,
    items: Vec<Item>,
}

/// On-disk copy of the authoritative item set, used to warm-start the index.
#[derive(Debug, Clone)]
pub struct Snapshot {
    path: PathBuf,
}

impl Snapshot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `Ok(None)` when no snapshot has been written yet.
    pub fn load(&self) -> Result<Option<BTreeMap<u64, Arc<Item>>>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = fs::read(&self.path)?;
        let file: SnapshotFile = serde_json::from_slice(&content)?;
        if file.version != SNAPSHOT_VERSION {
            tracing::warn!(
                "ignoring item snapshot with version {} at {}",
                file.version,
                self.path.display()
            );
            return Ok(None);
        }

        let items = file
            .items
            .into_iter()
            .map(|item| (item.id, Arc::new(item)))
            .collect();
        Ok(Some(items))
    }

    /// Write through a temporary file so a crash never leaves half a snapshot.
    pub fn save(&self, items: Vec<Item>) -> Result<usize> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let count = items.len();
        let file = SnapshotFile {
            version: SNAPSHOT_VERSION,
            items,
        };

        let partial = self.path.with_extension("json.part");
        fs::write(&partial, serde_json::to_vec(&file)?)?;
        fs::rename(&partial, &self.path)?;

        tracing::debug!("saved {} items to {}", count, self.path.display());
        Ok(count)
    }
}
