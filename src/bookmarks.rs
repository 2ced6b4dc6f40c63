use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::warn;

/// Bookmarked tool ids in the order they were added.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookmarkSet {
    ids: Vec<u64>,
}

impl BookmarkSet {
    pub fn from_ids(ids: Vec<u64>) -> Self {
        let mut set = Self::default();
        for id in ids {
            if !set.contains(id) {
                set.ids.push(id);
            }
        }
        set
    }

    pub fn ids(&self) -> &[u64] {
        &self.ids
    }

    pub fn contains(&self, id: u64) -> bool {
        self.ids.contains(&id)
    }

    /// Returns true when the id is bookmarked after the call.
    pub fn toggle(&mut self, id: u64) -> bool {
        if let Some(pos) = self.ids.iter().position(|existing| *existing == id) {
            self.ids.remove(pos);
            false
        } else {
            self.ids.push(id);
            true
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

/// A bookmark set backed by a single JSON file holding the id array.
#[derive(Debug)]
pub struct BookmarkStore {
    path: PathBuf,
    set: BookmarkSet,
}

impl BookmarkStore {
    pub async fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let set = match fs::read(&path).await {
            Ok(raw) => match serde_json::from_slice::<Vec<u64>>(&raw) {
                Ok(ids) => BookmarkSet::from_ids(ids),
                Err(err) => {
                    warn!(
                        "Ignoring malformed bookmark file {}: {}",
                        path.display(),
                        err
                    );
                    BookmarkSet::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => BookmarkSet::default(),
            Err(err) => {
                warn!("Failed reading bookmark file {}: {}", path.display(), err);
                BookmarkSet::default()
            }
        };
        Self { path, set }
    }

    pub fn set(&self) -> &BookmarkSet {
        &self.set
    }

    pub async fn toggle(&mut self, id: u64) -> Result<bool> {
        let bookmarked = self.set.toggle(id);
        self.persist().await?;
        Ok(bookmarked)
    }

    pub async fn clear(&mut self) -> Result<()> {
        self.set.clear();
        self.persist().await
    }

    async fn persist(&self) -> Result<()> {
        ensure_parent_dir(&self.path).await?;
        let encoded =
            serde_json::to_vec(self.set.ids()).context("Failed to encode bookmark ids")?;
        fs::write(&self.path, encoded)
            .await
            .with_context(|| format!("Failed to write bookmarks to {}", self.path.display()))
    }
}

async fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create bookmark directory {}", parent.display()))?;
    }
    Ok(())
}
