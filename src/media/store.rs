//! Media store implementations.

use super::MediaStore;
use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use uuid::Uuid;

const COLLABORATOR: &str = "media store";

/// Stores files under a directory with random names.
///
/// Names are v4 UUIDs, so concurrent parses writing into the same
/// directory never collide.
#[derive(Debug, Clone)]
pub struct FsMediaStore {
    root: PathBuf,
    url_prefix: String,
}

impl FsMediaStore {
    /// Store files in `root`; references look like `/media/<uuid>.<ext>`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            url_prefix: "/media".to_string(),
        }
    }

    /// Set the prefix of returned references.
    pub fn with_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefix = prefix.into();
        self
    }

    /// Directory files are written to.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl MediaStore for FsMediaStore {
    fn store(&self, data: &[u8], suggested_name: &str) -> Result<String> {
        let ext = Path::new(suggested_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("bin");
        let name = format!("{}.{}", Uuid::new_v4(), ext);

        fs::create_dir_all(&self.root)
            .and_then(|_| fs::write(self.root.join(&name), data))
            .map_err(|e| Error::collaborator(COLLABORATOR, format!("{}: {}", name, e)))?;

        Ok(format!("{}/{}", self.url_prefix.trim_end_matches('/'), name))
    }
}

/// Keeps stored media in memory. Used by default and in tests.
#[derive(Debug, Default)]
pub struct MemoryMediaStore {
    items: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.items.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Data stored under a reference.
    pub fn get(&self, url: &str) -> Option<Vec<u8>> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|(u, _)| u == url)
            .map(|(_, data)| data.clone())
    }

    /// All references in storage order.
    pub fn urls(&self) -> Vec<String> {
        self.items
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(u, _)| u.clone())
            .collect()
    }
}

impl MediaStore for MemoryMediaStore {
    fn store(&self, data: &[u8], suggested_name: &str) -> Result<String> {
        let mut items = self.items.lock().unwrap_or_else(PoisonError::into_inner);
        let url = format!("memory://{}/{}", items.len() + 1, suggested_name);
        items.push((url.clone(), data.to_vec()));
        Ok(url)
    }
}
