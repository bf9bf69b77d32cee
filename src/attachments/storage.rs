//! Filesystem attachment storage.

use crate::error::{Result, SyncError};
use lru::LruCache;
use parking_lot::Mutex;
use std::fs::{self, File};
use std::io::Write;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use super::{AttachmentRef, AttachmentStore};

/// Attachment storage rooted at one directory, mirroring the reference paths
/// one-to-one on disk, with an LRU cache for recently read attachments.
pub struct FsAttachmentStore {
    /// Base directory for attachments.
    root: PathBuf,

    /// LRU cache keyed by reference.
    cache: Mutex<LruCache<String, Vec<u8>>>,
}

impl FsAttachmentStore {
    /// Create attachment storage at the given root.
    pub fn new(root: impl AsRef<Path>, cache_size: usize) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)?;

        let cache_size = NonZeroUsize::new(cache_size.max(1)).unwrap();

        Ok(Self {
            root,
            cache: Mutex::new(LruCache::new(cache_size)),
        })
    }

    /// Resolve a reference path under the root, rejecting traversal.
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let mut resolved = self.root.clone();
        let mut has_component = false;
        for part in path.split('/') {
            if part.is_empty() || part == "." {
                continue;
            }
            if part == ".." {
                return Err(SyncError::Validation {
                    field: "path".to_string(),
                    reason: "attachment paths may not traverse upward".to_string(),
                });
            }
            resolved.push(part);
            has_component = true;
        }
        if !has_component {
            return Err(SyncError::Validation {
                field: "path".to_string(),
                reason: "attachment path is empty".to_string(),
            });
        }
        Ok(resolved)
    }
}

impl AttachmentStore for FsAttachmentStore {
    fn put(&self, path: &str, bytes: &[u8]) -> Result<AttachmentRef> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = File::create(&full)?;
        file.write_all(bytes)?;
        file.sync_all()?;

        let reference = AttachmentRef(path.to_string());
        self.cache
            .lock()
            .put(reference.0.clone(), bytes.to_vec());

        Ok(reference)
    }

    fn get(&self, reference: &AttachmentRef) -> Result<Option<Vec<u8>>> {
        // Check cache first
        if let Some(cached) = self.cache.lock().get(reference.as_str()).cloned() {
            return Ok(Some(cached));
        }

        let full = self.resolve(reference.as_str())?;
        if !full.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&full)?;
        self.cache
            .lock()
            .put(reference.0.clone(), bytes.clone());

        Ok(Some(bytes))
    }

    fn list(&self, prefix: &str) -> Result<Vec<AttachmentRef>> {
        let dir = self.resolve(prefix)?;
        if !dir.exists() {
            return Ok(Vec::new());
        }

        let mut references = Vec::new();
        let mut pending = vec![dir];

        while let Some(current) = pending.pop() {
            for entry in fs::read_dir(&current)? {
                let entry = entry?;
                let path = entry.path();
                if entry.file_type()?.is_dir() {
                    pending.push(path);
                } else {
                    let relative = path.strip_prefix(&self.root).map_err(|_| {
                        SyncError::TransientIo("attachment escaped the store root".to_string())
                    })?;
                    let joined = relative
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/");
                    references.push(AttachmentRef(joined));
                }
            }
        }

        references.sort();
        Ok(references)
    }

    fn delete(&self, reference: &AttachmentRef) -> Result<()> {
        self.cache.lock().pop(reference.as_str());

        let full = self.resolve(reference.as_str())?;
        if full.exists() {
            fs::remove_file(&full)?;
        }
        Ok(())
    }
}
