//! Attachment storage interface and filesystem implementation.
//!
//! Attachments live under `{collection}/{record-id}/{opaque-unique-name}`.
//! The per-record prefix is load-bearing: deleting a record enumerates and
//! purges everything under its prefix, so nothing else may write outside
//! that layout.

mod storage;

pub use storage::FsAttachmentStore;

use crate::error::Result;
use crate::types::RecordId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

/// Opaque reference to one stored attachment.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentRef(pub String);

impl AttachmentRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttachmentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// External binary storage consumed by the core.
///
/// `delete` is idempotent: removing a reference that is already gone
/// succeeds. Failures are `TransientIo` and safe to retry.
pub trait AttachmentStore: Send + Sync {
    /// Store bytes at a path, returning the reference.
    fn put(&self, path: &str, bytes: &[u8]) -> Result<AttachmentRef>;

    /// Fetch the bytes behind a reference, or `None` if it is gone.
    fn get(&self, reference: &AttachmentRef) -> Result<Option<Vec<u8>>>;

    /// List every attachment under a path prefix.
    fn list(&self, prefix: &str) -> Result<Vec<AttachmentRef>>;

    /// Remove one attachment.
    fn delete(&self, reference: &AttachmentRef) -> Result<()>;
}

/// The canonical storage path for a record's attachment.
pub fn attachment_path(collection: &str, id: RecordId, name: &str) -> String {
    format!("{}/{}/{}", collection, id, name)
}

/// The per-record prefix that `delete(record)` purges.
pub fn attachment_prefix(collection: &str, id: RecordId) -> String {
    format!("{}/{}", collection, id)
}

/// Derive an opaque unique name for an upload: a content-hash prefix plus the
/// sanitized original filename.
pub fn unique_name(bytes: &[u8], original: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let digest = hex::encode(hasher.finalize());
    let safe = original.replace(['/', '\\'], "_");
    format!("{}-{}", &digest[..16], safe)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        assert_eq!(
            attachment_path("tasks", RecordId(7), "a.png"),
            "tasks/7/a.png"
        );
        assert_eq!(attachment_prefix("tasks", RecordId(7)), "tasks/7");
    }

    #[test]
    fn test_unique_name_depends_on_content() {
        let a = unique_name(b"one", "photo.png");
        let b = unique_name(b"two", "photo.png");
        assert_ne!(a, b);
        assert!(a.ends_with("-photo.png"));
    }

    #[test]
    fn test_unique_name_sanitizes_separators() {
        let name = unique_name(b"x", "../escape.png");
        assert!(!name.contains('/'));
    }
}
