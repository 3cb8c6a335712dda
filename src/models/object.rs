//! Represents an object (file) stored in a bucket of the blob store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Metadata for a single stored blob.
///
/// An object corresponds to a stored audio or image payload, addressed by
/// `(bucket, key)`. The struct carries metadata only, never the bytes.
#[derive(Serialize, Deserialize, Clone, FromRow, Debug)]
pub struct Object {
    /// Name of the parent bucket.
    pub bucket: String,

    /// Object key (path-like identifier within the bucket).
    pub key: String,

    /// Last path segment of the key, used for `Content-Disposition`.
    pub filename: String,

    /// Content type (MIME type).
    pub content_type: Option<String>,

    /// Size in bytes.
    pub size_bytes: i64,

    /// MD5 of the payload, hex encoded.
    pub etag: Option<String>,

    /// Timestamp when object was last written.
    pub last_modified: DateTime<Utc>,
}

impl Object {
    /// Payload length as an unsigned byte count.
    pub fn len(&self) -> u64 {
        self.size_bytes.max(0) as u64
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
