//! Byte-range streaming of stored audio objects.
//!
//! The object length is resolved before anything is committed to the
//! client, so every failure up to and including opening the payload is
//! reported as a plain error response. After headers are sent, a read that
//! stalls longer than the chunk timeout ends the body early.

use crate::{
    models::object::Object,
    services::blob_store::{BlobReader, BlobStore, LocalBlobStore, StorageError},
};
use bytes::Bytes;
use futures::{
    StreamExt,
    stream::{self, BoxStream},
};
use std::{io, sync::Arc, time::Duration};
use thiserror::Error;
use tokio_util::io::ReaderStream;
use tracing::warn;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("invalid storage key `{0}`")]
    InvalidKey(String),
    #[error("invalid range: {0}")]
    InvalidRange(String),
    #[error("object `{0}` not found")]
    NotFound(String),
    #[error("range not satisfiable for length {length}")]
    Unsatisfiable { length: u64 },
    #[error("storage failure: {0}")]
    Backend(StorageError),
}

impl From<StorageError> for StreamError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::ObjectNotFound { key, .. } => StreamError::NotFound(key),
            StorageError::BucketNotFound(bucket) => StreamError::NotFound(bucket),
            StorageError::InvalidObjectKey => StreamError::InvalidKey("invalid object key".into()),
            StorageError::InvalidBucketName { name, .. } => StreamError::InvalidKey(name),
            other => StreamError::Backend(other),
        }
    }
}

/// First range of a `Range: bytes=...` header, not yet checked against the
/// object length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeSpec {
    /// `start-` or `start-end`, both inclusive.
    FromTo { start: u64, end: Option<u64> },
    /// `-n`: the last `n` bytes.
    Suffix(u64),
}

impl RangeSpec {
    /// Parse a `Range` header value. Only the first range of a multi-range
    /// request is kept.
    pub fn parse(value: &str) -> Result<Self, StreamError> {
        let invalid = || StreamError::InvalidRange(value.to_string());

        let (unit, ranges) = value.trim().split_once('=').ok_or_else(invalid)?;
        if !unit.trim().eq_ignore_ascii_case("bytes") {
            return Err(invalid());
        }
        let first = ranges.split(',').next().unwrap_or("").trim();
        let (start, end) = first.split_once('-').ok_or_else(invalid)?;
        let (start, end) = (start.trim(), end.trim());

        let number = |s: &str| s.parse::<u64>().map_err(|_| invalid());
        match (start.is_empty(), end.is_empty()) {
            (true, true) => Err(invalid()),
            (true, false) => Ok(RangeSpec::Suffix(number(end)?)),
            (false, true) => Ok(RangeSpec::FromTo {
                start: number(start)?,
                end: None,
            }),
            (false, false) => {
                let (start, end) = (number(start)?, number(end)?);
                if start > end {
                    return Err(invalid());
                }
                Ok(RangeSpec::FromTo {
                    start,
                    end: Some(end),
                })
            }
        }
    }

    /// Inclusive `(start, end)` within an object of `length` bytes.
    ///
    /// Requires `start <= end < length`; an omitted end means `length - 1`.
    /// A suffix longer than the object selects the whole object.
    pub fn resolve(self, length: u64) -> Result<(u64, u64), StreamError> {
        let unsatisfiable = StreamError::Unsatisfiable { length };
        if length == 0 {
            return Err(unsatisfiable);
        }
        match self {
            RangeSpec::FromTo { start, end } => {
                let end = end.unwrap_or(length - 1);
                if start > end || end >= length {
                    return Err(unsatisfiable);
                }
                Ok((start, end))
            }
            RangeSpec::Suffix(0) => Err(unsatisfiable),
            RangeSpec::Suffix(n) => Ok((length.saturating_sub(n), length - 1)),
        }
    }
}

/// A resolved, ready-to-send media body.
pub struct MediaStream {
    pub object: Object,
    /// Inclusive byte range when the client asked for one.
    pub range: Option<(u64, u64)>,
    pub body: BoxStream<'static, io::Result<Bytes>>,
}

impl MediaStream {
    /// Number of bytes the body will yield.
    pub fn content_length(&self) -> u64 {
        match self.range {
            Some((start, end)) => end - start + 1,
            None => self.object.len(),
        }
    }

    /// `bytes start-end/length` for partial responses.
    pub fn content_range(&self) -> Option<String> {
        self.range
            .map(|(start, end)| format!("bytes {}-{}/{}", start, end, self.object.len()))
    }
}

/// Read-only streaming front of the blob store.
#[derive(Clone)]
pub struct RangeStreamer {
    blobs: Arc<dyn BlobStore>,
    chunk_timeout: Duration,
}

impl RangeStreamer {
    pub fn new(blobs: Arc<dyn BlobStore>, chunk_timeout: Duration) -> Self {
        Self {
            blobs,
            chunk_timeout,
        }
    }

    /// Turn a raw storage key into an object key of `bucket`.
    ///
    /// Accepts the bare key, a path with a leading `/`, or a path or public
    /// URL that still contains the `/{bucket}/` segment.
    pub fn resolve_key(raw: &str, bucket: &str) -> Result<String, StreamError> {
        let marker = format!("/{}/", bucket);
        let key = match raw.rfind(&marker) {
            Some(pos) => &raw[pos + marker.len()..],
            None => {
                let trimmed = raw.trim_start_matches('/');
                trimmed
                    .strip_prefix(&marker[1..])
                    .unwrap_or(trimmed)
            }
        };
        LocalBlobStore::ensure_key_safe(key).map_err(|_| StreamError::InvalidKey(raw.to_string()))?;
        Ok(key.to_string())
    }

    /// Resolve length, validate the requested range, and open the payload.
    pub async fn open(
        &self,
        bucket: &str,
        key: &str,
        range_header: Option<&str>,
    ) -> Result<MediaStream, StreamError> {
        let spec = range_header.map(RangeSpec::parse).transpose()?;

        let object = self.blobs.head(bucket, key).await?;
        let length = object.len();

        let range = spec.map(|spec| spec.resolve(length)).transpose()?;
        let (start, len) = match range {
            Some((start, end)) => (start, end - start + 1),
            None => (0, length),
        };

        let reader = self.blobs.read_range(bucket, key, start, len).await?;
        let body = timed_chunks(reader, self.chunk_timeout, key.to_string()).boxed();

        Ok(MediaStream {
            object,
            range,
            body,
        })
    }
}

/// Chunk the reader, ending the stream with a `TimedOut` error when a single
/// chunk takes longer than `timeout`.
fn timed_chunks(
    reader: BlobReader,
    timeout: Duration,
    key: String,
) -> impl futures::Stream<Item = io::Result<Bytes>> + Send + 'static {
    stream::unfold(Some(ReaderStream::new(reader)), move |state| {
        let key = key.clone();
        async move {
            let mut chunks = state?;
            match tokio::time::timeout(timeout, chunks.next()).await {
                Ok(Some(Ok(chunk))) => Some((Ok(chunk), Some(chunks))),
                Ok(Some(Err(err))) => {
                    warn!(key = %key, error = %err, "blob read failed mid-stream");
                    Some((Err(err), None))
                }
                Ok(None) => None,
                Err(_) => {
                    warn!(key = %key, ?timeout, "blob read stalled, aborting stream");
                    Some((
                        Err(io::Error::new(io::ErrorKind::TimedOut, "blob read timed out")),
                        None,
                    ))
                }
            }
        }
    })
}
