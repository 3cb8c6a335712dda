#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, StatusCode, header},
};
use bytes::Bytes;
use media_catalog::{
    db,
    models::object::Object,
    services::{
        blob_store::{BlobReader, BlobStore, LocalBlobStore, StorageError, StorageResult},
        catalog_store::SqliteCatalog,
        media_catalog::Buckets,
    },
    state::AppState,
};
use serde_json::Value;
use sqlx::SqlitePool;
use std::{
    io,
    pin::Pin,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    task::{Context, Poll},
    time::Duration,
};
use tempfile::TempDir;
use tokio::{
    io::{AsyncRead, AsyncReadExt, ReadBuf},
    task::JoinHandle,
};
use tower::ServiceExt;

pub use media_catalog::services::duration::wav_fixture;

pub const PUBLIC_BASE_URL: &str = "http://localhost:3000/objects";
pub const BOUNDARY: &str = "media-catalog-test-boundary";

/// Blob store that counts writes before delegating to the local store.
pub struct CountingBlobs {
    inner: LocalBlobStore,
    puts: AtomicUsize,
}

impl CountingBlobs {
    pub fn puts(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStore for CountingBlobs {
    async fn ensure_bucket(&self, bucket: &str) -> StorageResult<()> {
        self.inner.ensure_bucket(bucket).await
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        content_type: Option<String>,
        body: Bytes,
    ) -> StorageResult<Object> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        self.inner.put(bucket, key, content_type, body).await
    }

    async fn head(&self, bucket: &str, key: &str) -> StorageResult<Object> {
        self.inner.head(bucket, key).await
    }

    async fn read_range(
        &self,
        bucket: &str,
        key: &str,
        start: u64,
        len: u64,
    ) -> StorageResult<BlobReader> {
        self.inner.read_range(bucket, key, start, len).await
    }

    async fn list(&self, bucket: &str) -> StorageResult<Vec<String>> {
        self.inner.list(bucket).await
    }

    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        self.inner.delete(bucket, key).await
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        self.inner.public_url(bucket, key)
    }

    async fn probe(&self) -> StorageResult<()> {
        self.inner.probe().await
    }
}

/// Local blob store with switchable failures.
pub struct FaultyBlobs {
    inner: LocalBlobStore,
    puts: AtomicUsize,
    /// Puts numbered from 1; this one and every later put fails.
    fail_put_from: AtomicUsize,
    fail_reads: AtomicBool,
    stall_reads: AtomicBool,
}

impl FaultyBlobs {
    pub fn new(inner: LocalBlobStore) -> Self {
        Self {
            inner,
            puts: AtomicUsize::new(0),
            fail_put_from: AtomicUsize::new(usize::MAX),
            fail_reads: AtomicBool::new(false),
            stall_reads: AtomicBool::new(false),
        }
    }

    /// Let `ok` more puts through, then fail every put.
    pub fn fail_puts_after(&self, ok: usize) {
        let done = self.puts.load(Ordering::SeqCst);
        self.fail_put_from.store(done + ok + 1, Ordering::SeqCst);
    }

    pub fn heal_puts(&self) {
        self.fail_put_from.store(usize::MAX, Ordering::SeqCst);
    }

    /// Fail `head` and `read_range`, so no stream can be opened.
    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    /// Serve the first few bytes of every read, then never make progress.
    pub fn stall_reads(&self) {
        self.stall_reads.store(true, Ordering::SeqCst);
    }

    fn backend_down() -> StorageError {
        StorageError::Io(io::Error::new(io::ErrorKind::ConnectionRefused, "backend down"))
    }
}

/// Reader that is never ready.
struct Stalled;

impl AsyncRead for Stalled {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        _buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Poll::Pending
    }
}

pub const STALLED_PREFIX: u64 = 4;

#[async_trait]
impl BlobStore for FaultyBlobs {
    async fn ensure_bucket(&self, bucket: &str) -> StorageResult<()> {
        self.inner.ensure_bucket(bucket).await
    }

    async fn put(
        &self,
        bucket: &str,
        key: &str,
        content_type: Option<String>,
        body: Bytes,
    ) -> StorageResult<Object> {
        let n = self.puts.fetch_add(1, Ordering::SeqCst) + 1;
        if n >= self.fail_put_from.load(Ordering::SeqCst) {
            return Err(Self::backend_down());
        }
        self.inner.put(bucket, key, content_type, body).await
    }

    async fn head(&self, bucket: &str, key: &str) -> StorageResult<Object> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::backend_down());
        }
        self.inner.head(bucket, key).await
    }

    async fn read_range(
        &self,
        bucket: &str,
        key: &str,
        start: u64,
        len: u64,
    ) -> StorageResult<BlobReader> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(Self::backend_down());
        }
        let reader = self.inner.read_range(bucket, key, start, len).await?;
        if self.stall_reads.load(Ordering::SeqCst) {
            return Ok(Box::pin(reader.take(STALLED_PREFIX).chain(Stalled)));
        }
        Ok(reader)
    }

    async fn list(&self, bucket: &str) -> StorageResult<Vec<String>> {
        self.inner.list(bucket).await
    }

    async fn delete(&self, bucket: &str, key: &str) -> StorageResult<()> {
        self.inner.delete(bucket, key).await
    }

    fn public_url(&self, bucket: &str, key: &str) -> String {
        self.inner.public_url(bucket, key)
    }

    async fn probe(&self) -> StorageResult<()> {
        self.inner.probe().await
    }
}

pub struct TestApp<B = CountingBlobs> {
    pub router: Router,
    pub state: AppState,
    pub blobs: Arc<B>,
    _dir: TempDir,
}

async fn build_app<B: BlobStore + 'static>(
    pool: SqlitePool,
    dir: TempDir,
    make_blobs: impl FnOnce(LocalBlobStore) -> B,
    chunk_timeout: Duration,
) -> TestApp<B> {
    let blobs = Arc::new(make_blobs(LocalBlobStore::new(
        pool.clone(),
        dir.path().join("objects"),
        PUBLIC_BASE_URL,
    )));
    let state = AppState::new(
        Arc::new(SqliteCatalog::new(pool)),
        blobs.clone(),
        Buckets {
            audio: "musicapp".into(),
            images: "imagesmusicapp".into(),
        },
        chunk_timeout,
    );
    state.bootstrap().await.unwrap();
    TestApp {
        router: media_catalog::app(state.clone(), 16 * 1024 * 1024),
        state,
        blobs,
        _dir: dir,
    }
}

fn counting(inner: LocalBlobStore) -> CountingBlobs {
    CountingBlobs {
        inner,
        puts: AtomicUsize::new(0),
    }
}

/// App over a single-connection in-memory catalog.
pub async fn spawn_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let pool = db::connect_in_memory().await.unwrap();
    build_app(pool, dir, counting, Duration::from_secs(5)).await
}

/// App over a file-backed WAL catalog with several connections, so
/// concurrent requests really overlap in SQLite.
pub async fn spawn_pooled_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("catalog.db").display());
    let pool = db::connect(&url, 5).await.unwrap();
    db::run_migrations(&pool).await.unwrap();
    build_app(pool, dir, counting, Duration::from_secs(5)).await
}

/// App whose blob store fails on demand. Stalled reads give up after
/// `chunk_timeout`.
pub async fn spawn_faulty_app(chunk_timeout: Duration) -> TestApp<FaultyBlobs> {
    let dir = tempfile::tempdir().unwrap();
    let pool = db::connect_in_memory().await.unwrap();
    build_app(pool, dir, FaultyBlobs::new, chunk_timeout).await
}

impl<B> TestApp<B> {
    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(req).await.unwrap()
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::get(uri).body(Body::empty()).unwrap()).await
    }

    pub async fn request(&self, method: &str, uri: &str) -> Response<Body> {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }

    /// Send a bodyless request on its own task, so requests run in
    /// parallel on a multi-threaded runtime.
    pub fn spawn_request(&self, method: &str, uri: &str) -> JoinHandle<Response<Body>> {
        let router = self.router.clone();
        let req = Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        tokio::spawn(async move { router.oneshot(req).await.unwrap() })
    }

    pub async fn json(&self, method: &str, uri: &str, body: Value) -> Response<Body> {
        self.send(
            Request::builder()
                .method(method)
                .uri(uri)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn multipart(&self, uri: &str, form: Multipart) -> Response<Body> {
        self.send(
            Request::post(uri)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={}", BOUNDARY),
                )
                .body(Body::from(form.finish()))
                .unwrap(),
        )
        .await
    }

    /// Log a user in and return their id.
    pub async fn login(&self, name: &str) -> String {
        let resp = self
            .json(
                "POST",
                "/users/login",
                serde_json::json!({ "name": name, "email": format!("{}@example.com", name) }),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        body_json(resp).await["id"].as_str().unwrap().to_string()
    }

    /// Create an empty playlist owned by `owner` and return its id.
    pub async fn empty_playlist(&self, owner: &str, name: &str) -> String {
        let resp = self
            .json(
                "POST",
                &format!("/users/{}/playlists", owner),
                serde_json::json!({ "name": name }),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        body_json(resp).await["id"].as_str().unwrap().to_string()
    }

    /// Upload a song through the API and return its JSON.
    pub async fn upload_song(&self, file_name: &str, title: &str, genre: &str) -> Value {
        let form = Multipart::new()
            .text("title", title)
            .text("artist", "Test Artist")
            .text("genre", genre)
            .file("file", file_name, "audio/wav", wav_fixture(1))
            .file("photo", "cover.jpg", "image/jpeg", b"jpeg".to_vec());
        let resp = self.multipart("/songs", form).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        body_json(resp).await
    }
}

pub async fn body_bytes(resp: Response<Body>) -> Bytes {
    to_bytes(resp.into_body(), usize::MAX).await.unwrap()
}

pub async fn body_text(resp: Response<Body>) -> String {
    String::from_utf8(body_bytes(resp).await.to_vec()).unwrap()
}

pub async fn body_json(resp: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(resp).await).unwrap()
}

/// Hand-built `multipart/form-data` body.
#[derive(Default)]
pub struct Multipart {
    body: Vec<u8>,
}

impl Multipart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                BOUNDARY, name, value
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, file_name: &str, content_type: &str, bytes: Vec<u8>) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                BOUNDARY, name, file_name, content_type
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(&bytes);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    pub fn finish(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
        self.body
    }
}
