use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use tokio::sync::Mutex;
use tracing::instrument;

use super::store::{ContentBackend, StoreError};

/// The content document as one JSON file on local disk.
pub struct LocalFileBackend {
    path: PathBuf,
}

impl LocalFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "content.json".to_string());
        self.path
            .with_file_name(format!(".{name}.{}.tmp", uuid::Uuid::new_v4().simple()))
    }
}

#[async_trait]
impl ContentBackend for LocalFileBackend {
    fn backend_tag(&self) -> &'static str {
        "localfs"
    }

    async fn get(&self) -> Result<Vec<u8>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(StoreError::NotFound(self.path.display().to_string()))
            }
            Err(e) => Err(StoreError::Persistence(format!(
                "read {}: {e}",
                self.path.display()
            ))),
        }
    }

    /// Writes a sibling temp file and renames it over the target, so readers
    /// never observe a half-written document.
    async fn put(&self, bytes: Vec<u8>) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| StoreError::Persistence(format!("mkdir {}: {e}", dir.display())))?;
        }
        let tmp = self.temp_path();
        if let Err(e) = tokio::fs::write(&tmp, &bytes).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StoreError::Persistence(format!("write {}: {e}", tmp.display())));
        }
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(StoreError::Persistence(format!(
                "rename into {}: {e}",
                self.path.display()
            )));
        }
        Ok(())
    }
}

/// Remote key/value blob storage reached over HTTP.
///
/// `GET {base}/{key}` reads the document and `PUT {base}/{key}` replaces it,
/// both authorized with a bearer token.
pub struct BlobBackend {
    base_url: String,
    key: String,
    token: String,
    client: reqwest::Client,
}

impl BlobBackend {
    pub fn new(base_url: &str, key: &str, token: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            key: key.trim_start_matches('/').to_string(),
            token,
            client,
        }
    }

    fn object_url(&self) -> String {
        format!("{}/{}", self.base_url, self.key)
    }

    fn auth_headers(&self) -> Result<HeaderMap, StoreError> {
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(&format!("Bearer {}", self.token))
            .map_err(|e| StoreError::Persistence(format!("invalid blob token: {e}")))?;
        headers.insert(AUTHORIZATION, value);
        Ok(headers)
    }
}

#[async_trait]
impl ContentBackend for BlobBackend {
    fn backend_tag(&self) -> &'static str {
        "blob"
    }

    #[instrument(name = "blob_get", skip(self), fields(key = %self.key))]
    async fn get(&self) -> Result<Vec<u8>, StoreError> {
        let url = self.object_url();
        let resp = self
            .client
            .get(&url)
            .headers(self.auth_headers()?)
            .send()
            .await
            .map_err(|e| StoreError::Persistence(format!("blob get {url}: {e}")))?;
        match resp.status() {
            status if status.is_success() => resp
                .bytes()
                .await
                .map(|b| b.to_vec())
                .map_err(|e| StoreError::Persistence(format!("blob body {url}: {e}"))),
            StatusCode::NOT_FOUND => Err(StoreError::NotFound(url)),
            status => Err(StoreError::Persistence(format!(
                "blob get status={status} url={url}"
            ))),
        }
    }

    #[instrument(name = "blob_put", skip(self, bytes), fields(key = %self.key, len = bytes.len()))]
    async fn put(&self, bytes: Vec<u8>) -> Result<(), StoreError> {
        let url = self.object_url();
        let resp = self
            .client
            .put(&url)
            .headers(self.auth_headers()?)
            .header(CONTENT_TYPE, "application/json")
            .body(bytes)
            .send()
            .await
            .map_err(|e| StoreError::Persistence(format!("blob put {url}: {e}")))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(StoreError::Persistence(format!(
                "blob put status={} url={url}",
                resp.status()
            )))
        }
    }
}

/// Remote primary with a local last-known-good snapshot.
///
/// Reads try the primary first and fall back to the snapshot on any failure.
/// Writes go to the primary only; the snapshot is refreshed after a
/// successful write but a refresh failure does not fail the save.
pub struct FallbackBackend {
    primary: Arc<dyn ContentBackend>,
    snapshot: Arc<dyn ContentBackend>,
}

impl FallbackBackend {
    pub fn new(primary: Arc<dyn ContentBackend>, snapshot: Arc<dyn ContentBackend>) -> Self {
        Self { primary, snapshot }
    }
}

#[async_trait]
impl ContentBackend for FallbackBackend {
    fn backend_tag(&self) -> &'static str {
        "fallback"
    }

    async fn get(&self) -> Result<Vec<u8>, StoreError> {
        match self.primary.get().await {
            Ok(bytes) => return Ok(bytes),
            Err(e) => tracing::warn!(
                primary = self.primary.backend_tag(),
                error = %e,
                "primary content store unavailable, reading snapshot"
            ),
        }
        self.snapshot.get().await.map_err(|e| {
            tracing::warn!(error = %e, "content snapshot unavailable");
            StoreError::NotFound("no content in primary store or snapshot".to_string())
        })
    }

    async fn put(&self, bytes: Vec<u8>) -> Result<(), StoreError> {
        self.primary.put(bytes.clone()).await?;
        if let Err(e) = self.snapshot.put(bytes).await {
            tracing::warn!(error = %e, "failed to refresh content snapshot");
        }
        Ok(())
    }
}

/// Keeps the document in memory. `set_unavailable(true)` makes every call
/// fail with `StoreError::Persistence`, which stands in for an unreachable
/// remote.
#[derive(Default)]
pub struct MemoryBackend {
    bytes: Mutex<Option<Vec<u8>>>,
    unavailable: AtomicBool,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bytes(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Mutex::new(Some(bytes)),
            unavailable: AtomicBool::new(false),
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(StoreError::Persistence("memory backend unavailable".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ContentBackend for MemoryBackend {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn get(&self) -> Result<Vec<u8>, StoreError> {
        self.check_available()?;
        self.bytes
            .lock()
            .await
            .clone()
            .ok_or_else(|| StoreError::NotFound("memory".to_string()))
    }

    async fn put(&self, bytes: Vec<u8>) -> Result<(), StoreError> {
        self.check_available()?;
        *self.bytes.lock().await = Some(bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use axum::extract::{Path as UrlPath, State};
    use axum::http::Method;
    use axum::routing::any;
    use axum::Router;
    use tempfile::tempdir;

    /// An HTTP blob store: `missing.json` is always 404, `broken.json`
    /// always 500, any other key is stored in memory.
    #[derive(Clone, Default)]
    struct BlobServer {
        auth: Arc<std::sync::Mutex<Vec<String>>>,
        stored: Arc<std::sync::Mutex<Option<Vec<u8>>>>,
    }

    async fn serve_blob(
        State(server): State<BlobServer>,
        UrlPath(key): UrlPath<String>,
        method: Method,
        headers: HeaderMap,
        body: Bytes,
    ) -> (StatusCode, Vec<u8>) {
        if let Some(auth) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
            server.auth.lock().unwrap().push(auth.to_string());
        }
        let mut stored = server.stored.lock().unwrap();
        match (key.as_str(), method) {
            ("missing.json", _) => (StatusCode::NOT_FOUND, Vec::new()),
            ("broken.json", _) => (StatusCode::INTERNAL_SERVER_ERROR, Vec::new()),
            (_, m) if m == Method::PUT => {
                *stored = Some(body.to_vec());
                (StatusCode::OK, Vec::new())
            }
            _ => match stored.clone() {
                Some(bytes) => (StatusCode::OK, bytes),
                None => (StatusCode::NOT_FOUND, Vec::new()),
            },
        }
    }

    async fn blob_server() -> (String, BlobServer) {
        let server = BlobServer::default();
        let app = Router::new()
            .route("/blobs/{key}", any(serve_blob))
            .with_state(server.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/blobs/"), server)
    }

    #[tokio::test]
    async fn local_file_missing_is_not_found() {
        let dir = tempdir().expect("tempdir");
        let backend = LocalFileBackend::new(dir.path().join("content.json"));
        assert!(backend.get().await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn local_file_put_creates_parents_and_leaves_no_temp() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("src/data/content.json");
        let backend = LocalFileBackend::new(&path);

        backend.put(b"{\"a\":1}".to_vec()).await.unwrap();
        backend.put(b"{\"a\":2}".to_vec()).await.unwrap();

        assert_eq!(backend.get().await.unwrap(), b"{\"a\":2}".to_vec());
        let entries: Vec<_> = std::fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn fallback_reads_snapshot_when_primary_fails() {
        let primary = Arc::new(MemoryBackend::with_bytes(b"remote".to_vec()));
        primary.set_unavailable(true);
        let snapshot = Arc::new(MemoryBackend::with_bytes(b"snapshot".to_vec()));
        let backend = FallbackBackend::new(primary, snapshot);

        assert_eq!(backend.get().await.unwrap(), b"snapshot".to_vec());
    }

    #[tokio::test]
    async fn fallback_reads_snapshot_when_primary_is_empty() {
        let primary = Arc::new(MemoryBackend::new());
        let snapshot = Arc::new(MemoryBackend::with_bytes(b"snapshot".to_vec()));
        let backend = FallbackBackend::new(primary, snapshot);

        assert_eq!(backend.get().await.unwrap(), b"snapshot".to_vec());
    }

    #[tokio::test]
    async fn fallback_with_nothing_anywhere_is_not_found() {
        let primary = Arc::new(MemoryBackend::new());
        primary.set_unavailable(true);
        let backend = FallbackBackend::new(primary, Arc::new(MemoryBackend::new()));

        assert!(backend.get().await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn fallback_write_failure_is_persistence_and_snapshot_untouched() {
        let primary = Arc::new(MemoryBackend::new());
        primary.set_unavailable(true);
        let snapshot = Arc::new(MemoryBackend::with_bytes(b"old".to_vec()));
        let backend = FallbackBackend::new(primary, snapshot.clone());

        let err = backend.put(b"new".to_vec()).await.unwrap_err();
        assert!(matches!(err, StoreError::Persistence(_)));
        assert_eq!(snapshot.get().await.unwrap(), b"old".to_vec());
    }

    #[tokio::test]
    async fn fallback_write_refreshes_snapshot() {
        let primary = Arc::new(MemoryBackend::new());
        let snapshot = Arc::new(MemoryBackend::new());
        let backend = FallbackBackend::new(primary.clone(), snapshot.clone());

        backend.put(b"doc".to_vec()).await.unwrap();
        assert_eq!(primary.get().await.unwrap(), b"doc".to_vec());
        assert_eq!(snapshot.get().await.unwrap(), b"doc".to_vec());
    }

    #[tokio::test]
    async fn local_file_rename_failure_removes_temp() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("content.json");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), b"x").unwrap();
        let backend = LocalFileBackend::new(&path);

        let err = backend.put(b"{}".to_vec()).await.unwrap_err();
        assert!(matches!(err, StoreError::Persistence(_)));
        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("content.json")]);
    }

    #[tokio::test]
    async fn blob_statuses_map_to_store_errors() {
        let (base, server) = blob_server().await;
        let token = "blob-token".to_string();

        let missing = BlobBackend::new(&base, "missing.json", token.clone());
        assert!(missing.get().await.unwrap_err().is_not_found());

        let broken = BlobBackend::new(&base, "broken.json", token.clone());
        assert!(matches!(
            broken.get().await.unwrap_err(),
            StoreError::Persistence(_)
        ));
        assert!(matches!(
            broken.put(b"{}".to_vec()).await.unwrap_err(),
            StoreError::Persistence(_)
        ));

        let content = BlobBackend::new(&base, "/content.json", token);
        assert!(content.get().await.unwrap_err().is_not_found());
        content.put(b"{\"a\":1}".to_vec()).await.unwrap();
        assert_eq!(content.get().await.unwrap(), b"{\"a\":1}".to_vec());

        let auth = server.auth.lock().unwrap().clone();
        assert_eq!(auth.len(), 6);
        assert!(auth.iter().all(|a| a == "Bearer blob-token"));
    }

    #[tokio::test]
    async fn fallback_over_unreachable_blob_uses_local_snapshot() {
        let (base, _server) = blob_server().await;
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("content.json");
        std::fs::write(&path, b"snapshot").unwrap();

        let backend = FallbackBackend::new(
            Arc::new(BlobBackend::new(&base, "broken.json", "t".into())),
            Arc::new(LocalFileBackend::new(&path)),
        );
        assert_eq!(backend.get().await.unwrap(), b"snapshot".to_vec());

        let err = backend.put(b"new".to_vec()).await.unwrap_err();
        assert!(matches!(err, StoreError::Persistence(_)));
        assert_eq!(std::fs::read(&path).unwrap(), b"snapshot".to_vec());
    }
}
