#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use chrono::{DateTime, TimeZone, Utc};
use docgen_service::clock::{Clock, FixedClock};
use docgen_service::config::{
    ConflictPolicy, DocgenConfig, DocumentsConfig, ObservabilityConfig, StorageBackend,
    StorageConfig,
};
use docgen_service::services::{MemoryStorage, Storage};
use docgen_service::{build_router, AppState};
use http_body_util::BodyExt;
use service_core::config::Config as CoreConfig;
use service_core::error::AppError;
use std::io::{Cursor, Read};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tower::util::ServiceExt;

pub const FIXED_TS: i64 = 1_721_692_800;

/// Advances by one second on every call.
pub struct SteppingClock(AtomicI64);

impl SteppingClock {
    pub fn starting_at(secs: i64) -> Self {
        Self(AtomicI64::new(secs))
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> DateTime<Utc> {
        let secs = self.0.fetch_add(1, Ordering::SeqCst);
        Utc.timestamp_opt(secs, 0).unwrap()
    }
}

/// Accepts reads but fails every write, like a full disk.
pub struct FailingStorage;

#[async_trait::async_trait]
impl Storage for FailingStorage {
    async fn put(&self, _key: &str, _data: Vec<u8>) -> Result<(), AppError> {
        Err(std::io::Error::other("disk full").into())
    }

    async fn put_new(&self, _key: &str, _data: Vec<u8>) -> Result<(), AppError> {
        Err(std::io::Error::other("disk full").into())
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, AppError> {
        Err(AppError::NotFound(anyhow::anyhow!("File {} not found", key)))
    }

    async fn exists(&self, _key: &str) -> Result<bool, AppError> {
        Ok(false)
    }

    async fn delete(&self, _key: &str) -> Result<(), AppError> {
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>, AppError> {
        Ok(Vec::new())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

/// Router over any storage backend, clock pinned at `FIXED_TS`.
pub fn router_with_storage(on_conflict: ConflictPolicy, storage: Arc<dyn Storage>) -> Router {
    build_router(AppState {
        config: test_config(StorageBackend::Memory, "unused", on_conflict),
        storage,
        clock: Arc::new(FixedClock::from_timestamp(FIXED_TS).unwrap()),
    })
}

pub fn test_config(backend: StorageBackend, public_path: &str, on_conflict: ConflictPolicy) -> DocgenConfig {
    DocgenConfig {
        common: CoreConfig {
            port: 0,
            host: "127.0.0.1".to_string(),
        },
        storage: StorageConfig {
            backend,
            public_path: public_path.to_string(),
        },
        documents: DocumentsConfig { on_conflict },
        observability: ObservabilityConfig {
            log_level: "error".to_string(),
            otlp_endpoint: None,
        },
    }
}

pub struct TestApp {
    pub router: Router,
    pub storage: Arc<MemoryStorage>,
}

impl TestApp {
    /// Router over in-memory storage with the clock pinned at `FIXED_TS`.
    pub fn new(on_conflict: ConflictPolicy) -> Self {
        let clock = FixedClock::from_timestamp(FIXED_TS).unwrap();
        Self::with_clock(on_conflict, Arc::new(clock))
    }

    pub fn with_clock(on_conflict: ConflictPolicy, clock: Arc<dyn Clock>) -> Self {
        let storage = Arc::new(MemoryStorage::new());
        let state = AppState {
            config: test_config(StorageBackend::Memory, "unused", on_conflict),
            storage: storage.clone(),
            clock,
        };
        Self {
            router: build_router(state),
            storage,
        }
    }

    pub async fn post_form(&self, body: &str) -> Response<Body> {
        self.send(
            Request::builder()
                .method("POST")
                .uri("/generate")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn post_json(&self, body: &str) -> Response<Body> {
        self.send(
            Request::builder()
                .method("POST")
                .uri("/generate")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    pub async fn get(&self, uri: &str) -> Response<Body> {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn stored_files(&self) -> Vec<String> {
        self.storage.list().await.unwrap()
    }
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub fn content_disposition(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .expect("Missing content-disposition header")
        .to_str()
        .unwrap()
        .to_string()
}

/// Contents of `word/document.xml` inside a .docx archive.
pub fn document_xml(docx: &[u8]) -> String {
    let mut archive = zip::ZipArchive::new(Cursor::new(docx)).expect("Not a zip archive");
    let mut file = archive
        .by_name("word/document.xml")
        .expect("Missing word/document.xml");
    let mut xml = String::new();
    file.read_to_string(&mut xml).unwrap();
    xml
}

/// Text of every `<w:p>` paragraph whose XML contains `needle`.
pub fn paragraphs_containing(xml: &str, needle: &str) -> Vec<String> {
    xml.split("<w:p>")
        .flat_map(|chunk| chunk.split("<w:p "))
        .filter(|p| p.contains(needle))
        .map(|p| p.to_string())
        .collect()
}
