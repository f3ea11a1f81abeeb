//! Durable storage for generated documents.
//!
//! Objects are addressed by flat keys (plain file names). Every backend
//! guarantees that a failed write leaves no partially written object behind.

use async_trait::async_trait;
use dashmap::{mapref::entry::Entry, DashMap};
use service_core::error::AppError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

#[async_trait]
pub trait Storage: Send + Sync {
    /// Create or replace the object at `key`.
    async fn put(&self, key: &str, data: Vec<u8>) -> Result<(), AppError>;
    /// Create the object at `key`, failing with `Conflict` if it already exists.
    async fn put_new(&self, key: &str, data: Vec<u8>) -> Result<(), AppError>;
    async fn get(&self, key: &str) -> Result<Vec<u8>, AppError>;
    async fn exists(&self, key: &str) -> Result<bool, AppError>;
    async fn delete(&self, key: &str) -> Result<(), AppError>;
    /// All stored keys in ascending order.
    async fn list(&self) -> Result<Vec<String>, AppError>;
    async fn health_check(&self) -> Result<(), AppError>;
}

fn validate_key(key: &str) -> Result<(), AppError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && !key.contains(['/', '\\', '\0']);
    if valid {
        Ok(())
    } else {
        Err(AppError::BadRequest(anyhow::anyhow!(
            "Invalid storage key: {:?}",
            key
        )))
    }
}

fn conflict(key: &str) -> AppError {
    AppError::Conflict(anyhow::anyhow!("File {} already exists", key))
}

/// Filesystem-backed storage rooted at a single directory.
///
/// Writes land in a hidden `.<key>.<uuid>.part` staging file first and are
/// committed with a rename (`put`) or a hard link (`put_new`). Staging files
/// are removed whether or not the commit succeeds.
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub async fn new(base_path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let base_path = base_path.into();
        if !base_path.exists() {
            fs::create_dir_all(&base_path).await?;
        }
        Ok(Self { base_path })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn object_path(&self, key: &str) -> Result<PathBuf, AppError> {
        validate_key(key)?;
        Ok(self.base_path.join(key))
    }

    async fn stage(&self, key: &str, data: &[u8]) -> Result<PathBuf, AppError> {
        let staging = self
            .base_path
            .join(format!(".{}.{}.part", key, Uuid::new_v4()));
        if let Err(e) = fs::write(&staging, data).await {
            discard(&staging).await;
            return Err(e.into());
        }
        Ok(staging)
    }
}

async fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != ErrorKind::NotFound {
            tracing::warn!(path = %path.display(), error = %e, "Failed to remove staging file");
        }
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn put(&self, key: &str, data: Vec<u8>) -> Result<(), AppError> {
        let path = self.object_path(key)?;
        let staging = self.stage(key, &data).await?;
        let committed = fs::rename(&staging, &path).await;
        if committed.is_err() {
            discard(&staging).await;
        }
        committed?;
        Ok(())
    }

    async fn put_new(&self, key: &str, data: Vec<u8>) -> Result<(), AppError> {
        let path = self.object_path(key)?;
        let staging = self.stage(key, &data).await?;
        let committed = fs::hard_link(&staging, &path).await;
        discard(&staging).await;
        match committed {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(conflict(key)),
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, AppError> {
        let path = self.object_path(key)?;
        match fs::read(path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(AppError::NotFound(
                anyhow::anyhow!("File {} not found", key),
            )),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool, AppError> {
        let path = self.object_path(key)?;
        Ok(fs::try_exists(path).await?)
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        let path = self.object_path(key)?;
        match fs::remove_file(path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self) -> Result<Vec<String>, AppError> {
        let mut keys = Vec::new();
        let mut entries = fs::read_dir(&self.base_path).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if !name.starts_with('.') {
                    keys.push(name.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        let metadata = fs::metadata(&self.base_path).await?;
        if metadata.is_dir() && !metadata.permissions().readonly() {
            Ok(())
        } else {
            Err(AppError::ServiceUnavailable)
        }
    }
}

/// In-process storage; contents vanish with the process. Used for tests and
/// for ephemeral deployments.
#[derive(Default)]
pub struct MemoryStorage {
    objects: DashMap<String, Vec<u8>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn put(&self, key: &str, data: Vec<u8>) -> Result<(), AppError> {
        validate_key(key)?;
        self.objects.insert(key.to_string(), data);
        Ok(())
    }

    async fn put_new(&self, key: &str, data: Vec<u8>) -> Result<(), AppError> {
        validate_key(key)?;
        match self.objects.entry(key.to_string()) {
            Entry::Occupied(_) => Err(conflict(key)),
            Entry::Vacant(slot) => {
                slot.insert(data);
                Ok(())
            }
        }
    }

    async fn get(&self, key: &str) -> Result<Vec<u8>, AppError> {
        self.objects
            .get(key)
            .map(|data| data.value().clone())
            .ok_or_else(|| AppError::NotFound(anyhow::anyhow!("File {} not found", key)))
    }

    async fn exists(&self, key: &str) -> Result<bool, AppError> {
        Ok(self.objects.contains_key(key))
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.objects.remove(key);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<String>, AppError> {
        let mut keys: Vec<String> = self.objects.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        Ok(keys)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}
