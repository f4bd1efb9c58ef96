//! Object storage for product and category images.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tokio::fs;

pub const PRODUCT_IMAGES_BUCKET: &str = "product_images";
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("invalid object name {0:?}")]
    InvalidName(String),

    #[error("object too large: {size} bytes (limit {limit})")]
    TooLarge { size: usize, limit: usize },

    #[error("storage io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Minimal bucket interface: store bytes under a name, resolve a name to a fetchable URL.
#[allow(async_fn_in_trait)]
pub trait ObjectStorage: Send + Sync {
    async fn put(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError>;

    async fn remove(&self, name: &str) -> Result<(), StorageError>;

    fn public_url(&self, name: &str) -> String;
}

/// Bucket kept on the local filesystem and served statically under `/storage/<bucket>/`.
#[derive(Debug, Clone)]
pub struct LocalObjectStorage {
    root: PathBuf,
    bucket: String,
    public_base_url: String,
    max_bytes: usize,
}

impl LocalObjectStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            bucket: PRODUCT_IMAGES_BUCKET.to_string(),
            public_base_url: public_base_url.into().trim_end_matches('/').to_string(),
            max_bytes: MAX_IMAGE_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Creates the bucket directory if it is missing.
    pub async fn ensure_bucket(&self) -> Result<(), StorageError> {
        fs::create_dir_all(self.bucket_dir()).await?;
        Ok(())
    }

    fn bucket_dir(&self) -> PathBuf {
        self.root.join(&self.bucket)
    }

    fn object_path(&self, name: &str) -> Result<PathBuf, StorageError> {
        if !is_valid_object_name(name) {
            return Err(StorageError::InvalidName(name.to_string()));
        }
        Ok(self.bucket_dir().join(name))
    }
}

fn is_valid_object_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

impl ObjectStorage for LocalObjectStorage {
    async fn put(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        if bytes.len() > self.max_bytes {
            return Err(StorageError::TooLarge {
                size: bytes.len(),
                limit: self.max_bytes,
            });
        }
        let path = self.object_path(name)?;
        self.ensure_bucket().await?;
        fs::write(path, bytes).await?;
        Ok(())
    }

    async fn remove(&self, name: &str) -> Result<(), StorageError> {
        match fs::remove_file(self.object_path(name)?).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    fn public_url(&self, name: &str) -> String {
        format!(
            "{}/storage/{}/{}",
            self.public_base_url,
            self.bucket,
            urlencoding::encode(name)
        )
    }
}

/// Recovers the object name from a public URL: its last path segment, percent-decoded.
pub fn object_name_from_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next()?;
    let last = path.rsplit('/').next().filter(|s| !s.is_empty())?;
    let name = urlencoding::decode(last).ok()?.into_owned();
    is_valid_object_name(&name).then_some(name)
}

/// Builds `<prefix><unix-millis>.<ext>` from an uploaded file name.
pub fn object_name_for_upload(prefix: &str, original_name: &str, millis: i64) -> String {
    let ext = Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| "bin".to_string());
    format!("{prefix}{millis}.{ext}")
}
