//! Documents on the local filesystem, laid out as `root/<bucket>/<path>`.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use monalisa_storage::{BlobError, BlobStore};

pub struct FsBlobStore {
    root: PathBuf,
    public_base_url: Option<String>,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_base_url: Option<String>) -> Self {
        FsBlobStore {
            root: root.into(),
            public_base_url,
        }
    }

    /// Only plain relative segments are accepted, so an object can never
    /// land outside its bucket.
    fn object_path(&self, bucket: &str, path: &str) -> Result<PathBuf, BlobError> {
        let relative = Path::new(bucket).join(path);
        let plain = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !plain || bucket.is_empty() || path.is_empty() {
            return Err(BlobError::Rejected {
                path: path.to_string(),
                message: "object path must be a plain relative path".to_string(),
            });
        }
        Ok(self.root.join(relative))
    }
}

fn backend(e: std::io::Error) -> BlobError {
    BlobError::Backend(e.to_string())
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>) -> Result<String, BlobError> {
        let target = self.object_path(bucket, path)?;
        if let Some(dir) = target.parent() {
            tokio::fs::create_dir_all(dir).await.map_err(backend)?;
        }

        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(BlobError::AlreadyExists {
                    bucket: bucket.to_string(),
                    path: path.to_string(),
                })
            }
            Err(e) => return Err(backend(e)),
        };
        file.write_all(&bytes).await.map_err(backend)?;
        file.flush().await.map_err(backend)?;
        Ok(path.to_string())
    }

    async fn resolve_url(&self, bucket: &str, path: &str) -> Result<String, BlobError> {
        let target = self.object_path(bucket, path)?;
        if !tokio::fs::try_exists(&target).await.map_err(backend)? {
            return Err(BlobError::NotFound {
                bucket: bucket.to_string(),
                path: path.to_string(),
            });
        }

        match &self.public_base_url {
            Some(base) => Ok(format!("{}/{}/{}", base.trim_end_matches('/'), bucket, path)),
            None => {
                let absolute = std::path::absolute(&target).map_err(backend)?;
                Ok(format!("file://{}", absolute.display()))
            }
        }
    }
}
