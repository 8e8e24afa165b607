use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;

use super::common::{BackendError, BackendResult};
use super::{CreateOutcome, ObjectBackend, UserBackend};
use crate::key;
use crate::objects::{ObjectDownload, ObjectEntry};
use crate::users::UserRecord;

/// Sidecar metadata stored next to each blob.
#[derive(Debug, Serialize, Deserialize)]
struct ObjectMeta {
    content_type: String,
}

/// Filesystem object backend.
///
/// Blobs live under `objects/`, their content types as JSON sidecars
/// under `meta/`.
#[derive(Debug)]
pub struct LocalFsObjects {
    objects: PathBuf,
    meta: PathBuf,
}

impl LocalFsObjects {
    pub fn new(path: &Path) -> Self {
        Self {
            objects: path.join("objects"),
            meta: path.join("meta"),
        }
    }

    fn meta_path(&self, key: &str) -> PathBuf {
        self.meta.join(format!("{key}.json"))
    }
}

#[async_trait::async_trait]
impl ObjectBackend for LocalFsObjects {
    fn name(&self) -> &'static str {
        "local-fs"
    }

    async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        content: Bytes,
    ) -> BackendResult<()> {
        let blob_path = self.objects.join(key);
        if let Some(parent) = blob_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&blob_path)
            .await?;
        file.write_all(&content).await?;
        file.sync_data().await?;

        let meta_path = self.meta_path(key);
        if let Some(parent) = meta_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let meta = ObjectMeta {
            content_type: content_type.to_owned(),
        };
        let raw = serde_json::to_vec(&meta)
            .map_err(|cause| BackendError::serde("object metadata", cause))?;
        tokio::fs::write(&meta_path, raw).await?;

        Ok(())
    }

    async fn get_object(&self, key: &str) -> BackendResult<Option<ObjectDownload>> {
        let file = match OpenOptions::new()
            .read(true)
            .open(self.objects.join(key))
            .await
        {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let content_type = match tokio::fs::read(self.meta_path(key)).await {
            Ok(raw) => {
                let meta: ObjectMeta = serde_json::from_slice(&raw)
                    .map_err(|cause| BackendError::serde("object metadata", cause))?;
                meta.content_type
            }
            // A blob without its sidecar is still served, with the type
            // re-inferred from the key's extension.
            Err(err) if err.kind() == ErrorKind::NotFound => key::resolve_content_type(None, key),
            Err(err) => return Err(err.into()),
        };

        let stream = ReaderStream::new(file).boxed();
        Ok(Some(ObjectDownload {
            content_type,
            stream,
        }))
    }

    async fn list_objects(&self) -> BackendResult<Vec<ObjectEntry>> {
        let mut dir = match tokio::fs::read_dir(&self.objects).await {
            Ok(dir) => dir,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut entries = Vec::new();
        while let Some(entry) = dir.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }

            let modified = metadata.modified()?;
            entries.push(ObjectEntry {
                key: entry.file_name().to_string_lossy().into_owned(),
                size: metadata.len(),
                last_modified: DateTime::<Utc>::from(modified)
                    .to_rfc3339_opts(SecondsFormat::Millis, true),
            });
        }

        Ok(entries)
    }
}

/// Filesystem user backend keeping one JSON document per account.
///
/// The conditional create maps to `O_EXCL` file creation, which makes the
/// uniqueness check atomic without any coordination in this process.
#[derive(Debug)]
pub struct LocalFsUsers {
    path: PathBuf,
}

impl LocalFsUsers {
    pub fn new(path: &Path) -> Self {
        Self { path: path.into() }
    }

    fn record_path(&self, email: &str) -> PathBuf {
        self.path.join(format!("{email}.json"))
    }
}

#[async_trait::async_trait]
impl UserBackend for LocalFsUsers {
    fn name(&self) -> &'static str {
        "local-fs"
    }

    async fn create_user(&self, record: &UserRecord) -> BackendResult<CreateOutcome> {
        tokio::fs::create_dir_all(&self.path).await?;

        let raw = serde_json::to_vec(record)
            .map_err(|cause| BackendError::serde("user record", cause))?;

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.record_path(&record.email))
            .await
        {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {
                return Ok(CreateOutcome::AlreadyExists);
            }
            Err(err) => return Err(err.into()),
        };

        file.write_all(&raw).await?;
        file.sync_data().await?;

        Ok(CreateOutcome::Created)
    }

    async fn get_user(&self, email: &str) -> BackendResult<Option<UserRecord>> {
        let raw = match tokio::fs::read(self.record_path(email)).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        let record = serde_json::from_slice(&raw)
            .map_err(|cause| BackendError::serde("user record", cause))?;
        Ok(Some(record))
    }
}
