//! The object store service.
//!
//! [`ObjectStore`] provides durable access to uploaded blobs through a
//! configurable backend. Object keys are derived here (see [`crate::key`])
//! so that every backend stores under the same naming scheme.

use std::fmt;
use std::sync::Arc;

use bytes::Bytes;

use crate::backend::{self, BackendResult, BoxedObjectBackend, ByteStream};
use crate::key;

/// High-level asynchronous service for storing and retrieving objects.
#[derive(Clone, Debug)]
pub struct ObjectStore(Arc<ObjectStoreInner>);

#[derive(Debug)]
struct ObjectStoreInner {
    backend: BoxedObjectBackend,
}

/// Configuration to initialize an [`ObjectStore`].
pub enum ObjectStoreConfig<'a> {
    /// Use a local filesystem directory as the storage backend.
    FileSystem {
        /// The directory where blobs and their metadata are stored.
        path: &'a std::path::Path,
    },
    /// Use an S3-compatible object storage backend.
    S3Compatible {
        /// The bucket to use. Must exist before the service starts.
        bucket: &'a str,
        /// The region name of the bucket.
        region: &'a str,
        /// Optional custom endpoint, e.g. for MinIO or SeaweedFS.
        endpoint: Option<&'a str>,
        /// Static access key. Falls back to ambient credentials when unset.
        access_key: Option<&'a str>,
        /// Static secret key. Falls back to ambient credentials when unset.
        secret_key: Option<&'a str>,
        /// Use path-style addressing instead of virtual-hosted buckets.
        path_style: bool,
    },
    /// Keep objects in process memory. For tests and local development.
    Memory,
}

impl fmt::Debug for ObjectStoreConfig<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FileSystem { path } => {
                f.debug_struct("FileSystem").field("path", path).finish()
            }
            // The secret key stays out of debug output.
            Self::S3Compatible {
                bucket,
                region,
                endpoint,
                access_key,
                path_style,
                ..
            } => f
                .debug_struct("S3Compatible")
                .field("bucket", bucket)
                .field("region", region)
                .field("endpoint", endpoint)
                .field("access_key", access_key)
                .field("path_style", path_style)
                .finish_non_exhaustive(),
            Self::Memory => f.write_str("Memory"),
        }
    }
}

/// Summary of a stored object as returned by [`ObjectStore::list`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ObjectEntry {
    /// The object key.
    pub key: String,
    /// Object size in bytes.
    pub size: u64,
    /// Last modification time as an RFC 3339 timestamp.
    pub last_modified: String,
}

/// A downloadable object: its content type and a stream of its bytes.
pub struct ObjectDownload {
    /// The content type recorded at upload time.
    pub content_type: String,
    /// The object payload.
    ///
    /// Streamed from the backend where possible; backends that only
    /// produce an in-memory body yield it as a single chunk.
    pub stream: ByteStream,
}

impl fmt::Debug for ObjectDownload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectDownload")
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

impl ObjectStore {
    /// Creates a new `ObjectStore` with the specified configuration.
    pub async fn new(config: ObjectStoreConfig<'_>) -> anyhow::Result<Self> {
        let backend: BoxedObjectBackend = match config {
            ObjectStoreConfig::FileSystem { path } => Box::new(backend::LocalFsObjects::new(path)),
            ObjectStoreConfig::S3Compatible {
                bucket,
                region,
                endpoint,
                access_key,
                secret_key,
                path_style,
            } => Box::new(backend::S3CompatibleObjects::new(
                backend::S3CompatibleConfig {
                    bucket,
                    region,
                    endpoint,
                    access_key,
                    secret_key,
                    path_style,
                },
            )?),
            ObjectStoreConfig::Memory => Box::new(backend::InMemoryObjects::new()),
        };

        let inner = ObjectStoreInner { backend };
        Ok(Self(Arc::new(inner)))
    }

    /// Stores an uploaded file and returns its generated key.
    ///
    /// The key is derived from the upload time and the raw filename. The
    /// content type prefers the declared type, then the filename
    /// extension, then a generic binary type.
    pub async fn put(
        &self,
        filename: &str,
        declared_type: Option<&str>,
        content: Bytes,
    ) -> BackendResult<String> {
        let key = key::derive_key(filename);
        let content_type = key::resolve_content_type(declared_type, filename);

        tracing::debug!(
            %key,
            %content_type,
            size = content.len(),
            backend = self.0.backend.name(),
            "storing object"
        );
        self.0.backend.put_object(&key, &content_type, content).await?;

        Ok(key)
    }

    /// Lists all stored objects, sorted by key.
    pub async fn list(&self) -> BackendResult<Vec<ObjectEntry>> {
        let mut entries = self.0.backend.list_objects().await?;
        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    /// Streams the object stored under the given key, if it exists.
    pub async fn get(&self, key: &str) -> BackendResult<Option<ObjectDownload>> {
        self.0.backend.get_object(key).await
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use futures_util::TryStreamExt;

    use super::*;

    async fn roundtrip(store: ObjectStore) {
        let key = store
            .put("greeting.txt", Some("text/plain"), Bytes::from_static(b"oh hai!"))
            .await
            .unwrap();
        assert!(key.ends_with("_greeting.txt"));

        let entries = store.list().await.unwrap();
        let entry = entries.iter().find(|entry| entry.key == key).unwrap();
        assert_eq!(entry.size, 7);

        let download = store.get(&key).await.unwrap().unwrap();
        assert_eq!(download.content_type, "text/plain");

        let contents: BytesMut = download.stream.try_collect().await.unwrap();
        assert_eq!(contents.as_ref(), b"oh hai!");
    }

    #[tokio::test]
    async fn stores_objects_on_the_filesystem() {
        let tempdir = tempfile::tempdir().unwrap();
        let config = ObjectStoreConfig::FileSystem {
            path: tempdir.path(),
        };

        roundtrip(ObjectStore::new(config).await.unwrap()).await;
    }

    #[tokio::test]
    async fn stores_objects_in_memory() {
        let store = ObjectStore::new(ObjectStoreConfig::Memory).await.unwrap();
        roundtrip(store).await;
    }

    #[tokio::test]
    async fn declared_type_survives_the_filesystem_roundtrip() {
        let tempdir = tempfile::tempdir().unwrap();
        let config = ObjectStoreConfig::FileSystem {
            path: tempdir.path(),
        };
        let store = ObjectStore::new(config).await.unwrap();

        // The declared type contradicts the extension on purpose; the
        // declared one must win on download.
        let key = store
            .put("data.bin", Some("text/csv"), Bytes::from_static(b"a,b,c"))
            .await
            .unwrap();

        let download = store.get(&key).await.unwrap().unwrap();
        assert_eq!(download.content_type, "text/csv");
    }

    #[tokio::test]
    async fn infers_type_from_the_extension() {
        let store = ObjectStore::new(ObjectStoreConfig::Memory).await.unwrap();

        let key = store
            .put("photo.png", None, Bytes::from_static(b"not really a png"))
            .await
            .unwrap();

        let download = store.get(&key).await.unwrap().unwrap();
        assert_eq!(download.content_type, "image/png");
    }

    #[tokio::test]
    async fn missing_keys_yield_none() {
        let store = ObjectStore::new(ObjectStoreConfig::Memory).await.unwrap();
        assert!(store.get("1700000000000_nope.txt").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn listing_is_sorted_by_key() {
        let store = ObjectStore::new(ObjectStoreConfig::Memory).await.unwrap();

        store.put("b.txt", None, Bytes::from_static(b"b")).await.unwrap();
        store.put("a.txt", None, Bytes::from_static(b"a")).await.unwrap();

        let entries = store.list().await.unwrap();
        let keys: Vec<_> = entries.iter().map(|entry| entry.key.as_str()).collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted);
    }
}
