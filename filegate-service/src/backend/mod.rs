use std::fmt::Debug;
use std::io;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;

mod common;
mod in_memory;
mod local_fs;
mod s3_compatible;

pub use common::{BackendError, BackendResult};
pub(crate) use in_memory::{InMemoryObjects, InMemoryUsers};
pub(crate) use local_fs::{LocalFsObjects, LocalFsUsers};
pub(crate) use s3_compatible::{S3CompatibleConfig, S3CompatibleObjects};

use crate::objects::{ObjectDownload, ObjectEntry};
use crate::users::UserRecord;

/// A stream of object content bytes.
pub type ByteStream = BoxStream<'static, io::Result<Bytes>>;

/// A type-erased [`ObjectBackend`] instance.
pub type BoxedObjectBackend = Box<dyn ObjectBackend>;

/// A type-erased [`UserBackend`] instance.
pub type BoxedUserBackend = Box<dyn UserBackend>;

/// Outcome of a conditional create on the user table.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The record was written.
    Created,
    /// A record with the same key already exists; nothing was written.
    AlreadyExists,
}

/// A binary blob store keyed by string.
#[async_trait]
pub trait ObjectBackend: Debug + Send + Sync + 'static {
    /// The backend name, used for diagnostics.
    fn name(&self) -> &'static str;

    /// Stores an object under the given key.
    async fn put_object(&self, key: &str, content_type: &str, content: Bytes)
    -> BackendResult<()>;

    /// Retrieves the object stored under the given key, if it exists.
    async fn get_object(&self, key: &str) -> BackendResult<Option<ObjectDownload>>;

    /// Lists all objects in the backing container.
    ///
    /// Implementations must be exhaustive: a paginating backend keeps
    /// following continuation tokens rather than returning a truncated
    /// listing.
    async fn list_objects(&self) -> BackendResult<Vec<ObjectEntry>>;
}

/// A key-value table of account records keyed by normalized email.
#[async_trait]
pub trait UserBackend: Debug + Send + Sync + 'static {
    /// The backend name, used for diagnostics.
    fn name(&self) -> &'static str;

    /// Writes the record unless one already exists for the same email.
    ///
    /// The check-and-create must be atomic at the backend; emulating it
    /// with a read followed by a write loses the uniqueness guarantee
    /// under concurrent signups.
    async fn create_user(&self, record: &UserRecord) -> BackendResult<CreateOutcome>;

    /// Looks up a record by its (already normalized) email key.
    async fn get_user(&self, email: &str) -> BackendResult<Option<UserRecord>>;
}
