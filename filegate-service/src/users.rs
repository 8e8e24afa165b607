//! The credential store service.
//!
//! [`UserStore`] wraps a key-value backend holding one record per account,
//! keyed by normalized email. Creation is conditional and atomic at the
//! backend, which is what enforces the email uniqueness invariant.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::{self, BackendError, BackendResult, BoxedUserBackend, CreateOutcome};

/// Normalizes an email address to its canonical lowercase form.
///
/// All storage and lookups key on the normalized form, making addresses
/// case-insensitive.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// A stored user account.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    /// The normalized account email, which is the primary key.
    pub email: String,
    /// Optional display name.
    pub name: Option<String>,
    /// The password hash. Opaque; never transmitted or logged.
    pub password_hash: String,
    /// Account creation time. Set once, immutable.
    pub created_at: DateTime<Utc>,
}

/// Error returned by [`UserStore::create`].
#[derive(Debug, Error)]
pub enum CreateUserError {
    /// An account with the same normalized email already exists.
    #[error("email is already registered")]
    AlreadyExists,

    /// The backend failed.
    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// High-level asynchronous service for the user account table.
#[derive(Clone, Debug)]
pub struct UserStore(Arc<UserStoreInner>);

#[derive(Debug)]
struct UserStoreInner {
    backend: BoxedUserBackend,
}

/// Configuration to initialize a [`UserStore`].
#[derive(Debug)]
pub enum UserStoreConfig<'a> {
    /// Keep one JSON document per account in a local directory.
    FileSystem {
        /// The directory where account records are stored.
        path: &'a std::path::Path,
    },
    /// Keep accounts in process memory. For tests and local development.
    Memory,
}

impl UserStore {
    /// Creates a new `UserStore` with the specified configuration.
    pub async fn new(config: UserStoreConfig<'_>) -> anyhow::Result<Self> {
        let backend: BoxedUserBackend = match config {
            UserStoreConfig::FileSystem { path } => Box::new(backend::LocalFsUsers::new(path)),
            UserStoreConfig::Memory => Box::new(backend::InMemoryUsers::new()),
        };

        let inner = UserStoreInner { backend };
        Ok(Self(Arc::new(inner)))
    }

    /// Creates a new account, failing if the email is already taken.
    ///
    /// The uniqueness check is atomic at the backend, so two concurrent
    /// signups with the same normalized email resolve to exactly one
    /// success and one [`CreateUserError::AlreadyExists`].
    pub async fn create(
        &self,
        email: &str,
        name: Option<String>,
        password_hash: String,
    ) -> Result<UserRecord, CreateUserError> {
        let record = UserRecord {
            email: normalize_email(email),
            name,
            password_hash,
            created_at: Utc::now(),
        };

        tracing::debug!(
            email = %record.email,
            backend = self.0.backend.name(),
            "creating account"
        );
        match self.0.backend.create_user(&record).await? {
            CreateOutcome::Created => Ok(record),
            CreateOutcome::AlreadyExists => Err(CreateUserError::AlreadyExists),
        }
    }

    /// Looks up an account by email, normalizing it first.
    pub async fn find_by_email(&self, email: &str) -> BackendResult<Option<UserRecord>> {
        self.0.backend.get_user(&normalize_email(email)).await
    }
}
