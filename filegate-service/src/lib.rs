//! The service layer providing the storage and account primitives of the
//! file gateway.
//!
//! This crate wraps two kinds of backends behind small asynchronous
//! services: an [`ObjectStore`] for binary blobs keyed by string, and a
//! [`UserStore`] for account records keyed by normalized email. It is
//! designed as a library crate to be used by the `filegate-server`.
#![warn(missing_docs)]
#![warn(missing_debug_implementations)]

mod backend;
pub mod key;
pub mod objects;
pub mod users;

pub use backend::{BackendError, BackendResult, ByteStream};
pub use objects::{ObjectDownload, ObjectEntry, ObjectStore, ObjectStoreConfig};
pub use users::{CreateUserError, UserRecord, UserStore, UserStoreConfig, normalize_email};
