//! In-memory backends for tests and local development.
//!
//! These provide [`ObjectBackend`](super::ObjectBackend) and
//! [`UserBackend`](super::UserBackend) implementations backed by a
//! `HashMap`, removing the need for filesystem tempdir management in unit
//! tests. The single mutex makes the user table's check-and-insert
//! atomic.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use chrono::{SecondsFormat, Utc};
use futures_util::StreamExt;

use super::common::BackendResult;
use super::{CreateOutcome, ObjectBackend, UserBackend};
use crate::objects::{ObjectDownload, ObjectEntry};
use crate::users::UserRecord;

#[derive(Debug, Clone)]
struct StoredObject {
    content_type: String,
    content: Bytes,
    last_modified: String,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryObjects {
    store: Arc<Mutex<HashMap<String, StoredObject>>>,
}

impl InMemoryObjects {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ObjectBackend for InMemoryObjects {
    fn name(&self) -> &'static str {
        "in-memory"
    }

    async fn put_object(
        &self,
        key: &str,
        content_type: &str,
        content: Bytes,
    ) -> BackendResult<()> {
        let stored = StoredObject {
            content_type: content_type.to_owned(),
            content,
            last_modified: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        };
        self.store.lock().unwrap().insert(key.to_owned(), stored);
        Ok(())
    }

    async fn get_object(&self, key: &str) -> BackendResult<Option<ObjectDownload>> {
        let entry = self.store.lock().unwrap().get(key).cloned();
        Ok(entry.map(|stored| ObjectDownload {
            content_type: stored.content_type,
            stream: futures_util::stream::once(async move { Ok(stored.content) }).boxed(),
        }))
    }

    async fn list_objects(&self) -> BackendResult<Vec<ObjectEntry>> {
        let store = self.store.lock().unwrap();
        Ok(store
            .iter()
            .map(|(key, stored)| ObjectEntry {
                key: key.clone(),
                size: stored.content.len() as u64,
                last_modified: stored.last_modified.clone(),
            })
            .collect())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryUsers {
    store: Arc<Mutex<HashMap<String, UserRecord>>>,
}

impl InMemoryUsers {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UserBackend for InMemoryUsers {
    fn name(&self) -> &'static str {
        "in-memory"
    }

    async fn create_user(&self, record: &UserRecord) -> BackendResult<CreateOutcome> {
        let mut store = self.store.lock().unwrap();
        if store.contains_key(&record.email) {
            return Ok(CreateOutcome::AlreadyExists);
        }

        store.insert(record.email.clone(), record.clone());
        Ok(CreateOutcome::Created)
    }

    async fn get_user(&self, email: &str) -> BackendResult<Option<UserRecord>> {
        Ok(self.store.lock().unwrap().get(email).cloned())
    }
}
