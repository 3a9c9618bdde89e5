//! Recording and failure-injecting fakes shared by unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;

use crate::identity::{IdentityError, IdentityProvider, NewIdentity, UserRecord, new_uid};
use crate::store::{
    CollectionPath, DocPath, Document, DocumentStore, Fields, MemoryStore, StoreError, WriteBatch,
};

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Get(String),
    List(String),
    ListCollections,
    Query(String),
    Commit(usize),
    Set(String),
    Update(String),
    Delete(String),
    CreateIdentity {
        email: Option<String>,
        password: Option<String>,
    },
    UpdateEmail(String),
    DeleteIdentity(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum FailOn {
    Never,
    /// Deleting this document path (store) or uid (identity).
    Delete(String),
    /// Any batch commit.
    Commit,
}

fn injected(target: &str) -> StoreError {
    StoreError::NotFound(format!("injected failure on {target}"))
}

/// `MemoryStore` that logs every call and can be told to fail one of them.
pub struct RecordingStore {
    inner: MemoryStore,
    fail_on: FailOn,
    calls: Mutex<Vec<Call>>,
}

impl RecordingStore {
    pub fn new(fail_on: FailOn) -> Self {
        Self {
            inner: MemoryStore::new(),
            fail_on,
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Direct access for seeding and assertions, bypassing the log.
    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl DocumentStore for RecordingStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, StoreError> {
        self.record(Call::Get(path.to_string()));
        self.inner.get(path).await
    }

    async fn list_documents(
        &self,
        collection: &CollectionPath,
    ) -> Result<Vec<Document>, StoreError> {
        self.record(Call::List(collection.to_string()));
        self.inner.list_documents(collection).await
    }

    async fn list_collections(
        &self,
        parent: Option<&DocPath>,
    ) -> Result<Vec<CollectionPath>, StoreError> {
        self.record(Call::ListCollections);
        self.inner.list_collections(parent).await
    }

    async fn query_eq(
        &self,
        collection: &CollectionPath,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, StoreError> {
        self.record(Call::Query(collection.to_string()));
        self.inner.query_eq(collection, field, value).await
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        self.record(Call::Commit(batch.len()));
        if self.fail_on == FailOn::Commit {
            return Err(injected("commit"));
        }
        self.inner.commit(batch).await
    }

    async fn set(&self, path: &DocPath, data: Fields) -> Result<(), StoreError> {
        self.record(Call::Set(path.to_string()));
        self.inner.set(path, data).await
    }

    async fn set_merge(&self, path: &DocPath, data: Fields) -> Result<(), StoreError> {
        self.record(Call::Set(path.to_string()));
        self.inner.set_merge(path, data).await
    }

    async fn update(&self, path: &DocPath, fields: Fields) -> Result<(), StoreError> {
        self.record(Call::Update(path.to_string()));
        self.inner.update(path, fields).await
    }

    async fn delete(&self, path: &DocPath) -> Result<(), StoreError> {
        self.record(Call::Delete(path.to_string()));
        if self.fail_on == FailOn::Delete(path.to_string()) {
            return Err(injected(&path.to_string()));
        }
        self.inner.delete(path).await
    }
}

/// Stateless identity fake: every call succeeds unless configured to fail.
pub struct RecordingIdentity {
    fail_on: FailOn,
    calls: Mutex<Vec<Call>>,
}

impl RecordingIdentity {
    pub fn new(fail_on: FailOn) -> Self {
        Self {
            fail_on,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl IdentityProvider for RecordingIdentity {
    async fn create_user(&self, new: NewIdentity) -> Result<UserRecord, IdentityError> {
        self.record(Call::CreateIdentity {
            email: new.email.clone(),
            password: new.password.clone(),
        });
        Ok(UserRecord {
            uid: new_uid(),
            email: new.email,
            email_verified: new.email_verified,
            created_at: Utc::now(),
        })
    }

    async fn get_user(&self, _uid: &str) -> Result<Option<UserRecord>, IdentityError> {
        Ok(None)
    }

    async fn update_email(&self, uid: &str, email: &str) -> Result<UserRecord, IdentityError> {
        self.record(Call::UpdateEmail(uid.to_string()));
        Ok(UserRecord {
            uid: uid.to_string(),
            email: Some(email.to_string()),
            email_verified: true,
            created_at: Utc::now(),
        })
    }

    async fn delete_user(&self, uid: &str) -> Result<(), IdentityError> {
        self.record(Call::DeleteIdentity(uid.to_string()));
        if self.fail_on == FailOn::Delete(uid.to_string()) {
            return Err(IdentityError::UserNotFound);
        }
        Ok(())
    }
}
