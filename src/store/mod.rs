//! Document store abstraction.
//!
//! Documents are JSON objects addressed by slash separated paths
//! (`users/{uid}/attendance/{id}`). All writes go through [`WriteBatch`], which the
//! backends apply atomically, optionally guarded by [`Precondition`]s checked inside
//! the same critical section.

pub mod memory;
pub mod mysql;
pub mod path;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

pub use memory::MemoryStore;
pub use mysql::MySqlDocumentStore;
pub use path::{CollectionPath, DocPath};

/// Field map of a single document.
pub type Fields = Map<String, Value>;

/// Upper bound on writes in a single batch, same as the hosted document store.
pub const MAX_BATCH_WRITES: usize = 500;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub path: DocPath,
    pub data: Fields,
}

impl Document {
    pub fn id(&self) -> &str {
        self.path.id()
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.data.get(field).and_then(Value::as_str)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("No such document: {0}")]
    NotFound(String),

    #[error("Precondition failed for {0}")]
    PreconditionFailed(String),

    #[error("A write batch may contain at most {max} writes, got {len}")]
    BatchTooLarge { len: usize, max: usize },

    #[error("Invalid document data: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Document store lock poisoned")]
    Poisoned,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Create or overwrite. With `merge` the fields are deep-merged into the existing
    /// document instead.
    Set {
        path: DocPath,
        data: Fields,
        merge: bool,
    },
    /// Overwrite top-level fields of an existing document.
    Update { path: DocPath, fields: Fields },
    Delete { path: DocPath },
}

/// Guard evaluated against stored state right before a batch is applied.
/// Every precondition implies the document exists.
#[derive(Debug, Clone, PartialEq)]
pub enum Precondition {
    /// `field` is boolean `true`.
    FieldTrue { path: DocPath, field: String },
    /// `field` is anything but boolean `true`, including absent.
    FieldNotTrue { path: DocPath, field: String },
    /// `field` equals `value`.
    FieldEquals {
        path: DocPath,
        field: String,
        value: Value,
    },
}

impl Precondition {
    pub fn path(&self) -> &DocPath {
        match self {
            Precondition::FieldTrue { path, .. }
            | Precondition::FieldNotTrue { path, .. }
            | Precondition::FieldEquals { path, .. } => path,
        }
    }

    pub fn holds(&self, doc: &Fields) -> bool {
        match self {
            Precondition::FieldTrue { field, .. } => doc.get(field) == Some(&Value::Bool(true)),
            Precondition::FieldNotTrue { field, .. } => doc.get(field) != Some(&Value::Bool(true)),
            Precondition::FieldEquals { field, value, .. } => doc.get(field) == Some(value),
        }
    }

    /// `current` is the stored document, `None` when it does not exist.
    pub fn check(&self, current: Option<&Fields>) -> Result<(), StoreError> {
        match current {
            None => Err(StoreError::NotFound(self.path().to_string())),
            Some(doc) if !self.holds(doc) => {
                Err(StoreError::PreconditionFailed(self.path().to_string()))
            }
            Some(_) => Ok(()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    preconditions: Vec<Precondition>,
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, path: DocPath, data: Fields) -> &mut Self {
        self.ops.push(WriteOp::Set {
            path,
            data,
            merge: false,
        });
        self
    }

    pub fn set_merge(&mut self, path: DocPath, data: Fields) -> &mut Self {
        self.ops.push(WriteOp::Set {
            path,
            data,
            merge: true,
        });
        self
    }

    pub fn update(&mut self, path: DocPath, fields: Fields) -> &mut Self {
        self.ops.push(WriteOp::Update { path, fields });
        self
    }

    pub fn delete(&mut self, path: DocPath) -> &mut Self {
        self.ops.push(WriteOp::Delete { path });
        self
    }

    /// Adds a guard; all of them must hold for the batch to apply.
    pub fn require(&mut self, precondition: Precondition) -> &mut Self {
        self.preconditions.push(precondition);
        self
    }

    pub fn preconditions(&self) -> &[Precondition] {
        &self.preconditions
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn into_parts(self) -> (Vec<Precondition>, Vec<WriteOp>) {
        (self.preconditions, self.ops)
    }

    pub(crate) fn check_size(&self) -> Result<(), StoreError> {
        if self.ops.len() > MAX_BATCH_WRITES {
            return Err(StoreError::BatchTooLarge {
                len: self.ops.len(),
                max: MAX_BATCH_WRITES,
            });
        }
        Ok(())
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, StoreError>;

    /// All documents directly inside `collection`, ordered by id.
    async fn list_documents(
        &self,
        collection: &CollectionPath,
    ) -> Result<Vec<Document>, StoreError>;

    /// Collections directly under `parent`, or the top-level ones for `None`.
    async fn list_collections(
        &self,
        parent: Option<&DocPath>,
    ) -> Result<Vec<CollectionPath>, StoreError>;

    /// Applies every write of the batch or none of them.
    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError>;

    /// Documents of `collection` whose `field` equals `value`.
    async fn query_eq(
        &self,
        collection: &CollectionPath,
        field: &str,
        value: &Value,
    ) -> Result<Vec<Document>, StoreError> {
        let docs = self.list_documents(collection).await?;
        Ok(docs
            .into_iter()
            .filter(|doc| doc.data.get(field) == Some(value))
            .collect())
    }

    async fn set(&self, path: &DocPath, data: Fields) -> Result<(), StoreError> {
        let mut batch = WriteBatch::new();
        batch.set(path.clone(), data);
        self.commit(batch).await
    }

    async fn set_merge(&self, path: &DocPath, data: Fields) -> Result<(), StoreError> {
        let mut batch = WriteBatch::new();
        batch.set_merge(path.clone(), data);
        self.commit(batch).await
    }

    async fn update(&self, path: &DocPath, fields: Fields) -> Result<(), StoreError> {
        let mut batch = WriteBatch::new();
        batch.update(path.clone(), fields);
        self.commit(batch).await
    }

    async fn delete(&self, path: &DocPath) -> Result<(), StoreError> {
        let mut batch = WriteBatch::new();
        batch.delete(path.clone());
        self.commit(batch).await
    }

    /// Fresh random id for a new document.
    fn new_doc_id(&self) -> String {
        Uuid::new_v4().to_simple().to_string()
    }
}

/// Applies one write to an in-memory image of the target document.
/// Returns the new state, `None` meaning deleted.
pub(crate) fn apply_op(
    op: &WriteOp,
    current: Option<Fields>,
) -> Result<Option<Fields>, StoreError> {
    match op {
        WriteOp::Set { data, merge, .. } => {
            let next = match (current, merge) {
                (Some(mut existing), true) => {
                    merge_fields(&mut existing, data);
                    existing
                }
                _ => data.clone(),
            };
            Ok(Some(next))
        }
        WriteOp::Update { path, fields } => {
            let mut existing = current.ok_or_else(|| StoreError::NotFound(path.to_string()))?;
            for (key, value) in fields {
                existing.insert(key.clone(), value.clone());
            }
            Ok(Some(existing))
        }
        WriteOp::Delete { .. } => Ok(None),
    }
}

impl WriteOp {
    pub fn path(&self) -> &DocPath {
        match self {
            WriteOp::Set { path, .. } | WriteOp::Update { path, .. } | WriteOp::Delete { path } => {
                path
            }
        }
    }
}

/// Deep merge: nested objects are merged key by key, everything else is replaced.
pub fn merge_fields(target: &mut Fields, patch: &Fields) {
    for (key, value) in patch {
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_fields(existing, incoming)
            }
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

/// Serializes a value into a document field map.
pub fn to_fields<T: serde::Serialize>(value: &T) -> Result<Fields, StoreError> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Serialization(serde::ser::Error::custom(format!(
            "expected an object, got {other}"
        )))),
    }
}
