use std::collections::BTreeMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::path::child_collection_of;
use super::{
    CollectionPath, DocPath, Document, DocumentStore, Fields, StoreError, WriteBatch, apply_op,
};

/// Process-local store. Used by tests and by local runs without `DATABASE_URL`.
#[derive(Default)]
pub struct MemoryStore {
    docs: RwLock<BTreeMap<DocPath, Fields>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.docs.read().map(|docs| docs.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, StoreError> {
        let docs = self.docs.read().map_err(|_| StoreError::Poisoned)?;
        Ok(docs.get(path).map(|data| Document {
            path: path.clone(),
            data: data.clone(),
        }))
    }

    async fn list_documents(
        &self,
        collection: &CollectionPath,
    ) -> Result<Vec<Document>, StoreError> {
        let docs = self.docs.read().map_err(|_| StoreError::Poisoned)?;
        Ok(docs
            .iter()
            .filter(|(path, _)| path.parent() == collection)
            .map(|(path, data)| Document {
                path: path.clone(),
                data: data.clone(),
            })
            .collect())
    }

    async fn list_collections(
        &self,
        parent: Option<&DocPath>,
    ) -> Result<Vec<CollectionPath>, StoreError> {
        let docs = self.docs.read().map_err(|_| StoreError::Poisoned)?;
        let mut collections: Vec<CollectionPath> = docs
            .keys()
            .filter_map(|path| child_collection_of(parent, path))
            .collect();
        collections.sort();
        collections.dedup();
        Ok(collections)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        batch.check_size()?;

        // one write lock across check and apply keeps the batch atomic
        let mut docs = self.docs.write().map_err(|_| StoreError::Poisoned)?;

        for precondition in batch.preconditions() {
            precondition.check(docs.get(precondition.path()))?;
        }

        // stage on a copy of the touched documents so a failing op leaves nothing behind
        let mut staged: BTreeMap<DocPath, Option<Fields>> = BTreeMap::new();
        for op in batch.ops() {
            let current = match staged.get(op.path()) {
                Some(state) => state.clone(),
                None => docs.get(op.path()).cloned(),
            };
            let next = apply_op(op, current)?;
            staged.insert(op.path().clone(), next);
        }

        for (path, state) in staged {
            match state {
                Some(data) => {
                    docs.insert(path, data);
                }
                None => {
                    docs.remove(&path);
                }
            }
        }
        Ok(())
    }
}
