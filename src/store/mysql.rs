use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::{MySql, MySqlPool, Transaction};
use tracing::debug;

use super::path::child_collection_of;
use super::{
    CollectionPath, DocPath, Document, DocumentStore, Fields, StoreError, WriteBatch, WriteOp,
    apply_op,
};

/// Documents kept as JSON text in the `documents` table, keyed by
/// (parent document path, collection id, document id).
#[derive(Clone)]
pub struct MySqlDocumentStore {
    pool: MySqlPool,
}

/// Split of a document path into the three key columns.
struct DocKey<'a> {
    parent_path: String,
    collection_id: &'a str,
    doc_id: &'a str,
}

fn key(path: &DocPath) -> DocKey<'_> {
    DocKey {
        parent_path: path
            .parent()
            .parent()
            .map(|p| p.to_string())
            .unwrap_or_default(),
        collection_id: path.parent().id(),
        doc_id: path.id(),
    }
}

fn doc_path(parent_path: &str, collection_id: &str, doc_id: &str) -> Option<DocPath> {
    if parent_path.is_empty() {
        DocPath::parse(&format!("{collection_id}/{doc_id}"))
    } else {
        DocPath::parse(&format!("{parent_path}/{collection_id}/{doc_id}"))
    }
}

fn decode(path: DocPath, raw: &str) -> Result<Document, StoreError> {
    let data: Fields = serde_json::from_str(raw)?;
    Ok(Document { path, data })
}

impl MySqlDocumentStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn load_for_update(
        tx: &mut Transaction<'_, MySql>,
        path: &DocPath,
    ) -> Result<Option<Fields>, StoreError> {
        let k = key(path);
        let row = sqlx::query_as::<_, (String,)>(
            r#"
            SELECT data
            FROM documents
            WHERE parent_path = ? AND collection_id = ? AND doc_id = ?
            FOR UPDATE
            "#,
        )
        .bind(&k.parent_path)
        .bind(k.collection_id)
        .bind(k.doc_id)
        .fetch_optional(&mut **tx)
        .await?;

        row.map(|(raw,)| serde_json::from_str(&raw).map_err(StoreError::from))
            .transpose()
    }
}

#[async_trait]
impl DocumentStore for MySqlDocumentStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Document>, StoreError> {
        let k = key(path);
        let row = sqlx::query_as::<_, (String,)>(
            r#"
            SELECT data
            FROM documents
            WHERE parent_path = ? AND collection_id = ? AND doc_id = ?
            "#,
        )
        .bind(&k.parent_path)
        .bind(k.collection_id)
        .bind(k.doc_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(raw,)| decode(path.clone(), &raw)).transpose()
    }

    async fn list_documents(
        &self,
        collection: &CollectionPath,
    ) -> Result<Vec<Document>, StoreError> {
        let parent_path = collection
            .parent()
            .map(|p| p.to_string())
            .unwrap_or_default();

        let rows = sqlx::query_as::<_, (String, String)>(
            r#"
            SELECT doc_id, data
            FROM documents
            WHERE parent_path = ? AND collection_id = ?
            ORDER BY doc_id
            "#,
        )
        .bind(&parent_path)
        .bind(collection.id())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|(doc_id, raw)| decode(collection.doc(doc_id), raw))
            .collect()
    }

    async fn list_collections(
        &self,
        parent: Option<&DocPath>,
    ) -> Result<Vec<CollectionPath>, StoreError> {
        // any descendant row proves the collection exists
        let rows = match parent {
            None => {
                sqlx::query_as::<_, (String, String)>(
                    "SELECT DISTINCT parent_path, collection_id FROM documents",
                )
                .fetch_all(&self.pool)
                .await?
            }
            Some(parent) => {
                let prefix = parent.to_string();
                sqlx::query_as::<_, (String, String)>(
                    r#"
                    SELECT DISTINCT parent_path, collection_id
                    FROM documents
                    WHERE parent_path = ? OR parent_path LIKE CONCAT(?, '/%')
                    "#,
                )
                .bind(&prefix)
                .bind(&prefix)
                .fetch_all(&self.pool)
                .await?
            }
        };

        let mut collections: Vec<CollectionPath> = rows
            .iter()
            // placeholder id, only the collection segments matter here
            .filter_map(|(parent_path, collection_id)| doc_path(parent_path, collection_id, "_"))
            .filter_map(|path| child_collection_of(parent, &path))
            .collect();
        collections.sort();
        collections.dedup();
        Ok(collections)
    }

    async fn commit(&self, batch: WriteBatch) -> Result<(), StoreError> {
        batch.check_size()?;
        let (preconditions, ops) = batch.into_parts();

        let mut tx = self.pool.begin().await?;

        // an early return drops the transaction, which rolls it back
        for precondition in &preconditions {
            let current = Self::load_for_update(&mut tx, precondition.path()).await?;
            precondition.check(current.as_ref())?;
        }

        let mut staged: BTreeMap<DocPath, Option<Fields>> = BTreeMap::new();
        for op in &ops {
            let current = match staged.get(op.path()) {
                Some(state) => state.clone(),
                None => match op {
                    WriteOp::Set { merge: false, .. } | WriteOp::Delete { .. } => None,
                    _ => Self::load_for_update(&mut tx, op.path()).await?,
                },
            };
            staged.insert(op.path().clone(), apply_op(op, current)?);
        }

        debug!(writes = staged.len(), "Committing document batch");

        for (path, state) in &staged {
            let k = key(path);
            match state {
                Some(data) => {
                    let raw = serde_json::to_string(data)?;
                    sqlx::query(
                        r#"
                        INSERT INTO documents (parent_path, collection_id, doc_id, data)
                        VALUES (?, ?, ?, ?)
                        ON DUPLICATE KEY UPDATE data = VALUES(data)
                        "#,
                    )
                    .bind(&k.parent_path)
                    .bind(k.collection_id)
                    .bind(k.doc_id)
                    .bind(raw)
                    .execute(&mut *tx)
                    .await?;
                }
                None => {
                    sqlx::query(
                        r#"
                        DELETE FROM documents
                        WHERE parent_path = ? AND collection_id = ? AND doc_id = ?
                        "#,
                    )
                    .bind(&k.parent_path)
                    .bind(k.collection_id)
                    .bind(k.doc_id)
                    .execute(&mut *tx)
                    .await?;
                }
            }
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_split_nested_paths() {
        let path = DocPath::parse("users/u1/attendance/a1").unwrap();
        let k = key(&path);
        assert_eq!(k.parent_path, "users/u1");
        assert_eq!(k.collection_id, "attendance");
        assert_eq!(k.doc_id, "a1");

        let root = DocPath::parse("users/u1").unwrap();
        assert_eq!(key(&root).parent_path, "");
    }

    #[test]
    fn rows_rebuild_document_paths() {
        assert_eq!(
            doc_path("", "users", "u1").unwrap().to_string(),
            "users/u1"
        );
        assert_eq!(
            doc_path("users/u1", "profile", "u1").unwrap().to_string(),
            "users/u1/profile/u1"
        );
    }
}
