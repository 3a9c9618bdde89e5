//! Full dump of the document store: top-level collections, their documents and one
//! level of subcollections.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::store::{Document, DocumentStore, StoreError};

/// `{collection: [{id, ...fields, subcollections: {name: [{id, ...fields}]}}]}`
pub type ExportTree = Map<String, Value>;

/// Document fields with the id put first; a stored `id` field wins, as in a spread.
fn flatten(doc: &Document) -> Map<String, Value> {
    let mut out = Map::new();
    out.insert("id".to_string(), Value::String(doc.id().to_string()));
    out.extend(doc.data.clone());
    out
}

pub async fn export_all(store: &dyn DocumentStore) -> Result<ExportTree, StoreError> {
    let mut tree = ExportTree::new();

    for collection in store.list_collections(None).await? {
        let docs = store.list_documents(&collection).await?;
        debug!(collection = %collection, docs = docs.len(), "Exporting collection");

        let mut exported = Vec::with_capacity(docs.len());
        for doc in &docs {
            let mut subcollections = Map::new();
            for sub in store.list_collections(Some(&doc.path)).await? {
                let sub_docs = store.list_documents(&sub).await?;
                subcollections.insert(
                    sub.id().to_string(),
                    Value::Array(sub_docs.iter().map(|d| Value::Object(flatten(d))).collect()),
                );
            }

            let mut entry = flatten(doc);
            entry.insert("subcollections".to_string(), Value::Object(subcollections));
            exported.push(Value::Object(entry));
        }

        tree.insert(collection.id().to_string(), Value::Array(exported));
    }

    Ok(tree)
}

/// Pretty-printed JSON, two-space indent.
pub fn write_export(tree: &ExportTree, path: &Path) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, tree).context("Failed to serialize export")?;
    writer.flush()?;

    info!(file = %path.display(), collections = tree.len(), "Export written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DocPath, MemoryStore, to_fields};
    use serde_json::json;

    async fn put(store: &MemoryStore, path: &str, value: Value) {
        store
            .set(&DocPath::parse(path).unwrap(), to_fields(&value).unwrap())
            .await
            .unwrap();
    }

    #[actix_web::test]
    async fn exports_collections_with_one_level_of_subcollections() {
        let store = MemoryStore::new();
        put(&store, "users/u1", json!({"createdAt": "2024-01-01T00:00:00Z"})).await;
        put(&store, "users/u1/profile/u1", json!({"name": "Jane"})).await;
        put(&store, "users/u1/attendance/a1", json!({"requestId": "r1"})).await;
        // two levels down: not exported
        put(&store, "users/u1/attendance/a1/notes/n1", json!({"text": "x"})).await;
        put(&store, "settings/app", json!({"id": "stored-id"})).await;

        let tree = export_all(&store).await.unwrap();

        assert_eq!(
            Value::Object(tree),
            json!({
                "settings": [
                    {"id": "stored-id", "subcollections": {}}
                ],
                "users": [
                    {
                        "id": "u1",
                        "createdAt": "2024-01-01T00:00:00Z",
                        "subcollections": {
                            "attendance": [{"id": "a1", "requestId": "r1"}],
                            "profile": [{"id": "u1", "name": "Jane"}]
                        }
                    }
                ]
            })
        );
    }

    #[actix_web::test]
    async fn empty_store_exports_empty_object() {
        let tree = export_all(&MemoryStore::new()).await.unwrap();
        assert!(tree.is_empty());
    }

    #[test]
    fn writes_pretty_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        let mut tree = ExportTree::new();
        tree.insert("users".to_string(), json!([{"id": "u1", "subcollections": {}}]));

        write_export(&tree, &path).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("{\n  \"users\": ["));
        let parsed: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, Value::Object(tree));
    }
}
