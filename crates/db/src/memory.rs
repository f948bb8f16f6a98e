//! In-memory implementation of the document store.
//!
//! Versioned documents behind a `tokio::sync::RwLock`, optimistic
//! transactions that validate read versions at commit, and atomic batches
//! applied under one write guard. Also load/dump of a JSON snapshot file,
//! which is what the maintenance binary operates on.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::store::{Document, DocumentStore, StoreError, StoreTransaction, WriteBatch, WriteOp};

#[derive(Debug, Clone)]
struct VersionedDoc {
    version: u64,
    body: Value,
}

#[derive(Debug, Default)]
struct Inner {
    collections: HashMap<String, HashMap<String, VersionedDoc>>,
    next_version: u64,
}

impl Inner {
    fn get(&self, collection: &str, id: &str) -> Option<&VersionedDoc> {
        self.collections.get(collection).and_then(|c| c.get(id))
    }

    fn current_version(&self, collection: &str, id: &str) -> Option<u64> {
        self.get(collection, id).map(|d| d.version)
    }

    fn apply(&mut self, ops: &[WriteOp]) {
        for op in ops {
            self.next_version += 1;
            let version = self.next_version;
            match op {
                WriteOp::Set {
                    collection,
                    id,
                    body,
                } => {
                    self.collections.entry(collection.clone()).or_default().insert(
                        id.clone(),
                        VersionedDoc {
                            version,
                            body: body.clone(),
                        },
                    );
                }
                WriteOp::Delete { collection, id } => {
                    if let Some(c) = self.collections.get_mut(collection) {
                        c.remove(id);
                    }
                }
            }
        }
    }
}

/// In-memory, snapshot-validated document store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store from a JSON snapshot file: a map of collection name to
    /// a map of document id to body. Versions restart from zero.
    pub async fn load_snapshot(path: &Path) -> Result<Self, StoreError> {
        let raw = tokio::fs::read_to_string(path).await?;
        let data: HashMap<String, HashMap<String, Value>> = serde_json::from_str(&raw)?;
        let mut inner = Inner::default();
        for (collection, docs) in data {
            for (id, body) in docs {
                inner.next_version += 1;
                let version = inner.next_version;
                inner
                    .collections
                    .entry(collection.clone())
                    .or_default()
                    .insert(id, VersionedDoc { version, body });
            }
        }
        Ok(Self {
            inner: Arc::new(RwLock::new(inner)),
        })
    }

    /// Write the current contents back out as a JSON snapshot file.
    pub async fn dump_snapshot(&self, path: &Path) -> Result<(), StoreError> {
        let inner = self.inner.read().await;
        let mut data: HashMap<&str, HashMap<&str, &Value>> = HashMap::new();
        for (collection, docs) in &inner.collections {
            let entry = data.entry(collection.as_str()).or_default();
            for (id, doc) in docs {
                entry.insert(id.as_str(), &doc.body);
            }
        }
        let rendered = serde_json::to_string_pretty(&data)?;
        drop(data);
        drop(inner);
        tokio::fs::write(path, rendered).await?;
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.get(collection, id).map(|doc| Document {
            id: id.to_string(),
            version: doc.version,
            body: doc.body.clone(),
        }))
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let inner = self.inner.read().await;
        let mut docs: Vec<Document> = inner
            .collections
            .get(collection)
            .into_iter()
            .flatten()
            .map(|(id, doc)| Document {
                id: id.clone(),
                version: doc.version,
                body: doc.body.clone(),
            })
            .collect();
        // Stable order keeps list-driven operations deterministic.
        docs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(docs)
    }

    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        Ok(Box::new(MemoryTransaction {
            inner: Arc::clone(&self.inner),
            reads: HashMap::new(),
            staged: Vec::new(),
        }))
    }

    async fn apply_batch(&self, batch: WriteBatch) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.apply(&batch.ops);
        Ok(())
    }
}

struct MemoryTransaction {
    inner: Arc<RwLock<Inner>>,
    /// Versions observed by reads; `None` means the document was absent.
    reads: HashMap<(String, String), Option<u64>>,
    staged: Vec<WriteOp>,
}

impl MemoryTransaction {
    /// The latest staged write for a key, if any (read-your-writes).
    fn staged_for(&self, collection: &str, id: &str) -> Option<&WriteOp> {
        self.staged.iter().rev().find(|op| match op {
            WriteOp::Set {
                collection: c,
                id: i,
                ..
            }
            | WriteOp::Delete {
                collection: c,
                id: i,
            } => c == collection && i == id,
        })
    }
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn get(&mut self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        if let Some(op) = self.staged_for(collection, id) {
            return Ok(match op {
                WriteOp::Set { body, .. } => Some(Document {
                    id: id.to_string(),
                    version: 0,
                    body: body.clone(),
                }),
                WriteOp::Delete { .. } => None,
            });
        }

        let inner = self.inner.read().await;
        let doc = inner.get(collection, id);
        self.reads.insert(
            (collection.to_string(), id.to_string()),
            doc.map(|d| d.version),
        );
        Ok(doc.map(|d| Document {
            id: id.to_string(),
            version: d.version,
            body: d.body.clone(),
        }))
    }

    fn set(&mut self, collection: &str, id: &str, body: Value) {
        self.staged.push(WriteOp::Set {
            collection: collection.to_string(),
            id: id.to_string(),
            body,
        });
    }

    fn delete(&mut self, collection: &str, id: &str) {
        self.staged.push(WriteOp::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        });
    }

    async fn commit(self: Box<Self>) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        for ((collection, id), seen) in &self.reads {
            if inner.current_version(collection, id) != *seen {
                return Err(StoreError::Conflict(format!("{collection}/{id}")));
            }
        }
        inner.apply(&self.staged);
        Ok(())
    }
}
