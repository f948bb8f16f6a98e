//! The document-store contract.
//!
//! Per-entity read, list, atomic transactional read-modify-write, and
//! batched writes, keyed by collection name and opaque document id. The
//! contract requires transactions to be at least snapshot-isolated over
//! the set of documents they touch: a commit fails with
//! [`StoreError::Conflict`] if any document read inside the transaction
//! changed before the commit applied.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

/// Errors surfaced by the store layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Optimistic validation failed: a document touched by the transaction
    /// changed underneath it. Retryable for idempotent operations.
    #[error("Transaction conflict on {0}")]
    Conflict(String),

    #[error("Document not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A raw versioned document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub version: u64,
    pub body: Value,
}

impl Document {
    /// Decode the body into a typed model, keeping id and version.
    pub fn decode<T: DeserializeOwned>(self) -> Result<Stored<T>, StoreError> {
        let data = serde_json::from_value(self.body)?;
        Ok(Stored {
            id: self.id,
            version: self.version,
            data,
        })
    }
}

/// A typed model together with its document id and version.
#[derive(Debug, Clone)]
pub struct Stored<T> {
    pub id: String,
    pub version: u64,
    pub data: T,
}

/// Encode a model into a document body.
pub fn encode<T: Serialize>(data: &T) -> Result<Value, StoreError> {
    Ok(serde_json::to_value(data)?)
}

/// One staged write.
#[derive(Debug, Clone)]
pub enum WriteOp {
    Set {
        collection: String,
        id: String,
        body: Value,
    },
    Delete {
        collection: String,
        id: String,
    },
}

/// An ordered set of writes applied atomically: either every op lands or
/// none do.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    pub ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<T: Serialize>(
        &mut self,
        collection: &str,
        id: &str,
        data: &T,
    ) -> Result<(), StoreError> {
        self.ops.push(WriteOp::Set {
            collection: collection.to_string(),
            id: id.to_string(),
            body: encode(data)?,
        });
        Ok(())
    }

    pub fn delete(&mut self, collection: &str, id: &str) {
        self.ops.push(WriteOp::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }
}

/// The store seam. Implementations must make [`DocumentStore::apply_batch`]
/// all-or-nothing and make transactions detect write-after-read conflicts.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Read one document.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// List every document in a collection. Filtering happens client-side;
    /// the store only knows opaque ids and bodies.
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Begin a transaction.
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError>;

    /// Apply a batch of writes atomically, without read validation.
    async fn apply_batch(&self, batch: WriteBatch) -> Result<(), StoreError>;
}

/// A transaction handle: reads are recorded with their versions, writes
/// are staged, and `commit` validates every recorded read before applying
/// the staged writes.
#[async_trait]
pub trait StoreTransaction: Send {
    /// Read a document, recording its version for commit-time validation.
    /// Reads observe this transaction's own staged writes.
    async fn get(&mut self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Stage a set.
    fn set(&mut self, collection: &str, id: &str, body: Value);

    /// Stage a delete.
    fn delete(&mut self, collection: &str, id: &str);

    /// Validate and apply. Consumes the transaction.
    async fn commit(self: Box<Self>) -> Result<(), StoreError>;
}

/// Helper: stage a typed set on a transaction.
pub fn txn_set<T: Serialize>(
    txn: &mut dyn StoreTransaction,
    collection: &str,
    id: &str,
    data: &T,
) -> Result<(), StoreError> {
    txn.set(collection, id, encode(data)?);
    Ok(())
}

/// Run an idempotent operation with a bounded number of retries on
/// transaction conflicts. Any other error, and a conflict on the final
/// attempt, is surfaced.
pub async fn with_retries<T, Fut>(
    max_attempts: u32,
    mut op: impl FnMut() -> Fut,
) -> Result<T, StoreError>
where
    Fut: std::future::Future<Output = Result<T, StoreError>>,
{
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op().await {
            Err(StoreError::Conflict(key)) if attempt < max_attempts => {
                tracing::warn!(attempt, %key, "Transaction conflict, retrying");
            }
            other => return other,
        }
    }
}
