//! Persistence layer: the transactional document-store contract, an
//! in-memory implementation of it, the persisted models, and per-entity
//! repositories.
//!
//! The store itself is an external collaborator as far as the domain is
//! concerned; everything above it talks to the [`store::DocumentStore`]
//! trait and never to a concrete engine.

pub mod memory;
pub mod models;
pub mod repositories;
pub mod store;

pub use memory::MemoryStore;
pub use store::{Document, DocumentStore, StoreError, StoreTransaction, Stored, WriteBatch};
