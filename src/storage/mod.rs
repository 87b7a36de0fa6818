//! Durable key/value storage.
//!
//! # Responsibilities
//! - Persist the configured candidate list (`optionList` key)
//! - Provide an async get/set interface independent of the backing medium
//!
//! # Design Decisions
//! - Values are `serde_json::Value` so callers own their schema
//! - Object-safe trait returning boxed futures, shared as `Arc<dyn KeyValueStore>`
//! - Runtime state (active override, menu) is never persisted

pub mod file;
pub mod memory;

use futures_util::future::BoxFuture;
use serde_json::Value;

use crate::error::StorageError;

pub use file::JsonFileStore;
pub use memory::MemoryStore;

/// Async key/value store.
pub trait KeyValueStore: Send + Sync {
    /// Read a key. Missing keys yield `Ok(None)`.
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Value>, StorageError>>;

    /// Write a key, replacing any previous value.
    fn set<'a>(&'a self, key: &'a str, value: Value) -> BoxFuture<'a, Result<(), StorageError>>;
}
