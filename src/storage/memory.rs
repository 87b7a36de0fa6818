//! In-memory storage, used by tests and ephemeral runs.

use std::sync::Mutex;

use futures_util::future::{self, BoxFuture, FutureExt};
use serde_json::{Map, Value};

use super::KeyValueStore;
use crate::error::StorageError;

#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<Map<String, Value>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<Option<Value>, StorageError>> {
        let value = self
            .values
            .lock()
            .expect("memory store mutex poisoned")
            .get(key)
            .cloned();
        future::ready(Ok(value)).boxed()
    }

    fn set<'a>(&'a self, key: &'a str, value: Value) -> BoxFuture<'a, Result<(), StorageError>> {
        self.values
            .lock()
            .expect("memory store mutex poisoned")
            .insert(key.to_string(), value);
        future::ready(Ok(())).boxed()
    }
}
