use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use kaas_common::PrivateKey;

use super::keystore::{Keystore, StoreError};

/// Volatile keystore. Each entry is guarded by its `DashMap` shard lock, so
/// reads of a name never observe a half-applied `put`.
#[derive(Clone, Default)]
pub struct InMemoryKeystore {
    keys: Arc<DashMap<String, PrivateKey>>,
    closed: Arc<AtomicBool>,
}

impl InMemoryKeystore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self) -> usize {
        self.keys.len()
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }
}

impl Keystore for InMemoryKeystore {
    fn get(&self, name: &str) -> Result<PrivateKey, StoreError> {
        self.ensure_open()?;
        self.keys
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::NotFound)
    }

    fn put(&self, name: &str, key: &PrivateKey) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.keys.insert(name.to_string(), key.clone());
        Ok(())
    }

    fn delete(&self, name: &str) -> Result<(), StoreError> {
        self.ensure_open()?;
        self.keys
            .remove(name)
            .map(|_| ())
            .ok_or(StoreError::NotFound)
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        self.ensure_open()?;
        let mut names: Vec<String> = self.keys.iter().map(|e| e.key().clone()).collect();
        names.sort();
        Ok(names)
    }

    fn close(&self) -> Result<(), StoreError> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}
