use kaas_common::{KeyDecodeError, PrivateKey};

/// Persistent name -> private key store backing the service.
///
/// Implementations must be safe for concurrent use. For a single name, a
/// `get` racing a `put` must observe either the previous key or the new one,
/// never a partial write. The service adds no locking of its own.
pub trait Keystore: Send + Sync {
    fn get(&self, name: &str) -> Result<PrivateKey, StoreError>;
    fn put(&self, name: &str, key: &PrivateKey) -> Result<(), StoreError>;
    fn delete(&self, name: &str) -> Result<(), StoreError>;
    fn list(&self) -> Result<Vec<String>, StoreError>;

    /// Flushes and releases the store. Later calls fail with
    /// [`StoreError::Closed`].
    fn close(&self) -> Result<(), StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("key not found")]
    NotFound,
    #[error("keystore is read-only")]
    ReadOnly,
    #[error("keystore is closed")]
    Closed,
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("crypto: {0}")]
    Crypto(String),
    #[error("corrupt record: {0}")]
    Corrupt(#[from] KeyDecodeError),
    #[error("backend: {0}")]
    Backend(String),
}
