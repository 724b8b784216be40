mod file;
mod keystore;
mod memory;

use std::sync::Arc;

pub use file::{EncryptedFileKeystore, FileKeystoreOptions};
pub use keystore::{Keystore, StoreError};
pub use memory::InMemoryKeystore;

use crate::config::{BackendKind, KeystoreConfig};

/// Opens the backend selected by the config. Failure here aborts startup.
pub fn open_backend(config: &KeystoreConfig) -> Result<Arc<dyn Keystore>, StoreError> {
    match config.backend {
        BackendKind::Memory => {
            tracing::warn!("using in-memory keystore, keys will not survive a restart");
            Ok(Arc::new(InMemoryKeystore::new()))
        }
        BackendKind::File => {
            let path = config
                .path
                .clone()
                .ok_or_else(|| StoreError::Backend("keystore.path is not set".into()))?;
            let store = EncryptedFileKeystore::open(&FileKeystoreOptions {
                path,
                passphrase: config.passphrase.expose().to_string(),
                read_only: config.read_only,
            })?;
            Ok(Arc::new(store))
        }
    }
}
