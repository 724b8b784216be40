use std::sync::Arc;

use super::error::ServiceError;
use crate::lifecycle::Lifecycle;
use crate::store::{Keystore, StoreError};

/// The injected store plus the lifecycle that tracks calls into it.
#[derive(Clone)]
pub struct Backend {
    store: Arc<dyn Keystore>,
    lifecycle: Lifecycle,
}

impl Backend {
    pub fn new(store: Arc<dyn Keystore>, lifecycle: Lifecycle) -> Self {
        Self { store, lifecycle }
    }

    /// Runs a store call on the blocking pool so slow storage never stalls
    /// the reactor.
    ///
    /// If the caller goes away (client cancel or deadline) the store call
    /// still runs to completion but its result is discarded. Once the
    /// lifecycle is terminated, waiting callers get `Cancelled` and calls not
    /// yet started never reach the store.
    pub(crate) async fn run<T, F>(&self, op: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&dyn Keystore) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        if self.lifecycle.is_terminated() {
            return Err(ServiceError::Cancelled);
        }
        let store = Arc::clone(&self.store);
        let gate = self.lifecycle.clone();
        let call = self
            .lifecycle
            .spawn_backend_call(move || (!gate.is_terminated()).then(|| op(store.as_ref())));

        tokio::select! {
            joined = call => match joined {
                Ok(Some(result)) => result.map_err(ServiceError::from),
                Ok(None) => Err(ServiceError::Cancelled),
                Err(e) if e.is_cancelled() => Err(ServiceError::Cancelled),
                Err(e) => Err(ServiceError::Storage(StoreError::Backend(format!(
                    "backend task panicked: {e}"
                )))),
            },
            _ = self.lifecycle.terminated() => Err(ServiceError::Cancelled),
        }
    }
}

/// Untracked handle with its own lifecycle.
impl From<Arc<dyn Keystore>> for Backend {
    fn from(store: Arc<dyn Keystore>) -> Self {
        Self::new(store, Lifecycle::new())
    }
}

pub(crate) fn require_name(name: String) -> Result<String, ServiceError> {
    if name.is_empty() {
        return Err(ServiceError::MissingName);
    }
    Ok(name)
}
