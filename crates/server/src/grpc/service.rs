use tonic::{Request, Response, Status};
use tracing::Instrument;

use kaas_common::proto::keystore_service_server::KeystoreService;
use kaas_common::proto::{KeyDelete, KeyGet, KeyList, KeyPut, Response as KeyResponse};

use super::blocking::Backend;
use super::delete_key::handle_delete_private_key;
use super::get_key::handle_get_private_key;
use super::list_keys::handle_list_private_keys;
use super::put_key::handle_put_private_key;
use crate::middleware::request_span;

/// gRPC front of the keystore. Holds nothing but the injected backend.
pub struct KeystoreServiceImpl {
    backend: Backend,
}

impl KeystoreServiceImpl {
    pub fn new(backend: Backend) -> Self {
        Self { backend }
    }
}

#[tonic::async_trait]
impl KeystoreService for KeystoreServiceImpl {
    async fn get_private_key(
        &self,
        request: Request<KeyGet>,
    ) -> Result<Response<KeyResponse>, Status> {
        let span = request_span("GetPrivateKey", &request);
        handle_get_private_key(&self.backend, request)
            .instrument(span)
            .await
    }

    async fn put_private_key(
        &self,
        request: Request<KeyPut>,
    ) -> Result<Response<KeyResponse>, Status> {
        let span = request_span("PutPrivateKey", &request);
        handle_put_private_key(&self.backend, request)
            .instrument(span)
            .await
    }

    async fn delete_private_key(
        &self,
        request: Request<KeyDelete>,
    ) -> Result<Response<KeyResponse>, Status> {
        let span = request_span("DeletePrivateKey", &request);
        handle_delete_private_key(&self.backend, request)
            .instrument(span)
            .await
    }

    async fn list_private_keys(
        &self,
        request: Request<KeyList>,
    ) -> Result<Response<KeyResponse>, Status> {
        let span = request_span("ListPrivateKeys", &request);
        handle_list_private_keys(&self.backend, request)
            .instrument(span)
            .await
    }
}
