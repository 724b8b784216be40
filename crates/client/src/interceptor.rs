use kaas_common::auth::{bearer, AUTHORIZATION_HEADER};
use tonic::metadata::{Ascii, MetadataValue};
use tonic::service::Interceptor;
use tonic::{Request, Status};

use crate::ClientError;

/// Attaches `authorization: Bearer <token>` to every outgoing call.
#[derive(Clone)]
pub struct AuthInterceptor {
    header: MetadataValue<Ascii>,
}

impl AuthInterceptor {
    pub fn new(token: &str) -> Result<Self, ClientError> {
        let mut header =
            MetadataValue::try_from(bearer(token)).map_err(|_| ClientError::InvalidToken)?;
        header.set_sensitive(true);
        Ok(Self { header })
    }
}

impl Interceptor for AuthInterceptor {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        request
            .metadata_mut()
            .insert(AUTHORIZATION_HEADER, self.header.clone());
        Ok(request)
    }
}
