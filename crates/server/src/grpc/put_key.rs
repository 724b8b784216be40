use kaas_common::proto::{KeyPut, Response as KeyResponse};
use kaas_common::{status, PrivateKey};
use tonic::{Request, Response, Status};
use zeroize::Zeroizing;

use super::blocking::{require_name, Backend};
use super::error::ServiceError;

pub async fn handle_put_private_key(
    backend: &Backend,
    request: Request<KeyPut>,
) -> Result<Response<KeyResponse>, Status> {
    let req = request.into_inner();
    let material = Zeroizing::new(req.private_key);
    let name = require_name(req.name)?;

    // Decode before touching storage so malformed input never reaches it.
    let key = PrivateKey::from_bytes(&material).map_err(ServiceError::from)?;

    let stored_name = name.clone();
    backend.run(move |store| store.put(&stored_name, &key)).await?;

    tracing::info!(%name, "private key stored");
    Ok(Response::new(KeyResponse {
        status: status::KEY_STORED.into(),
        ..Default::default()
    }))
}
