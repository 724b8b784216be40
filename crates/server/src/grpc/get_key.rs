use kaas_common::proto::{KeyGet, Response as KeyResponse};
use kaas_common::status;
use tonic::{Request, Response, Status};

use super::blocking::{require_name, Backend};

pub async fn handle_get_private_key(
    backend: &Backend,
    request: Request<KeyGet>,
) -> Result<Response<KeyResponse>, Status> {
    let name = require_name(request.into_inner().name)?;

    let lookup = name.clone();
    let key = backend.run(move |store| store.get(&lookup))
        .await
        .inspect_err(|_| tracing::debug!(%name, "private key lookup failed"))?;

    tracing::info!(%name, "private key retrieved");
    Ok(Response::new(KeyResponse {
        status: status::KEY_RETRIEVED.into(),
        private_key: key.to_bytes(),
        ..Default::default()
    }))
}
