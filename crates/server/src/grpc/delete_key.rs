use kaas_common::proto::{KeyDelete, Response as KeyResponse};
use kaas_common::status;
use tonic::{Request, Response, Status};

use super::blocking::{require_name, Backend};

pub async fn handle_delete_private_key(
    backend: &Backend,
    request: Request<KeyDelete>,
) -> Result<Response<KeyResponse>, Status> {
    let name = require_name(request.into_inner().name)?;

    let target = name.clone();
    backend.run(move |store| store.delete(&target)).await?;

    tracing::info!(%name, "private key deleted");
    Ok(Response::new(KeyResponse {
        status: status::KEY_DELETED.into(),
        ..Default::default()
    }))
}
