use kaas_common::proto::{KeyList, Response as KeyResponse};
use kaas_common::status;
use tonic::{Request, Response, Status};

use super::blocking::Backend;

pub async fn handle_list_private_keys(
    backend: &Backend,
    _request: Request<KeyList>,
) -> Result<Response<KeyResponse>, Status> {
    let key_names = backend.run(|store| store.list()).await?;

    tracing::debug!(count = key_names.len(), "keys fetched");
    Ok(Response::new(KeyResponse {
        status: status::KEYS_FETCHED.into(),
        key_names,
        ..Default::default()
    }))
}
