use tonic::service::Interceptor;
use tonic::{Request, Status};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTag {
    pub request_id: Uuid,
}

impl std::fmt::Display for RequestTag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.request_id.fmt(f)
    }
}

/// Stamps every call with a fresh [`RequestTag`] in its extensions.
#[derive(Clone, Default)]
pub struct RequestTagger;

impl Interceptor for RequestTagger {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        request.extensions_mut().insert(RequestTag {
            request_id: Uuid::new_v4(),
        });
        Ok(request)
    }
}

/// Span for one RPC, tagged with the request id when present.
pub fn request_span<T>(method: &'static str, request: &Request<T>) -> tracing::Span {
    match request.extensions().get::<RequestTag>() {
        Some(tag) => tracing::info_span!("rpc", method, request_id = %tag),
        None => tracing::info_span!("rpc", method),
    }
}
