use tonic::service::Interceptor;
use tonic::{Request, Status};

use super::auth_layer::AuthInterceptor;
use super::request_tag::RequestTagger;
use crate::lifecycle::Lifecycle;

/// Interceptor chain run in front of every keystore call, in this order:
/// drain gate, authentication, request tagging. The first stage to fail
/// short-circuits the call.
#[derive(Clone)]
pub struct Pipeline {
    lifecycle: Lifecycle,
    auth: AuthInterceptor,
    tagger: RequestTagger,
}

impl Pipeline {
    pub fn new(lifecycle: Lifecycle, auth: AuthInterceptor) -> Self {
        Self {
            lifecycle,
            auth,
            tagger: RequestTagger,
        }
    }
}

impl Interceptor for Pipeline {
    fn call(&mut self, request: Request<()>) -> Result<Request<()>, Status> {
        if self.lifecycle.is_draining() {
            return Err(Status::unavailable("server is draining"));
        }
        let request = self.auth.call(request)?;
        self.tagger.call(request)
    }
}
