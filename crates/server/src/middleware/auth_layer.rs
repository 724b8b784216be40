use std::sync::Arc;

use kaas_common::auth::{strip_bearer, tokens_match, API_KEY_HEADER, AUTHORIZATION_HEADER};
use tonic::service::Interceptor;
use tonic::{Request, Status};

/// Rejects any call that does not carry the shared secret, either as
/// `authorization: Bearer <token>` or as `x-api-key: <token>`.
#[derive(Clone)]
pub struct AuthInterceptor {
    expected: Arc<str>,
}

impl AuthInterceptor {
    pub fn new(expected: &str) -> Self {
        Self {
            expected: Arc::from(expected),
        }
    }

    pub fn check<T>(&self, request: &Request<T>) -> Result<(), Status> {
        let meta = request.metadata();

        let bearer = meta
            .get(AUTHORIZATION_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(strip_bearer);
        let api_key = meta.get(API_KEY_HEADER).and_then(|v| v.to_str().ok());

        let presented = bearer.or(api_key).ok_or_else(|| {
            tracing::debug!("call rejected: no credential");
            Status::unauthenticated("missing credentials")
        })?;

        if !tokens_match(presented, &self.expected) {
            tracing::debug!("call rejected: credential mismatch");
            return Err(Status::unauthenticated("invalid credentials"));
        }
        Ok(())
    }
}

impl Interceptor for AuthInterceptor {
    fn call(&mut self, request: Request<()>) -> Result<Request<()>, Status> {
        self.check(&request)?;
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::metadata::MetadataValue;

    fn request_with(header: &'static str, value: &str) -> Request<()> {
        let mut req = Request::new(());
        req.metadata_mut()
            .insert(header, MetadataValue::try_from(value).unwrap());
        req
    }

    #[test]
    fn bearer_token_accepted() {
        let mut auth = AuthInterceptor::new("s3cret");
        assert!(auth.call(request_with("authorization", "Bearer s3cret")).is_ok());
    }

    #[test]
    fn api_key_accepted() {
        let mut auth = AuthInterceptor::new("s3cret");
        assert!(auth.call(request_with("x-api-key", "s3cret")).is_ok());
    }

    #[test]
    fn missing_credential_rejected() {
        let mut auth = AuthInterceptor::new("s3cret");
        let err = auth.call(Request::new(())).unwrap_err();
        assert_eq!(err.code(), tonic::Code::Unauthenticated);
    }

    #[test]
    fn wrong_token_rejected() {
        let mut auth = AuthInterceptor::new("s3cret");
        let err = auth
            .call(request_with("authorization", "Bearer guess"))
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::Unauthenticated);
    }

    #[test]
    fn non_bearer_scheme_rejected() {
        let mut auth = AuthInterceptor::new("s3cret");
        let err = auth
            .call(request_with("authorization", "s3cret"))
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::Unauthenticated);
    }

    #[test]
    fn rejection_does_not_echo_token() {
        let mut auth = AuthInterceptor::new("s3cret");
        let err = auth
            .call(request_with("authorization", "Bearer leaked-guess"))
            .unwrap_err();
        assert!(!err.message().contains("leaked-guess"));
        assert!(!err.message().contains("s3cret"));
    }
}
