mod auth_layer;
mod pipeline;
mod request_tag;

pub use auth_layer::AuthInterceptor;
pub use pipeline::Pipeline;
pub use request_tag::{request_span, RequestTag, RequestTagger};
