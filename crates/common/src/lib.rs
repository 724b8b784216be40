pub mod proto {
    tonic::include_proto!("kaas.v1");
}

pub mod auth;
pub mod keys;
pub mod status;

pub use keys::{KeyDecodeError, PrivateKey};
