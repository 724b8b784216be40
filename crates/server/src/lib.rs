pub mod config;
pub mod grpc;
pub mod incoming;
pub mod lifecycle;
pub mod logging;
pub mod middleware;
pub mod server;
pub mod shutdown;
pub mod store;
pub mod tls;

pub use server::{KeystoreServer, ServerError};
