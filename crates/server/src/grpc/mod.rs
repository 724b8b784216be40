mod blocking;
pub mod delete_key;
mod error;
pub mod get_key;
pub mod list_keys;
pub mod put_key;
mod service;

pub use blocking::Backend;
pub use error::ServiceError;
pub use service::KeystoreServiceImpl;
