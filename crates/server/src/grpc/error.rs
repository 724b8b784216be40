use kaas_common::KeyDecodeError;
use tonic::Status;

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("name is required")]
    MissingName,
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(#[from] KeyDecodeError),
    #[error("private key not found")]
    NotFound,
    #[error("storage error: {0}")]
    Storage(StoreError),
    #[error("call cancelled")]
    Cancelled,
}

impl From<StoreError> for ServiceError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => Self::NotFound,
            other => Self::Storage(other),
        }
    }
}

impl From<ServiceError> for Status {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::MissingName => Status::invalid_argument(e.to_string()),
            ServiceError::InvalidKeyMaterial(_) => Status::invalid_argument(e.to_string()),
            ServiceError::NotFound => Status::not_found(e.to_string()),
            ServiceError::Storage(inner) => {
                tracing::error!(error = %inner, "keystore backend failed");
                Status::internal("storage failed")
            }
            ServiceError::Cancelled => Status::cancelled(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tonic::Code;

    #[test]
    fn store_not_found_maps_to_not_found() {
        let status: Status = ServiceError::from(StoreError::NotFound).into();
        assert_eq!(status.code(), Code::NotFound);
    }

    #[test]
    fn storage_failures_are_opaque() {
        let err = StoreError::Io(std::io::Error::other("disk on fire at /var/lib/kaas"));
        let status: Status = ServiceError::from(err).into();
        assert_eq!(status.code(), Code::Internal);
        assert_eq!(status.message(), "storage failed");
    }

    #[test]
    fn decode_failure_is_invalid_argument() {
        let status: Status = ServiceError::from(KeyDecodeError::InvalidLength(3)).into();
        assert_eq!(status.code(), Code::InvalidArgument);
        assert!(status.message().contains("invalid key material"));
    }

    #[test]
    fn cancelled_maps_to_cancelled() {
        let status: Status = ServiceError::Cancelled.into();
        assert_eq!(status.code(), Code::Cancelled);
    }
}
