//! Typed client for the keystore service.
//!
//! ```no_run
//! # async fn demo() -> Result<(), kaas_client::ClientError> {
//! use kaas_client::{ClientConfig, KeystoreClient};
//! use kaas_common::PrivateKey;
//!
//! let mut client = KeystoreClient::connect(ClientConfig::new("http://127.0.0.1:9998", "secret")).await?;
//! client.put_private_key("node-a", &PrivateKey::generate_ed25519()).await?;
//! for name in client.list_private_keys().await? {
//!     println!("{name}");
//! }
//! # Ok(()) }
//! ```

mod interceptor;

use kaas_common::proto::keystore_service_client::KeystoreServiceClient;
use kaas_common::proto::{KeyDelete, KeyGet, KeyList, KeyPut};
use kaas_common::{status, KeyDecodeError, PrivateKey};
use tonic::service::interceptor::InterceptedService;
use tonic::transport::{Certificate, Channel, ClientTlsConfig};
use tonic::Request;

pub use interceptor::AuthInterceptor;

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// `http://host:port`, or `https://` together with `ca_cert_pem`.
    pub endpoint: String,
    pub token: String,
    pub ca_cert_pem: Option<Vec<u8>>,
    /// Overrides the name checked against the server certificate.
    pub domain_name: Option<String>,
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            token: token.into(),
            ca_cert_pem: None,
            domain_name: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    #[error("token is not a valid header value")]
    InvalidToken,
    #[error("transport: {0}")]
    Transport(#[from] tonic::transport::Error),
    #[error("{}: {}", .0.code(), .0.message())]
    Rpc(#[from] tonic::Status),
    #[error("server returned an unusable key: {0}")]
    Key(#[from] KeyDecodeError),
    #[error("unexpected response status {0:?}")]
    UnexpectedStatus(String),
}

impl ClientError {
    /// gRPC code when the server rejected the call.
    pub fn code(&self) -> Option<tonic::Code> {
        match self {
            Self::Rpc(status) => Some(status.code()),
            _ => None,
        }
    }
}

pub struct KeystoreClient {
    inner: KeystoreServiceClient<InterceptedService<Channel, AuthInterceptor>>,
}

impl KeystoreClient {
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        let auth = AuthInterceptor::new(&config.token)?;
        let mut endpoint = Channel::from_shared(config.endpoint.clone())
            .map_err(|_| ClientError::InvalidEndpoint(config.endpoint.clone()))?;

        if let Some(ca) = &config.ca_cert_pem {
            let mut tls = ClientTlsConfig::new().ca_certificate(Certificate::from_pem(ca));
            if let Some(domain) = &config.domain_name {
                tls = tls.domain_name(domain.clone());
            }
            endpoint = endpoint.tls_config(tls)?;
        }

        let channel = endpoint.connect().await?;
        tracing::debug!(endpoint = %config.endpoint, "connected to keystore");
        Ok(Self::with_channel(channel, auth))
    }

    pub fn with_channel(channel: Channel, auth: AuthInterceptor) -> Self {
        Self {
            inner: KeystoreServiceClient::with_interceptor(channel, auth),
        }
    }

    pub async fn put_private_key(&mut self, name: &str, key: &PrivateKey) -> Result<(), ClientError> {
        self.inner
            .put_private_key(Request::new(KeyPut {
                name: name.to_string(),
                private_key: key.to_bytes(),
            }))
            .await?;
        Ok(())
    }

    pub async fn get_private_key(&mut self, name: &str) -> Result<PrivateKey, ClientError> {
        let resp = self
            .inner
            .get_private_key(Request::new(KeyGet {
                name: name.to_string(),
            }))
            .await?
            .into_inner();
        Ok(PrivateKey::from_bytes(&resp.private_key)?)
    }

    /// Succeeds only when the server confirms the deletion.
    pub async fn delete_private_key(&mut self, name: &str) -> Result<(), ClientError> {
        let resp = self
            .inner
            .delete_private_key(Request::new(KeyDelete {
                name: name.to_string(),
            }))
            .await?
            .into_inner();
        if resp.status != status::KEY_DELETED {
            return Err(ClientError::UnexpectedStatus(resp.status));
        }
        Ok(())
    }

    pub async fn list_private_keys(&mut self) -> Result<Vec<String>, ClientError> {
        let resp = self
            .inner
            .list_private_keys(Request::new(KeyList {}))
            .await?
            .into_inner();
        Ok(resp.key_names)
    }
}
