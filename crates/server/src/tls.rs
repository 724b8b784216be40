use std::fs;
use std::path::{Path, PathBuf};

use tonic::transport::{Certificate, Identity, Server, ServerTlsConfig};

use crate::config::TlsConfig;

pub struct TlsIdentity {
    pub cert_pem: Vec<u8>,
    pub key_pem: Vec<u8>,
    pub ca_pem: Option<Vec<u8>>,
    cert_path: PathBuf,
    key_path: PathBuf,
}

impl TlsIdentity {
    pub fn load(config: &TlsConfig) -> Result<Self, TlsLoadError> {
        let cert_pem = read_pem("cert", &config.cert_path)?;
        let key_pem = read_pem("key", &config.key_path)?;
        let ca_pem = config
            .ca_path
            .as_deref()
            .map(|p| read_pem("ca", p))
            .transpose()?;
        Ok(Self {
            cert_pem,
            key_pem,
            ca_pem,
            cert_path: config.cert_path.clone(),
            key_path: config.key_path.clone(),
        })
    }

    /// Installs the identity on `server`. This is where the certificate and
    /// key are actually parsed, so malformed material fails here.
    pub fn apply(&self, server: Server) -> Result<Server, TlsLoadError> {
        server
            .tls_config(self.tonic_server_tls())
            .map_err(|source| TlsLoadError::Invalid {
                cert: self.cert_path.display().to_string(),
                key: self.key_path.display().to_string(),
                source,
            })
    }

    /// Server identity, plus client certificate verification when a CA was
    /// configured.
    fn tonic_server_tls(&self) -> ServerTlsConfig {
        let identity = Identity::from_pem(&self.cert_pem, &self.key_pem);
        let mut tls = ServerTlsConfig::new().identity(identity);
        if let Some(ca) = &self.ca_pem {
            tls = tls.client_ca_root(Certificate::from_pem(ca));
        }
        tls
    }
}

fn read_pem(kind: &'static str, path: &Path) -> Result<Vec<u8>, TlsLoadError> {
    let pem = fs::read(path).map_err(|source| TlsLoadError::Read {
        kind,
        path: path.display().to_string(),
        source,
    })?;
    if !pem.windows(10).any(|w| w == b"-----BEGIN") {
        return Err(TlsLoadError::NotPem {
            kind,
            path: path.display().to_string(),
        });
    }
    Ok(pem)
}

#[derive(Debug, thiserror::Error)]
pub enum TlsLoadError {
    #[error("TLS {kind} {path}: {source}")]
    Read {
        kind: &'static str,
        path: String,
        source: std::io::Error,
    },
    #[error("TLS {kind} {path}: not a PEM file")]
    NotPem { kind: &'static str, path: String },
    #[error("TLS identity {cert} / {key} rejected: {source}")]
    Invalid {
        cert: String,
        key: String,
        source: tonic::transport::Error,
    },
}
