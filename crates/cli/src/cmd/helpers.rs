use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use kaas_client::{ClientConfig, KeystoreClient};
use kaas_common::PrivateKey;
use serde::Serialize;

pub struct Connection {
    pub server: String,
    pub token: Option<String>,
    pub ca_cert: Option<PathBuf>,
    pub domain: Option<String>,
}

impl Connection {
    pub fn client_config(&self) -> Result<ClientConfig> {
        let token = match self.token.as_deref() {
            Some(t) if !t.is_empty() => t,
            _ => bail!("no auth token: pass --token or set KAAS_AUTH_KEY"),
        };
        let mut config = ClientConfig::new(self.server.clone(), token);
        if let Some(path) = &self.ca_cert {
            let pem = std::fs::read(path)
                .with_context(|| format!("reading CA certificate {}", path.display()))?;
            config.ca_cert_pem = Some(pem);
        }
        config.domain_name = self.domain.clone();
        Ok(config)
    }
}

pub async fn connect(conn: &Connection) -> Result<KeystoreClient> {
    let config = conn.client_config()?;
    KeystoreClient::connect(config)
        .await
        .with_context(|| format!("connecting to {}", conn.server))
}

/// Accepts the binary key encoding or the same bytes as hex text.
pub fn read_key_file(path: &Path) -> Result<PrivateKey> {
    let raw = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    if let Ok(key) = PrivateKey::from_bytes(&raw) {
        return Ok(key);
    }
    let text = std::str::from_utf8(&raw).unwrap_or_default().trim();
    let decoded = hex::decode(text).ok();
    decoded
        .as_deref()
        .and_then(|bytes| PrivateKey::from_bytes(bytes).ok())
        .with_context(|| format!("{} does not contain a supported private key", path.display()))
}

pub fn write_key_file(path: &Path, key: &PrivateKey) -> Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    let mut file = options
        .open(path)
        .with_context(|| format!("creating {}", path.display()))?;
    // `mode` only applies when the file is created.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("restricting permissions on {}", path.display()))?;
    }
    std::io::Write::write_all(&mut file, &key.to_bytes())
        .with_context(|| format!("writing {}", path.display()))
}

#[derive(Serialize)]
pub struct KeySummary {
    pub name: String,
    pub key_type: &'static str,
    pub public_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private_key: Option<String>,
}

impl KeySummary {
    pub fn new(name: &str, key: &PrivateKey) -> Self {
        Self {
            name: name.to_string(),
            key_type: key.key_type().as_str_name(),
            public_key: hex::encode(key.public_key_bytes()),
            private_key: None,
        }
    }
}
