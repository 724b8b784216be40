use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

pub const AUTH_KEY_ENV: &str = "KAAS_AUTH_KEY";
pub const PASSPHRASE_ENV: &str = "KAAS_KEYSTORE_PASSPHRASE";

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default)]
    pub protocol: Protocol,
    #[serde(default)]
    pub auth_key: SecretString,
    #[serde(default)]
    pub tls: Option<TlsConfig>,
    #[serde(default)]
    pub keystore: KeystoreConfig,
    #[serde(default = "default_grace_period")]
    pub grace_period_secs: u64,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub log_format: LogFormat,
}

impl ServerConfig {
    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.grace_period_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Tcp,
    Unix,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
    #[serde(default)]
    pub ca_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
pub struct KeystoreConfig {
    #[serde(default)]
    pub backend: BackendKind,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub passphrase: SecretString,
    #[serde(default)]
    pub read_only: bool,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    File,
    Memory,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// String whose `Debug` output is redacted.
#[derive(Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct SecretString(String);

impl SecretString {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Debug for SecretString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretString(***)")
    }
}

fn default_listen_addr() -> String {
    "127.0.0.1:9998".to_string()
}

fn default_grace_period() -> u64 {
    10
}

fn default_request_timeout() -> u64 {
    30
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("validation: {0}")]
    Validation(String),
}

pub fn load_from_file(path: &Path) -> Result<ServerConfig, LoadError> {
    let contents = std::fs::read_to_string(path)?;
    load_from_str(&contents)
}

pub fn load_from_str(yaml: &str) -> Result<ServerConfig, LoadError> {
    let mut cfg: ServerConfig = serde_yaml::from_str(yaml)?;
    apply_overrides(&mut cfg, |name| std::env::var(name).ok());
    validate(&cfg)?;
    Ok(cfg)
}

/// Replaces secrets with values from `lookup` (the process environment in
/// production) when present and non-empty.
pub fn apply_overrides(cfg: &mut ServerConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(key) = lookup(AUTH_KEY_ENV).filter(|v| !v.is_empty()) {
        cfg.auth_key = SecretString::new(key);
    }
    if let Some(passphrase) = lookup(PASSPHRASE_ENV).filter(|v| !v.is_empty()) {
        cfg.keystore.passphrase = SecretString::new(passphrase);
    }
}

pub fn validate(cfg: &ServerConfig) -> Result<(), LoadError> {
    if cfg.listen_addr.trim().is_empty() {
        return Err(LoadError::Validation("listen_addr must not be empty".into()));
    }
    if cfg.auth_key.is_empty() {
        return Err(LoadError::Validation(format!(
            "auth_key must not be empty (set it in the config or via {AUTH_KEY_ENV})"
        )));
    }
    if cfg.grace_period_secs == 0 {
        return Err(LoadError::Validation("grace_period_secs must be > 0".into()));
    }
    if cfg.request_timeout_secs == 0 {
        return Err(LoadError::Validation("request_timeout_secs must be > 0".into()));
    }
    if let Some(tls) = &cfg.tls {
        if tls.cert_path.as_os_str().is_empty() || tls.key_path.as_os_str().is_empty() {
            return Err(LoadError::Validation(
                "tls.cert_path and tls.key_path must both be set".into(),
            ));
        }
    }
    if cfg.keystore.backend == BackendKind::File {
        if cfg.keystore.path.is_none() {
            return Err(LoadError::Validation(
                "keystore.path is required for the file backend".into(),
            ));
        }
        if cfg.keystore.passphrase.is_empty() {
            return Err(LoadError::Validation(format!(
                "keystore.passphrase must not be empty (set it in the config or via {PASSPHRASE_ENV})"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> ServerConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn valid_config() {
        let yaml = r#"
listen_addr: 0.0.0.0:7000
auth_key: shared-secret
tls:
  cert_path: /etc/kaas/cert.pem
  key_path: /etc/kaas/key.pem
keystore:
  path: /var/lib/kaas
  passphrase: hunter2
  read_only: true
grace_period_secs: 3
log_format: json
"#;
        let cfg = parse(yaml);
        validate(&cfg).unwrap();
        assert_eq!(cfg.listen_addr, "0.0.0.0:7000");
        assert_eq!(cfg.protocol, Protocol::Tcp);
        assert_eq!(cfg.auth_key.expose(), "shared-secret");
        assert_eq!(cfg.keystore.backend, BackendKind::File);
        assert!(cfg.keystore.read_only);
        assert_eq!(cfg.grace_period(), Duration::from_secs(3));
        assert_eq!(cfg.log_format, LogFormat::Json);
        assert!(cfg.tls.unwrap().ca_path.is_none());
    }

    #[test]
    fn defaults_applied() {
        let cfg = parse("auth_key: s\nkeystore:\n  backend: memory\n");
        validate(&cfg).unwrap();
        assert_eq!(cfg.listen_addr, "127.0.0.1:9998");
        assert_eq!(cfg.grace_period_secs, 10);
        assert_eq!(cfg.request_timeout_secs, 30);
        assert_eq!(cfg.log_format, LogFormat::Text);
        assert!(cfg.tls.is_none());
    }

    #[test]
    fn unix_protocol_parsed() {
        let cfg = parse("protocol: unix\nlisten_addr: /run/kaas.sock\nauth_key: s\n");
        assert_eq!(cfg.protocol, Protocol::Unix);
    }

    #[test]
    fn empty_auth_key_rejected() {
        let cfg = parse("keystore:\n  backend: memory\n");
        let err = validate(&cfg).unwrap_err();
        assert!(err.to_string().contains("auth_key"));
    }

    #[test]
    fn file_backend_requires_path_and_passphrase() {
        let cfg = parse("auth_key: s\nkeystore:\n  passphrase: p\n");
        assert!(validate(&cfg).unwrap_err().to_string().contains("keystore.path"));

        let cfg = parse("auth_key: s\nkeystore:\n  path: /tmp/ks\n");
        assert!(validate(&cfg)
            .unwrap_err()
            .to_string()
            .contains("keystore.passphrase"));
    }

    #[test]
    fn zero_grace_period_rejected() {
        let cfg = parse("auth_key: s\ngrace_period_secs: 0\nkeystore:\n  backend: memory\n");
        assert!(validate(&cfg).unwrap_err().to_string().contains("grace_period_secs"));
    }

    #[test]
    fn unknown_protocol_is_parse_error() {
        let err = serde_yaml::from_str::<ServerConfig>("protocol: udp\n").unwrap_err();
        assert!(err.to_string().contains("udp"));
    }

    #[test]
    fn env_overrides_replace_secrets() {
        let mut cfg = parse("auth_key: from-file\nkeystore:\n  path: /tmp/ks\n");
        apply_overrides(&mut cfg, |name| match name {
            AUTH_KEY_ENV => Some("from-env".into()),
            PASSPHRASE_ENV => Some("env-pass".into()),
            _ => None,
        });
        assert_eq!(cfg.auth_key.expose(), "from-env");
        assert_eq!(cfg.keystore.passphrase.expose(), "env-pass");
        validate(&cfg).unwrap();
    }

    #[test]
    fn empty_env_override_ignored() {
        let mut cfg = parse("auth_key: from-file\n");
        apply_overrides(&mut cfg, |_| Some(String::new()));
        assert_eq!(cfg.auth_key.expose(), "from-file");
    }

    #[test]
    fn debug_redacts_secrets() {
        let cfg = parse("auth_key: top-secret\nkeystore:\n  passphrase: also-secret\n");
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("top-secret"));
        assert!(!rendered.contains("also-secret"));
    }

    #[test]
    fn load_from_file_works() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("server.yml");
        std::fs::write(&path, "auth_key: s\nkeystore:\n  backend: memory\n").unwrap();
        let cfg = load_from_file(&path).unwrap();
        assert_eq!(cfg.keystore.backend, BackendKind::Memory);
    }

    #[test]
    fn load_from_missing_file_fails() {
        let err = load_from_file(Path::new("/nonexistent/kaas.yml")).unwrap_err();
        assert!(matches!(err, LoadError::Io(_)));
    }
}
