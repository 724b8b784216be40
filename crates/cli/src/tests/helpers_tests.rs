#[cfg(test)]
mod tests {
    use crate::cmd::helpers::{read_key_file, write_key_file, Connection, KeySummary};
    use kaas_common::PrivateKey;

    fn conn(token: Option<&str>) -> Connection {
        Connection {
            server: "http://127.0.0.1:9998".into(),
            token: token.map(String::from),
            ca_cert: None,
            domain: None,
        }
    }

    #[test]
    fn token_required() {
        let err = conn(None).client_config().err().unwrap();
        assert!(err.to_string().contains("KAAS_AUTH_KEY"));
        assert!(conn(Some("")).client_config().is_err());
    }

    #[test]
    fn client_config_carries_token() {
        let cfg = conn(Some("t0k")).client_config().unwrap();
        assert_eq!(cfg.token, "t0k");
        assert!(cfg.ca_cert_pem.is_none());
    }

    #[test]
    fn missing_ca_file_reported() {
        let mut c = conn(Some("t0k"));
        c.ca_cert = Some("/nonexistent/ca.pem".into());
        let err = c.client_config().err().unwrap();
        assert!(err.to_string().contains("CA certificate"));
    }

    #[test]
    fn key_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("k.key");
        let key = PrivateKey::generate_ed25519();
        write_key_file(&path, &key).unwrap();
        assert_eq!(read_key_file(&path).unwrap(), key);
    }

    #[test]
    fn hex_key_file_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("k.hex");
        let key = PrivateKey::generate_ed25519();
        std::fs::write(&path, format!("{}\n", hex::encode(key.to_bytes()))).unwrap();
        assert_eq!(read_key_file(&path).unwrap(), key);
    }

    #[test]
    fn garbage_key_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("junk");
        std::fs::write(&path, "not a key").unwrap();
        assert!(read_key_file(&path).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn written_key_file_is_private() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("k.key");
        write_key_file(&path, &PrivateKey::generate_ed25519()).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0);
    }

    #[cfg(unix)]
    #[test]
    fn overwritten_key_file_is_made_private() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("k.key");
        std::fs::write(&path, b"old").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        let key = PrivateKey::generate_ed25519();
        write_key_file(&path, &key).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o077, 0);
        assert_eq!(read_key_file(&path).unwrap(), key);
    }

    #[test]
    fn summary_omits_private_half_by_default() {
        let key = PrivateKey::generate_ed25519();
        let summary = KeySummary::new("node", &key);
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["key_type"], "KEY_TYPE_ED25519");
        assert_eq!(json["public_key"].as_str().unwrap().len(), 64);
        assert!(json.get("private_key").is_none());
    }
}
