use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use aes_gcm::aead::{Aead, KeyInit, OsRng, Payload};
use aes_gcm::{Aes256Gcm, Nonce};
use argon2::Argon2;
use kaas_common::PrivateKey;
use rand::RngCore;
use zeroize::Zeroizing;

use super::keystore::{Keystore, StoreError};

const NONCE_LEN: usize = 12;
const SALT_LEN: usize = 16;
const META_FILE: &str = "keystore.meta";
const RECORD_EXT: &str = "key";
const CHECK_PLAINTEXT: &[u8] = b"kaas-keystore-v1";

#[derive(Debug, Clone)]
pub struct FileKeystoreOptions {
    pub path: PathBuf,
    pub passphrase: String,
    pub read_only: bool,
}

/// Directory-backed keystore.
///
/// Layout: `keystore.meta` holds the Argon2 salt followed by a sealed check
/// value used to reject a wrong passphrase at open time. Each key lives in
/// `<hex(name)>.key` as `nonce || AES-256-GCM(ciphertext)`, with the name as
/// associated data so records cannot be swapped between names. Records are
/// replaced by writing a temporary file and renaming it into place.
pub struct EncryptedFileKeystore {
    dir: PathBuf,
    cipher: Aes256Gcm,
    read_only: bool,
    closed: AtomicBool,
}

impl EncryptedFileKeystore {
    pub fn open(opts: &FileKeystoreOptions) -> Result<Self, StoreError> {
        let dir = opts.path.clone();
        if !opts.read_only {
            fs::create_dir_all(&dir)?;
        }

        let meta_path = dir.join(META_FILE);
        let cipher = match fs::read(&meta_path) {
            Ok(meta) => unlock(&meta, &opts.passphrase)?,
            Err(e) if e.kind() == ErrorKind::NotFound && !opts.read_only => {
                initialize(&meta_path, &opts.passphrase)?
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!(path = %dir.display(), read_only = opts.read_only, "file keystore opened");

        Ok(Self {
            dir,
            cipher,
            read_only: opts.read_only,
            closed: AtomicBool::new(false),
        })
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{}.{RECORD_EXT}", hex::encode(name)))
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(StoreError::Closed);
        }
        Ok(())
    }

    fn ensure_writable(&self) -> Result<(), StoreError> {
        self.ensure_open()?;
        if self.read_only {
            return Err(StoreError::ReadOnly);
        }
        Ok(())
    }
}

impl Keystore for EncryptedFileKeystore {
    fn get(&self, name: &str) -> Result<PrivateKey, StoreError> {
        self.ensure_open()?;
        let blob = match fs::read(self.path_for(name)) {
            Ok(blob) => blob,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(StoreError::NotFound),
            Err(e) => return Err(e.into()),
        };
        let plaintext = Zeroizing::new(open_blob(&self.cipher, &blob, name.as_bytes())?);
        Ok(PrivateKey::from_bytes(&plaintext)?)
    }

    fn put(&self, name: &str, key: &PrivateKey) -> Result<(), StoreError> {
        self.ensure_writable()?;
        let plaintext = Zeroizing::new(key.to_bytes());
        let blob = seal_blob(&self.cipher, &plaintext, name.as_bytes())?;
        write_atomic(&self.path_for(name), &blob)
    }

    fn delete(&self, name: &str) -> Result<(), StoreError> {
        self.ensure_writable()?;
        match fs::remove_file(self.path_for(name)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StoreError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self) -> Result<Vec<String>, StoreError> {
        self.ensure_open()?;
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(RECORD_EXT) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match hex::decode(stem).ok().and_then(|b| String::from_utf8(b).ok()) {
                Some(name) => names.push(name),
                None => tracing::warn!(file = %path.display(), "skipping unrecognized keystore file"),
            }
        }
        names.sort();
        Ok(names)
    }

    fn close(&self) -> Result<(), StoreError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        if !self.read_only {
            sync_dir(&self.dir)?;
        }
        tracing::info!(path = %self.dir.display(), "file keystore closed");
        Ok(())
    }
}

fn derive_cipher(passphrase: &str, salt: &[u8]) -> Result<Aes256Gcm, StoreError> {
    let mut key = Zeroizing::new([0u8; 32]);
    Argon2::default()
        .hash_password_into(passphrase.as_bytes(), salt, &mut key[..])
        .map_err(|e| StoreError::Crypto(e.to_string()))?;
    Aes256Gcm::new_from_slice(&key[..]).map_err(|e| StoreError::Crypto(e.to_string()))
}

fn initialize(meta_path: &Path, passphrase: &str) -> Result<Aes256Gcm, StoreError> {
    let mut salt = [0u8; SALT_LEN];
    OsRng.fill_bytes(&mut salt);
    let cipher = derive_cipher(passphrase, &salt)?;

    let mut meta = salt.to_vec();
    meta.extend(seal_blob(&cipher, CHECK_PLAINTEXT, META_FILE.as_bytes())?);
    write_atomic(meta_path, &meta)?;
    Ok(cipher)
}

fn unlock(meta: &[u8], passphrase: &str) -> Result<Aes256Gcm, StoreError> {
    if meta.len() < SALT_LEN {
        return Err(StoreError::Crypto("keystore metadata too short".into()));
    }
    let (salt, check) = meta.split_at(SALT_LEN);
    let cipher = derive_cipher(passphrase, salt)?;
    match open_blob(&cipher, check, META_FILE.as_bytes()) {
        Ok(plain) if plain == CHECK_PLAINTEXT => Ok(cipher),
        _ => Err(StoreError::Crypto("wrong passphrase".into())),
    }
}

fn seal_blob(cipher: &Aes256Gcm, plaintext: &[u8], aad: &[u8]) -> Result<Vec<u8>, StoreError> {
    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, Payload { msg: plaintext, aad })
        .map_err(|e| StoreError::Crypto(e.to_string()))?;

    let mut blob = Vec::with_capacity(NONCE_LEN + ciphertext.len());
    blob.extend_from_slice(&nonce_bytes);
    blob.extend_from_slice(&ciphertext);
    Ok(blob)
}

fn open_blob(cipher: &Aes256Gcm, blob: &[u8], aad: &[u8]) -> Result<Vec<u8>, StoreError> {
    if blob.len() < NONCE_LEN {
        return Err(StoreError::Crypto("blob too short".into()));
    }
    let (nonce_bytes, ciphertext) = blob.split_at(NONCE_LEN);
    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), Payload { msg: ciphertext, aad })
        .map_err(|e| StoreError::Crypto(e.to_string()))
}

fn write_atomic(path: &Path, data: &[u8]) -> Result<(), StoreError> {
    let tmp = path.with_extension(format!("tmp-{}", uuid::Uuid::new_v4().simple()));
    let result = (|| {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(data)?;
        file.sync_all()?;
        fs::rename(&tmp, path)
    })();
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    Ok(result?)
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> Result<(), StoreError> {
    fs::File::open(dir)?.sync_all()?;
    Ok(())
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> Result<(), StoreError> {
    Ok(())
}
