//! Private key representation.
//!
//! Keys travel as a protobuf `EncodedPrivateKey` envelope. Ed25519 payloads
//! are the 64-byte `secret || public` form; a bare 32-byte seed is accepted on
//! decode but never produced.

use ed25519_dalek::{SigningKey, KEYPAIR_LENGTH, SECRET_KEY_LENGTH};
use prost::Message;
use rand::rngs::OsRng;
use subtle::ConstantTimeEq;
use zeroize::{Zeroize, Zeroizing};

use crate::proto::{EncodedPrivateKey, KeyType};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyDecodeError {
    #[error("malformed key envelope")]
    Malformed,
    #[error("unsupported key type {0}")]
    UnsupportedType(i32),
    #[error("invalid ed25519 key length {0}")]
    InvalidLength(usize),
    #[error("ed25519 public key does not match secret key")]
    PublicKeyMismatch,
}

#[derive(Clone)]
pub enum PrivateKey {
    Ed25519(SigningKey),
}

impl PrivateKey {
    pub fn generate_ed25519() -> Self {
        Self::Ed25519(SigningKey::generate(&mut OsRng))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, KeyDecodeError> {
        let envelope = EncodedPrivateKey::decode(bytes).map_err(|_| KeyDecodeError::Malformed)?;
        let data = Zeroizing::new(envelope.data);

        match KeyType::try_from(envelope.key_type) {
            Ok(KeyType::Ed25519) => decode_ed25519(&data).map(Self::Ed25519),
            _ => Err(KeyDecodeError::UnsupportedType(envelope.key_type)),
        }
    }

    /// Canonical encoding. `from_bytes(&k.to_bytes())` always yields `k`.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut envelope = match self {
            Self::Ed25519(sk) => EncodedPrivateKey {
                key_type: KeyType::Ed25519.into(),
                data: sk.to_keypair_bytes().to_vec(),
            },
        };
        let encoded = envelope.encode_to_vec();
        envelope.data.zeroize();
        encoded
    }

    pub fn key_type(&self) -> KeyType {
        match self {
            Self::Ed25519(_) => KeyType::Ed25519,
        }
    }

    pub fn public_key_bytes(&self) -> Vec<u8> {
        match self {
            Self::Ed25519(sk) => sk.verifying_key().to_bytes().to_vec(),
        }
    }
}

fn decode_ed25519(data: &[u8]) -> Result<SigningKey, KeyDecodeError> {
    match data.len() {
        KEYPAIR_LENGTH => {
            let mut pair = Zeroizing::new([0u8; KEYPAIR_LENGTH]);
            pair.copy_from_slice(data);
            SigningKey::from_keypair_bytes(&pair).map_err(|_| KeyDecodeError::PublicKeyMismatch)
        }
        SECRET_KEY_LENGTH => {
            let mut seed = Zeroizing::new([0u8; SECRET_KEY_LENGTH]);
            seed.copy_from_slice(data);
            Ok(SigningKey::from_bytes(&seed))
        }
        n => Err(KeyDecodeError::InvalidLength(n)),
    }
}

impl PartialEq for PrivateKey {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Ed25519(a), Self::Ed25519(b)) => a.to_bytes()[..].ct_eq(&b.to_bytes()[..]).into(),
        }
    }
}

impl Eq for PrivateKey {}

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateKey")
            .field("key_type", &self.key_type())
            .finish_non_exhaustive()
    }
}
