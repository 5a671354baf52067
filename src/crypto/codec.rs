//! Password-based encryption for signer keys at rest.
//!
//! Argon2id turns the password and a fresh 16-byte salt into a 32-byte key;
//! ChaCha20-Poly1305 encrypts under a fresh 12-byte nonce with a detached tag.
//! The stored form is `salt:nonce:ciphertext:tag`, each field standard base64.

use std::fmt;
use std::str::FromStr;

use argon2::{Algorithm, Argon2, Params, Version};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use chacha20poly1305::aead::{AeadInPlace, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce, Tag};
use rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use zeroize::{Zeroize, Zeroizing};

use crate::defaults::Defaults;
use crate::error::{Error, Result};

pub const SALT_LEN: usize = 16;
pub const NONCE_LEN: usize = 12;
pub const TAG_LEN: usize = 16;
pub const KEY_LEN: usize = 32;

/// Argon2id cost. Not stored in the blob, so a vault must be read back with the
/// same parameters it was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KdfParams {
    pub m_cost_kib: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

impl KdfParams {
    pub fn new(m_cost_kib: u32, t_cost: u32, p_cost: u32) -> Self {
        Self { m_cost_kib, t_cost, p_cost }
    }
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            m_cost_kib: Defaults::ARGON2_MEMORY_KIB,
            t_cost: Defaults::ARGON2_ITERATIONS,
            p_cost: Defaults::ARGON2_PARALLELISM,
        }
    }
}

/// One encrypted value: salt, nonce, ciphertext and tag.
#[derive(Clone, PartialEq, Eq)]
pub struct EncryptedBlob {
    pub salt: [u8; SALT_LEN],
    pub nonce: [u8; NONCE_LEN],
    pub ciphertext: Vec<u8>,
    pub tag: [u8; TAG_LEN],
}

// Keep ciphertext out of logs.
impl fmt::Debug for EncryptedBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncryptedBlob")
            .field("ciphertext_len", &self.ciphertext.len())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for EncryptedBlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            STANDARD.encode(self.salt),
            STANDARD.encode(self.nonce),
            STANDARD.encode(&self.ciphertext),
            STANDARD.encode(self.tag),
        )
    }
}

impl FromStr for EncryptedBlob {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 4 {
            return Err(Error::decode(format!(
                "encrypted blob has {} fields, expected 4",
                parts.len()
            )));
        }

        let salt = decode_fixed::<SALT_LEN>(parts[0], "salt")?;
        let nonce = decode_fixed::<NONCE_LEN>(parts[1], "nonce")?;
        let ciphertext = STANDARD
            .decode(parts[2])
            .map_err(|e| Error::decode(format!("bad ciphertext base64: {e}")))?;
        let tag = decode_fixed::<TAG_LEN>(parts[3], "tag")?;

        Ok(Self { salt, nonce, ciphertext, tag })
    }
}

fn decode_fixed<const N: usize>(field: &str, name: &str) -> Result<[u8; N]> {
    let bytes = STANDARD
        .decode(field)
        .map_err(|e| Error::decode(format!("bad {name} base64: {e}")))?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| Error::decode(format!("{name} must be {N} bytes, got {}", bytes.len())))
}

impl Serialize for EncryptedBlob {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EncryptedBlob {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Encrypts and decrypts blobs under a password with a fixed KDF cost.
#[derive(Debug, Clone, Copy, Default)]
pub struct Codec {
    params: KdfParams,
}

impl Codec {
    pub fn new(params: KdfParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> KdfParams {
        self.params
    }

    fn derive_key(&self, password: &[u8], salt: &[u8]) -> Result<Zeroizing<[u8; KEY_LEN]>> {
        let params = Params::new(
            self.params.m_cost_kib,
            self.params.t_cost,
            self.params.p_cost,
            Some(KEY_LEN),
        )
        .map_err(|e| Error::validation(format!("invalid Argon2 params: {e}")))?;

        let argon = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut key = Zeroizing::new([0u8; KEY_LEN]);
        argon
            .hash_password_into(password, salt, &mut key[..])
            .map_err(|e| Error::validation(format!("Argon2 error: {e}")))?;
        Ok(key)
    }

    /// Encrypts `plaintext` under a key derived from `password` and a fresh salt.
    pub fn encrypt(&self, plaintext: &[u8], password: &[u8]) -> Result<EncryptedBlob> {
        let mut rng = ChaCha20Rng::from_entropy();
        let mut salt = [0u8; SALT_LEN];
        rng.fill_bytes(&mut salt);
        let mut nonce = [0u8; NONCE_LEN];
        rng.fill_bytes(&mut nonce);

        let key = self.derive_key(password, &salt)?;
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&key[..]));

        let mut buffer = plaintext.to_vec();
        let tag = match cipher.encrypt_in_place_detached(Nonce::from_slice(&nonce), b"", &mut buffer) {
            Ok(tag) => tag,
            Err(e) => {
                buffer.zeroize();
                return Err(Error::validation(format!("encrypt error: {e}")));
            }
        };

        let mut tag_bytes = [0u8; TAG_LEN];
        tag_bytes.copy_from_slice(&tag);

        Ok(EncryptedBlob {
            salt,
            nonce,
            ciphertext: buffer,
            tag: tag_bytes,
        })
    }

    /// Decrypts `blob`, failing with [`Error::Authentication`] when the tag does
    /// not verify.
    pub fn decrypt(&self, blob: &EncryptedBlob, password: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        let key = self.derive_key(password, &blob.salt)?;
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&key[..]));

        let mut buffer = Zeroizing::new(blob.ciphertext.clone());
        cipher
            .decrypt_in_place_detached(
                Nonce::from_slice(&blob.nonce),
                b"",
                buffer.as_mut_slice(),
                Tag::from_slice(&blob.tag),
            )
            .map_err(|_| Error::Authentication)?;

        Ok(buffer)
    }
}
