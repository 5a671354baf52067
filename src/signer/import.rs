use ed25519_dalek::SigningKey;
use zeroize::Zeroizing;

use crate::error::{Error, Result};
use crate::util::strip_0x;

pub const PRIVATE_KEY_LEN: usize = 32;
pub const PUBLIC_KEY_LEN: usize = 32;

/// A private key read from user input, with its derived public key.
pub struct ImportedSigner {
    pub private_key: Zeroizing<[u8; PRIVATE_KEY_LEN]>,
    pub public_key: [u8; PUBLIC_KEY_LEN],
}

/// Parses a 64-char hex Ed25519 private key (`0x` prefix optional) and derives
/// its public key.
pub fn import_signer(private_key_hex: &str) -> Result<ImportedSigner> {
    let clean = strip_0x(private_key_hex.trim());
    if clean.len() != PRIVATE_KEY_LEN * 2 {
        return Err(Error::validation(format!(
            "private key must be {} hex chars, got {}",
            PRIVATE_KEY_LEN * 2,
            clean.len()
        )));
    }

    let mut private_key = Zeroizing::new([0u8; PRIVATE_KEY_LEN]);
    hex::decode_to_slice(clean, &mut private_key[..])
        .map_err(|e| Error::validation(format!("bad private key hex: {e}")))?;

    let public_key = derive_public_key(&private_key[..])?;
    Ok(ImportedSigner { private_key, public_key })
}

/// Derives the Ed25519 public key for a raw 32-byte private key.
pub fn derive_public_key(private_key: &[u8]) -> Result<[u8; PUBLIC_KEY_LEN]> {
    let bytes: &[u8; PRIVATE_KEY_LEN] = private_key.try_into().map_err(|_| {
        Error::validation(format!(
            "private key must be {PRIVATE_KEY_LEN} bytes, got {}",
            private_key.len()
        ))
    })?;
    Ok(SigningKey::from_bytes(bytes).verifying_key().to_bytes())
}
