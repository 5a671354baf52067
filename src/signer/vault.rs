//! Persisted signer records, private keys encrypted at rest.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::crypto::{Codec, EncryptedBlob};
use crate::error::{Error, Result};
use crate::signer::import::{derive_public_key, PRIVATE_KEY_LEN};
use crate::util::strip_0x;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignerRecord {
    pub fid: u64,
    /// Hex, no `0x`.
    pub public_key: String,
    pub encrypted_private_key: EncryptedBlob,
    pub label: String,
    /// RFC 3339.
    pub created_at: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignersFile {
    #[serde(default)]
    pub signers: Vec<SignerRecord>,
    #[serde(default)]
    pub active_signer_public_key: Option<String>,
}

impl SignersFile {
    pub fn find(&self, public_key: &str) -> Option<&SignerRecord> {
        self.signers.iter().find(|s| s.public_key == public_key)
    }

    pub fn active(&self) -> Option<&SignerRecord> {
        self.active_signer_public_key
            .as_deref()
            .and_then(|pk| self.find(pk))
    }
}

/// Raw key bytes of the active signer. Zeroized on drop.
pub struct DecryptedSigner {
    pub fid: u64,
    pub private_key: Zeroizing<Vec<u8>>,
}

/// Anything that can hand out the active signer's decrypted key.
#[async_trait]
pub trait ActiveSignerSource: Send + Sync {
    async fn active_decrypted(&self, password: &str) -> Result<Option<DecryptedSigner>>;
}

pub struct SignerVault {
    path: PathBuf,
    codec: Codec,
    // serializes load-modify-save cycles inside this process
    write_lock: Mutex<()>,
}

fn normalize_key(public_key: &str) -> String {
    strip_0x(public_key.trim()).to_ascii_lowercase()
}

impl SignerVault {
    pub fn new(path: impl Into<PathBuf>, codec: Codec) -> Self {
        Self {
            path: path.into(),
            codec,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The persisted collection, or an empty one if nothing was saved yet.
    pub async fn load(&self) -> Result<SignersFile> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => serde_json::from_str(&text).map_err(|e| {
                Error::decode(format!("parsing {}: {e}", self.path.display()))
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(SignersFile::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn save(&self, file: &SignersFile) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_string_pretty(file)?;

        // write-then-rename so a crash never leaves half a vault behind
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json).await?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o600)).await?;
        }
        tokio::fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), signers = file.signers.len(), "vault saved");
        Ok(())
    }

    /// Encrypts and stores a signer. The first signer added becomes active.
    pub async fn add(
        &self,
        fid: u64,
        private_key: &[u8],
        public_key: &[u8],
        label: &str,
        password: &str,
    ) -> Result<()> {
        if fid == 0 {
            return Err(Error::validation("fid must be a positive integer"));
        }
        if private_key.len() != PRIVATE_KEY_LEN {
            return Err(Error::validation(format!(
                "private key must be {PRIVATE_KEY_LEN} bytes, got {}",
                private_key.len()
            )));
        }
        let derived = derive_public_key(private_key)?;
        if derived.as_slice() != public_key {
            return Err(Error::validation(
                "public key does not match the one derived from the private key",
            ));
        }
        let public_hex = hex::encode(derived);

        let _guard = self.write_lock.lock().await;
        let mut file = self.load().await?;
        if file.find(&public_hex).is_some() {
            return Err(Error::validation(format!("signer {public_hex} is already stored")));
        }

        let encrypted_private_key = self.codec.encrypt(private_key, password.as_bytes())?;
        let created_at = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .map_err(|e| Error::validation(format!("formatting timestamp: {e}")))?;

        file.signers.push(SignerRecord {
            fid,
            public_key: public_hex.clone(),
            encrypted_private_key,
            label: label.to_string(),
            created_at,
        });
        if file.active_signer_public_key.is_none() {
            file.active_signer_public_key = Some(public_hex.clone());
        }

        self.save(&file).await?;
        info!(fid, public_key = %public_hex, "signer added");
        Ok(())
    }

    /// Deletes a signer. If it was active, the first remaining one takes over.
    pub async fn remove(&self, public_key: &str) -> Result<()> {
        let key = normalize_key(public_key);

        let _guard = self.write_lock.lock().await;
        let mut file = self.load().await?;
        let before = file.signers.len();
        file.signers.retain(|s| s.public_key != key);
        if file.signers.len() == before {
            debug!(public_key = %key, "remove: no such signer");
            return Ok(());
        }

        if file.active_signer_public_key.as_deref() == Some(key.as_str()) {
            file.active_signer_public_key = file.signers.first().map(|s| s.public_key.clone());
        }

        self.save(&file).await?;
        info!(public_key = %key, "signer removed");
        Ok(())
    }

    pub async fn set_active(&self, public_key: &str) -> Result<()> {
        let key = normalize_key(public_key);

        let _guard = self.write_lock.lock().await;
        let mut file = self.load().await?;
        if file.find(&key).is_none() {
            return Err(Error::NotFound(format!("no signer with public key {key}")));
        }
        file.active_signer_public_key = Some(key.clone());

        self.save(&file).await?;
        info!(public_key = %key, "active signer changed");
        Ok(())
    }

    /// The active record, without decrypting it.
    pub async fn active(&self) -> Result<Option<SignerRecord>> {
        Ok(self.load().await?.active().cloned())
    }

    /// Decrypts the active signer's key. `None` if no signer is active.
    pub async fn get_active_decrypted(&self, password: &str) -> Result<Option<DecryptedSigner>> {
        let file = self.load().await?;
        let Some(record) = file.active() else {
            return Ok(None);
        };

        let private_key = self
            .codec
            .decrypt(&record.encrypted_private_key, password.as_bytes())?;
        debug!(fid = record.fid, "active signer decrypted");
        Ok(Some(DecryptedSigner { fid: record.fid, private_key }))
    }
}

#[async_trait]
impl ActiveSignerSource for SignerVault {
    async fn active_decrypted(&self, password: &str) -> Result<Option<DecryptedSigner>> {
        self.get_active_decrypted(password).await
    }
}
