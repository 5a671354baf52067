//! In-memory cache of the one decrypted signer used for this process.

use std::sync::Arc;

use ed25519_dalek::{Signature, Signer, SigningKey, VerifyingKey};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{Error, Result};
use crate::signer::import::PRIVATE_KEY_LEN;
use crate::signer::vault::ActiveSignerSource;

/// A usable signer for one fid. The key is zeroized on drop.
pub struct SessionSigner {
    key: SigningKey,
    fid: u64,
}

impl SessionSigner {
    pub fn from_bytes(private_key: &[u8], fid: u64) -> Result<Self> {
        let bytes: &[u8; PRIVATE_KEY_LEN] = private_key
            .try_into()
            .map_err(|_| Error::validation("decrypted key is not 32 bytes"))?;
        Ok(Self {
            key: SigningKey::from_bytes(bytes),
            fid,
        })
    }

    pub fn fid(&self) -> u64 {
        self.fid
    }

    pub fn public_key(&self) -> VerifyingKey {
        self.key.verifying_key()
    }

    pub fn sign(&self, msg: &[u8]) -> Signature {
        self.key.sign(msg)
    }
}

pub struct SigningSession {
    source: Arc<dyn ActiveSignerSource>,
    cached: Mutex<Option<Arc<SessionSigner>>>,
}

impl SigningSession {
    pub fn new(source: Arc<dyn ActiveSignerSource>) -> Self {
        Self {
            source,
            cached: Mutex::new(None),
        }
    }

    /// Returns the cached signer, decrypting the vault's active key on first use.
    /// `None` when the vault has no active signer.
    pub async fn get_signer(&self, password: &str) -> Result<Option<Arc<SessionSigner>>> {
        let mut cached = self.cached.lock().await;
        if let Some(signer) = cached.as_ref() {
            return Ok(Some(Arc::clone(signer)));
        }

        let Some(decrypted) = self.source.active_decrypted(password).await? else {
            return Ok(None);
        };
        // decrypted.private_key is zeroized when it drops at the end of this scope
        let signer = Arc::new(SessionSigner::from_bytes(&decrypted.private_key, decrypted.fid)?);
        debug!(fid = signer.fid(), "signing session started");

        *cached = Some(Arc::clone(&signer));
        Ok(Some(signer))
    }

    /// Drops the cached signer. Call after any change to the vault's signers.
    pub async fn invalidate(&self) {
        if self.cached.lock().await.take().is_some() {
            debug!("signing session cleared");
        }
    }

    pub async fn is_cached(&self) -> bool {
        self.cached.lock().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::vault::DecryptedSigner;
    use async_trait::async_trait;
    use ed25519_dalek::Verifier;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use zeroize::Zeroizing;

    struct StubVault {
        calls: AtomicUsize,
        key: Option<[u8; 32]>,
    }

    #[async_trait]
    impl ActiveSignerSource for StubVault {
        async fn active_decrypted(&self, password: &str) -> Result<Option<DecryptedSigner>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if password != "pw" {
                return Err(Error::Authentication);
            }
            Ok(self.key.map(|k| DecryptedSigner {
                fid: 99,
                private_key: Zeroizing::new(k.to_vec()),
            }))
        }
    }

    fn stub(key: Option<[u8; 32]>) -> Arc<StubVault> {
        Arc::new(StubVault { calls: AtomicUsize::new(0), key })
    }

    #[tokio::test]
    async fn test_signer_is_cached() {
        let vault = stub(Some([5u8; 32]));
        let session = SigningSession::new(vault.clone());

        let a = session.get_signer("pw").await.unwrap().unwrap();
        // cached: a wrong password is never looked at
        let b = session.get_signer("not the password").await.unwrap().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(a.fid(), 99);
        assert_eq!(vault.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_requeries_vault() {
        let vault = stub(Some([5u8; 32]));
        let session = SigningSession::new(vault.clone());

        session.get_signer("pw").await.unwrap();
        session.invalidate().await;
        assert!(!session.is_cached().await);
        session.get_signer("pw").await.unwrap();
        assert_eq!(vault.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_no_active_signer() {
        let vault = stub(None);
        let session = SigningSession::new(vault.clone());
        assert!(session.get_signer("pw").await.unwrap().is_none());
        assert!(!session.is_cached().await);
    }

    #[tokio::test]
    async fn test_wrong_password_not_cached() {
        let vault = stub(Some([5u8; 32]));
        let session = SigningSession::new(vault.clone());
        assert!(matches!(session.get_signer("bad").await, Err(Error::Authentication)));
        assert!(!session.is_cached().await);
    }

    #[tokio::test]
    async fn test_signer_signs() {
        let session = SigningSession::new(stub(Some([9u8; 32])));
        let signer = session.get_signer("pw").await.unwrap().unwrap();
        let sig = signer.sign(b"hello");
        assert!(signer.public_key().verify(b"hello", &sig).is_ok());
    }
}
