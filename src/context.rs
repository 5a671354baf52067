//! Everything a running client shares, built once and passed by reference.

use std::sync::Arc;

use tracing::info;

use crate::config::{Paths, Settings};
use crate::crypto::{Codec, KdfParams};
use crate::error::{Error, Result};
use crate::hub::{FeedAssembler, HttpTransport, HubClient, HubTransport, MessageSubmitter, ProfileCache};
use crate::signer::{ImportedSigner, SessionSigner, SignerRecord, SignerVault, SigningSession};

pub struct AppContext {
    pub paths: Paths,
    pub settings: Settings,
    pub vault: Arc<SignerVault>,
    pub session: SigningSession,
    pub client: HubClient,
    pub profiles: Arc<ProfileCache>,
    pub submitter: MessageSubmitter,
    pub feed: FeedAssembler,
}

impl AppContext {
    /// Loads settings from `paths` and connects to the configured hub, or to
    /// `hub_url` when given.
    pub async fn open(paths: Paths, hub_url: Option<&str>, kdf: KdfParams) -> Result<Self> {
        let settings = Settings::load(&paths.settings_file()).await?;
        let url = hub_url.unwrap_or(settings.hub_url.as_str());
        let transport = Arc::new(HttpTransport::new(url)?);
        info!(hub = %transport.base_url(), "using hub");
        Ok(Self::with_transport(paths, settings, transport, Codec::new(kdf)))
    }

    pub fn with_transport(
        paths: Paths,
        settings: Settings,
        transport: Arc<dyn HubTransport>,
        codec: Codec,
    ) -> Self {
        let vault = Arc::new(SignerVault::new(paths.signers_file(), codec));
        let session = SigningSession::new(vault.clone());
        let client = HubClient::new(transport.clone());
        let profiles = Arc::new(ProfileCache::new(client.clone()));
        let submitter = MessageSubmitter::new(transport);
        let feed = FeedAssembler::new(client.clone(), profiles.clone());

        Self {
            paths,
            settings,
            vault,
            session,
            client,
            profiles,
            submitter,
            feed,
        }
    }

    pub async fn save_settings(&self) -> Result<()> {
        self.settings.save(&self.paths.settings_file()).await
    }

    /// The fid views default to: the configured one, else the active signer's.
    pub async fn effective_fid(&self) -> Result<Option<u64>> {
        if let Some(fid) = self.settings.fid {
            return Ok(Some(fid));
        }
        Ok(self.vault.active().await?.map(|r| r.fid))
    }

    /// The active signer, decrypted once per session.
    pub async fn signer(&self, password: &str) -> Result<Arc<SessionSigner>> {
        self.session
            .get_signer(password)
            .await?
            .ok_or_else(|| Error::NotFound("no active signer; import one first".into()))
    }

    pub async fn add_signer(
        &self,
        fid: u64,
        imported: &ImportedSigner,
        label: &str,
        password: &str,
    ) -> Result<()> {
        self.vault
            .add(fid, &imported.private_key[..], &imported.public_key, label, password)
            .await?;
        self.session.invalidate().await;
        Ok(())
    }

    pub async fn remove_signer(&self, public_key: &str) -> Result<()> {
        self.vault.remove(public_key).await?;
        self.session.invalidate().await;
        Ok(())
    }

    pub async fn switch_signer(&self, public_key: &str) -> Result<SignerRecord> {
        self.vault.set_active(public_key).await?;
        self.session.invalidate().await;
        self.vault
            .active()
            .await?
            .ok_or_else(|| Error::NotFound(format!("signer {public_key}")))
    }
}
