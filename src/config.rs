//! Settings document and the on-disk locations of persisted state.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::defaults::Defaults;
use crate::error::{Error, Result};

/// Where settings and signers live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    dir: PathBuf,
}

impl Paths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// `dir_override` if given, else `~/.config/hubcast`.
    pub fn resolve(dir_override: Option<PathBuf>) -> Result<Self> {
        if let Some(dir) = dir_override {
            return Ok(Self::new(dir));
        }
        let home = dirs::home_dir().ok_or_else(|| Error::NotFound("home directory".into()))?;
        Ok(Self::new(home.join(".config").join(Defaults::CONFIG_DIR_NAME)))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn settings_file(&self) -> PathBuf {
        self.dir.join(Defaults::SETTINGS_FILE)
    }

    pub fn signers_file(&self) -> PathBuf {
        self.dir.join(Defaults::SIGNERS_FILE)
    }
}

fn default_hub_url() -> String {
    Defaults::HUB_URL.to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_hub_url")]
    pub hub_url: String,
    #[serde(default)]
    pub fid: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            hub_url: default_hub_url(),
            fid: None,
        }
    }
}

impl Settings {
    /// Missing file means defaults; missing fields take their defaults.
    pub async fn load(path: &Path) -> Result<Self> {
        match tokio::fs::read(path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map_err(|e| Error::decode(format!("{}: {e}", path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no settings file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let text = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, text).await?;
        debug!(path = %path.display(), "settings saved");
        Ok(())
    }

    pub fn set_hub_url(&mut self, url: &str) -> Result<()> {
        let url = url.trim().trim_end_matches('/');
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(Error::validation(format!("hub url must be http(s): '{url}'")));
        }
        self.hub_url = url.to_string();
        Ok(())
    }
}
