pub mod publish;
pub mod read;
pub mod settings;
pub mod signer;

use anyhow::{anyhow, Result};
use hubcast::defaults::Defaults;
use tracing::warn;

/// The vault password from `--password` / `HUBCAST_PASSWORD`.
pub fn require_password(password: Option<&str>) -> Result<&str> {
    let pw = password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| anyhow!("a vault password is required (--password or HUBCAST_PASSWORD)"))?;
    if pw.chars().count() < Defaults::WEAK_PASSWORD_CHARS {
        warn!(
            "vault password is shorter than {} characters",
            Defaults::WEAK_PASSWORD_CHARS
        );
    }
    Ok(pw)
}
