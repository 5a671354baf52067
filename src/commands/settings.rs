use anyhow::{Context, Result};
use hubcast::context::AppContext;

use crate::cli::SettingsCommand;

/// Parses `set-fid` input; `none` (or empty) clears the default.
pub fn parse_fid_setting(input: &str) -> Result<Option<u64>> {
    let input = input.trim();
    if input.is_empty() || input.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    let fid: u64 = input.parse().with_context(|| format!("bad fid '{input}'"))?;
    anyhow::ensure!(fid > 0, "fid must be a positive integer");
    Ok(Some(fid))
}

pub async fn run(ctx: &mut AppContext, cmd: SettingsCommand) -> Result<()> {
    match cmd {
        SettingsCommand::Show => {
            println!("config dir: {}", ctx.paths.dir().display());
            println!("hub url:    {}", ctx.settings.hub_url);
            match ctx.settings.fid {
                Some(fid) => println!("fid:        {fid}"),
                None => println!("fid:        (not set)"),
            }
            match ctx.vault.active().await? {
                Some(s) => println!("signer:     0x{} ({})", s.public_key, s.label),
                None => println!("signer:     (none)"),
            }
        }
        SettingsCommand::SetHub { url } => {
            ctx.settings.set_hub_url(&url)?;
            ctx.save_settings().await.context("saving settings")?;
            println!("✓ Hub set to {}", ctx.settings.hub_url);
        }
        SettingsCommand::SetFid { fid } => {
            ctx.settings.fid = parse_fid_setting(&fid)?;
            ctx.save_settings().await.context("saving settings")?;
            println!("✓ Default fid updated");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fid_setting() {
        assert_eq!(parse_fid_setting("42").unwrap(), Some(42));
        assert_eq!(parse_fid_setting("none").unwrap(), None);
        assert_eq!(parse_fid_setting("").unwrap(), None);
        assert!(parse_fid_setting("0").is_err());
        assert!(parse_fid_setting("abc").is_err());
    }
}
