use anyhow::{Context, Result};
use hubcast::context::AppContext;
use hubcast::signer::import_signer;

use super::require_password;
use crate::cli::SignerCommand;

pub async fn run(ctx: &mut AppContext, cmd: SignerCommand, password: Option<&str>) -> Result<()> {
    match cmd {
        SignerCommand::Import { fid, private_key, label } => {
            let password = require_password(password)?;
            let imported = import_signer(&private_key).context("reading private key")?;
            ctx.add_signer(fid, &imported, &label, password)
                .await
                .context("storing signer")?;

            if ctx.settings.fid.is_none() {
                ctx.settings.fid = Some(fid);
                ctx.save_settings().await.context("saving default fid")?;
            }
            println!("✓ Imported signer 0x{} for fid {}", hex::encode(imported.public_key), fid);
        }

        SignerCommand::List => {
            let file = ctx.vault.load().await.context("reading signers")?;
            if file.signers.is_empty() {
                println!("No signers stored. Import one with `hubcast signer import`.");
            }
            let active = file.active_signer_public_key.as_deref();
            for s in &file.signers {
                let marker = if Some(s.public_key.as_str()) == active { "*" } else { " " };
                println!("{marker} 0x{}  fid {}  {}  ({})", s.public_key, s.fid, s.label, s.created_at);
            }
        }

        SignerCommand::Use { public_key } => {
            let record = ctx
                .switch_signer(&public_key)
                .await
                .with_context(|| format!("switching to signer {public_key}"))?;
            println!("✓ Active signer is now 0x{} (fid {})", record.public_key, record.fid);
        }

        SignerCommand::Remove { public_key } => {
            ctx.remove_signer(&public_key)
                .await
                .with_context(|| format!("removing signer {public_key}"))?;
            match ctx.vault.active().await? {
                Some(next) => println!("✓ Removed. Active signer: 0x{} (fid {})", next.public_key, next.fid),
                None => println!("✓ Removed. No active signer."),
            }
        }
    }
    Ok(())
}
