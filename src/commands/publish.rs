use anyhow::{anyhow, Context, Result};
use hubcast::context::AppContext;
use hubcast::hub::{CastOptions, CastParent, SubmitReceipt};
use hubcast::util::hex_to_bytes;

use super::require_password;

#[derive(Debug, Clone, Copy)]
pub enum Reaction {
    Like,
    Unlike,
    Recast,
    Unrecast,
}

/// Parses `FID:HASH` as used by `--reply-to`.
pub fn parse_cast_ref(s: &str) -> Result<(u64, Vec<u8>)> {
    let (fid, hash) = s
        .split_once(':')
        .ok_or_else(|| anyhow!("expected FID:HASH, got '{s}'"))?;
    let fid = fid.trim().parse().with_context(|| format!("bad fid in '{s}'"))?;
    Ok((fid, hex_to_bytes(hash.trim())?))
}

fn report(what: &str, receipt: &SubmitReceipt) {
    println!("✓ {what} {}", receipt.hash);
}

pub async fn post(
    ctx: &AppContext,
    password: Option<&str>,
    text: &str,
    reply_to: Option<&str>,
    channel: Option<String>,
    embeds: Vec<String>,
) -> Result<()> {
    let parent = match (reply_to, channel) {
        (Some(r), _) => {
            let (fid, hash) = parse_cast_ref(r)?;
            Some(CastParent::Cast { fid, hash })
        }
        (None, Some(url)) => Some(CastParent::Url(url)),
        (None, None) => None,
    };
    let opts = CastOptions { parent, embeds, ..Default::default() };

    let signer = ctx.signer(require_password(password)?).await.context("unlocking signer")?;
    let receipt = ctx
        .submitter
        .publish_cast(&signer, text, opts)
        .await
        .context("publishing cast")?;
    report("Cast published", &receipt);
    Ok(())
}

pub async fn delete(ctx: &AppContext, password: Option<&str>, hash: &str) -> Result<()> {
    let target = hex_to_bytes(hash)?;
    let signer = ctx.signer(require_password(password)?).await.context("unlocking signer")?;
    let receipt = ctx
        .submitter
        .delete_cast(&signer, &target)
        .await
        .with_context(|| format!("deleting cast {hash}"))?;
    report("Cast deleted", &receipt);
    Ok(())
}

pub async fn react(
    ctx: &AppContext,
    password: Option<&str>,
    reaction: Reaction,
    fid: u64,
    hash: &str,
) -> Result<()> {
    let target = hex_to_bytes(hash)?;
    let signer = ctx.signer(require_password(password)?).await.context("unlocking signer")?;
    let submitter = &ctx.submitter;
    let receipt = match reaction {
        Reaction::Like => submitter.like_cast(&signer, fid, &target).await,
        Reaction::Unlike => submitter.unlike_cast(&signer, fid, &target).await,
        Reaction::Recast => submitter.recast(&signer, fid, &target).await,
        Reaction::Unrecast => submitter.unrecast(&signer, fid, &target).await,
    }
    .with_context(|| format!("{reaction:?} on cast {hash}"))?;
    report(&format!("{reaction:?}"), &receipt);
    Ok(())
}

pub async fn link(ctx: &AppContext, password: Option<&str>, user: &str, follow: bool) -> Result<()> {
    let target = ctx
        .client
        .resolve_user(user)
        .await
        .with_context(|| format!("looking up user '{user}'"))?;
    let signer = ctx.signer(require_password(password)?).await.context("unlocking signer")?;
    let receipt = if follow {
        ctx.submitter.follow(&signer, target).await
    } else {
        ctx.submitter.unfollow(&signer, target).await
    }
    .with_context(|| format!("updating follow of fid {target}"))?;
    report(if follow { "Followed" } else { "Unfollowed" }, &receipt);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cast_ref() {
        let (fid, hash) = parse_cast_ref("3:0x0a0b").unwrap();
        assert_eq!(fid, 3);
        assert_eq!(hash, vec![0x0a, 0x0b]);
        assert!(parse_cast_ref("0x0a0b").is_err());
        assert!(parse_cast_ref("x:0a").is_err());
        assert!(parse_cast_ref("3:zz").is_err());
    }
}
