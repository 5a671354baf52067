use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Context, Result};
use hubcast::context::AppContext;
use hubcast::hub::types::EnrichedCast;
use hubcast::util::relative_age;

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// `Name @user · 3m` header line, then the text and the cast's id.
pub fn format_cast(cast: &EnrichedCast, now: u64) -> String {
    let author = match (cast.author_display_name.as_str(), cast.author_username.as_str()) {
        ("", "") => format!("fid {}", cast.fid),
        ("", user) => format!("@{user}"),
        (name, "") => name.to_string(),
        (name, user) => format!("{name} @{user}"),
    };
    let mut out = format!("{author} · {}\n", relative_age(cast.timestamp, now));
    for line in cast.text.lines() {
        out.push_str("  ");
        out.push_str(line);
        out.push('\n');
    }
    for embed in cast.embeds.iter().filter_map(|e| e.url.as_deref()) {
        out.push_str(&format!("  [{embed}]\n"));
    }
    out.push_str(&format!("  {}:{}", cast.fid, cast.hash));
    out
}

fn print_casts(casts: &[EnrichedCast]) {
    if casts.is_empty() {
        println!("Nothing here yet.");
        return;
    }
    let now = now_unix();
    for cast in casts {
        println!("{}\n", format_cast(cast, now));
    }
}

pub async fn feed(ctx: &AppContext, fid: Option<u64>) -> Result<()> {
    let fid = match fid {
        Some(f) => Some(f),
        None => ctx.effective_fid().await?,
    };
    let casts = ctx.feed.home_feed(fid).await.context("loading feed")?;
    print_casts(&casts);
    Ok(())
}

pub async fn mentions(ctx: &AppContext, fid: Option<u64>) -> Result<()> {
    let fid = match fid {
        Some(f) => f,
        None => ctx
            .effective_fid()
            .await?
            .ok_or_else(|| anyhow!("no fid configured; pass --fid or run `hubcast settings set-fid`"))?,
    };
    let casts = ctx.feed.mentions(fid).await.context("loading mentions")?;
    print_casts(&casts);
    Ok(())
}

pub async fn thread(ctx: &AppContext, fid: u64, hash: &str) -> Result<()> {
    let thread = ctx
        .feed
        .thread(fid, hash)
        .await
        .with_context(|| format!("loading thread {fid}:{hash}"))?;
    let now = now_unix();
    println!("{}\n", format_cast(&thread.root, now));
    println!("── {} replies ──\n", thread.replies.len());
    for reply in &thread.replies {
        println!("{}\n", format_cast(reply, now));
    }
    Ok(())
}

pub async fn profile(ctx: &AppContext, user: &str) -> Result<()> {
    let fid = ctx
        .client
        .resolve_user(user)
        .await
        .with_context(|| format!("looking up user '{user}'"))?;
    let view = ctx.feed.profile_view(fid).await.context("loading profile")?;

    let p = &view.profile;
    println!("{} @{} (fid {})", p.display_name, p.username, p.fid);
    if !p.bio.is_empty() {
        println!("{}", p.bio);
    }
    if !p.url.is_empty() {
        println!("{}", p.url);
    }
    let yes_no = |v: Option<bool>| match v {
        Some(true) => "yes",
        Some(false) => "no",
        None => "?",
    };
    println!(
        "follows others: {}  has followers: {}",
        yes_no(view.follows_anyone),
        yes_no(view.has_followers)
    );
    println!();
    print_casts(&view.casts);
    Ok(())
}

pub async fn info(ctx: &AppContext, dbstats: bool) -> Result<()> {
    let info = ctx.client.info(dbstats).await.context("querying hub info")?;
    println!("hub version: {}", info.version);
    println!("shards:      {}", info.num_shards);
    if let Some(stats) = info.db_stats {
        println!("messages:    {}", stats.num_messages);
        println!("fids:        {}", stats.num_fid_registrations);
        println!("size:        {} bytes", stats.approx_size);
    }
    Ok(())
}
