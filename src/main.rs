use anyhow::{Context, Result};
use clap::Parser;
use hubcast::config::Paths;
use hubcast::context::AppContext;
use hubcast::crypto::KdfParams;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;

use crate::cli::{Cli, Command};
use crate::commands::publish::Reaction;

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("hubcast={level},warn").into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let paths = Paths::resolve(cli.config_dir.clone()).context("locating config directory")?;
    let mut ctx = AppContext::open(paths, cli.hub_url.as_deref(), KdfParams::default())
        .await
        .context("loading settings")?;
    let password = cli.password.as_deref();

    match cli.cmd {
        Command::Signer { cmd } => commands::signer::run(&mut ctx, cmd, password).await,
        Command::Post { text, reply_to, channel, embeds } => {
            commands::publish::post(&ctx, password, &text, reply_to.as_deref(), channel, embeds).await
        }
        Command::Delete { hash } => commands::publish::delete(&ctx, password, &hash).await,
        Command::Like { fid, hash } => {
            commands::publish::react(&ctx, password, Reaction::Like, fid, &hash).await
        }
        Command::Unlike { fid, hash } => {
            commands::publish::react(&ctx, password, Reaction::Unlike, fid, &hash).await
        }
        Command::Recast { fid, hash } => {
            commands::publish::react(&ctx, password, Reaction::Recast, fid, &hash).await
        }
        Command::Unrecast { fid, hash } => {
            commands::publish::react(&ctx, password, Reaction::Unrecast, fid, &hash).await
        }
        Command::Follow { user } => commands::publish::link(&ctx, password, &user, true).await,
        Command::Unfollow { user } => commands::publish::link(&ctx, password, &user, false).await,
        Command::Feed { fid } => commands::read::feed(&ctx, fid).await,
        Command::Mentions { fid } => commands::read::mentions(&ctx, fid).await,
        Command::Thread { fid, hash } => commands::read::thread(&ctx, fid, &hash).await,
        Command::Profile { user } => commands::read::profile(&ctx, &user).await,
        Command::Info { dbstats } => commands::read::info(&ctx, dbstats).await,
        Command::Settings { cmd } => commands::settings::run(&mut ctx, cmd).await,
    }
}
