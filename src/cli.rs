use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// hubcast: terminal client for a Farcaster hub
#[derive(Parser, Debug)]
#[command(version, about = "Post to and read from a Farcaster hub")]
pub struct Cli {
    /// Directory holding config.json and signers.json (default: ~/.config/hubcast)
    #[arg(long, env = "HUBCAST_CONFIG_DIR", global = true)]
    pub config_dir: Option<PathBuf>,

    /// Hub base URL, overriding the saved setting for this run
    #[arg(long, env = "HUBCAST_HUB_URL", global = true)]
    pub hub_url: Option<String>,

    /// Vault password (prefer the env var over the flag)
    #[arg(long, env = "HUBCAST_PASSWORD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Manage stored signers
    Signer {
        #[command(subcommand)]
        cmd: SignerCommand,
    },

    /// Publish a cast
    Post {
        text: String,

        /// Reply to a cast, given as FID:HASH
        #[arg(long, value_name = "FID:HASH", conflicts_with = "channel")]
        reply_to: Option<String>,

        /// Post into a channel (parent URL)
        #[arg(long)]
        channel: Option<String>,

        /// URL to embed; repeatable
        #[arg(long = "embed")]
        embeds: Vec<String>,
    },

    /// Delete one of your casts
    Delete { hash: String },

    /// Like a cast
    Like { fid: u64, hash: String },

    /// Remove a like
    Unlike { fid: u64, hash: String },

    /// Recast a cast
    Recast { fid: u64, hash: String },

    /// Remove a recast
    Unrecast { fid: u64, hash: String },

    /// Follow a user (fid, name or @name)
    Follow { user: String },

    /// Unfollow a user (fid, name or @name)
    Unfollow { user: String },

    /// Home feed; falls back to a sample account when no fid is known
    Feed {
        #[arg(long)]
        fid: Option<u64>,
    },

    /// Recent casts mentioning you
    Mentions {
        #[arg(long)]
        fid: Option<u64>,
    },

    /// A cast and its direct replies
    Thread { fid: u64, hash: String },

    /// A user's profile and recent casts (fid, name or @name)
    Profile { user: String },

    /// Hub version and stats
    Info {
        #[arg(long)]
        dbstats: bool,
    },

    /// Show or change saved settings
    Settings {
        #[command(subcommand)]
        cmd: SettingsCommand,
    },
}

#[derive(Subcommand, Debug)]
pub enum SignerCommand {
    /// Import an Ed25519 signer key for a fid
    Import {
        #[arg(long)]
        fid: u64,

        /// 64 hex chars, 0x optional (prefer the env var over the flag)
        #[arg(long, env = "HUBCAST_PRIVATE_KEY", hide_env_values = true)]
        private_key: String,

        #[arg(long, default_value = "default")]
        label: String,
    },

    /// List stored signers
    List,

    /// Make a stored signer active
    Use { public_key: String },

    /// Delete a stored signer
    Remove { public_key: String },
}

#[derive(Subcommand, Debug)]
pub enum SettingsCommand {
    Show,

    SetHub { url: String },

    /// Set the default fid; "none" clears it
    SetFid { fid: String },
}
