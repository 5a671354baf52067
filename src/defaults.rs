//! Central place for default values.
//! Update these and the whole app picks them up.

use std::time::Duration;

pub struct Defaults;

impl Defaults {

    /* Persisted state */
    pub const HUB_URL: &'static str = "https://hub.merv.fun";
    pub const CONFIG_DIR_NAME: &'static str = "hubcast";
    pub const SETTINGS_FILE: &'static str = "config.json";
    pub const SIGNERS_FILE: &'static str = "signers.json";

    /* Argon2id cost for the signer vault */
    pub const ARGON2_MEMORY_KIB: u32 = 65_536; // 64 MiB
    pub const ARGON2_ITERATIONS: u32 = 3;
    pub const ARGON2_PARALLELISM: u32 = 4;

    /* Hub transport */
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);
    pub const RETRY_ATTEMPTS: u32 = 3;
    pub const RETRY_BASE_DELAY: Duration = Duration::from_millis(250);

    /* Reads */
    pub const MAX_PAGES: usize = 200;
    pub const FOLLOWS_PAGE_SIZE: u32 = 1000;
    pub const PROFILE_TTL: Duration = Duration::from_secs(60);

    /* Feed assembly */
    pub const FEED_FOLLOW_LIMIT: usize = 50;
    pub const FEED_CASTS_PER_FOLLOW: u32 = 5;
    pub const FEED_OWN_CASTS: u32 = 10;
    pub const FEED_SIZE: usize = 50;
    pub const FEED_SAMPLE_FID: u64 = 3;
    pub const FEED_SAMPLE_SIZE: u32 = 30;
    pub const MENTIONS_PAGE_SIZE: u32 = 30;
    pub const THREAD_REPLIES: u32 = 50;
    pub const PROFILE_CASTS: u32 = 30;
    pub const FANOUT_CONCURRENCY: usize = 8;

    /* Messages */
    pub const MAX_CAST_BYTES: usize = 320;

    /* Passwords shorter than this get a warning, never a rejection */
    pub const WEAK_PASSWORD_CHARS: usize = 8;
}
