//! Home feed, mentions, thread and profile views assembled from hub reads.
//!
//! Sub-fetches of a fan-out are best effort: failures are logged and the
//! remaining results are kept. Author enrichment never fails a view.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, warn};

use crate::defaults::Defaults;
use crate::error::{Error, Result};
use crate::hub::profiles::ProfileCache;
use crate::hub::pagination::Page;
use crate::hub::reads::{CastsByFidOptions, HubClient, ParentRef, LINK_FOLLOW};
use crate::hub::types::{EnrichedCast, HubMessage, PageOptions, UserProfile};

#[derive(Debug, Clone, Serialize)]
pub struct Thread {
    pub root: EnrichedCast,
    pub replies: Vec<EnrichedCast>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub profile: UserProfile,
    pub casts: Vec<EnrichedCast>,
    /// Whether the user follows at least one account; `None` if the lookup failed.
    pub follows_anyone: Option<bool>,
    /// Whether at least one account follows the user; `None` if the lookup failed.
    pub has_followers: Option<bool>,
}

/// Combines a cast message with author names. `None` for non-cast messages.
pub fn enriched_cast(msg: &HubMessage, author: Option<&UserProfile>) -> Option<EnrichedCast> {
    let body = msg.data.cast_add_body.as_ref()?;
    Some(EnrichedCast {
        fid: msg.data.fid,
        hash: msg.hash.clone(),
        text: body.text.clone(),
        timestamp: msg.data.timestamp,
        author_username: author.map(|p| p.username.clone()).unwrap_or_default(),
        author_display_name: author.map(|p| p.display_name.clone()).unwrap_or_default(),
        embeds: body.embeds.clone(),
        mentions: body.mentions.clone(),
        mentions_positions: body.mentions_positions.clone(),
        parent_cast_id: body.parent_cast_id.clone(),
        parent_url: body.parent_url.clone(),
    })
}

fn any_links(fid: u64, direction: &str, page: Result<Page<HubMessage>>) -> Option<bool> {
    match page {
        Ok(page) => Some(!page.items.is_empty()),
        Err(e) => {
            warn!(fid, direction, error = %e, "follow lookup failed");
            None
        }
    }
}

fn newest_casts(page_size: u32) -> CastsByFidOptions {
    CastsByFidOptions {
        page: PageOptions::newest_first(page_size),
        ..Default::default()
    }
}

pub struct FeedAssembler {
    client: HubClient,
    profiles: Arc<ProfileCache>,
    concurrency: usize,
}

impl FeedAssembler {
    pub fn new(client: HubClient, profiles: Arc<ProfileCache>) -> Self {
        Self {
            client,
            profiles,
            concurrency: Defaults::FANOUT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    async fn enrich(&self, msg: HubMessage) -> Option<EnrichedCast> {
        msg.data.cast_add_body.as_ref()?;
        let author = match self.profiles.get(msg.data.fid).await {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!(fid = msg.data.fid, error = %e, "author lookup failed");
                None
            }
        };
        enriched_cast(&msg, author.as_ref())
    }

    /// Enriches in input order; non-cast messages are dropped.
    pub async fn enrich_all(&self, messages: Vec<HubMessage>) -> Vec<EnrichedCast> {
        stream::iter(messages)
            .map(|m| self.enrich(m))
            .buffered(self.concurrency)
            .filter_map(|c| async move { c })
            .collect()
            .await
    }

    /// Recent casts from the accounts `fid` follows plus its own, newest
    /// first. Without a fid, a fixed sample account's casts are shown.
    pub async fn home_feed(&self, fid: Option<u64>) -> Result<Vec<EnrichedCast>> {
        let Some(fid) = fid else {
            let page = self
                .client
                .casts_by_fid(Defaults::FEED_SAMPLE_FID, &newest_casts(Defaults::FEED_SAMPLE_SIZE))
                .await?;
            return Ok(self.enrich_all(page.items).await);
        };

        let follows = self.client.all_follows(fid).await?;
        debug!(fid, follows = follows.len(), "assembling home feed");

        let opts = newest_casts(Defaults::FEED_CASTS_PER_FOLLOW);
        let results: Vec<(u64, Result<_>)> = stream::iter(follows.into_iter().take(Defaults::FEED_FOLLOW_LIMIT))
            .map(|followed| {
                let opts = &opts;
                async move { (followed, self.client.casts_by_fid(followed, opts).await) }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut messages = Vec::new();
        for (followed, result) in results {
            match result {
                Ok(page) => messages.extend(page.items),
                Err(e) => warn!(fid = followed, error = %e, "skipping casts of followed account"),
            }
        }

        match self.client.casts_by_fid(fid, &newest_casts(Defaults::FEED_OWN_CASTS)).await {
            Ok(page) => messages.extend(page.items),
            Err(e) => warn!(fid, error = %e, "skipping own casts"),
        }

        messages.sort_by(|a, b| b.data.timestamp.cmp(&a.data.timestamp));
        messages.truncate(Defaults::FEED_SIZE);
        Ok(self.enrich_all(messages).await)
    }

    pub async fn mentions(&self, fid: u64) -> Result<Vec<EnrichedCast>> {
        let page = self
            .client
            .casts_by_mention(fid, &PageOptions::size(Defaults::MENTIONS_PAGE_SIZE))
            .await?;
        Ok(self.enrich_all(page.items).await)
    }

    /// The cast identified by `fid`/`hash` and its direct replies.
    pub async fn thread(&self, fid: u64, hash: &str) -> Result<Thread> {
        let parent = ParentRef::Cast { fid, hash: hash.to_string() };
        let replies_opts = PageOptions::size(Defaults::THREAD_REPLIES);
        let (root, replies) = tokio::try_join!(
            self.client.cast_by_id(fid, hash),
            self.client.casts_by_parent(&parent, &replies_opts),
        )?;

        let root = self
            .enrich(root)
            .await
            .ok_or_else(|| Error::NotFound(format!("cast {hash} by fid {fid}")))?;
        let replies = self.enrich_all(replies.items).await;
        Ok(Thread { root, replies })
    }

    pub async fn profile_view(&self, fid: u64) -> Result<ProfileView> {
        let casts_opts = newest_casts(Defaults::PROFILE_CASTS);
        let (profile, page) = tokio::try_join!(
            self.profiles.get(fid),
            self.client.casts_by_fid(fid, &casts_opts),
        )?;

        let casts = page
            .items
            .iter()
            .filter_map(|m| enriched_cast(m, Some(&profile)))
            .collect();

        let one = PageOptions::size(1);
        let (following, followers) = tokio::join!(
            self.client.links_by_fid(fid, LINK_FOLLOW, &one),
            self.client.links_by_target_fid(fid, LINK_FOLLOW, &one),
        );
        Ok(ProfileView {
            profile,
            casts,
            follows_anyone: any_links(fid, "following", following),
            has_followers: any_links(fid, "followers", followers),
        })
    }
}
