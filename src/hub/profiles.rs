//! User profiles built from user-data messages, with a short-lived cache.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

use crate::defaults::Defaults;
use crate::error::Result;
use crate::hub::reads::HubClient;
use crate::hub::types::{HubMessage, UserProfile};

/// Folds user-data messages into one profile. Later messages overwrite
/// earlier ones field by field.
pub fn profile_from_messages(fid: u64, messages: &[HubMessage]) -> UserProfile {
    let mut profile = UserProfile::empty(fid);
    for body in messages.iter().filter_map(|m| m.data.user_data_body.as_ref()) {
        let value = body.value.clone();
        match body.kind.as_str() {
            "USER_DATA_TYPE_DISPLAY" => profile.display_name = value,
            "USER_DATA_TYPE_USERNAME" => profile.username = value,
            "USER_DATA_TYPE_BIO" => profile.bio = value,
            "USER_DATA_TYPE_PFP" => profile.pfp_url = value,
            "USER_DATA_TYPE_URL" => profile.url = value,
            _ => {}
        }
    }
    profile
}

/// One uncached lookup.
pub async fn fetch_profile(client: &HubClient, fid: u64) -> Result<UserProfile> {
    let page = client.user_data_by_fid(fid, None).await?;
    Ok(profile_from_messages(fid, &page.items))
}

#[derive(Debug, Clone)]
pub struct CachedProfile {
    pub profile: UserProfile,
    pub fetched_at: Instant,
}

type Slot = Arc<Mutex<Option<CachedProfile>>>;

/// TTL cache keyed by fid. Concurrent lookups of the same fid share one fetch:
/// each fid has its own async slot lock, held across the fetch.
pub struct ProfileCache {
    client: HubClient,
    ttl: Duration,
    slots: Mutex<HashMap<u64, Slot>>,
}

impl ProfileCache {
    pub fn new(client: HubClient) -> Self {
        Self::with_ttl(client, Defaults::PROFILE_TTL)
    }

    pub fn with_ttl(client: HubClient, ttl: Duration) -> Self {
        Self {
            client,
            ttl,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub async fn get(&self, fid: u64) -> Result<UserProfile> {
        let slot = Arc::clone(self.slots.lock().await.entry(fid).or_default());

        let mut entry = slot.lock().await;
        if let Some(cached) = entry.as_ref() {
            if cached.fetched_at.elapsed() < self.ttl {
                debug!(fid, "profile cache hit");
                return Ok(cached.profile.clone());
            }
        }

        let profile = fetch_profile(&self.client, fid).await?;
        *entry = Some(CachedProfile {
            profile: profile.clone(),
            fetched_at: Instant::now(),
        });
        debug!(fid, "profile cached");
        Ok(profile)
    }

    pub async fn peek(&self, fid: u64) -> Option<CachedProfile> {
        let slot = self.slots.lock().await.get(&fid).cloned()?;
        let entry = slot.lock().await;
        entry.clone()
    }
}
