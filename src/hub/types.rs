//! JSON shapes returned by the hub's read endpoints.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::hub::pagination::Page;

/// A message as the hub reports it over HTTP. Identity is the hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubMessage {
    pub data: MessageData,
    pub hash: String,
    #[serde(default)]
    pub hash_scheme: String,
    #[serde(default)]
    pub signature: String,
    #[serde(default)]
    pub signature_scheme: String,
    #[serde(default)]
    pub signer: String,
}

impl PartialEq for HubMessage {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
    }
}

impl Eq for HubMessage {}

impl Hash for HubMessage {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.hash.hash(state);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageData {
    #[serde(rename = "type")]
    pub kind: String,
    pub fid: u64,
    pub timestamp: u64,
    #[serde(default)]
    pub network: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cast_add_body: Option<CastAddBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cast_remove_body: Option<CastRemoveBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reaction_body: Option<ReactionBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_body: Option<LinkBody>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_data_body: Option<UserDataBody>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastId {
    pub fid: u64,
    pub hash: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Embed {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cast_id: Option<CastId>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastAddBody {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub mentions: Vec<u64>,
    #[serde(default)]
    pub mentions_positions: Vec<u32>,
    #[serde(default)]
    pub embeds: Vec<Embed>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_cast_id: Option<CastId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_url: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CastRemoveBody {
    pub target_hash: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionBody {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_cast_id: Option<CastId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkBody {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_fid: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDataBody {
    #[serde(rename = "type")]
    pub kind: String,
    pub value: String,
}

/// `{ messages, nextPageToken? }` as sent by paginated endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResponse {
    #[serde(default)]
    pub messages: Vec<HubMessage>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

impl From<PaginatedResponse> for Page<HubMessage> {
    fn from(r: PaginatedResponse) -> Self {
        Page::new(r.messages, r.next_page_token)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub fid: u64,
    pub display_name: String,
    pub username: String,
    pub bio: String,
    pub pfp_url: String,
    pub url: String,
}

impl UserProfile {
    pub fn empty(fid: u64) -> Self {
        Self { fid, ..Default::default() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsernameProof {
    pub fid: u64,
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DbStats {
    #[serde(default)]
    pub num_messages: u64,
    #[serde(default)]
    pub num_fid_registrations: u64,
    #[serde(default)]
    pub approx_size: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubInfo {
    #[serde(default)]
    pub version: String,
    #[serde(default)]
    pub num_shards: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub db_stats: Option<DbStats>,
}

/// Common paging knobs. `None` fields are left out of the query.
#[derive(Debug, Clone, Default)]
pub struct PageOptions {
    pub page_size: Option<u32>,
    pub page_token: Option<String>,
    pub reverse: Option<bool>,
}

impl PageOptions {
    pub fn size(page_size: u32) -> Self {
        Self { page_size: Some(page_size), ..Default::default() }
    }

    pub fn newest_first(page_size: u32) -> Self {
        Self { page_size: Some(page_size), reverse: Some(true), ..Default::default() }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.page_token = token;
        self
    }
}

/// A cast enriched with its author's names, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedCast {
    pub fid: u64,
    pub hash: String,
    pub text: String,
    pub timestamp: u64,
    pub author_username: String,
    pub author_display_name: String,
    pub embeds: Vec<Embed>,
    pub mentions: Vec<u64>,
    pub mentions_positions: Vec<u32>,
    pub parent_cast_id: Option<CastId>,
    pub parent_url: Option<String>,
}
