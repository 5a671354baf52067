//! Typed wrappers over the hub's read endpoints.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::defaults::Defaults;
use crate::error::{Error, Result};
use crate::hub::pagination::{Page, PaginationWalker};
use crate::hub::proto::ReactionType;
use crate::hub::transport::{HubTransport, Query};
use crate::hub::types::{HubInfo, HubMessage, PageOptions, PaginatedResponse, UsernameProof};

pub const LINK_FOLLOW: &str = "follow";

/// Where a reply hangs: another cast or a URL (channel).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentRef {
    Cast { fid: u64, hash: String },
    Url(String),
}

/// Extra filters for `castsByFid`.
#[derive(Debug, Clone, Default)]
pub struct CastsByFidOptions {
    pub page: PageOptions,
    pub start_timestamp: Option<u64>,
    pub stop_timestamp: Option<u64>,
}

fn decode<T: DeserializeOwned>(path: &str, value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| Error::decode(format!("{path}: {e}")))
}

fn paged(query: Query, opts: &PageOptions) -> Query {
    query
        .opt("pageSize", opts.page_size)
        .opt("pageToken", opts.page_token.clone())
        .opt("reverse", opts.reverse)
}

#[derive(Clone)]
pub struct HubClient {
    transport: Arc<dyn HubTransport>,
    walker: PaginationWalker,
}

impl HubClient {
    pub fn new(transport: Arc<dyn HubTransport>) -> Self {
        Self {
            transport,
            walker: PaginationWalker::default(),
        }
    }

    pub fn with_walker(mut self, walker: PaginationWalker) -> Self {
        self.walker = walker;
        self
    }

    pub fn transport(&self) -> &Arc<dyn HubTransport> {
        &self.transport
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: Query) -> Result<T> {
        let value = self.transport.read(path, &query).await?;
        decode(path, value)
    }

    async fn get_page(&self, path: &str, query: Query) -> Result<Page<HubMessage>> {
        let resp: PaginatedResponse = self.get(path, query).await?;
        Ok(resp.into())
    }

    pub async fn cast_by_id(&self, fid: u64, hash: &str) -> Result<HubMessage> {
        self.get("/castById", Query::new().set("fid", fid).set("hash", hash))
            .await
    }

    /// Newest first unless `reverse` is set explicitly.
    pub async fn casts_by_fid(&self, fid: u64, opts: &CastsByFidOptions) -> Result<Page<HubMessage>> {
        let mut page = opts.page.clone();
        page.reverse = Some(page.reverse.unwrap_or(true));
        let query = paged(Query::new().set("fid", fid), &page)
            .opt("startTimestamp", opts.start_timestamp)
            .opt("stopTimestamp", opts.stop_timestamp);
        self.get_page("/castsByFid", query).await
    }

    pub async fn casts_by_parent(&self, parent: &ParentRef, opts: &PageOptions) -> Result<Page<HubMessage>> {
        let query = match parent {
            ParentRef::Cast { fid, hash } => Query::new().set("fid", fid).set("hash", hash),
            ParentRef::Url(url) => Query::new().set("url", url),
        };
        self.get_page("/castsByParent", paged(query, opts)).await
    }

    /// Newest first unless `reverse` is set explicitly.
    pub async fn casts_by_mention(&self, fid: u64, opts: &PageOptions) -> Result<Page<HubMessage>> {
        let mut page = opts.clone();
        page.reverse = Some(page.reverse.unwrap_or(true));
        self.get_page("/castsByMention", paged(Query::new().set("fid", fid), &page))
            .await
    }

    pub async fn link_by_id(&self, fid: u64, target_fid: u64, link_type: &str) -> Result<HubMessage> {
        let query = Query::new()
            .set("fid", fid)
            .set("target_fid", target_fid)
            .set("link_type", link_type);
        self.get("/linkById", query).await
    }

    pub async fn links_by_fid(&self, fid: u64, link_type: &str, opts: &PageOptions) -> Result<Page<HubMessage>> {
        let query = Query::new().set("fid", fid).set("link_type", link_type);
        self.get_page("/linksByFid", paged(query, opts)).await
    }

    pub async fn links_by_target_fid(
        &self,
        target_fid: u64,
        link_type: &str,
        opts: &PageOptions,
    ) -> Result<Page<HubMessage>> {
        let query = Query::new()
            .set("target_fid", target_fid)
            .set("link_type", link_type);
        self.get_page("/linksByTargetFid", paged(query, opts)).await
    }

    pub async fn reaction_by_id(
        &self,
        fid: u64,
        target_fid: u64,
        target_hash: &str,
        reaction_type: ReactionType,
    ) -> Result<HubMessage> {
        let query = Query::new()
            .set("fid", fid)
            .set("target_fid", target_fid)
            .set("target_hash", target_hash)
            .set("reaction_type", reaction_type as i32);
        self.get("/reactionById", query).await
    }

    pub async fn reactions_by_fid(
        &self,
        fid: u64,
        reaction_type: ReactionType,
        opts: &PageOptions,
    ) -> Result<Page<HubMessage>> {
        let query = Query::new()
            .set("fid", fid)
            .set("reaction_type", reaction_type as i32);
        self.get_page("/reactionsByFid", paged(query, opts)).await
    }

    pub async fn reactions_by_cast(
        &self,
        target_fid: u64,
        target_hash: &str,
        reaction_type: ReactionType,
        opts: &PageOptions,
    ) -> Result<Page<HubMessage>> {
        let query = Query::new()
            .set("target_fid", target_fid)
            .set("target_hash", target_hash)
            .set("reaction_type", reaction_type as i32);
        self.get_page("/reactionsByCast", paged(query, opts)).await
    }

    pub async fn user_data_by_fid(&self, fid: u64, user_data_type: Option<i32>) -> Result<Page<HubMessage>> {
        let query = Query::new()
            .set("fid", fid)
            .opt("user_data_type", user_data_type);
        self.get_page("/userDataByFid", query).await
    }

    pub async fn user_name_proof_by_name(&self, name: &str) -> Result<UsernameProof> {
        self.get("/userNameProofByName", Query::new().set("name", name))
            .await
    }

    pub async fn info(&self, db_stats: bool) -> Result<HubInfo> {
        let query = if db_stats { Query::new().set("dbstats", 1) } else { Query::new() };
        self.get("/info", query).await
    }

    /// Every fid that `fid` follows, in hub order.
    pub async fn all_follows(&self, fid: u64) -> Result<Vec<u64>> {
        let messages = self
            .walker
            .collect_all(|cursor| async move {
                let opts = PageOptions::size(Defaults::FOLLOWS_PAGE_SIZE).with_token(cursor);
                self.links_by_fid(fid, LINK_FOLLOW, &opts).await
            })
            .await?;

        Ok(messages
            .iter()
            .filter_map(|m| m.data.link_body.as_ref()?.target_fid)
            .collect())
    }

    /// Resolves `123`, `name` or `@name` to a fid.
    pub async fn resolve_user(&self, input: &str) -> Result<u64> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(Error::validation("empty user query"));
        }
        if trimmed.chars().all(|c| c.is_ascii_digit()) {
            return trimmed
                .parse()
                .map_err(|e| Error::validation(format!("bad fid '{trimmed}': {e}")));
        }
        let name = trimmed.strip_prefix('@').unwrap_or(trimmed);
        Ok(self.user_name_proof_by_name(name).await?.fid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::stub::{cast_json, link_json, StubTransport};
    use serde_json::json;

    fn client(stub: Arc<StubTransport>) -> HubClient {
        HubClient::new(stub)
    }

    #[tokio::test]
    async fn test_casts_by_fid_defaults_to_newest_first() {
        let stub = Arc::new(StubTransport::new(|_, _| {
            Ok(json!({ "messages": [cast_json(3, "0x01", 10, "gm")], "nextPageToken": "abc" }))
        }));
        let page = client(stub.clone())
            .casts_by_fid(3, &CastsByFidOptions { page: PageOptions::size(5), ..Default::default() })
            .await
            .unwrap();

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.next_cursor.as_deref(), Some("abc"));

        let reads = stub.reads.lock().unwrap();
        let (path, q) = &reads[0];
        assert_eq!(path, "/castsByFid");
        assert_eq!(q.get("fid"), Some("3"));
        assert_eq!(q.get("pageSize"), Some("5"));
        assert_eq!(q.get("reverse"), Some("true"));
        assert_eq!(q.get("pageToken"), None);
        assert_eq!(q.get("startTimestamp"), None);
    }

    #[tokio::test]
    async fn test_casts_by_parent_query() {
        let stub = Arc::new(StubTransport::new(|_, _| Ok(json!({ "messages": [] }))));
        let c = client(stub.clone());
        c.casts_by_parent(&ParentRef::Cast { fid: 1, hash: "0xaa".into() }, &PageOptions::size(50))
            .await
            .unwrap();
        c.casts_by_parent(&ParentRef::Url("chain://x".into()), &PageOptions::default())
            .await
            .unwrap();

        let reads = stub.reads.lock().unwrap();
        assert_eq!(reads[0].1.get("hash"), Some("0xaa"));
        assert_eq!(reads[1].1.get("url"), Some("chain://x"));
        assert_eq!(reads[1].1.get("fid"), None);
    }

    #[tokio::test]
    async fn test_all_follows_walks_pages() {
        let stub = Arc::new(StubTransport::new(|_, q| {
            Ok(match q.get("pageToken") {
                None => json!({ "messages": [link_json(1, 10), link_json(1, 11)], "nextPageToken": "p2" }),
                Some("p2") => json!({ "messages": [link_json(1, 12)], "nextPageToken": "" }),
                Some(other) => panic!("unexpected token {other}"),
            })
        }));
        let follows = client(stub.clone()).all_follows(1).await.unwrap();
        assert_eq!(follows, vec![10, 11, 12]);
        assert_eq!(stub.read_count(), 2);
        let reads = stub.reads.lock().unwrap();
        assert_eq!(reads[0].1.get("pageSize"), Some("1000"));
        assert_eq!(reads[0].1.get("link_type"), Some("follow"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_decode_error() {
        let stub = Arc::new(StubTransport::new(|_, _| Ok(json!({ "messages": "nope" }))));
        let err = client(stub).casts_by_mention(1, &PageOptions::default()).await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)));
    }

    #[tokio::test]
    async fn test_resolve_user() {
        let stub = Arc::new(StubTransport::new(|path, q| {
            assert_eq!(path, "/userNameProofByName");
            assert_eq!(q.get("name"), Some("alice"));
            Ok(json!({ "fid": 77, "name": "alice", "type": "USERNAME_TYPE_FNAME" }))
        }));
        let c = client(stub.clone());
        assert_eq!(c.resolve_user("123").await.unwrap(), 123);
        assert_eq!(c.resolve_user("@alice").await.unwrap(), 77);
        assert_eq!(c.resolve_user("alice").await.unwrap(), 77);
        assert!(matches!(c.resolve_user("  ").await, Err(Error::Validation(_))));
        assert_eq!(stub.read_count(), 2);
    }

    #[tokio::test]
    async fn test_reactions_and_info_queries() {
        let stub = Arc::new(StubTransport::new(|path, _| {
            Ok(match path {
                "/info" => json!({ "version": "1.2.3", "numShards": 2, "dbStats": { "numMessages": 5 } }),
                _ => json!({ "messages": [] }),
            })
        }));
        let c = client(stub.clone());
        c.reactions_by_cast(3, "0xbeef", ReactionType::Recast, &PageOptions::default())
            .await
            .unwrap();
        let info = c.info(true).await.unwrap();
        assert_eq!(info.version, "1.2.3");
        assert_eq!(info.db_stats.unwrap().num_messages, 5);

        let reads = stub.reads.lock().unwrap();
        assert_eq!(reads[0].1.get("reaction_type"), Some("2"));
        assert_eq!(reads[0].1.get("target_hash"), Some("0xbeef"));
        assert_eq!(reads[1].1.get("dbstats"), Some("1"));
    }
}
