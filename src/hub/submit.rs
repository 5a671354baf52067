//! Building, signing and submitting cast, reaction and link messages.

use std::sync::Arc;

use prost::Message as _;
use serde_json::Value;
use tracing::info;

use crate::defaults::Defaults;
use crate::error::{Error, Result};
use crate::hub::proto::{
    self, CastAddBody, CastId, CastRemoveBody, CastType, Embed, EmbedTarget, FarcasterNetwork,
    HashScheme, LinkBody, LinkTarget, MessageBody, MessageData, MessageType, Parent,
    ReactionBody, ReactionTarget, ReactionType, SignatureScheme, HASH_LEN,
};
use crate::hub::reads::LINK_FOLLOW;
use crate::hub::transport::HubTransport;
use crate::signer::SessionSigner;
use crate::util::{bytes_to_0x, network_now};

pub const SUBMIT_PATH: &str = "/submitMessage";

/// What a cast replies to, if anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CastParent {
    Cast { fid: u64, hash: Vec<u8> },
    Url(String),
}

#[derive(Debug, Clone, Default)]
pub struct CastOptions {
    pub parent: Option<CastParent>,
    pub embeds: Vec<String>,
    pub mentions: Vec<u64>,
    pub mentions_positions: Vec<u32>,
}

/// The hub's answer to an accepted submission.
#[derive(Debug, Clone)]
pub struct SubmitReceipt {
    /// `0x`-prefixed content hash of the submitted message.
    pub hash: String,
    pub response: Value,
}

fn check_hash(hash: &[u8], what: &str) -> Result<()> {
    if hash.len() != HASH_LEN {
        return Err(Error::validation(format!(
            "{what} must be {HASH_LEN} bytes, got {}",
            hash.len()
        )));
    }
    Ok(())
}

fn cast_id(fid: u64, hash: &[u8]) -> Result<CastId> {
    check_hash(hash, "target cast hash")?;
    Ok(CastId { fid, hash: hash.to_vec() })
}

pub struct MessageSubmitter {
    transport: Arc<dyn HubTransport>,
    network: FarcasterNetwork,
}

impl MessageSubmitter {
    pub fn new(transport: Arc<dyn HubTransport>) -> Self {
        Self {
            transport,
            network: FarcasterNetwork::Mainnet,
        }
    }

    /// Hashes and signs `body` as a message of `kind` from the signer's fid.
    pub fn build_message(
        &self,
        signer: &SessionSigner,
        kind: MessageType,
        body: MessageBody,
        timestamp: u32,
    ) -> Result<proto::Message> {
        if signer.fid() == 0 {
            return Err(Error::MessageBuild("signer has no fid".into()));
        }
        let data = MessageData {
            r#type: kind as i32,
            fid: signer.fid(),
            timestamp,
            network: self.network as i32,
            body: Some(body),
        };

        let hash = proto::content_hash(&data);
        let signature = signer.sign(&hash);

        Ok(proto::Message {
            data: Some(data),
            hash: hash.to_vec(),
            hash_scheme: HashScheme::Blake3 as i32,
            signature: signature.to_bytes().to_vec(),
            signature_scheme: SignatureScheme::Ed25519 as i32,
            signer: signer.public_key().to_bytes().to_vec(),
            data_bytes: None,
        })
    }

    async fn sign_and_submit(
        &self,
        signer: &SessionSigner,
        kind: MessageType,
        body: MessageBody,
    ) -> Result<SubmitReceipt> {
        let timestamp = network_now()?;
        let message = self.build_message(signer, kind, body, timestamp)?;
        let hash = bytes_to_0x(&message.hash);

        let response = self.transport.write(SUBMIT_PATH, message.encode_to_vec()).await?;
        info!(fid = signer.fid(), kind = ?kind, %hash, "message submitted");
        Ok(SubmitReceipt { hash, response })
    }

    pub async fn publish_cast(
        &self,
        signer: &SessionSigner,
        text: &str,
        opts: CastOptions,
    ) -> Result<SubmitReceipt> {
        if text.len() > Defaults::MAX_CAST_BYTES {
            return Err(Error::validation(format!(
                "cast text is {} bytes, limit is {}",
                text.len(),
                Defaults::MAX_CAST_BYTES
            )));
        }
        if opts.mentions.len() != opts.mentions_positions.len() {
            return Err(Error::validation("mentions and mention positions differ in length"));
        }
        if let Some(&pos) = opts.mentions_positions.iter().find(|&&p| p as usize > text.len()) {
            return Err(Error::validation(format!("mention position {pos} is past the end of the text")));
        }

        let parent = match opts.parent {
            Some(CastParent::Cast { fid, hash }) => Some(Parent::ParentCastId(cast_id(fid, &hash)?)),
            Some(CastParent::Url(url)) => Some(Parent::ParentUrl(url)),
            None => None,
        };
        let body = CastAddBody {
            embeds_deprecated: Vec::new(),
            mentions: opts.mentions,
            parent,
            text: text.to_string(),
            mentions_positions: opts.mentions_positions,
            embeds: opts
                .embeds
                .into_iter()
                .map(|url| Embed { embed: Some(EmbedTarget::Url(url)) })
                .collect(),
            r#type: CastType::Cast as i32,
        };

        self.sign_and_submit(signer, MessageType::CastAdd, MessageBody::CastAddBody(body))
            .await
    }

    pub async fn delete_cast(&self, signer: &SessionSigner, target_hash: &[u8]) -> Result<SubmitReceipt> {
        check_hash(target_hash, "target cast hash")?;
        let body = CastRemoveBody { target_hash: target_hash.to_vec() };
        self.sign_and_submit(signer, MessageType::CastRemove, MessageBody::CastRemoveBody(body))
            .await
    }

    async fn react(
        &self,
        signer: &SessionSigner,
        kind: MessageType,
        reaction: ReactionType,
        target_fid: u64,
        target_hash: &[u8],
    ) -> Result<SubmitReceipt> {
        let body = ReactionBody {
            r#type: reaction as i32,
            target: Some(ReactionTarget::TargetCastId(cast_id(target_fid, target_hash)?)),
        };
        self.sign_and_submit(signer, kind, MessageBody::ReactionBody(body))
            .await
    }

    pub async fn like_cast(&self, signer: &SessionSigner, target_fid: u64, target_hash: &[u8]) -> Result<SubmitReceipt> {
        self.react(signer, MessageType::ReactionAdd, ReactionType::Like, target_fid, target_hash)
            .await
    }

    pub async fn unlike_cast(&self, signer: &SessionSigner, target_fid: u64, target_hash: &[u8]) -> Result<SubmitReceipt> {
        self.react(signer, MessageType::ReactionRemove, ReactionType::Like, target_fid, target_hash)
            .await
    }

    pub async fn recast(&self, signer: &SessionSigner, target_fid: u64, target_hash: &[u8]) -> Result<SubmitReceipt> {
        self.react(signer, MessageType::ReactionAdd, ReactionType::Recast, target_fid, target_hash)
            .await
    }

    pub async fn unrecast(&self, signer: &SessionSigner, target_fid: u64, target_hash: &[u8]) -> Result<SubmitReceipt> {
        self.react(signer, MessageType::ReactionRemove, ReactionType::Recast, target_fid, target_hash)
            .await
    }

    async fn link(&self, signer: &SessionSigner, kind: MessageType, target_fid: u64) -> Result<SubmitReceipt> {
        if target_fid == 0 {
            return Err(Error::validation("target fid must be a positive integer"));
        }
        let body = LinkBody {
            r#type: LINK_FOLLOW.to_string(),
            display_timestamp: None,
            target: Some(LinkTarget::TargetFid(target_fid)),
        };
        self.sign_and_submit(signer, kind, MessageBody::LinkBody(body))
            .await
    }

    pub async fn follow(&self, signer: &SessionSigner, target_fid: u64) -> Result<SubmitReceipt> {
        self.link(signer, MessageType::LinkAdd, target_fid).await
    }

    pub async fn unfollow(&self, signer: &SessionSigner, target_fid: u64) -> Result<SubmitReceipt> {
        self.link(signer, MessageType::LinkRemove, target_fid).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::stub::StubTransport;
    use ed25519_dalek::{Signature, Verifier, VerifyingKey};
    use serde_json::json;

    fn setup() -> (Arc<StubTransport>, MessageSubmitter, SessionSigner) {
        let stub = Arc::new(StubTransport::new(|_, _| Ok(json!({}))));
        let submitter = MessageSubmitter::new(stub.clone());
        let signer = SessionSigner::from_bytes(&[3u8; 32], 1234).unwrap();
        (stub, submitter, signer)
    }

    fn submitted(stub: &StubTransport, i: usize) -> proto::Message {
        let writes = stub.writes.lock().unwrap();
        assert_eq!(writes[i].0, SUBMIT_PATH);
        proto::Message::decode(writes[i].1.as_slice()).unwrap()
    }

    fn assert_verifies(msg: &proto::Message) {
        let data = msg.data.as_ref().unwrap();
        assert_eq!(msg.hash, proto::content_hash(data).to_vec());
        assert_eq!(msg.hash_scheme, HashScheme::Blake3 as i32);
        assert_eq!(msg.signature_scheme, SignatureScheme::Ed25519 as i32);

        let pk = VerifyingKey::from_bytes(msg.signer.as_slice().try_into().unwrap()).unwrap();
        let sig = Signature::from_slice(&msg.signature).unwrap();
        pk.verify(&msg.hash, &sig).unwrap();
    }

    #[tokio::test]
    async fn test_cast_at_limit_is_submitted() {
        let (stub, submitter, signer) = setup();
        let text = "a".repeat(320);
        let receipt = submitter.publish_cast(&signer, &text, CastOptions::default()).await.unwrap();

        assert_eq!(stub.write_count(), 1);
        let msg = submitted(&stub, 0);
        assert_verifies(&msg);
        assert_eq!(receipt.hash, bytes_to_0x(&msg.hash));

        let data = msg.data.unwrap();
        assert_eq!(data.fid, 1234);
        assert_eq!(data.network, FarcasterNetwork::Mainnet as i32);
        assert_eq!(data.r#type, MessageType::CastAdd as i32);
        match data.body {
            Some(MessageBody::CastAddBody(b)) => assert_eq!(b.text, text),
            _ => panic!("expected cast body"),
        }
    }

    #[tokio::test]
    async fn test_cast_over_limit_never_reaches_network() {
        let (stub, submitter, signer) = setup();
        let err = submitter
            .publish_cast(&signer, &"a".repeat(321), CastOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(stub.write_count(), 0);
        assert_eq!(stub.read_count(), 0);
    }

    #[tokio::test]
    async fn test_limit_counts_utf8_bytes() {
        let (stub, submitter, signer) = setup();
        // 107 three-byte chars = 321 bytes, well under 320 chars
        let text = "€".repeat(107);
        let err = submitter.publish_cast(&signer, &text, CastOptions::default()).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(stub.write_count(), 0);
    }

    #[tokio::test]
    async fn test_reply_with_embeds_and_mentions() {
        let (stub, submitter, signer) = setup();
        let opts = CastOptions {
            parent: Some(CastParent::Cast { fid: 2, hash: vec![7; 20] }),
            embeds: vec!["https://example.com".into()],
            mentions: vec![99],
            mentions_positions: vec![3],
        };
        submitter.publish_cast(&signer, "hi  there", opts).await.unwrap();

        let msg = submitted(&stub, 0);
        assert_verifies(&msg);
        let Some(MessageBody::CastAddBody(body)) = msg.data.unwrap().body else {
            panic!("expected cast body");
        };
        assert_eq!(body.parent, Some(Parent::ParentCastId(CastId { fid: 2, hash: vec![7; 20] })));
        assert_eq!(body.mentions, vec![99]);
        assert_eq!(body.embeds[0].embed, Some(EmbedTarget::Url("https://example.com".into())));
    }

    #[tokio::test]
    async fn test_bad_target_hash_rejected_before_network() {
        let (stub, submitter, signer) = setup();
        assert!(matches!(
            submitter.like_cast(&signer, 2, &[1, 2, 3]).await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            submitter.delete_cast(&signer, &[]).await,
            Err(Error::Validation(_))
        ));
        let opts = CastOptions { mentions: vec![1], ..Default::default() };
        assert!(matches!(
            submitter.publish_cast(&signer, "x", opts).await,
            Err(Error::Validation(_))
        ));
        assert_eq!(stub.write_count(), 0);
    }

    #[tokio::test]
    async fn test_reactions_and_links() {
        let (stub, submitter, signer) = setup();
        submitter.like_cast(&signer, 2, &[1; 20]).await.unwrap();
        submitter.unrecast(&signer, 2, &[1; 20]).await.unwrap();
        submitter.follow(&signer, 5).await.unwrap();
        submitter.unfollow(&signer, 5).await.unwrap();
        submitter.delete_cast(&signer, &[9; 20]).await.unwrap();
        assert_eq!(stub.write_count(), 5);

        let kinds: Vec<i32> = (0..5)
            .map(|i| {
                let m = submitted(&stub, i);
                assert_verifies(&m);
                m.data.unwrap().r#type
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                MessageType::ReactionAdd as i32,
                MessageType::ReactionRemove as i32,
                MessageType::LinkAdd as i32,
                MessageType::LinkRemove as i32,
                MessageType::CastRemove as i32,
            ]
        );

        let Some(MessageBody::ReactionBody(r)) = submitted(&stub, 1).data.unwrap().body else {
            panic!("expected reaction body");
        };
        assert_eq!(r.r#type, ReactionType::Recast as i32);

        let Some(MessageBody::LinkBody(l)) = submitted(&stub, 2).data.unwrap().body else {
            panic!("expected link body");
        };
        assert_eq!(l.r#type, "follow");
        assert_eq!(l.target, Some(LinkTarget::TargetFid(5)));
    }

    #[test]
    fn test_build_message_is_deterministic() {
        let (_, submitter, signer) = setup();
        let body = || MessageBody::CastRemoveBody(CastRemoveBody { target_hash: vec![1; 20] });
        let a = submitter.build_message(&signer, MessageType::CastRemove, body(), 100).unwrap();
        let b = submitter.build_message(&signer, MessageType::CastRemove, body(), 100).unwrap();
        assert_eq!(a.hash, b.hash);
        assert_eq!(a.signature, b.signature);

        let c = submitter.build_message(&signer, MessageType::CastRemove, body(), 101).unwrap();
        assert_ne!(a.hash, c.hash);
    }
}
