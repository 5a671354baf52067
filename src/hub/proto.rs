//! Canonical protobuf form of hub messages, used for hashing, signing and
//! submission. Field numbers follow the network's `message.proto`.

use prost::Message as _;

pub const HASH_LEN: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum MessageType {
    None = 0,
    CastAdd = 1,
    CastRemove = 2,
    ReactionAdd = 3,
    ReactionRemove = 4,
    LinkAdd = 5,
    LinkRemove = 6,
    UserDataAdd = 11,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum FarcasterNetwork {
    None = 0,
    Mainnet = 1,
    Testnet = 2,
    Devnet = 3,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum HashScheme {
    None = 0,
    Blake3 = 1,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum SignatureScheme {
    None = 0,
    Ed25519 = 1,
    Eip712 = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum ReactionType {
    None = 0,
    Like = 1,
    Recast = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum CastType {
    Cast = 0,
    LongCast = 1,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum UserDataType {
    None = 0,
    Pfp = 1,
    Display = 2,
    Bio = 3,
    Url = 5,
    Username = 6,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Message {
    #[prost(message, optional, tag = "1")]
    pub data: Option<MessageData>,
    #[prost(bytes = "vec", tag = "2")]
    pub hash: Vec<u8>,
    #[prost(enumeration = "HashScheme", tag = "3")]
    pub hash_scheme: i32,
    #[prost(bytes = "vec", tag = "4")]
    pub signature: Vec<u8>,
    #[prost(enumeration = "SignatureScheme", tag = "5")]
    pub signature_scheme: i32,
    #[prost(bytes = "vec", tag = "6")]
    pub signer: Vec<u8>,
    #[prost(bytes = "vec", optional, tag = "7")]
    pub data_bytes: Option<Vec<u8>>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct MessageData {
    #[prost(enumeration = "MessageType", tag = "1")]
    pub r#type: i32,
    #[prost(uint64, tag = "2")]
    pub fid: u64,
    #[prost(uint32, tag = "3")]
    pub timestamp: u32,
    #[prost(enumeration = "FarcasterNetwork", tag = "4")]
    pub network: i32,
    #[prost(oneof = "MessageBody", tags = "5, 6, 7, 12, 14")]
    pub body: Option<MessageBody>,
}

#[derive(Clone, PartialEq, prost::Oneof)]
pub enum MessageBody {
    #[prost(message, tag = "5")]
    CastAddBody(CastAddBody),
    #[prost(message, tag = "6")]
    CastRemoveBody(CastRemoveBody),
    #[prost(message, tag = "7")]
    ReactionBody(ReactionBody),
    #[prost(message, tag = "12")]
    UserDataBody(UserDataBody),
    #[prost(message, tag = "14")]
    LinkBody(LinkBody),
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CastId {
    #[prost(uint64, tag = "1")]
    pub fid: u64,
    #[prost(bytes = "vec", tag = "2")]
    pub hash: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Embed {
    #[prost(oneof = "EmbedTarget", tags = "1, 2")]
    pub embed: Option<EmbedTarget>,
}

#[derive(Clone, PartialEq, prost::Oneof)]
pub enum EmbedTarget {
    #[prost(string, tag = "1")]
    Url(String),
    #[prost(message, tag = "2")]
    CastId(CastId),
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CastAddBody {
    #[prost(string, repeated, tag = "1")]
    pub embeds_deprecated: Vec<String>,
    #[prost(uint64, repeated, tag = "2")]
    pub mentions: Vec<u64>,
    #[prost(oneof = "Parent", tags = "3, 7")]
    pub parent: Option<Parent>,
    #[prost(string, tag = "4")]
    pub text: String,
    #[prost(uint32, repeated, tag = "5")]
    pub mentions_positions: Vec<u32>,
    #[prost(message, repeated, tag = "6")]
    pub embeds: Vec<Embed>,
    #[prost(enumeration = "CastType", tag = "8")]
    pub r#type: i32,
}

#[derive(Clone, PartialEq, prost::Oneof)]
pub enum Parent {
    #[prost(message, tag = "3")]
    ParentCastId(CastId),
    #[prost(string, tag = "7")]
    ParentUrl(String),
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct CastRemoveBody {
    #[prost(bytes = "vec", tag = "1")]
    pub target_hash: Vec<u8>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ReactionBody {
    #[prost(enumeration = "ReactionType", tag = "1")]
    pub r#type: i32,
    #[prost(oneof = "ReactionTarget", tags = "2, 3")]
    pub target: Option<ReactionTarget>,
}

#[derive(Clone, PartialEq, prost::Oneof)]
pub enum ReactionTarget {
    #[prost(message, tag = "2")]
    TargetCastId(CastId),
    #[prost(string, tag = "3")]
    TargetUrl(String),
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct LinkBody {
    #[prost(string, tag = "1")]
    pub r#type: String,
    #[prost(uint32, optional, tag = "2")]
    pub display_timestamp: Option<u32>,
    #[prost(oneof = "LinkTarget", tags = "3")]
    pub target: Option<LinkTarget>,
}

#[derive(Clone, PartialEq, prost::Oneof)]
pub enum LinkTarget {
    #[prost(uint64, tag = "3")]
    TargetFid(u64),
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct UserDataBody {
    #[prost(enumeration = "UserDataType", tag = "1")]
    pub r#type: i32,
    #[prost(string, tag = "2")]
    pub value: String,
}

/// Content address of a message: BLAKE3 of the encoded data, first 20 bytes.
pub fn content_hash(data: &MessageData) -> [u8; HASH_LEN] {
    let digest = blake3::hash(&data.encode_to_vec());
    let mut out = [0u8; HASH_LEN];
    out.copy_from_slice(&digest.as_bytes()[..HASH_LEN]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message as _;

    #[test]
    fn test_cast_id_wire_bytes() {
        let id = CastId { fid: 1, hash: vec![0xab] };
        assert_eq!(id.encode_to_vec(), vec![0x08, 0x01, 0x12, 0x01, 0xab]);
    }

    #[test]
    fn test_link_body_wire_bytes() {
        let body = LinkBody {
            r#type: "follow".into(),
            display_timestamp: None,
            target: Some(LinkTarget::TargetFid(2)),
        };
        let mut want = vec![0x0a, 0x06];
        want.extend_from_slice(b"follow");
        want.extend_from_slice(&[0x18, 0x02]);
        assert_eq!(body.encode_to_vec(), want);
    }

    #[test]
    fn test_message_decodes_back() {
        let data = MessageData {
            r#type: MessageType::CastRemove as i32,
            fid: 42,
            timestamp: 7,
            network: FarcasterNetwork::Mainnet as i32,
            body: Some(MessageBody::CastRemoveBody(CastRemoveBody { target_hash: vec![1; 20] })),
        };
        let hash = content_hash(&data);
        let msg = Message {
            data: Some(data.clone()),
            hash: hash.to_vec(),
            hash_scheme: HashScheme::Blake3 as i32,
            ..Default::default()
        };
        let back = Message::decode(msg.encode_to_vec().as_slice()).unwrap();
        assert_eq!(back.data.as_ref(), Some(&data));
        assert_eq!(content_hash(back.data.as_ref().unwrap()), hash);
    }

    #[test]
    fn test_hash_depends_on_content() {
        let a = MessageData { fid: 1, ..Default::default() };
        let b = MessageData { fid: 2, ..Default::default() };
        assert_ne!(content_hash(&a), content_hash(&b));
        assert_eq!(content_hash(&a), content_hash(&a.clone()));
    }
}
