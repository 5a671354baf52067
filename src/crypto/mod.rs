pub mod codec;

pub use codec::{Codec, EncryptedBlob, KdfParams};
