pub mod import;
pub mod session;
pub mod vault;

pub use import::{import_signer, ImportedSigner};
pub use session::{SessionSigner, SigningSession};
pub use vault::{ActiveSignerSource, DecryptedSigner, SignerRecord, SignerVault, SignersFile};
