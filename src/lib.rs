//! Signer custody and hub protocol client for a terminal social client.

pub mod config;
pub mod context;
pub mod crypto;
pub mod defaults;
pub mod epoch;
pub mod error;
pub mod hub;
pub mod signer;
pub mod util;

pub use error::{Error, Result};
