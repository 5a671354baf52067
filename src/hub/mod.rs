//! Client side of the hub's HTTP protocol.

pub mod feed;
pub mod pagination;
pub mod profiles;
pub mod proto;
pub mod reads;
pub mod submit;
pub mod transport;
pub mod types;

#[cfg(test)]
pub(crate) mod stub;

pub use feed::{FeedAssembler, ProfileView, Thread};
pub use pagination::{Page, PaginationWalker};
pub use profiles::ProfileCache;
pub use reads::{CastsByFidOptions, HubClient, ParentRef};
pub use submit::{CastOptions, CastParent, MessageSubmitter, SubmitReceipt};
pub use transport::{HttpTransport, HubTransport, Query, RetryPolicy};
