//! # templar-client
//!
//! The [`ReconciliationClient`] seam and its implementations:
//!
//! - [`HttpReconciliationClient`] — one blocking `ureq` request per call
//! - [`InMemoryStore`] — in-process store with the same semantics, for tests
//!   and embedding
//! - [`classify`] — raw transport outcome → [`templar_core::Failure`]

pub mod classify;
pub mod client;
pub mod http;
pub mod memory;

pub use classify::{classify, RawError};
pub use client::ReconciliationClient;
pub use http::HttpReconciliationClient;
pub use memory::InMemoryStore;
