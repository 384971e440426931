#![deny(clippy::mod_module_files)]
//! Persisted checkout identity of a working directory: which revision is
//! materialized on disk, which revision the working tree is based on, and
//! whether a checkout was interrupted.

pub mod checkout;
pub mod client;
pub mod config;
pub mod error;
pub mod snapshot;
pub mod storage;

pub use checkout::CheckoutStateStore;
pub use error::{Error, Result};
pub use snapshot::{RevisionId, SnapshotState};
