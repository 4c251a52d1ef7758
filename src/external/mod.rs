//! HTTP-backed implementations of the external collaborator traits.
//!
//! The console itself never holds cloud SDK credentials or privileged host
//! access; privileged actions go through the management sidecar's exec API,
//! and version resolution goes to the public release feed.

pub mod exec_api;
pub mod releases;

pub use exec_api::{ExecApiCatalogClient, ExecApiUpgradeExecutor};
pub use releases::HttpVersionResolver;
