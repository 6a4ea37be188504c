//! Blocking client for the Outline VPN server management API.
//!
//! # Overview
//! `OutlineClient` maps every management endpoint (server info, hostname,
//! metrics, ports, data limits, access keys, transfer metrics) to a typed
//! method, and keeps two populate-once caches for the convenience queries
//! built on top (key lookup, user counts, sweeping idle keys).
//!
//! # Design
//! - Each endpoint is split into `build_*` (produces an `HttpRequest`) and
//!   `parse_*` (consumes an `HttpResponse`); both are pure and testable
//!   without a server.
//! - Network I/O sits behind the `Transport` trait. `UreqTransport` is the
//!   default and skips certificate verification, since management servers
//!   use self-signed certificates.
//! - Every call blocks until its round-trip finishes or its fixed per-endpoint
//!   timeout elapses. There are no retries and no background threads.
//! - The caches are never invalidated by the client; see `cache`.

pub mod cache;
pub mod client;
pub mod error;
pub mod http;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use cache::{AccessKeyCache, TransferCache};
pub use client::{OutlineClient, ACCESS_KEY_METHOD};
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse, StatusOutcome};
pub use transport::{Transport, TransportConfig, UreqTransport};
pub use types::{AccessKey, AccessKeysResponse, ManagerConfig, MetricsResponse, ServerResponse, TransferData};
