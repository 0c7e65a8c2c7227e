#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # gridwire-fetch
//!
//! Session-aware fetch layer for gridwire.
//!
//! ## Features
//!
//! - Tenant header and bearer token on every request
//! - Single-flight token renewal shared by all concurrent 401/403 failures
//! - One retry after renewal; a failed renewal clears the session
//! - Structured server error messages
//!
//! ## Example
//!
//! ```ignore
//! use gridwire_fetch::{ApiRequest, FetchClient, FetchConfig, SessionContext};
//!
//! let session = SessionContext::shared();
//! session.authenticate(token, identity);
//!
//! let client = FetchClient::new(FetchConfig::from_env(), session)?;
//! let body = client.request(ApiRequest::get("/api/customers"), &tenant).await?;
//! ```

pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod session;
pub mod transport;

pub use client::FetchClient;
pub use config::FetchConfig;
pub use coordinator::Coordinator;
pub use error::{Error, ErrorCategory, Result};
pub use session::{Identity, SessionContext, SessionState};
pub use transport::{ApiRequest, Body, Method, Transport};
