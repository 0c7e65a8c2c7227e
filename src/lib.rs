#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # gridwire
//!
//! Session-aware data fetching and virtualized grid planning for REST-backed
//! tables.
//!
//! This library re-exports the workspace crates and hosts the CLI layer.

pub use gridwire_core;
pub use gridwire_fetch;
pub use gridwire_query;
pub use gridwire_viewport;

pub mod cli;
pub mod commands;
pub mod config;
