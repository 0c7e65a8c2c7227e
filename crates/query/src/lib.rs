#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # gridwire-query
//!
//! View state and query execution for gridwire grids.
//!
//! ## Features
//!
//! - Per-view state registry mutated through shallow patches
//! - Deterministic canonical requests and cache keys
//! - Stale-while-revalidate cache with per-key load deduplication
//! - Key-guarded result application, so stale responses never win
//! - Collection-prefix invalidation after writes
//!
//! ## Example
//!
//! ```ignore
//! use gridwire_query::{QueryBinding, QueryBuilder, QueryCache, QueryRegistry, ViewDescriptor};
//!
//! let registry = Arc::new(QueryRegistry::new(QueryBuilder::new(&BuilderConfig::default())?));
//! registry.initialize(view_id.clone(), ViewDescriptor::new(Endpoint::new("/api/customers"), columns));
//!
//! let binding = QueryBinding::new(registry, Arc::new(QueryCache::new()), transport, tenant);
//! let view = binding.sync(&view_id).await?;
//! ```

pub mod binding;
pub mod builder;
pub mod cache;
pub mod error;
pub mod invalidation;
pub mod registry;
pub mod result;
pub mod state;

pub use binding::{ConsumerView, QueryBinding};
pub use builder::{BuilderConfig, CanonicalKey, CanonicalRequest, ListQuery, QueryBuilder};
pub use cache::{CacheConfig, CachedResult, Loaded, Lookup, QueryCache};
pub use error::{Error, Result};
pub use invalidation::{Mutation, MutationKind, collection_prefix};
pub use registry::QueryRegistry;
pub use result::QueryResult;
pub use state::{Endpoint, Selection, TableView, ViewDescriptor, ViewPatch};
