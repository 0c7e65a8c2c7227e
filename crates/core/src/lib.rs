#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

//! # gridwire-core
//!
//! Shared domain types for the gridwire workspace: view, tenant and row
//! identifiers, typed column descriptors and filters, sort fields,
//! pagination, and the core error type.

pub mod error;
pub mod field;
pub mod pagination;
pub mod result;
pub mod types;

pub use error::Error;
pub use field::{FieldDescriptor, FieldKind, Filter, FilterSet, FilterValue, find_field};
pub use pagination::{DEFAULT_PAGE_SIZE, Pagination};
pub use result::{OptionExt, Result, ResultExt};
pub use types::{RowId, SortDirection, SortField, TenantId, ViewId, ViewMode};
