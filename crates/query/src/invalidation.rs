//! Writes and the cached collections they invalidate.

use gridwire_fetch::{ApiRequest, Method};
use serde_json::Value;

/// Kind of write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

/// A create, update or delete against a REST collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub kind: MutationKind,
    /// Collection URL for creates, item URL for updates and deletes.
    pub target: String,
    pub body: Option<Value>,
}

impl Mutation {
    pub fn create(collection: impl Into<String>, body: Value) -> Self {
        Self {
            kind: MutationKind::Create,
            target: collection.into(),
            body: Some(body),
        }
    }

    pub fn update(item: impl Into<String>, body: Value) -> Self {
        Self {
            kind: MutationKind::Update,
            target: item.into(),
            body: Some(body),
        }
    }

    pub fn delete(item: impl Into<String>) -> Self {
        Self {
            kind: MutationKind::Delete,
            target: item.into(),
            body: None,
        }
    }

    /// The request to send.
    #[must_use]
    pub fn to_request(&self) -> ApiRequest {
        let request = match self.kind {
            MutationKind::Create => ApiRequest::new(Method::POST, self.target.clone()),
            MutationKind::Update => ApiRequest::new(Method::PUT, self.target.clone()),
            MutationKind::Delete => ApiRequest::new(Method::DELETE, self.target.clone()),
        };
        match &self.body {
            Some(body) => request.with_body(body.clone()),
            None => request,
        }
    }

    /// URL prefix of the cached queries this write makes stale.
    #[must_use]
    pub fn invalidation_prefix(&self) -> String {
        match self.kind {
            MutationKind::Create => strip_query(&self.target).to_string(),
            MutationKind::Update | MutationKind::Delete => collection_prefix(&self.target),
        }
    }
}

/// The collection an item URL belongs to: the URL with its last path segment
/// and any query string removed.
#[must_use]
pub fn collection_prefix(item_url: &str) -> String {
    let path = strip_query(item_url).trim_end_matches('/');
    match path.rsplit_once('/') {
        Some((collection, _)) if !collection.is_empty() && !collection.ends_with(":/") => {
            collection.to_string()
        }
        _ => path.to_string(),
    }
}

fn strip_query(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}
