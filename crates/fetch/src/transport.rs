//! The request seam between the query layer and the network.

use async_trait::async_trait;
use gridwire_core::TenantId;
use serde_json::Value;

pub use reqwest::Method;

use crate::error::Result;

/// Decoded JSON response body; `Value::Null` for empty bodies.
pub type Body = Value;

/// A JSON request against the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Absolute URL or a path resolved against the configured base URL.
    pub target: String,
    pub body: Option<Value>,
}

impl ApiRequest {
    /// Create a request without a body.
    pub fn new(method: Method, target: impl Into<String>) -> Self {
        Self {
            method,
            target: target.into(),
            body: None,
        }
    }

    pub fn get(target: impl Into<String>) -> Self {
        Self::new(Method::GET, target)
    }

    pub fn post(target: impl Into<String>, body: Value) -> Self {
        Self::new(Method::POST, target).with_body(body)
    }

    pub fn put(target: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PUT, target).with_body(body)
    }

    pub fn patch(target: impl Into<String>, body: Value) -> Self {
        Self::new(Method::PATCH, target).with_body(body)
    }

    pub fn delete(target: impl Into<String>) -> Self {
        Self::new(Method::DELETE, target)
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Anything able to execute tenant-scoped JSON requests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Execute `request` for `tenant`.
    ///
    /// # Errors
    ///
    /// Returns the transport's error for network failures, rejections and
    /// session teardown.
    async fn send(&self, request: ApiRequest, tenant: &TenantId) -> Result<Body>;
}
