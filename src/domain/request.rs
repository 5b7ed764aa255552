//! Metadata of the HTTP request that opened a connection.

use axum::http::{HeaderMap, Method, Uri};
use chrono::{DateTime, Utc};

/// Snapshot of the upgrade request a connection originated from.
///
/// Captured once when the transport accepts the connection. Server methods
/// receive it through the [`crate::registry::Injected::Request`] slot.
#[derive(Debug, Clone)]
pub struct OriginatingRequest {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    received_at: DateTime<Utc>,
}

impl OriginatingRequest {
    /// Creates a request snapshot stamped with the current time.
    #[must_use]
    pub fn new(method: Method, uri: Uri, headers: HeaderMap) -> Self {
        Self {
            method,
            uri,
            headers,
            received_at: Utc::now(),
        }
    }

    /// HTTP method of the request.
    #[must_use]
    pub const fn method(&self) -> &Method {
        &self.method
    }

    /// Request target.
    #[must_use]
    pub const fn uri(&self) -> &Uri {
        &self.uri
    }

    /// All request headers.
    #[must_use]
    pub const fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns a header value if it is present and valid UTF-8.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// When the request was received.
    #[must_use]
    pub const fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }
}

impl Default for OriginatingRequest {
    fn default() -> Self {
        Self::new(Method::GET, Uri::default(), HeaderMap::new())
    }
}
