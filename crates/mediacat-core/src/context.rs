//! Request-scoped context passed explicitly into every catalog operation.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Identity and timing of the request an operation is serving.
///
/// Built once per HTTP request and handed down by reference; nothing in the
/// catalog keeps "current user" state between calls.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestContext {
    /// Correlation ID (UUIDv7) attached to every log record of the request.
    pub request_id: Uuid,
    /// Authenticated user, when the caller has one.
    pub username: Option<String>,
    pub received_at: DateTime<Utc>,
}

impl RequestContext {
    /// Context for an anonymous request, stamped now.
    pub fn new() -> Self {
        Self {
            request_id: Uuid::now_v7(),
            username: None,
            received_at: Utc::now(),
        }
    }

    /// Reuse an ID already assigned upstream (e.g. the `x-request-id` header).
    pub fn with_request_id(mut self, request_id: Uuid) -> Self {
        self.request_id = request_id;
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }
}

impl Default for RequestContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_v7_and_distinct() {
        let a = RequestContext::new();
        let b = RequestContext::new();
        assert_eq!(a.request_id.get_version_num(), 7);
        assert_ne!(a.request_id, b.request_id);
    }

    #[test]
    fn test_with_request_id() {
        let id = Uuid::now_v7();
        assert_eq!(RequestContext::new().with_request_id(id).request_id, id);
    }

    #[test]
    fn test_with_username() {
        let ctx = RequestContext::new().with_username("alice");
        assert_eq!(ctx.username.as_deref(), Some("alice"));
    }
}
