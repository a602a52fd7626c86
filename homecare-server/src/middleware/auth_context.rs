//! Authentication context extraction
//!
//! Session validation happens at the gateway in front of this service; by
//! the time a request arrives here the gateway has already resolved the
//! caller and injected identity headers. This extractor reads them so
//! handlers never parse headers by hand.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

/// Authenticated caller identity, extracted from gateway headers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    pub user_id: Uuid,
    pub roles: Vec<String>,
}

impl AuthContext {
    /// Create a new AuthContext (for testing/mocking)
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            roles: Vec::new(),
        }
    }

    pub fn with_roles(user_id: Uuid, roles: Vec<String>) -> Self {
        Self { user_id, roles }
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get("X-User-Id")
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| ApiError::authentication("Missing X-User-Id header"))?;
        let user_id = user_id
            .parse::<Uuid>()
            .map_err(|_| ApiError::authentication("X-User-Id is not a valid UUID"))?;

        let roles = parts
            .headers
            .get("X-User-Roles")
            .and_then(|h| h.to_str().ok())
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(AuthContext { user_id, roles })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[tokio::test]
    async fn extracts_identity_headers() {
        let user_id = Uuid::new_v4();
        let request = Request::builder()
            .header("X-User-Id", user_id.to_string())
            .header("X-User-Roles", "caregiver, admin")
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();

        let ctx = AuthContext::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(ctx.user_id, user_id);
        assert!(ctx.has_role("caregiver"));
        assert!(ctx.has_role("admin"));
    }

    #[tokio::test]
    async fn missing_header_is_rejected() {
        let request = Request::builder().body(()).unwrap();
        let (mut parts, _) = request.into_parts();

        let result = AuthContext::from_request_parts(&mut parts, &()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn malformed_uuid_is_rejected() {
        let request = Request::builder()
            .header("X-User-Id", "not-a-uuid")
            .body(())
            .unwrap();
        let (mut parts, _) = request.into_parts();

        let result = AuthContext::from_request_parts(&mut parts, &()).await;
        assert!(result.is_err());
    }
}
