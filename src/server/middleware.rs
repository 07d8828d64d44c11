// Bearer-token authentication for the /ai routes

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::Arc;

use super::CompanionServer;
use crate::config::TokenEntry;
use crate::errors::ApiError;

/// User identity attached to authenticated requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: String,
}

/// User id used for every request when authentication is disabled
pub const ANONYMOUS_USER: &str = "anonymous";

/// Hex SHA-256 digest of a bearer token
pub fn hash_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

/// Token digests mapped to user ids
#[derive(Debug, Default)]
pub struct TokenStore {
    digests: HashMap<String, String>,
}

impl TokenStore {
    pub fn new(entries: &[TokenEntry]) -> Self {
        let digests = entries
            .iter()
            .map(|e| (e.token_sha256.to_lowercase(), e.user_id.clone()))
            .collect();
        Self { digests }
    }

    pub fn resolve(&self, token: &str) -> Option<&str> {
        self.digests.get(&hash_token(token)).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.digests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.digests.is_empty()
    }
}

/// Authentication middleware
///
/// Missing or malformed Authorization header is 401, an unknown token 403.
pub async fn auth_middleware(
    State(server): State<Arc<CompanionServer>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = if server.config().auth_enabled {
        let token = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ApiError::Unauthorized)?;

        match server.tokens().resolve(token) {
            Some(user_id) => user_id.to_string(),
            None => {
                tracing::warn!("Rejected request with unknown bearer token");
                return Err(ApiError::Forbidden);
            }
        }
    } else {
        ANONYMOUS_USER.to_string()
    };

    request
        .extensions_mut()
        .insert(AuthenticatedUser { user_id });

    Ok(next.run(request).await)
}
