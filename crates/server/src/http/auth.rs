use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::{IntoResponse, Response},
};
use db::models::account::Account;
use rand::RngCore;
use sha2::{Digest, Sha256};

use crate::{DeploymentImpl, error::ApiError};

pub const API_KEY_PREFIX: &str = "bhv_";
const API_KEY_RANDOM_BYTES: usize = 24;

/// `bhv_` followed by 48 lowercase hex characters. Shown to the caller once.
pub fn generate_api_key() -> String {
    let mut bytes = [0u8; API_KEY_RANDOM_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    let hex: String = bytes.iter().map(|byte| format!("{byte:02x}")).collect();
    format!("{API_KEY_PREFIX}{hex}")
}

/// Only this digest is stored.
pub fn hash_api_key(api_key: &str) -> String {
    let digest = Sha256::digest(api_key.as_bytes());
    format!("{digest:x}")
}

fn parse_authorization_bearer(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    let (prefix, rest) = trimmed.split_once(' ')?;
    if !prefix.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

fn extract_request_token(req: &Request) -> Option<String> {
    // 1) Authorization: Bearer <key>
    if let Some(value) = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_authorization_bearer)
    {
        return Some(value.to_string());
    }

    // 2) X-API-Key: <key>
    req.headers()
        .get("x-api-key")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Resolves the API key to an [`Account`] and stores it as a request extension.
pub async fn require_api_auth(
    State(deployment): State<DeploymentImpl>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(presented) = extract_request_token(&req) else {
        tracing::warn!(
            path = %req.uri().path(),
            method = %req.method(),
            reason = "missing_key",
            "Unauthorized API request"
        );
        return ApiError::Unauthorized.into_response();
    };

    let account =
        match Account::find_by_api_key_hash(&deployment.db().pool, &hash_api_key(&presented)).await
        {
            Ok(Some(account)) => account,
            Ok(None) => {
                tracing::warn!(
                    path = %req.uri().path(),
                    method = %req.method(),
                    reason = "unknown_key",
                    "Unauthorized API request"
                );
                return ApiError::Unauthorized.into_response();
            }
            Err(err) => return ApiError::Database(err).into_response(),
        };

    req.extensions_mut().insert(account);
    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bearer_parsing_is_case_insensitive_and_trims() {
        assert_eq!(parse_authorization_bearer("Bearer abc"), Some("abc"));
        assert_eq!(parse_authorization_bearer("  bearer   abc  "), Some("abc"));
        assert_eq!(parse_authorization_bearer("Basic abc"), None);
        assert_eq!(parse_authorization_bearer("Bearer "), None);
        assert_eq!(parse_authorization_bearer("Bearer"), None);
    }

    #[test]
    fn generated_keys_have_prefix_and_48_hex_chars() {
        let key = generate_api_key();
        let (prefix, hex) = key.split_at(API_KEY_PREFIX.len());
        assert_eq!(prefix, "bhv_");
        assert_eq!(hex.len(), 48);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(generate_api_key(), key);
    }

    #[test]
    fn key_hash_is_sha256_hex() {
        assert_eq!(
            hash_api_key("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
