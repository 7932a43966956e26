use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;

use crate::error::AppError;
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

/// Signature algorithm declared in the token header
const TOKEN_ALG: &str = "HS256";

/// Claims carried inside an issued token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id (UUID v4)
    pub id: String,
    pub username: String,
    /// Issued-at (Unix timestamp, seconds)
    pub iat: i64,
    /// Expiry (Unix timestamp, seconds); always strictly after `iat`
    pub exp: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// Why a presented token was rejected
///
/// Every variant maps to the same 401; the distinction only feeds logs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("token is structurally invalid")]
    Malformed,
    #[error("token signature does not verify")]
    BadSignature,
    #[error("token is expired")]
    Expired,
}

fn assemble(claims: &Claims, secret: &str) -> Result<String, AppError> {
    let header = Header {
        alg: TOKEN_ALG.to_string(),
        typ: "JWT".to_string(),
    };
    let header_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?);
    let claims_b64 = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims)?);
    let message = format!("{}.{}", header_b64, claims_b64);

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(message.as_bytes());
    let signature_b64 = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}", message, signature_b64))
}

/// Issue a signed token for `user_id`
///
/// `ttl_secs` must be positive; configuration loading enforces that, which
/// keeps `exp` strictly after `iat`.
pub fn issue_token(
    user_id: &str,
    username: &str,
    secret: &str,
    ttl_secs: i64,
) -> Result<String, AppError> {
    let iat = Utc::now().timestamp();
    let claims = Claims {
        id: user_id.to_string(),
        username: username.to_string(),
        iat,
        exp: iat + ttl_secs,
    };

    assemble(&claims, secret)
}

/// Verify `token` and return its claims
///
/// Checks segment structure, the declared algorithm, the signature
/// (constant-time via the Mac verify) and expiry, in that order.
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(TokenError::Malformed);
    }

    let header_bytes = URL_SAFE_NO_PAD
        .decode(segments[0])
        .map_err(|_| TokenError::Malformed)?;
    let header: Header =
        serde_json::from_slice(&header_bytes).map_err(|_| TokenError::Malformed)?;
    if header.alg != TOKEN_ALG {
        return Err(TokenError::Malformed);
    }

    let signature = URL_SAFE_NO_PAD
        .decode(segments[2])
        .map_err(|_| TokenError::Malformed)?;

    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| TokenError::BadSignature)?;
    mac.update(segments[0].as_bytes());
    mac.update(b".");
    mac.update(segments[1].as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| TokenError::BadSignature)?;

    let claims_bytes = URL_SAFE_NO_PAD
        .decode(segments[1])
        .map_err(|_| TokenError::Malformed)?;
    let claims: Claims =
        serde_json::from_slice(&claims_bytes).map_err(|_| TokenError::Malformed)?;

    if claims.exp <= Utc::now().timestamp() {
        return Err(TokenError::Expired);
    }

    Ok(claims)
}

/// Pull the token out of the Authorization header
/// Clients send either `Token <jwt>` or `Bearer <jwt>`
fn bearer_token(parts: &Parts) -> Option<&str> {
    let header = parts.headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = header.split_once(' ')?;
    if scheme != "Token" && scheme != "Bearer" {
        return None;
    }

    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}

/// Identity of a request that presented a valid token
///
/// Extraction fails with 401 when the token is missing or does not verify.
/// Storage is never touched here; handlers look the user up themselves.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

#[axum::async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::Unauthorized)?;
        let claims = verify_token(token, &state.config.token_secret).map_err(|e| {
            tracing::warn!("Rejected token: {}", e);
            AppError::Unauthorized
        })?;
        Ok(AuthUser(claims))
    }
}

/// Identity when present: decodes a valid token, passes through otherwise
///
/// Registration and login run with this so clients holding a live session
/// are not rejected.
#[derive(Debug, Clone, Default)]
pub struct MaybeAuthUser(pub Option<Claims>);

#[axum::async_trait]
impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let claims = bearer_token(parts)
            .and_then(|token| verify_token(token, &state.config.token_secret).ok());
        Ok(MaybeAuthUser(claims))
    }
}
