use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{HeaderMap, StatusCode, header, request::Parts},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{config::AppConfig, error::ApiError};

/// Name of the admin session cookie.
pub const SESSION_COOKIE: &str = "admin-session";

/// Session lifetime: 7 days, matching the cookie's Max-Age.
pub const SESSION_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// SessionClaims
///
/// Payload of the signed admin session token. The token is an HMAC-signed JWT issued
/// at login; possession of a cookie is *not* proof of authentication — the signature
/// and expiry are verified on every privileged request. There is no server-side
/// session table and no revocation list; expiry is the only invalidation mechanism
/// besides logout clearing the cookie.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject: always "admin". There is exactly one back-office identity.
    pub sub: String,
    /// Expiration time: issue time + SESSION_TTL_SECS. Checked on every request.
    pub exp: usize,
    /// Issued At: timestamp when the session was created.
    pub iat: usize,
}

/// issue_session_token
///
/// Creates a fresh signed session token. Called exactly once per successful login.
pub fn issue_session_token(config: &AppConfig) -> Result<String, ApiError> {
    let now = chrono::Utc::now().timestamp();
    let claims = SessionClaims {
        sub: "admin".to_string(),
        iat: now as usize,
        exp: (now + SESSION_TTL_SECS) as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.session_secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("failed to sign session token: {e}")))
}

/// verify_session_token
///
/// Decodes and validates a session token: HMAC signature, structure, and expiry.
/// Any failure (tampered payload, wrong key, expired, garbage) yields None; callers
/// translate that into a 401.
pub fn verify_session_token(token: &str, config: &AppConfig) -> Option<SessionClaims> {
    let decoding_key = DecodingKey::from_secret(config.session_secret.as_bytes());

    let mut validation = Validation::default();
    // Ensure expiration time validation is always active.
    validation.validate_exp = true;

    decode::<SessionClaims>(token, &decoding_key, &validation)
        .ok()
        .map(|data| data.claims)
}

/// session_cookie_value
///
/// Pulls the raw `admin-session` value out of the Cookie header, if present.
/// The header may carry multiple cookies ("a=b; c=d").
pub fn session_cookie_value(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .map(str::trim)
        .find_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            (name == SESSION_COOKIE).then_some(value)
        })
}

/// session_from_headers
///
/// Resolves a verified admin session from request headers, or None. Shared by the
/// `AdminSession` extractor (hard 401) and the session check endpoint (soft bool).
pub fn session_from_headers(headers: &HeaderMap, config: &AppConfig) -> Option<SessionClaims> {
    let token = session_cookie_value(headers)?;
    verify_session_token(token, config)
}

/// session_set_cookie
///
/// Builds the Set-Cookie header value issued at login. HttpOnly keeps the token away
/// from page scripts; SameSite=Lax limits cross-site sends; Max-Age mirrors the
/// token's own expiry.
pub fn session_set_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; Max-Age={SESSION_TTL_SECS}; HttpOnly; SameSite=Lax")
}

/// session_clear_cookie
///
/// Builds the Set-Cookie header value that deletes the session cookie at logout.
pub fn session_clear_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; Max-Age=0; HttpOnly; SameSite=Lax")
}

/// AdminSession
///
/// The resolved identity of an authenticated back-office request. This is the output
/// of the extractor below; privileged handlers take it as an argument (or rely on the
/// route layer running it) and can trust that the session token was verified.
#[derive(Debug, Clone)]
pub struct AdminSession {
    /// Unix timestamp at which the session was issued.
    pub issued_at: usize,
}

/// AdminSession Extractor Implementation
///
/// Implements Axum's FromRequestParts trait, making AdminSession usable as a function
/// argument in any privileged handler and as the guard layered over the `/admin`
/// router. The process:
/// 1. Dependency Resolution: pulling AppConfig from the application state.
/// 2. Cookie Extraction: locating the `admin-session` cookie.
/// 3. Token Validation: HMAC signature and expiry check.
///
/// Rejection: StatusCode::UNAUTHORIZED (401) on any failure. A structurally present
/// but unverifiable cookie is treated exactly like a missing one.
impl<S> FromRequestParts<S> for AdminSession
where
    // S must allow sending across threads and sharing.
    S: Send + Sync,
    // Allows the extractor to pull the AppConfig (for the session secret).
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let config = AppConfig::from_ref(state);

        let claims =
            session_from_headers(&parts.headers, &config).ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(AdminSession {
            issued_at: claims.iat,
        })
    }
}

// --- Password Hashing (Comment Owners & Admin Credential) ---

/// hash_password
///
/// Computes a salted Argon2id hash of a plaintext password and returns the PHC
/// string. Used for comment owner passwords at creation time; the plaintext is
/// dropped immediately after.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("failed to hash password: {e}")))
}

/// verify_password
///
/// Verifies a plaintext password against a stored PHC hash. The comparison inside
/// the verifier is constant-time; a malformed stored hash verifies as false rather
/// than erroring.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    PasswordHash::new(stored_hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

// --- Comment Deletion Capability ---

/// CommentDelete
///
/// The single polymorphic authorization check for deleting a comment, with two
/// backing strategies. Both paths converge on `authorize`, so the decision logic
/// lives in one place instead of two independent checks on the same resource.
#[derive(Debug, Clone)]
pub enum CommentDelete {
    /// Holder of a verified admin session. Constructed only after the session token
    /// has been verified, so no further check is needed.
    Admin,
    /// Anonymous caller re-submitting the comment's owner password.
    Owner { password: String },
}

impl CommentDelete {
    /// authorize
    ///
    /// Decides whether this capability may delete the comment whose stored owner
    /// hash is `stored_hash`. Admin sessions pass unconditionally; owner passwords
    /// must verify against the hash.
    pub fn authorize(&self, stored_hash: &str) -> Result<(), ApiError> {
        match self {
            Self::Admin => Ok(()),
            Self::Owner { password } => {
                if verify_password(password, stored_hash) {
                    Ok(())
                } else {
                    Err(ApiError::Unauthorized)
                }
            }
        }
    }

    /// Label used in the deletion audit log line, distinguishing admin deletes from
    /// owner deletes.
    pub fn strategy(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Owner { .. } => "owner",
        }
    }
}
