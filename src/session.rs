//! Signed session tokens.
//!
//! A session is not stored server side, the token itself carries the user id and the admin
//! flag and is signed with `SESSION_SECRET`.
use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::env;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{Session, User};

pub const SESSION_COOKIE_NAME: &str = "session";

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Claims {
    sub: i32,
    email: String,
    is_admin: bool,
    exp: i64,
}

fn create_token(secret: &[u8], user: &User, valid_until: DateTime<Utc>) -> ServiceResult<String> {
    let claims = Claims {
        sub: user.id,
        email: user.email.clone(),
        is_admin: user.is_admin,
        exp: valid_until.timestamp(),
    };
    Ok(encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )?)
}

fn verify_token(secret: &[u8], token: &str) -> ServiceResult<Session> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret),
        &Validation::default(),
    )
    .map_err(|_| ServiceError::Unauthorized("Not authenticated"))?;

    let claims = data.claims;
    let valid_until = Utc
        .timestamp_opt(claims.exp, 0)
        .single()
        .ok_or(ServiceError::Unauthorized("Not authenticated"))?;

    Ok(Session {
        user_id: claims.sub,
        email: claims.email,
        is_admin: claims.is_admin,
        token: token.to_owned(),
        valid_until,
    })
}

/// Issue a new token for the user, valid for `SESSION_LIFETIME_HOURS`.
pub fn create_session(user: &User) -> ServiceResult<Session> {
    let valid_until = Utc::now() + Duration::hours(*env::SESSION_LIFETIME_HOURS);
    let token = create_token(env::SESSION_SECRET.as_bytes(), user, valid_until)?;
    verify_token(env::SESSION_SECRET.as_bytes(), &token)
}

/// Restore a session from a token, fails for tampered or expired tokens.
pub fn get_session_by_token(token: &str) -> ServiceResult<Session> {
    verify_token(env::SESSION_SECRET.as_bytes(), token)
}
