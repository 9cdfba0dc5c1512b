use actix_web::http::header::HeaderValue;
use chrono::{serde::ts_seconds, DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use super::errors::AuthError;
use crate::config::JWT_SECRET;
use crate::models::identity::Identity;

#[derive(Debug, Deserialize, Serialize)]
pub struct Claims {
    pub id: String,
    #[serde(with = "ts_seconds")]
    pub exp: DateTime<Utc>,
}

impl Claims {
    pub fn for_identity(identity: &Identity, valid_for: Duration) -> Self {
        Claims {
            id: identity.to_string(),
            exp: Utc::now() + valid_for,
        }
    }
}

/// Create a signed token for `identity`.
///
/// Tokens are normally minted by the auth service; this is used for local
/// development and tests.
pub fn encode_token(identity: &Identity, valid_for: Duration) -> Result<String, AuthError> {
    encode_token_with(identity, valid_for, JWT_SECRET.as_bytes())
}

pub fn encode_token_with(
    identity: &Identity,
    valid_for: Duration,
    secret: &[u8],
) -> Result<String, AuthError> {
    Ok(encode(
        &Header::new(Algorithm::HS256),
        &Claims::for_identity(identity, valid_for),
        &EncodingKey::from_secret(secret),
    )?)
}

/// Verify a `Bearer` header and extract the caller identity
pub fn decode_token(auth_header: &HeaderValue) -> Result<Identity, AuthError> {
    decode_token_with(auth_header, JWT_SECRET.as_bytes())
}

pub fn decode_token_with(auth_header: &HeaderValue, secret: &[u8]) -> Result<Identity, AuthError> {
    let auth_header = auth_header
        .to_str()
        .map_err(|_| AuthError::InvalidAuthorizationHeader)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthorizationHeader)?
        .trim();

    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret),
        &Validation::new(Algorithm::HS256),
    )?
    .claims;

    uuid::Uuid::parse_str(&claims.id)
        .map(Identity::new)
        .map_err(|_| AuthError::InvalidSubject)
}
