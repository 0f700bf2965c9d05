pub mod passwords;

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::config;

/// Claims baked into a session token. The token is also stored on the user
/// row, so possession alone is not enough — logout invalidates it server-side.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub email: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: i64, email: String) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.token_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: user_id,
            email,
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug)]
pub enum TokenError {
    TokenGeneration(String),
    InvalidSecret,
}

impl std::fmt::Display for TokenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenError::TokenGeneration(msg) => write!(f, "token generation error: {}", msg),
            TokenError::InvalidSecret => write!(f, "invalid token secret"),
        }
    }
}

impl std::error::Error for TokenError {}

/// Mint the session token stored against the user row at login.
pub fn generate_token(claims: Claims) -> Result<String, TokenError> {
    let secret = &config::config().security.jwt_secret;

    if secret.is_empty() {
        return Err(TokenError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    let header = Header::default();

    encode(&header, &claims, &encoding_key)
        .map_err(|e| TokenError::TokenGeneration(e.to_string()))
}
