//! Access token creation and validation (HS256).
//!
//! The token is opaque to clients: it carries only the user id and an expiry
//! claim, signed with the server secret.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("could not validate credentials")]
pub struct InvalidToken;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub exp: i64,
}

pub fn create_access_token(
    user_id: i64,
    secret: &str,
    expire_minutes: i64,
) -> Result<String, InvalidToken> {
    let claims = Claims {
        user_id,
        exp: (Utc::now() + Duration::minutes(expire_minutes)).timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| InvalidToken)
}

/// Returns the user id from a valid, unexpired token.
pub fn decode_access_token(token: &str, secret: &str) -> Result<i64, InvalidToken> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| InvalidToken)?;
    Ok(data.claims.user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trip() {
        let token = create_access_token(42, "test-secret", 30).unwrap();
        assert_eq!(decode_access_token(&token, "test-secret").unwrap(), 42);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = create_access_token(42, "test-secret", 30).unwrap();
        assert!(decode_access_token(&token, "other-secret").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let token = create_access_token(42, "test-secret", -5).unwrap();
        assert!(decode_access_token(&token, "test-secret").is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(decode_access_token("not.a.jwt", "test-secret").is_err());
    }
}
