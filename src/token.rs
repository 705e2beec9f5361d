//! Manage json web tokens.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ServerError};
use crate::user::{Role, User};

/// Pieces of information asserted on a JWT.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID.
    pub sub: String,
    /// Display name at issue time.
    pub name: String,
    pub role: Role,
    /// Session ID, revocable server-side.
    pub jti: String,
    /// Identifies the time at which the JWT was issued.
    pub iat: i64,
    /// Identifies the expiration time on or after which the JWT must not be
    /// accepted for processing.
    pub exp: i64,
}

impl Claims {
    pub fn new(user: &User, jti: String, issued_at: DateTime<Utc>, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub: user.id.to_string(),
            name: user.name.clone(),
            role: user.role,
            jti,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    pub fn user_id(&self) -> Option<i64> {
        self.sub.parse().ok()
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }
}

/// Sign and verify HS256 tokens.
///
/// Expiry is not checked here. The caller compares `exp` against its own
/// clock.
#[derive(Clone)]
pub struct TokenManager {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl TokenManager {
    /// Create a new [`TokenManager`] instance.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            algorithm: Algorithm::HS256,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Create a new [`jsonwebtoken`].
    pub fn create(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(self.algorithm), claims, &self.encoding_key).map_err(|err| {
            ServerError::Internal {
                details: "cannot sign token".into(),
                source: Some(Box::new(err)),
            }
        })
    }

    /// Decode and check the signature of a token.
    pub fn decode(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| ServerError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn claims() -> Claims {
        let user = User {
            id: 7,
            name: "Maria Santos".into(),
            ..Default::default()
        };
        let now = Utc::now();
        Claims::new(&user, "abcd".into(), now, now + Duration::hours(24))
    }

    #[test]
    fn test_roundtrip() {
        let manager = TokenManager::new(b"secret");
        let claims = claims();
        let token = manager.create(&claims).unwrap();

        assert_eq!(manager.decode(&token).unwrap(), claims);
        assert_eq!(claims.user_id(), Some(7));
    }

    #[test]
    fn test_tampered_token_is_rejected() {
        let manager = TokenManager::new(b"secret");
        let token = manager.create(&claims()).unwrap();

        let mut parts: Vec<String> = token.split('.').map(str::to_owned).collect();
        parts[1] = parts[1].chars().rev().collect();
        assert!(manager.decode(&parts.join(".")).is_err());

        assert!(TokenManager::new(b"other").decode(&token).is_err());
        assert!(manager.decode("not-a-token").is_err());
    }
}
