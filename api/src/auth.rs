use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("jwt_encode_failed")]
    EncodeFailed,
    #[error("invalid_token")]
    InvalidToken,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthClaims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and verifies HS256 bearer tokens.
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl: Duration,
}

impl AuthManager {
    pub fn new(secret: &str, token_ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_ttl,
        }
    }

    pub fn issue_token(&self, subject: &str) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = AuthClaims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + self.token_ttl).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding_key).map_err(|_| AuthError::EncodeFailed)
    }

    pub fn validate_token(&self, token: &str) -> Result<AuthClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        decode::<AuthClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|_| AuthError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_validates() {
        let auth = AuthManager::new("test-secret", Duration::hours(1));
        let token = auth.issue_token("ada").expect("jwt must be issued");
        let claims = auth.validate_token(&token).expect("token must be valid");
        assert_eq!(claims.sub, "ada");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let issuer = AuthManager::new("secret-a", Duration::hours(1));
        let verifier = AuthManager::new("secret-b", Duration::hours(1));
        let token = issuer.issue_token("ada").unwrap();
        assert_eq!(verifier.validate_token(&token).unwrap_err(), AuthError::InvalidToken);
    }

    #[test]
    fn expired_token_is_rejected() {
        let auth = AuthManager::new("test-secret", Duration::hours(-2));
        let token = auth.issue_token("ada").unwrap();
        assert!(auth.validate_token(&token).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        let auth = AuthManager::new("test-secret", Duration::hours(1));
        assert!(auth.validate_token("not.a.jwt").is_err());
    }
}
