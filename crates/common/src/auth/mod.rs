//! Authentication and authorization utilities
//!
//! Provides:
//! - Bearer token generation and validation (HS256, 30-minute lifetime)
//! - Password hashing for the student directory
//! - Service key validation for service-to-service calls

use crate::errors::{AppError, Result};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Bearer token claims. The subject is the student's email address, the only
/// claim carried besides the timestamps.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (student email)
    pub sub: String,

    /// Expiration time (Unix timestamp)
    pub exp: i64,

    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Bearer token manager
pub struct TokenManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenManager {
    /// Create a new token manager with the given secret and lifetime
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Issue a new bearer token for the given subject
    pub fn issue(&self, email: &str) -> Result<String> {
        let now = Utc::now();
        let exp = now + self.ttl;

        let claims = Claims {
            sub: email.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| AppError::Internal {
            message: format!("Failed to issue token: {}", e),
        })
    }

    /// Validate and decode a bearer token
    pub fn verify(&self, token: &str) -> Result<Claims> {
        decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::ExpiredToken,
                _ => AppError::Unauthorized {
                    message: "Could not validate credentials".to_string(),
                },
            })
    }
}

/// Hash a password for storage (salted argon2)
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal {
            message: format!("Failed to hash password: {}", e),
        })
}

/// Verify a password against a stored hash
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Digest a service key for comparison
pub fn digest_service_key(key: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Validate a presented service key against the configured one.
/// Compared as fixed-length digests rather than raw strings.
pub fn validate_service_key(presented: &str, configured: &str) -> bool {
    digest_service_key(presented) == digest_service_key(configured)
}

/// Extract a bearer token from an Authorization header value
pub fn extract_bearer(auth_header: &str) -> Option<&str> {
    auth_header.strip_prefix("Bearer ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_roundtrip() {
        let manager = TokenManager::new("test_secret", Duration::minutes(30));

        let token = manager.issue("alice@example.com").unwrap();
        let claims = manager.verify(&token).unwrap();

        assert_eq!(claims.sub, "alice@example.com");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_expired_token_rejected() {
        // Negative lifetime puts exp safely past the validation leeway.
        let manager = TokenManager::new("test_secret", Duration::minutes(-5));

        let token = manager.issue("alice@example.com").unwrap();
        let err = manager.verify(&token).unwrap_err();

        assert!(matches!(err, AppError::ExpiredToken));
    }

    #[test]
    fn test_token_wrong_secret_rejected() {
        let issuer = TokenManager::new("secret_a", Duration::minutes(30));
        let verifier = TokenManager::new("secret_b", Duration::minutes(30));

        let token = issuer.issue("alice@example.com").unwrap();
        let err = verifier.verify(&token).unwrap_err();

        assert!(matches!(err, AppError::Unauthorized { .. }));
    }

    #[test]
    fn test_garbage_token_rejected() {
        let manager = TokenManager::new("test_secret", Duration::minutes(30));
        assert!(manager.verify("not-a-token").is_err());
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("pw123").unwrap();
        assert!(verify_password("pw123", &hash));
        assert!(!verify_password("pw124", &hash));
    }

    #[test]
    fn test_password_hashes_are_salted() {
        let a = hash_password("pw123").unwrap();
        let b = hash_password("pw123").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_service_key_validation() {
        assert!(validate_service_key("super-secret", "super-secret"));
        assert!(!validate_service_key("super-secret", "other-secret"));
        assert!(!validate_service_key("", "super-secret"));
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer("abc123"), None);
        assert_eq!(extract_bearer("Basic abc"), None);
    }
}
