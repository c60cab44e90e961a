//! Bearer token generation and validation.
//!
//! Tokens are stateless HS256 JWTs signed with the process-wide secret. Each
//! token carries the subject (user id), the role at issue time, and an
//! absolute expiry; nothing is persisted and tokens cannot be revoked before
//! expiry. The role claim is informational only — the middleware re-fetches
//! the user on every request and trusts the stored role, not the claim.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use reflab_core::{DocumentId, Role};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::AuthError;

/// Claims carried by an access token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AccessTokenClaims {
    /// Subject: the user id.
    pub sub: String,
    /// Role at issue time.
    pub role: Role,
    /// Issued at (Unix timestamp).
    pub iat: i64,
    /// Expiration time (Unix timestamp).
    pub exp: i64,
}

/// Issues and verifies signed, time-limited bearer tokens.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_minutes: i64,
}

impl TokenService {
    /// Creates a token service from the signing secret and validity window.
    #[must_use]
    pub fn new(secret: &str, ttl_minutes: i64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_minutes,
        }
    }

    /// Issues a token for the given subject with the configured TTL.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if encoding fails.
    pub fn issue(&self, subject: &DocumentId, role: Role) -> Result<String, AuthError> {
        self.issue_with_ttl(subject, role, self.ttl_minutes)
    }

    /// Issues a token with an explicit TTL in minutes.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Internal` if encoding fails.
    pub fn issue_with_ttl(
        &self,
        subject: &DocumentId,
        role: Role,
        ttl_minutes: i64,
    ) -> Result<String, AuthError> {
        let now = OffsetDateTime::now_utc().unix_timestamp();
        let claims = AccessTokenClaims {
            sub: subject.to_string(),
            role,
            iat: now,
            exp: now + ttl_minutes * 60,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::internal(format!("failed to encode token: {e}")))
    }

    /// Decodes and validates a token, checking signature and expiry.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::TokenExpired` if the token is past its expiry and
    /// `AuthError::InvalidToken` for any other validation failure.
    pub fn verify(&self, token: &str) -> Result<AccessTokenClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        decode::<AccessTokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::invalid_token(e.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> TokenService {
        TokenService::new("test-secret", 720)
    }

    #[test]
    fn test_issue_and_verify_roundtrip() {
        let svc = service();
        let subject = DocumentId::new();

        let token = svc.issue(&subject, Role::LabTech).unwrap();
        let claims = svc.verify(&token).unwrap();

        assert_eq!(claims.sub, subject.to_string());
        assert_eq!(claims.role, Role::LabTech);
        assert!(claims.exp - claims.iat == 720 * 60);
    }

    #[test]
    fn test_expired_token_fails_verify() {
        let svc = service();
        let token = svc
            .issue_with_ttl(&DocumentId::new(), Role::Viewer, -5)
            .unwrap();
        let err = svc.verify(&token).unwrap_err();
        assert!(matches!(err, AuthError::TokenExpired));
    }

    #[test]
    fn test_wrong_secret_fails_verify() {
        let token = service().issue(&DocumentId::new(), Role::Admin).unwrap();
        let other = TokenService::new("another-secret", 720);
        let err = other.verify(&token).unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken { .. }));
    }

    #[test]
    fn test_garbage_token_fails_verify() {
        let err = service().verify("not.a.jwt").unwrap_err();
        assert!(matches!(err, AuthError::InvalidToken { .. }));
    }

    #[test]
    fn test_tampered_token_fails_verify() {
        let svc = service();
        let mut token = svc.issue(&DocumentId::new(), Role::Viewer).unwrap();
        // Flip a character in the payload segment.
        let mid = token.len() / 2;
        let original = token.remove(mid);
        let replacement = if original == 'a' { 'b' } else { 'a' };
        token.insert(mid, replacement);
        assert!(svc.verify(&token).is_err());
    }
}
