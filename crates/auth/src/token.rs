use std::collections::HashSet;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Session token payload issued after the identity-provider login.
///
/// Only the fields the console reads; anything else in the token is ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (identity-provider user id).
    pub sub: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Raw role and scoped claims.
    #[serde(default)]
    pub auth_claims: Vec<String>,

    /// Issued-at, unix seconds.
    pub iat: i64,

    /// Expiry, unix seconds.
    pub exp: i64,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    #[error("token has expired")]
    Expired,

    #[error("token not yet valid (iat is in the future)")]
    NotYetValid,

    #[error("invalid token time window (exp <= iat)")]
    InvalidTimeWindow,

    #[error("malformed token: {0}")]
    Malformed(String),
}

/// Deterministically validate the session's time window.
pub fn validate_session(claims: &SessionClaims, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
    let now = now.timestamp();
    if claims.exp <= claims.iat {
        return Err(TokenValidationError::InvalidTimeWindow);
    }
    if now < claims.iat {
        return Err(TokenValidationError::NotYetValid);
    }
    if now >= claims.exp {
        return Err(TokenValidationError::Expired);
    }
    Ok(())
}

/// Turns an encoded session token into validated claims.
pub trait SessionValidator: Send + Sync {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenValidationError>;
}

/// HS256 shared-secret validator.
pub struct Hs256SessionValidator {
    key: DecodingKey,
    validation: Validation,
}

impl Hs256SessionValidator {
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Time checks are done by `validate_session` against the caller's clock.
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::new();

        Self {
            key: DecodingKey::from_secret(secret.as_ref()),
            validation,
        }
    }
}

impl SessionValidator for Hs256SessionValidator {
    fn validate(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, TokenValidationError> {
        let data = jsonwebtoken::decode::<SessionClaims>(token, &self.key, &self.validation)
            .map_err(|e| TokenValidationError::Malformed(e.to_string()))?;
        validate_session(&data.claims, now)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use jsonwebtoken::{EncodingKey, Header};

    fn session(iat: DateTime<Utc>, exp: DateTime<Utc>) -> SessionClaims {
        SessionClaims {
            sub: "auth0|123".to_string(),
            email: Some("admin@example.org".to_string()),
            name: None,
            auth_claims: vec!["CityAdmin".to_string(), "CityAdminFor:leeds".to_string()],
            iat: iat.timestamp(),
            exp: exp.timestamp(),
        }
    }

    fn encode(claims: &SessionClaims, secret: &str) -> String {
        jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn time_window_is_checked() {
        let now = Utc::now();
        let ok = session(now - Duration::minutes(1), now + Duration::minutes(10));
        assert_eq!(validate_session(&ok, now), Ok(()));

        let expired = session(now - Duration::minutes(20), now - Duration::minutes(10));
        assert_eq!(validate_session(&expired, now), Err(TokenValidationError::Expired));

        let future = session(now + Duration::minutes(5), now + Duration::minutes(10));
        assert_eq!(validate_session(&future, now), Err(TokenValidationError::NotYetValid));

        let inverted = session(now, now - Duration::minutes(1));
        assert_eq!(validate_session(&inverted, now), Err(TokenValidationError::InvalidTimeWindow));
    }

    #[test]
    fn hs256_round_trip() {
        let now = Utc::now();
        let claims = session(now - Duration::seconds(5), now + Duration::minutes(10));
        let token = encode(&claims, "s3cret");

        let validator = Hs256SessionValidator::new("s3cret");
        assert_eq!(validator.validate(&token, now).unwrap(), claims);
    }

    #[test]
    fn wrong_secret_is_malformed() {
        let now = Utc::now();
        let token = encode(&session(now, now + Duration::minutes(10)), "one");
        let err = Hs256SessionValidator::new("two").validate(&token, now).unwrap_err();
        assert!(matches!(err, TokenValidationError::Malformed(_)));
    }

    #[test]
    fn expired_token_is_rejected_after_signature_check() {
        let now = Utc::now();
        let token = encode(
            &session(now - Duration::hours(2), now - Duration::hours(1)),
            "s3cret",
        );
        let err = Hs256SessionValidator::new("s3cret").validate(&token, now).unwrap_err();
        assert_eq!(err, TokenValidationError::Expired);
    }
}
