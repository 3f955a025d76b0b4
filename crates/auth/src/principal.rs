use serde::{Deserialize, Serialize};

use crate::{SessionClaims, UserAuthClaims, parse_claims};

/// Authenticated principal, as seen by the access evaluator.
///
/// Built fresh for each request from the validated session; never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    /// Identity-provider subject.
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub claims: UserAuthClaims,
}

impl Principal {
    pub fn new(subject: impl Into<String>, claims: UserAuthClaims) -> Self {
        Self {
            subject: subject.into(),
            email: None,
            name: None,
            claims,
        }
    }

    pub fn from_session(session: &SessionClaims) -> Self {
        Self {
            subject: session.sub.clone(),
            email: session.email.clone(),
            name: session.name.clone(),
            claims: parse_claims(&session.auth_claims),
        }
    }
}

impl From<&SessionClaims> for Principal {
    fn from(value: &SessionClaims) -> Self {
        Self::from_session(value)
    }
}
