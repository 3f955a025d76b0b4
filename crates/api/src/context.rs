use streetsupport_auth::{Principal, UserAuthClaims};

/// Principal context for a request (validated session + parsed claims).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal: Principal,
    token: String,
}

impl PrincipalContext {
    pub fn new(principal: Principal, token: impl Into<String>) -> Self {
        Self {
            principal,
            token: token.into(),
        }
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn subject(&self) -> &str {
        &self.principal.subject
    }

    pub fn claims(&self) -> &UserAuthClaims {
        &self.principal.claims
    }

    /// The encoded session token, forwarded to the backend API.
    pub fn token(&self) -> &str {
        &self.token
    }
}

/// Correlation id for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(String);

impl RequestId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
