//! `streetsupport-auth` — role/claim model and access decisions for the admin console.
//!
//! This crate is intentionally decoupled from HTTP and storage.

pub mod authorize;
pub mod claims;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod token;

pub use authorize::{
    AccessEvaluator, AccessExplanation, DenialKind, DenialReason, can_remove_role,
    get_swep_location_slugs, get_user_location_slugs,
};
pub use claims::{
    Claim, DisplayRole, DisplayRoleKind, ScopedClaim, UserAuthClaims, parse_claims, parse_for_display,
};
pub use permissions::{ApiEndpoint, PermissionTable, PermissionTableError, RolePermissions, WILDCARD};
pub use principal::Principal;
pub use roles::{Role, ScopeFamily, exclusive_base_roles, is_base_role, is_scoped_claim};
pub use token::{
    Hs256SessionValidator, SessionClaims, SessionValidator, TokenValidationError, validate_session,
};
