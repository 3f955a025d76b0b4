use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Administrator role recognised by the console.
///
/// The serialised form is the exact tag the identity provider issues, and the
/// same tag keys the permission table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    /// Platform-wide administrator; matches every page and endpoint.
    SuperAdmin,
    /// Administrator of one or more cities (`CityAdminFor:<city>`).
    CityAdmin,
    /// Volunteer-coordination administrator.
    VolunteerAdmin,
    /// Administrator of one or more organisations (`AdminFor:<org>`).
    OrgAdmin,
    /// Severe-weather emergency protocol administrator (`SwepAdminFor:<city>`).
    SwepAdmin,
}

impl Role {
    pub const ALL: [Role; 5] = [
        Role::SuperAdmin,
        Role::CityAdmin,
        Role::VolunteerAdmin,
        Role::OrgAdmin,
        Role::SwepAdmin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SuperAdmin",
            Role::CityAdmin => "CityAdmin",
            Role::VolunteerAdmin => "VolunteerAdmin",
            Role::OrgAdmin => "OrgAdmin",
            Role::SwepAdmin => "SwepAdmin",
        }
    }

    /// Resolve an exact role tag. Anything else is not a base role.
    pub fn from_tag(tag: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|r| r.as_str() == tag)
    }

    /// Human-readable label used by the role editor.
    pub fn label(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "Super Administrator",
            Role::CityAdmin => "City Administrator",
            Role::VolunteerAdmin => "Volunteer Administrator",
            Role::OrgAdmin => "Organisation Administrator",
            Role::SwepAdmin => "SWEP Administrator",
        }
    }

    pub fn is_exclusive(&self) -> bool {
        !matches!(self, Role::SwepAdmin)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A role-scoping relationship: the prefix of a `<prefix>:<scope>` claim.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeFamily {
    City,
    Organisation,
    Swep,
}

impl ScopeFamily {
    pub const ALL: [ScopeFamily; 3] = [ScopeFamily::City, ScopeFamily::Organisation, ScopeFamily::Swep];

    pub fn prefix(&self) -> &'static str {
        match self {
            ScopeFamily::City => "CityAdminFor",
            ScopeFamily::Organisation => "AdminFor",
            ScopeFamily::Swep => "SwepAdminFor",
        }
    }

    /// The base role a claim of this family implies.
    pub fn base_role(&self) -> Role {
        match self {
            ScopeFamily::City => Role::CityAdmin,
            ScopeFamily::Organisation => Role::OrgAdmin,
            ScopeFamily::Swep => Role::SwepAdmin,
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<ScopeFamily> {
        ScopeFamily::ALL.into_iter().find(|f| f.prefix() == prefix)
    }
}

impl core::fmt::Display for ScopeFamily {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.prefix())
    }
}

/// True iff `claim` exactly equals a known role tag.
pub fn is_base_role(claim: &str) -> bool {
    Role::from_tag(claim).is_some()
}

/// True iff `claim` is `<known prefix>:<anything>`.
pub fn is_scoped_claim(claim: &str) -> bool {
    claim
        .split_once(':')
        .is_some_and(|(prefix, _)| ScopeFamily::from_prefix(prefix).is_some())
}

/// Roles a principal should hold at most one of.
///
/// Exclusivity is not enforced here; callers flag conflicts themselves.
pub fn exclusive_base_roles() -> BTreeSet<Role> {
    Role::ALL.into_iter().filter(Role::is_exclusive).collect()
}
