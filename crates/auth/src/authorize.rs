use std::sync::Arc;

use serde::Serialize;

use crate::claims::{DisplayRole, DisplayRoleKind};
use crate::{PermissionTable, Role, ScopeFamily, UserAuthClaims};

/// Page and API access decisions over an immutable permission table.
///
/// - No IO
/// - No panics
/// - Every method is a pure function of the table and its arguments
#[derive(Debug, Clone)]
pub struct AccessEvaluator {
    table: Arc<PermissionTable>,
}

impl Default for AccessEvaluator {
    fn default() -> Self {
        Self::new(Arc::new(PermissionTable::standard()))
    }
}

impl AccessEvaluator {
    pub fn new(table: Arc<PermissionTable>) -> Self {
        Self { table }
    }

    /// Exact page match or a `*` page entry on any held role.
    pub fn has_page_access(&self, claims: &UserAuthClaims, page: &str) -> bool {
        if claims.has_role(Role::SuperAdmin) {
            return true;
        }
        claims
            .roles
            .iter()
            .any(|role| self.table.permissions_for(*role).grants_page(page))
    }

    /// Exact (or `*`) endpoint path and method on any held role.
    pub fn has_api_access(&self, claims: &UserAuthClaims, endpoint: &str, method: &str) -> bool {
        if claims.has_role(Role::SuperAdmin) {
            return true;
        }
        claims
            .roles
            .iter()
            .any(|role| self.table.permissions_for(*role).grants_api(endpoint, method))
    }

    pub fn explain_page_access(&self, claims: &UserAuthClaims, page: &str) -> AccessExplanation {
        let granting = self.table.roles_granting_page(page);
        self.explain(
            claims,
            page.to_string(),
            self.has_page_access(claims, page),
            granting,
        )
    }

    pub fn explain_api_access(
        &self,
        claims: &UserAuthClaims,
        endpoint: &str,
        method: &str,
    ) -> AccessExplanation {
        let granting = self.table.roles_granting_api(endpoint, method);
        self.explain(
            claims,
            format!("{method} {endpoint}"),
            self.has_api_access(claims, endpoint, method),
            granting,
        )
    }

    fn explain(
        &self,
        claims: &UserAuthClaims,
        target: String,
        granted: bool,
        mut granting: Vec<Role>,
    ) -> AccessExplanation {
        if !granting.contains(&Role::SuperAdmin) {
            granting.insert(0, Role::SuperAdmin);
        }

        let mut roles: Vec<Role> = Vec::new();
        for role in &claims.roles {
            if !roles.contains(role) {
                roles.push(*role);
            }
        }
        let held_granting: Vec<Role> = granting.iter().copied().filter(|r| claims.has_role(*r)).collect();

        if granted {
            let reason = if claims.has_role(Role::SuperAdmin) {
                "Principal holds SuperAdmin, which matches every page and endpoint".to_string()
            } else {
                format!("Granted to '{target}' by role(s) {}", join(&held_granting))
            };
            return AccessExplanation {
                target,
                granted,
                reason,
                roles,
                granting_roles: held_granting,
                denial: None,
            };
        }

        let denial = if claims.roles.is_empty() {
            DenialReason {
                kind: DenialKind::NoRoles,
                message: "Principal holds no recognised base role".to_string(),
                suggestions: vec![format!("Assign one of: {}", join(&granting))],
            }
        } else {
            DenialReason {
                kind: DenialKind::NotGranted,
                message: format!("None of the held roles ({}) grants '{target}'", join(&roles)),
                suggestions: vec![format!(
                    "Roles that would grant '{target}': {}",
                    join(&granting)
                )],
            }
        };

        AccessExplanation {
            reason: denial.message.clone(),
            target,
            granted,
            roles,
            granting_roles: Vec::new(),
            denial: Some(denial),
        }
    }
}

fn join(roles: &[Role]) -> String {
    roles.iter().map(Role::as_str).collect::<Vec<_>>().join(", ")
}

// ─────────────────────────────────────────────────────────────────────────────
// Access Explanation (audit trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Why an access check came out the way it did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccessExplanation {
    /// Page path, or `"<METHOD> <endpoint>"`.
    pub target: String,
    pub granted: bool,
    pub reason: String,
    pub roles: Vec<Role>,
    /// Held roles that grant the target (empty on denial).
    pub granting_roles: Vec<Role>,
    pub denial: Option<DenialReason>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DenialReason {
    pub kind: DenialKind,
    pub message: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    NoRoles,
    NotGranted,
}

// ─────────────────────────────────────────────────────────────────────────────
// Role removal rule
// ─────────────────────────────────────────────────────────────────────────────

/// Whether the role editor may remove `role_id` from `displayed`.
///
/// Umbrella entries are never removable on their own. Otherwise removal is
/// refused only when it would strip the principal's last access grant: a
/// single family remains and the entry is its only member.
pub fn can_remove_role(role_id: &str, displayed: &[DisplayRole]) -> bool {
    let Some(target) = displayed.iter().find(|r| r.id == role_id) else {
        return false;
    };
    if target.kind.is_umbrella() {
        return false;
    }

    let count = |kind: DisplayRoleKind| displayed.iter().filter(|r| r.kind == kind).count();
    let city = count(DisplayRoleKind::CityScoped);
    let swep = count(DisplayRoleKind::SwepScoped);
    let org = count(DisplayRoleKind::OrgScoped);
    let standalone = count(DisplayRoleKind::Standalone);

    let groups = [city, swep, org].iter().filter(|n| **n > 0).count() + standalone;
    let family_size = match target.kind {
        DisplayRoleKind::CityScoped => city,
        DisplayRoleKind::SwepScoped => swep,
        DisplayRoleKind::OrgScoped => org,
        _ => 1,
    };

    !(groups == 1 && family_size == 1)
}

// ─────────────────────────────────────────────────────────────────────────────
// Location scoping
// ─────────────────────────────────────────────────────────────────────────────

/// Cities the principal is restricted to, or `None` for unrestricted.
///
/// `restrict_secondary` scopes a VolunteerAdmin down to the cities they also
/// administer (user management only). `Some(vec![])` means no city at all.
pub fn get_user_location_slugs(claims: &UserAuthClaims, restrict_secondary: bool) -> Option<Vec<String>> {
    location_slugs(claims, restrict_secondary, &[ScopeFamily::City], &[Role::CityAdmin])
}

/// Like [`get_user_location_slugs`], unioning city and SWEP scopes.
pub fn get_swep_location_slugs(claims: &UserAuthClaims, restrict_secondary: bool) -> Option<Vec<String>> {
    location_slugs(
        claims,
        restrict_secondary,
        &[ScopeFamily::City, ScopeFamily::Swep],
        &[Role::CityAdmin, Role::SwepAdmin],
    )
}

fn location_slugs(
    claims: &UserAuthClaims,
    restrict_secondary: bool,
    families: &[ScopeFamily],
    scoped_roles: &[Role],
) -> Option<Vec<String>> {
    if claims.has_role(Role::SuperAdmin) {
        return None;
    }
    if claims.has_role(Role::VolunteerAdmin) && !restrict_secondary {
        return None;
    }
    if !scoped_roles.iter().any(|r| claims.has_role(*r)) {
        return Some(Vec::new());
    }

    let mut slugs: Vec<String> = Vec::new();
    for claim in &claims.specific_claims {
        if !families.contains(&claim.family) {
            continue;
        }
        // Single family: keep every claim; union: first occurrence wins.
        if families.len() > 1 && slugs.iter().any(|s| *s == claim.scope) {
            continue;
        }
        slugs.push(claim.scope.clone());
    }

    // A scoped role without its scoping claims is treated as unrestricted.
    if slugs.is_empty() { None } else { Some(slugs) }
}
