use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::authorize::can_remove_role;
use crate::{Role, ScopeFamily};

/// A claim narrowed to one city or organisation (`<prefix>:<scope>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopedClaim {
    pub family: ScopeFamily,
    pub scope: String,
}

impl ScopedClaim {
    pub fn new(family: ScopeFamily, scope: impl Into<String>) -> Self {
        Self {
            family,
            scope: scope.into(),
        }
    }

    /// Parse `<known prefix>:<scope>`; the scope is everything after the first `:`.
    pub fn parse(raw: &str) -> Option<Self> {
        let (prefix, scope) = raw.split_once(':')?;
        let family = ScopeFamily::from_prefix(prefix)?;
        Some(Self::new(family, scope))
    }
}

impl core::fmt::Display for ScopedClaim {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}:{}", self.family.prefix(), self.scope)
    }
}

impl Serialize for ScopedClaim {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ScopedClaim {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ScopedClaim::parse(&raw)
            .ok_or_else(|| serde::de::Error::custom(format!("unrecognised scoped claim '{raw}'")))
    }
}

/// One raw claim string, classified.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Claim {
    Base(Role),
    Scoped(ScopedClaim),
}

impl Claim {
    /// Classify a raw claim. Unknown shapes yield `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        if let Some(role) = Role::from_tag(raw) {
            return Some(Claim::Base(role));
        }
        ScopedClaim::parse(raw).map(Claim::Scoped)
    }
}

impl core::fmt::Display for Claim {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Claim::Base(role) => core::fmt::Display::fmt(role, f),
            Claim::Scoped(scoped) => core::fmt::Display::fmt(scoped, f),
        }
    }
}

/// Parsed claims of one principal.
///
/// `roles` and `specific_claims` keep input order and duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAuthClaims {
    pub roles: Vec<Role>,
    pub specific_claims: Vec<ScopedClaim>,
}

impl UserAuthClaims {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Scope values of one family, in input order.
    pub fn scopes(&self, family: ScopeFamily) -> impl Iterator<Item = &str> + '_ {
        self.specific_claims
            .iter()
            .filter(move |c| c.family == family)
            .map(|c| c.scope.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.roles.is_empty() && self.specific_claims.is_empty()
    }

    /// Exclusive base roles held, deduplicated, in declaration order.
    ///
    /// More than one entry means the principal's assignment is in conflict.
    pub fn exclusive_roles_held(&self) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|r| r.is_exclusive() && self.has_role(*r))
            .collect()
    }
}

/// Split raw claim strings into base roles and scoped claims.
///
/// Unknown claims are dropped (logged at debug) rather than rejected, so new
/// claim types from the identity provider do not lock anyone out.
pub fn parse_claims<I, S>(raw: I) -> UserAuthClaims
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut parsed = UserAuthClaims::default();
    for claim in raw {
        let claim = claim.as_ref();
        match Claim::parse(claim) {
            Some(Claim::Base(role)) => parsed.roles.push(role),
            Some(Claim::Scoped(scoped)) => parsed.specific_claims.push(scoped),
            None => tracing::debug!(claim, "dropping unrecognised claim"),
        }
    }
    parsed
}

// ─────────────────────────────────────────────────────────────────────────────
// Display model (role editor)
// ─────────────────────────────────────────────────────────────────────────────

/// How a displayed role relates to the claims behind it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayRoleKind {
    /// A base role shown on its own.
    Standalone,
    /// `CityAdmin` shown only because city-scoped claims exist.
    CityUmbrella,
    CityScoped,
    /// `SwepAdmin` shown only because SWEP-scoped claims exist.
    SwepUmbrella,
    SwepScoped,
    OrgScoped,
}

impl DisplayRoleKind {
    pub fn is_umbrella(&self) -> bool {
        matches!(self, DisplayRoleKind::CityUmbrella | DisplayRoleKind::SwepUmbrella)
    }

    fn scoped(family: ScopeFamily) -> Self {
        match family {
            ScopeFamily::City => DisplayRoleKind::CityScoped,
            ScopeFamily::Organisation => DisplayRoleKind::OrgScoped,
            ScopeFamily::Swep => DisplayRoleKind::SwepScoped,
        }
    }

    fn umbrella(family: ScopeFamily) -> Option<Self> {
        match family {
            ScopeFamily::City => Some(DisplayRoleKind::CityUmbrella),
            ScopeFamily::Swep => Some(DisplayRoleKind::SwepUmbrella),
            ScopeFamily::Organisation => None,
        }
    }
}

/// A role entry as shown in the user-management role editor.
///
/// `id` is the raw claim the entry stands for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayRole {
    pub id: String,
    pub label: String,
    pub kind: DisplayRoleKind,
    pub can_remove: bool,
}

impl DisplayRole {
    fn new(id: impl Into<String>, label: impl Into<String>, kind: DisplayRoleKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
            can_remove: false,
        }
    }
}

/// Group scoped claims under their implied base role and label everything.
///
/// Order: SuperAdmin, VolunteerAdmin, then the city, SWEP and organisation
/// families (umbrella first). Duplicate claims produce one entry.
pub fn parse_for_display(claims: &UserAuthClaims) -> Vec<DisplayRole> {
    let mut out: Vec<DisplayRole> = Vec::new();
    let mut push = |entry: DisplayRole| {
        if !out.iter().any(|e| e.id == entry.id) {
            out.push(entry);
        }
    };

    for role in [Role::SuperAdmin, Role::VolunteerAdmin] {
        if claims.has_role(role) {
            push(DisplayRole::new(role.as_str(), role.label(), DisplayRoleKind::Standalone));
        }
    }

    for family in [ScopeFamily::City, ScopeFamily::Swep, ScopeFamily::Organisation] {
        let base = family.base_role();
        let scoped: Vec<&ScopedClaim> = claims
            .specific_claims
            .iter()
            .filter(|c| c.family == family)
            .collect();

        if scoped.is_empty() {
            if claims.has_role(base) {
                push(DisplayRole::new(base.as_str(), base.label(), DisplayRoleKind::Standalone));
            }
            continue;
        }

        if let Some(kind) = DisplayRoleKind::umbrella(family) {
            push(DisplayRole::new(base.as_str(), base.label(), kind));
        }
        for claim in scoped {
            push(DisplayRole::new(
                claim.to_string(),
                format!("{}: {}", base.label(), claim.scope),
                DisplayRoleKind::scoped(family),
            ));
        }
    }

    let removable: Vec<bool> = out.iter().map(|e| can_remove_role(&e.id, &out)).collect();
    for (entry, can_remove) in out.iter_mut().zip(removable) {
        entry.can_remove = can_remove;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(entries: &[DisplayRole]) -> Vec<&str> {
        entries.iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn parser_splits_roles_and_scoped_claims_and_drops_unknown() {
        let parsed = parse_claims(["CityAdmin", "CityAdminFor:leeds", "UnknownClaim123"]);
        assert_eq!(parsed.roles, vec![Role::CityAdmin]);
        assert_eq!(
            parsed.specific_claims,
            vec![ScopedClaim::new(ScopeFamily::City, "leeds")]
        );
        assert_eq!(parsed.specific_claims[0].to_string(), "CityAdminFor:leeds");
    }

    #[test]
    fn parser_preserves_order_and_duplicates() {
        let parsed = parse_claims(["SuperAdmin", "OrgAdmin", "SuperAdmin"]);
        assert_eq!(parsed.roles, vec![Role::SuperAdmin, Role::OrgAdmin, Role::SuperAdmin]);
    }

    #[test]
    fn parser_tolerates_empty_and_garbage_input() {
        assert!(parse_claims(Vec::<String>::new()).is_empty());
        assert!(parse_claims(["", ":", "cityadmin", "Nope:leeds"]).is_empty());
    }

    #[test]
    fn scope_keeps_everything_after_first_colon() {
        let claim = ScopedClaim::parse("AdminFor:org:with:colons").unwrap();
        assert_eq!(claim.family, ScopeFamily::Organisation);
        assert_eq!(claim.scope, "org:with:colons");
        assert_eq!(claim.to_string(), "AdminFor:org:with:colons");
    }

    #[test]
    fn scoped_claims_serialize_as_raw_strings() {
        let parsed = parse_claims(["SwepAdmin", "SwepAdminFor:york"]);
        let json = serde_json::to_value(&parsed).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "roles": ["SwepAdmin"], "specific_claims": ["SwepAdminFor:york"] })
        );
        let back: UserAuthClaims = serde_json::from_value(json).unwrap();
        assert_eq!(back, parsed);
    }

    #[test]
    fn exclusive_conflicts_are_reported() {
        let parsed = parse_claims(["CityAdmin", "OrgAdmin", "SwepAdmin", "CityAdmin"]);
        assert_eq!(parsed.exclusive_roles_held(), vec![Role::CityAdmin, Role::OrgAdmin]);
        assert!(parse_claims(["SwepAdmin"]).exclusive_roles_held().is_empty());
    }

    #[test]
    fn display_groups_city_claims_under_umbrella() {
        let parsed = parse_claims(["CityAdmin", "CityAdminFor:leeds", "CityAdminFor:york"]);
        let display = parse_for_display(&parsed);

        assert_eq!(ids(&display), vec!["CityAdmin", "CityAdminFor:leeds", "CityAdminFor:york"]);
        assert_eq!(display[0].kind, DisplayRoleKind::CityUmbrella);
        assert_eq!(display[1].label, "City Administrator: leeds");
        assert!(!display[0].can_remove);
        assert!(display[1].can_remove);
        assert!(display[2].can_remove);
    }

    #[test]
    fn display_folds_org_admin_into_its_family() {
        let parsed = parse_claims(["OrgAdmin", "AdminFor:acme-charity"]);
        let display = parse_for_display(&parsed);

        assert_eq!(ids(&display), vec!["AdminFor:acme-charity"]);
        assert_eq!(display[0].label, "Organisation Administrator: acme-charity");
        assert_eq!(display[0].kind, DisplayRoleKind::OrgScoped);
        assert!(!display[0].can_remove);
    }

    #[test]
    fn base_role_without_scopes_is_standalone() {
        let parsed = parse_claims(["CityAdmin", "VolunteerAdmin"]);
        let display = parse_for_display(&parsed);

        assert_eq!(ids(&display), vec!["VolunteerAdmin", "CityAdmin"]);
        assert!(display.iter().all(|e| e.kind == DisplayRoleKind::Standalone));
        assert!(display.iter().all(|e| e.can_remove));
    }

    #[test]
    fn last_remaining_grant_is_not_removable() {
        let display = parse_for_display(&parse_claims(["SuperAdmin"]));
        assert_eq!(display.len(), 1);
        assert!(!display[0].can_remove);
    }

    #[test]
    fn duplicate_claims_display_once() {
        let parsed = parse_claims(["SwepAdmin", "SwepAdminFor:hull", "SwepAdminFor:hull"]);
        let display = parse_for_display(&parsed);
        assert_eq!(ids(&display), vec!["SwepAdmin", "SwepAdminFor:hull"]);
    }
}
