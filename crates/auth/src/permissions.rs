use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Role;

/// Wildcard accepted for pages, endpoint paths and methods.
pub const WILDCARD: &str = "*";

/// An API endpoint and the HTTP methods allowed on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEndpoint {
    pub path: String,
    pub methods: Vec<String>,
}

impl ApiEndpoint {
    pub fn new(path: impl Into<String>, methods: &[&str]) -> Self {
        Self {
            path: path.into(),
            methods: methods.iter().map(|m| m.to_string()).collect(),
        }
    }

    /// Exact path (or `*`) and exact method (or `*`).
    pub fn matches(&self, endpoint: &str, method: &str) -> bool {
        let path_ok = self.path == WILDCARD || self.path == endpoint;
        path_ok && self.methods.iter().any(|m| m == WILDCARD || m == method)
    }
}

/// What a single role may reach.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermissions {
    #[serde(default)]
    pub pages: Vec<String>,
    #[serde(default)]
    pub api_endpoints: Vec<ApiEndpoint>,
}

impl RolePermissions {
    pub fn grants_page(&self, page: &str) -> bool {
        self.pages.iter().any(|p| p == WILDCARD || p == page)
    }

    pub fn grants_api(&self, endpoint: &str, method: &str) -> bool {
        self.api_endpoints.iter().any(|e| e.matches(endpoint, method))
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty() && self.api_endpoints.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum PermissionTableError {
    #[error("failed to read permission table: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid permission table: {0}")]
    Json(#[from] serde_json::Error),
}

static NO_PERMISSIONS: RolePermissions = RolePermissions {
    pages: Vec::new(),
    api_endpoints: Vec::new(),
};

/// Immutable role → permissions mapping.
///
/// Built once at startup and shared (usually behind an `Arc`) by every
/// evaluation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionTable {
    entries: HashMap<Role, RolePermissions>,
}

impl PermissionTable {
    pub fn new(entries: impl IntoIterator<Item = (Role, RolePermissions)>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    /// The console's built-in table.
    pub fn standard() -> Self {
        let all = &[WILDCARD];
        let read = &["GET"];

        Self::new([
            (
                Role::SuperAdmin,
                RolePermissions {
                    pages: vec![WILDCARD.to_string()],
                    api_endpoints: vec![ApiEndpoint::new(WILDCARD, all)],
                },
            ),
            (
                Role::CityAdmin,
                RolePermissions {
                    pages: pages(&[
                        "/organisations",
                        "/advice",
                        "/banners",
                        "/swep-banners",
                        "/location-logos",
                        "/users",
                    ]),
                    api_endpoints: vec![
                        ApiEndpoint::new("/api/organisations", all),
                        ApiEndpoint::new("/api/faqs", all),
                        ApiEndpoint::new("/api/banners", all),
                        ApiEndpoint::new("/api/swep-banners", all),
                        ApiEndpoint::new("/api/location-logos", all),
                        ApiEndpoint::new("/api/users", all),
                        ApiEndpoint::new("/api/cities", read),
                    ],
                },
            ),
            (
                Role::VolunteerAdmin,
                RolePermissions {
                    pages: pages(&["/organisations", "/advice", "/banners", "/users"]),
                    api_endpoints: vec![
                        ApiEndpoint::new("/api/organisations", &["GET", "POST", "PUT", "PATCH"]),
                        ApiEndpoint::new("/api/faqs", all),
                        ApiEndpoint::new("/api/banners", all),
                        ApiEndpoint::new("/api/users", &["GET", "POST", "PUT"]),
                        ApiEndpoint::new("/api/cities", read),
                    ],
                },
            ),
            (
                Role::OrgAdmin,
                RolePermissions {
                    pages: pages(&["/organisations"]),
                    api_endpoints: vec![
                        ApiEndpoint::new("/api/organisations", all),
                        ApiEndpoint::new("/api/cities", read),
                    ],
                },
            ),
            (
                Role::SwepAdmin,
                RolePermissions {
                    pages: pages(&["/swep-banners"]),
                    api_endpoints: vec![
                        ApiEndpoint::new("/api/swep-banners", &["GET", "PUT", "PATCH"]),
                        ApiEndpoint::new("/api/cities", read),
                    ],
                },
            ),
        ])
    }

    /// Parse a JSON document keyed by role tag.
    ///
    /// Unknown role tags are skipped with a warning; roles missing from the
    /// document end up with no permissions.
    pub fn from_json(json: &str) -> Result<Self, PermissionTableError> {
        let raw: BTreeMap<String, RolePermissions> = serde_json::from_str(json)?;
        let mut entries = HashMap::new();
        for (tag, perms) in raw {
            match Role::from_tag(&tag) {
                Some(role) => {
                    entries.insert(role, perms);
                }
                None => tracing::warn!(role = %tag, "ignoring unknown role in permission table"),
            }
        }
        Ok(Self { entries })
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PermissionTableError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, PermissionTableError> {
        let sorted: BTreeMap<&str, &RolePermissions> =
            self.entries.iter().map(|(r, p)| (r.as_str(), p)).collect();
        Ok(serde_json::to_string_pretty(&sorted)?)
    }

    /// Permissions of `role`; empty when the table has no entry for it.
    pub fn permissions_for(&self, role: Role) -> &RolePermissions {
        self.entries.get(&role).unwrap_or(&NO_PERMISSIONS)
    }

    /// Roles whose entry grants `page`.
    pub fn roles_granting_page(&self, page: &str) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|r| self.permissions_for(*r).grants_page(page))
            .collect()
    }

    /// Roles whose entry grants `method` on `endpoint`.
    pub fn roles_granting_api(&self, endpoint: &str, method: &str) -> Vec<Role> {
        Role::ALL
            .into_iter()
            .filter(|r| self.permissions_for(*r).grants_api(endpoint, method))
            .collect()
    }
}

fn pages(paths: &[&str]) -> Vec<String> {
    paths.iter().map(|p| p.to_string()).collect()
}
