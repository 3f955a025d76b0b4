use serde::{Deserialize, Serialize};

use streetsupport_auth::{DisplayRole, Role, ScopedClaim};

#[derive(Debug, Serialize)]
pub struct WhoAmIResponse {
    pub subject: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub roles: Vec<Role>,
    pub specific_claims: Vec<ScopedClaim>,
    pub display_roles: Vec<DisplayRole>,
    /// More than one exclusive base role is held.
    pub role_conflict: bool,
    pub locations: Option<Vec<String>>,
    pub swep_locations: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct AccessQuery {
    pub page: Option<String>,
    pub endpoint: Option<String>,
    pub method: Option<String>,
}

/// View model for a console screen; rendering is left to the front end.
#[derive(Debug, Serialize)]
pub struct PageView {
    pub page: String,
    pub title: &'static str,
    /// `null` = every location; `[]` = none.
    pub locations: Option<Vec<String>>,
}
