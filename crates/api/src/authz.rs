//! Page and API guards.
//!
//! Both guards derive the identifier the permission table is keyed by from
//! the request path and ask the evaluator; the evaluator itself only ever
//! sees exact identifiers.

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};

use streetsupport_auth::{AccessEvaluator, UserAuthClaims, get_swep_location_slugs, get_user_location_slugs};

use crate::app::errors::{forbidden, json_error};
use crate::context::PrincipalContext;

pub const ACCESS_DENIED_PATH: &str = "/access-denied";

/// Page id for a console path: `/users/42/edit` → `/users`.
pub fn page_id(path: &str) -> String {
    let first = path.trim_start_matches('/').split('/').next().unwrap_or_default();
    format!("/{first}")
}

/// Whether any segment is `.` or `..`, literally or percent-encoded.
///
/// Encoded slashes and backslashes count as separators. The backend URL
/// parser collapses dot segments, so the guarded path and the forwarded
/// path would disagree.
pub fn has_dot_segment(path: &str) -> bool {
    let decoded = path
        .to_ascii_lowercase()
        .replace("%2e", ".")
        .replace("%2f", "/")
        .replace("%5c", "/");
    decoded.split(['/', '\\']).any(|segment| segment == "." || segment == "..")
}

/// Endpoint id for an API path: `/api/banners/7?x` → `/api/banners`.
///
/// Paths with dot segments have no endpoint id.
pub fn endpoint_id(path: &str) -> Option<String> {
    if has_dot_segment(path) {
        return None;
    }
    let rest = path.strip_prefix("/api/")?;
    let resource = rest.split('/').next().filter(|r| !r.is_empty())?;
    Some(format!("/api/{resource}"))
}

/// Location scope applied to a screen or its API resource.
///
/// User management narrows VolunteerAdmins to their own cities; SWEP screens
/// union city and SWEP scopes; everything else uses the default rule.
pub fn screen_locations(claims: &UserAuthClaims, resource: &str) -> Option<Vec<String>> {
    let resource = resource
        .trim_start_matches("/api")
        .trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or_default();
    match resource {
        "users" => get_user_location_slugs(claims, true),
        "swep-banners" => get_swep_location_slugs(claims, false),
        _ => get_user_location_slugs(claims, false),
    }
}

/// Redirects to the access-denied view when the page is not granted.
pub async fn page_guard(State(evaluator): State<AccessEvaluator>, req: Request, next: Next) -> Response {
    let Some(principal) = req.extensions().get::<PrincipalContext>().cloned() else {
        return json_error(StatusCode::UNAUTHORIZED, "unauthorized", "missing principal");
    };

    let path = req.uri().path();
    if has_dot_segment(path) {
        tracing::info!(subject = principal.subject(), path = %path, "rejecting dot-segment page path");
        return Redirect::to(ACCESS_DENIED_PATH).into_response();
    }

    let page = page_id(path);
    if !evaluator.has_page_access(principal.claims(), &page) {
        tracing::info!(subject = principal.subject(), page = %page, "page access denied");
        return Redirect::to(ACCESS_DENIED_PATH).into_response();
    }

    next.run(req).await
}

/// Rejects with the fixed 403 envelope when the endpoint/method is not granted.
pub async fn api_guard(State(evaluator): State<AccessEvaluator>, req: Request, next: Next) -> Response {
    let Some(principal) = req.extensions().get::<PrincipalContext>().cloned() else {
        return json_error(StatusCode::UNAUTHORIZED, "unauthorized", "missing principal");
    };

    let Some(endpoint) = endpoint_id(req.uri().path()) else {
        tracing::info!(subject = principal.subject(), path = %req.uri().path(), "api path has no endpoint id");
        return forbidden();
    };
    let method = req.method().as_str().to_string();

    if !evaluator.has_api_access(principal.claims(), &endpoint, &method) {
        tracing::info!(
            subject = principal.subject(),
            endpoint = %endpoint,
            method = %method,
            "api access denied"
        );
        return forbidden();
    }

    next.run(req).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use streetsupport_auth::parse_claims;

    #[test]
    fn page_id_uses_first_segment() {
        assert_eq!(page_id("/users"), "/users");
        assert_eq!(page_id("/users/42/edit"), "/users");
        assert_eq!(page_id("/"), "/");
        assert_eq!(page_id("/swep-banners/"), "/swep-banners");
    }

    #[test]
    fn endpoint_id_uses_resource_segment() {
        assert_eq!(endpoint_id("/api/organisations").as_deref(), Some("/api/organisations"));
        assert_eq!(endpoint_id("/api/organisations/abc/services").as_deref(), Some("/api/organisations"));
        assert_eq!(endpoint_id("/api/"), None);
        assert_eq!(endpoint_id("/organisations"), None);
    }

    #[test]
    fn dot_segments_have_no_endpoint_id() {
        assert_eq!(endpoint_id("/api/organisations/../users/42"), None);
        assert_eq!(endpoint_id("/api/organisations/%2e%2e/users"), None);
        assert_eq!(endpoint_id("/api/organisations/%2E./users"), None);
        assert_eq!(endpoint_id("/api/organisations/./x"), None);
        assert_eq!(endpoint_id("/api/organisations/..%5Cusers"), None);
        assert_eq!(endpoint_id("/api/organisations/%2E%2E%2Fusers"), None);
    }

    #[test]
    fn dot_segment_detection_ignores_dotted_names() {
        assert!(has_dot_segment("/a/../b"));
        assert!(has_dot_segment("/a\\..\\b"));
        assert!(!has_dot_segment("/api/location-logos/logo.v2.png"));
        assert!(!has_dot_segment("/api/banners/..."));
    }

    #[test]
    fn users_screen_restricts_volunteer_admins() {
        let claims = parse_claims(["VolunteerAdmin", "CityAdmin", "CityAdminFor:leeds"]);
        assert_eq!(screen_locations(&claims, "/api/users"), Some(vec!["leeds".to_string()]));
        assert_eq!(screen_locations(&claims, "users"), Some(vec!["leeds".to_string()]));
        assert_eq!(screen_locations(&claims, "/api/users/42"), Some(vec!["leeds".to_string()]));
        assert_eq!(screen_locations(&claims, "/api/banners"), None);
    }

    #[test]
    fn swep_screen_unions_scopes() {
        let claims = parse_claims(["SwepAdmin", "SwepAdminFor:york"]);
        assert_eq!(screen_locations(&claims, "swep-banners"), Some(vec!["york".to_string()]));
        assert_eq!(screen_locations(&claims, "banners"), Some(vec![]));
    }
}
