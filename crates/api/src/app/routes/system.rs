use std::sync::Arc;

use axum::{
    Json,
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

use streetsupport_auth::{get_swep_location_slugs, get_user_location_slugs, parse_for_display};

use crate::app::AppState;
use crate::app::dto::{AccessQuery, WhoAmIResponse};
use crate::app::errors::json_error;
use crate::context::PrincipalContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(principal): Extension<PrincipalContext>) -> Json<WhoAmIResponse> {
    let p = principal.principal();
    let claims = &p.claims;

    Json(WhoAmIResponse {
        subject: p.subject.clone(),
        email: p.email.clone(),
        name: p.name.clone(),
        roles: claims.roles.clone(),
        specific_claims: claims.specific_claims.clone(),
        display_roles: parse_for_display(claims),
        role_conflict: claims.exclusive_roles_held().len() > 1,
        locations: get_user_location_slugs(claims, false),
        swep_locations: get_swep_location_slugs(claims, false),
    })
}

/// GET /whoami/access?page=/x or ?endpoint=/api/x&method=GET
pub async fn whoami_access(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<AccessQuery>,
) -> Response {
    let evaluator = &state.evaluator;
    let explanation = match (query.page, query.endpoint) {
        (Some(page), _) => evaluator.explain_page_access(principal.claims(), &page),
        (None, Some(endpoint)) => {
            let method = query.method.unwrap_or_else(|| "GET".to_string()).to_uppercase();
            evaluator.explain_api_access(principal.claims(), &endpoint, &method)
        }
        (None, None) => {
            return json_error(StatusCode::BAD_REQUEST, "invalid_query", "page or endpoint is required");
        }
    };

    (StatusCode::OK, Json(json!({ "explanation": explanation }))).into_response()
}

pub async fn access_denied() -> Response {
    (
        StatusCode::OK,
        Json(json!({
            "page": crate::authz::ACCESS_DENIED_PATH,
            "title": "Access denied",
            "message": "You do not have permission to view this page.",
        })),
    )
        .into_response()
}
