use axum::{
    Router,
    middleware::from_fn_with_state,
    routing::{any, get},
};

use streetsupport_auth::AccessEvaluator;

use crate::authz;

pub mod api;
pub mod pages;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router(evaluator: AccessEvaluator) -> Router {
    let mut screens = Router::new();
    for (page, _) in pages::PAGES {
        screens = screens
            .route(page, get(pages::page))
            .route(&format!("{page}/*rest"), get(pages::page));
    }
    let screens = screens.route_layer(from_fn_with_state(evaluator.clone(), authz::page_guard));

    let api = Router::new()
        .route("/api/:resource", any(api::proxy))
        .route("/api/:resource/*rest", any(api::proxy))
        .route_layer(from_fn_with_state(evaluator, authz::api_guard));

    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/whoami/access", get(system::whoami_access))
        .route(authz::ACCESS_DENIED_PATH, get(system::access_denied))
        .merge(screens)
        .merge(api)
}
