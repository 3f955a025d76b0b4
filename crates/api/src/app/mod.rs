//! HTTP application wiring (Axum router + shared state).
//!
//! - `routes/`: handlers (one file per surface: system, pages, api proxy)
//! - `dto.rs`: response/query shapes
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use anyhow::Context;
use axum::{Extension, Router, middleware::from_fn, routing::get};
use tower::ServiceBuilder;

use streetsupport_auth::{AccessEvaluator, Hs256SessionValidator, PermissionTable, SessionValidator};

use crate::config::ConsoleConfig;
use crate::middleware;
use crate::proxy::BackendProxy;

pub mod dto;
pub mod errors;
pub mod routes;

/// Process-wide, read-only state shared by handlers.
pub struct AppState {
    pub evaluator: AccessEvaluator,
    pub proxy: BackendProxy,
}

/// Build the full HTTP router from configuration (entrypoint used by `main.rs`).
pub fn build_app(config: &ConsoleConfig) -> anyhow::Result<Router> {
    let table = match &config.permissions_file {
        Some(path) => PermissionTable::from_json_file(path)
            .with_context(|| format!("loading permission table from {}", path.display()))?,
        None => PermissionTable::standard(),
    };
    let sessions: Arc<dyn SessionValidator> = Arc::new(Hs256SessionValidator::new(config.jwt_secret.as_bytes()));
    let proxy = BackendProxy::new(config.backend_url.clone(), config.backend_timeout)
        .context("building backend client")?;

    Ok(build_router(AccessEvaluator::new(Arc::new(table)), sessions, proxy))
}

/// Router over explicit collaborators (tests substitute their own).
pub fn build_router(
    evaluator: AccessEvaluator,
    sessions: Arc<dyn SessionValidator>,
    proxy: BackendProxy,
) -> Router {
    let auth_state = middleware::AuthState { sessions };
    let state = Arc::new(AppState {
        evaluator: evaluator.clone(),
        proxy,
    });

    // Protected routes: require a valid session.
    let protected = routes::router(evaluator)
        .layer(Extension(state))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ServiceBuilder::new().layer(from_fn(middleware::request_id_middleware)))
}
