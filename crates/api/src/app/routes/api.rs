use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::Extension,
    http::{HeaderMap, Method, Uri},
    response::{IntoResponse, Response},
};

use crate::app::AppState;
use crate::context::{PrincipalContext, RequestId};
use crate::proxy::ProxyRequest;

/// Relay a granted `/api/*` request to the backend.
pub async fn proxy(
    Extension(state): Extension<Arc<AppState>>,
    Extension(principal): Extension<PrincipalContext>,
    request_id: Option<Extension<RequestId>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let req = ProxyRequest {
        method,
        path: uri.path(),
        query: uri.query(),
        headers: &headers,
        body,
        token: principal.token(),
        request_id: request_id.as_ref().map(|Extension(id)| id.as_str()),
    };

    match state.proxy.forward(req, principal.claims()).await {
        Ok(response) => response,
        Err(e) => e.into_response(),
    }
}
