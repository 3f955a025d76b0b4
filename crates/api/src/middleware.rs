use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::Instrument;
use uuid::Uuid;

use streetsupport_auth::{Principal, SessionValidator};

use crate::app::errors::json_error;
use crate::context::{PrincipalContext, RequestId};

/// Cookie carrying the session token for browser page requests.
pub const SESSION_COOKIE: &str = "ss_session";

pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Clone)]
pub struct AuthState {
    pub sessions: Arc<dyn SessionValidator>,
}

/// Validate the session token and attach the principal to the request.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Response {
    let Some(token) = extract_token(req.headers()) else {
        return json_error(StatusCode::UNAUTHORIZED, "unauthorized", "missing session token");
    };

    let session = match state.sessions.validate(&token, Utc::now()) {
        Ok(session) => session,
        Err(e) => {
            tracing::debug!(error = %e, "rejecting session token");
            return json_error(StatusCode::UNAUTHORIZED, "unauthorized", e.to_string());
        }
    };

    req.extensions_mut()
        .insert(PrincipalContext::new(Principal::from_session(&session), token));

    next.run(req).await
}

/// Bearer header first, then the session cookie.
///
/// Non-Bearer `Authorization` schemes are ignored.
pub fn extract_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().strip_prefix(SESSION_COOKIE)?.strip_prefix('='))
        .find(|token| !token.is_empty())
        .map(str::to_string)
}

/// Tag the request with a correlation id and run it inside a span.
pub async fn request_id_middleware(mut req: Request, next: Next) -> Response {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::now_v7().to_string());

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %req.method(),
        path = %req.uri().path(),
    );
    req.extensions_mut().insert(RequestId::new(request_id.clone()));

    let mut response = next.run(req).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(header::HeaderName, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.append(name.clone(), HeaderValue::from_str(value).unwrap());
        }
        map
    }

    #[test]
    fn bearer_token_is_extracted() {
        let h = headers(&[(header::AUTHORIZATION, "Bearer abc.def.ghi")]);
        assert_eq!(extract_token(&h).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn non_bearer_authorization_is_not_a_token() {
        let h = headers(&[(header::AUTHORIZATION, "Basic dXNlcjpwYXNz")]);
        assert_eq!(extract_token(&h), None);
        let h = headers(&[(header::AUTHORIZATION, "Bearer   ")]);
        assert_eq!(extract_token(&h), None);
    }

    #[test]
    fn basic_authorization_falls_back_to_session_cookie() {
        let h = headers(&[
            (header::AUTHORIZATION, "Basic dXNlcjpwYXNz"),
            (header::COOKIE, "ss_session=tok123"),
        ]);
        assert_eq!(extract_token(&h).as_deref(), Some("tok123"));
    }

    #[test]
    fn bearer_wins_over_cookie() {
        let h = headers(&[
            (header::AUTHORIZATION, "Bearer from-header"),
            (header::COOKIE, "ss_session=from-cookie"),
        ]);
        assert_eq!(extract_token(&h).as_deref(), Some("from-header"));
    }

    #[test]
    fn session_cookie_is_used_without_header() {
        let h = headers(&[(header::COOKIE, "theme=dark; ss_session=tok123; other=1")]);
        assert_eq!(extract_token(&h).as_deref(), Some("tok123"));

        let h = headers(&[(header::COOKIE, "ss_session_old=nope")]);
        assert_eq!(extract_token(&h), None);
    }
}
