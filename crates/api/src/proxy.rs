//! Forwarding of granted `/api/*` requests to the backend API.

use std::time::Duration;

use axum::{
    body::{Body, Bytes},
    http::{HeaderMap, Method, StatusCode, header},
    response::Response,
};
use reqwest::Url;
use thiserror::Error;

use streetsupport_auth::{Role, ScopeFamily, UserAuthClaims};

use crate::authz::{has_dot_segment, screen_locations};
use crate::middleware::REQUEST_ID_HEADER;

/// Query parameters the console owns; client-supplied values are replaced.
pub const LOCATION_PARAM: &str = "location";
pub const ORGANISATION_PARAM: &str = "organisation";

const FORWARDED_HEADERS: [header::HeaderName; 2] = [header::CONTENT_TYPE, header::ACCEPT];

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("invalid backend url: {0}")]
    InvalidUrl(String),

    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// One request to relay.
#[derive(Debug)]
pub struct ProxyRequest<'a> {
    pub method: Method,
    /// Path starting with `/api/`.
    pub path: &'a str,
    pub query: Option<&'a str>,
    pub headers: &'a HeaderMap,
    pub body: Bytes,
    /// Session token to present to the backend as a bearer token.
    pub token: &'a str,
    /// Correlation id passed on as `x-request-id`.
    pub request_id: Option<&'a str>,
}

#[derive(Debug, Clone)]
pub struct BackendProxy {
    client: reqwest::Client,
    base_url: String,
}

impl BackendProxy {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ProxyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Backend URL for `req`, with the principal's scope parameters applied.
    pub fn target_url(&self, req: &ProxyRequest<'_>, claims: &UserAuthClaims) -> Result<Url, ProxyError> {
        if has_dot_segment(req.path) {
            return Err(ProxyError::InvalidUrl(format!("dot segment in {}", req.path)));
        }
        let mut url = Url::parse(&format!("{}{}", self.base_url, req.path))
            .map_err(|e| ProxyError::InvalidUrl(e.to_string()))?;
        url.set_query(req.query);

        let scoped = if req.method == Method::GET {
            scope_params(claims, req.path)
        } else {
            Vec::new()
        };

        let mut pairs: Vec<(String, String)> = url
            .query_pairs()
            .filter(|(k, _)| !scoped.iter().any(|(owned, _)| *owned == &**k))
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        pairs.extend(scoped.into_iter().map(|(k, v)| (k.to_string(), v)));

        if pairs.is_empty() {
            url.set_query(None);
        } else {
            url.query_pairs_mut().clear().extend_pairs(pairs);
        }
        Ok(url)
    }

    pub async fn forward(&self, req: ProxyRequest<'_>, claims: &UserAuthClaims) -> Result<Response, ProxyError> {
        let url = self.target_url(&req, claims)?;
        tracing::debug!(
            method = %req.method,
            url = %url,
            request_id = req.request_id.unwrap_or_default(),
            "forwarding to backend"
        );

        let mut upstream = self
            .client
            .request(req.method.clone(), url)
            .bearer_auth(req.token);
        if let Some(request_id) = req.request_id {
            upstream = upstream.header(REQUEST_ID_HEADER, request_id);
        }
        for name in FORWARDED_HEADERS {
            if let Some(value) = req.headers.get(&name) {
                upstream = upstream.header(name, value.clone());
            }
        }
        if !req.body.is_empty() {
            upstream = upstream.body(req.body);
        }

        let upstream = upstream.send().await?;
        let status = StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
        let content_type = upstream.headers().get(header::CONTENT_TYPE).cloned();
        let body = upstream.bytes().await?;

        let mut response = Response::new(Body::from(body));
        *response.status_mut() = status;
        if let Some(content_type) = content_type {
            response.headers_mut().insert(header::CONTENT_TYPE, content_type);
        }
        Ok(response)
    }
}

/// Scope parameters a restricted principal's GET must carry.
///
/// Location-restricted principals get `location=<csv>`. Principals with no
/// location access but organisation scopes get `organisation=<csv>`.
pub fn scope_params(claims: &UserAuthClaims, path: &str) -> Vec<(&'static str, String)> {
    match screen_locations(claims, path) {
        Some(locations) if !locations.is_empty() => {
            vec![(LOCATION_PARAM, locations.join(","))]
        }
        Some(_) if claims.has_role(Role::OrgAdmin) => {
            let orgs: Vec<&str> = claims.scopes(ScopeFamily::Organisation).collect();
            if orgs.is_empty() {
                Vec::new()
            } else {
                vec![(ORGANISATION_PARAM, orgs.join(","))]
            }
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use streetsupport_auth::parse_claims;

    fn proxy() -> BackendProxy {
        BackendProxy::new("http://backend.test", Duration::from_secs(1)).unwrap()
    }

    fn request<'a>(method: Method, path: &'a str, query: Option<&'a str>, headers: &'a HeaderMap) -> ProxyRequest<'a> {
        ProxyRequest {
            method,
            path,
            query,
            headers,
            body: Bytes::new(),
            token: "tok",
            request_id: None,
        }
    }

    #[test]
    fn city_admin_get_is_scoped_to_their_cities() {
        let headers = HeaderMap::new();
        let claims = parse_claims(["CityAdmin", "CityAdminFor:leeds", "CityAdminFor:york"]);
        let url = proxy()
            .target_url(&request(Method::GET, "/api/organisations", Some("page=2"), &headers), &claims)
            .unwrap();
        assert_eq!(url.as_str(), "http://backend.test/api/organisations?page=2&location=leeds%2Cyork");
    }

    #[test]
    fn client_cannot_widen_location_scope() {
        let headers = HeaderMap::new();
        let claims = parse_claims(["CityAdmin", "CityAdminFor:leeds"]);
        let url = proxy()
            .target_url(
                &request(Method::GET, "/api/banners", Some("location=york&sort=asc"), &headers),
                &claims,
            )
            .unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("sort".to_string(), "asc".to_string()),
                ("location".to_string(), "leeds".to_string())
            ]
        );
    }

    #[test]
    fn unrestricted_principals_pass_query_through() {
        let headers = HeaderMap::new();
        let claims = parse_claims(["SuperAdmin"]);
        let url = proxy()
            .target_url(&request(Method::GET, "/api/cities", Some("location=york"), &headers), &claims)
            .unwrap();
        assert_eq!(url.query(), Some("location=york"));

        let url = proxy()
            .target_url(&request(Method::GET, "/api/cities", None, &headers), &claims)
            .unwrap();
        assert_eq!(url.query(), None);
    }

    #[test]
    fn writes_are_not_rescoped() {
        let headers = HeaderMap::new();
        let claims = parse_claims(["CityAdmin", "CityAdminFor:leeds"]);
        let url = proxy()
            .target_url(&request(Method::PUT, "/api/banners/9", None, &headers), &claims)
            .unwrap();
        assert_eq!(url.as_str(), "http://backend.test/api/banners/9");
    }

    #[test]
    fn dot_segment_paths_are_never_built() {
        let headers = HeaderMap::new();
        let claims = parse_claims(["OrgAdmin", "AdminFor:acme-charity"]);
        for path in ["/api/organisations/../users/42", "/api/organisations/%2e%2e/users"] {
            let err = proxy()
                .target_url(&request(Method::DELETE, path, None, &headers), &claims)
                .unwrap_err();
            assert!(matches!(err, ProxyError::InvalidUrl(_)), "{path}");
        }
    }

    #[test]
    fn org_admins_are_scoped_to_their_organisations() {
        let claims = parse_claims(["OrgAdmin", "AdminFor:acme-charity", "AdminFor:soup-run"]);
        assert_eq!(
            scope_params(&claims, "/api/organisations"),
            vec![(ORGANISATION_PARAM, "acme-charity,soup-run".to_string())]
        );
        assert!(scope_params(&parse_claims(["SwepAdmin"]), "/api/cities").is_empty());
    }

    #[test]
    fn users_resource_uses_restricted_volunteer_scope() {
        let claims = parse_claims(["VolunteerAdmin", "CityAdmin", "CityAdminFor:hull"]);
        assert_eq!(scope_params(&claims, "/api/users"), vec![(LOCATION_PARAM, "hull".to_string())]);
        assert!(scope_params(&claims, "/api/organisations").is_empty());
    }
}
