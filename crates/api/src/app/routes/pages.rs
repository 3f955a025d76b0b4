use axum::{
    Json,
    extract::Extension,
    http::Uri,
};

use crate::app::dto::PageView;
use crate::authz::{page_id, screen_locations};
use crate::context::PrincipalContext;

/// Console screens and their titles.
pub const PAGES: [(&str, &str); 7] = [
    ("/organisations", "Organisations"),
    ("/banners", "Banners"),
    ("/advice", "Advice"),
    ("/location-logos", "Location Logos"),
    ("/cities", "Cities"),
    ("/users", "Users"),
    ("/swep-banners", "SWEP Banners"),
];

pub fn title(page: &str) -> &'static str {
    PAGES
        .iter()
        .find(|(p, _)| *p == page)
        .map(|(_, t)| *t)
        .unwrap_or("Admin")
}

/// Any guarded screen (and its sub-paths).
pub async fn page(Extension(principal): Extension<PrincipalContext>, uri: Uri) -> Json<PageView> {
    let page = page_id(uri.path());
    Json(PageView {
        title: title(&page),
        locations: screen_locations(principal.claims(), &page),
        page,
    })
}
