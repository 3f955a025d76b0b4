//! HTTP surface of the admin console: session handling, page/API guards and
//! the proxy to the backend API.

pub mod app;
pub mod authz;
pub mod config;
pub mod context;
pub mod middleware;
pub mod proxy;

pub use app::build_app;
pub use config::ConsoleConfig;
