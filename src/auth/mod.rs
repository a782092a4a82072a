#[allow(clippy::module_inception)]
pub mod auth;
pub mod credentials;
pub mod guard;
pub mod handlers;
pub mod jwt;
pub mod middleware;
