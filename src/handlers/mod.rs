pub mod admin;
pub mod booking;
pub mod calendar;
pub mod dev;
pub mod health;

use axum::http::HeaderMap;

/// Bearer credential from the Authorization header, if any. The admin gate
/// decides whether it is valid.
pub(crate) fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
