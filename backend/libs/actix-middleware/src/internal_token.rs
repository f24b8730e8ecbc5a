//! Internal token check
//!
//! Routes guarded by the token are closed when no token is configured.

use actix_web::HttpRequest;

pub const INTERNAL_TOKEN_HEADER: &str = "x-internal-token";

/// Whether `req` carries `expected` in [`INTERNAL_TOKEN_HEADER`]
pub fn has_internal_token(req: &HttpRequest, expected: Option<&str>) -> bool {
    match expected {
        Some(token) if !token.is_empty() => req
            .headers()
            .get(INTERNAL_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v == token)
            .unwrap_or(false),
        _ => false,
    }
}
