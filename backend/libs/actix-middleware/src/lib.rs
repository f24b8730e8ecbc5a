//! # Actix Middleware Library
//!
//! HTTP plumbing shared by the portal services
//!
//! ## Modules
//! - `internal_token`: shared-secret check for service-to-service routes
//! - `logging`: tracing subscriber setup
//! - `metrics`: per-request metrics middleware
//! - `shutdown`: process signal handling

pub mod internal_token;
pub mod logging;
pub mod metrics;
pub mod shutdown;

pub use internal_token::{has_internal_token, INTERNAL_TOKEN_HEADER};
pub use logging::{init_tracing, LogFormat};
pub use metrics::MetricsMiddleware;
pub use shutdown::shutdown_signal;
