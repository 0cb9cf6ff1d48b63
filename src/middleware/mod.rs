//! HTTP middleware: bearer authentication and request metrics

pub mod auth;
pub mod metrics;

pub use auth::AuthUser;
pub use metrics::RequestMetricsLayer;
