// Middleware module - Axum middleware

pub mod rate_limiter;

pub use rate_limiter::{client_identity, rate_limit_middleware, RateLimitState};
