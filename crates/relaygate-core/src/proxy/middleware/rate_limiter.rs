use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use relaygate_types::RateLimitRule;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use crate::proxy::rate_limit::RateLimiter;

const UNKNOWN_CLIENT: &str = "unknown";

/// State for one rate-limited route group.
#[derive(Clone, Debug)]
pub struct RateLimitState {
    pub limiter: Arc<RateLimiter>,
    pub rule: Arc<RateLimitRule>,
}

impl RateLimitState {
    pub fn new(limiter: Arc<RateLimiter>, rule: RateLimitRule) -> Self {
        Self { limiter, rule: Arc::new(rule) }
    }
}

/// Admission gate for a route group.
///
/// Install with `axum::middleware::from_fn_with_state(state, rate_limit_middleware)`.
pub async fn rate_limit_middleware(
    State(state): State<RateLimitState>,
    request: Request,
    next: Next,
) -> Response {
    let client = client_identity(&request);
    let decision = state.limiter.check_rule(&state.rule, &client).await;
    let now = chrono::Utc::now().timestamp();

    if !decision.is_admitted() {
        tracing::debug!(
            route = %state.rule.key,
            client = %client,
            count = decision.count,
            degraded = decision.degraded,
            "[RateLimit] Request rejected"
        );
        let mut response = too_many_requests();
        decision.write_headers(response.headers_mut(), now);
        return response;
    }

    let mut response = next.run(request).await;
    decision.write_headers(response.headers_mut(), now);
    response
}

fn too_many_requests() -> Response {
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(serde_json::json!({
            "error": "rate limit exceeded",
            "message": "Too many requests, please try again later",
        })),
    )
        .into_response()
}

/// Client identity used in the counter key: first `X-Forwarded-For` hop,
/// then `X-Real-IP`, then the socket peer, then `unknown`.
pub fn client_identity(request: &Request) -> String {
    extract_client_ip(request)
        .or_else(|| {
            request.extensions().get::<ConnectInfo<SocketAddr>>().map(|ConnectInfo(addr)| addr.ip())
        })
        .map_or_else(|| UNKNOWN_CLIENT.to_string(), |ip| ip.to_string())
}

fn extract_client_ip(request: &Request) -> Option<IpAddr> {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.split(',').next())
        .and_then(|s| s.trim().parse().ok())
        .or_else(|| {
            request
                .headers()
                .get("x-real-ip")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.trim().parse().ok())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with(headers: &[(&str, &str)]) -> Request {
        let mut builder = axum::http::Request::builder().uri("/api/accounts");
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_client_identity_order() {
        let req = request_with(&[
            ("x-forwarded-for", "203.0.113.7, 10.0.0.1"),
            ("x-real-ip", "198.51.100.2"),
        ]);
        assert_eq!(client_identity(&req), "203.0.113.7");

        let req = request_with(&[("x-forwarded-for", "garbage"), ("x-real-ip", "198.51.100.2")]);
        assert_eq!(client_identity(&req), "198.51.100.2");

        let mut req = request_with(&[]);
        req.extensions_mut().insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4567))));
        assert_eq!(client_identity(&req), "192.0.2.1");

        assert_eq!(client_identity(&request_with(&[])), "unknown");
    }
}
