use axum::{
    extract::State,
    http::{header, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use relaygate_core::proxy::health::diagnose;
use relaygate_core::proxy::middleware::rate_limit_middleware;
use relaygate_core::proxy::prometheus;
use relaygate_core::AccountRepository;

use crate::api;
use crate::state::{AppState, ACCOUNT_TEST_RULE, API_RULE};

pub fn build_router(state: AppState) -> Router {
    // Each group only counts against its own rule.
    let limited_api = api::router().route_layer(middleware::from_fn_with_state(
        state.rate_limit_state(API_RULE),
        rate_limit_middleware,
    ));
    let account_test = Router::<AppState>::new()
        .route("/accounts/:id/test", post(api::accounts::test_account))
        .route_layer(middleware::from_fn_with_state(
            state.rate_limit_state(ACCOUNT_TEST_RULE),
            rate_limit_middleware,
        ));

    let public_routes = Router::<AppState>::new()
        .route("/health", get(health_check))
        .route("/healthz", get(health_check))
        .route("/version", get(version_info))
        .route("/metrics", get(get_metrics));

    Router::new()
        .nest("/api", limited_api.merge(account_test))
        .merge(public_routes)
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(cors_layer()))
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any)
}

async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, axum::Json(serde_json::json!({"status": "ok"})))
}

async fn version_info() -> impl IntoResponse {
    (
        StatusCode::OK,
        axum::Json(serde_json::json!({
            "version": option_env!("GIT_VERSION").unwrap_or("dev"),
            "build_time": option_env!("BUILD_TIME").unwrap_or("unknown"),
            "cargo_version": env!("CARGO_PKG_VERSION"),
        })),
    )
}

async fn get_metrics(State(state): State<AppState>) -> impl IntoResponse {
    if let Ok(accounts) = state.repository().list().await {
        let stats = diagnose(&accounts, None, Utc::now(), &state.config().window_bands);
        prometheus::set_account_gauges(stats.total, stats.schedulable());
    }

    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        prometheus::render_metrics(),
    )
}
