use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

use crate::auth::rate_limit::rate_limit_submissions;
use crate::handlers;
use crate::AppState;

pub fn router(state: AppState) -> Router {
    let submit_limit = middleware::from_fn_with_state(state.clone(), rate_limit_submissions);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/readyz", get(handlers::health::readyz))
        .route("/ws", get(handlers::ws::ws_handler))
        // Dashboard page and form
        .route("/", get(handlers::dashboard::index))
        .route(
            "/submit",
            post(handlers::dashboard::submit_form).layer(submit_limit.clone()),
        )
        // JSON API
        .route(
            "/api/moods",
            get(handlers::moods::list_moods)
                .merge(post(handlers::moods::create_mood).layer(submit_limit)),
        )
        .route("/api/moods/today", get(handlers::moods::today))
        .route(
            "/api/dashboard/refresh",
            post(handlers::dashboard::refresh),
        )
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
