use crate::auth::require_admin;
use crate::handlers;
use crate::state::AppState;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post, put};
use axum::Router;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Builds the full HTTP surface under `/api`.
pub fn build_router(state: AppState) -> Router {
    let admin = Router::new()
        .route("/stats", get(handlers::admin_stats))
        .route("/distributeurs", post(handlers::create_distributeur))
        .route(
            "/distributeurs/{id}",
            put(handlers::update_distributeur).delete(handlers::delete_distributeur),
        )
        .route_layer(from_fn_with_state(state.clone(), require_admin));

    let api = Router::new()
        .route("/health", get(handlers::health))
        .route("/distributeurs", get(handlers::list_distributeurs))
        .route(
            "/distributeurs/nearest",
            get(handlers::nearest_distributeurs),
        )
        .route("/distributeurs/{id}", get(handlers::get_distributeur))
        .route("/villes", get(handlers::list_villes))
        .route("/types", get(handlers::list_types))
        .nest("/admin", admin);

    Router::new()
        .nest("/api", api)
        .fallback(handlers::not_found)
        .layer(
            // Span and response events reach the `log` backend through
            // tracing's `log` feature.
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
