use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use super::{handlers, library, middleware as mw};
use crate::state::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Everything except the health check sits behind the authenticator
    let protected = Router::new()
        .route("/", get(library::index))
        .route("/files/{name}", get(library::download))
        .route("/config", get(handlers::get_config))
        .route("/metrics", get(handlers::metrics))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            mw::auth_middleware,
        ));

    Router::new()
        .route("/health", get(handlers::health))
        .merge(protected)
        .layer(middleware::from_fn(mw::metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
