use axum::extract::DefaultBodyLimit;
use axum::routing::get;
use axum::Router;
use blobfs_protocol::endpoints;
use tower_http::trace::TraceLayer;

use crate::handler::{self, AppState};

/// Build the axum router with all blobfs endpoints.
///
/// Blob and bucket routes capture the rest of the URL path, so the storage
/// layer sees it unmodified and reports malformed shapes itself.
pub fn build_router(state: AppState, max_body_size: usize) -> Router {
    Router::new()
        .route(endpoints::HEALTH, get(handler::health_handler))
        .route(
            &format!("{}/*path", endpoints::BLOB),
            get(handler::get_blob)
                .post(handler::add_blob)
                .put(handler::set_blob)
                .delete(handler::del_blob),
        )
        .route(
            &format!("{}/*path", endpoints::BUCKET),
            get(handler::list_bucket)
                .post(handler::make_bucket)
                .delete(handler::remove_bucket),
        )
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
