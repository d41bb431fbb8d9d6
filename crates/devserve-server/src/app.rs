//! Router construction.

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use tower_http::trace::TraceLayer;

use crate::inject::RELOAD_PATH;
use crate::live_reload;
use crate::state::AppState;
use crate::static_files;

/// Create the application router.
///
/// The reload endpoint is a static route, so it wins over the catch-all
/// file route even if the root contains a `__ws` entry.
pub(crate) fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(RELOAD_PATH, get(live_reload::ws_handler))
        .route("/", get(static_files::serve_file))
        .route("/{*path}", get(static_files::serve_file))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
