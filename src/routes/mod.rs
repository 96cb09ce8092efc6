pub mod api;
pub mod media_stream;
pub mod voice;

use axum::{Router, middleware};
use std::sync::Arc;

use crate::middleware::connection_limit_middleware;
use crate::state::AppState;

/// Assemble every route of the gateway around `state`.
///
/// Rate limiting and response headers are added by the binary on top.
pub fn create_router(state: Arc<AppState>) -> Router {
    let media_stream_routes = media_stream::create_media_stream_router().layer(
        middleware::from_fn_with_state(state.clone(), connection_limit_middleware),
    );

    api::create_api_router()
        .merge(voice::create_voice_router())
        .merge(media_stream_routes)
        .with_state(state)
}
