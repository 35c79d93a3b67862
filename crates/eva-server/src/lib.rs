//! eva-server
//!
//! HTTP surface for balance management and media generation.

pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;

use axum::Router;
use axum::middleware as axum_mw;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use state::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let protected = Router::new()
        .route("/chat/generate-image", post(routes::generate::generate_image))
        .route("/chat/generate-video", post(routes::generate::generate_video))
        .route(
            "/chat/generate-video-from-image",
            post(routes::generate::generate_video_from_image),
        )
        .route("/chat/create-girl", post(routes::companion::create_girl))
        .route("/users/balance", get(routes::balance::get_balance))
        .route_layer(axum_mw::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    let mut app = Router::new()
        // Health (no auth)
        .route("/health", get(routes::health::health_check))
        .merge(protected);

    // Locally stored artifacts (no auth, URLs are unguessable)
    if state.config.media.s3_bucket.is_none() {
        let prefix = state.config.media.url_prefix.trim_end_matches('/');
        if !prefix.is_empty() {
            app = app.nest_service(prefix, ServeDir::new(&state.config.media.root));
        }
    }

    app.layer(axum_mw::from_fn(middleware::audit::audit_log))
        .layer(cors)
        .with_state(state)
}
