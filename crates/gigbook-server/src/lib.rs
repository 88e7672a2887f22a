use axum::{
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use gigbook_db::AppState;
use std::sync::Arc;
use tower_http::{catch_panic::CatchPanicLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};

pub mod api;
pub mod config;
pub mod error;
pub mod flash;
pub mod forms;

/// Build the full application router over `state`.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(api::pages::home))
        .route("/healthz", get(api::pages::healthz))
        // Venues
        .route("/venues", get(api::venues::list_venues))
        .route("/venues/search", post(api::venues::search_venues))
        .route(
            "/venues/create",
            get(api::venues::create_venue_form).post(api::venues::create_venue),
        )
        .route(
            "/venues/{id}",
            get(api::venues::get_venue).delete(api::venues::delete_venue),
        )
        .route(
            "/venues/{id}/edit",
            get(api::venues::edit_venue_form).post(api::venues::edit_venue),
        )
        // Artists
        .route("/artists", get(api::artists::list_artists))
        .route("/artists/search", post(api::artists::search_artists))
        .route(
            "/artists/create",
            get(api::artists::create_artist_form).post(api::artists::create_artist),
        )
        .route("/artists/{id}", get(api::artists::get_artist))
        .route(
            "/artists/{id}/edit",
            get(api::artists::edit_artist_form).post(api::artists::edit_artist),
        )
        // Shows
        .route("/shows", get(api::shows::list_shows))
        .route(
            "/shows/create",
            get(api::shows::create_show_form).post(api::shows::create_show),
        )
        .fallback(error::not_found)
        .layer(CatchPanicLayer::custom(error::handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .with_state(state)
}
