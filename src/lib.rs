pub mod api;
pub mod auth;
pub mod calendar;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;

pub const STATIC_HASH: &str = env!("STATIC_HASH");

use axum::http::{HeaderValue, header};
use axum::{Router, routing::get};
use time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
    trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer, cookie::SameSite};
use tracing::Level;

use crate::api::ApiClient;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub api: ApiClient,
}

async fn health() -> &'static str {
    "ok"
}

/// Build the full Axum application router.
///
/// Sessions are held in memory: the remote blog API owns every piece of
/// durable state, so there is nothing to persist locally between runs.
pub fn build_app(config: &Config) -> Router {
    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_expiry(Expiry::OnInactivity(Duration::days(30)))
        .with_secure(config.secure_cookies)
        .with_http_only(true)
        .with_same_site(SameSite::Lax);

    let state = AppState {
        api: ApiClient::new(config),
    };

    Router::new()
        .route("/health", get(health))
        .merge(routes::auth::router())
        .merge(routes::home::router())
        .merge(routes::calendar::router())
        .merge(routes::posts::router())
        .merge(routes::search::router())
        .merge(routes::tags::router())
        .merge(routes::export::router())
        .nest_service(
            "/static",
            ServiceBuilder::new()
                .layer(SetResponseHeaderLayer::overriding(
                    header::CACHE_CONTROL,
                    HeaderValue::from_static("public, max-age=86400"),
                ))
                .service(ServeDir::new("static")),
        )
        .layer(session_layer)
        .layer(
            TraceLayer::new_for_http()
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
