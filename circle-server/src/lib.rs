//! Backend of a small social network: accounts, friendships, posts with likes, comments and
//! shares, and a daily posting allowance that grows with the number of friends.

use std::future::Future;
use std::net::TcpListener;
use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use axum::{Extension, Router};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod graph;
pub mod media;
pub mod posts;
pub mod state;
pub mod store;

pub use config::Config;
pub use state::State;

use media::UPLOADS_ROUTE;

// room for the multipart framing and the text fields next to a maximum size file
const BODY_LIMIT_SLACK: usize = 1024 * 1024;

pub fn app(state: State) -> Router {
    let config = state.config.clone();
    let api = Router::new()
        .route("/register", post(api::register))
        .route("/login", post(api::login))
        .route("/posts", get(api::list_posts).post(api::create_post))
        .route("/posts/:id/like", post(api::toggle_like))
        .route("/posts/:id/comment", post(api::add_comment))
        .route("/posts/:id/share", post(api::share_post))
        .route("/friends", get(api::friends))
        .route("/friends/add", post(api::add_friend))
        .route("/user/info", get(api::user_info));

    Router::new()
        .nest("/api", api)
        .nest_service(UPLOADS_ROUTE, ServeDir::new(&config.uploads_dir))
        .fallback_service(ServeDir::new(&config.public_dir))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes + BODY_LIMIT_SLACK))
        .layer(cors(&config))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(state))
}

fn cors(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| {
            origin
                .parse()
                .map_err(|_| warn!("Ignoring invalid CORS origin {origin}"))
                .ok()
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(60 * 60))
}

/// Serves the app on an already bound listener until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    state: State,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    info!("Server running on {}", listener.local_addr()?);
    axum::Server::from_tcp(listener)?
        .serve(app(state).into_make_service())
        .with_graceful_shutdown(shutdown)
        .await?;
    Ok(())
}
