//! The HTTP binding layer: axum `Router`, `/api` prefix, CORS,
//! `RouteErrorResponse` — without the static-file fallback and HATEOAS
//! envelope a browsable GTFS resource tree needs but this request surface
//! doesn't.

pub use common::{RouteErrorResponse, RouteResult};

use std::sync::Arc;

use axum::extract::FromRef;
use axum::Router;
use database::{DirectionCache, ProgramRepository, TaskStore};
use routing::RoutingProvider;
use scheduling::DefaultTimings;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;

pub mod common;
pub mod config;
mod routes;

/// Everything a request handler needs, cloned (cheaply — every field is a
/// pool handle or an `Arc`) into each request's extractor state.
#[derive(Clone, FromRef)]
pub struct WebState {
    pub tasks: TaskStore,
    pub directions: DirectionCache,
    pub provider: Arc<dyn RoutingProvider>,
    pub programs: ProgramRepository,
    pub defaults: DefaultTimings,
}

/// CORS policy: `localhost:3000`/`127.0.0.1:3000`, with credentials and
/// every method/header. `Any` can't be combined with credentials (tower-http
/// panics on the preflight), so methods/headers mirror the request instead,
/// the same effect the original `CORSMiddleware` gets by reflecting them.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin([
            "http://localhost:3000".parse().unwrap(),
            "http://127.0.0.1:3000".parse().unwrap(),
        ])
        .allow_credentials(true)
        .allow_methods(tower_http::cors::AllowMethods::mirror_request())
        .allow_headers(tower_http::cors::AllowHeaders::mirror_request())
}

pub async fn start_web_server(state: WebState, port: u16) -> std::io::Result<()> {
    let app = Router::new()
        .nest_service("/api", routes::routes(state))
        .layer(cors_layer());

    let listener = TcpListener::bind(("0.0.0.0", port)).await?;
    log::info!("listening on 0.0.0.0:{port}");
    axum::serve(listener, app.into_make_service()).await
}
