//! # intake: payload ingestion for HTTP services
//!
//! `intake` takes untrusted request payloads and turns them into either stored files or typed
//! values, reporting every rejection as a value the caller can map onto an HTTP status.
//!
//! ## Overview
//!
//! Two ingestion paths sit at the core of the crate, both in [`ingest`]:
//!
//! - **Uploads**: multipart bodies are walked part by part. Each file part is classified by
//!   sniffing its first bytes (the client-declared content type is ignored), checked against an
//!   allow-list, and streamed to disk under its own name or a fresh random one. Size limits are
//!   enforced while copying. Files written during a call that then fails are removed again.
//! - **JSON**: bodies are read under a byte limit and decoded into a caller-supplied type.
//!   Unknown keys, trailing values, empty bodies and type mismatches are rejected with distinct
//!   error kinds.
//!
//! Policy is passed per call ([`ingest::UploadSpec`], [`ingest::JsonIngestSpec`]), so one process
//! can apply different rules to different endpoints.
//!
//! Around that core are a few small collaborators: the [`response`] envelope codec,
//! [`download::download_file`] for attachment downloads, [`remote::push_json`] for posting JSON
//! to other services, [`slug::slugify`] and [`random::random_string`].
//!
//! ## Service
//!
//! The binary wires these into an [Axum](https://github.com/tokio-rs/axum) router (see [`api`]).
//! Configuration comes from YAML plus `INTAKE_`-prefixed environment variables ([`config`]);
//! logging is `tracing` with an env filter ([`telemetry`]).
//!
//! ```no_run
//! use intake::{Application, Config};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let app = Application::new(Config::default()).await?;
//! app.serve(async { let _ = tokio::signal::ctrl_c().await; }).await
//! # }
//! ```

pub mod api;
pub mod config;
pub mod download;
pub mod errors;
pub mod ingest;
pub mod random;
pub mod remote;
pub mod response;
pub mod slug;
pub mod telemetry;
#[cfg(test)]
mod test_utils;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info, warn};

pub use config::Config;

use crate::api::handlers::{downloads, echo, health, uploads};

/// Shared state handed to every handler.
#[derive(Clone, Debug)]
pub struct AppState {
    pub config: Config,
}

/// Assemble the HTTP router.
///
/// Upload routes have axum's default body limit disabled: the upload writer enforces
/// `uploads.max_upload_size` per file while streaming.
pub fn build_router(state: AppState) -> Router {
    let upload_routes = Router::new()
        .route("/uploads", post(uploads::upload_files))
        .route("/uploads/single", post(uploads::upload_one_file))
        .layer(DefaultBodyLimit::disable());

    let api_routes = Router::new()
        .merge(upload_routes)
        .route("/echo", post(echo::echo))
        .route("/downloads/{file}", get(downloads::download));

    Router::new()
        .nest("/api/v1", api_routes)
        .route("/healthz", get(health::healthz))
        .with_state(state)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// The configured service, ready to serve.
///
/// 1. **Create**: [`Application::new`] checks the configured directories and builds the router
/// 2. **Serve**: [`Application::serve`] binds to the configured address and handles requests
///    until the shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting intake with configuration: {:#?}", config);

        // Upload dirs are created on demand; a missing download dir only means every download 404s
        match tokio::fs::metadata(&config.downloads.dir).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => warn!("Download path {} is not a directory", config.downloads.dir.display()),
            Err(e) => warn!("Download directory {} is unavailable: {}", config.downloads.dir.display(), e),
        }

        let router = build_router(AppState { config: config.clone() });

        Ok(Self { router, config })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "intake listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Server stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_config;

    #[tokio::test]
    async fn test_serve_until_shutdown() {
        let tmp = tempfile::tempdir().unwrap();
        let mut config = test_config(tmp.path());
        config.port = 0;

        let app = Application::new(config).await.unwrap();
        app.serve(async {}).await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_route_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let server = Application::new(test_config(tmp.path())).await.unwrap().into_test_server();

        server.get("/api/v1/nothing").await.assert_status_not_found();
    }
}
