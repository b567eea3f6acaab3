//! ScholarCheck API Gateway
//!
//! The main entry point for all external API requests.
//! Handles:
//! - Student registration and login
//! - Assignment uploads and background dispatch to the analysis workflow
//! - Analysis status reads
//! - Internal result ingestion and reference source retrieval
//! - Observability (logging, metrics, tracing)

mod dispatch;
mod extract;
mod handlers;
mod middleware;

use axum::{
    extract::{DefaultBodyLimit, Request},
    middleware::Next,
    routing::{get, post},
    Router,
};
use scholarcheck_common::{
    auth::TokenManager,
    config::AppConfig,
    db::{DbPool, Repository},
    embeddings::create_embedder,
    metrics,
    retrieval::SourceRetriever,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use tracing::{info, Level};

use crate::dispatch::Dispatcher;
use crate::handlers::uploads::MAX_FILE_SIZE_BYTES;

/// Headroom on top of the upload ceiling for multipart framing
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub repo: Repository,
    pub tokens: Arc<TokenManager>,
    pub retriever: Arc<SourceRetriever>,
    pub dispatcher: Dispatcher,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(true)
        .json()
        .init();

    info!("Starting ScholarCheck API Gateway v{}", scholarcheck_common::VERSION);

    // Load configuration
    let config = AppConfig::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        e
    })?;

    let config = Arc::new(config);

    // Initialize metrics
    metrics::register_metrics();

    if config.observability.metrics_port > 0 {
        let metrics_addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(metrics_addr)
            .install()?;
        info!("Metrics exporter listening on {}", metrics_addr);
    }

    // Initialize database connection
    let db = DbPool::new(&config.database).await?;
    let repo = Repository::new(db);

    // Initialize auth
    let tokens = Arc::new(TokenManager::new(
        &config.auth.jwt_secret,
        config.token_ttl(),
    ));

    // Initialize the retrieval engine
    let embedder = create_embedder(&config.embedding)?;
    info!(
        model = %embedder.model_name(),
        dimension = embedder.dimension(),
        "Embedder initialized"
    );
    let retriever = Arc::new(SourceRetriever::new(embedder, Arc::new(repo.clone())));

    // Start the dispatch worker
    let (dispatcher, worker) = dispatch::channel(&config)?;
    let worker_handle = tokio::spawn(worker.run());

    // Create app state
    let state = AppState {
        config: config.clone(),
        repo,
        tokens,
        retriever,
        dispatcher,
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Dropping the router closed the dispatch channel; let the worker drain.
    worker_handle.await.ok();

    info!("Server shutdown complete");
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    // Public routes, rate limited
    let mut public_routes = Router::new()
        .route("/auth/register", post(handlers::auth::register))
        .route("/auth/login", post(handlers::auth::login))
        .route(
            "/upload",
            post(handlers::uploads::upload_assignment).layer(DefaultBodyLimit::max(
                MAX_FILE_SIZE_BYTES + MULTIPART_OVERHEAD_BYTES,
            )),
        )
        .route(
            "/analysis/{assignment_id}",
            get(handlers::analysis::get_analysis_results),
        );

    if state.config.rate_limit.enabled {
        let limiter = middleware::rate_limit::create_rate_limiter(
            state.config.rate_limit.requests_per_second,
            state.config.rate_limit.burst,
        );
        public_routes = public_routes.layer(axum::middleware::from_fn(
            move |req: Request, next: Next| {
                let limiter = limiter.clone();
                async move {
                    middleware::rate_limit::rate_limit_middleware(req, next, limiter).await
                }
            },
        ));
    }

    // Internal routes, service-key gated in the handlers' extractor
    let internal_routes = Router::new()
        .route(
            "/internal/analysis-results",
            post(handlers::internal::create_analysis_result),
        )
        .route("/internal/sources", get(handlers::internal::get_sources));

    // Health endpoints (no auth)
    let health_routes = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready));

    // Compose the app
    Router::new()
        .merge(public_routes)
        .merge(internal_routes)
        .merge(health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
