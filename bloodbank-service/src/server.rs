//! HTTP server with graceful shutdown

use axum::extract::DefaultBodyLimit;
use axum::response::{IntoResponse, Response};
use axum::Router;
use std::any::Any;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};

use crate::{
    config::{Config, Environment},
    database,
    error::Result,
    handlers::{ApiError, ApiErrorKind, ApiOperation},
    lifecycle::{Lifecycle, Phase},
    middleware::{request_id_layer, request_id_propagation_layer},
    routes,
    state::AppState,
    store::{PgStore, RecordStore},
};

/// Server instance
pub struct Server {
    config: Config,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Connect to PostgreSQL, bind the configured address and serve until
    /// SIGINT or SIGTERM
    pub async fn run(self) -> Result<()> {
        let pool = database::create_pool(&self.config.database).await?;
        if self.config.database.run_migrations {
            database::migrate(&pool).await?;
        } else {
            tracing::info!("Skipping database migrations");
        }
        let store = Arc::new(PgStore::new(pool, self.config.database.admission_limit()));

        let addr = self.config.bind_address();
        tracing::info!("Starting {} on {}", self.config.service.name, addr);
        let listener = TcpListener::bind(&addr).await?;

        let lifecycle = Lifecycle::new();
        tokio::spawn(drain_on_signal(lifecycle.clone()));

        self.serve_with(listener, store, lifecycle).await
    }

    /// Serve on an already bound listener until `lifecycle` reaches Draining
    ///
    /// In-flight requests finish before the store is closed and the
    /// lifecycle moves to Stopped.
    pub async fn serve_with(
        self,
        listener: TcpListener,
        store: Arc<dyn RecordStore>,
        lifecycle: Lifecycle,
    ) -> Result<()> {
        self.log_middleware_config();

        let state = AppState::new(self.config.clone(), store.clone(), lifecycle.clone());
        let app = self.apply_middleware(routes::router(state));

        let served = serve_until_drained(listener, app, &lifecycle).await;

        store.close().await;
        lifecycle.advance(Phase::Stopped)?;
        served?;

        tracing::info!("Server shutdown complete");
        Ok(())
    }

    /// Wrap the router in the middleware stack
    ///
    /// Layers added later run first.
    fn apply_middleware(&self, app: Router) -> Router {
        let middleware = &self.config.middleware;
        let body_limit = middleware.body_limit_mb * 1024 * 1024;
        let environment = self.config.service.environment;

        let mut app = app
            .layer(DefaultBodyLimit::max(body_limit))
            .layer(self.build_cors_layer());

        if middleware.compression {
            app = app.layer(CompressionLayer::new());
        }

        // ServiceBuilder runs top to bottom: the panic catcher sees everything
        app.layer(
            ServiceBuilder::new()
                .layer(CatchPanicLayer::custom(move |panic: Box<dyn Any + Send>| {
                    panic_response(environment, panic)
                }))
                .layer(request_id_layer())
                .layer(request_id_propagation_layer())
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(DefaultMakeSpan::new().include_headers(true))
                        .on_response(DefaultOnResponse::new().include_headers(true)),
                ),
        )
    }

    /// Log middleware configuration for debugging
    fn log_middleware_config(&self) {
        let middleware = &self.config.middleware;
        tracing::info!("Middleware configuration:");
        tracing::info!("  - Panic recovery: enabled");
        tracing::info!("  - Request ID tracking: enabled");
        tracing::info!("  - Request body limit: {} MB", middleware.body_limit_mb);
        tracing::info!(
            "  - Compression: {}",
            if middleware.compression { "enabled" } else { "disabled" }
        );
        tracing::info!("  - CORS mode: {}", middleware.cors_mode);
        match self.config.database.admission_limit() {
            Some(limit) => tracing::info!("  - Database admission limit: {}", limit),
            None => tracing::info!("  - Database admission limit: unbounded"),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build CORS layer based on configuration
    fn build_cors_layer(&self) -> CorsLayer {
        match self.config.middleware.cors_mode.as_str() {
            "permissive" => {
                tracing::debug!("Enabling permissive CORS");
                CorsLayer::permissive()
            }
            "restrictive" | "disabled" => {
                tracing::debug!("Enabling restrictive CORS (default deny)");
                CorsLayer::new()
            }
            _ => {
                tracing::warn!(
                    "Unknown CORS mode: {}, defaulting to permissive",
                    self.config.middleware.cors_mode
                );
                CorsLayer::permissive()
            }
        }
    }
}

/// Serve until `lifecycle` reaches Draining; returns at once if it already has
async fn serve_until_drained(
    listener: TcpListener,
    app: Router,
    lifecycle: &Lifecycle,
) -> Result<()> {
    if lifecycle.advance(Phase::Ready).is_err() {
        tracing::info!(phase = %lifecycle.phase(), "Shutdown requested before serving");
        return Ok(());
    }
    tracing::info!("Server listening on {}", listener.local_addr()?);

    let drained = {
        let lifecycle = lifecycle.clone();
        async move {
            lifecycle.reached(Phase::Draining).await;
            tracing::info!("Draining in-flight requests");
        }
    };
    axum::serve(listener, app)
        .with_graceful_shutdown(drained)
        .await?;
    Ok(())
}

fn panic_response(environment: Environment, panic: Box<dyn Any + Send>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .cloned()
        .or_else(|| panic.downcast_ref::<&str>().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown panic payload".to_string());

    ApiError::new(
        ApiOperation::Route,
        ApiErrorKind::InternalError,
        "An unexpected server error occurred.",
    )
    .with_detail(detail)
    .with_environment(environment)
    .into_response()
}

async fn drain_on_signal(lifecycle: Lifecycle) {
    shutdown_signal().await;
    if lifecycle.begin_draining() {
        tracing::info!("Shutdown signal received, draining requests...");
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl+C), starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
