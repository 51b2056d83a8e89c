//! Mindful server entry point.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::get,
};
use mindful_api::{
    auth::TokenVerifier,
    endpoints::health,
    middleware::{AppState, auth_middleware},
    router as api_router,
};
use mindful_common::Config;
use mindful_core::{AnalyticsService, MoodService, SupportGroupService};
use mindful_db::repositories::{MoodEntryRepository, SupportGroupRepository};
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer, limit::RequestBodyLimitLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Request bodies are small JSON documents.
const MAX_BODY_BYTES: usize = 64 * 1024;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

fn cors_layer(origin: &str) -> anyhow::Result<CorsLayer> {
    let origin: HeaderValue = origin
        .parse()
        .with_context(|| format!("invalid CORS origin: {origin}"))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mindful=debug,tower_http=debug".into()),
        )
        .init();

    info!("Starting mindful server...");

    let config = Config::load().context("failed to load configuration")?;

    let db = Arc::new(mindful_db::init(&config).await?);
    info!("Connected to database");

    info!("Running database migrations...");
    mindful_db::migrate(&db).await?;
    info!("Migrations completed");

    // Initialize repositories
    let entry_repo = MoodEntryRepository::new(Arc::clone(&db));
    let group_repo = SupportGroupRepository::new(Arc::clone(&db));

    // Initialize services
    let mood_service = MoodService::new(entry_repo.clone(), &config.journal);
    let analytics_service =
        AnalyticsService::new(entry_repo.clone(), config.journal.default_timezone.clone());
    let support_group_service = SupportGroupService::new(group_repo, entry_repo);

    if config.groups.seed_on_start {
        support_group_service.seed_defaults().await?;
    }

    let state = AppState {
        mood_service,
        analytics_service,
        support_group_service,
        tokens: TokenVerifier::new(&config.auth.jwt_secret),
    };

    let app = Router::new()
        .route("/health", get(health))
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
                .layer(tower_http::map_response_body::MapResponseBodyLayer::new(
                    axum::body::Body::new,
                ))
                .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
                .layer(cors_layer(&config.server.cors_origin)?),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
