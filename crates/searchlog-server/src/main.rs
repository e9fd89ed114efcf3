//! SearchLog server
//!
//! Records how often each query text is searched, counting only the query a
//! client settles on rather than every keystroke on the way there.
//!
//! Usage:
//! ```bash
//! # Defaults: in-memory cache, SQLite store at ./data/searchlog.db
//! searchlog-server
//!
//! # With config file (env vars override it)
//! SEARCHLOG_CACHE_BACKEND=redis REDIS_URL=redis://cache:6379 \
//!   searchlog-server --config searchlog.yaml
//!
//! # Print the stored count for a query and exit
//! searchlog-server count "rust async"
//! ```
//!
//! Test with:
//! ```bash
//! curl -i http://localhost:8080/search-logs \
//!   -H "Content-Type: application/json" \
//!   -H "x-client-id: device-42" \
//!   -d '{"query_text": "Rust async"}'
//!
//! curl "http://localhost:8080/search-logs/count?query_text=rust%20async"
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use searchlog_core::{DebounceCoordinator, normalize_query};
use searchlog_observability::{BackendReadiness, HealthState, Metrics, health_router};
use searchlog_server::config::{LoggingConfig, ServerConfig};
use searchlog_server::{AppState, backends, router};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Extra time allowed for pending decisions beyond the debounce delay
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// SearchLog Server - debounced search query counting
#[derive(Parser)]
#[command(name = "searchlog-server", version)]
#[command(about = "Debounced search query logging service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to configuration file (YAML or TOML)
    #[arg(
        short,
        long,
        value_name = "FILE",
        env = "SEARCHLOG_CONFIG",
        global = true
    )]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default if no command specified)
    Serve,
    /// Print the stored count for a query text
    Count {
        /// Query text (normalized before lookup)
        text: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => ServerConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path))?,
        None => ServerConfig::default(),
    };

    // Environment overrides the file
    config.merge_env()?;
    config.validate()?;

    init_tracing(&config.logging)?;

    if let Some(path) = &cli.config {
        info!(path = %path, "Loaded configuration file");
    }

    match cli.command {
        Some(Commands::Count { text }) => count(&config, &text).await,
        Some(Commands::Serve) | None => serve(config).await,
    }
}

fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let mut filter = EnvFilter::try_new(&logging.level)
        .with_context(|| format!("Invalid log level '{}'", logging.level))?;

    // sqlx logs every statement at INFO
    if !logging.log_sql_queries {
        filter = filter.add_directive("sqlx=warn".parse()?);
    }

    if logging.json {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .json()
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(())
}

async fn count(config: &ServerConfig, text: &str) -> anyhow::Result<()> {
    let query_text = normalize_query(text);
    anyhow::ensure!(!query_text.is_empty(), "query text cannot be empty");

    let store = backends::create_store(&config.store).await?;
    let count = store
        .get_by_text(&query_text)
        .await?
        .map_or(0, |record| record.count);

    println!("{}\t{}", query_text, count);
    Ok(())
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    let debounce = config.debounce_config()?;
    if !debounce.ttl_covers_delay() {
        warn!(
            delay_seconds = config.debounce.delay_seconds,
            cache_ttl_seconds = config.debounce.cache_ttl_seconds,
            "Cache TTL does not exceed the debounce delay; every submission will be counted"
        );
    }

    info!("Initializing SearchLog server");

    let cache = backends::create_cache(&config.cache).await?;
    let store = backends::create_store(&config.store).await?;

    let metrics = Arc::new(Metrics::new()?);
    let coordinator = DebounceCoordinator::new(cache.clone(), store.clone(), debounce)
        .with_observer(metrics.clone());

    let health_state = HealthState::new(metrics.clone())
        .with_readiness_checker(Arc::new(BackendReadiness::new(cache, store)))
        .with_coordinator(coordinator.clone());

    let state = AppState::new(coordinator.clone(), metrics);
    let app = router(state).merge(health_router(health_state));

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;
    let listener = TcpListener::bind(addr).await?;

    info!(
        %addr,
        delay_seconds = config.debounce.delay_seconds,
        cache_ttl_seconds = config.debounce.cache_ttl_seconds,
        "SearchLog server listening"
    );
    info!("   Submit:             POST http://{}/search-logs", addr);
    info!("   Count:              GET  http://{}/search-logs/count", addr);
    info!("   Health check:       http://{}/healthz", addr);
    info!("   Readiness check:    http://{}/readyz", addr);
    info!("   Prometheus metrics: http://{}/metrics", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    let pending = coordinator.in_flight();
    if pending > 0 {
        info!(pending, "Waiting for pending decisions");
        if !coordinator
            .wait_idle(debounce.debounce_delay() + DRAIN_GRACE)
            .await
        {
            warn!(
                pending = coordinator.in_flight(),
                "Shutting down with decisions still pending"
            );
        }
    }

    info!("Server stopped");
    Ok(())
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal() {
    use tokio::signal;

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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
