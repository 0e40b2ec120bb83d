//! Academia Backend - Server entry point
//!
//! Usage:
//!     academia-server [--host 0.0.0.0] [--port 8080] [--production] [--reset]

use std::time::Duration;

use academia_backend::{create_app, db, services::AuthService, AppState, Config};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Interval between sweeps of expired sessions
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

#[derive(Parser, Debug)]
#[command(name = "academia-server", about = "Backend of the Academia service.")]
struct Args {
    /// IP address for listening
    #[arg(short = 'H', long)]
    host: Option<String>,

    /// Port for listening
    #[arg(short, long)]
    port: Option<u16>,

    /// Production mode
    #[arg(short = 'P', long)]
    production: bool,

    /// Drop all tables and rebuild the schema before serving
    #[arg(short, long)]
    reset: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    dotenvy::dotenv().ok();
    let mut config = if args.production {
        Config::load_for("production")?
    } else {
        Config::load()?
    };
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    init_tracing(config.is_production());

    tracing::info!("Starting Academia Server");
    tracing::info!("Environment: {}", config.environment);

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = db::connect(&config).await?;
    tracing::info!("Database connection established");

    if args.reset {
        db::reset(&db_pool).await?;
        tracing::info!("Database reset completed");
    } else {
        // Already-applied migrations are skipped
        tracing::info!("Running database migrations...");
        db::migrate(&db_pool).await?;
        tracing::info!("Migrations completed");
    }

    let listener =
        tokio::net::TcpListener::bind((config.server.host.as_str(), config.server.port)).await?;

    // Create application state
    let state = AppState::new(db_pool, config);
    state.store.init().await?;
    tracing::info!("Paper storage at {}", state.store.root().display());

    spawn_session_sweeper(AuthService::new(state.db.clone(), &state.config));

    // Build application
    let app = create_app(state);

    // Start server
    tracing::info!("Listening on {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Initialize tracing: human-readable in development, JSON in production
fn init_tracing(production: bool) {
    let default_filter = if production {
        "academia_server=info,academia_backend=info,tower_http=info,sqlx=warn"
    } else {
        "academia_server=debug,academia_backend=debug,tower_http=debug,sqlx=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    let registry = tracing_subscriber::registry().with(filter);
    if production {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Periodically delete expired sessions
fn spawn_session_sweeper(auth_service: AuthService) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            match auth_service.purge_expired_sessions().await {
                Ok(0) => {}
                Ok(removed) => tracing::info!(removed, "Purged expired sessions"),
                Err(e) => tracing::warn!("Session sweep failed: {}", e),
            }
        }
    });
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

    tracing::info!("Shutdown signal received");
}
