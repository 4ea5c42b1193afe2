use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use dotenv::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use triguard_api::{create_app, AppState, TrustedProxies};
use triguard_data::database::{create_pool, DatabaseConfig};
use triguard_data::repository::SqliteAccountMapper;
use triguard_domain::auth::{JwtConfig, TokenManager};
use triguard_domain::config::VerificationConfig;
use triguard_domain::health::HealthService;
use triguard_domain::messaging::LoggingCodeSender;
use triguard_domain::services::{create_default_blood_pressure_service, AccountService};

/// Entry point of the TriGuard API server
///
/// Loads `.env`, sets up logging, opens the SQLite pool, wires the
/// services into the router and serves until Ctrl+C or SIGTERM.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if dotenv().is_err() {
        eprintln!("Warning: .env file not found or couldn't be read. Using environment variables.");
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stdout),
        )
        .with(env_filter)
        .init();

    info!("Starting TriGuard API server");

    let mut db_config = DatabaseConfig::from_env();
    if std::env::var("DB_SQLITE_PATH").is_err() {
        let data_dir = std::env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string());
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {}", data_dir))?;
        db_config.sqlite_path = PathBuf::from(&data_dir)
            .join("triguard.db")
            .to_string_lossy()
            .to_string();
    }

    let pool = create_pool(&db_config).context("Failed to initialize the database pool")?;
    info!("Using SQLite database at {}", db_config.sqlite_path);

    let jwt_config = JwtConfig::from_env().context("Invalid JWT configuration")?;
    let token_manager = Arc::new(TokenManager::new(jwt_config));
    token_manager.start_cleanup_task(Duration::from_secs(3600));

    let account_service = AccountService::new(
        Arc::new(SqliteAccountMapper::new(pool.clone())),
        Arc::new(LoggingCodeSender),
        VerificationConfig::from_env(),
    );
    account_service.start_cleanup_task(Duration::from_secs(300));

    let state = AppState {
        account_service: Arc::new(account_service),
        blood_pressure_service: Arc::new(create_default_blood_pressure_service(pool.clone())),
        health_service: Arc::new(HealthService::new(pool)),
        token_manager,
        trusted_proxies: TrustedProxies::from_env(),
    };

    let app = create_app(state);

    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()
        .context("PORT must be a number")?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    info!("Listening on {}", addr);

    // Peer addresses feed the client IP used by the verification code limiter
    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Wait for Ctrl+C or, on Unix, SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
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

    info!("Shutting down server...");
}
