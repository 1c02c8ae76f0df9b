//! Users service entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use users_api::api::{create_router, AppState};
use users_api::config::Config;
use users_api::error::ServiceError;
use users_api::metrics;
use users_api::store::{PgUserStore, UserStore};
use users_api::utils::shutdown_signal;

/// JSON HTTP service over a PostgreSQL users table.
#[derive(Parser, Debug)]
#[command(name = "users-api")]
#[command(about = "Create and read users over HTTP, backed by PostgreSQL")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP listen port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the HTTP API (default).
    Serve {
        /// HTTP listen port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Check that the database is reachable.
    CheckDb,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Configuration decides log format, so load it before the subscriber
    let config = Config::load();
    init_logging(args.verbose, config.as_ref().ok());

    let config = config.map_err(|e| {
        error!("Failed to load configuration: {}", e);
        ServiceError::from(e)
    })?;

    // Handle subcommands
    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(&config),
        Some(Command::CheckDb) => cmd_check_db(&config).await,
        Some(Command::Serve { port }) => cmd_serve(config, port).await,
        None => cmd_serve(config, args.port).await,
    }
}

fn init_logging(verbose: bool, config: Option<&Config>) {
    let filter = if verbose {
        EnvFilter::new("users_api=debug,tower_http=debug,info")
    } else {
        let fallback = config.map(|c| c.rust_log.as_str()).unwrap_or("info");
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if config.map(|c| c.log_json).unwrap_or(false) {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

fn validate(config: &Config) -> Result<(), ServiceError> {
    config.validate().map_err(|e| {
        error!("Invalid configuration: {}", e);
        ServiceError::InvalidConfig(e)
    })
}

fn log_database_config(config: &Config) {
    info!("=== Database configuration ===");
    info!("DB_HOST: {}", config.db_host);
    info!("DB_PORT: {}", config.db_port);
    info!("DB_NAME: {}", config.db_name);
    info!("DB_USER: {}", config.db_user);
    info!("DB_PASSWORD: {}", config.password_status());
    info!("==============================");
}

/// Check configuration validity.
fn cmd_check_config(config: &Config) -> anyhow::Result<()> {
    println!("======================================================================");
    println!("USERS API - CONFIGURATION CHECK");
    println!("======================================================================");

    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!(
        "  Database: {}@{}:{}/{}",
        config.db_user, config.db_host, config.db_port, config.db_name
    );
    println!("  Password: {}", config.password_status());
    println!("  Max Connections: {}", config.db_max_connections);
    println!("  Acquire Timeout: {}s", config.db_acquire_timeout_secs);
    println!("  Listen Port: {}", config.port);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Check that the database answers a trivial query.
async fn cmd_check_db(config: &Config) -> anyhow::Result<()> {
    validate(config)?;
    log_database_config(config);

    let store = PgUserStore::connect_lazy(config);

    print!("Pinging database... ");
    match store.ping().await {
        Ok(()) => {
            println!("OK");
            Ok(())
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            Err(ServiceError::from(e).into())
        }
    }
}

/// Run the HTTP server.
async fn cmd_serve(mut config: Config, port_override: Option<u16>) -> anyhow::Result<()> {
    // Override with CLI args if provided
    if let Some(port) = port_override {
        config.port = port;
    }

    validate(&config)?;
    log_database_config(&config);

    let metrics_handle = metrics::init_metrics().map_err(ServiceError::from)?;

    // The pool lives for the whole process and is shared through state
    let store = PgUserStore::connect_lazy(&config);
    let state = AppState::new(Arc::new(store)).with_metrics(metrics_handle);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr).await.map_err(ServiceError::from)?;
    info!("Server listening on port {}", config.port);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(ServiceError::from)?;

    info!("Server stopped");
    Ok(())
}
