//! Tracksheet API server binary.

use std::sync::Arc;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use tracksheet_api::config::ApiConfig;
use tracksheet_core::store::DynStore;
use tracksheet_core::store::in_memory::InMemoryStore;
use tracksheet_core::store::postgres::PgStore;

/// CLI arguments. Anything not given falls back to the environment.
#[derive(Parser, Debug)]
#[command(name = "tracksheet_api_server", about = "Tracksheet API server")]
struct Args {
    /// Address to listen on.
    #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1:3100")]
    bind_addr: String,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/tracksheet"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, env = "DB_MAX_CONNECTIONS", default_value_t = 5)]
    max_connections: u32,

    /// Seconds to wait for a pooled connection before reporting the store unavailable.
    #[arg(long, env = "DB_ACQUIRE_TIMEOUT_SECS", default_value_t = 30)]
    acquire_timeout_secs: u64,

    /// Keep everything in process memory instead of PostgreSQL. Data is lost on exit.
    #[arg(long, default_value_t = false)]
    in_memory: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(
                    "info,tracksheet_api=debug,tracksheet_core=debug",
                )
            }),
        )
        .init();

    let args = Args::parse();

    let mut config = ApiConfig::from_env();
    config.bind_addr = args.bind_addr;
    config.database_url = args.database_url;

    let store: DynStore = if args.in_memory {
        warn!("using in-memory store; data will not survive a restart");
        Arc::new(InMemoryStore::new())
    } else {
        info!(
            max_connections = args.max_connections,
            acquire_timeout_secs = args.acquire_timeout_secs,
            "configuring connection pool"
        );
        let pool = PgPoolOptions::new()
            .max_connections(args.max_connections)
            .acquire_timeout(std::time::Duration::from_secs(args.acquire_timeout_secs))
            .connect(&config.database_url)
            .await?;

        info!("running database migrations");
        tracksheet_api::migrate(&pool).await?;
        Arc::new(PgStore::new(pool))
    };

    for (provider, _) in &config.federation_secrets {
        info!(%provider, "federated sign-in enabled");
    }

    let bind_addr = config.bind_addr.clone();
    let app = tracksheet_api::router(tracksheet_api::AppState::new(store, config));

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(addr = %listener.local_addr()?, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        })
        .await?;

    Ok(())
}
