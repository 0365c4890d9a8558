//! `recharged`: the Recharge app backend server.
//!
//! Usage:
//!   recharged -c <context-name-or-path> [--listen <addr>]
//!
//! The context name resolves to `/etc/recharge/<name>.toml`.
//! If a path with `/` or `.toml` is given, it's used directly.

mod auth_middleware;
mod bootstrap;
mod config;
mod routes;

use std::sync::Arc;

use clap::Parser;
use recharge_core::Module;
use tracing::info;

use config::ServerConfig;

/// Recharge backend server.
#[derive(Parser, Debug)]
#[command(name = "recharged", about = "Recharge backend server")]
struct Cli {
    /// Context name or path to config file.
    #[arg(short = 'c', long = "config", required = true)]
    config: String,

    /// Listen address.
    #[arg(long = "listen", default_value = "0.0.0.0:8080")]
    listen: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config_path = ServerConfig::resolve_path(&cli.config);
    info!("Loading configuration from {}", config_path.display());
    let server_config = ServerConfig::load(&config_path)?;
    bootstrap::verify_config(&server_config)?;

    let data_dir = std::path::PathBuf::from(&server_config.storage.data_dir);
    std::fs::create_dir_all(&data_dir)?;

    let core_config = recharge_core::ServiceConfig {
        data_dir: Some(data_dir),
        sqlite_path: server_config
            .storage
            .sqlite_path
            .as_ref()
            .map(std::path::PathBuf::from),
        listen: cli.listen.clone(),
    };

    let sql: Arc<dyn recharge_sql::SQLStore> = Arc::new(
        recharge_sql::SqliteStore::open(&core_config.resolve_sqlite_path())
            .map_err(|e| anyhow::anyhow!("failed to open SQL store: {}", e))?,
    );

    let account_module = account::AccountModule::new(
        Arc::clone(&sql),
        server_config.account_config(),
        Arc::new(account::service::LogMailer),
    )?;
    info!("Account module initialized");

    let social_module = social::SocialModule::new(Arc::clone(&sql), server_config.social_config())?;
    info!("Social module initialized");

    let module_routes = vec![
        (account_module.name(), account_module.routes()),
        (social_module.name(), social_module.routes()),
    ];

    let app = routes::build_router(account_module.service().clone(), module_routes);

    let listener = tokio::net::TcpListener::bind(&core_config.listen).await?;
    info!("Recharge server listening on {}", core_config.listen);
    axum::serve(listener, app).await?;

    Ok(())
}
