//! minisql server
//!
//! ```bash
//! # serve $HOME/.minisql/default on 127.0.0.1:9000
//! minisql
//!
//! # serve $HOME/.minisql/shop/eu on port 8080, saving on Ctrl+C
//! minisql shop/eu 8080 --save-on-exit
//!
//! curl -d "SELECT * FROM users" http://127.0.0.1:9000/
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use minisql::config::{Args, Config};
use minisql::{Database, Server, SharedDatabase};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = Config::from_args(&args)?;

    init_logging(&config.log_level);

    run(config).await
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(format!("minisql={level}"))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .init();
}

async fn run(config: Config) -> Result<()> {
    info!("database directory: {}", config.database_path.display());

    let mut database = Database::new(&config.database_path);
    database
        .load()
        .with_context(|| format!("failed to load {}", config.database_path.display()))?;
    let db = SharedDatabase::new(database);

    let server = Server::bind(config.addr.as_str(), db.clone())
        .await
        .with_context(|| format!("failed to bind {}", config.addr))?;

    tokio::select! {
        result = server.serve() => {
            if let Err(e) = result {
                error!("server error: {e}");
                return Err(e).context("server stopped");
            }
        }
        _ = signal::ctrl_c() => {
            info!("shutdown signal received");
        }
    }

    if config.save_on_exit {
        db.save().context("failed to save the database")?;
    }

    info!("server stopped");
    Ok(())
}
