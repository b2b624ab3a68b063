//! Command-line arguments and the resolved process configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;

pub const DEFAULT_PORT: u16 = 9000;
pub const DEFAULT_DATABASE: &str = "default";

/// Column-store SQL database served over HTTP
#[derive(Parser, Debug)]
#[command(
    name = "minisql",
    version,
    about = "Column-store SQL database served over HTTP",
    long_about = "Serves one database over HTTP.\n\n\
                  POST a query to / to run it, GET /tables to list tables, POST /save to persist."
)]
pub struct Args {
    /// Database location under the root directory, `/`-separated
    #[arg(default_value = DEFAULT_DATABASE)]
    pub database: String,

    /// Port to listen on
    #[arg(default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Root directory of all databases (defaults to $HOME/.minisql)
    #[arg(long, value_name = "DIR", env = "MINISQL_ROOT")]
    pub root: Option<PathBuf>,

    /// Host address to bind to
    #[arg(long, default_value = "127.0.0.1", env = "MINISQL_HOST")]
    pub host: String,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info", env = "MINISQL_LOG")]
    pub log_level: String,

    /// Save every table when the server shuts down
    #[arg(long)]
    pub save_on_exit: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Directory holding the table files.
    pub database_path: PathBuf,
    /// `host:port` to listen on.
    pub addr: String,
    pub save_on_exit: bool,
    pub log_level: String,
}

impl Config {
    pub fn from_args(args: &Args) -> Result<Self> {
        let root = match &args.root {
            Some(root) => root.clone(),
            None => default_root().context("cannot locate the home directory, pass --root")?,
        };

        Ok(Self {
            database_path: database_path(&root, &args.database),
            addr: format!("{}:{}", args.host, args.port),
            save_on_exit: args.save_on_exit,
            log_level: args.log_level.clone(),
        })
    }
}

/// `$HOME/.minisql`
pub fn default_root() -> Option<PathBuf> {
    std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".minisql"))
}

/// Joins the `/`-separated `location` onto `root`, skipping empty segments.
pub fn database_path(root: &Path, location: &str) -> PathBuf {
    location
        .split('/')
        .filter(|segment| !segment.is_empty())
        .fold(root.to_path_buf(), |path, segment| path.join(segment))
}
