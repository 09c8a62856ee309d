//! # Cafe Register Library
//!
//! The register backend: loads configuration, opens the database and
//! answers JSON requests from the UI over stdin/stdout.
//!
//! ## Module Organization
//! ```text
//! cafe_register_lib/
//! ├── lib.rs          ◄─── You are here (startup & run)
//! ├── ipc.rs          ◄─── Request/response envelope, dispatch, loop
//! ├── state/
//! │   ├── mod.rs      ◄─── AppState
//! │   ├── db.rs       ◄─── Database state wrapper
//! │   ├── session.rs  ◄─── Login session tokens
//! │   └── config.rs   ◄─── register.toml + environment
//! ├── commands/
//! │   ├── order.rs    ◄─── Checkout, receipts, history
//! │   ├── product.rs  ◄─── Menu management
//! │   ├── user.rs     ◄─── Login, accounts
//! │   ├── settings.rs ◄─── Key/value settings
//! │   └── report.rs   ◄─── Sales reports
//! └── error.rs        ◄─── API error type for commands
//! ```
//!
//! ## Channels
//! stdout carries only responses; all logging goes to stderr.

pub mod commands;
pub mod error;
pub mod ipc;
pub mod state;

use std::path::PathBuf;

use thiserror::Error;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cafe_db::{Database, DbError};
use state::{AppState, ConfigError, RegisterConfig};

/// Failures that stop the register before or while serving.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database startup failed: {0}")]
    Database(#[from] DbError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Command-line options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Options {
    pub config_path: Option<PathBuf>,
    pub show_help: bool,
}

impl Options {
    /// Parses `--config <path>` / `-c <path>` and `--help`. `CAFE_CONFIG`
    /// is used when no path is given.
    pub fn parse<I: IntoIterator<Item = String>>(args: I) -> Self {
        let args: Vec<String> = args.into_iter().collect();
        let mut options = Options::default();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--config" | "-c" => {
                    if i + 1 < args.len() {
                        options.config_path = Some(PathBuf::from(&args[i + 1]));
                        i += 1;
                    }
                }
                "--help" | "-h" => options.show_help = true,
                _ => {}
            }
            i += 1;
        }

        if options.config_path.is_none() {
            options.config_path = std::env::var("CAFE_CONFIG").ok().map(PathBuf::from);
        }

        options
    }
}

/// Runs the register backend until stdin closes.
///
/// ## Startup Sequence
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │                       Register Startup                                  │
/// │                                                                         │
/// │  1. Initialize Logging (stderr, RUST_LOG)                              │
/// │  2. Load register.toml + environment overrides                         │
/// │  3. Connect to Database (WAL, migrations)                              │
/// │  4. Seed default settings, create admin if no users                    │
/// │  5. Serve stdin → stdout                                               │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub async fn run(options: Options) -> Result<(), RunError> {
    init_tracing();

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Cafe Register");

    let config = RegisterConfig::load(options.config_path)?;
    let state = open(config).await?;

    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    ipc::serve(&state, stdin, stdout).await?;

    state.db.inner().close().await;
    info!("Cafe Register stopped");
    Ok(())
}

/// Opens the database and prepares first-run data.
pub async fn open(config: RegisterConfig) -> Result<AppState, RunError> {
    let db_config = config.to_db_config();

    if !db_config.is_in_memory() {
        if let Some(parent) = db_config.database_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }
    info!(db_path = ?db_config.database_path, "Database path determined");

    let db = Database::new(db_config).await?;
    info!("Database connected and migrations applied");

    let seeded = db.settings().seed_defaults().await?;
    if seeded > 0 {
        info!(seeded, "Default settings written");
    }
    db.users()
        .ensure_default_admin(&config.admin.default_password)
        .await?;

    Ok(AppState::new(db, config))
}

/// Initializes the tracing subscriber, writing to stderr.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=cafe=trace` - Show trace for cafe crates only
/// - Default: `info,cafe=debug,sqlx=warn`
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cafe=debug,sqlx=warn"));

    // try_init: a second call (tests) keeps the first subscriber
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_options_parse() {
        let options = Options::parse(args(&["cafe-register", "--config", "/etc/cafe/register.toml"]));
        assert_eq!(options.config_path, Some(PathBuf::from("/etc/cafe/register.toml")));
        assert!(!options.show_help);

        let options = Options::parse(args(&["cafe-register", "-h"]));
        assert!(options.show_help);
    }

    #[tokio::test]
    async fn test_open_in_memory_prepares_first_run() {
        let mut config = RegisterConfig::default();
        config.database.path = Some(PathBuf::from(":memory:"));
        config.database.max_connections = 1;

        let state = open(config).await.unwrap();
        let db = state.db.inner();

        assert_eq!(db.users().count().await.unwrap(), 1);
        assert_eq!(
            db.settings().get("currency_symbol").await.unwrap().as_deref(),
            Some("EGP")
        );
    }
}
