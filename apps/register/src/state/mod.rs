//! # State Module
//!
//! Everything a command may need, built once at startup.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │          ┌──────────────────┬──────────────────┐                        │
//! │          ▼                  ▼                  ▼                        │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐              │
//! │  │   DbState    │  │ SessionState │  │  RegisterConfig  │              │
//! │  │              │  │              │  │                  │              │
//! │  │  Database    │  │  Arc<Mutex<  │  │  db path/pool    │              │
//! │  │  (pool +     │  │    tokens    │  │  admin password  │              │
//! │  │   lock)      │  │  >>          │  │  receipt width   │              │
//! │  └──────────────┘  └──────────────┘  └──────────────────┘              │
//! │                                                                         │
//! │  Commands take only the pieces they use.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod db;
mod session;

pub use config::{ConfigError, RegisterConfig, CONFIG_FILE_NAME};
pub use db::DbState;
pub use session::{Session, SessionState};

/// All register state, shared by the request loop.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: DbState,
    pub sessions: SessionState,
    pub config: RegisterConfig,
}

impl AppState {
    pub fn new(db: cafe_db::Database, config: RegisterConfig) -> Self {
        AppState {
            db: DbState::new(db),
            sessions: SessionState::new(),
            config,
        }
    }
}
