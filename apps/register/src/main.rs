//! # Cafe Register Entry Point
//!
//! Backend process for the register UI.
//!
//! ## Process Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Cafe Register                                    │
//! │                                                                         │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Register UI                                 │  │
//! │  │  • Product grid      • Cart          • Payment dialog            │  │
//! │  │  • Receipt printing  • Reports       • Settings                  │  │
//! │  └──────────────────────────────┬───────────────────────────────────┘  │
//! │                    one JSON line per request                           │
//! │                                 ▼                                       │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                    Rust Backend (this crate)                     │  │
//! │  │                                                                  │  │
//! │  │  stdin ──► ipc::dispatch ──► commands/ ──► stdout               │  │
//! │  │                                   logs ──► stderr               │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                 │                                       │
//! │                                 ▼                                       │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                         SQLite Database                          │  │
//! │  │  cafe.db (local file, WAL mode)                                  │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::process::ExitCode;

use cafe_register_lib::Options;

#[tokio::main]
async fn main() -> ExitCode {
    let options = Options::parse(std::env::args());

    if options.show_help {
        println!("Cafe Register backend");
        println!();
        println!("Usage: cafe-register [OPTIONS]");
        println!();
        println!("Reads JSON requests from stdin, one per line, and writes responses to stdout.");
        println!();
        println!("Options:");
        println!("  -c, --config <PATH>  Config file (default: CAFE_CONFIG or platform config dir)");
        println!("  -h, --help           Show this help message");
        return ExitCode::SUCCESS;
    }

    match cafe_register_lib::run(options).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Cafe Register failed");
            eprintln!("cafe-register: {}", e);
            ExitCode::FAILURE
        }
    }
}
