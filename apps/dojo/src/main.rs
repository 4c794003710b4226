//! # Dojo - Roster Server
//!
//! The main binary for the dojo roster.
//!
//! This application provides:
//! - CLI interface for roster, attendance, grading and backups
//! - HTTP REST API server (axum-based) for the desk front-end
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! dojo server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! dojo import -f mitglieder.csv
//! dojo attend --date 2024-03-05 4 7 12
//! dojo evaluate --member 7
//! dojo export -t attendance-csv
//! ```

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // DOJO_LOG_FORMAT=json switches to machine-parseable output.
    let log_format = std::env::var("DOJO_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "dojo=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer())
                .init();
        }
    }

    let cli = dojo::cli::Cli::parse();

    if !cli.quiet {
        println!("dojo v{}", env!("CARGO_PKG_VERSION"));
    }

    if let Err(e) = dojo::cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}
