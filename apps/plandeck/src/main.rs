//! # Plandeck - Construction Dashboard Server
//!
//! The main binary for the Plandeck project dashboard.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for workspace operations
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                    apps/plandeck (THE BINARY)                  │
//! │                                                                │
//! │  ┌──────────┐   ┌───────────┐   ┌────────────────────────┐    │
//! │  │   CLI    │   │ HTTP API  │   │  Service Clients       │    │
//! │  │  (clap)  │   │  (axum)   │   │  (CDN + detection)     │    │
//! │  └────┬─────┘   └─────┬─────┘   └───────────┬────────────┘    │
//! │       │               │                     │                 │
//! │       └───────────────┼─────────────────────┘                 │
//! │                       ▼                                       │
//! │               ┌───────────────┐                               │
//! │               │ plandeck-core │                               │
//! │               │  (THE LOGIC)  │                               │
//! │               └───────────────┘                               │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! plandeck server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! plandeck status
//! plandeck export -o records.json
//! ```

use clap::Parser;
use plandeck::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // Initialize tracing — PLANDECK_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("PLANDECK_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "plandeck=info,tower_http=debug".into());

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

    // Parse CLI arguments
    let cli = cli::Cli::parse();

    // Display startup banner
    if !cli.quiet {
        print_banner();
    }

    // Execute command
    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Plandeck startup banner.
fn print_banner() {
    println!(
        r#"
  ██████╗ ██╗      █████╗ ███╗   ██╗██████╗ ███████╗ ██████╗██╗  ██╗
  ██╔══██╗██║     ██╔══██╗████╗  ██║██╔══██╗██╔════╝██╔════╝██║ ██╔╝
  ██████╔╝██║     ███████║██╔██╗ ██║██║  ██║█████╗  ██║     █████╔╝
  ██╔═══╝ ██║     ██╔══██║██║╚██╗██║██║  ██║██╔══╝  ██║     ██╔═██╗
  ██║     ███████╗██║  ██║██║ ╚████║██████╔╝███████╗╚██████╗██║  ██╗
  ╚═╝     ╚══════╝╚═╝  ╚═╝╚═╝  ╚═══╝╚═════╝ ╚══════╝ ╚═════╝╚═╝  ╚═╝

  Construction Dashboard Server v{}

  Projects • Layers • Detection
"#,
        env!("CARGO_PKG_VERSION")
    );
}
