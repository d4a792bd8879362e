//! # EduPlan - Curriculum Planner
//!
//! The main binary for EduPlan.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for progress and schedule operations
//! - A client for the remote curriculum service
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     apps/eduplan (THE BINARY)                   │
//! │                                                                 │
//! │  ┌─────────────┐    ┌─────────────┐    ┌──────────────────┐     │
//! │  │   CLI       │    │   HTTP API  │    │  Remote Client   │     │
//! │  │  (clap)     │    │   (axum)    │    │    (reqwest)     │     │
//! │  └──────┬──────┘    └──────┬──────┘    └────────┬─────────┘     │
//! │         │                  │                    │               │
//! │         └──────────────────┼────────────────────┘               │
//! │                            ▼                                    │
//! │                    ┌───────────────┐                            │
//! │                    │ eduplan-core  │                            │
//! │                    │  (THE LOGIC)  │                            │
//! │                    └───────────────┘                            │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! eduplan server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! eduplan catalogs
//! eduplan set-status --user ana --subject 1 --status completed --course 1
//! eduplan plan --user ana --course 1
//! ```

use clap::Parser;
use eduplan::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    // EDUPLAN_LOG_FORMAT=json enables machine-parseable output.
    let log_format = std::env::var("EDUPLAN_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "eduplan=info,tower_http=debug".into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    let cli = cli::Cli::parse();

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the EduPlan startup banner.
fn print_banner() {
    println!(
        r#"
  ███████╗██████╗ ██╗   ██╗██████╗ ██╗      █████╗ ███╗   ██╗
  ██╔════╝██╔══██╗██║   ██║██╔══██╗██║     ██╔══██╗████╗  ██║
  █████╗  ██║  ██║██║   ██║██████╔╝██║     ███████║██╔██╗ ██║
  ██╔══╝  ██║  ██║██║   ██║██╔═══╝ ██║     ██╔══██║██║╚██╗██║
  ███████╗██████╔╝╚██████╔╝██║     ███████╗██║  ██║██║ ╚████║
  ╚══════╝╚═════╝  ╚═════╝ ╚═╝     ╚══════╝╚═╝  ╚═╝╚═╝  ╚═══╝

  Curriculum Planner v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
