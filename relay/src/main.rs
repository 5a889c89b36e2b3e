//! cfpreview development relay
//!
//! Runs a live preview session behind an HTTP API so previews can be driven
//! without the CMS web app:
//! 1. POST host messages (field edits, entry replacements) to the session
//! 2. Read back what the session sends to the host (ready handshake, editor requests)
//!
//! Usage:
//!   cfpreview-relay --port 4010 --origin https://app.contentful.com
//!
//! Session state lives in memory only.

use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use cfpreview_relay::{build_router, RelayState};
use cfpreview_sync::{SessionConfig, TokioScheduler};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "cfpreview-relay")]
#[command(about = "Development relay standing in for the CMS host window")]
struct Args {
    /// HTTP port to listen on
    #[arg(short, long, default_value = "4010")]
    port: u16,

    /// Session configuration file (JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Locale to render fields in (overrides the config file)
    #[arg(short, long)]
    locale: Option<String>,

    /// Trusted host origin (overrides the config file)
    #[arg(short, long)]
    origin: Option<String>,

    /// Disable click-to-edit inspector attributes
    #[arg(long)]
    no_inspector: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(args: &Args) -> Result<SessionConfig> {
    let mut config = match &args.config {
        Some(path) => SessionConfig::from_file(path)
            .with_context(|| format!("Failed to load session config from {:?}", path))?,
        None => SessionConfig::default(),
    };
    if let Some(locale) = &args.locale {
        config.locale = locale.clone();
    }
    if let Some(origin) = &args.origin {
        config.target_origin = origin.clone();
    }
    if args.no_inspector {
        config.enable_inspector_mode = false;
    }
    if args.verbose {
        config.debug_mode = true;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    info!("cfpreview relay starting...");
    let config = load_config(&args)?;
    let scheduler = Arc::new(TokioScheduler::current()?);
    let state = RelayState::connect(config.clone(), scheduler).context("Invalid session config")?;

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", args.port))
        .await
        .with_context(|| format!("Failed to bind HTTP port {}", args.port))?;

    println!("\n========================================");
    println!("  cfpreview Relay Running");
    println!("========================================");
    println!("  HTTP Port: {}", args.port);
    println!("  Origin:    {}", config.target_origin);
    println!("  Locale:    {}", config.locale);
    println!("  Inspector: {}", config.enable_inspector_mode);
    println!("========================================\n");

    let app = build_router(Arc::clone(&state));
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
        })
        .await
        .context("HTTP server failed")?;

    state.session.shutdown();
    Ok(())
}
