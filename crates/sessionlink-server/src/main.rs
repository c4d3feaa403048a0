//! SessionLink Server
//!
//! Extracts session tokens from search URLs and re-embeds them into
//! freshly generated ones.
//!
//! Usage:
//! ```bash
//! # Serve with defaults (127.0.0.1:3000)
//! sessionlink-server
//!
//! # With config file, env vars override it
//! SESSIONLINK_PORT=8080 sessionlink-server --config sessionlink.yaml
//!
//! # One-shot helpers
//! sessionlink-server extract --url 'https://www.linkedin.com/sales/search/people?query=(keywords:rust)&sessionId=abc%3D'
//! sessionlink-server build --request search.json
//! ```
//!
//! Test with:
//! ```bash
//! curl http://localhost:3000/extract-session \
//!   -H "Content-Type: application/json" \
//!   -d '{"url": "https://www.linkedin.com/sales/search/people?query=(keywords:rust)&sessionId=abc%3D"}'
//! ```

mod app;
mod config;

use anyhow::Context;
use clap::{Parser, Subcommand};
use config::{LogFormat, LoggingConfig, ServerConfig};
use sessionlink_ingress::session::{GenerateUrlRequest, GenerateUrlResponse, SessionResponse};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tokio::net::TcpListener;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const BANNER: &str = concat!(
    r#"
   ____                _             _     _       _
  / ___|  ___  ___ ___(_) ___  _ __ | |   (_)_ __ | | __
  \___ \ / _ \/ __/ __| |/ _ \| '_ \| |   | | '_ \| |/ /
   ___) |  __/\__ \__ \ | (_) | | | | |___| | | | |   <
  |____/ \___||___/___/_|\___/|_| |_|_____|_|_| |_|_|\_\

  version : "#,
    env!("VERSION"),
    "\n  commit  : ",
    env!("SHA"),
    "\n"
);

/// SessionLink Server - session-aware search URL codec
#[derive(Parser)]
#[command(name = "sessionlink-server")]
#[command(about = "Extract and re-embed session tokens in search URLs", long_about = None)]
#[command(version = env!("VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to configuration file (YAML or TOML)
    #[arg(
        short,
        long,
        value_name = "FILE",
        env = "SESSIONLINK_CONFIG",
        global = true
    )]
    config: Option<PathBuf>,

    /// Address to bind (overrides config and environment)
    #[arg(long, value_name = "HOST", global = true)]
    host: Option<String>,

    /// Port to bind (overrides config and environment)
    #[arg(short, long, value_name = "PORT", global = true)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server (default if no command specified)
    Serve,
    /// Print the session token carried by a search URL
    Extract {
        /// Search URL to inspect
        #[arg(long)]
        url: String,
    },
    /// Build a search URL from a JSON request file
    Build {
        /// JSON file shaped like the /generate-url-with-session body
        #[arg(long, value_name = "FILE")]
        request: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => ServerConfig::from_file(path)?,
        None => ServerConfig::default(),
    };

    // Merge environment variables (they override config file)
    config.merge_env();

    // CLI flags take highest precedence
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }

    init_tracing(&config.logging)?;

    if let Some(path) = &cli.config {
        info!("Loaded configuration from {}", path.display());
    }

    match cli.command {
        Some(Commands::Extract { url }) => extract(&config, &url),
        Some(Commands::Build { request }) => build(&config, &request),
        Some(Commands::Serve) | None => serve(config).await,
    }
}

/// Targets raised to debug when `log_requests` is set
const REQUEST_LOG_TARGETS: [&str; 3] = ["tower_http", "sessionlink_ingress", "sessionlink_core"];

fn log_filter(logging: &LoggingConfig) -> EnvFilter {
    let log_level = match logging.level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let mut filter = EnvFilter::new(log_level.to_string());
    // A per-target debug directive would cap an already more verbose global level
    if logging.log_requests && log_level < Level::DEBUG {
        for target in REQUEST_LOG_TARGETS {
            match format!("{}=debug", target).parse() {
                Ok(directive) => filter = filter.add_directive(directive),
                Err(e) => eprintln!(
                    "Warning: failed to enable request logging for {}: {}",
                    target, e
                ),
            }
        }
    }
    filter
}

fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    // Logs go to stderr so subcommand output on stdout stays machine readable
    let builder = FmtSubscriber::builder()
        .with_env_filter(log_filter(logging))
        .with_writer(std::io::stderr);

    match logging.format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
    }

    Ok(())
}

fn extract(config: &ServerConfig, url: &str) -> anyhow::Result<()> {
    let codec = app::build_codec(config)?;
    let token = codec.extract_session_token(url)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&SessionResponse::from(&token))?
    );
    Ok(())
}

fn build(config: &ServerConfig, request_path: &Path) -> anyhow::Result<()> {
    let codec = app::build_codec(config)?;
    let contents = std::fs::read_to_string(request_path)
        .with_context(|| format!("Failed to read {}", request_path.display()))?;
    let request: GenerateUrlRequest = serde_json::from_str(&contents)
        .with_context(|| format!("Invalid request JSON in {}", request_path.display()))?;

    let request = request.into_search_request(&codec)?;
    let url = codec.build_search_url(&request)?;
    println!(
        "{}",
        serde_json::to_string_pretty(&GenerateUrlResponse { success: true, url })?
    );
    Ok(())
}

async fn serve(config: ServerConfig) -> anyhow::Result<()> {
    println!("{}", BANNER);

    let app = app::build(&config)?;

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", config.host, config.port))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("SessionLink listening on http://{}", addr);
    info!("   Token encoding:     {}", app.codec.encoding().name());
    info!("   Session parameter:  {}", app.codec.session_param());
    info!("   Endpoints:");
    info!("   - POST http://{}/extract-session", addr);
    info!("   - POST http://{}/decode-session", addr);
    info!("   - POST http://{}/generate-url-with-session", addr);
    info!("   - POST http://{}/parse-search-url", addr);
    info!("   - GET  http://{}/api-docs/openapi.json", addr);
    info!("   Observability:");
    info!("   - Health check:       http://{}/healthz", addr);
    info!("   - Readiness check:    http://{}/readyz", addr);
    info!("   - Prometheus metrics: http://{}/metrics", addr);

    axum::serve(listener, app.router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
