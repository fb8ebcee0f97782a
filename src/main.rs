//! rustcitewatch - INSPIRE-HEP citation monitor
//!
//! Tracks papers by INSPIRE record id and reports works that newly cite them.
//!
//! ## Usage
//!
//! ### CLI Mode
//! ```bash
//! rustcitewatch add 2670073
//! rustcitewatch check 2670073
//! rustcitewatch monitor --interval-hours 24
//! ```
//!
//! ### HTTP Server Mode
//! ```bash
//! rustcitewatch serve --port 3000
//! ```

use anyhow::{Context, Result};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use clap::{Parser, Subcommand};
use rustcitewatch::{
    config::{default_data_dir, Config},
    inspire::{DEFAULT_API_BASE, DEFAULT_PAGE_SIZE},
    messages,
    monitor::MonitorEvent,
    service::CitationService,
    CiteError, ErrorKind,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedSender};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// INSPIRE-HEP citation monitor
#[derive(Parser)]
#[command(name = "rustcitewatch")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    /// Directory holding tracked papers, known titles and citation logs
    #[arg(long, global = true, env = "CITEWATCH_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// INSPIRE API root
    #[arg(long, global = true, env = "CITEWATCH_BASE_URL", default_value = DEFAULT_API_BASE)]
    base_url: String,

    /// Citing records fetched per check
    #[arg(long, global = true, env = "CITEWATCH_PAGE_SIZE", default_value_t = DEFAULT_PAGE_SIZE)]
    page_size: usize,

    /// JSON file overriding preferred sources and identifier system
    #[arg(long, global = true, env = "CITEWATCH_POLICY_FILE")]
    policy_file: Option<PathBuf>,

    /// Hours between monitoring sweeps
    #[arg(long, global = true, env = "CITEWATCH_INTERVAL_HOURS", default_value_t = 24)]
    interval_hours: u64,

    /// Seconds to wait between papers within a sweep
    #[arg(long, global = true, env = "CITEWATCH_PAPER_DELAY_SECS", default_value_t = 5)]
    paper_delay_secs: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a paper for new citations now
    Check {
        /// INSPIRE record id
        paper_id: String,
    },
    /// Start tracking a paper
    Add { paper_id: String },
    /// Stop tracking a paper
    Remove { paper_id: String },
    /// List tracked papers
    List,
    /// Show every citation reported so far for a paper
    History { paper_id: String },
    /// Check all tracked papers now and then periodically, until Ctrl-C
    Monitor,
    /// Run the HTTP command server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
    /// How to find a PAPER_ID and what each command does
    Guide,
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    if cli.json_logs {
        fmt().json().with_env_filter(filter).with_target(true).init();
    } else {
        fmt()
            .with_env_filter(filter)
            .with_target(true)
            .with_thread_ids(false)
            .init();
    }

    let config = build_config(&cli)?;
    let service = Arc::new(CitationService::from_config(&config).context("Failed to initialize citation service")?);

    let outcome = match cli.command {
        Commands::Serve { port, host } => return run_server(service, host, port).await,
        Commands::Guide => {
            println!("{}", messages::help_text());
            Ok(())
        }
        command => run_command(&service, command).await,
    };

    if let Err(e) = outcome {
        error!(error = %e, "Command failed");
        eprintln!("{}", messages::error_message(&e));
        std::process::exit(1);
    }
    Ok(())
}

fn build_config(cli: &Cli) -> Result<Config> {
    let mut config = Config::default();
    config.data_dir = cli.data_dir.clone().unwrap_or_else(default_data_dir);
    config.inspire.base_url = cli.base_url.clone();
    config.inspire.page_size = cli.page_size;
    config.monitor.interval = interval_from_hours(cli.interval_hours)?;
    config.monitor.paper_delay = Duration::from_secs(cli.paper_delay_secs);

    if let Some(path) = &cli.policy_file {
        config.load_policy(path).context("Failed to load normalization policy")?;
    }
    Ok(config)
}

fn interval_from_hours(hours: u64) -> rustcitewatch::Result<Duration> {
    hours
        .checked_mul(60 * 60)
        .map(Duration::from_secs)
        .ok_or_else(|| CiteError::Config(format!("monitor interval of {} hours is too large", hours)))
}

/// Paper ids typed by users may carry surrounding whitespace.
fn paper_arg(raw: &str) -> &str {
    raw.trim()
}

// ============================================================================
// CLI Commands
// ============================================================================

async fn run_command(service: &CitationService, command: Commands) -> rustcitewatch::Result<()> {
    match command {
        Commands::Check { paper_id } => {
            println!("Checking citations...");
            let report = service.check_citations(paper_arg(&paper_id)).await?;
            println!("{}", messages::check_report(&report));
        }
        Commands::Add { paper_id } => {
            println!("Adding paper...");
            let paper = service.add_paper(paper_arg(&paper_id)).await?;
            println!("{}", messages::added(&paper));
        }
        Commands::Remove { paper_id } => {
            let removed = service.remove_paper(paper_arg(&paper_id)).await?;
            println!("{}", messages::removed(removed));
        }
        Commands::List => {
            let papers = service.list_tracked_papers()?;
            println!("{}", messages::tracked_list(&papers));
        }
        Commands::History { paper_id } => {
            let entries = service.citation_history(paper_arg(&paper_id))?;
            if entries.is_empty() {
                println!("No citations recorded for {} yet.", paper_id);
            }
            for entry in entries {
                println!("--- {} ---", entry.checked_at.format("%Y-%m-%d %H:%M:%S UTC"));
                for c in entry.citations {
                    println!("{} ({}: {})", c.title, c.source, c.identifier);
                }
            }
        }
        Commands::Monitor => run_monitor(service).await?,
        Commands::Serve { .. } | Commands::Guide => {}
    }
    Ok(())
}

async fn run_monitor(service: &CitationService) -> rustcitewatch::Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let outcome = service.start_monitoring(tx).await?;
    println!("{}", messages::start_outcome(outcome, service.settings().interval));

    if outcome != rustcitewatch::monitor::StartOutcome::Started {
        return Ok(());
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            Some(event) = rx.recv() => println!("{}\n", messages::monitor_event(&event)),
        }
    }

    println!("{}", messages::stop_outcome(service.stop_monitoring().await));
    Ok(())
}

// ============================================================================
// HTTP Server
// ============================================================================

struct AppState {
    service: Arc<CitationService>,
    events: UnboundedSender<MonitorEvent>,
}

async fn run_server(service: Arc<CitationService>, host: String, port: u16) -> Result<()> {
    info!(host = %host, port = port, "Starting HTTP server");

    // Monitor reports go to the log; delivery to chat is the front-end's job
    let (events, mut rx) = mpsc::unbounded_channel::<MonitorEvent>();
    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            info!(report = %messages::monitor_event(&event), "Monitor report");
        }
    });

    let app_state = Arc::new(AppState { service, events });

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/help", get(help_handler))
        .route("/papers", get(list_handler))
        .route("/papers/{id}", post(add_handler).delete(remove_handler))
        .route("/papers/{id}/check", post(check_handler))
        .route("/papers/{id}/history", get(history_handler))
        .route("/monitor", get(monitor_status_handler))
        .route("/monitor/start", post(monitor_start_handler))
        .route("/monitor/stop", post(monitor_stop_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .context("Invalid host:port")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("Server error")?;

    Ok(())
}

/// Error body with a status code chosen by error kind
struct ApiError(CiteError);

impl From<CiteError> for ApiError {
    fn from(e: CiteError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = match kind {
            ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Upstream | ErrorKind::Network => StatusCode::BAD_GATEWAY,
            ErrorKind::Storage | ErrorKind::Config => StatusCode::INTERNAL_SERVER_ERROR,
        };
        error!(error = %self.0, status = status.as_u16(), "Request failed");

        let body = json!({
            "status": "error",
            "kind": format!("{:?}", kind),
            "message": messages::error_message(&self.0),
        });
        (status, Json(body)).into_response()
    }
}

type ApiResult = std::result::Result<Json<Value>, ApiError>;

/// Health check endpoint
async fn health_handler() -> &'static str {
    "OK"
}

async fn help_handler() -> String {
    messages::help_text()
}

async fn list_handler(State(state): State<Arc<AppState>>) -> ApiResult {
    let papers = state.service.list_tracked_papers()?;
    Ok(Json(json!({ "status": "success", "count": papers.len(), "papers": papers })))
}

async fn add_handler(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult {
    info!(paper_id = %id, "Add request");
    let paper = state.service.add_paper(paper_arg(&id)).await?;
    Ok(Json(json!({ "status": "success", "paper": paper, "message": messages::added(&paper) })))
}

async fn remove_handler(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult {
    info!(paper_id = %id, "Remove request");
    let removed = state.service.remove_paper(paper_arg(&id)).await?;
    Ok(Json(json!({ "status": "success", "removed": removed, "message": messages::removed(removed) })))
}

async fn check_handler(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult {
    info!(paper_id = %id, "Check request");
    let report = state.service.check_citations(paper_arg(&id)).await?;
    Ok(Json(json!({
        "status": "success",
        "count": report.citations.len(),
        "message": messages::check_report(&report),
        "report": report,
    })))
}

async fn history_handler(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> ApiResult {
    let entries = state.service.citation_history(paper_arg(&id))?;
    Ok(Json(json!({ "status": "success", "entries": entries })))
}

async fn monitor_status_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let status = state.service.monitoring_status().await;
    Json(json!({ "status": "success", "monitor": status }))
}

async fn monitor_start_handler(State(state): State<Arc<AppState>>) -> ApiResult {
    let outcome = state.service.start_monitoring(state.events.clone()).await?;
    let message = messages::start_outcome(outcome, state.service.settings().interval);
    Ok(Json(json!({ "status": "success", "outcome": outcome, "message": message })))
}

async fn monitor_stop_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let outcome = state.service.stop_monitoring().await;
    Json(json!({ "status": "success", "outcome": outcome, "message": messages::stop_outcome(outcome) }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paper_arg_trims_user_input() {
        assert_eq!(paper_arg(" 2670073\n"), "2670073");
        assert_eq!(paper_arg("100"), "100");
    }

    #[test]
    fn test_interval_from_hours() {
        assert_eq!(interval_from_hours(24).ok(), Some(Duration::from_secs(24 * 3600)));
        assert!(matches!(interval_from_hours(u64::MAX), Err(CiteError::Config(_))));
    }
}
