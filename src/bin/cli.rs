//! Stockview CLI
//!
//! Command-line client for the stock chart analysis service:
//! - Build the analysis page URL for a symbol and market
//! - Follow the progress stream of a task
//! - Create a task and follow it to the report
//! - Generate a config file
//!
//! # Configuration
//!
//! Settings come from `--config`, `~/.config/stockview/config.toml` or
//! `./stockview.toml`, then from `STOCKVIEW_*` environment variables, then
//! from the flags below. `RUST_LOG` overrides the configured log level.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use stockview::client::{start_analysis, AnalysisApp, HttpBackend, ReportFormat, TerminalView};
use stockview::config::{generate_default_config, Config, LoggingConfig};
use stockview::markdown::FallbackPolicy;
use stockview::protocol::{task_id_from_url, TaskId};
use stockview::session::{CloseReason, SubscriptionState};
use stockview::view::AnalysisView;

#[derive(Parser)]
#[command(name = "stockview")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Follow stock chart analysis tasks from the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Analysis server URL (overrides the config file)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print the report as HTML instead of markdown
    #[arg(long, global = true)]
    pub html: bool,

    /// Insert the report verbatim when printing HTML (no escaping)
    #[arg(long, global = true)]
    pub verbatim_markdown: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the analysis page URL for a symbol and market
    Open {
        /// Stock symbol (e.g. NVDA, 600519)
        symbol: String,
        /// Market (e.g. us, sh)
        market: String,
    },

    /// Follow the progress stream of an existing task
    Watch {
        /// Task id
        task_id: Option<String>,
        /// Analysis page URL carrying a `taskId` query parameter
        #[arg(long, conflicts_with = "task_id")]
        page_url: Option<String>,
    },

    /// Create an analysis task and follow it
    Analyze {
        /// Symbol and market joined by a dot (e.g. NVDA.us)
        symbol_market: String,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => Config::load_default(),
    };
    if let Some(url) = &cli.base_url {
        config.server.base_url = url.clone();
    }
    if cli.verbatim_markdown {
        config.render.markdown_fallback = FallbackPolicy::Verbatim;
    }

    init_logging(&config.logging);

    let format = if cli.html {
        ReportFormat::Html(config.render.markdown_fallback)
    } else {
        ReportFormat::Markdown
    };

    match cli.command {
        Commands::Open { symbol, market } => {
            let view = TerminalView::new(std::io::stderr()).without_timestamps();
            let mut app = AnalysisApp::new(backend(&config)?, view, None);

            match app.submit_analysis(&symbol, &market) {
                Some(path) => {
                    println!("{}", app.backend().url(&path)?);
                    Ok(ExitCode::SUCCESS)
                }
                None => Ok(ExitCode::FAILURE),
            }
        }

        Commands::Watch { task_id, page_url } => {
            let task_id = match (task_id, page_url) {
                (Some(id), _) if !id.is_empty() => Some(TaskId::new(id)),
                (_, Some(url)) => task_id_from_url(&url),
                _ => None,
            };

            let view = terminal_view(format);
            let mut app = AnalysisApp::new(backend(&config)?, view, task_id);
            let state = app.run().await;
            Ok(exit_code(state))
        }

        Commands::Analyze { symbol_market } => {
            let view = terminal_view(format);
            let app = start_analysis(backend(&config)?, view, &symbol_market)
                .await
                .with_context(|| format!("Failed to create analysis task for {}", symbol_market))?;

            match app {
                Some(mut app) => {
                    if let Some(task_id) = app.session().task_id() {
                        tracing::info!("Following task {}", task_id);
                    }
                    let state = app.run().await;
                    Ok(exit_code(state))
                }
                None => {
                    tracing::warn!("No task was created for {:?}", symbol_market);
                    Ok(ExitCode::FAILURE)
                }
            }
        }

        Commands::Config { output } => {
            let content = generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &content)
                        .with_context(|| format!("Failed to write {:?}", path))?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", content);
                    std::io::stdout().flush()?;
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn backend(config: &Config) -> anyhow::Result<HttpBackend> {
    HttpBackend::new(&config.server.base_url, config.server.request_timeout_secs)
        .with_context(|| format!("Invalid server URL {:?}", config.server.base_url))
}

fn terminal_view(format: ReportFormat) -> impl AnalysisView {
    TerminalView::new(std::io::stdout()).with_format(format)
}

fn exit_code(state: SubscriptionState) -> ExitCode {
    match state {
        SubscriptionState::Idle | SubscriptionState::Closed(CloseReason::Completed) => {
            ExitCode::SUCCESS
        }
        _ => ExitCode::FAILURE,
    }
}

fn init_logging(config: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("stockview={}", config.level).into());

    let registry = tracing_subscriber::registry().with(filter);
    if config.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
