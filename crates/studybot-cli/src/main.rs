//! StudyBot CLI
//!
//! Main entry point for serving the StudyBot HTTP API.

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use studybot_dialogue::{create_router, AppState, Config, DialogueManager, StudyError};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Exit code for configuration, prompt and credential failures.
const EXIT_FATAL: u8 = 2;

/// StudyBot - Study Assistant Server
///
/// Answers study questions in explain, quiz or review mode by filling a
/// prompt template and forwarding it to a chat-completion model.
#[derive(Parser, Debug)]
#[command(name = "studybot")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: studybot.json in current directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<String>,

    /// Address to bind the HTTP server to
    #[arg(long, value_name = "HOST")]
    host: Option<String>,

    /// Port for the HTTP server
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory holding explain.txt, quiz.txt and review.txt
    #[arg(long, value_name = "DIR")]
    prompts_dir: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is not an error
    dotenvy::dotenv().ok();

    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::info!("StudyBot starting");
    tracing::debug!(config = ?args.config, "Config file");

    match run_server(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "StudyBot failed");
            eprintln!("Error: {e}");
            ExitCode::from(exit_code_for(&e))
        }
    }
}

/// Runs the HTTP server until Ctrl+C.
///
/// 1. Load and validate config
/// 2. Resolve the API key and load prompt templates
/// 3. Bind and serve
async fn run_server(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;

    // Apply CLI argument overrides
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(prompts_dir) = args.prompts_dir {
        config.prompts_dir = prompts_dir;
    }

    // Re-validate after overrides
    config.validate()?;

    print_config(&config);

    let manager = DialogueManager::from_config(&config)?;
    let router = create_router(AppState::new(manager));

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to bind to {addr}: {e}\n\nSuggestion: Try a different port with --port"
        )
    })?;

    println!();
    println!("StudyBot running on http://{addr}");
    println!("  Web UI: http://{addr}/ui");
    println!("Press Ctrl+C to stop");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("StudyBot stopped");
    Ok(())
}

/// Loads configuration from the specified path or default location.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Ok(Config::load_from_file(path)?)
        }
        None => Ok(Config::load()?),
    }
}

/// Maps a top-level error to the process exit code.
fn exit_code_for(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<StudyError>() {
        Some(study) if study.is_fatal() => EXIT_FATAL,
        _ => 1,
    }
}

/// Resolves when the process receives Ctrl+C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Prints the loaded configuration.
fn print_config(config: &Config) {
    println!("Configuration loaded:");
    println!("  Address: {}", config.bind_address());
    println!("  Prompts directory: {}", config.prompts_dir);
    println!("  API key variable: {}", config.api_key_env);
    println!("  Model: {} at {}", config.llm.model, config.llm.base_url);
    println!("  Temperature: {}", config.llm.temperature);
    println!("  Max tokens: {}", config.llm.max_tokens);
    println!("  Timeout: {}s", config.llm.timeout_secs);
}
