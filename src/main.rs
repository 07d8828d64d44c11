// Solace - Wellness companion server with crisis escalation
// Main entry point

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use solace::config::{load_config, Config};
use solace::crisis::{CrisisDetector, PatternLibrary};
use solace::errors;
use solace::providers::create_provider;
use solace::server::CompanionServer;
use tracing_subscriber::prelude::*;

#[derive(Parser, Debug)]
#[command(name = "solace")]
#[command(about = "Wellness companion server with crisis escalation", version)]
struct Args {
    /// Config file (default: ~/.solace/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server
    Serve {
        /// Bind address (overrides config and SOLACE_BIND)
        #[arg(long)]
        bind: Option<String>,
    },
    /// Classify a message and print the result as JSON
    Classify {
        /// Message text
        text: String,
    },
    /// Validate the configuration and exit
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing();

    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Serve { bind } => run_serve(config, bind).await,
        Command::Classify { text } => run_classify(&config, &text),
        Command::CheckConfig => run_check_config(&config),
    }
}

fn init_tracing() {
    // Default: INFO level, can be overridden with RUST_LOG env var
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Bridge log crate → tracing (for dependencies using log crate)
    tracing_log::LogTracer::init().ok();
}

async fn run_serve(mut config: Config, bind: Option<String>) -> Result<()> {
    if let Some(bind) = bind {
        config.server.bind_address = bind;
    }
    config.validate().context("Invalid configuration")?;

    let provider = create_provider(&config.provider)?;
    let server = CompanionServer::from_config(&config, provider)?;

    if config.therapists.is_empty() {
        tracing::warn!("No therapists configured; crisis escalations cannot book appointments");
    }
    if config.mail.endpoint.is_none() {
        tracing::warn!("No mail relay configured; crisis notifications are only logged");
    }

    server.serve().await.map_err(|e| {
        anyhow::anyhow!(errors::wrap_error_with_suggestion(
            e,
            "Check that the bind address is free, or pass --bind 127.0.0.1:<port>"
        ))
    })
}

fn run_classify(config: &Config, text: &str) -> Result<()> {
    let scope = config.classifier.exception_scope;
    let detector = match &config.classifier.patterns_path {
        Some(path) => CrisisDetector::load_from_file(path, scope)?,
        None => CrisisDetector::new(PatternLibrary::builtin()?, scope),
    };

    let classification = detector.classify(text);
    println!("{}", serde_json::to_string_pretty(&classification)?);
    Ok(())
}

fn run_check_config(config: &Config) -> Result<()> {
    config.validate()?;

    let rules = match &config.classifier.patterns_path {
        Some(path) => PatternLibrary::load_from_file(path)?.rule_count(),
        None => PatternLibrary::builtin()?.rule_count(),
    };

    println!("Configuration OK");
    println!("  bind address:   {}", config.server.bind_address);
    println!("  auth tokens:    {}", config.auth.tokens.len());
    println!("  crisis rules:   {}", rules);
    println!("  exception scope: {:?}", config.classifier.exception_scope);
    println!("  therapists:     {}", config.therapists.len());
    println!(
        "  mail relay:     {}",
        config.mail.endpoint.as_deref().unwrap_or("(log only)")
    );
    println!(
        "  chat provider:  {}",
        if config.provider.api_key.is_some() {
            config.provider.model.as_str()
        } else {
            "(missing api key)"
        }
    );
    Ok(())
}
