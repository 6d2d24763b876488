//! genai command-line entry point.

mod config;

use clap::{Parser, Subcommand};
use genai_core::{GenAiClient, Provider};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

const DEFAULT_LOG_FILTER: &str = "info,genai=debug,genai_core=debug";

#[derive(Debug, Parser)]
#[command(name = "genai", version, about = "Provider-agnostic LLM completions")]
struct Cli {
    /// Path to a TOML config file (default: ~/.genai/config.toml).
    #[arg(long, global = true, env = "GENAI_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Request one completion and print the normalized response as JSON.
    Generate {
        prompt: String,
        /// JSON schema file constraining the answer.
        #[arg(long)]
        schema: Option<PathBuf>,
        /// Override the configured provider (openai, claude).
        #[arg(long)]
        provider: Option<String>,
    },
    /// Validate config and report whether the active provider is usable.
    Doctor,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing()?;
    install_panic_hook();

    let cli = Cli::parse();
    let cfg = config::AppConfig::load(cli.config).await?;

    match cli.command {
        Command::Generate {
            prompt,
            schema,
            provider,
        } => {
            let schema = match schema {
                Some(path) => Some(read_schema(&path).await?),
                None => None,
            };
            let mut client = GenAiClient::new(cfg.genai);
            if let Some(p) = provider {
                client.set_provider(p.parse::<Provider>()?);
            }

            let result = client.generate_response(&prompt, schema.as_ref()).await;
            client.close();
            let response = result?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
        Command::Doctor => {
            let client = GenAiClient::new(cfg.genai);
            let provider = client.provider();
            println!("provider: {provider}");
            println!("request timeout: {}s", client.config().request_timeout_secs);
            println!("endpoint: {}", client.config().base_url_for(provider));
            if client.is_configured() {
                println!("status: ok");
                Ok(())
            } else {
                Err(genai_core::LlmError::NotConfigured { provider }.into())
            }
        }
    }
}

async fn read_schema(path: &Path) -> anyhow::Result<serde_json::Value> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| anyhow::anyhow!("read schema {}: {e}", path.display()))?;
    serde_json::from_str(&raw)
        .map_err(|e| anyhow::anyhow!("parse schema {}: {e}", path.display()))
}

fn init_tracing() -> anyhow::Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(v) => v,
        Err(_) => EnvFilter::new(DEFAULT_LOG_FILTER),
    };
    let log_format = std::env::var("GENAI_LOG_FORMAT")
        .unwrap_or_else(|_| "compact".to_string())
        .to_ascii_lowercase();

    // stdout carries the response JSON; logs go to stderr.
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_span_events(FmtSpan::CLOSE)
                .with_target(true)
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .init();
        }
        "pretty" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_span_events(FmtSpan::CLOSE)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .pretty()
                .init();
        }
        "compact" => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .compact()
                .init();
        }
        other => {
            return Err(anyhow::anyhow!(
                "unsupported GENAI_LOG_FORMAT={other:?}; expected one of: json, pretty, compact"
            ));
        }
    }

    tracing::debug!(log_format = %log_format, "tracing initialized");
    Ok(())
}

fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        tracing::error!(panic_location = %location, "panic captured");
        default_hook(panic_info);
    }));
}
