//! protoscan - experimental protocol risk analysis from the command line.
//!
//! Reads a protocol document (PDF or plain text), sends it to the
//! configured LLM backend, and prints the structured assessment as JSON.

mod extract;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use protoscan_core::model::AppliedFix;
use protoscan_runtime::providers::LLM_PROVIDER_ENV;
use protoscan_runtime::{LlmProvider, ProviderRegistry};

#[derive(Parser)]
#[command(name = "protoscan", version, about = "Analyze experimental protocols with LLM backends")]
struct Cli {
    /// Backend to use (groq, claude, openai); defaults to $LLM_PROVIDER or groq
    #[arg(long, global = true)]
    provider: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze a protocol document for issues and success probability
    Analyze {
        /// Protocol document (.pdf or plain text)
        file: PathBuf,
    },

    /// Generate a targeted fix for one identified issue
    Fix {
        /// Protocol document providing context
        file: PathBuf,

        /// Title of the issue to fix
        #[arg(long)]
        issue: String,

        /// Description of the issue
        #[arg(long, default_value = "")]
        description: String,
    },

    /// Apply selected fixes and produce an improved protocol
    Improve {
        /// Original protocol document
        file: PathBuf,

        /// JSON file containing the fixes to apply
        #[arg(long)]
        fixes: PathBuf,
    },

    /// Extract the Materials section into a priced shopping list
    Reagents {
        /// Protocol document
        file: PathBuf,
    },

    /// List available backends and the configured one
    Providers,
}

fn select_provider(registry: &ProviderRegistry, flag: &Option<String>) -> Result<Arc<dyn LlmProvider>> {
    let provider = match flag {
        Some(name) => registry.create(name)?,
        None => registry.select_from_env()?,
    };
    Ok(provider)
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let registry = ProviderRegistry::with_defaults();

    match &cli.command {
        Command::Analyze { file } => {
            let provider = select_provider(&registry, &cli.provider)?;
            let text = extract::extract_text(file)?;
            tracing::info!(provider = provider.name(), file = %file.display(), "analyzing protocol");
            let result = provider.analyze_protocol(&text).await?;
            print_json(&result)?;
        }

        Command::Fix {
            file,
            issue,
            description,
        } => {
            let provider = select_provider(&registry, &cli.provider)?;
            let text = extract::extract_text(file)?;
            let plan = provider.generate_fix(issue, description, &text).await?;
            print_json(&plan)?;
        }

        Command::Improve { file, fixes } => {
            let provider = select_provider(&registry, &cli.provider)?;
            let text = extract::extract_text(file)?;
            let fixes_json = std::fs::read_to_string(fixes)
                .with_context(|| format!("cannot read fixes file {}", fixes.display()))?;
            let fixes: Vec<AppliedFix> = serde_json::from_str(&fixes_json)
                .context("fixes file must contain a JSON array of fixes")?;
            let improved = provider.improve_protocol(&text, &fixes).await?;
            print_json(&improved)?;
        }

        Command::Reagents { file } => {
            let provider = select_provider(&registry, &cli.provider)?;
            let text = extract::extract_text(file)?;
            let list = provider.extract_reagents(&text).await?;
            print_json(&list)?;
        }

        Command::Providers => {
            let current = cli
                .provider
                .clone()
                .or_else(|| std::env::var(LLM_PROVIDER_ENV).ok())
                .unwrap_or_else(|| "groq".to_string());
            print_json(&serde_json::json!({
                "available": registry.available_types(),
                "current": current,
            }))?;
        }
    }

    Ok(())
}
