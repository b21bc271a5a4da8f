// CLI module - command-line argument parsing and handlers
//
// Without a subcommand the proxy starts serving. Subcommands are admin aids:
// - config --show / --path: inspect configuration
// - health: check the retrieval service
// - search <query>: run one retrieval and print the context block

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};

use crate::config::{Config, VERSION};
use crate::proxy::ContextRetriever;

/// Retrieval-augmenting proxy for an Ollama inference backend
#[derive(Parser)]
#[command(name = "rag-proxy")]
#[command(version = VERSION)]
#[command(about = "Retrieval-augmenting reverse proxy for Ollama", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Inspect configuration
    Config {
        /// Show effective configuration (env + file + defaults) as TOML
        #[arg(long)]
        show: bool,

        /// Show config file path
        #[arg(long)]
        path: bool,
    },

    /// Check that the retrieval service is up and list its domains
    Health,

    /// Retrieve context for a query, exactly as the proxy would
    Search {
        /// Query text
        query: String,
    },
}

/// Handle CLI commands. Returns true if a command was handled (exit after).
pub async fn handle_cli(cli: Cli, config: &Config) -> Result<bool> {
    match cli.command {
        Some(Commands::Config { show, path }) => {
            if path {
                handle_config_path();
            } else if show {
                print!("{}", config.to_toml());
            } else {
                println!("Usage: rag-proxy config [--show|--path]");
            }
            Ok(true)
        }
        Some(Commands::Health) => {
            handle_health(config).await?;
            Ok(true)
        }
        Some(Commands::Search { query }) => {
            handle_search(config, &query).await;
            Ok(true)
        }
        None => Ok(false),
    }
}

fn handle_config_path() {
    match Config::config_path() {
        Some(path) => println!("{}", path.display()),
        None => println!("Could not determine config path"),
    }
}

fn retriever_for(config: &Config) -> ContextRetriever {
    ContextRetriever::new(reqwest::Client::new(), config.retrieval.clone())
}

async fn handle_health(config: &Config) -> Result<()> {
    match retriever_for(config).health().await {
        Ok(health) => {
            println!("Retrieval service: {}", config.retrieval.url);
            println!("  ok:      {}", health.ok);
            if health.domains.is_empty() {
                println!("  domains: (none loaded)");
            } else {
                println!("  domains: {}", health.domains.join(", "));
            }
            Ok(())
        }
        Err(e) => bail!("Retrieval service at {} is unavailable: {}", config.retrieval.url, e),
    }
}

async fn handle_search(config: &Config, query: &str) {
    let context = retriever_for(config).retrieve(query).await;
    if context.is_empty() {
        println!("(no context retrieved - the request would be forwarded unchanged)");
    } else {
        println!("{}", context);
    }
}
