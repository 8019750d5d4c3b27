use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use cosmicmind_lib::config::{self, Config};
use cosmicmind_lib::extractor::{ResolveOptions, Resolver};

#[derive(Parser)]
#[command(name = "cosmicmind", version, about = "Personal content registry backend")]
struct Cli {
    /// Config file (defaults to the user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (default)
    Serve {
        #[arg(long)]
        port: Option<u16>,
    },
    /// Resolve one URL and print its metadata as JSON
    Resolve {
        url: String,
        #[arg(long, env = "YOUTUBE_API_KEY")]
        youtube_api_key: Option<String>,
    },
    /// Write a default config file if none exists
    InitConfig,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let config_path = cli.config.unwrap_or_else(config::config_path);

    let mut config = config::load_config(&config_path)?;
    config.apply_env()?;

    match cli.command.unwrap_or(Command::Serve { port: None }) {
        Command::Serve { port } => {
            if let Some(port) = port {
                config.port = port;
            }
            cosmicmind_lib::run(config).await?;
        }
        Command::Resolve {
            url,
            youtube_api_key,
        } => {
            let resolver = Resolver::new(config.upstream.resolver_config())?;
            let options = ResolveOptions {
                youtube_api_key: youtube_api_key.or(config.youtube_api_key),
            };
            let metadata = resolver.resolve(&url, &options).await;
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }
        Command::InitConfig => {
            if config_path.exists() {
                tracing::info!("Config already exists at {}", config_path.display());
            } else {
                config::write_config(&config_path, &Config::default())?;
                tracing::info!("Wrote default config to {}", config_path.display());
            }
        }
    }

    Ok(())
}
