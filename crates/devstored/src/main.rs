//! devstored — the Devstore daemon.
//!
//! Opens the state store once, serves the command endpoint, and closes the
//! store after a graceful shutdown.
//!
//! # Usage
//!
//! ```text
//! devstored serve --config /etc/devstore/devstore.toml --port 8787
//! devstored default-config > devstore.toml
//! ```

mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use devstore_core::config::LoggingConfig;
use devstore_core::DevstoreConfig;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "devstored", about = "Devstore daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the command endpoint.
    Serve {
        /// Path to devstore.toml. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Port to listen on (overrides the config file).
        #[arg(long)]
        port: Option<u16>,

        /// Data directory for persistent state (overrides the config file).
        #[arg(long)]
        data_dir: Option<PathBuf>,

        /// Keep all state in memory.
        #[arg(long)]
        in_memory: bool,
    },
    /// Print the default configuration as TOML.
    DefaultConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            port,
            data_dir,
            in_memory,
        } => {
            let mut config = match config {
                Some(path) => DevstoreConfig::from_file(&path)?,
                None => DevstoreConfig::default(),
            };
            if let Some(port) = port {
                config.server.port = port;
            }
            if let Some(data_dir) = data_dir {
                config.storage.data_dir = data_dir;
            }
            config.storage.in_memory |= in_memory;

            init_tracing(&config.logging)?;
            serve::run(config).await
        }
        Command::DefaultConfig => {
            print!("{}", DevstoreConfig::default().to_toml_string()?);
            Ok(())
        }
    }
}

/// `RUST_LOG` wins over the configured filter.
fn init_tracing(logging: &LoggingConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&logging.filter))?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
    Ok(())
}
