use crate::config::{ConfigError, ConfigManager};
use crate::storage::SessionStorage;
use crate::web::{self, AppState};
use clap::{Parser, Subcommand};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

#[derive(Parser, Debug)]
#[command(name = "todo-lists", version, about = "Session-scoped todo lists served over HTTP")]
pub struct Cli {
    /// Path to the config file (defaults to ~/.config/todo-lists/config.json)
    #[arg(long = "config", global = true, env = "TODO_LISTS_CONFIG")]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server
    Serve {
        /// Address to bind, overrides server.host
        #[arg(long)]
        host: Option<IpAddr>,
        /// Port to bind, overrides server.port
        #[arg(short, long)]
        port: Option<u16>,
        /// Log at info instead of debug
        #[arg(long)]
        production: bool,
    },
    /// Read or change settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the value of a key
    Get { key: String },
    /// Set a key
    Set { key: String, value: String },
    /// Reset a key to its default
    Unset { key: String },
    /// Print every key with its value
    List,
}

#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Template error: {0}")]
    Templates(#[from] liquid::Error),
    #[error("Invalid server address: {0}")]
    InvalidAddress(String),
}

impl Cli {
    /// Default log filter when `RUST_LOG` is not set.
    pub fn default_log_filter(&self) -> &'static str {
        match self.command {
            Command::Serve {
                production: true, ..
            } => "info",
            Command::Serve { .. } => "todo_lists=debug,tower_http=debug,info",
            Command::Config { .. } => "warn",
        }
    }
}

pub async fn run(cli: Cli) -> Result<(), CliError> {
    let mut manager = ConfigManager::new(cli.config_path.as_deref())?;

    match cli.command {
        Command::Serve { host, port, .. } => {
            let config = manager.config();
            let host = match host {
                Some(host) => host,
                None => config
                    .host()
                    .parse()
                    .map_err(|_| CliError::InvalidAddress(config.host()))?,
            };
            let addr = SocketAddr::new(host, port.unwrap_or_else(|| config.port()));

            let storage: Arc<dyn SessionStorage> = Arc::from(manager.create_storage()?);
            let state = AppState::new(storage, config.cookie_name(), config.max_age())?;
            web::serve(addr, state).await?;
        }
        Command::Config { action } => match action {
            ConfigAction::Get { key } => match manager.get(&key)? {
                Some(value) => println!("{}", value),
                None => {
                    let default = manager
                        .list()
                        .into_iter()
                        .find(|(k, _, _)| *k == key)
                        .map(|(_, value, _)| value)
                        .unwrap_or_default();
                    println!("{} (default)", default);
                }
            },
            ConfigAction::Set { key, value } => {
                manager.set(&key, &value)?;
                println!("Set {} = {}", key, value);
            }
            ConfigAction::Unset { key } => {
                manager.unset(&key)?;
                println!("Unset {}", key);
            }
            ConfigAction::List => {
                for (key, value, is_default) in manager.list() {
                    if is_default {
                        println!("{} = {} (default)", key, value);
                    } else {
                        println!("{} = {}", key, value);
                    }
                }
            }
        },
    }

    Ok(())
}
