//! CLI subcommand definitions and handlers.
//!
//! Uses clap derive to define the subcommand hierarchy:
//! - `run` (default) -- run the bot against the console channel
//! - `config show|get|path` -- inspect configuration
//! - `version` -- print build/version info

use clap::{Parser, Subcommand};

/// Question-of-the-day chat bot.
#[derive(Parser, Debug)]
#[command(
    name = "qotd",
    version = env!("CARGO_PKG_VERSION"),
    about = "QOTD bot: trivia questions, polls and scoreboards for chat"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the bot, reading chat events from stdin (default when no subcommand is given).
    Run,

    /// Inspect configuration.
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Print version, build date, and git commit information.
    Version,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Print the fully loaded configuration as JSON.
    Show,

    /// Print a specific configuration value by dot-notation path.
    Get {
        /// Dot-notation key (e.g. "maxGuesses", "logging.level").
        key: String,
    },

    /// Print the resolved configuration file path.
    Path,
}

// ---------------------------------------------------------------------------
// Subcommand handlers
// ---------------------------------------------------------------------------

use crate::bot::QotdBot;
use crate::channels::ConsoleChannel;
use crate::config;
use crate::logging;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

/// How often the bot purges stale engagement records
pub const TICK_INTERVAL: Duration = Duration::from_secs(60);

/// Run the bot until stdin closes or Ctrl-C.
pub async fn handle_run() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::load_config()?;
    logging::init_logging(&cfg.logging)?;

    let console = Arc::new(ConsoleChannel::default());
    let bot = QotdBot::open(cfg, console.clone())?;
    info!(
        data_dir = %bot.config().data_dir.display(),
        bot_user_id = %bot.config().bot_user_id,
        "QOTD bot connected and running"
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut tick = tokio::time::interval(TICK_INTERVAL);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        if let Some(event) = console.parse_line(&line) {
                            bot.handle_event(event).await;
                        } else if !line.trim().is_empty() {
                            warn!(line = %line, "unrecognised console input");
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        warn!(error = %e, "stdin read failed");
                        break;
                    }
                }
            }
            _ = tick.tick() => bot.tick(),
            _ = &mut shutdown => {
                info!("interrupted");
                break;
            }
        }
    }

    info!("QOTD bot stopped");
    Ok(())
}

/// Run the `config show` subcommand.
pub fn handle_config_show() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = config::load_config()?;
    let pretty = serde_json::to_string_pretty(&cfg)?;
    println!("{}", pretty);
    Ok(())
}

/// Run the `config get <key>` subcommand.
pub fn handle_config_get(key: &str) -> Result<(), Box<dyn std::error::Error>> {
    let cfg = serde_json::to_value(config::load_config()?)?;
    match get_value_at_path(&cfg, key) {
        Some(value) => {
            let pretty = serde_json::to_string_pretty(&value)?;
            println!("{}", pretty);
        }
        None => {
            eprintln!("Key not found: {}", key);
            std::process::exit(1);
        }
    }
    Ok(())
}

/// Run the `config path` subcommand.
pub fn handle_config_path() {
    println!("{}", config::get_config_path().display());
}

/// Run the `version` subcommand.
pub fn handle_version() {
    println!("qotd {}", env!("CARGO_PKG_VERSION"));
    println!("  Build date: {}", env!("QOTD_BUILD_DATE"));
    println!("  Git commit: {}", env!("QOTD_GIT_HASH"));
    println!(
        "  Platform:   {} ({})",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Navigate a JSON value by dot-notation path and return the leaf value.
fn get_value_at_path(root: &Value, path: &str) -> Option<Value> {
    let mut current = root;
    for part in path.split('.') {
        current = current.as_object()?.get(part)?;
    }
    Some(current.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_no_args_defaults_to_none() {
        let cli = Cli::try_parse_from(["qotd"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_run_subcommand() {
        let cli = Cli::try_parse_from(["qotd", "run"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Run)));
    }

    #[test]
    fn test_cli_version_subcommand() {
        let cli = Cli::try_parse_from(["qotd", "version"]).unwrap();
        assert!(matches!(cli.command, Some(Command::Version)));
    }

    #[test]
    fn test_cli_config_show() {
        let cli = Cli::try_parse_from(["qotd", "config", "show"]).unwrap();
        match cli.command {
            Some(Command::Config(ConfigCommand::Show)) => {}
            other => panic!("Expected Config(Show), got {:?}", other),
        }
    }

    #[test]
    fn test_cli_config_get() {
        let cli = Cli::try_parse_from(["qotd", "config", "get", "logging.level"]).unwrap();
        match cli.command {
            Some(Command::Config(ConfigCommand::Get { key })) => assert_eq!(key, "logging.level"),
            other => panic!("Expected Config(Get), got {:?}", other),
        }
    }

    #[test]
    fn test_cli_config_path() {
        let cli = Cli::try_parse_from(["qotd", "config", "path"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Config(ConfigCommand::Path))
        ));
    }

    #[test]
    fn test_cli_rejects_unknown_subcommand() {
        assert!(Cli::try_parse_from(["qotd", "serve"]).is_err());
    }

    #[test]
    fn test_get_value_at_path_nested() {
        let cfg = serde_json::to_value(config::QotdConfig::default()).unwrap();
        assert_eq!(
            get_value_at_path(&cfg, "logging.level"),
            Some(serde_json::json!("info"))
        );
        assert_eq!(get_value_at_path(&cfg, "maxGuesses"), Some(serde_json::json!(3)));
    }

    #[test]
    fn test_get_value_at_path_missing() {
        let val = serde_json::json!({"a": 1});
        assert_eq!(get_value_at_path(&val, "b.c"), None);
        assert_eq!(get_value_at_path(&val, "a.b"), None);
    }
}
