use clap::Parser;
use qotd::cli::{self, Cli, Command, ConfigCommand};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => cli::handle_run().await,
        Command::Config(ConfigCommand::Show) => cli::handle_config_show(),
        Command::Config(ConfigCommand::Get { key }) => cli::handle_config_get(&key),
        Command::Config(ConfigCommand::Path) => {
            cli::handle_config_path();
            Ok(())
        }
        Command::Version => {
            cli::handle_version();
            Ok(())
        }
    }
}
