pub mod ping;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use ping::process_ping_command;
use tracing::level_filters::LevelFilter;

use crate::{
    config::{ConnectionArgs, PresenceConfig},
    daemon::start_daemon,
    utils::{
        dir::{create_application_default_path, ensure_dir},
        logging::{enable_logging, PING_PREFIX, SERVE_PREFIX},
    },
};

#[derive(Parser, Debug)]
#[command(name = "activity-ping", version, long_about = None)]
#[command(
    about = "Tells the chat server you are around whenever you use your computer",
    long_about = None
)]
struct Args {
    #[command(subcommand)]
    commands: Commands,
    #[arg(long, global = true, help = "Enable trace logging to the console")]
    log: bool,
    #[arg(
        long = "log-filter",
        global = true,
        help = "Log level for both the console and the log files"
    )]
    log_filter: Option<LevelFilter>,
    #[arg(
        long,
        global = true,
        help = "Application directory. By default tries to save into $XDG_STATE_HOME or $HOME/.local/state"
    )]
    dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Watch for user activity and report presence until interrupted")]
    Serve {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
    #[command(about = "Send a single connected ping now and print the response")]
    Ping {
        #[command(flatten)]
        connection: ConnectionArgs,
    },
}

pub async fn run_cli() -> Result<()> {
    let args = Args::parse();

    let app_dir = args
        .dir
        .map_or_else(create_application_default_path, ensure_dir)?;

    let logging_level = if args.log {
        Some(LevelFilter::TRACE)
    } else {
        args.log_filter
    };
    let prefix = match args.commands {
        Commands::Serve { .. } => SERVE_PREFIX,
        Commands::Ping { .. } => PING_PREFIX,
    };
    enable_logging(prefix, &app_dir.join("logs"), logging_level, args.log)?;

    match args.commands {
        Commands::Serve { connection } => {
            let config = PresenceConfig::resolve(&connection, &app_dir)?;
            start_daemon(config).await
        }
        Commands::Ping { connection } => {
            let config = PresenceConfig::resolve(&connection, &app_dir)?;
            let response = process_ping_command(&config).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::{Args, Commands};

    #[test]
    fn cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn serve_accepts_connection_flags() {
        let args = Args::try_parse_from([
            "activity-ping",
            "serve",
            "--server-url",
            "https://chat.example.com",
            "--plugin-id",
            "my.plugin",
            "--log",
        ])
        .unwrap();

        assert!(args.log);
        match args.commands {
            Commands::Serve { connection } => {
                assert_eq!(connection.server_url.as_deref(), Some("https://chat.example.com"));
                assert_eq!(connection.plugin_id.as_deref(), Some("my.plugin"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
