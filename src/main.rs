use std::{path::PathBuf, process};

use clap::{Args, Parser, Subcommand};
use mailroom::{
    app,
    config::{BotConfig, ConfigManager, EnvConfigManager},
    constants::Emojis,
    logger::init_tracing,
    sync::SyncTarget,
};
use tracing::{error, info};

#[derive(Parser, Debug)]
#[command(
    name = "mailroom",
    about = "Record chat replies and send them back to email threads",
    version
)]
struct Cli {
    /// File to seed the environment from
    #[arg(long, global = true, default_value = ".env")]
    env_file: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Connect to the chat platform and serve interactions (default)
    Run,

    /// Publish the command set, globally or to one guild
    Sync {
        /// A guild ID, or "global"
        target: Option<String>,
    },

    /// Inspect or edit channel to email thread links
    Threads(ThreadsArgs),
}

#[derive(Args, Debug)]
struct ThreadsArgs {
    #[command(subcommand)]
    command: ThreadsCommands,
}

#[derive(Subcommand, Debug)]
enum ThreadsCommands {
    List,
    Link { channel_id: String, thread_id: String },
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let command = cli.command.unwrap_or(Commands::Run);

    // reject a bad sync target before touching configuration or the network
    let sync_target = match &command {
        Commands::Sync { target } => match SyncTarget::parse(target.as_deref()) {
            Ok(target) => Some(target),
            Err(err) => {
                eprintln!("{err}");
                process::exit(1);
            }
        },
        _ => None,
    };

    let config_manager = ConfigManager(EnvConfigManager::new(cli.env_file));
    let config = match BotConfig::load(&config_manager).await {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    };

    let log_file = match command {
        Commands::Run => "mailroom.log",
        _ => "mailroom-cli.log",
    };
    init_tracing(&config.log_dir, log_file, "mailroom-events.json", &config.log_level)?;
    info!(source = ?config_manager, ?config, "configuration loaded");

    match command {
        Commands::Run => {
            if let Err(err) = app::run(&config).await {
                error!("mailroom stopped: {err:#}");
                return Err(err);
            }
            Ok(())
        }
        Commands::Sync { .. } => {
            let target = sync_target.unwrap_or_default();
            let count = app::sync(&config, target).await?;
            println!("{} Synced {count} commands ({target}).", Emojis::CHECK);
            Ok(())
        }
        Commands::Threads(args) => match args.command {
            ThreadsCommands::List => {
                let threads = app::list_threads(&config).await?;
                if threads.is_empty() {
                    println!("No linked email threads.");
                }
                for thread in threads {
                    let recording = thread.recording_message_id.as_deref().unwrap_or("-");
                    println!("{}\t{}\t{}", thread.channel_id, thread.thread_id, recording);
                }
                Ok(())
            }
            ThreadsCommands::Link { channel_id, thread_id } => {
                app::link_thread(&config, &channel_id, &thread_id).await?;
                println!(
                    "{} Channel {channel_id} linked to email thread {thread_id}.",
                    Emojis::CHECK
                );
                Ok(())
            }
        },
    }
}
