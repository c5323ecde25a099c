use clap::{ArgAction, Parser, Subcommand};
use color_eyre::eyre::eyre;
use moviedb_config::{Config, LoggingConfig, PathManager};
use std::path::PathBuf;

mod commands;
mod http;
mod logging;
mod output;

#[derive(Parser)]
#[command(name = "moviedb")]
#[command(about = "MovieDB - movie catalog and review backend")]
#[command(version)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Output format
    #[arg(long, global = true, default_value = "human", value_enum)]
    output: output::OutputFormat,

    /// Configuration file (credentials.toml is read from the same directory)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the REST API
    #[command(long_about = "Serve the movie catalog REST API. Movies, reviews and movie requests are stored in MongoDB unless --in-memory is given.")]
    Serve {
        /// Address to bind (overrides server.bind)
        #[arg(long)]
        bind: Option<String>,

        /// Port to listen on (overrides server.port and PORT)
        #[arg(long)]
        port: Option<u16>,

        /// Keep all data in memory instead of MongoDB (lost on exit)
        #[arg(long, action = ArgAction::SetTrue)]
        in_memory: bool,
    },
    /// Delete duplicated movies from the catalog
    #[command(long_about = "Group movies by full plot and delete every extra copy of groups that share a single title and year. The oldest copy is kept.")]
    Dedupe,
    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration (masks secrets)
    Show {
        /// Show secrets unmasked
        #[arg(long, action = ArgAction::SetTrue)]
        full: bool,
    },
    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long, action = ArgAction::SetTrue)]
        force: bool,
    },
}

fn load_config(paths: &PathManager) -> color_eyre::Result<Config> {
    let config_file = paths.config_file();
    Config::load(&config_file, &paths.credentials_file())
        .map_err(|e| eyre!("Failed to load config from {}: {}", config_file.display(), e))
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let output = output::Output::new(cli.output, cli.quiet);
    let paths = match &cli.config {
        Some(path) => PathManager::from_config_file(path),
        None => PathManager::default(),
    };

    match cli.command {
        Commands::Serve { bind, port, in_memory } => {
            let config = load_config(&paths)?;
            logging::init_logging(cli.verbose, cli.quiet, &config.logging).map_err(|e| eyre!("{}", e))?;
            let options = commands::serve::ServeOptions { bind, port, in_memory };
            commands::serve::run_serve(config, options).await
        }
        Commands::Dedupe => {
            let config = load_config(&paths)?;
            logging::init_logging(cli.verbose, cli.quiet, &config.logging).map_err(|e| eyre!("{}", e))?;
            commands::dedupe::run_dedupe(&config, &output).await
        }
        Commands::Config { cmd } => {
            logging::init_logging(cli.verbose, cli.quiet, &LoggingConfig::default()).map_err(|e| eyre!("{}", e))?;
            commands::config::run_config(cmd, &paths, &output)
        }
    }
}
