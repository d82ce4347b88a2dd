//! Content pipeline CLI
//!
//! Fetches posts from WebDAV and builds the static content index.

use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use content_pipeline::{
    error::Result,
    models::{Config, PostsIndex},
    pipeline,
};

/// Static blog content pipeline
#[derive(Parser, Debug)]
#[command(
    name = "content-pipeline",
    version,
    about = "Mirror Markdown posts from WebDAV and publish a content index"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "content-pipeline.toml")]
    config: PathBuf,

    /// Project root; overrides `paths.root`
    #[arg(short, long)]
    root: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Mirror remote posts into the local posts directory
    Fetch,

    /// Validate local posts and publish the content index
    Generate,

    /// Run full pipeline: Fetch → Generate
    Build {
        /// Skip fetching, index the existing local posts
        #[arg(long)]
        skip_fetch: bool,
    },

    /// Validate local posts without writing anything
    Check,

    /// Verify the remote posts collection is reachable
    CheckRemote,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = if cli.config.exists() {
        let config = Config::load(&cli.config)?;
        log::info!("Loaded configuration from {}", cli.config.display());
        config
    } else {
        log::debug!("No config file at {}, using defaults", cli.config.display());
        Config::default()
    };

    config.apply_env(|name| std::env::var(name).ok());
    if let Some(root) = &cli.root {
        config.paths.root = root.clone();
    }
    config.validate()?;
    Ok(config)
}

fn report_index(index: &PostsIndex) {
    log::info!("{} post(s) indexed", index.posts.len());
    if let Some(latest) = index.posts.first() {
        log::info!("Latest: {} ({})", latest.title, latest.created_at);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    match cli.command {
        Command::Fetch => {
            pipeline::run_fetch(&config).await?;
        }

        Command::Generate => {
            let index = pipeline::run_generate(&config).await?;
            report_index(&index);
        }

        Command::Build { skip_fetch } => {
            let index = pipeline::run_pipeline(&config, skip_fetch).await?;
            report_index(&index);
        }

        Command::Check => {
            pipeline::run_check(&config).await?;
        }

        Command::CheckRemote => {
            pipeline::check_remote(&config).await?;
        }
    }

    Ok(())
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => {
            log::info!("Done!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{e}");
            let mut source = e.source();
            while let Some(cause) = source {
                log::error!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
