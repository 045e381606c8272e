use clap::{Parser, Subcommand};
use log::{debug, info};
use std::path::PathBuf;
use std::process::ExitCode;

use image_saver_core::store::ContentStore;
use image_saver_core::{logging, Config, ImageRecord, ImageSaver, LogLevel, Outcome};

/// Exit code for failures before any image was handled: config, logging or client setup
const SETUP_FAILURE: u8 = 4;

#[derive(Parser)]
#[command(name = "image-saver")]
#[command(about = "Fetch a remote image and store it once by content")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding stored images
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,

    /// Network timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Endpoint listing candidate images
    #[arg(long, global = true)]
    source_url: Option<String>,

    /// Verbosity level
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask the image source for an image and save the first one listed
    Fetch,

    /// Save the image at a given URL
    Save {
        /// Image URL
        url: String,

        /// Identifier used in log messages
        #[arg(long, default_value = "manual")]
        id: String,
    },

    /// List stored images
    List,

    /// Generate default configuration file
    GenerateConfig {
        /// Path to save configuration file
        #[arg(default_value = "image-saver.json")]
        path: PathBuf,
    },
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };

    // Override config with command line arguments
    if let Some(store_dir) = &cli.store_dir {
        config.store_dir = store_dir.clone();
    }
    if let Some(timeout) = cli.timeout {
        config.fetch_timeout_secs = timeout;
    }
    if let Some(source_url) = &cli.source_url {
        config.source_url = source_url.clone();
    }
    match cli.verbose {
        0 => {}
        1 => config.log_level = LogLevel::Debug,
        _ => config.log_level = LogLevel::Trace,
    }

    config.validate()?;
    Ok(config)
}

fn init_logging(config: &Config) -> anyhow::Result<()> {
    match &config.log_dir {
        Some(log_dir) => logging::init_logger(log_dir, config.log_level.into())
            .map_err(|e| anyhow::anyhow!("Failed to initialize file logging: {}", e)),
        None => {
            env_logger::Builder::new()
                .filter_level(config.log_level.into())
                .parse_env(logging::LOG_ENV)
                .init();
            Ok(())
        }
    }
}

fn report(outcome: &Outcome) -> u8 {
    if outcome.is_success() {
        println!("{}", outcome);
    } else {
        eprintln!("{}", outcome);
    }
    outcome.exit_code() as u8
}

/// Load configuration, start logging and build the saver
fn setup(cli: &Cli) -> anyhow::Result<ImageSaver> {
    let config = load_config(cli)?;
    init_logging(&config)?;
    debug!("Using configuration: {:?}", config);
    Ok(ImageSaver::new(&config)?)
}

fn list(store: &ContentStore) -> u8 {
    let artifacts = match store.ensure_ready().and_then(|()| store.artifacts()) {
        Ok(artifacts) => artifacts,
        Err(e) => return report(&Outcome::StorageError(e)),
    };

    for artifact in &artifacts {
        let note = if artifact.is_canonical() {
            ""
        } else {
            "  (name does not match content)"
        };
        println!("{}  {} bytes{}", artifact.file_name(), artifact.size, note);
    }
    println!("{} images in {}", artifacts.len(), store.root().display());
    0
}

fn run(cli: &Cli) -> anyhow::Result<u8> {
    match &cli.command {
        Commands::GenerateConfig { path } => {
            let config = Config::default();
            config.save_to_file(path)?;
            println!("Configuration file generated at: {}", path.display());
            Ok(0)
        }

        Commands::Fetch => {
            let saver = setup(cli)?;
            info!("Starting image fetch...");
            Ok(report(&saver.run()))
        }

        Commands::Save { url, id } => {
            let saver = setup(cli)?;
            let record = ImageRecord::new(id.as_str(), url.as_str());
            Ok(report(&saver.save(&record)))
        }

        Commands::List => Ok(list(setup(cli)?.store())),
    }
}

/// Exit status for a finished run; errors raised before any outcome get their own code
fn exit_status(result: anyhow::Result<u8>) -> u8 {
    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            SETUP_FAILURE
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    ExitCode::from(exit_status(run(&cli)))
}
