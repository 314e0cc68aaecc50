//! wcprobe command line.
//!
//! Measures how write-concern levels affect when each replica member sees a
//! write.
//!
//! # Quick Start
//!
//! ```bash
//! # Write a default wcprobe.toml
//! wcprobe init .
//!
//! # Run every scenario against the simulated replica set
//! wcprobe run
//!
//! # Same run with verbose narration and reproducible filler
//! RUST_LOG=debug wcprobe run --seed 42
//! ```

mod commands;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;
use wcprobe_config::ProbeConfig;

/// wcprobe - observe write propagation across replica set members.
#[derive(Parser)]
#[command(name = "wcprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version information.
    Version,

    /// Write a default wcprobe.toml into a project directory.
    Init {
        /// Project directory (created if missing).
        #[arg(default_value = ".")]
        path: String,
    },

    /// Run every configured scenario and report what each member observed.
    Run {
        /// Project directory containing wcprobe.toml.
        #[arg(short, long, default_value = ".")]
        project: String,

        /// Seed for reproducible filler documents.
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Configuration commands.
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Print values from the filler generator.
    Random {
        /// Seed; omit to draw from OS entropy.
        #[arg(long)]
        seed: Option<u64>,

        /// Modulus of the seeded recurrence.
        #[arg(long, requires = "seed")]
        prime: Option<u64>,

        /// Number of values to print.
        #[arg(short = 'n', long, default_value = "5")]
        count: usize,

        /// String length; omit for a random length below 10.
        #[arg(short, long)]
        length: Option<usize>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the merged configuration.
    Show {
        /// Project directory.
        #[arg(short, long, default_value = ".")]
        project: String,

        /// Output format.
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Validate the merged configuration.
    Validate {
        /// Project directory.
        #[arg(short, long, default_value = ".")]
        project: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Toml,
    Json,
}

fn init_logging(directive: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // `run` logs at the configured level, so its configuration loads first.
    let run_config = match &cli.command {
        Commands::Run { project, .. } => {
            Some(ProbeConfig::load_from_dir(project).context("Failed to load configuration")?)
        }
        _ => None,
    };
    init_logging(run_config.as_ref().map_or("info", |c| c.logging.directive()));

    match cli.command {
        Commands::Version => {
            commands::version::run();
            Ok(())
        }
        Commands::Init { path } => commands::init::run(&path),
        Commands::Run { seed, .. } => {
            let config = run_config.context("Configuration was not loaded")?;
            commands::run::run(config, seed)
        }
        Commands::Config(cmd) => match cmd {
            ConfigCommands::Show { project, format } => {
                commands::config::show(&project, format.into())
            }
            ConfigCommands::Validate { project } => commands::config::validate(&project),
        },
        Commands::Random {
            seed,
            prime,
            count,
            length,
        } => {
            commands::random::run(seed, prime, count, length);
            Ok(())
        }
    }
}

impl From<OutputFormat> for commands::config::Format {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => commands::config::Format::Text,
            OutputFormat::Toml => commands::config::Format::Toml,
            OutputFormat::Json => commands::config::Format::Json,
        }
    }
}
