//! adaptest CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "adaptest", version, about = "IRT-driven adaptive assessment engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take an adaptive assessment interactively
    Take {
        /// Path to .toml item bank
        #[arg(long)]
        bank: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write a JSON session report here
        #[arg(long)]
        output: Option<PathBuf>,

        /// Write the bank with recalibrated item parameters here
        #[arg(long)]
        calibrate_out: Option<PathBuf>,
    },

    /// Simulate sessions for known abilities and report estimate recovery
    Simulate {
        /// Path to .toml item bank
        #[arg(long)]
        bank: PathBuf,

        /// True abilities to simulate (comma-separated)
        #[arg(long, default_value = "-2,-1,0,1,2", allow_hyphen_values = true)]
        thetas: String,

        /// Sessions per ability
        #[arg(long, default_value = "100")]
        replications: usize,

        /// RNG seed
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write a JSON simulation report here
        #[arg(long)]
        output: Option<PathBuf>,
    },

    /// Show the score and band for an ability estimate
    Score {
        /// Ability estimate
        #[arg(long, allow_hyphen_values = true)]
        theta: f64,

        /// Confidence in [0, 1]
        #[arg(long, default_value = "0.0")]
        confidence: f64,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate item bank TOML files
    Validate {
        /// Path to item bank file or directory
        #[arg(long)]
        bank: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and example item bank
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("adaptest=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Take {
            bank,
            config,
            output,
            calibrate_out,
        } => commands::take::execute(bank, config, output, calibrate_out).await,
        Commands::Simulate {
            bank,
            thetas,
            replications,
            seed,
            config,
            output,
        } => commands::simulate::execute(bank, thetas, replications, seed, config, output),
        Commands::Score {
            theta,
            confidence,
            config,
        } => commands::score::execute(theta, confidence, config),
        Commands::Validate { bank, config } => commands::validate::execute(bank, config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
