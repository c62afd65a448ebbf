mod commands;
mod output;

use clap::{Parser, Subcommand};
use commands::{EngineArgs, InputArgs};
use std::path::PathBuf;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(
    name = "tribac",
    version,
    about = "Sorts product packaging into household recycling bins"
)]
struct Cli {
    /// Log classification decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify products given as flags or in a JSON file
    Classify {
        #[command(flatten)]
        input: InputArgs,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Show the score ranking and decision steps behind a classification
    Explain {
        #[command(flatten)]
        input: InputArgs,

        /// Output format: table (default) or json
        #[arg(short, long, default_value = "table")]
        output: String,
    },
    /// Inspect and validate classification tables
    Rules {
        #[command(subcommand)]
        action: RulesAction,
    },
}

#[derive(Subcommand)]
enum RulesAction {
    /// List the sorting bins
    List {
        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Show keywords and materials for one bin
    Explain {
        /// Bin label or color (e.g. "glass", "yellow")
        bin: String,

        #[command(flatten)]
        engine: EngineArgs,
    },
    /// Validate a custom tables file
    Validate {
        /// Path to JSON tables file
        file: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "tribac=debug" } else { "tribac=warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Classify { input, output } => commands::classify::run(&input, &output),
        Commands::Explain { input, output } => commands::explain::run(&input, &output),
        Commands::Rules { action } => match action {
            RulesAction::List { engine } => commands::rules::list(&engine),
            RulesAction::Explain { bin, engine } => commands::rules::explain(&bin, &engine),
            RulesAction::Validate { file } => commands::rules::validate(&file),
        },
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
