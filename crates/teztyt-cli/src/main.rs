//! teztyt CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "teztyt",
    version,
    about = "Randomized multiple-choice exam generator and grader"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a batch of tests and their solution file
    Gen {
        /// Config file path
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Number of tests to generate; 0 builds one test from an id-list selection
        #[arg(long, short = 'n')]
        number: u32,

        /// Problem files (.json, .toml or .yaml), in selection order
        #[arg(long, short = 'f', num_args = 1.., required = true)]
        files: Vec<PathBuf>,

        /// Per-file selection as JSON: counts like `[2, 1]` or id lists like `[["a1"], ["b2"]]`
        #[arg(long, short = 'p')]
        problems: String,

        /// Output directory
        #[arg(long, short = 'o', default_value = "./teztyt-out")]
        out: PathBuf,

        /// Also merge the generated forms into this registry file
        #[arg(long, short = 'm')]
        merge: Option<PathBuf>,

        /// Seed for reproducible batches (overrides the config)
        #[arg(long, short = 's')]
        seed: Option<u64>,
    },

    /// Score completed answer documents
    Eval {
        /// Config file path
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Solution file written by `gen`
        #[arg(long, short = 's')]
        solutions: PathBuf,

        /// Directory of completed field dumps
        #[arg(long, short = 'd')]
        dir: PathBuf,

        /// Output directory for reports
        #[arg(long, short = 'o', default_value = "./teztyt-results")]
        out: PathBuf,

        /// Output format: json, html, all
        #[arg(long, default_value = "json")]
        format: String,
    },

    /// Merge the form registries of generated tests
    Merge {
        /// Config file path
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Directory holding the `.form.json` sidecars
        #[arg(long, short = 'd')]
        dir: PathBuf,

        /// Merged registry output file
        #[arg(long, short = 'o')]
        out: PathBuf,
    },

    /// Validate problem files
    Validate {
        /// Config file path
        #[arg(long, short = 'c')]
        config: Option<PathBuf>,

        /// Problem files to check
        #[arg(long, short = 'f', num_args = 1.., required = true)]
        files: Vec<PathBuf>,
    },

    /// Create a starter config and sample problem file
    Init,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("teztyt=info")),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Gen {
            config,
            number,
            files,
            problems,
            out,
            merge,
            seed,
        } => commands::gen::execute(config, number, files, problems, out, merge, seed).await,
        Commands::Eval {
            config,
            solutions,
            dir,
            out,
            format,
        } => commands::eval::execute(config, solutions, dir, out, format),
        Commands::Merge { config, dir, out } => commands::merge::execute(config, dir, out),
        Commands::Validate { config, files } => commands::validate::execute(config, files),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
