mod commands;
mod output;
mod pool;

use clap::{Parser, Subcommand};
use commands::extract::{ExtractArgs, ExtractPdfArgs};
use commands::redact::RedactArgs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "abscrub",
    version,
    about = "Word-level text extraction and abstract removal for PDF corpora"
)]
struct Cli {
    /// Show debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert a directory of layout markup files into word files
    Extract(ExtractArgs),
    /// Run pdftotext on one PDF and print its word file
    ExtractPdf(ExtractPdfArgs),
    /// Remove known abstracts from a directory of word files
    Redact(RedactArgs),
    /// Print the page count of a word file and the pages searched for abstracts
    Pages {
        /// Path to a word file
        word_file: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let result = match cli.command {
        Commands::Extract(args) => commands::extract::run(args),
        Commands::ExtractPdf(args) => commands::extract::run_pdf(args),
        Commands::Redact(args) => commands::redact::run(args),
        Commands::Pages { word_file } => commands::pages::run(&word_file),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
