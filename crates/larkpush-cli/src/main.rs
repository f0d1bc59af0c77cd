//! larkpush CLI - publish-directory uploader for Lark Drive
//!
//! Scans a local root for publish directories, diffs their files against
//! the upload history, and transfers new or changed files into the
//! configured remote folder. Supports dry runs, forced re-uploads, a
//! concurrent transfer pool, and replaying the failure manifest left by
//! a previous run.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod output;
mod run;

use output::{get_formatter, OutputFormat};

#[derive(Debug, Parser)]
#[command(
    name = "larkpush",
    version,
    about = "Upload publish directories to Lark Drive"
)]
pub struct Cli {
    /// Local root directory to scan for publish folders
    pub root: PathBuf,

    /// Diff and list what would be uploaded, without transferring
    #[arg(long)]
    pub dry_run: bool,

    /// Upload every file regardless of the upload history
    #[arg(long)]
    pub force: bool,

    /// Use the configured worker pool instead of uploading serially
    #[arg(long)]
    pub concurrent: bool,

    /// Replay the failed uploads recorded by the previous run
    #[arg(long)]
    pub retry: bool,

    /// Ignore any configured proxy for this run
    #[arg(long)]
    pub skip_proxy: bool,

    /// Output the run report as JSON
    #[arg(long)]
    pub json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Use an alternate config file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup tracing. Logs go to stderr so --json output stays parseable.
    let filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };

    match run::execute(cli, format).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            get_formatter(format.is_json()).error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
