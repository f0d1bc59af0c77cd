//! Run wiring
//!
//! Loads configuration, validates it, builds the drive provider and the
//! upload engine, installs the shutdown handler, then runs once and
//! renders the resulting report.
//!
//! Per-file failures are part of a normal run: they are rendered and the
//! process still exits zero. Only configuration problems, failed
//! authentication, and a missing retry manifest bubble up as errors.

use std::sync::Arc;

use anyhow::{Context, Result};
use larkpush_core::config::{Config, ENV_APP_ID, ENV_APP_SECRET, ENV_PARENT_NODE};
use larkpush_core::domain::{FolderToken, RunReport, UploadError};
use larkpush_drive::provider::FeishuDriveProvider;
use larkpush_sync::history::HistoryStore;
use larkpush_sync::manifest::FailureManifest;
use larkpush_sync::{EngineOptions, PublishDirScanner, UploadEngine};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::output::{get_formatter, OutputFormat, OutputFormatter};
use crate::Cli;

/// Builds everything from the CLI arguments and runs the engine once.
pub async fn execute(cli: Cli, format: OutputFormat) -> Result<()> {
    let formatter = get_formatter(format.is_json());

    // Configuration: file first, environment wins.
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load_or_default(&config_path);
    config.apply_env_overrides();
    if cli.skip_proxy {
        config.proxy.bypass = true;
    }
    info!(config_path = %config_path.display(), "Loaded configuration");

    let problems = config.validate();
    if !problems.is_empty() {
        let joined = problems
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(UploadError::Configuration(joined).into());
    }

    let missing = config.missing_credentials();
    if !missing.is_empty() {
        return Err(UploadError::Configuration(format!(
            "missing {}; set them in {} or export {ENV_APP_ID}/{ENV_APP_SECRET}/{ENV_PARENT_NODE}",
            missing.join(", "),
            config_path.display(),
        ))
        .into());
    }

    let root = cli
        .root
        .canonicalize()
        .with_context(|| format!("cannot access root directory '{}'", cli.root.display()))?;
    if !root.is_dir() {
        return Err(UploadError::Configuration(format!(
            "root '{}' is not a directory",
            root.display()
        ))
        .into());
    }

    let parent_node = config
        .credentials
        .parent_node
        .clone()
        .ok_or_else(|| UploadError::Configuration("credentials.parent_node is not set".into()))?;
    let root_folder = FolderToken::new(parent_node)
        .context("credentials.parent_node is not a valid folder token")?;

    // State files live next to the scanned tree.
    let history = HistoryStore::load(root.join(&config.storage.history_file)).await;
    let manifest = FailureManifest::new(root.join(&config.storage.manifest_file));

    if cli.retry && !manifest.exists().await {
        return Err(anyhow::anyhow!(
            "no failure manifest at '{}', nothing to retry",
            manifest.path().display()
        ));
    }

    let provider = Arc::new(FeishuDriveProvider::from_config(&config)?);
    let scanner = Arc::new(PublishDirScanner::new());

    let options = EngineOptions {
        dry_run: cli.dry_run,
        force: cli.force,
        retry: cli.retry,
        workers: effective_workers(cli.concurrent, config.transfer.workers),
    };
    info!(
        root = %root.display(),
        workers = options.workers,
        dry_run = options.dry_run,
        force = options.force,
        retry = options.retry,
        "Starting upload run"
    );

    let engine = UploadEngine::new(provider, scanner, root_folder, history, manifest, options);

    // Ctrl+C / SIGTERM drain the run instead of killing it mid-transfer.
    let cancel = CancellationToken::new();
    tokio::spawn(shutdown_signal(cancel.clone()));

    let report = engine.run(&root, cancel).await?;
    render_report(&report, format, formatter.as_ref())
}

/// Serial unless `--concurrent` was given; the pool is then the
/// configured width.
fn effective_workers(concurrent: bool, configured: u32) -> usize {
    if concurrent {
        configured.max(1) as usize
    } else {
        1
    }
}

/// Cancels the token on SIGINT or SIGTERM.
async fn shutdown_signal(token: CancellationToken) {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT (Ctrl+C)"),
        _ = terminate => info!("Received SIGTERM"),
    }

    info!("Finishing in-flight uploads before exiting");
    token.cancel();
}

/// Renders the run report in the selected format.
fn render_report(report: &RunReport, format: OutputFormat, out: &dyn OutputFormatter) -> Result<()> {
    if format.is_json() {
        let value = serde_json::to_value(report)?;
        out.print_json(&value);
        return Ok(());
    }

    if report.dry_run {
        if report.planned.is_empty() {
            out.success("Nothing to upload, everything is current");
        } else {
            out.success(&format!(
                "Would upload {} file{}:",
                report.planned.len(),
                plural(report.planned.len())
            ));
            for task in &report.planned {
                out.info(&task.logical_key());
            }
        }
        if report.skipped > 0 {
            out.info(&format!(
                "Unchanged: {} file{}",
                report.skipped,
                plural(report.skipped)
            ));
        }
        return Ok(());
    }

    if report.cancelled {
        out.warn("Run cancelled, finished uploads were recorded");
    }

    if report.transferred == 0 && report.failed == 0 {
        out.success("Already up to date");
    } else {
        out.success(&format!(
            "Run finished in {}",
            fmt_duration(report.duration_ms())
        ));
    }

    if report.transferred > 0 {
        out.info(&format!(
            "Uploaded:  {} file{}",
            report.transferred,
            plural(report.transferred)
        ));
    }
    if report.skipped > 0 {
        out.info(&format!(
            "Unchanged: {} file{}",
            report.skipped,
            plural(report.skipped)
        ));
    }

    if report.failed > 0 {
        out.error(&format!(
            "{} upload{} failed:",
            report.failed,
            plural(report.failed)
        ));
        for err in &report.errors {
            out.info(&format!("- {err}"));
        }
        out.info("Run again with --retry to re-attempt the failed uploads");
    }

    Ok(())
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

fn fmt_duration(ms: i64) -> String {
    if ms >= 1000 {
        format!("{:.1}s", ms as f64 / 1000.0)
    } else {
        format!("{ms}ms")
    }
}

// ============================================================================
// Tests
// ============================================================================
