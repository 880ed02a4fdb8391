use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    candidate_from_path, AnalysisSession, AnalyzerBackend, HttpAnalyzer, MissingAnalyzerBackend,
    ProgressSchedule, SessionError, SessionOptions,
};
use shared::{domain::ADVERTISED_MAX_UPLOAD_BYTES, report::AnalysisReport};
use tokio::sync::broadcast::error::TryRecvError;
use tracing_subscriber::EnvFilter;

mod config;
mod display;

use config::{load_settings, Settings};

#[derive(Parser, Debug)]
#[command(
    name = "ipo_analyser",
    version,
    about = "Send an IPO prospectus (RHP) PDF for remote analysis"
)]
struct Cli {
    #[arg(long, global = true, help = "Analyzer endpoint URL")]
    server_url: Option<String>,
    #[arg(long, global = true, help = "Give up on the analyzer after this many seconds")]
    timeout_secs: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upload a PDF and print the analysis.
    Analyze {
        path: PathBuf,
        #[arg(long, help = "Save the report as JSON after a successful analysis")]
        export: bool,
        #[arg(long)]
        export_dir: Option<PathBuf>,
        #[arg(long, help = "Print the analyzer's JSON document instead of a summary")]
        json: bool,
        #[arg(long, help = "Shorten the progress animation")]
        fast_progress: bool,
        #[arg(long, help = "Reject files over the size limit (default 50 MB)")]
        enforce_size_limit: bool,
    },
    /// Check whether a file would be accepted, without uploading it.
    Check {
        path: PathBuf,
        #[arg(long)]
        enforce_size_limit: bool,
    },
    /// Print the summary of a previously exported report.
    Summarize {
        report: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut settings = load_settings();
    if let Some(url) = cli.server_url {
        settings.analyzer_url = url;
    }
    if let Some(secs) = cli.timeout_secs {
        settings.request_timeout_secs = Some(secs);
    }

    match cli.command {
        Commands::Analyze {
            path,
            export,
            export_dir,
            json,
            fast_progress,
            enforce_size_limit,
        } => {
            let schedule = if fast_progress {
                ProgressSchedule::default().scaled(0.1)
            } else {
                ProgressSchedule::default()
            };
            let session = build_session(&settings, schedule, enforce_size_limit)?;
            select(&session, &path).await?;

            let report = match submit_with_progress(&session).await {
                Ok(report) => report,
                Err(err) => bail!("{}", err.user_message()),
            };

            if json {
                println!("{}", report.to_pretty_json()?);
            } else {
                println!("{}", display::render_summary(report.result()));
            }

            if export {
                let dir = export_dir.unwrap_or_else(|| settings.export_dir.clone());
                if let Some(report) = session.export_report().await? {
                    let saved = report.save_in(&dir).await?;
                    println!("report saved to {}", saved.display());
                }
            }
        }
        Commands::Check {
            path,
            enforce_size_limit,
        } => {
            let session =
                build_session(&settings, ProgressSchedule::instant(), enforce_size_limit)?;
            select(&session, &path).await?;
            println!(
                "accepted {}",
                session.candidate_name().await.unwrap_or_default()
            );
        }
        Commands::Summarize { report } => {
            let raw = tokio::fs::read(&report)
                .await
                .with_context(|| format!("failed to read '{}'", report.display()))?;
            let parsed = AnalysisReport::from_json_slice(&raw)
                .with_context(|| format!("'{}' is not an analysis report", report.display()))?;
            println!("{}", display::render_summary(parsed.result()));
        }
    }

    Ok(())
}

fn build_session(
    settings: &Settings,
    schedule: ProgressSchedule,
    enforce_size_limit: bool,
) -> Result<AnalysisSession> {
    let backend: Arc<dyn AnalyzerBackend> = if settings.analyzer_url.trim().is_empty() {
        Arc::new(MissingAnalyzerBackend)
    } else {
        Arc::new(HttpAnalyzer::with_timeout(
            &settings.analyzer_url,
            settings.request_timeout(),
        )?)
    };
    let max_upload_bytes = match (settings.max_upload_bytes, enforce_size_limit) {
        (Some(limit), _) => Some(limit),
        (None, true) => Some(ADVERTISED_MAX_UPLOAD_BYTES),
        (None, false) => None,
    };
    Ok(AnalysisSession::new(
        backend,
        SessionOptions {
            schedule,
            max_upload_bytes,
        },
    ))
}

async fn select(session: &AnalysisSession, path: &Path) -> Result<()> {
    let candidate = candidate_from_path(path).await?;
    if let Err(err) = session.select_candidate(candidate).await {
        bail!("{}", err.user_message());
    }
    Ok(())
}

/// Runs the submission while echoing progress updates to stderr.
async fn submit_with_progress(session: &AnalysisSession) -> Result<AnalysisReport, SessionError> {
    let mut updates = session.progress().subscribe();
    let submit = session.submit();
    tokio::pin!(submit);

    let outcome = loop {
        tokio::select! {
            outcome = &mut submit => break outcome,
            Ok(update) = updates.recv() => eprintln!("{}", display::progress_line(&update)),
        }
    };

    loop {
        match updates.try_recv() {
            Ok(update) => eprintln!("{}", display::progress_line(&update)),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    outcome
}
