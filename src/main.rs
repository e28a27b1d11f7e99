//! CLI entry point for the grade pyramid tool.
//!
//! Provides subcommands for grading a score sheet, producing the cleared
//! state, and printing an empty input template.

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use grade_pyramid::analyzers::analyzer::{Calculation, calculate, reset};
use grade_pyramid::analyzers::types::{GradeReport, all_cells};
use grade_pyramid::analyzers::validate::SUMMARY_MESSAGE;
use grade_pyramid::{
    output::{append_records, print_json, print_pretty, write_svg},
    parser::load_sheet,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "grade_pyramid")]
#[command(about = "Convert scores and class ranks into 5-level and 9-level grades", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Grade a score sheet read from a JSON or CSV file
    Calculate {
        /// Score sheet (.json, or .csv with a term,subject,score,rank header)
        #[arg(short, long, value_name = "FILE")]
        input: PathBuf,

        /// Total number of students; overrides the value in the file
        #[arg(short = 'n', long)]
        cohort_size: Option<String>,

        /// Write the pyramid chart as SVG
        #[arg(long, value_name = "FILE")]
        svg: Option<String>,

        /// CSV file to append per-subject results to
        #[arg(long, value_name = "FILE")]
        csv: Option<String>,

        /// Log the full result as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Produce the cleared state: no results and an empty chart
    Reset {
        /// Write the empty pyramid chart as SVG
        #[arg(long, value_name = "FILE")]
        svg: Option<String>,

        /// Log the cleared state as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print an empty JSON score sheet to fill in
    Template,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/grade_pyramid.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("grade_pyramid.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Calculate {
            input,
            cohort_size,
            svg,
            csv,
            json,
        } => {
            let raw = load_sheet(&input, cohort_size.as_deref())?;
            let calculation = calculate(&raw);

            if json {
                print_json(&calculation)?;
            }
            if let Some(path) = &svg {
                write_svg(path, calculation.chart())?;
            }

            match &calculation {
                Calculation::Rejected { validation, .. } => {
                    for (field, issue) in validation.issues() {
                        warn!(field = %field, kind = ?issue.kind(), "{issue}");
                    }
                    for field in validation.unchecked() {
                        info!(field = %field, "Rank not checked until the cohort size is valid");
                    }
                    bail!(SUMMARY_MESSAGE);
                }
                Calculation::Completed(report) => {
                    log_report(report);
                    print_pretty(report);

                    if let Some(path) = &csv {
                        let rows = append_records(path, report)?;
                        info!(path, rows, "Results appended");
                    }
                }
            }
        }
        Commands::Reset { svg, json } => {
            let state = reset();
            if json {
                print_json(&state)?;
            }
            if let Some(path) = &svg {
                write_svg(path, &state.report.chart)?;
            }
            info!(status = %state.report.chart.status, "Cleared");
        }
        Commands::Template => {
            let cells: Vec<_> = all_cells()
                .map(|(term, subject)| {
                    serde_json::json!({
                        "term": term,
                        "subject": subject,
                        "score": "",
                        "rank": "",
                    })
                })
                .collect();
            let template = serde_json::json!({ "cohort_size": "", "cells": cells });
            println!("{}", serde_json::to_string_pretty(&template)?);
        }
    }

    Ok(())
}

/// Logs one line per filled-in subject and the term and overall summaries.
fn log_report(report: &GradeReport) {
    for cell in report
        .cells
        .iter()
        .filter(|c| c.score.is_some() || c.rank.is_some())
    {
        info!(
            term = cell.term.label(),
            subject = cell.subject.label(),
            score = ?cell.score,
            five_level = ?cell.five_level.map(|g| g.get()),
            rank = ?cell.rank,
            percentile = ?cell.percentile.map(|p| format!("{p:.2}")),
            nine_level = ?cell.nine_level.map(|g| g.get()),
            "Subject result"
        );
    }

    for summary in &report.terms {
        let agg = &summary.aggregate;
        info!(
            term = summary.term.label(),
            mean_score = ?agg.mean_score.map(|s| format!("{s:.2}")),
            mean_percentile = ?agg.mean_percentile.map(|p| format!("{p:.2}")),
            "Term summary"
        );
    }

    let overall = &report.overall;
    info!(
        mean_score = ?overall.mean_score.map(|s| format!("{s:.2}")),
        five_level = ?overall.five_level.map(|g| g.get()),
        mean_percentile = ?overall.mean_percentile.map(|p| format!("{p:.2}")),
        nine_level = ?overall.nine_level.map(|g| g.get()),
        "Overall result"
    );
    info!("{}", report.chart.status);
}
