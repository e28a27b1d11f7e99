//! Output formatting and persistence for grade reports.
//!
//! Supports pretty-printing, JSON serialization, CSV append and SVG files.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};

use crate::analyzers::types::{CellResult, GradeReport};
use crate::chart::{PyramidChart, render_svg};
use csv::WriterBuilder;
use std::fs::OpenOptions;
use std::path::Path;

/// One CSV row per filled-in cell. `cohort_size` is set only on rows with a
/// rank.
#[derive(Debug, Serialize)]
pub struct CellRecord {
    pub calculated_at: DateTime<Utc>,
    pub term: &'static str,
    pub subject: &'static str,
    pub score: Option<f64>,
    pub five_level: Option<u8>,
    pub rank: Option<u32>,
    pub cohort_size: Option<u32>,
    pub percentile: Option<f64>,
    pub nine_level: Option<u8>,
}

impl CellRecord {
    fn from_cell(cell: &CellResult, cohort_size: Option<u32>, calculated_at: DateTime<Utc>) -> Self {
        Self {
            calculated_at,
            term: cell.term.key(),
            subject: cell.subject.key(),
            score: cell.score,
            five_level: cell.five_level.map(|g| g.get()),
            rank: cell.rank,
            cohort_size: cohort_size.filter(|_| cell.rank.is_some()),
            percentile: cell.percentile,
            nine_level: cell.nine_level.map(|g| g.get()),
        }
    }
}

/// Logs a report using Rust's debug pretty-print format.
pub fn print_pretty(report: &GradeReport) {
    debug!("{:#?}", report);
}

/// Logs any serializable result as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Appends one [`CellRecord`] row per cell of `report` that has a score or a
/// rank; cells with neither are skipped. Returns the number of rows written.
///
/// Writes the header row only while the file is missing or empty.
pub fn append_records(path: &str, report: &GradeReport) -> Result<usize> {
    let has_content = Path::new(path).metadata().is_ok_and(|m| m.len() > 0);
    debug!(path, has_content, "Appending CSV records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!has_content) // IMPORTANT when appending
        .from_writer(file);

    let now = Utc::now();
    let mut written = 0;
    for cell in report
        .cells
        .iter()
        .filter(|c| c.score.is_some() || c.rank.is_some())
    {
        writer.serialize(CellRecord::from_cell(cell, report.cohort_size, now))?;
        written += 1;
    }
    writer.flush()?;

    Ok(written)
}

/// Renders `chart` and writes it to `path`.
pub fn write_svg(path: &str, chart: &PyramidChart) -> Result<()> {
    std::fs::write(path, render_svg(chart)).with_context(|| format!("cannot write {path}"))?;
    info!(path, marker = chart.has_marker(), "Chart written");
    Ok(())
}
