use serde::Serialize;
use tracing::{debug, info};

use crate::analyzers::aggregate::aggregate_sheet;
use crate::analyzers::types::{GradeReport, ScoreSheet};
use crate::analyzers::validate::{Validation, validate};
use crate::chart::geometry::{PyramidChart, pyramid};
use crate::parser::RawSheet;

/// Result of one calculate request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Calculation {
    /// Some field failed validation. Nothing was aggregated; the chart is the
    /// empty-state chart.
    Rejected {
        validation: Validation,
        chart: PyramidChart,
    },
    Completed(GradeReport),
}

impl Calculation {
    pub fn report(&self) -> Option<&GradeReport> {
        match self {
            Calculation::Completed(report) => Some(report),
            Calculation::Rejected { .. } => None,
        }
    }

    pub fn validation(&self) -> Option<&Validation> {
        match self {
            Calculation::Rejected { validation, .. } => Some(validation),
            Calculation::Completed(_) => None,
        }
    }

    pub fn chart(&self) -> &PyramidChart {
        match self {
            Calculation::Rejected { chart, .. } => chart,
            Calculation::Completed(report) => &report.chart,
        }
    }
}

fn build_report(sheet: &ScoreSheet) -> GradeReport {
    let (cells, terms, overall) = aggregate_sheet(sheet);
    let chart = pyramid(overall.mean_percentile);

    GradeReport {
        cohort_size: sheet.cohort_size(),
        cells,
        terms,
        overall,
        chart,
    }
}

/// Validates, aggregates and charts a raw sheet. Every call starts from
/// scratch; nothing from earlier calls is reused.
#[tracing::instrument(skip(raw), fields(cohort_size = %raw.cohort_size))]
pub fn calculate(raw: &RawSheet) -> Calculation {
    let sheet = match validate(raw) {
        Ok(sheet) => sheet,
        Err(validation) => {
            info!(
                errors = validation.issues().count(),
                "Calculation rejected by validation"
            );
            return Calculation::Rejected {
                validation,
                chart: pyramid(None),
            };
        }
    };

    let report = build_report(&sheet);
    debug!(
        scores = report.overall.score_count,
        percentiles = report.overall.percentile_count,
        mean_score = ?report.overall.mean_score,
        mean_percentile = ?report.overall.mean_percentile,
        "Calculation complete"
    );
    if let Some(grade) = report.overall.nine_level {
        debug!(grade = grade.get(), "Overall 9-level grade");
    }

    Calculation::Completed(report)
}

/// What a reset leaves behind. Replaces any earlier result wholesale.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResetState {
    pub report: GradeReport,
    pub validation: Validation,
}

/// The cleared state: every cell empty, no aggregates, the empty-state chart
/// and no field errors.
pub fn reset() -> ResetState {
    debug!("Resetting to empty report");
    ResetState {
        report: build_report(&ScoreSheet::empty()),
        validation: Validation::cleared(),
    }
}
