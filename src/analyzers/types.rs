//! Data types used by the grading pipeline.

use crate::analyzers::grade::{GradeLevel5, GradeLevel9};
use crate::chart::geometry::PyramidChart;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// School subjects, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Subject {
    Korean,
    English,
    Math,
    Social,
    Science,
}

impl Subject {
    pub const ALL: [Subject; 5] = [
        Subject::Korean,
        Subject::English,
        Subject::Math,
        Subject::Social,
        Subject::Science,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Subject::Korean => "korean",
            Subject::English => "english",
            Subject::Math => "math",
            Subject::Social => "social",
            Subject::Science => "science",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Subject::Korean => "국어",
            Subject::English => "영어",
            Subject::Math => "수학",
            Subject::Social => "사회",
            Subject::Science => "과학",
        }
    }
}

/// The two school terms, in chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Term {
    #[serde(rename = "s1")]
    First,
    #[serde(rename = "s2")]
    Second,
}

impl Term {
    pub const ALL: [Term; 2] = [Term::First, Term::Second];

    pub fn key(self) -> &'static str {
        match self {
            Term::First => "s1",
            Term::Second => "s2",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Term::First => "1학기",
            Term::Second => "2학기",
        }
    }
}

/// Every (term, subject) pair in display order.
pub fn all_cells() -> impl Iterator<Item = (Term, Subject)> {
    Term::ALL
        .into_iter()
        .flat_map(|term| Subject::ALL.into_iter().map(move |subject| (term, subject)))
}

/// Identifies one input field. Displays as the field's form id, e.g.
/// `s1_math_rank`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FieldId {
    CohortSize,
    Score(Term, Subject),
    Rank(Term, Subject),
}

impl fmt::Display for FieldId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldId::CohortSize => f.write_str("g1_total_students"),
            FieldId::Score(term, subject) => write!(f, "{}_{}_score", term.key(), subject.key()),
            FieldId::Rank(term, subject) => write!(f, "{}_{}_rank", term.key(), subject.key()),
        }
    }
}

impl Serialize for FieldId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A validated score/rank pair for one cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CellEntry {
    pub term: Term,
    pub subject: Subject,
    pub score: Option<f64>,
    pub rank: Option<u32>,
}

/// Typed input to the aggregator. Only the validator (or a reset) builds one,
/// so every present value is already within its domain.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSheet {
    pub(crate) cohort_size: Option<u32>,
    pub(crate) cells: Vec<CellEntry>,
}

impl ScoreSheet {
    /// A sheet with no cohort size and every cell absent.
    pub fn empty() -> Self {
        Self {
            cohort_size: None,
            cells: all_cells()
                .map(|(term, subject)| CellEntry {
                    term,
                    subject,
                    score: None,
                    rank: None,
                })
                .collect(),
        }
    }

    pub fn cohort_size(&self) -> Option<u32> {
        self.cohort_size
    }

    pub fn cells(&self) -> &[CellEntry] {
        &self.cells
    }
}

/// Per-cell grading result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CellResult {
    pub term: Term,
    pub subject: Subject,
    pub score: Option<f64>,
    pub five_level: Option<GradeLevel5>,
    pub rank: Option<u32>,
    pub percentile: Option<f64>,
    pub nine_level: Option<GradeLevel9>,
}

/// Means over whatever scores and percentiles were present.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateResult {
    pub mean_score: Option<f64>,
    pub five_level: Option<GradeLevel5>,
    pub score_count: usize,
    pub mean_percentile: Option<f64>,
    pub nine_level: Option<GradeLevel9>,
    pub percentile_count: usize,
}

/// Aggregate restricted to a single term.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TermSummary {
    pub term: Term,
    pub aggregate: AggregateResult,
}

/// Complete result of a successful calculation (or of a reset).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradeReport {
    pub cohort_size: Option<u32>,
    pub cells: Vec<CellResult>,
    pub terms: Vec<TermSummary>,
    pub overall: AggregateResult,
    pub chart: PyramidChart,
}

impl GradeReport {
    pub fn cell(&self, term: Term, subject: Subject) -> Option<&CellResult> {
        self.cells
            .iter()
            .find(|c| c.term == term && c.subject == subject)
    }

    pub fn term(&self, term: Term) -> Option<&AggregateResult> {
        self.terms
            .iter()
            .find(|t| t.term == term)
            .map(|t| &t.aggregate)
    }
}
