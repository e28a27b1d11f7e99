//! Raw text handling for score sheets.
//!
//! Field values arrive as caller-owned text. [`RawNumber`] makes the
//! difference between "left blank" and "not a number" explicit, and
//! [`load_sheet`] reads a whole [`RawSheet`] from a JSON or CSV file.

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;
use tracing::debug;

use crate::analyzers::types::{Subject, Term};

/// A numeric field as typed by the user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawNumber {
    /// Blank or whitespace only.
    Absent,
    /// Present but not a finite number.
    Invalid,
    Value(f64),
}

impl RawNumber {
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            return RawNumber::Absent;
        }
        match text.parse::<f64>() {
            Ok(x) if x.is_finite() => RawNumber::Value(x),
            _ => RawNumber::Invalid,
        }
    }

    pub fn is_absent(self) -> bool {
        matches!(self, RawNumber::Absent)
    }
}

/// Raw text of one (term, subject) cell.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawCell {
    pub score: String,
    pub rank: String,
}

/// Everything the user typed, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSheet {
    pub cohort_size: String,
    cells: BTreeMap<(Term, Subject), RawCell>,
}

impl RawSheet {
    pub fn new(cohort_size: impl Into<String>) -> Self {
        Self {
            cohort_size: cohort_size.into(),
            cells: BTreeMap::new(),
        }
    }

    /// Sets the raw text for a cell, replacing anything already there.
    pub fn set(
        &mut self,
        term: Term,
        subject: Subject,
        score: impl Into<String>,
        rank: impl Into<String>,
    ) -> &mut Self {
        self.cells.insert(
            (term, subject),
            RawCell {
                score: score.into(),
                rank: rank.into(),
            },
        );
        self
    }

    /// Builder-style variant of [`RawSheet::set`].
    pub fn with_cell(
        mut self,
        term: Term,
        subject: Subject,
        score: impl Into<String>,
        rank: impl Into<String>,
    ) -> Self {
        self.set(term, subject, score, rank);
        self
    }

    /// Raw text for a cell; cells never set read as blank.
    pub fn cell(&self, term: Term, subject: Subject) -> (&str, &str) {
        self.cells
            .get(&(term, subject))
            .map_or(("", ""), |c| (c.score.as_str(), c.rank.as_str()))
    }

    fn insert_unique(&mut self, term: Term, subject: Subject, cell: RawCell) -> Result<()> {
        if self.cells.insert((term, subject), cell).is_some() {
            bail!("duplicate cell {}_{}", term.key(), subject.key());
        }
        Ok(())
    }
}

/// A raw value in an input file; JSON numbers are accepted alongside text.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawText {
    Text(String),
    Number(serde_json::Number),
}

impl RawText {
    fn into_text(self) -> String {
        match self {
            RawText::Text(s) => s,
            RawText::Number(n) => n.to_string(),
        }
    }
}

fn text_or_blank(value: Option<RawText>) -> String {
    value.map(RawText::into_text).unwrap_or_default()
}

#[derive(Debug, Deserialize)]
struct SheetRow {
    term: Term,
    subject: Subject,
    #[serde(default)]
    score: Option<RawText>,
    #[serde(default)]
    rank: Option<RawText>,
}

#[derive(Debug, Deserialize)]
struct SheetDocument {
    #[serde(default)]
    cohort_size: Option<RawText>,
    #[serde(default)]
    cells: Vec<SheetRow>,
}

/// Parses a JSON score sheet document.
pub fn parse_sheet_json(json: &str) -> Result<RawSheet> {
    let doc: SheetDocument = serde_json::from_str(json).context("invalid score sheet JSON")?;
    let mut sheet = RawSheet::new(text_or_blank(doc.cohort_size));
    for row in doc.cells {
        sheet.insert_unique(
            row.term,
            row.subject,
            RawCell {
                score: text_or_blank(row.score),
                rank: text_or_blank(row.rank),
            },
        )?;
    }
    Ok(sheet)
}

/// Parses CSV rows with a `term,subject,score,rank` header. The CSV format
/// has no place for the cohort size, so it is passed in.
pub fn parse_sheet_csv<R: std::io::Read>(reader: R, cohort_size: &str) -> Result<RawSheet> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut sheet = RawSheet::new(cohort_size);

    for result in rdr.deserialize() {
        let record: CsvRow = result.context("invalid score sheet row")?;
        sheet.insert_unique(
            record.term,
            record.subject,
            RawCell {
                score: record.score.unwrap_or_default(),
                rank: record.rank.unwrap_or_default(),
            },
        )?;
    }

    Ok(sheet)
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    term: Term,
    subject: Subject,
    score: Option<String>,
    rank: Option<String>,
}

/// Loads a score sheet from `path`. Files ending in `.csv` are read as CSV,
/// anything else as JSON. `cohort_override`, when given, replaces the cohort
/// size found in the file.
pub fn load_sheet(path: &Path, cohort_override: Option<&str>) -> Result<RawSheet> {
    let is_csv = path.extension().and_then(|e| e.to_str()) == Some("csv");
    debug!(path = %path.display(), is_csv, "Loading score sheet");

    let mut sheet = if is_csv {
        let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
        parse_sheet_csv(file, cohort_override.unwrap_or_default())?
    } else {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        parse_sheet_json(&json)?
    };

    if let Some(cohort) = cohort_override {
        sheet.cohort_size = cohort.to_string();
    }
    Ok(sheet)
}
