//! Input validation.
//!
//! Checks every raw field of a [`RawSheet`] and either produces the typed
//! [`ScoreSheet`] the aggregator consumes or a [`Validation`] listing the
//! offending fields.

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

use crate::analyzers::types::{CellEntry, FieldId, ScoreSheet, all_cells};
use crate::parser::{RawNumber, RawSheet};

/// Summary shown alongside a failing verdict.
pub const SUMMARY_MESSAGE: &str = "입력값을 확인하세요.";

/// Why a field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Required field left blank.
    Missing,
    /// Text is not a number.
    Parse,
    /// Number is outside the field's domain.
    Range,
}

/// A field-level problem. `Display` is the message shown next to the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FieldIssue {
    #[error("1 이상의 숫자를 입력하세요.")]
    CohortSize(IssueKind),
    #[error("0~100 사이의 점수를 입력하세요.")]
    Score(IssueKind),
    #[error("1 이상, 전체 학생 수({cohort_size}) 이하로 입력하세요.")]
    Rank { kind: IssueKind, cohort_size: u32 },
}

impl FieldIssue {
    pub fn kind(&self) -> IssueKind {
        match self {
            FieldIssue::CohortSize(kind) | FieldIssue::Score(kind) => *kind,
            FieldIssue::Rank { kind, .. } => *kind,
        }
    }
}

/// Outcome of one validation pass. Recreated from scratch on every pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    issues: BTreeMap<FieldId, FieldIssue>,
    unchecked: Vec<FieldId>,
}

impl Validation {
    /// The state after a reset: nothing to report.
    pub fn cleared() -> Self {
        Self::default()
    }

    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn issue(&self, field: FieldId) -> Option<&FieldIssue> {
        self.issues.get(&field)
    }

    /// The message for `field`, or `None` when the field is fine.
    pub fn message(&self, field: FieldId) -> Option<String> {
        self.issue(field).map(ToString::to_string)
    }

    pub fn issues(&self) -> impl Iterator<Item = (FieldId, &FieldIssue)> {
        self.issues.iter().map(|(id, issue)| (*id, issue))
    }

    /// Field id to message, for display or serialization.
    pub fn messages(&self) -> BTreeMap<FieldId, String> {
        self.issues
            .iter()
            .map(|(id, issue)| (*id, issue.to_string()))
            .collect()
    }

    /// Rank fields that were filled in but could not be checked because the
    /// cohort size was unusable.
    pub fn unchecked(&self) -> &[FieldId] {
        &self.unchecked
    }

    pub fn summary(&self) -> Option<&'static str> {
        (!self.is_valid()).then_some(SUMMARY_MESSAGE)
    }
}

impl Serialize for Validation {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("Validation", 4)?;
        s.serialize_field("valid", &self.is_valid())?;
        s.serialize_field("summary", &self.summary())?;
        s.serialize_field("errors", &self.messages())?;
        s.serialize_field("unchecked", &self.unchecked)?;
        s.end()
    }
}

fn check_cohort_size(raw: RawNumber) -> Result<u32, IssueKind> {
    match raw {
        RawNumber::Absent => Err(IssueKind::Missing),
        RawNumber::Invalid => Err(IssueKind::Parse),
        RawNumber::Value(x) if x >= 1.0 && x.fract() == 0.0 && x <= f64::from(u32::MAX) => {
            Ok(x as u32)
        }
        RawNumber::Value(_) => Err(IssueKind::Range),
    }
}

fn check_score(raw: RawNumber) -> Result<Option<f64>, IssueKind> {
    match raw {
        RawNumber::Absent => Ok(None),
        RawNumber::Invalid => Err(IssueKind::Parse),
        RawNumber::Value(x) if (0.0..=100.0).contains(&x) => Ok(Some(x)),
        RawNumber::Value(_) => Err(IssueKind::Range),
    }
}

fn check_rank(raw: RawNumber, cohort_size: u32) -> Result<Option<u32>, IssueKind> {
    match raw {
        RawNumber::Absent => Ok(None),
        RawNumber::Invalid => Err(IssueKind::Parse),
        RawNumber::Value(x) if x >= 1.0 && x <= f64::from(cohort_size) && x.fract() == 0.0 => {
            Ok(Some(x as u32))
        }
        RawNumber::Value(_) => Err(IssueKind::Range),
    }
}

/// Validates every field of `raw`.
///
/// A missing or invalid cohort size fails the verdict on its own, but rank
/// fields are then left unchecked rather than flagged: they cannot be judged
/// without a cohort. Ranks skipped this way are listed in
/// [`Validation::unchecked`].
///
/// Returns the typed sheet only when every field passes.
pub fn validate(raw: &RawSheet) -> Result<ScoreSheet, Validation> {
    let mut validation = Validation::default();

    let cohort_size = match check_cohort_size(RawNumber::parse(&raw.cohort_size)) {
        Ok(n) => Some(n),
        Err(kind) => {
            validation
                .issues
                .insert(FieldId::CohortSize, FieldIssue::CohortSize(kind));
            None
        }
    };

    let mut cells = Vec::with_capacity(10);
    for (term, subject) in all_cells() {
        let (score_text, rank_text) = raw.cell(term, subject);

        let score = check_score(RawNumber::parse(score_text)).unwrap_or_else(|kind| {
            validation
                .issues
                .insert(FieldId::Score(term, subject), FieldIssue::Score(kind));
            None
        });

        let rank_raw = RawNumber::parse(rank_text);
        let rank = match cohort_size {
            Some(cohort_size) => check_rank(rank_raw, cohort_size).unwrap_or_else(|kind| {
                validation.issues.insert(
                    FieldId::Rank(term, subject),
                    FieldIssue::Rank { kind, cohort_size },
                );
                None
            }),
            None => {
                if !rank_raw.is_absent() {
                    validation.unchecked.push(FieldId::Rank(term, subject));
                }
                None
            }
        };

        cells.push(CellEntry {
            term,
            subject,
            score,
            rank,
        });
    }

    if validation.is_valid() {
        debug!(?cohort_size, "Score sheet passed validation");
        Ok(ScoreSheet { cohort_size, cells })
    } else {
        debug!(
            errors = validation.issues.len(),
            unchecked = validation.unchecked.len(),
            "Score sheet failed validation"
        );
        Err(validation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::{Subject, Term};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    const MATH_RANK: FieldId = FieldId::Rank(Term::First, Subject::Math);
    const MATH_SCORE: FieldId = FieldId::Score(Term::First, Subject::Math);

    fn sheet(cohort: &str, score: &str, rank: &str) -> RawSheet {
        RawSheet::new(cohort).with_cell(Term::First, Subject::Math, score, rank)
    }

    #[test]
    fn test_valid_sheet_yields_typed_cells() {
        let typed = validate(&sheet("40", "85", "4")).unwrap();
        assert_eq!(typed.cohort_size(), Some(40));
        let math = typed
            .cells()
            .iter()
            .find(|c| c.term == Term::First && c.subject == Subject::Math)
            .unwrap();
        assert_eq!(math.score, Some(85.0));
        assert_eq!(math.rank, Some(4));
        assert_eq!(typed.cells().len(), 10);
    }

    #[test]
    fn test_missing_cohort_fails_but_leaves_rank_unflagged() {
        let validation = validate(&sheet("", "", "4")).unwrap_err();

        assert!(!validation.is_valid());
        assert_eq!(
            validation.issue(FieldId::CohortSize),
            Some(&FieldIssue::CohortSize(IssueKind::Missing))
        );
        assert_eq!(validation.message(MATH_RANK), None);
        assert_eq!(validation.unchecked(), &[MATH_RANK]);
        assert_eq!(validation.summary(), Some(SUMMARY_MESSAGE));
    }

    #[test]
    fn test_invalid_cohort_leaves_out_of_range_rank_unchecked() {
        let science_rank = FieldId::Rank(Term::Second, Subject::Science);
        for cohort in ["0", "abc", "-3", "2.5"] {
            let raw = RawSheet::new(cohort).with_cell(Term::Second, Subject::Science, "", "9999");
            let validation = validate(&raw).unwrap_err();

            assert!(!validation.is_valid(), "cohort {cohort:?}");
            assert_eq!(validation.messages().len(), 1, "cohort {cohort:?}");
            assert!(validation.message(FieldId::CohortSize).is_some());
            assert_eq!(validation.message(science_rank), None);
            assert_eq!(validation.unchecked(), &[science_rank], "cohort {cohort:?}");
        }
    }

    #[test]
    fn test_cohort_size_rules() {
        for (text, kind) in [
            ("abc", IssueKind::Parse),
            ("0", IssueKind::Range),
            ("-5", IssueKind::Range),
            ("12.5", IssueKind::Range),
        ] {
            let validation = validate(&RawSheet::new(text)).unwrap_err();
            assert_eq!(
                validation.issue(FieldId::CohortSize),
                Some(&FieldIssue::CohortSize(kind)),
                "cohort {text:?}"
            );
        }
        assert_eq!(
            validation_message(&RawSheet::new("0"), FieldId::CohortSize),
            Some("1 이상의 숫자를 입력하세요.".to_string())
        );
    }

    fn validation_message(raw: &RawSheet, field: FieldId) -> Option<String> {
        validate(raw).err().and_then(|v| v.message(field))
    }

    #[test]
    fn test_score_rules() {
        assert!(validate(&sheet("40", "0", "")).is_ok());
        assert!(validate(&sheet("40", "100", "")).is_ok());
        assert!(validate(&sheet("40", "", "")).is_ok());

        let validation = validate(&sheet("40", "100.5", "")).unwrap_err();
        assert_eq!(
            validation.issue(MATH_SCORE),
            Some(&FieldIssue::Score(IssueKind::Range))
        );
        assert_eq!(
            validation.message(MATH_SCORE).as_deref(),
            Some("0~100 사이의 점수를 입력하세요.")
        );

        let validation = validate(&sheet("40", "eighty", "")).unwrap_err();
        assert_eq!(
            validation.issue(MATH_SCORE),
            Some(&FieldIssue::Score(IssueKind::Parse))
        );
    }

    #[test]
    fn test_rank_message_echoes_cohort_size() {
        let validation = validate(&sheet("40", "", "41")).unwrap_err();
        assert_eq!(
            validation.message(MATH_RANK).as_deref(),
            Some("1 이상, 전체 학생 수(40) 이하로 입력하세요.")
        );
        assert_eq!(validation.issue(MATH_RANK).unwrap().kind(), IssueKind::Range);
        assert!(validation.unchecked().is_empty());
    }

    #[test]
    fn test_fractional_rank_is_rejected() {
        let validation = validate(&sheet("40", "", "3.5")).unwrap_err();
        assert_eq!(validation.issue(MATH_RANK).unwrap().kind(), IssueKind::Range);
    }

    #[test]
    fn test_every_failing_field_is_reported() {
        let raw = RawSheet::new("10")
            .with_cell(Term::First, Subject::Korean, "101", "")
            .with_cell(Term::Second, Subject::English, "", "11")
            .with_cell(Term::Second, Subject::Science, "50", "5");
        let validation = validate(&raw).unwrap_err();

        assert_eq!(
            validation.messages().keys().copied().collect::<Vec<_>>(),
            vec![
                FieldId::Score(Term::First, Subject::Korean),
                FieldId::Rank(Term::Second, Subject::English),
            ]
        );
    }

    #[test]
    fn test_serialized_validation() {
        let validation = validate(&sheet("", "", "4")).unwrap_err();
        let json = serde_json::to_value(&validation).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["summary"], SUMMARY_MESSAGE);
        assert_eq!(json["errors"]["g1_total_students"], "1 이상의 숫자를 입력하세요.");
        assert_eq!(json["unchecked"][0], "s1_math_rank");
    }

    #[test]
    fn test_cleared_validation_is_valid() {
        let cleared = Validation::cleared();
        assert!(cleared.is_valid());
        assert_eq!(cleared.summary(), None);
        assert!(cleared.messages().is_empty());
    }

    proptest! {
        #[test]
        fn ranks_within_cohort_always_pass(cohort in 1u32..5_000, offset in 0u32..5_000) {
            let rank = 1 + offset % cohort;
            let raw = sheet(&cohort.to_string(), "", &rank.to_string());
            prop_assert!(validate(&raw).is_ok());
        }

        #[test]
        fn ranks_outside_cohort_always_fail(cohort in 1u32..5_000, excess in 1u32..5_000) {
            let too_low = sheet(&cohort.to_string(), "", "0");
            let too_high = sheet(&cohort.to_string(), "", &(cohort + excess).to_string());
            prop_assert!(validate(&too_low).is_err());
            prop_assert!(validate(&too_high).is_err());
        }
    }
}
