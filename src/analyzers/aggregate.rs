use crate::analyzers::grade::{five_level, nine_level_from_percentile};
use crate::analyzers::types::{
    AggregateResult, CellEntry, CellResult, ScoreSheet, Term, TermSummary,
};
use crate::analyzers::utility::{mean, percentile};

/// Grades a single cell. The percentile needs both a rank and a cohort size.
pub fn grade_cell(entry: &CellEntry, cohort_size: Option<u32>) -> CellResult {
    let percentile = entry
        .rank
        .zip(cohort_size)
        .and_then(|(rank, cohort)| percentile(rank, cohort));

    CellResult {
        term: entry.term,
        subject: entry.subject,
        score: entry.score,
        five_level: entry.score.and_then(five_level),
        rank: entry.rank,
        percentile,
        nine_level: percentile.and_then(nine_level_from_percentile),
    }
}

/// Unweighted means over the present scores and percentiles of `cells`.
/// Scores and percentiles are averaged independently; either side is absent
/// when it had no values.
pub fn aggregate<'a>(cells: impl IntoIterator<Item = &'a CellResult>) -> AggregateResult {
    let mut scores = Vec::new();
    let mut percentiles = Vec::new();

    for cell in cells {
        scores.extend(cell.score);
        percentiles.extend(cell.percentile);
    }

    let mean_score = mean(&scores);
    let mean_percentile = mean(&percentiles);

    AggregateResult {
        mean_score,
        five_level: mean_score.and_then(five_level),
        score_count: scores.len(),
        mean_percentile,
        nine_level: mean_percentile.and_then(nine_level_from_percentile),
        percentile_count: percentiles.len(),
    }
}

/// Per-cell results, one summary per term and the overall aggregate.
pub fn aggregate_sheet(sheet: &ScoreSheet) -> (Vec<CellResult>, Vec<TermSummary>, AggregateResult) {
    let cells: Vec<CellResult> = sheet
        .cells()
        .iter()
        .map(|entry| grade_cell(entry, sheet.cohort_size()))
        .collect();

    let terms = Term::ALL
        .into_iter()
        .map(|term| TermSummary {
            term,
            aggregate: aggregate(cells.iter().filter(|c| c.term == term)),
        })
        .collect();

    let overall = aggregate(&cells);

    (cells, terms, overall)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::Subject;
    use pretty_assertions::assert_eq;

    fn entry(term: Term, subject: Subject, score: Option<f64>, rank: Option<u32>) -> CellEntry {
        CellEntry {
            term,
            subject,
            score,
            rank,
        }
    }

    fn sheet(cohort_size: Option<u32>, entries: &[CellEntry]) -> ScoreSheet {
        let mut sheet = ScoreSheet::empty();
        sheet.cohort_size = cohort_size;
        for e in entries {
            let slot = sheet
                .cells
                .iter_mut()
                .find(|c| c.term == e.term && c.subject == e.subject)
                .unwrap();
            *slot = *e;
        }
        sheet
    }

    #[test]
    fn test_grade_cell_with_rank_and_score() {
        let result = grade_cell(
            &entry(Term::First, Subject::Math, Some(85.0), Some(4)),
            Some(40),
        );
        assert_eq!(result.percentile, Some(10.0));
        assert_eq!(result.nine_level.map(|g| g.get()), Some(2));
        assert_eq!(result.five_level.map(|g| g.get()), Some(2));
    }

    #[test]
    fn test_grade_cell_without_cohort_has_no_percentile() {
        let result = grade_cell(&entry(Term::First, Subject::Math, None, Some(4)), None);
        assert_eq!(result.rank, Some(4));
        assert_eq!(result.percentile, None);
        assert_eq!(result.nine_level, None);
    }

    #[test]
    fn test_single_score_overall() {
        let (_, _, overall) = aggregate_sheet(&sheet(
            Some(30),
            &[entry(Term::Second, Subject::Korean, Some(72.0), None)],
        ));
        assert_eq!(overall.mean_score, Some(72.0));
        assert_eq!(overall.five_level.map(|g| g.get()), Some(3));
        assert_eq!(overall.score_count, 1);
        assert_eq!(overall.mean_percentile, None);
        assert_eq!(overall.nine_level, None);
    }

    #[test]
    fn test_means_span_both_terms() {
        let (cells, terms, overall) = aggregate_sheet(&sheet(
            Some(64),
            &[
                entry(Term::First, Subject::Korean, Some(90.0), Some(8)),
                entry(Term::First, Subject::Math, Some(70.0), None),
                entry(Term::Second, Subject::Science, Some(80.0), Some(16)),
            ],
        ));

        assert_eq!(cells.len(), 10);
        assert_eq!(overall.mean_score, Some(80.0));
        assert_eq!(overall.score_count, 3);
        // (12.5% + 25%) / 2
        assert_eq!(overall.mean_percentile, Some(18.75));
        assert_eq!(overall.nine_level.map(|g| g.get()), Some(3));

        let first = &terms[0].aggregate;
        assert_eq!(terms[0].term, Term::First);
        assert_eq!(first.mean_score, Some(80.0));
        assert_eq!(first.mean_percentile, Some(12.5));

        let second = &terms[1].aggregate;
        assert_eq!(second.mean_score, Some(80.0));
        assert_eq!(second.mean_percentile, Some(25.0));
        assert_eq!(second.nine_level.map(|g| g.get()), Some(4));
    }

    #[test]
    fn test_empty_sheet_aggregates_to_nothing() {
        let (cells, terms, overall) = aggregate_sheet(&ScoreSheet::empty());
        assert!(cells.iter().all(|c| c.score.is_none() && c.percentile.is_none()));
        assert_eq!(overall, AggregateResult::default());
        assert!(terms.iter().all(|t| t.aggregate == AggregateResult::default()));
    }
}
