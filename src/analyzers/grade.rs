use serde::Serialize;
use std::fmt;

/// Level on the absolute 5-level scale (1 is best).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct GradeLevel5(pub(crate) u8);

impl GradeLevel5 {
    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for GradeLevel5 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "5등급제 {}등급", self.0)
    }
}

/// Level on the relative 9-level scale (1 is best).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct GradeLevel9(pub(crate) u8);

impl GradeLevel9 {
    pub fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for GradeLevel9 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "9등급제 {}등급", self.0)
    }
}

/// Lower score bound (inclusive) for each 5-level grade. Anything below the
/// last bound is grade 5.
static FIVE_LEVEL_FLOORS: &[(u8, f64)] = &[(1, 90.0), (2, 80.0), (3, 70.0), (4, 60.0)];

/// Cumulative "top X%" upper bound (inclusive) for each 9-level grade.
pub static GRADE_BANDS: &[(u8, u8)] = &[
    (1, 4),
    (2, 11),
    (3, 23),
    (4, 40),
    (5, 60),
    (6, 77),
    (7, 89),
    (8, 96),
    (9, 100),
];

/// One contiguous `[from, to)` percentile range of the 9-level scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Band {
    pub grade: u8,
    pub from: u8,
    pub to: u8,
}

/// Converts a raw score into a 5-level grade.
///
/// | Score   | Level |
/// |---------|-------|
/// | >= 90   | 1     |
/// | >= 80   | 2     |
/// | >= 70   | 3     |
/// | >= 60   | 4     |
/// | < 60    | 5     |
///
/// Returns `None` for `NaN`.
pub fn five_level(score: f64) -> Option<GradeLevel5> {
    if score.is_nan() {
        return None;
    }
    let level = FIVE_LEVEL_FLOORS
        .iter()
        .find(|(_, floor)| score >= *floor)
        .map_or(5, |(level, _)| *level);
    Some(GradeLevel5(level))
}

/// Converts a "top X%" percentile into a 9-level grade using [`GRADE_BANDS`].
/// The first band whose upper bound is at or above `percentile` wins.
///
/// Out-of-range input is not rejected: negatives land in grade 1 and values
/// above 100 in grade 9. Returns `None` for `NaN`.
pub fn nine_level_from_percentile(percentile: f64) -> Option<GradeLevel9> {
    if percentile.is_nan() {
        return None;
    }
    let level = GRADE_BANDS
        .iter()
        .find(|(_, upper)| percentile <= f64::from(*upper))
        .map_or(9, |(grade, _)| *grade);
    Some(GradeLevel9(level))
}

/// The nine bands, each starting where the previous one ended.
pub fn band_spec() -> Vec<Band> {
    let mut prev_upper = 0;
    GRADE_BANDS
        .iter()
        .map(|&(grade, upper)| {
            let band = Band {
                grade,
                from: prev_upper,
                to: upper,
            };
            prev_upper = upper;
            band
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn five(score: f64) -> u8 {
        five_level(score).unwrap().get()
    }

    fn nine(p: f64) -> u8 {
        nine_level_from_percentile(p).unwrap().get()
    }

    #[test]
    fn test_five_level_boundaries() {
        assert_eq!(five(100.0), 1);
        assert_eq!(five(90.0), 1);
        assert_eq!(five(89.99), 2);
        assert_eq!(five(80.0), 2);
        assert_eq!(five(79.99), 3);
        assert_eq!(five(70.0), 3);
        assert_eq!(five(60.0), 4);
        assert_eq!(five(59.99), 5);
        assert_eq!(five(0.0), 5);
    }

    #[test]
    fn test_nine_level_boundaries() {
        assert_eq!(nine(0.0), 1);
        assert_eq!(nine(4.0), 1);
        assert_eq!(nine(4.01), 2);
        assert_eq!(nine(11.0), 2);
        assert_eq!(nine(23.0), 3);
        assert_eq!(nine(40.0), 4);
        assert_eq!(nine(60.0), 5);
        assert_eq!(nine(77.0), 6);
        assert_eq!(nine(89.0), 7);
        assert_eq!(nine(96.0), 8);
        assert_eq!(nine(96.5), 9);
        assert_eq!(nine(100.0), 9);
    }

    #[test]
    fn test_nan_has_no_grade() {
        assert_eq!(five_level(f64::NAN), None);
        assert_eq!(nine_level_from_percentile(f64::NAN), None);
    }

    #[test]
    fn test_out_of_range_percentile_is_clamped_by_table() {
        assert_eq!(nine(-3.0), 1);
        assert_eq!(nine(140.0), 9);
    }

    #[test]
    fn test_band_spec_is_contiguous_and_covers_everything() {
        let bands = band_spec();
        assert_eq!(bands.len(), 9);
        assert_eq!(bands[0].from, 0);
        assert_eq!(bands.last().unwrap().to, 100);
        for pair in bands.windows(2) {
            assert_eq!(pair[0].to, pair[1].from);
            assert!(pair[0].from < pair[0].to);
        }
        let grades: Vec<u8> = bands.iter().map(|b| b.grade).collect();
        assert_eq!(grades, (1..=9).collect::<Vec<u8>>());
    }

    #[test]
    fn test_display() {
        assert_eq!(GradeLevel5(2).to_string(), "5등급제 2등급");
        assert_eq!(GradeLevel9(7).to_string(), "9등급제 7등급");
    }

    proptest! {
        #[test]
        fn five_level_never_improves_as_score_drops(a in 0.0f64..=100.0, b in 0.0f64..=100.0) {
            let (high, low) = if a >= b { (a, b) } else { (b, a) };
            prop_assert!(five(low) >= five(high));
        }

        #[test]
        fn nine_level_never_improves_as_percentile_grows(a in 0.0f64..=100.0, b in 0.0f64..=100.0) {
            let (small, large) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(nine(small) <= nine(large));
        }

        #[test]
        fn nine_level_matches_containing_band(p in 0.0f64..=100.0) {
            let grade = nine(p);
            let band = band_spec().into_iter().find(|b| b.grade == grade).unwrap();
            prop_assert!(p <= f64::from(band.to));
            prop_assert!(grade == 1 || p > f64::from(band.from));
        }
    }
}
