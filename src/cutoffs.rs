//! Cutoff construction and score mapping.
//!
//! A [`CutoffSet`] partitions a numeric column into five contiguous bands,
//! ordered worst (band 1) to best (band 5). Frequency and monetary columns
//! are ascending (higher raw value = better band); recency is descending
//! (lower raw value = better band). Bands are built either from quintile
//! cutpoints or by iterative mean/median splitting of the remaining pool.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, RfmError};

/// Binning strategy for one scoring dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strategy {
    Mean,
    Median,
    #[default]
    Quintile,
}

impl Strategy {
    pub fn name(self) -> &'static str {
        match self {
            Strategy::Mean => "mean",
            Strategy::Median => "median",
            Strategy::Quintile => "quintile",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Strategy {
    type Err = RfmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mean" => Ok(Strategy::Mean),
            "median" => Ok(Strategy::Median),
            "quintile" => Ok(Strategy::Quintile),
            _ => Err(RfmError::InvalidStrategy(s.to_string())),
        }
    }
}

/// Band orientation for one dimension.
///
/// `Ascending` means larger raw values land in better bands (frequency,
/// monetary); `Descending` means smaller raw values land in better bands
/// (recency).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Five ordered scoring bands for one dimension.
///
/// Each band is stored as `(worse_bound, better_bound)`: for ascending
/// columns that is `(lower, upper)`, for descending columns `(upper, lower)`.
/// Adjacent bands share a bound, so the set partitions the observed value
/// range with no gaps.
#[derive(Debug, Clone, PartialEq)]
pub struct CutoffSet {
    direction: Direction,
    bands: [(f64, f64); 5],
}

impl CutoffSet {
    /// Build cutoffs for `values` using the given strategy and direction.
    ///
    /// Quintile cutpoints use linear interpolation at the 20/40/60/80th
    /// percentiles. Mean/median splitting is approximate: four rounds of
    /// taking the center of the remaining pool and keeping only the better
    /// side, with the column's natural min/max as outer bounds. Columns with
    /// fewer than five distinct values yield degenerate (equal-bound) bands;
    /// [`CutoffSet::score`] still assigns every in-range value a score.
    pub fn build(values: &[f64], direction: Direction, strategy: Strategy) -> Result<Self> {
        if values.is_empty() {
            return Err(RfmError::InvalidInput(
                "cannot build cutoffs from an empty column".to_string(),
            ));
        }

        let min = values.iter().fold(f64::INFINITY, |a, &b| a.min(b));
        let max = values.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b));

        // Split points ordered from the worst band's boundary to the best's.
        let splits = match strategy {
            Strategy::Quintile => quintile_splits(values, direction),
            Strategy::Mean => iterative_splits(values, direction, mean),
            Strategy::Median => iterative_splits(values, direction, median),
        };

        let (outer_worst, outer_best) = match direction {
            Direction::Ascending => (min, max),
            Direction::Descending => (max, min),
        };

        let bands = [
            (outer_worst, splits[0]),
            (splits[0], splits[1]),
            (splits[1], splits[2]),
            (splits[2], splits[3]),
            (splits[3], outer_best),
        ];

        Ok(CutoffSet { direction, bands })
    }

    /// Map a raw value to its 1-based band index.
    ///
    /// Bands are scanned in build order and are half-open toward the better
    /// end: ascending containment is `worse <= value < better`, descending is
    /// `better < value <= worse`. The final band is closed so the best
    /// extreme stays in range. Degenerate half-open bands contain nothing,
    /// which is what maps a single-point column to band 5: only the closed
    /// final band can hold its value.
    ///
    /// Returns `None` for values outside the observed range the cutoffs were
    /// built from; scoring foreign data is a usage error.
    pub fn score(&self, value: f64) -> Option<u8> {
        let last = self.bands.len() - 1;
        for (i, &(worse, better)) in self.bands.iter().enumerate() {
            let contained = match self.direction {
                Direction::Ascending => {
                    worse <= value && (value < better || (i == last && value <= better))
                }
                Direction::Descending => {
                    value <= worse && (better < value || (i == last && better <= value))
                }
            };
            if contained {
                return Some(i as u8 + 1);
            }
        }
        None
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// The five `(worse_bound, better_bound)` pairs in band order.
    pub fn bands(&self) -> &[(f64, f64); 5] {
        &self.bands
    }
}

/// Quintile cutpoints, ordered worst-boundary first.
fn quintile_splits(values: &[f64], direction: Direction) -> [f64; 4] {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let p20 = percentile(&sorted, 0.2);
    let p40 = percentile(&sorted, 0.4);
    let p60 = percentile(&sorted, 0.6);
    let p80 = percentile(&sorted, 0.8);

    match direction {
        Direction::Ascending => [p20, p40, p60, p80],
        Direction::Descending => [p80, p60, p40, p20],
    }
}

/// Four split points from repeated center-splitting of the remaining pool.
///
/// Each round records the pool's center and keeps only the better side:
/// `v >= divider` for ascending columns, `v <= divider` for descending. The
/// pool never empties because the center never exceeds the pool's extreme.
fn iterative_splits(
    values: &[f64],
    direction: Direction,
    center: fn(&[f64]) -> f64,
) -> [f64; 4] {
    let mut pool = values.to_vec();
    let mut splits = [0.0; 4];
    for slot in &mut splits {
        let divider = center(&pool);
        *slot = divider;
        pool.retain(|&v| match direction {
            Direction::Ascending => v >= divider,
            Direction::Descending => v <= divider,
        });
    }
    splits
}

/// Linear-interpolated percentile of an already sorted slice.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let h = (sorted.len() - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (h - lo as f64) * (sorted[hi] - sorted[lo])
    }
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    percentile(&sorted, 0.5)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_to_ten() -> Vec<f64> {
        (1..=10).map(f64::from).collect()
    }

    /// Band i's better bound must meet band i+1's worse bound, and the
    /// boundary sequence must be monotone in the band direction.
    fn assert_contiguous(set: &CutoffSet) {
        let bands = set.bands();
        for i in 0..4 {
            assert_eq!(
                bands[i].1, bands[i + 1].0,
                "band {} does not connect to band {}",
                i + 1,
                i + 2
            );
            match set.direction() {
                Direction::Ascending => assert!(bands[i].0 <= bands[i].1),
                Direction::Descending => assert!(bands[i].0 >= bands[i].1),
            }
        }
    }

    #[test]
    fn strategy_parsing_is_case_insensitive() {
        assert_eq!("Quintile".parse::<Strategy>().unwrap(), Strategy::Quintile);
        assert_eq!("MEAN".parse::<Strategy>().unwrap(), Strategy::Mean);
        assert_eq!("median".parse::<Strategy>().unwrap(), Strategy::Median);
    }

    #[test]
    fn strategy_parsing_rejects_unknown_names() {
        let err = "mode".parse::<Strategy>().unwrap_err();
        assert!(matches!(err, RfmError::InvalidStrategy(ref s) if s == "mode"));
    }

    #[test]
    fn quintile_ascending_bands() {
        let set = CutoffSet::build(&one_to_ten(), Direction::Ascending, Strategy::Quintile)
            .unwrap();
        // Linear interpolation on 1..=10: p20=2.8, p40=4.6, p60=6.4, p80=8.2.
        let expected = [
            (1.0, 2.8),
            (2.8, 4.6),
            (4.6, 6.4),
            (6.4, 8.2),
            (8.2, 10.0),
        ];
        for (band, want) in set.bands().iter().zip(expected.iter()) {
            assert!((band.0 - want.0).abs() < 1e-12);
            assert!((band.1 - want.1).abs() < 1e-12);
        }
        assert_contiguous(&set);
    }

    #[test]
    fn quintile_descending_bands() {
        let set = CutoffSet::build(&one_to_ten(), Direction::Descending, Strategy::Quintile)
            .unwrap();
        let bands = set.bands();
        assert!((bands[0].0 - 10.0).abs() < 1e-12);
        assert!((bands[0].1 - 8.2).abs() < 1e-12);
        assert!((bands[4].0 - 2.8).abs() < 1e-12);
        assert!((bands[4].1 - 1.0).abs() < 1e-12);
        assert_contiguous(&set);
    }

    #[test]
    fn quintile_scores_split_ten_rows_evenly() {
        let values = one_to_ten();
        let set =
            CutoffSet::build(&values, Direction::Ascending, Strategy::Quintile).unwrap();
        let scores: Vec<u8> = values.iter().map(|&v| set.score(v).unwrap()).collect();
        assert_eq!(scores, vec![1, 1, 2, 2, 3, 3, 4, 4, 5, 5]);
    }

    #[test]
    fn quintile_descending_inverts_the_ranking() {
        let values = one_to_ten();
        let set =
            CutoffSet::build(&values, Direction::Descending, Strategy::Quintile).unwrap();
        let scores: Vec<u8> = values.iter().map(|&v| set.score(v).unwrap()).collect();
        assert_eq!(scores, vec![5, 5, 4, 4, 3, 3, 2, 2, 1, 1]);
    }

    #[test]
    fn mean_ascending_splits_shrink_the_pool() {
        let values = one_to_ten();
        let set = CutoffSet::build(&values, Direction::Ascending, Strategy::Mean).unwrap();
        // Pool means: 5.5, then 8 over {6..10}, 9 over {8,9,10}, 9.5 over {9,10}.
        let bands = set.bands();
        assert!((bands[0].1 - 5.5).abs() < 1e-12);
        assert!((bands[1].1 - 8.0).abs() < 1e-12);
        assert!((bands[2].1 - 9.0).abs() < 1e-12);
        assert!((bands[3].1 - 9.5).abs() < 1e-12);
        assert_contiguous(&set);

        let scores: Vec<u8> = values.iter().map(|&v| set.score(v).unwrap()).collect();
        assert_eq!(scores, vec![1, 1, 1, 1, 1, 2, 2, 3, 4, 5]);
        // All five levels non-empty for ten distinct values.
        for level in 1..=5 {
            assert!(scores.contains(&level));
        }
    }

    #[test]
    fn mean_descending_splits_stay_contiguous() {
        let values = one_to_ten();
        let set = CutoffSet::build(&values, Direction::Descending, Strategy::Mean).unwrap();
        // Pool means over the shrinking low side: 5.5, 3, 2, 1.5.
        let bands = set.bands();
        assert!((bands[0].0 - 10.0).abs() < 1e-12);
        assert!((bands[0].1 - 5.5).abs() < 1e-12);
        assert!((bands[3].1 - 1.5).abs() < 1e-12);
        assert_contiguous(&set);

        let scores: Vec<u8> = values.iter().map(|&v| set.score(v).unwrap()).collect();
        assert_eq!(scores, vec![5, 4, 3, 2, 2, 1, 1, 1, 1, 1]);
    }

    #[test]
    fn median_handles_skewed_columns() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 100.0];
        let set = CutoffSet::build(&values, Direction::Ascending, Strategy::Median).unwrap();
        // Medians of the shrinking pool: 3, 4, 52, 100.
        let bands = set.bands();
        assert!((bands[0].1 - 3.0).abs() < 1e-12);
        assert!((bands[1].1 - 4.0).abs() < 1e-12);
        assert!((bands[2].1 - 52.0).abs() < 1e-12);
        assert!((bands[3].1 - 100.0).abs() < 1e-12);
        assert_contiguous(&set);
    }

    #[test]
    fn every_in_range_value_gets_exactly_one_score() {
        let values = vec![3.0, 1.0, 4.0, 1.0, 5.0, 9.0, 2.0, 6.0, 5.0, 3.0, 5.0];
        for direction in [Direction::Ascending, Direction::Descending] {
            for strategy in [Strategy::Quintile, Strategy::Mean, Strategy::Median] {
                let set = CutoffSet::build(&values, direction, strategy).unwrap();
                for &v in &values {
                    let score = set.score(v);
                    assert!(
                        matches!(score, Some(1..=5)),
                        "{strategy} {direction:?}: value {v} scored {score:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn scores_are_monotone_in_the_band_direction() {
        let mut values: Vec<f64> = vec![12.0, 7.0, 3.0, 44.0, 23.0, 8.0, 15.0, 4.0, 30.0, 19.0];
        values.sort_by(|a, b| a.total_cmp(b));
        for strategy in [Strategy::Quintile, Strategy::Mean, Strategy::Median] {
            let asc = CutoffSet::build(&values, Direction::Ascending, strategy).unwrap();
            let desc = CutoffSet::build(&values, Direction::Descending, strategy).unwrap();
            let asc_scores: Vec<u8> = values.iter().map(|&v| asc.score(v).unwrap()).collect();
            let desc_scores: Vec<u8> =
                values.iter().map(|&v| desc.score(v).unwrap()).collect();
            assert!(
                asc_scores.windows(2).all(|w| w[0] <= w[1]),
                "{strategy}: ascending scores decreased: {asc_scores:?}"
            );
            assert!(
                desc_scores.windows(2).all(|w| w[0] >= w[1]),
                "{strategy}: descending scores increased: {desc_scores:?}"
            );
        }
    }

    #[test]
    fn single_point_column_scores_five() {
        for direction in [Direction::Ascending, Direction::Descending] {
            for strategy in [Strategy::Quintile, Strategy::Mean, Strategy::Median] {
                let set = CutoffSet::build(&[42.0], direction, strategy).unwrap();
                assert_eq!(set.score(42.0), Some(5), "{strategy} {direction:?}");
            }
        }
    }

    #[test]
    fn few_distinct_values_still_score() {
        let values = vec![1.0, 1.0, 1.0, 1.0, 2.0];
        let set =
            CutoffSet::build(&values, Direction::Ascending, Strategy::Quintile).unwrap();
        for &v in &values {
            assert!(matches!(set.score(v), Some(1..=5)));
        }
        // The larger value must not score below the smaller one.
        assert!(set.score(2.0).unwrap() >= set.score(1.0).unwrap());
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let set = CutoffSet::build(&one_to_ten(), Direction::Ascending, Strategy::Quintile)
            .unwrap();
        assert_eq!(set.score(0.5), None);
        assert_eq!(set.score(10.5), None);
    }

    #[test]
    fn empty_column_is_an_error() {
        let err =
            CutoffSet::build(&[], Direction::Ascending, Strategy::Quintile).unwrap_err();
        assert!(matches!(err, RfmError::InvalidInput(_)));
    }
}
