//! Chronological train/validation/test split
//!
//! Rows are ordered by date and carved by position from the end, so no
//! training row postdates a validation row and no validation row postdates a
//! test row.

use chrono::NaiveDate;

use crate::data::FeatureRow;
use crate::{HoopsError, Result, SplitConfig};

/// Anything with a calendar date to order by
pub trait Dated {
    fn date(&self) -> NaiveDate;
}

impl Dated for FeatureRow {
    fn date(&self) -> NaiveDate {
        self.game_date
    }
}

/// Test and validation fractions; training takes the remainder
#[derive(Debug, Clone, Copy)]
pub struct SplitRatios {
    pub test: f64,
    pub val: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        SplitRatios {
            test: 0.2,
            val: 0.1,
        }
    }
}

impl From<SplitConfig> for SplitRatios {
    fn from(config: SplitConfig) -> Self {
        SplitRatios {
            test: config.test_fraction,
            val: config.val_fraction,
        }
    }
}

impl SplitRatios {
    /// Both fractions in [0, 1) and summing to at most 1
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [("test", self.test), ("validation", self.val)] {
            if !(0.0..1.0).contains(&value) {
                return Err(HoopsError::InvalidSplit(format!(
                    "{} fraction must be in [0, 1), got {}",
                    name, value
                )));
            }
        }
        if self.test + self.val > 1.0 {
            return Err(HoopsError::InvalidSplit(format!(
                "test + validation fractions exceed 1 ({} + {})",
                self.test, self.val
            )));
        }
        Ok(())
    }

    /// Row counts (train, val, test) for a dataset of `n` rows
    ///
    /// Counts round to nearest with ties to even. Validation is trimmed if
    /// rounding would overrun the dataset.
    pub fn counts(&self, n: usize) -> (usize, usize, usize) {
        let n_test = ((n as f64 * self.test).round_ties_even() as usize).min(n);
        let n_val = ((n as f64 * self.val).round_ties_even() as usize).min(n - n_test);
        (n - n_test - n_val, n_val, n_test)
    }
}

/// The three partitions, each in ascending date order
#[derive(Debug, Clone)]
pub struct TemporalSplit<T> {
    pub train: Vec<T>,
    pub val: Vec<T>,
    pub test: Vec<T>,
}

/// Split `rows` chronologically
///
/// Sorting is stable, so rows sharing a date keep their input order.
pub fn temporal_split<T: Dated>(mut rows: Vec<T>, ratios: SplitRatios) -> Result<TemporalSplit<T>> {
    ratios.validate()?;
    rows.sort_by_key(|r| r.date());

    let (n_train, n_val, _) = ratios.counts(rows.len());
    let test = rows.split_off(n_train + n_val);
    let val = rows.split_off(n_train);

    log::info!(
        "Temporal split: train={}, val={}, test={}",
        rows.len(),
        val.len(),
        test.len()
    );

    Ok(TemporalSplit {
        train: rows,
        val,
        test,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone)]
    struct Row(NaiveDate, usize);

    impl Dated for Row {
        fn date(&self) -> NaiveDate {
            self.0
        }
    }

    fn shuffled_rows(n: usize) -> Vec<Row> {
        // Deterministic scramble of day offsets, with repeated dates
        (0..n)
            .map(|i| {
                let day = (i * 7919) % n / 2;
                Row(
                    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap() + chrono::Duration::days(day as i64),
                    i,
                )
            })
            .collect()
    }

    fn max_date(rows: &[Row]) -> Option<NaiveDate> {
        rows.iter().map(|r| r.0).max()
    }

    fn min_date(rows: &[Row]) -> Option<NaiveDate> {
        rows.iter().map(|r| r.0).min()
    }

    #[test]
    fn test_partitions_never_overlap_in_time() {
        for n in [1usize, 2, 7, 10, 33, 100] {
            for (test, val) in [(0.2, 0.1), (0.25, 0.25), (0.5, 0.0), (0.0, 0.3)] {
                let split = temporal_split(shuffled_rows(n), SplitRatios { test, val }).unwrap();
                assert_eq!(split.train.len() + split.val.len() + split.test.len(), n);

                if let (Some(tr), Some(v)) = (max_date(&split.train), min_date(&split.val)) {
                    assert!(tr <= v);
                }
                if let (Some(v), Some(te)) = (max_date(&split.val), min_date(&split.test)) {
                    assert!(v <= te);
                }
                if let (Some(tr), Some(te)) = (max_date(&split.train), min_date(&split.test)) {
                    assert!(tr <= te);
                }
            }
        }
    }

    #[test]
    fn test_counts_round_to_nearest() {
        let ratios = SplitRatios { test: 0.2, val: 0.1 };
        assert_eq!(ratios.counts(10), (7, 1, 2));
        // 0.25 * 10 = 2.5 rounds down to 2, 0.15 * 10 = 1.5 rounds up to 2
        let ratios = SplitRatios { test: 0.25, val: 0.15 };
        assert_eq!(ratios.counts(10), (6, 2, 2));
        // 0.5 rounds to 0
        let ratios = SplitRatios { test: 0.1, val: 0.0 };
        assert_eq!(ratios.counts(5), (5, 0, 0));
    }

    #[test]
    fn test_small_tied_split_keeps_training_rows() {
        let ratios = SplitRatios { test: 0.25, val: 0.25 };
        assert_eq!(ratios.counts(2), (2, 0, 0));
        let split = temporal_split(shuffled_rows(2), ratios).unwrap();
        assert_eq!(split.train.len(), 2);
        assert!(split.val.is_empty() && split.test.is_empty());
    }

    #[test]
    fn test_zero_validation_fraction_gives_empty_partition() {
        let split = temporal_split(shuffled_rows(20), SplitRatios { test: 0.2, val: 0.0 }).unwrap();
        assert!(split.val.is_empty());
        assert_eq!(split.test.len(), 4);
        assert_eq!(split.train.len(), 16);
    }

    #[test]
    fn test_tiny_test_fraction_can_be_empty() {
        let split = temporal_split(shuffled_rows(5), SplitRatios { test: 0.1, val: 0.0 }).unwrap();
        assert!(split.test.is_empty());
        assert_eq!(split.train.len(), 5);
    }

    #[test]
    fn test_invalid_fractions_rejected() {
        assert!(temporal_split(shuffled_rows(5), SplitRatios { test: 1.0, val: 0.0 }).is_err());
        assert!(temporal_split(shuffled_rows(5), SplitRatios { test: -0.1, val: 0.0 }).is_err());
        assert!(temporal_split(shuffled_rows(5), SplitRatios { test: 0.6, val: 0.6 }).is_err());
    }

    #[test]
    fn test_same_date_rows_keep_input_order() {
        let day = NaiveDate::from_ymd_opt(2021, 1, 1).unwrap();
        let rows: Vec<Row> = (0..5).map(|i| Row(day, i)).collect();
        let split = temporal_split(rows, SplitRatios { test: 0.4, val: 0.2 }).unwrap();
        let order: Vec<usize> = split
            .train
            .iter()
            .chain(&split.val)
            .chain(&split.test)
            .map(|r| r.1)
            .collect();
        assert_eq!(order, vec![0, 1, 2, 3, 4]);
    }
}
