//! Candidate evaluation and model selection
//!
//! Every candidate is fitted on train, scored on val and test, and the one
//! with the strictly lowest validation log loss wins. Ties keep the earlier
//! candidate.

use crate::data::FeatureMatrix;
use crate::training::estimator::Classifier;
use crate::training::metrics::{EvalMetrics, MetricsReport};
use crate::Result;

/// Features and labels of one partition
#[derive(Debug, Clone, Copy)]
pub struct Partition<'a> {
    pub features: &'a FeatureMatrix,
    pub labels: &'a [u8],
}

/// A fitted candidate with its scores
pub struct Evaluated<C> {
    pub classifier: C,
    pub val: EvalMetrics,
    pub test: EvalMetrics,
}

/// All evaluated candidates and the index of the winner
pub struct Selection<C> {
    pub candidates: Vec<Evaluated<C>>,
    pub best: usize,
}

impl<C: Classifier> Selection<C> {
    pub fn best(&self) -> &Evaluated<C> {
        &self.candidates[self.best]
    }

    pub fn into_best(mut self) -> Evaluated<C> {
        self.candidates.swap_remove(self.best)
    }

    /// Flat `<model>_<split>_<metric>` report over every candidate
    pub fn report(&self) -> MetricsReport {
        let mut report = MetricsReport::new();
        for c in &self.candidates {
            report.record(c.classifier.name(), "val", &c.val);
            report.record(c.classifier.name(), "test", &c.test);
        }
        report
    }
}

/// Index of the lowest validation loss
///
/// Only a strictly lower loss displaces the current best. Undefined losses
/// rank after every defined one; if none is defined the first candidate is
/// chosen.
pub fn select_best(val_losses: &[Option<f64>]) -> Option<usize> {
    if val_losses.is_empty() {
        return None;
    }

    let mut best: Option<(usize, f64)> = None;
    for (i, loss) in val_losses.iter().enumerate() {
        if let Some(loss) = loss {
            match best {
                Some((_, best_loss)) if *loss >= best_loss => {}
                _ => best = Some((i, *loss)),
            }
        }
    }

    match best {
        Some((i, _)) => Some(i),
        None => {
            log::warn!("No candidate has a defined validation loss; keeping the first");
            Some(0)
        }
    }
}

/// Fit, evaluate and select among `candidates`, in order
pub fn evaluate_candidates<C: Classifier>(
    candidates: Vec<C>,
    train: Partition<'_>,
    val: Partition<'_>,
    test: Partition<'_>,
) -> Result<Selection<C>> {
    let mut evaluated = Vec::with_capacity(candidates.len());
    for mut classifier in candidates {
        classifier.fit(train.features, train.labels)?;

        let val_metrics = EvalMetrics::compute(val.labels, &classifier.predict_proba(val.features)?);
        let test_metrics =
            EvalMetrics::compute(test.labels, &classifier.predict_proba(test.features)?);
        log::info!("{} val: {}", classifier.name(), val_metrics);
        log::info!("{} test: {}", classifier.name(), test_metrics);

        evaluated.push(Evaluated {
            classifier,
            val: val_metrics,
            test: test_metrics,
        });
    }

    let losses: Vec<Option<f64>> = evaluated.iter().map(|c| c.val.log_loss).collect();
    let best = select_best(&losses)
        .ok_or_else(|| crate::HoopsError::Model("no candidate estimators".to_string()))?;
    log::info!(
        "Selected {} (val logloss {:?})",
        evaluated[best].classifier.name(),
        evaluated[best].val.log_loss
    );

    Ok(Selection {
        candidates: evaluated,
        best,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Predicts a constant probability and records whether it was fitted
    struct Constant {
        name: &'static str,
        p: f64,
        fitted_rows: usize,
    }

    impl Constant {
        fn new(name: &'static str, p: f64) -> Self {
            Constant {
                name,
                p,
                fitted_rows: 0,
            }
        }
    }

    impl Classifier for Constant {
        fn name(&self) -> &str {
            self.name
        }

        fn fit(&mut self, features: &FeatureMatrix, _labels: &[u8]) -> Result<()> {
            self.fitted_rows = features.n_rows();
            Ok(())
        }

        fn predict_proba(&self, features: &FeatureMatrix) -> Result<Vec<f64>> {
            Ok(vec![self.p; features.n_rows()])
        }
    }

    fn matrix(n: usize) -> FeatureMatrix {
        FeatureMatrix {
            columns: vec!["x".to_string()],
            rows: vec![vec![Some(0.0)]; n],
        }
    }

    #[test]
    fn test_lower_loss_wins() {
        assert_eq!(select_best(&[Some(0.60), Some(0.55)]), Some(1));
        assert_eq!(select_best(&[Some(0.55), Some(0.60)]), Some(0));
    }

    #[test]
    fn test_tie_keeps_first() {
        assert_eq!(select_best(&[Some(0.5), Some(0.5), Some(0.5)]), Some(0));
        assert_eq!(select_best(&[Some(0.7), Some(0.5), Some(0.5)]), Some(1));
    }

    #[test]
    fn test_undefined_loss_ranks_last() {
        assert_eq!(select_best(&[None, Some(0.9)]), Some(1));
        assert_eq!(select_best(&[None, None]), Some(0));
        assert_eq!(select_best(&[]), None);
    }

    #[test]
    fn test_selects_candidate_with_lower_validation_logloss() {
        // All-positive labels make each log loss exactly -ln(p)
        let candidates = vec![
            Constant::new("first", (-0.60f64).exp()),
            Constant::new("second", (-0.55f64).exp()),
        ];
        let train_x = matrix(6);
        let val_x = matrix(4);
        let test_x = matrix(2);
        let train_y = [1, 0, 1, 0, 1, 0];
        let val_y = [1, 1, 1, 1];
        let test_y = [1, 0];

        let selection = evaluate_candidates(
            candidates,
            Partition { features: &train_x, labels: &train_y },
            Partition { features: &val_x, labels: &val_y },
            Partition { features: &test_x, labels: &test_y },
        )
        .unwrap();

        assert_eq!(selection.best, 1);
        assert_eq!(selection.best().classifier.name(), "second");
        assert!((selection.candidates[0].val.log_loss.unwrap() - 0.60).abs() < 1e-9);
        assert!(selection.candidates.iter().all(|c| c.classifier.fitted_rows == 6));

        let report = selection.report();
        assert_eq!(report.0.len(), 12);
        assert!((report.get("second_val_logloss").unwrap() - 0.55).abs() < 1e-9);
        // Single-class validation labels
        assert_eq!(report.get("first_val_roc_auc"), None);
        assert_eq!(report.get("first_test_roc_auc"), Some(0.5));

        let best = selection.into_best();
        assert_eq!(best.classifier.name(), "second");
    }
}
