//! Evaluation metrics for binary win probabilities

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::Result;

/// Probability clip applied before taking logs
const LOG_LOSS_EPS: f64 = 1e-15;

/// Decision threshold for accuracy
pub const THRESHOLD: f64 = 0.5;

/// Area under the ROC curve
///
/// Rank-based (Mann-Whitney) with tied scores sharing their average rank.
/// Undefined when only one class is present.
pub fn roc_auc(labels: &[u8], probs: &[f64]) -> Option<f64> {
    let n_pos = labels.iter().filter(|y| **y == 1).count();
    let n_neg = labels.len() - n_pos;
    if n_pos == 0 || n_neg == 0 {
        return None;
    }

    let mut order: Vec<usize> = (0..probs.len()).collect();
    order.sort_by(|a, b| probs[*a].total_cmp(&probs[*b]));

    let mut pos_rank_sum = 0.0;
    let mut i = 0;
    while i < order.len() {
        let mut j = i;
        while j + 1 < order.len() && probs[order[j + 1]] == probs[order[i]] {
            j += 1;
        }
        // 1-based ranks i+1..=j+1 share their mean
        let avg_rank = (i + j) as f64 / 2.0 + 1.0;
        for idx in &order[i..=j] {
            if labels[*idx] == 1 {
                pos_rank_sum += avg_rank;
            }
        }
        i = j + 1;
    }

    let n_pos = n_pos as f64;
    let n_neg = n_neg as f64;
    Some((pos_rank_sum - n_pos * (n_pos + 1.0) / 2.0) / (n_pos * n_neg))
}

/// Mean binary cross-entropy
pub fn log_loss(labels: &[u8], probs: &[f64]) -> Option<f64> {
    if labels.is_empty() {
        return None;
    }
    let total: f64 = labels
        .iter()
        .zip(probs)
        .map(|(y, p)| {
            let p = p.clamp(LOG_LOSS_EPS, 1.0 - LOG_LOSS_EPS);
            if *y == 1 {
                -p.ln()
            } else {
                -(1.0 - p).ln()
            }
        })
        .sum();
    Some(total / labels.len() as f64)
}

/// Fraction of rows where `p >= 0.5` matches the label
pub fn accuracy(labels: &[u8], probs: &[f64]) -> Option<f64> {
    if labels.is_empty() {
        return None;
    }
    let correct = labels
        .iter()
        .zip(probs)
        .filter(|(y, p)| (**p >= THRESHOLD) == (**y == 1))
        .count();
    Some(correct as f64 / labels.len() as f64)
}

/// Metrics for one model on one partition
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EvalMetrics {
    pub roc_auc: Option<f64>,
    pub log_loss: Option<f64>,
    pub accuracy: Option<f64>,
}

impl EvalMetrics {
    pub fn compute(labels: &[u8], probs: &[f64]) -> Self {
        EvalMetrics {
            roc_auc: roc_auc(labels, probs),
            log_loss: log_loss(labels, probs),
            accuracy: accuracy(labels, probs),
        }
    }
}

fn fmt_metric(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.4}", v))
}

impl fmt::Display for EvalMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "auc={} logloss={} acc={}",
            fmt_metric(self.roc_auc),
            fmt_metric(self.log_loss),
            fmt_metric(self.accuracy)
        )
    }
}

/// Flat metrics artifact, keyed `<model>_<split>_<metric>`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricsReport(pub BTreeMap<String, Option<f64>>);

impl MetricsReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, model: &str, split: &str, metrics: &EvalMetrics) {
        for (name, value) in [
            ("roc_auc", metrics.roc_auc),
            ("logloss", metrics.log_loss),
            ("accuracy", metrics.accuracy),
        ] {
            self.0.insert(format!("{}_{}_{}", model, split, name), value);
        }
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).copied().flatten()
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| crate::HoopsError::Parse(e.to_string()))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| crate::HoopsError::Parse(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roc_auc_perfect_and_inverted() {
        let labels = [0, 0, 1, 1];
        assert_eq!(roc_auc(&labels, &[0.1, 0.2, 0.8, 0.9]), Some(1.0));
        assert_eq!(roc_auc(&labels, &[0.9, 0.8, 0.2, 0.1]), Some(0.0));
    }

    #[test]
    fn test_roc_auc_ties_count_half() {
        let labels = [0, 1];
        assert_eq!(roc_auc(&labels, &[0.5, 0.5]), Some(0.5));

        // One tied pair out of four
        let labels = [0, 0, 1, 1];
        let auc = roc_auc(&labels, &[0.1, 0.6, 0.6, 0.9]).unwrap();
        assert!((auc - 0.875).abs() < 1e-12);
    }

    #[test]
    fn test_roc_auc_single_class_undefined() {
        assert_eq!(roc_auc(&[1, 1, 1], &[0.2, 0.5, 0.9]), None);
        assert_eq!(roc_auc(&[], &[]), None);
    }

    #[test]
    fn test_log_loss() {
        let loss = log_loss(&[1, 0], &[0.8, 0.2]).unwrap();
        assert!((loss - (-(0.8f64).ln())).abs() < 1e-12);

        // Clipped, so certain wrong answers stay finite
        let loss = log_loss(&[1], &[0.0]).unwrap();
        assert!(loss.is_finite());
        assert!(loss > 30.0);

        assert_eq!(log_loss(&[], &[]), None);
    }

    #[test]
    fn test_accuracy_threshold_inclusive() {
        assert_eq!(accuracy(&[1, 0, 1, 0], &[0.5, 0.49, 0.2, 0.9]), Some(0.5));
    }

    #[test]
    fn test_report_keys() {
        let mut report = MetricsReport::new();
        report.record(
            "lr",
            "val",
            &EvalMetrics {
                roc_auc: None,
                log_loss: Some(0.6),
                accuracy: Some(0.7),
            },
        );
        assert_eq!(report.get("lr_val_logloss"), Some(0.6));
        assert_eq!(report.get("lr_val_roc_auc"), None);
        assert!(report.0.contains_key("lr_val_roc_auc"));
        assert_eq!(report.0.len(), 3);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.json");
        report.save(&path).unwrap();
        let json = std::fs::read_to_string(&path).unwrap();
        assert!(json.contains("\"lr_val_roc_auc\": null"));
        let loaded = MetricsReport::load(&path).unwrap();
        assert_eq!(loaded.get("lr_val_accuracy"), Some(0.7));
    }
}
