//! Final run report
//!
//! Collects the aggregated `{phase}-{metric}` summaries, the overall
//! quality scores (with and without stop-token truncation), and the
//! descriptive length statistics for prompts, references, and predictions.
//! Every recorded key appears exactly once.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::stats::{MetricKey, Summary};

/// Character lengths of a text list, for descriptive statistics.
pub fn char_lengths(texts: &[String]) -> Vec<f64> {
    texts.iter().map(|t| t.chars().count() as f64).collect()
}

/// The complete output of one benchmark run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// One entry per recorded `{phase}-{metric}` key, in key order
    pub aggregated: Vec<(String, Summary)>,

    /// Number of scored predictions (one per dataset row measured)
    pub num_predictions: usize,

    /// Quality scores over the full decoded outputs
    pub accuracy: BTreeMap<String, f64>,

    /// Quality scores over the stop-token-truncated outputs
    pub accuracy_stop: BTreeMap<String, f64>,

    pub predicted_str_len: Summary,
    pub predicted_str_len_stop: Summary,
    pub target_str_len: Summary,
    pub prompt_str_len: Summary,
}

impl RunReport {
    /// Build the aggregated section from a stats summary, preserving the
    /// key order and rendering each key as `{phase}-{metric}`.
    pub fn aggregated_from(summaries: BTreeMap<MetricKey, Summary>) -> Vec<(String, Summary)> {
        summaries
            .into_iter()
            .map(|(key, summary)| (key.to_string(), summary))
            .collect()
    }

    /// Look up one aggregated entry by its rendered key.
    pub fn aggregate(&self, key: &str) -> Option<&Summary> {
        self.aggregated
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, s)| s)
    }
}

fn write_scores(f: &mut fmt::Formatter<'_>, scores: &BTreeMap<String, f64>) -> fmt::Result {
    write!(f, "{{")?;
    for (i, (name, value)) in scores.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}: {}", name, value)?;
    }
    write!(f, "}}")
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Results")?;
        for (key, summary) in &self.aggregated {
            writeln!(f, "\t{}: {}", key, summary)?;
        }
        writeln!(f)?;
        write!(f, "Accuracy (over {} requests): ", self.num_predictions)?;
        write_scores(f, &self.accuracy)?;
        writeln!(f)?;
        write!(
            f,
            "Accuracy (over {} requests with stop tokens): ",
            self.num_predictions
        )?;
        write_scores(f, &self.accuracy_stop)?;
        writeln!(f)?;
        writeln!(f, "predicted_str_len - {}", self.predicted_str_len)?;
        writeln!(f, "predicted_str_len_stop - {}", self.predicted_str_len_stop)?;
        writeln!(f, "target_str_len - {}", self.target_str_len)?;
        write!(f, "prompt_str_len - {}", self.prompt_str_len)
    }
}
