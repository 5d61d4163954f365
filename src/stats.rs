//! Statistics accumulation and distribution summaries
//!
//! Per-window phase metrics are appended under a structured
//! `(phase, metric)` key across the run and reduced to distribution
//! summaries at the end. The reduction is a multiset operation: insertion
//! order never affects the output.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::bench::{BatchStats, Metric, Phase};

/// Number of quantile buckets used for distribution summaries.
///
/// Fewer samples than buckets fall back to reporting the raw values.
pub const QUANTILE_BUCKETS: usize = 10;

/// Composite key identifying one recorded metric stream.
///
/// Rendered as `{phase}-{metric}` in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MetricKey {
    pub phase: Phase,
    pub metric: Metric,
}

impl fmt::Display for MetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.phase, self.metric)
    }
}

/// Reduction of one metric stream over all recorded windows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Summary {
    /// Exactly one sample was recorded; reported unchanged
    Single(f64),
    /// Too few samples for quantiles; the sorted values are reported
    Values {
        count: usize,
        min: f64,
        max: f64,
        values: Vec<f64>,
    },
    /// Decile summary over the sorted samples
    Quantiles {
        count: usize,
        min: f64,
        max: f64,
        deciles: Vec<f64>,
    },
}

impl Summary {
    /// Describe a sample array: quantiles when there are at least
    /// [`QUANTILE_BUCKETS`] samples, the raw values otherwise.
    ///
    /// Samples are sorted internally, so any insertion order yields the
    /// same summary.
    pub fn describe(values: &[f64]) -> Summary {
        assert!(!values.is_empty(), "cannot summarize an empty sample set");
        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).expect("non-finite sample"));
        let min = sorted[0];
        let max = sorted[sorted.len() - 1];
        if sorted.len() < QUANTILE_BUCKETS {
            Summary::Values {
                count: sorted.len(),
                min,
                max,
                values: sorted,
            }
        } else {
            Summary::Quantiles {
                count: sorted.len(),
                min,
                max,
                deciles: quantiles_exclusive(&sorted, QUANTILE_BUCKETS)
                    .into_iter()
                    .map(|q| (q * 100.0).round() / 100.0)
                    .collect(),
            }
        }
    }

    /// Reduce a metric stream: a singleton stays the raw value, anything
    /// larger becomes a distribution.
    pub fn of_samples(values: &[f64]) -> Summary {
        if values.len() == 1 {
            Summary::Single(values[0])
        } else {
            Summary::describe(values)
        }
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Summary::Single(v) => write!(f, "{}", fmt_num(*v)),
            Summary::Values {
                min, max, values, ..
            } => {
                write!(f, "min: {}, max: {}, values: [", fmt_num(*min), fmt_num(*max))?;
                fmt_list(f, values)?;
                write!(f, "]")
            }
            Summary::Quantiles {
                min, max, deciles, ..
            } => {
                write!(f, "min: {}, max: {}, deciles: [", fmt_num(*min), fmt_num(*max))?;
                fmt_list(f, deciles)?;
                write!(f, "]")
            }
        }
    }
}

fn fmt_list(f: &mut fmt::Formatter<'_>, values: &[f64]) -> fmt::Result {
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", fmt_num(*v))?;
    }
    Ok(())
}

/// Integers render bare, everything else with two decimals.
fn fmt_num(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{:.2}", v)
    }
}

/// Interior quantile cut points over sorted data, exclusive method
/// (linear interpolation at positions `k * (len + 1) / n`).
///
/// Returns `n - 1` points. Requires `data.len() >= 2`.
fn quantiles_exclusive(data: &[f64], n: usize) -> Vec<f64> {
    let ld = data.len();
    debug_assert!(ld >= 2 && n >= 2);
    let m = ld + 1;
    (1..n)
        .map(|k| {
            let delta = (k * m) % n;
            let j = ((k * m) / n).clamp(1, ld - 1);
            (data[j - 1] * (n - delta) as f64 + data[j] * delta as f64) / n as f64
        })
        .collect()
}

/// Append-only accumulator of per-window metric samples.
///
/// Owned by the orchestrator for the run's lifetime; windows are processed
/// sequentially so no synchronization is needed.
#[derive(Debug, Default)]
pub struct StatsAccumulator {
    samples: BTreeMap<MetricKey, Vec<f64>>,
}

impl StatsAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one sample under `(phase, metric)`.
    pub fn record(&mut self, phase: Phase, metric: Metric, value: f64) {
        self.samples
            .entry(MetricKey { phase, metric })
            .or_default()
            .push(value);
    }

    /// Append every metric of a completed window.
    pub fn record_batch(&mut self, batch: &BatchStats) {
        for (phase, stats) in batch.phases() {
            for (&metric, &value) in stats {
                self.record(phase, metric, value);
            }
        }
    }

    /// Number of distinct `(phase, metric)` keys recorded so far.
    pub fn key_count(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Reduce every recorded stream to its summary. Deterministic for a
    /// given multiset of samples.
    pub fn summarize(&self) -> BTreeMap<MetricKey, Summary> {
        self.samples
            .iter()
            .map(|(key, values)| (*key, Summary::of_samples(values)))
            .collect()
    }
}
