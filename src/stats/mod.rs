//! Telemetry sink
//!
//! Flat dotted keys (`colonies.W1N1.production.avg_usage`) to numbers.
//! A key holds the last value logged under it.

use crate::core::constants::STATS_DECIMALS;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    values: BTreeMap<String, f64>,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a value, truncated to the telemetry precision
    pub fn log(&mut self, key: impl Into<String>, value: f64) {
        self.values
            .insert(key.into(), truncate(value, STATS_DECIMALS));
    }

    /// Record every entry of `values` under `key.<entry>`
    pub fn log_map<K: Display>(&mut self, key: &str, values: impl IntoIterator<Item = (K, f64)>) {
        for (sub, value) in values {
            self.log(format!("{}.{}", key, sub), value);
        }
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.values.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Cut `value` to `decimals` places without rounding
pub fn truncate(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).trunc() / scale
}

/// Exponential-style average over roughly `window` samples
pub fn rolling_average(current: f64, average: f64, window: u32) -> f64 {
    let window = window.max(1) as f64;
    (current + average * (window - 1.0)) / window
}
