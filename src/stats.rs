//! Mergeable running statistics.
//!
//! [`Stats`] accumulates values one at a time (`stats += v`)
//! and merges with other accumulators (`stats += &other`), so
//! it can be folded/reduced across rayon workers.

use std::{iter::FromIterator, ops::AddAssign};

use serde_derive::*;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Stats {
    count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    mean: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    variance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max: Option<f64>,
    #[serde(skip)]
    m2: f64,
}

impl Default for Stats {
    fn default() -> Self {
        Stats {
            count: 0,
            mean: None,
            variance: None,
            min: None,
            max: None,
            m2: 0.,
        }
    }
}

impl Stats {
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn mean(&self) -> Option<f64> {
        self.mean
    }

    /// Population variance (divides by `n`, not `n - 1`).
    pub fn variance(&self) -> Option<f64> {
        self.variance
    }

    pub fn min(&self) -> Option<f64> {
        self.min
    }

    pub fn max(&self) -> Option<f64> {
        self.max
    }

    fn refresh_variance(&mut self) {
        self.variance = if self.count > 0 {
            Some(self.m2 / self.count as f64)
        } else {
            None
        };
    }
}

impl FromIterator<f64> for Stats {
    fn from_iter<I: IntoIterator<Item = f64>>(values: I) -> Self {
        let mut stats = Stats::default();
        for v in values {
            stats += v;
        }
        stats
    }
}

impl AddAssign<f64> for Stats {
    // Welford's update
    fn add_assign(&mut self, val: f64) {
        self.count += 1;
        let mean = self.mean.unwrap_or(0.);
        let delta = val - mean;
        let mean = mean + delta / self.count as f64;
        self.m2 += delta * (val - mean);
        self.mean = Some(mean);
        self.min = Some(self.min.map_or(val, |m| m.min(val)));
        self.max = Some(self.max.map_or(val, |m| m.max(val)));
        self.refresh_variance();
    }
}

impl AddAssign<&Stats> for Stats {
    // Chan et al. pairwise merge
    fn add_assign(&mut self, other: &Stats) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = other.clone();
            return;
        }

        let (na, nb) = (self.count as f64, other.count as f64);
        let n = na + nb;
        let (ma, mb) = (self.mean.unwrap_or(0.), other.mean.unwrap_or(0.));
        let delta = mb - ma;

        self.count += other.count;
        self.mean = Some(ma + delta * nb / n);
        self.m2 += other.m2 + delta * delta * na * nb / n;
        self.min = match (self.min, other.min) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        self.max = match (self.max, other.max) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        self.refresh_variance();
    }
}
