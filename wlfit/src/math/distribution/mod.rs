//! Fixed-bin weighted distribution with running moments.
//!
//! Used by centroid refinement to pick an intensity threshold, and general
//! enough for inverse-CDF sampling once made cumulative.

use serde::{Deserialize, Serialize};


/// A value together with its statistical weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightedSample {
    pub value: f64,
    pub weight: f64,
}

impl WeightedSample {
    pub fn new(value: f64, weight: f64) -> Self {
        Self { value, weight }
    }

    /// Sample with weight 1.
    pub fn unit(value: f64) -> Self {
        Self { value, weight: 1.0 }
    }
}

/// Weighted histogram over `[min, min + step * bins)`.
///
/// Besides the bins it keeps `total`, `sum` and `sum2` of every accepted
/// sample, the tallest bin (`peak`) and the largest value seen (`max`).
/// After [`make_cumulative`](Self::make_cumulative) the bins hold the
/// normalized CDF and the distribution no longer accepts data.
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    min: f64,
    step: f64,
    bins: Vec<f64>,
    cumulative: bool,
    total: f64,
    sum: f64,
    sum2: f64,
    peak: f64,
    max: f64,
    max_bin: usize,
}

impl Distribution {
    /// # Panics
    ///
    /// Panics if `step` is not positive or `bin_count` is zero.
    pub fn new(min: f64, step: f64, bin_count: usize) -> Self {
        assert!(step > 0.0, "Distribution step must be positive, got {step}");
        assert!(bin_count > 0, "Distribution needs at least one bin");
        Self {
            min,
            step,
            bins: vec![0.0; bin_count],
            cumulative: false,
            total: 0.0,
            sum: 0.0,
            sum2: 0.0,
            peak: 0.0,
            max: min,
            max_bin: 0,
        }
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    /// Largest value appended so far (`min` while empty).
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Bin index of [`max`](Self::max).
    pub fn max_bin(&self) -> usize {
        self.max_bin
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    pub fn bins(&self) -> &[f64] {
        &self.bins
    }

    pub fn bin_count(&self) -> usize {
        self.bins.len()
    }

    pub fn is_cumulative(&self) -> bool {
        self.cumulative
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn sum(&self) -> f64 {
        self.sum
    }

    pub fn sum2(&self) -> f64 {
        self.sum2
    }

    /// Height of the tallest bin.
    pub fn peak(&self) -> f64 {
        self.peak
    }

    /// Center of bin `i` in argument units.
    pub fn bin_center(&self, i: usize) -> f64 {
        self.min + (i as f64 + 0.5) * self.step
    }

    pub fn append(&mut self, sample: WeightedSample) {
        if self.cumulative {
            return;
        }
        let WeightedSample { value, weight } = sample;
        if !(value >= self.min && weight > 0.0) || !value.is_finite() || !weight.is_finite() {
            return;
        }
        let i = ((value - self.min) / self.step).floor() as usize;
        if i >= self.bins.len() {
            return;
        }

        self.bins[i] += weight;
        self.total += weight;
        self.sum += value * weight;
        self.sum2 += value * value * weight;
        if value > self.max {
            self.max = value;
            self.max_bin = i;
        }
        if self.bins[i] > self.peak {
            self.peak = self.bins[i];
        }
    }

    pub fn append_value(&mut self, value: f64, weight: f64) {
        self.append(WeightedSample::new(value, weight));
    }

    /// Scales the bins to unit sum.
    ///
    /// The sum is recomputed from the bins, so calling it twice is harmless.
    /// Does nothing on a cumulative or empty distribution.
    pub fn normalize(&mut self) {
        if self.cumulative {
            return;
        }
        let sum: f64 = self.bins.iter().sum();
        if sum == 0.0 {
            return;
        }
        self.peak = self.bins.iter().copied().fold(0.0, f64::max) / sum;
        self.bins.iter_mut().for_each(|b| *b /= sum);
    }

    /// Normalizes and turns the bins into a running sum. Irreversible.
    pub fn make_cumulative(&mut self) {
        if self.cumulative {
            return;
        }
        self.normalize();
        let mut acc = 0.0;
        for b in self.bins.iter_mut() {
            acc += *b;
            *b = acc;
        }
        self.cumulative = true;
    }

    /// Adds `other` into `self`.
    ///
    /// Returns `false` and leaves `self` untouched when the binning differs or
    /// either side is already cumulative.
    pub fn merge(&mut self, other: &Distribution) -> bool {
        if self.cumulative
            || other.cumulative
            || self.min != other.min
            || self.step != other.step
            || self.bins.len() != other.bins.len()
        {
            return false;
        }

        for (dst, &src) in self.bins.iter_mut().zip(&other.bins) {
            *dst += src;
        }
        self.total += other.total;
        self.sum += other.sum;
        self.sum2 += other.sum2;
        if other.max > self.max {
            self.max = other.max;
            self.max_bin = other.max_bin;
        }
        self.peak = self.bins.iter().copied().fold(0.0, f64::max);
        true
    }

    /// Weighted mean of the accepted samples, 0 when empty.
    pub fn mean(&self) -> f64 {
        if self.total > 0.0 {
            self.sum / self.total
        } else {
            0.0
        }
    }

    /// Weighted population standard deviation, 0 when empty.
    pub fn stdev(&self) -> f64 {
        if self.total > 0.0 {
            let var = (self.sum2 - self.sum * self.sum / self.total) / self.total;
            var.max(0.0).sqrt()
        } else {
            0.0
        }
    }

    /// Inverse CDF: the argument at which the cumulative bins reach `f`.
    ///
    /// Returns `None` unless the distribution is cumulative. Interpolates
    /// linearly across the first bin whose cumulative value reaches `f`.
    pub fn sample(&self, f: f64) -> Option<f64> {
        if !self.cumulative {
            return None;
        }
        if f < 0.0 {
            return Some(self.min);
        }
        if f > 1.0 {
            return Some(self.max);
        }

        let Some(i) = self.bins.iter().position(|&d| d >= f) else {
            return Some(self.max);
        };
        let lower = if i == 0 { 0.0 } else { self.bins[i - 1] };
        let upper = self.bins[i];
        let x = if upper == lower {
            self.min + i as f64 * self.step
        } else {
            self.min + (i as f64 + (f - lower) / (upper - lower)) * self.step
        };
        Some(x.clamp(self.min, self.max))
    }

    /// Cumulative value at argument `x`, the counterpart of [`sample`](Self::sample).
    ///
    /// 0 at or below `min`, 1 at or above `max`, linear inside a bin.
    /// Returns `None` unless the distribution is cumulative.
    pub fn value_at(&self, x: f64) -> Option<f64> {
        if !self.cumulative {
            return None;
        }
        if x <= self.min {
            return Some(0.0);
        }
        if x >= self.max {
            return Some(1.0);
        }
        let pos = (x - self.min) / self.step;
        let i = pos.floor() as usize;
        if i >= self.bins.len() {
            return Some(1.0);
        }
        let frac = pos - i as f64;
        let lower = if i == 0 { 0.0 } else { self.bins[i - 1] };
        Some(lower + frac * (self.bins[i] - lower))
    }
}
