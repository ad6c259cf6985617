//! Mean / extrema accumulation over a sequence of numeric values
//!
//! Used across sources within one cycle and across points within a
//! history window.

/// Summary produced by an [`Accumulator`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub count: usize,
}

/// Accumulator for calculating mean, min and max over observations
#[derive(Debug, Clone, Default)]
pub struct Accumulator {
    sum: f64,
    min: f64,
    max: f64,
    count: usize,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-finite values are ignored
    pub fn add(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.sum += value;
        self.count += 1;
    }

    /// `None` when nothing was added
    pub fn summary(&self) -> Option<Summary> {
        if self.count == 0 {
            return None;
        }
        // Rounding in the running sum can push the mean a ulp outside the extrema
        let mean = (self.sum / self.count as f64).clamp(self.min, self.max);
        Some(Summary {
            mean,
            min: self.min,
            max: self.max,
            count: self.count,
        })
    }

    pub fn count(&self) -> usize {
        self.count
    }
}

impl Extend<f64> for Accumulator {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for value in iter {
            self.add(value);
        }
    }
}

impl FromIterator<f64> for Accumulator {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut acc = Accumulator::new();
        acc.extend(iter);
        acc
    }
}
