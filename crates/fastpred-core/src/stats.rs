// crates/fastpred-core/src/stats.rs

/// Count, sum and sum of squares of the scores of one query iteration.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunningStats {
    pub count: u64,
    pub sum: f64,
    pub sum_squares: f64,
}

impl RunningStats {
    pub fn push(&mut self, x: f64) {
        self.count += 1;
        self.sum += x;
        self.sum_squares += x * x;
    }

    pub fn mean(&self) -> f64 {
        self.sum / self.count as f64
    }

    /// Sample standard deviation in single-pass form:
    /// `sqrt(sum_sq/(n-1) - sum^2/((n-1)*n))`.
    ///
    /// Kept in exactly this algebraic form so scores stay bit-identical with
    /// previously published results. `n <= 1` yields NaN (or infinity), which
    /// callers propagate.
    pub fn stdev(&self) -> f64 {
        let n = self.count as f64;
        (self.sum_squares / (n - 1.0) - (self.sum * self.sum) / ((n - 1.0) * n)).sqrt()
    }

    pub fn moments(&self) -> Moments {
        Moments { mean: self.mean(), stdev: self.stdev() }
    }
}

impl FromIterator<f64> for RunningStats {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut s = RunningStats::default();
        for x in iter {
            s.push(x);
        }
        s
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Moments {
    pub mean: f64,
    pub stdev: f64,
}

impl Moments {
    pub fn zscore(&self, x: f64) -> f64 {
        (x - self.mean) / self.stdev
    }
}
