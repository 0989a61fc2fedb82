//! Trend-strength indicators.

use trading_core::traits::HlcIndicator;

/// Average Directional Index with Wilder smoothing, in the 0..=100 range.
#[derive(Debug, Clone)]
pub struct Adx {
    period: usize,
}

impl Adx {
    pub fn new(period: usize) -> Self {
        assert!(period > 0, "Period must be greater than 0");
        Self { period }
    }

    /// Directional index per bar, starting at bar `period`.
    fn dx(&self, high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
        let n = high.len().min(low.len()).min(close.len());
        if n <= self.period {
            return vec![];
        }

        let mut tr = Vec::with_capacity(n - 1);
        let mut plus_dm = Vec::with_capacity(n - 1);
        let mut minus_dm = Vec::with_capacity(n - 1);
        for i in 1..n {
            let up = high[i] - high[i - 1];
            let down = low[i - 1] - low[i];
            plus_dm.push(if up > down && up > 0.0 { up } else { 0.0 });
            minus_dm.push(if down > up && down > 0.0 { down } else { 0.0 });
            let range = high[i] - low[i];
            let gap_up = (high[i] - close[i - 1]).abs();
            let gap_down = (low[i] - close[i - 1]).abs();
            tr.push(range.max(gap_up).max(gap_down));
        }

        let p = self.period as f64;
        let mut s_tr: f64 = tr[..self.period].iter().sum();
        let mut s_plus: f64 = plus_dm[..self.period].iter().sum();
        let mut s_minus: f64 = minus_dm[..self.period].iter().sum();

        let dx_of = |tr: f64, plus: f64, minus: f64| {
            if tr == 0.0 {
                return 0.0;
            }
            let di_plus = 100.0 * plus / tr;
            let di_minus = 100.0 * minus / tr;
            let sum = di_plus + di_minus;
            if sum == 0.0 {
                0.0
            } else {
                100.0 * (di_plus - di_minus).abs() / sum
            }
        };

        let mut out = Vec::with_capacity(n - self.period);
        out.push(dx_of(s_tr, s_plus, s_minus));
        for j in self.period..tr.len() {
            s_tr = s_tr - s_tr / p + tr[j];
            s_plus = s_plus - s_plus / p + plus_dm[j];
            s_minus = s_minus - s_minus / p + minus_dm[j];
            out.push(dx_of(s_tr, s_plus, s_minus));
        }
        out
    }
}

impl HlcIndicator for Adx {
    fn calculate(&self, high: &[f64], low: &[f64], close: &[f64]) -> Vec<f64> {
        let dx = self.dx(high, low, close);
        if dx.len() < self.period {
            return vec![];
        }

        let p = self.period as f64;
        let mut adx = dx[..self.period].iter().sum::<f64>() / p;
        let mut out = Vec::with_capacity(dx.len() - self.period + 1);
        out.push(adx);
        for &value in &dx[self.period..] {
            adx = (adx * (p - 1.0) + value) / p;
            out.push(adx);
        }
        out
    }

    fn lookback(&self) -> usize {
        2 * self.period - 1
    }

    fn name(&self) -> &str {
        "ADX"
    }
}

/// Least-squares slope of `values` against their index.
///
/// Returns `None` for fewer than two points.
pub fn regression_slope(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let n_f = n as f64;
    let mean_x = (n_f - 1.0) / 2.0;
    let mean_y = values.iter().sum::<f64>() / n_f;

    let (num, den) = values
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (i, y)| {
            let dx = i as f64 - mean_x;
            (num + dx * (y - mean_y), den + dx * dx)
        });

    Some(num / den)
}
