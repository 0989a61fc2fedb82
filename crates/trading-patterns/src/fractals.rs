//! Five-bar fractal detection.
//!
//! A fractal is reported on the bar that completes its window, i.e. index
//! `i` covers bars `i-4..=i` with the extremum at `i-2`. The first four
//! entries of every output are always `false`.

use serde::{Deserialize, Serialize};

/// Bars in a fractal window.
pub const FRACTAL_WINDOW: usize = 5;

/// Which comparison rule identifies a fractal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FractalRule {
    /// Strictly rising then strictly falling highs (mirrored for lows).
    #[default]
    Regular,
    /// Center bar dominates; ties are allowed on the inner left and right neighbours.
    BillWilliams,
}

/// Top and bottom flags aligned with the input bars.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fractals {
    pub tops: Vec<bool>,
    pub bottoms: Vec<bool>,
}

impl FractalRule {
    fn is_top(&self, h: &[f64]) -> bool {
        match self {
            FractalRule::Regular => h[0] < h[1] && h[1] < h[2] && h[2] > h[3] && h[3] > h[4],
            FractalRule::BillWilliams => h[0] < h[2] && h[1] <= h[2] && h[2] >= h[3] && h[2] > h[4],
        }
    }

    fn is_bottom(&self, l: &[f64]) -> bool {
        match self {
            FractalRule::Regular => l[0] > l[1] && l[1] > l[2] && l[2] < l[3] && l[3] < l[4],
            FractalRule::BillWilliams => l[0] > l[2] && l[1] >= l[2] && l[2] <= l[3] && l[2] < l[4],
        }
    }
}

/// Flag top fractals on `high` and bottom fractals on `low`.
pub fn detect_fractals(high: &[f64], low: &[f64], rule: FractalRule) -> Fractals {
    let n = high.len().min(low.len());
    let mut fractals = Fractals {
        tops: vec![false; n],
        bottoms: vec![false; n],
    };
    if n < FRACTAL_WINDOW {
        return fractals;
    }

    for i in (FRACTAL_WINDOW - 1)..n {
        let start = i + 1 - FRACTAL_WINDOW;
        fractals.tops[i] = rule.is_top(&high[start..=i]);
        fractals.bottoms[i] = rule.is_bottom(&low[start..=i]);
    }
    fractals
}
