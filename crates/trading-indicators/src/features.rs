//! Normalized indicator features.
//!
//! Each feature is an input-aligned series over a bar window:
//! non-finite values become 0, oscillators (RSI, CCI, WT) are min-max
//! scaled to [0, 1] over the window (a constant series scales to all zeros),
//! and ADX is divided by 100. A window too short for the indicator, or an
//! unknown indicator name, yields `None`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use trading_core::traits::{HlcIndicator, Indicator};
use trading_core::Bar;

use crate::momentum::{Cci, Rsi, WaveTrend};
use crate::simd::minmax_simd;
use crate::trend::Adx;

/// Scalar substituted for an unavailable indicator signal.
pub const NEUTRAL: f64 = 0.5;

/// Indicator families usable as model features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FeatureKind {
    Rsi,
    Wt,
    Cci,
    Adx,
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FeatureKind::Rsi => "RSI",
            FeatureKind::Wt => "WT",
            FeatureKind::Cci => "CCI",
            FeatureKind::Adx => "ADX",
        };
        f.write_str(s)
    }
}

impl FromStr for FeatureKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "RSI" => Ok(FeatureKind::Rsi),
            "WT" => Ok(FeatureKind::Wt),
            "CCI" => Ok(FeatureKind::Cci),
            "ADX" => Ok(FeatureKind::Adx),
            _ => Err(format!("Unknown feature indicator: {}", s)),
        }
    }
}

/// One configured feature: indicator kind plus its parameters.
///
/// `param_b` is only read by WaveTrend (average length).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureSpec {
    pub kind: FeatureKind,
    pub param_a: usize,
    #[serde(default = "default_param_b")]
    pub param_b: usize,
}

fn default_param_b() -> usize {
    1
}

impl FeatureSpec {
    pub const fn new(kind: FeatureKind, param_a: usize, param_b: usize) -> Self {
        Self {
            kind,
            param_a,
            param_b,
        }
    }

    /// Default feature set: RSI(9), WT(10, 12), CCI(20), ADX(20).
    pub fn defaults() -> Vec<FeatureSpec> {
        vec![
            FeatureSpec::new(FeatureKind::Rsi, 9, 1),
            FeatureSpec::new(FeatureKind::Wt, 10, 12),
            FeatureSpec::new(FeatureKind::Cci, 20, 1),
            FeatureSpec::new(FeatureKind::Adx, 20, 2),
        ]
    }

    /// Bars needed before the latest value is defined.
    pub fn warmup(&self) -> usize {
        match self.kind {
            FeatureKind::Rsi => self.param_a + 1,
            FeatureKind::Cci => self.param_a,
            FeatureKind::Adx => 2 * self.param_a,
            FeatureKind::Wt => 2 * self.param_a + self.param_b + 1,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        let min_a = match self.kind {
            FeatureKind::Cci => 2,
            _ => 1,
        };
        if self.param_a < min_a {
            return Err(format!("{} length must be at least {}", self.kind, min_a));
        }
        if self.kind == FeatureKind::Wt && self.param_b == 0 {
            return Err("WT average length must be at least 1".to_string());
        }
        Ok(())
    }
}

/// Left-pad a compact indicator output with NaN to `len` entries.
pub fn align(values: Vec<f64>, len: usize) -> Vec<f64> {
    let pad = len.saturating_sub(values.len());
    let mut out = vec![f64::NAN; pad];
    out.extend(values);
    out
}

/// Replace NaN and infinities with 0.
pub fn sanitize(values: &mut [f64]) {
    for v in values.iter_mut() {
        if !v.is_finite() {
            *v = 0.0;
        }
    }
}

/// Min-max scale into [0, 1]; a constant series becomes all zeros.
pub fn min_max_normalize(values: &mut [f64]) {
    let Some((min, max)) = minmax_simd(values) else {
        return;
    };
    let range = max - min;
    for v in values.iter_mut() {
        *v = if range == 0.0 { 0.0 } else { (*v - min) / range };
    }
}

/// Normalized feature series aligned with `bars`.
pub fn calculate_feature(spec: &FeatureSpec, bars: &[Bar]) -> Option<Vec<f64>> {
    if spec.validate().is_err() || bars.len() < spec.warmup() {
        return None;
    }

    let n = bars.len();
    let high: Vec<f64> = bars.iter().map(|b| b.high).collect();
    let low: Vec<f64> = bars.iter().map(|b| b.low).collect();
    let close: Vec<f64> = bars.iter().map(|b| b.close).collect();

    let mut series = match spec.kind {
        FeatureKind::Rsi => align(Rsi::new(spec.param_a).calculate(&close), n),
        FeatureKind::Cci => align(Cci::new(spec.param_a).calculate(&high, &low, &close), n),
        FeatureKind::Adx => align(Adx::new(spec.param_a).calculate(&high, &low, &close), n),
        FeatureKind::Wt => WaveTrend::new(spec.param_a, spec.param_b).series(&high, &low, &close),
    };
    sanitize(&mut series);

    match spec.kind {
        FeatureKind::Adx => series.iter_mut().for_each(|v| *v /= 100.0),
        _ => min_max_normalize(&mut series),
    }

    Some(series)
}

/// Feature series by indicator name; unknown names yield `None`.
pub fn calculate_named_feature(
    name: &str,
    param_a: usize,
    param_b: usize,
    bars: &[Bar],
) -> Option<Vec<f64>> {
    let kind = name.parse::<FeatureKind>().ok()?;
    calculate_feature(&FeatureSpec::new(kind, param_a, param_b), bars)
}

/// Latest value of a feature, or `None` when unavailable.
pub fn latest_feature(spec: &FeatureSpec, bars: &[Bar]) -> Option<f64> {
    calculate_feature(spec, bars).and_then(|s| s.last().copied())
}

/// Latest value of a feature, falling back to [`NEUTRAL`].
pub fn latest_or_neutral(spec: &FeatureSpec, bars: &[Bar]) -> f64 {
    latest_feature(spec, bars).unwrap_or(NEUTRAL)
}
