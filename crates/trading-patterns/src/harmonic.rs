//! Harmonic XABCD pattern matching.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::RangeInclusive;

/// Retracement ratios of an XABCD swing. Degenerate legs yield 0.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Ratios {
    pub xab: f64,
    pub xad: f64,
    pub abc: f64,
    pub bcd: f64,
}

fn ratio(num: f64, den: f64) -> f64 {
    let den = den.abs();
    if den > 0.0 {
        num.abs() / den
    } else {
        0.0
    }
}

/// `XAB = |B-A|/|X-A|`, `XAD = |A-D|/|X-A|`, `ABC = |B-C|/|A-B|`, `BCD = |C-D|/|B-C|`.
pub fn calculate_ratios(x: f64, a: f64, b: f64, c: f64, d: f64) -> Ratios {
    Ratios {
        xab: ratio(b - a, x - a),
        xad: ratio(a - d, x - a),
        abc: ratio(b - c, a - b),
        bcd: ratio(c - d, b - c),
    }
}

/// Supported harmonic formations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HarmonicPattern {
    Bat,
    Butterfly,
    Gartley,
    Crab,
}

struct Bands {
    xab: RangeInclusive<f64>,
    abc: RangeInclusive<f64>,
    bcd: RangeInclusive<f64>,
    xad: RangeInclusive<f64>,
}

impl HarmonicPattern {
    pub const ALL: [HarmonicPattern; 4] = [
        HarmonicPattern::Bat,
        HarmonicPattern::Butterfly,
        HarmonicPattern::Gartley,
        HarmonicPattern::Crab,
    ];

    /// Contribution of a match to the pattern signal.
    pub fn weight(&self) -> f64 {
        match self {
            HarmonicPattern::Bat | HarmonicPattern::Butterfly => 0.8,
            HarmonicPattern::Gartley => 0.7,
            HarmonicPattern::Crab => 0.9,
        }
    }

    fn bands(&self) -> Bands {
        const ABC: RangeInclusive<f64> = 0.382..=0.886;
        match self {
            HarmonicPattern::Bat => Bands {
                xab: 0.382..=0.5,
                abc: ABC,
                bcd: 1.618..=2.618,
                xad: 0.0..=0.886,
            },
            HarmonicPattern::Butterfly => Bands {
                xab: 0.0..=0.786,
                abc: ABC,
                bcd: 1.618..=2.618,
                xad: 1.27..=1.618,
            },
            HarmonicPattern::Gartley => Bands {
                xab: 0.5..=0.618,
                abc: ABC,
                bcd: 1.13..=2.618,
                xad: 0.75..=0.875,
            },
            HarmonicPattern::Crab => Bands {
                xab: 0.75..=0.875,
                abc: ABC,
                bcd: 2.0..=3.618,
                xad: 1.5..=1.625,
            },
        }
    }

    /// Whether all four ratios fall inside this pattern's bands.
    pub fn matches(&self, r: &Ratios) -> bool {
        let b = self.bands();
        b.xab.contains(&r.xab) && b.abc.contains(&r.abc) && b.bcd.contains(&r.bcd) && b.xad.contains(&r.xad)
    }
}

impl fmt::Display for HarmonicPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// A recognised formation with its direction (+1 bullish, -1 bearish).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PatternMatch {
    pub pattern: HarmonicPattern,
    pub direction: i8,
    pub weight: f64,
}

/// Match the five pivots against every pattern.
///
/// The direction follows the XA leg: rising is bullish, falling is bearish,
/// a flat leg matches nothing.
pub fn identify(points: [f64; 5]) -> Vec<PatternMatch> {
    let [x, a, b, c, d] = points;
    let direction = if a > x {
        1
    } else if a < x {
        -1
    } else {
        return Vec::new();
    };

    let ratios = calculate_ratios(x, a, b, c, d);
    HarmonicPattern::ALL
        .iter()
        .filter(|p| p.matches(&ratios))
        .map(|&pattern| PatternMatch {
            pattern,
            direction,
            weight: pattern.weight(),
        })
        .collect()
}

/// Σ direction × weight over the matches on the five closes ending at `idx`.
/// Zero before the fifth bar.
pub fn pattern_signal(closes: &[f64], idx: usize) -> f64 {
    if idx < 4 || idx >= closes.len() {
        return 0.0;
    }
    let points = [
        closes[idx - 4],
        closes[idx - 3],
        closes[idx - 2],
        closes[idx - 1],
        closes[idx],
    ];
    identify(points)
        .iter()
        .map(|m| f64::from(m.direction) * m.weight)
        .sum()
}
