//! Price pattern detection.
//!
//! - [`fractals`]: five-bar local extrema under the regular or Bill Williams rule
//! - [`harmonic`]: XABCD Fibonacci-ratio formations (Bat, Butterfly, Gartley, Crab)
//! - [`features`]: per-bar distances to the last fractals plus the pattern signal

pub mod features;
pub mod fractals;
pub mod harmonic;

pub use features::{LatestPattern, PatternDetector, PatternFeatures};
pub use fractals::{detect_fractals, FractalRule, Fractals};
pub use harmonic::{calculate_ratios, identify, pattern_signal, HarmonicPattern, PatternMatch, Ratios};
