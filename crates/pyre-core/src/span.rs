//! Numeric spans -- constant-or-range values sampled per use.
//!
//! A [`Span`] is the basic unit of configurable randomness: either a fixed
//! value or a half-open range that is re-sampled every time it is consulted.
//! Sampling always goes through a caller-supplied RNG so that two runs with
//! equal seeds produce identical sequences.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::SpanError;

// ---------------------------------------------------------------------------
// Span
// ---------------------------------------------------------------------------

/// A fixed value or a uniform range, sampled fresh on every use.
///
/// Serializes untagged: `3.0` is a [`Span::Value`], `[2.0, 4.0]` is a
/// [`Span::Range`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Span {
    /// A constant -- every sample returns the same number.
    Value(f32),
    /// A uniform range `[min, max)`. A degenerate range (`min == max`)
    /// behaves like a constant.
    Range(f32, f32),
}

impl Span {
    /// Draw one sample from the span.
    ///
    /// Constants return themselves without consuming randomness; ranges draw
    /// uniformly from `[min, max)`.
    pub fn sample(&self, rng: &mut impl Rng) -> f32 {
        match *self {
            Span::Value(v) => v,
            Span::Range(min, max) => {
                if min == max {
                    min
                } else {
                    rng.gen_range(min..max)
                }
            }
        }
    }

    /// Validate the span's endpoints.
    ///
    /// Constants may be `+inf` (an unbounded life span means "immortal");
    /// range endpoints must be finite and ordered. `NaN` is rejected
    /// everywhere.
    pub fn validate(&self) -> Result<(), SpanError> {
        match *self {
            Span::Value(v) => {
                if v.is_nan() {
                    return Err(SpanError::NaN);
                }
                if v == f32::NEG_INFINITY {
                    return Err(SpanError::NonFinite { min: v, max: v });
                }
                Ok(())
            }
            Span::Range(min, max) => {
                if min.is_nan() || max.is_nan() {
                    return Err(SpanError::NaN);
                }
                if !min.is_finite() || !max.is_finite() {
                    return Err(SpanError::NonFinite { min, max });
                }
                if min > max {
                    return Err(SpanError::Inverted { min, max });
                }
                Ok(())
            }
        }
    }

    /// The smallest value the span can produce.
    pub fn min(&self) -> f32 {
        match *self {
            Span::Value(v) => v,
            Span::Range(min, _) => min,
        }
    }

    /// The largest value the span can produce (exclusive for true ranges).
    pub fn max(&self) -> f32 {
        match *self {
            Span::Value(v) => v,
            Span::Range(_, max) => max,
        }
    }
}

impl Default for Span {
    fn default() -> Self {
        Span::Value(0.0)
    }
}

impl From<f32> for Span {
    fn from(v: f32) -> Self {
        Span::Value(v)
    }
}

impl From<(f32, f32)> for Span {
    fn from((min, max): (f32, f32)) -> Self {
        Span::Range(min, max)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
