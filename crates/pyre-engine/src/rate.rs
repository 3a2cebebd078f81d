//! Emission rate -- span-driven pulse generation.
//!
//! A [`Rate`] accumulates elapsed time and fires a *pulse* each time the
//! current interval elapses. Both the pulse size (`num_pan`) and the interval
//! (`time_pan`) are [`Span`]s, re-sampled after every pulse, so a rate can be
//! "2 to 5 particles every 50 to 150 ms".
//!
//! One call to [`get_value`](Rate::get_value) fires at most one pulse: a
//! frame hitch spanning several intervals collapses to a single pulse rather
//! than emitting catch-up bursts. An interval of zero fires on every query.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::BuildError;
use pyre_core::prelude::*;

// ---------------------------------------------------------------------------
// Rate
// ---------------------------------------------------------------------------

/// A pulse-based emission schedule.
#[derive(Debug, Clone)]
pub struct Rate {
    num_pan: Span,
    time_pan: Span,
    /// Time accumulated toward the next pulse, in ms.
    start_time: f32,
    /// Length of the current interval, in ms.
    next_time: f32,
}

impl Rate {
    /// Build a rate emitting `num_pan` particles every `time_pan` ms.
    pub fn new(num_pan: Span, time_pan: Span) -> Self {
        Self {
            num_pan,
            time_pan,
            start_time: 0.0,
            next_time: 0.0,
        }
    }

    /// Reset the accumulator and draw the first interval. Called when an
    /// emitter (re)starts emitting.
    pub fn init(&mut self, rng: &mut impl Rng) {
        self.start_time = 0.0;
        self.next_time = self.time_pan.sample(rng).max(0.0);
    }

    /// Advance the schedule by `dt` ms and return how many particles to emit
    /// now. Returns zero between pulses; when the interval elapses the
    /// accumulator resets, a fresh interval and pulse size are drawn, and the
    /// pulse size is returned.
    pub fn get_value(&mut self, rng: &mut impl Rng, dt: f32) -> u32 {
        self.start_time += dt.max(0.0);
        if self.start_time < self.next_time {
            return 0;
        }
        self.start_time = 0.0;
        self.next_time = self.time_pan.sample(rng).max(0.0);
        let num = self.num_pan.sample(rng);
        if num <= 0.0 {
            0
        } else {
            num.ceil() as u32
        }
    }

    /// The pulse-size span.
    pub fn num_pan(&self) -> Span {
        self.num_pan
    }

    /// The interval span.
    pub fn time_pan(&self) -> Span {
        self.time_pan
    }

    /// Build from a declarative description, validating both spans.
    pub fn from_config(config: &RateConfig) -> Result<Self, BuildError> {
        config
            .num_pan
            .validate()
            .map_err(|e| BuildError::span("numPan", e))?;
        config
            .time_pan
            .validate()
            .map_err(|e| BuildError::span("timePan", e))?;
        if config.num_pan.min() < 0.0 {
            return Err(BuildError::field("numPan", "pulse size cannot be negative"));
        }
        if config.time_pan.min() < 0.0 {
            return Err(BuildError::field("timePan", "interval cannot be negative"));
        }
        if !config.num_pan.max().is_finite() || !config.time_pan.max().is_finite() {
            return Err(BuildError::field("rate", "spans must be finite"));
        }
        Ok(Self::new(config.num_pan, config.time_pan))
    }

    /// The declarative description of this rate.
    pub fn to_config(&self) -> RateConfig {
        RateConfig {
            num_pan: self.num_pan,
            time_pan: self.time_pan,
        }
    }
}

impl Default for Rate {
    /// One particle every 100 ms.
    fn default() -> Self {
        Self::new(Span::Value(1.0), Span::Value(100.0))
    }
}

// ---------------------------------------------------------------------------
// RateConfig
// ---------------------------------------------------------------------------

/// Declarative description of a [`Rate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateConfig {
    pub num_pan: Span,
    pub time_pan: Span,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
