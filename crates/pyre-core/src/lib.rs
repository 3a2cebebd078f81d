//! Pyre Core -- shared building blocks for the Pyre particle engine.
//!
//! This crate holds the domain-independent pieces: sampled numeric spans,
//! easing curves, generational identifiers, object pooling, kinematic state,
//! and spatial zones. Everything here is deterministic given a seeded RNG and
//! free of global state; the simulation driver lives in `pyre-engine`.
//!
//! # Quick Start
//!
//! ```
//! use pyre_core::prelude::*;
//! use rand::SeedableRng;
//!
//! let mut rng = rand_pcg::Pcg32::seed_from_u64(1);
//!
//! // A span is either a constant or a re-sampled range.
//! let life: Span = serde_json::from_str("[1000.0, 2000.0]").unwrap();
//! let sampled = life.sample(&mut rng);
//! assert!((1000.0..2000.0).contains(&sampled));
//!
//! // Zones hand out spawn positions.
//! let zone = ZoneConfig::Sphere {
//!     center: glam::Vec3::ZERO,
//!     radius: 5.0,
//! }
//! .build()
//! .unwrap();
//! assert!(zone.contains(zone.sample(&mut rng)));
//! ```

#![deny(unsafe_code)]

pub mod ease;
pub mod id;
pub mod physical;
pub mod pool;
pub mod span;
pub mod zone;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by span validation.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum SpanError {
    /// An endpoint is `NaN`.
    #[error("span endpoint is NaN")]
    NaN,

    /// A range endpoint (or a negative-infinite constant) is not usable.
    #[error("span endpoints must be finite, got [{min}, {max}]")]
    NonFinite { min: f32, max: f32 },

    /// The range is inverted.
    #[error("span range is inverted: min {min} > max {max}")]
    Inverted { min: f32, max: f32 },
}

/// Errors produced by zone construction.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ZoneError {
    /// A coordinate is `NaN` or infinite.
    #[error("zone coordinate is not finite")]
    NonFiniteCoordinate,

    /// A sphere radius is negative or non-finite.
    #[error("sphere radius must be finite and non-negative, got {0}")]
    InvalidRadius(f32),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::ease::Easing;
    pub use crate::id::ParticleId;
    pub use crate::physical::PhysicalState;
    pub use crate::pool::{Pool, Recyclable};
    pub use crate::span::Span;
    pub use crate::zone::{BoxZone, LineZone, PointZone, SphereZone, Zone, ZoneConfig};
    pub use crate::{SpanError, ZoneError};
}
