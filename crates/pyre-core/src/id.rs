//! Particle identifiers.
//!
//! A [`ParticleId`] is a 64-bit handle packing a *generation* counter in the
//! high 32 bits and a *slot* in the low 32 bits. Slots are stable across pool
//! recycling; the generation is bumped every time a slot is recycled, so a
//! held handle from a previous incarnation never matches the live particle.

use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// ParticleId
// ---------------------------------------------------------------------------

/// A generational particle identifier.
///
/// Layout: `[generation: u32 | slot: u32]`
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticleId(u64);

impl ParticleId {
    /// Construct a `ParticleId` from a slot and generation.
    #[inline]
    pub fn new(slot: u32, generation: u32) -> Self {
        Self((generation as u64) << 32 | slot as u64)
    }

    /// The slot portion (low 32 bits).
    #[inline]
    pub fn slot(self) -> u32 {
        self.0 as u32
    }

    /// The generation portion (high 32 bits).
    #[inline]
    pub fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// The same slot, one generation later. Used when a recycled instance is
    /// reset so that outstanding handles to the old incarnation go stale.
    #[inline]
    pub fn next_generation(self) -> Self {
        Self::new(self.slot(), self.generation().wrapping_add(1))
    }

    /// Raw `u64` representation.
    #[inline]
    pub fn to_raw(self) -> u64 {
        self.0
    }

    /// Reconstruct from a raw `u64`.
    #[inline]
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Debug for ParticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParticleId({}v{})", self.slot(), self.generation())
    }
}

impl fmt::Display for ParticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.slot(), self.generation())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
