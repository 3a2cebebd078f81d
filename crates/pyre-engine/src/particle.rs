//! The particle itself.
//!
//! A [`Particle`] is a plain state record: kinematics and lifetime in an
//! embedded [`PhysicalState`], plus display-facing attributes (radius, color,
//! alpha, an optional body key) and its own clones of the per-particle
//! behaviours. All movement logic lives in the behaviours and the emitter's
//! integration pass; the particle only holds data and knows how to recycle
//! itself.

use glam::Vec3;
use pyre_core::prelude::*;

use crate::behaviour::{Behaviour, MutateCtx};

/// Default collision/display radius for a fresh particle.
pub const DEFAULT_RADIUS: f32 = 10.0;
/// Default mass for a fresh particle.
pub const DEFAULT_MASS: f32 = 1.0;

// ---------------------------------------------------------------------------
// Particle
// ---------------------------------------------------------------------------

/// One simulated particle.
#[derive(Debug, Clone)]
pub struct Particle {
    /// Generational handle. The slot stays stable across pool recycling; the
    /// generation advances on every recycle so held handles go stale.
    pub id: ParticleId,
    /// Kinematics and lifetime.
    pub state: PhysicalState,
    /// Collision and display radius.
    pub radius: f32,
    /// Mass, used by mass-aware collision response.
    pub mass: f32,
    /// Renderer-facing body key chosen at spawn, if any. The engine never
    /// interprets it.
    pub body: Option<String>,
    /// RGB color channels in `[0, 1]`.
    pub color: Vec3,
    /// Opacity in `[0, 1]`.
    pub alpha: f32,
    /// Per-particle behaviour instances, cloned from the emitter's templates
    /// at spawn so each particle's rules age independently.
    pub(crate) behaviours: Vec<Behaviour>,
}

impl Particle {
    /// A fresh particle occupying `slot` at generation zero.
    pub fn with_slot(slot: u32) -> Self {
        Self {
            id: ParticleId::new(slot, 0),
            state: PhysicalState::new(),
            radius: DEFAULT_RADIUS,
            mass: DEFAULT_MASS,
            body: None,
            color: Vec3::ONE,
            alpha: 1.0,
            behaviours: Vec::new(),
        }
    }

    /// Whether the particle is still alive.
    pub fn alive(&self) -> bool {
        !self.state.dead
    }

    /// Remaining life fraction, `1.0` at birth down to `0.0` at death.
    pub fn energy(&self) -> f32 {
        self.state.energy()
    }

    /// Mark the particle dead. It will be pruned and returned to the pool on
    /// the next integration pass.
    pub fn kill(&mut self) {
        self.state.dead = true;
    }

    /// The behaviour instances attached to this particle.
    pub fn behaviours(&self) -> &[Behaviour] {
        &self.behaviours
    }

    /// Run every attached behaviour against this particle, pruning behaviours
    /// whose own life ended during this step.
    pub(crate) fn apply_behaviours(&mut self, dt: f32, ctx: &mut MutateCtx<'_>) {
        // The behaviours are lifted out for the duration of the pass so each
        // rule can borrow the particle mutably.
        let mut behaviours = std::mem::take(&mut self.behaviours);
        behaviours.retain_mut(|behaviour| {
            behaviour.mutate(self, dt, ctx);
            !behaviour.expired()
        });
        self.behaviours = behaviours;
    }
}

impl Recyclable for Particle {
    fn recycle(&mut self) {
        self.state.reset();
        self.radius = DEFAULT_RADIUS;
        self.mass = DEFAULT_MASS;
        self.body = None;
        self.color = Vec3::ONE;
        self.alpha = 1.0;
        self.behaviours.clear();
        self.id = self.id.next_generation();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
