//! Pyre Engine -- a deterministic, step-driven particle simulation engine.
//!
//! The engine separates three concerns:
//!
//! - **Initializers** stamp a particle exactly once, at spawn (life span,
//!   mass, position inside a zone, launch velocity, ...).
//! - **Behaviours** mutate particles every step, each with its own age, life
//!   span, and easing curve; templates live on the emitter and every particle
//!   gets private clones.
//! - The **[`Emitter`]** drives everything: it ages like a particle, runs its
//!   own behaviours, integrates the population with same-pass pruning, and
//!   generates new particles on a span-driven pulse schedule.
//!
//! Rendering, threading, and asset loading are out of scope; the embedder
//! steps emitters and reads the particle buffers. All time is milliseconds,
//! all randomness flows through per-emitter seeded RNGs, and the particle
//! pool is an explicit argument, never a global.
//!
//! # Quick Start
//!
//! ```
//! use pyre_engine::prelude::*;
//!
//! let mut pool = Pool::new();
//! let mut emitter = Emitter::new()
//!     .with_seed(7)
//!     .with_rate(Rate::new(Span::Value(1.0), Span::Value(0.0)));
//! emitter.add_initializer(Initializer::life(Span::Value(1000.0)));
//! emitter.add_behaviour(Behaviour::gravity(0.001));
//!
//! // Emit exactly five particles, then step the simulation.
//! emitter.emit(Some(5), None);
//! emitter.update(16.0, &mut pool);
//! assert_eq!(emitter.particle_count(), 5);
//! ```
//!
//! Emitters can equally be described in JSON; see [`EmitterConfig`].

#![deny(unsafe_code)]

pub mod behaviour;
pub mod config;
pub mod emitter;
pub mod error;
pub mod initializer;
pub mod particle;
pub mod rate;
pub mod signal;

pub use crate::error::BuildError;

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::behaviour::{
        Behaviour, BehaviourConfig, BehaviourState, Crossing, MutateCtx, NeighbourInfo,
    };
    pub use crate::config::EmitterConfig;
    pub use crate::emitter::{Emitter, DEFAULT_DAMPING};
    pub use crate::error::BuildError;
    pub use crate::initializer::{Initializer, InitializerConfig};
    pub use crate::particle::Particle;
    pub use crate::rate::{Rate, RateConfig};
    pub use crate::signal::{DeadSignal, EmitterDeath};
    pub use pyre_core::prelude::*;
}
