//! The emitter -- owner and driver of a particle population.
//!
//! An [`Emitter`] holds the recipe (rate, initializers, behaviour templates)
//! and the population it produced. Each [`update`](Emitter::update) call runs
//! a fixed phase order:
//!
//! 1. age the emitter itself (it has a life span like any particle),
//! 2. run emitter-targeted behaviours against its own kinematic state,
//! 3. integrate every particle -- age, behaviours, Euler step -- pruning the
//!    dead in the same pass,
//! 4. generate new particles according to the rate schedule.
//!
//! The particle pool is owned by the embedder and passed in per call; the
//! emitter never allocates behind the caller's back once the pool has warmed
//! up. All randomness flows through the emitter's own seeded RNG, so two
//! emitters built with equal seeds and stepped with equal deltas produce
//! identical populations.

use glam::{EulerRot, Quat, Vec3};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use tracing::{debug, warn};

use crate::behaviour::{Behaviour, MutateCtx, NeighbourInfo};
use crate::initializer::Initializer;
use crate::particle::Particle;
use crate::rate::Rate;
use crate::signal::{DeadSignal, EmitterDeath};
use pyre_core::prelude::*;

/// Default velocity damping coefficient, applied as `velocity *= 1 - damping`
/// every step.
pub const DEFAULT_DAMPING: f32 = 0.006;

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// A particle emitter and the population it owns.
#[derive(Debug)]
pub struct Emitter {
    pub(crate) id: String,
    pub(crate) state: PhysicalState,
    pub(crate) particles: Vec<Particle>,
    pub(crate) initializers: Vec<Initializer>,
    /// Templates cloned onto each spawned particle.
    pub(crate) behaviours: Vec<Behaviour>,
    /// Rules applied to the emitter's own kinematic state.
    pub(crate) emitter_behaviours: Vec<Behaviour>,
    pub(crate) rate: Rate,
    pub(crate) current_emit_count: u64,
    pub(crate) total_emit_count: Option<u64>,
    pub(crate) is_emitting: bool,
    pub(crate) damping: f32,
    pub(crate) bind_emitter: bool,
    pub(crate) auto_destroy: bool,
    pub(crate) seed: Option<u64>,
    pub(crate) rng: Pcg32,
    on_dead: DeadSignal,
    /// Slot counter for particles constructed through this emitter.
    next_slot: u32,
    /// Monotone clock (ms) used to timestamp pool releases; unlike `age` it
    /// never resets on `emit()`.
    sim_time: f32,
    /// Frame-start particle snapshot, reused across steps.
    neighbour_scratch: Vec<NeighbourInfo>,
}

impl Emitter {
    /// A fresh, idle emitter with an entropy-seeded RNG.
    pub fn new() -> Self {
        Self {
            id: "emitter".to_owned(),
            state: PhysicalState::new(),
            particles: Vec::new(),
            initializers: Vec::new(),
            behaviours: Vec::new(),
            emitter_behaviours: Vec::new(),
            rate: Rate::default(),
            current_emit_count: 0,
            total_emit_count: None,
            is_emitting: false,
            damping: DEFAULT_DAMPING,
            bind_emitter: false,
            auto_destroy: false,
            seed: None,
            rng: Pcg32::from_entropy(),
            on_dead: DeadSignal::new(),
            next_slot: 0,
            sim_time: 0.0,
            neighbour_scratch: Vec::new(),
        }
    }

    // -- builders -----------------------------------------------------------

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Seed the emitter's RNG for reproducible runs.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self.rng = Pcg32::seed_from_u64(seed);
        self
    }

    pub fn with_rate(mut self, rate: Rate) -> Self {
        self.rate = rate;
        self
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.state.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Vec3) -> Self {
        self.state.rotation = rotation;
        self
    }

    /// Velocity damping coefficient in `[0, 1)`.
    pub fn with_damping(mut self, damping: f32) -> Self {
        self.damping = damping;
        self
    }

    /// When set, particle kinematics stay relative to the emitter's
    /// transform, so moving the emitter drags its population along. When
    /// unset (the default), particles are stamped into world space at spawn
    /// and fly independently afterwards.
    pub fn with_bind_emitter(mut self, bind: bool) -> Self {
        self.bind_emitter = bind;
        self
    }

    /// Die automatically once a finite emission budget is exhausted and the
    /// last particle is gone.
    pub fn with_auto_destroy(mut self, auto_destroy: bool) -> Self {
        self.auto_destroy = auto_destroy;
        self
    }

    // -- recipe -------------------------------------------------------------

    pub fn add_initializer(&mut self, initializer: Initializer) {
        self.initializers.push(initializer);
    }

    pub fn set_initializers(&mut self, initializers: Vec<Initializer>) {
        self.initializers = initializers;
    }

    pub fn clear_initializers(&mut self) {
        self.initializers.clear();
    }

    /// Add a per-particle behaviour template. Only particles spawned after
    /// this call receive it.
    pub fn add_behaviour(&mut self, behaviour: Behaviour) {
        self.behaviours.push(behaviour);
    }

    pub fn set_behaviours(&mut self, behaviours: Vec<Behaviour>) {
        self.behaviours = behaviours;
    }

    pub fn clear_behaviours(&mut self) {
        self.behaviours.clear();
    }

    /// Add a rule driving the emitter's own kinematic state.
    pub fn add_emitter_behaviour(&mut self, behaviour: Behaviour) {
        self.emitter_behaviours.push(behaviour);
    }

    pub fn set_emitter_behaviours(&mut self, behaviours: Vec<Behaviour>) {
        self.emitter_behaviours = behaviours;
    }

    pub fn clear_emitter_behaviours(&mut self) {
        self.emitter_behaviours.clear();
    }

    pub fn set_rate(&mut self, rate: Rate) {
        self.rate = rate;
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.state.position = position;
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.state.rotation = rotation;
    }

    pub fn set_damping(&mut self, damping: f32) {
        self.damping = damping;
    }

    /// Register a listener for this emitter's death.
    pub fn connect_on_dead(&mut self, listener: impl FnMut(&EmitterDeath) + Send + 'static) {
        self.on_dead.connect(listener);
    }

    // -- emission control ---------------------------------------------------

    /// Start (or restart) emitting.
    ///
    /// `total` caps how many particles will ever be created this run; `life`
    /// is the emitter's own life span in ms. `None` keeps the current
    /// setting; a dead emitter is revived with its age reset.
    pub fn emit(&mut self, total: Option<u64>, life: Option<f32>) {
        if let Some(total) = total {
            self.total_emit_count = Some(total);
        }
        if let Some(life) = life {
            self.state.life = life;
        }
        self.state.age = 0.0;
        self.state.dead = false;
        self.current_emit_count = 0;
        self.is_emitting = true;
        self.rate.init(&mut self.rng);
        debug!(
            emitter = %self.id,
            total = ?self.total_emit_count,
            life = self.state.life,
            "emitter started"
        );
    }

    /// Start emitting with no particle cap and no emitter life span.
    pub fn emit_forever(&mut self) {
        self.total_emit_count = None;
        self.state.life = f32::INFINITY;
        self.emit(None, None);
    }

    /// Freeze the emission budget at the current count. Existing particles
    /// keep living; no further ones are generated until `emit()` is called
    /// again.
    pub fn stop_emit(&mut self) {
        self.total_emit_count = Some(self.current_emit_count);
        debug!(emitter = %self.id, at = self.current_emit_count, "emission stopped");
    }

    /// Kill the emitter now: release every particle back to `pool`, mark the
    /// emitter dead, and fire the death signal once.
    pub fn destroy(&mut self, pool: &mut Pool<Particle>) {
        if !self.state.dead || !self.particles.is_empty() {
            self.state.dead = true;
            self.die(pool);
        }
    }

    // -- accessors ----------------------------------------------------------

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The live population, in creation order.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    /// The emitter's own kinematic state.
    pub fn state(&self) -> &PhysicalState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut PhysicalState {
        &mut self.state
    }

    pub fn age(&self) -> f32 {
        self.state.age
    }

    pub fn is_dead(&self) -> bool {
        self.state.dead
    }

    /// Whether `emit()` has been called and `stop_emit()` has not.
    pub fn is_emitting(&self) -> bool {
        self.is_emitting
    }

    /// Particles created since the last `emit()`.
    pub fn current_emit_count(&self) -> u64 {
        self.current_emit_count
    }

    /// The emission budget, if finite.
    pub fn total_emit_count(&self) -> Option<u64> {
        self.total_emit_count
    }

    pub fn rate(&self) -> &Rate {
        &self.rate
    }

    pub fn damping(&self) -> f32 {
        self.damping
    }

    pub fn bind_emitter(&self) -> bool {
        self.bind_emitter
    }

    pub fn initializers(&self) -> &[Initializer] {
        &self.initializers
    }

    pub fn behaviours(&self) -> &[Behaviour] {
        &self.behaviours
    }

    pub fn emitter_behaviours(&self) -> &[Behaviour] {
        &self.emitter_behaviours
    }

    /// A particle's position in world space. For bound emitters this
    /// composes the emitter's transform with the particle's local
    /// coordinates; for unbound emitters particles already live in world
    /// space.
    pub fn world_position(&self, particle: &Particle) -> Vec3 {
        if self.bind_emitter {
            self.state.position + self.orientation() * particle.state.position
        } else {
            particle.state.position
        }
    }

    fn orientation(&self) -> Quat {
        Quat::from_euler(
            EulerRot::XYZ,
            self.state.rotation.x,
            self.state.rotation.y,
            self.state.rotation.z,
        )
    }

    // -- stepping -----------------------------------------------------------

    /// Advance the emitter and its population by `dt` ms.
    ///
    /// A dead emitter ignores the call. Negative deltas are treated as zero.
    pub fn update(&mut self, dt: f32, pool: &mut Pool<Particle>) {
        if self.state.dead {
            return;
        }
        let dt = dt.max(0.0);
        self.sim_time += dt;

        self.state.update_age(dt);
        if self.state.dead {
            self.die(pool);
            return;
        }

        self.update_emitter_behaviours(dt);
        if self.state.dead {
            // An emitter-targeted boundary rule killed the emitter itself.
            self.die(pool);
            return;
        }
        self.state.integrate(dt, 1.0 - self.damping);
        if !self.state.is_numeric() {
            warn!(emitter = %self.id, "emitter state went non-numeric; destroying it");
            self.state.dead = true;
            self.die(pool);
            return;
        }

        self.integrate_particles(dt, pool);
        self.generate(dt, pool);

        if self.auto_destroy && self.exhausted() && self.particles.is_empty() {
            self.state.dead = true;
            self.die(pool);
        }
    }

    /// Whether a finite budget has been fully spent.
    fn exhausted(&self) -> bool {
        matches!(self.total_emit_count, Some(total) if self.current_emit_count >= total)
    }

    fn update_emitter_behaviours(&mut self, dt: f32) {
        let mut ctx = MutateCtx {
            rng: &mut self.rng,
            neighbours: &[],
            index: usize::MAX,
        };
        let state = &mut self.state;
        self.emitter_behaviours.retain_mut(|behaviour| {
            behaviour.mutate_state(state, dt, &mut ctx);
            !behaviour.expired()
        });
    }

    /// Age, mutate, and integrate every particle, returning the dead to the
    /// pool in the same pass. Creation order of survivors is preserved.
    fn integrate_particles(&mut self, dt: f32, pool: &mut Pool<Particle>) {
        self.neighbour_scratch.clear();
        self.neighbour_scratch
            .extend(self.particles.iter().map(|p| NeighbourInfo {
                id: p.id,
                position: p.state.position,
                velocity: p.state.velocity,
                radius: p.radius,
                mass: p.mass,
            }));

        let damping_factor = 1.0 - self.damping;
        let mut i = 0;
        let mut snapshot_index = 0;
        while i < self.particles.len() {
            {
                let particle = &mut self.particles[i];
                particle.state.update_age(dt);
                if !particle.state.dead {
                    let mut ctx = MutateCtx {
                        rng: &mut self.rng,
                        neighbours: &self.neighbour_scratch,
                        index: snapshot_index,
                    };
                    particle.apply_behaviours(dt, &mut ctx);
                }
                if !particle.state.dead {
                    particle.state.integrate(dt, damping_factor);
                }
                if !particle.state.dead && !particle.state.is_numeric() {
                    warn!(particle = %particle.id, "particle state went non-numeric; killing it");
                    particle.state.dead = true;
                }
            }
            if self.particles[i].state.dead {
                let dead = self.particles.remove(i);
                pool.release(dead, self.sim_time);
            } else {
                i += 1;
            }
            snapshot_index += 1;
        }
    }

    /// Ask the rate schedule how many particles to create and create them.
    ///
    /// With a finite budget the schedule is re-queried with a zero delta
    /// until it stops pulsing, so a zero-interval rate drains the whole
    /// budget in one update. An unbounded emitter takes at most one pulse
    /// per update.
    fn generate(&mut self, dt: f32, pool: &mut Pool<Particle>) {
        if !self.is_emitting {
            return;
        }
        match self.total_emit_count {
            None => {
                let pulse = self.rate.get_value(&mut self.rng, dt);
                for _ in 0..pulse {
                    self.create_particle(pool);
                }
                self.current_emit_count += pulse as u64;
            }
            Some(total) => {
                let mut dt = dt;
                while self.current_emit_count < total {
                    let pulse = self.rate.get_value(&mut self.rng, dt);
                    dt = 0.0;
                    if pulse == 0 {
                        break;
                    }
                    let pulse = (pulse as u64).min(total - self.current_emit_count);
                    for _ in 0..pulse {
                        self.create_particle(pool);
                    }
                    self.current_emit_count += pulse;
                }
            }
        }
    }

    fn create_particle(&mut self, pool: &mut Pool<Particle>) {
        let next_slot = &mut self.next_slot;
        let mut particle = pool.get_or_create(|| {
            let slot = *next_slot;
            *next_slot += 1;
            Particle::with_slot(slot)
        });

        for initializer in &self.initializers {
            initializer.initialize(&mut self.rng, &mut particle);
        }

        if !self.bind_emitter {
            // Stamp the sampled local pose into world space once, at spawn.
            let orientation = self.orientation();
            particle.state.position = self.state.position + orientation * particle.state.position;
            particle.state.velocity = orientation * particle.state.velocity;
        }

        particle.behaviours = self.behaviours.clone();
        self.particles.push(particle);
    }

    fn die(&mut self, pool: &mut Pool<Particle>) {
        self.is_emitting = false;
        for particle in self.particles.drain(..) {
            pool.release(particle, self.sim_time);
        }
        let event = EmitterDeath {
            emitter_id: self.id.clone(),
        };
        self.on_dead.dispatch(&event);
    }
}

impl Default for Emitter {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
