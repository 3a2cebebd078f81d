//! Behaviours -- per-step mutation rules.
//!
//! A [`Behaviour`] is a rule applied to a particle (or to the emitter itself)
//! on every simulation step. Each behaviour carries its own age, life span,
//! and easing curve, independent of its target's lifetime: a rule can switch
//! itself off mid-flight, and lifetime-driven interpolation (alpha fades,
//! scale ramps) is shaped by the easing.
//!
//! Behaviour templates live on the emitter; every spawned particle receives
//! its own clones so instance state (ages, sampled endpoints, drift timers)
//! evolves per particle.

use glam::Vec3;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::BuildError;
use crate::particle::Particle;
use pyre_core::prelude::*;

// ---------------------------------------------------------------------------
// BehaviourState
// ---------------------------------------------------------------------------

/// Lifetime bookkeeping shared by every behaviour kind.
#[derive(Debug, Clone)]
pub struct BehaviourState {
    /// Time this instance has been running, in ms.
    pub age: f32,
    /// How long the rule stays active, in ms. `f32::INFINITY` (the default)
    /// means it runs for its target's whole life.
    pub life: f32,
    /// Curve shaping the rule's lifetime-driven interpolation.
    pub easing: Easing,
    /// Disabled rules are skipped but keep aging.
    pub enabled: bool,
    /// Set once `age` reaches `life`; expired rules are pruned by the holder.
    pub dead: bool,
}

impl BehaviourState {
    /// Advance the rule's age and return its eased remaining-life fraction
    /// (`1.0` fresh, `0.0` spent). Marks the rule dead when its life elapses.
    pub fn tick(&mut self, dt: f32) -> f32 {
        self.age += dt.max(0.0);
        if self.age >= self.life {
            self.dead = true;
            return 0.0;
        }
        let remaining = if self.life.is_finite() {
            (1.0 - self.age / self.life).clamp(0.0, 1.0)
        } else {
            1.0
        };
        self.easing.apply(remaining)
    }
}

impl Default for BehaviourState {
    fn default() -> Self {
        Self {
            age: 0.0,
            life: f32::INFINITY,
            easing: Easing::Linear,
            enabled: true,
            dead: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Mutation context
// ---------------------------------------------------------------------------

/// Read-only snapshot of one particle for neighbour-aware rules.
#[derive(Debug, Clone, Copy)]
pub struct NeighbourInfo {
    pub id: ParticleId,
    pub position: Vec3,
    pub velocity: Vec3,
    pub radius: f32,
    pub mass: f32,
}

/// Shared context handed to every behaviour during a step.
///
/// `neighbours` is the frame-start snapshot of all live particles, so
/// pairwise rules see a consistent view regardless of mutation order.
pub struct MutateCtx<'a> {
    pub rng: &'a mut Pcg32,
    pub neighbours: &'a [NeighbourInfo],
    /// Index of the current particle within `neighbours`, or
    /// `usize::MAX` when the target is not a particle.
    pub index: usize,
}

// ---------------------------------------------------------------------------
// Behaviour kinds
// ---------------------------------------------------------------------------

/// What a boundary rule does when its target leaves the zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Crossing {
    /// Kill the target.
    Dead,
    /// Reflect the velocity and clamp the target back inside.
    Bound,
}

#[derive(Debug, Clone)]
enum BehaviourKind {
    Force {
        force: Vec3,
    },
    Gravity {
        gravity: f32,
    },
    Alpha {
        from: Span,
        to: Span,
        sampled: Option<(f32, f32)>,
    },
    Color {
        from: Vec3,
        to: Vec3,
    },
    Scale {
        from: Span,
        to: Span,
        sampled: Option<(f32, f32)>,
    },
    Rotate {
        x: Span,
        y: Span,
        z: Span,
        sampled: Option<Vec3>,
    },
    Attraction {
        target: Vec3,
        force: f32,
        radius: f32,
    },
    Repulsion {
        target: Vec3,
        force: f32,
        radius: f32,
    },
    RandomDrift {
        drift: Vec3,
        delay: f32,
        accumulator: f32,
    },
    Collision {
        bounce: f32,
        use_mass: bool,
    },
    CrossZone {
        zone: Arc<dyn Zone>,
        zone_config: Option<ZoneConfig>,
        crossing: Crossing,
    },
}

impl BehaviourKind {
    fn name(&self) -> &'static str {
        match self {
            BehaviourKind::Force { .. } => "Force",
            BehaviourKind::Gravity { .. } => "Gravity",
            BehaviourKind::Alpha { .. } => "Alpha",
            BehaviourKind::Color { .. } => "Color",
            BehaviourKind::Scale { .. } => "Scale",
            BehaviourKind::Rotate { .. } => "Rotate",
            BehaviourKind::Attraction { .. } => "Attraction",
            BehaviourKind::Repulsion { .. } => "Repulsion",
            BehaviourKind::RandomDrift { .. } => "RandomDrift",
            BehaviourKind::Collision { .. } => "Collision",
            BehaviourKind::CrossZone { .. } => "CrossZone",
        }
    }
}

// ---------------------------------------------------------------------------
// Behaviour
// ---------------------------------------------------------------------------

/// One mutation rule: shared lifetime header plus kind-specific payload.
#[derive(Debug, Clone)]
pub struct Behaviour {
    state: BehaviourState,
    kind: BehaviourKind,
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

impl Behaviour {
    fn with_kind(kind: BehaviourKind) -> Self {
        Self {
            state: BehaviourState::default(),
            kind,
        }
    }

    /// A constant force (units per ms^2) added to the accumulator each step.
    pub fn force(force: Vec3) -> Self {
        Self::with_kind(BehaviourKind::Force { force })
    }

    /// Downward pull of `gravity` units per ms^2 along `-Y`.
    pub fn gravity(gravity: f32) -> Self {
        Self::with_kind(BehaviourKind::Gravity { gravity })
    }

    /// Interpolates particle opacity from `from` to `to` over the rule's
    /// life (or the particle's life when the rule is unbounded). Endpoints
    /// are sampled once per particle.
    pub fn alpha(from: Span, to: Span) -> Self {
        Self::with_kind(BehaviourKind::Alpha {
            from,
            to,
            sampled: None,
        })
    }

    /// Interpolates particle RGB color.
    pub fn color(from: Vec3, to: Vec3) -> Self {
        Self::with_kind(BehaviourKind::Color { from, to })
    }

    /// Interpolates the target's scale factor.
    pub fn scale(from: Span, to: Span) -> Self {
        Self::with_kind(BehaviourKind::Scale {
            from,
            to,
            sampled: None,
        })
    }

    /// Spins the target at a per-axis angular velocity (radians per ms),
    /// sampled once per instance.
    pub fn rotate(x: Span, y: Span, z: Span) -> Self {
        Self::with_kind(BehaviourKind::Rotate {
            x,
            y,
            z,
            sampled: None,
        })
    }

    /// Pulls targets within `radius` of `target` toward it, stronger when
    /// closer.
    pub fn attraction(target: Vec3, force: f32, radius: f32) -> Self {
        Self::with_kind(BehaviourKind::Attraction {
            target,
            force,
            radius,
        })
    }

    /// Pushes targets within `radius` of `target` away from it.
    pub fn repulsion(target: Vec3, force: f32, radius: f32) -> Self {
        Self::with_kind(BehaviourKind::Repulsion {
            target,
            force,
            radius,
        })
    }

    /// Every `delay` ms, adds a random acceleration kick bounded per-axis by
    /// `drift`.
    pub fn random_drift(drift: Vec3, delay: f32) -> Self {
        Self::with_kind(BehaviourKind::RandomDrift {
            drift,
            delay,
            accumulator: 0.0,
        })
    }

    /// Sphere-vs-sphere response against the frame-start neighbour snapshot.
    pub fn collision(bounce: f32, use_mass: bool) -> Self {
        Self::with_kind(BehaviourKind::Collision { bounce, use_mass })
    }

    /// Boundary rule: kill or bounce targets that leave `zone`.
    pub fn cross_zone(zone: Arc<dyn Zone>, crossing: Crossing) -> Self {
        Self::with_kind(BehaviourKind::CrossZone {
            zone,
            zone_config: None,
            crossing,
        })
    }

    /// Limit the rule to `life` ms of activity.
    pub fn with_life(mut self, life: f32) -> Self {
        self.state.life = life;
        self
    }

    /// Shape the rule's interpolation with `easing`.
    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.state.easing = easing;
        self
    }

    /// Enable or disable the rule.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.state.enabled = enabled;
        self
    }

    /// Lifetime header of this rule.
    pub fn state(&self) -> &BehaviourState {
        &self.state
    }

    /// Whether the rule's own life has ended.
    pub fn expired(&self) -> bool {
        self.state.dead
    }

    pub fn is_enabled(&self) -> bool {
        self.state.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.state.enabled = enabled;
    }

    /// The rule's `type` tag, as it appears in JSON.
    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    /// Interpolation progress for this step: `0.0` at the start of the
    /// rule's window, `1.0` at its end. Rules with an unbounded life follow
    /// their target's remaining life instead.
    fn progress(&self, eased_remaining: f32, target_energy: f32) -> f32 {
        if self.state.life.is_finite() {
            1.0 - eased_remaining
        } else {
            1.0 - self.state.easing.apply(target_energy)
        }
    }

    /// Apply the rule to a particle.
    pub fn mutate(&mut self, particle: &mut Particle, dt: f32, ctx: &mut MutateCtx<'_>) {
        if self.state.dead {
            return;
        }
        let eased = self.state.tick(dt);
        if self.state.dead || !self.state.enabled {
            return;
        }
        let progress = self.progress(eased, particle.state.energy());
        match &mut self.kind {
            BehaviourKind::Alpha { from, to, sampled } => {
                let (a, b) =
                    *sampled.get_or_insert_with(|| (from.sample(ctx.rng), to.sample(ctx.rng)));
                particle.alpha = lerp(a, b, progress);
            }
            BehaviourKind::Color { from, to } => {
                particle.color = from.lerp(*to, progress);
            }
            BehaviourKind::Collision { bounce, use_mass } => {
                collide(particle, *bounce, *use_mass, ctx);
            }
            kind => apply_to_state(kind, &mut particle.state, progress, dt, ctx),
        }
    }

    /// Apply the rule to a bare kinematic state (the emitter's own body).
    /// Particle-only rules (alpha, color, collision) are no-ops here.
    pub fn mutate_state(&mut self, state: &mut PhysicalState, dt: f32, ctx: &mut MutateCtx<'_>) {
        if self.state.dead {
            return;
        }
        let eased = self.state.tick(dt);
        if self.state.dead || !self.state.enabled {
            return;
        }
        let progress = self.progress(eased, state.energy());
        match &mut self.kind {
            BehaviourKind::Alpha { .. }
            | BehaviourKind::Color { .. }
            | BehaviourKind::Collision { .. } => {}
            kind => apply_to_state(kind, state, progress, dt, ctx),
        }
    }

    // -- configuration ------------------------------------------------------

    /// Build a behaviour from its declarative description, validating every
    /// field.
    pub fn from_config(config: &BehaviourConfig) -> Result<Self, BuildError> {
        let kind = match &config.kind {
            BehaviourKindConfig::Force { force } => {
                check_vec("force", *force)?;
                BehaviourKind::Force { force: *force }
            }
            BehaviourKindConfig::Gravity { gravity } => {
                check_scalar("gravity", *gravity)?;
                BehaviourKind::Gravity { gravity: *gravity }
            }
            BehaviourKindConfig::Alpha { from, to } => {
                check_span("from", from)?;
                check_span("to", to)?;
                BehaviourKind::Alpha {
                    from: *from,
                    to: *to,
                    sampled: None,
                }
            }
            BehaviourKindConfig::Color { from, to } => {
                check_vec("from", *from)?;
                check_vec("to", *to)?;
                BehaviourKind::Color {
                    from: *from,
                    to: *to,
                }
            }
            BehaviourKindConfig::Scale { from, to } => {
                check_span("from", from)?;
                check_span("to", to)?;
                BehaviourKind::Scale {
                    from: *from,
                    to: *to,
                    sampled: None,
                }
            }
            BehaviourKindConfig::Rotate { x, y, z } => {
                check_span("x", x)?;
                check_span("y", y)?;
                check_span("z", z)?;
                BehaviourKind::Rotate {
                    x: *x,
                    y: *y,
                    z: *z,
                    sampled: None,
                }
            }
            BehaviourKindConfig::Attraction {
                target,
                force,
                radius,
            } => {
                check_vec("target", *target)?;
                check_scalar("force", *force)?;
                check_positive("radius", *radius)?;
                BehaviourKind::Attraction {
                    target: *target,
                    force: *force,
                    radius: *radius,
                }
            }
            BehaviourKindConfig::Repulsion {
                target,
                force,
                radius,
            } => {
                check_vec("target", *target)?;
                check_scalar("force", *force)?;
                check_positive("radius", *radius)?;
                BehaviourKind::Repulsion {
                    target: *target,
                    force: *force,
                    radius: *radius,
                }
            }
            BehaviourKindConfig::RandomDrift { drift, delay } => {
                check_vec("drift", *drift)?;
                check_positive("delay", *delay)?;
                BehaviourKind::RandomDrift {
                    drift: *drift,
                    delay: *delay,
                    accumulator: 0.0,
                }
            }
            BehaviourKindConfig::Collision { bounce, use_mass } => {
                check_scalar("bounce", *bounce)?;
                if *bounce < 0.0 {
                    return Err(BuildError::field("bounce", "must be non-negative"));
                }
                BehaviourKind::Collision {
                    bounce: *bounce,
                    use_mass: *use_mass,
                }
            }
            BehaviourKindConfig::CrossZone { zone, crossing } => BehaviourKind::CrossZone {
                zone: zone.build()?,
                zone_config: Some(zone.clone()),
                crossing: *crossing,
            },
        };

        if let Some(life) = config.life {
            if life.is_nan() || life <= 0.0 {
                return Err(BuildError::field("life", "must be positive or infinite"));
            }
        }

        let mut behaviour = Self::with_kind(kind);
        behaviour.state.life = config.life.unwrap_or(f32::INFINITY);
        behaviour.state.easing = config.easing;
        behaviour.state.enabled = config.enabled;
        Ok(behaviour)
    }

    /// The declarative description of this behaviour.
    ///
    /// Fails for rules built around externally supplied zones, which have no
    /// JSON form.
    pub fn to_config(&self) -> Result<BehaviourConfig, BuildError> {
        let kind = match &self.kind {
            BehaviourKind::Force { force } => BehaviourKindConfig::Force { force: *force },
            BehaviourKind::Gravity { gravity } => {
                BehaviourKindConfig::Gravity { gravity: *gravity }
            }
            BehaviourKind::Alpha { from, to, .. } => BehaviourKindConfig::Alpha {
                from: *from,
                to: *to,
            },
            BehaviourKind::Color { from, to } => BehaviourKindConfig::Color {
                from: *from,
                to: *to,
            },
            BehaviourKind::Scale { from, to, .. } => BehaviourKindConfig::Scale {
                from: *from,
                to: *to,
            },
            BehaviourKind::Rotate { x, y, z, .. } => BehaviourKindConfig::Rotate {
                x: *x,
                y: *y,
                z: *z,
            },
            BehaviourKind::Attraction {
                target,
                force,
                radius,
            } => BehaviourKindConfig::Attraction {
                target: *target,
                force: *force,
                radius: *radius,
            },
            BehaviourKind::Repulsion {
                target,
                force,
                radius,
            } => BehaviourKindConfig::Repulsion {
                target: *target,
                force: *force,
                radius: *radius,
            },
            BehaviourKind::RandomDrift { drift, delay, .. } => BehaviourKindConfig::RandomDrift {
                drift: *drift,
                delay: *delay,
            },
            BehaviourKind::Collision { bounce, use_mass } => BehaviourKindConfig::Collision {
                bounce: *bounce,
                use_mass: *use_mass,
            },
            BehaviourKind::CrossZone {
                zone_config,
                crossing,
                ..
            } => match zone_config {
                Some(zone) => BehaviourKindConfig::CrossZone {
                    zone: zone.clone(),
                    crossing: *crossing,
                },
                None => {
                    return Err(BuildError::NotSerializable { rule: "CrossZone" });
                }
            },
        };
        Ok(BehaviourConfig {
            kind,
            life: self.state.life.is_finite().then_some(self.state.life),
            easing: self.state.easing,
            enabled: self.state.enabled,
        })
    }
}

// ---------------------------------------------------------------------------
// Kind application
// ---------------------------------------------------------------------------

fn apply_to_state(
    kind: &mut BehaviourKind,
    state: &mut PhysicalState,
    progress: f32,
    dt: f32,
    ctx: &mut MutateCtx<'_>,
) {
    match kind {
        BehaviourKind::Force { force } => {
            state.acceleration += *force;
        }
        BehaviourKind::Gravity { gravity } => {
            state.acceleration.y -= *gravity;
        }
        BehaviourKind::Scale { from, to, sampled } => {
            let (a, b) = *sampled.get_or_insert_with(|| (from.sample(ctx.rng), to.sample(ctx.rng)));
            state.scale = lerp(a, b, progress);
        }
        BehaviourKind::Rotate { x, y, z, sampled } => {
            let angular = *sampled.get_or_insert_with(|| {
                Vec3::new(x.sample(ctx.rng), y.sample(ctx.rng), z.sample(ctx.rng))
            });
            state.rotation += angular * dt;
        }
        BehaviourKind::Attraction {
            target,
            force,
            radius,
        } => {
            state.acceleration += radial_pull(state.position, *target, *force, *radius);
        }
        BehaviourKind::Repulsion {
            target,
            force,
            radius,
        } => {
            state.acceleration -= radial_pull(state.position, *target, *force, *radius);
        }
        BehaviourKind::RandomDrift {
            drift,
            delay,
            accumulator,
        } => {
            *accumulator += dt.max(0.0);
            if *accumulator >= *delay {
                *accumulator = 0.0;
                let kick = Vec3::new(
                    ctx.rng.gen_range(-1.0..1.0f32) * drift.x,
                    ctx.rng.gen_range(-1.0..1.0f32) * drift.y,
                    ctx.rng.gen_range(-1.0..1.0f32) * drift.z,
                );
                state.acceleration += kick;
            }
        }
        BehaviourKind::CrossZone { zone, crossing, .. } => {
            if !zone.contains(state.position) {
                match crossing {
                    Crossing::Dead => {
                        state.dead = true;
                    }
                    Crossing::Bound => {
                        let inside = zone.clamp_inside(state.position);
                        let outward = state.position - inside;
                        if outward.length_squared() > 0.0 {
                            let normal = outward.normalize();
                            state.velocity -= 2.0 * state.velocity.dot(normal) * normal;
                        }
                        state.position = inside;
                    }
                }
            }
        }
        // Particle-only kinds never reach here.
        BehaviourKind::Alpha { .. }
        | BehaviourKind::Color { .. }
        | BehaviourKind::Collision { .. } => {}
    }
}

/// Acceleration toward `target`, linearly fading from `force` at zero
/// distance to nothing at `radius`.
fn radial_pull(position: Vec3, target: Vec3, force: f32, radius: f32) -> Vec3 {
    let delta = target - position;
    let dist = delta.length();
    if dist >= radius || dist <= f32::EPSILON {
        return Vec3::ZERO;
    }
    delta / dist * (force * (1.0 - dist / radius))
}

/// Sphere-vs-sphere response against the frame-start snapshot. Only the
/// current particle is mutated; its partner applies the mirrored response
/// when its own turn comes, off the same snapshot.
fn collide(particle: &mut Particle, bounce: f32, use_mass: bool, ctx: &mut MutateCtx<'_>) {
    for (j, other) in ctx.neighbours.iter().enumerate() {
        if j == ctx.index {
            continue;
        }
        let delta = particle.state.position - other.position;
        let dist = delta.length();
        let reach = particle.radius + other.radius;
        if dist >= reach || dist <= f32::EPSILON {
            continue;
        }
        let normal = delta / dist;
        // Push out of overlap; each side of the pair resolves half.
        particle.state.position += normal * (reach - dist) * 0.5;
        let approach = (particle.state.velocity - other.velocity).dot(normal);
        if approach < 0.0 {
            let share = if use_mass {
                other.mass / (particle.mass + other.mass)
            } else {
                0.5
            };
            particle.state.velocity -= normal * ((1.0 + bounce) * approach * share);
        }
    }
}

// ---------------------------------------------------------------------------
// BehaviourConfig
// ---------------------------------------------------------------------------

/// Kind-specific configuration payload. The `type` field selects the rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum BehaviourKindConfig {
    Force { force: Vec3 },
    Gravity { gravity: f32 },
    Alpha { from: Span, to: Span },
    Color { from: Vec3, to: Vec3 },
    Scale { from: Span, to: Span },
    Rotate { x: Span, y: Span, z: Span },
    Attraction { target: Vec3, force: f32, radius: f32 },
    Repulsion { target: Vec3, force: f32, radius: f32 },
    RandomDrift { drift: Vec3, delay: f32 },
    Collision { bounce: f32, use_mass: bool },
    CrossZone { zone: ZoneConfig, crossing: Crossing },
}

fn default_true() -> bool {
    true
}

/// Declarative description of a [`Behaviour`]:
///
/// ```json
/// { "type": "Alpha", "from": 1.0, "to": 0.0, "life": 500, "easing": "outQuad" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviourConfig {
    #[serde(flatten)]
    pub kind: BehaviourKindConfig,
    /// Active window in ms; omitted means the rule runs forever.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub life: Option<f32>,
    #[serde(default)]
    pub easing: Easing,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn check_scalar(field: &'static str, v: f32) -> Result<(), BuildError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(BuildError::field(field, "must be finite"))
    }
}

fn check_positive(field: &'static str, v: f32) -> Result<(), BuildError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(BuildError::field(field, "must be finite and positive"))
    }
}

fn check_vec(field: &'static str, v: Vec3) -> Result<(), BuildError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(BuildError::field(field, "must be finite"))
    }
}

fn check_span(field: &'static str, span: &Span) -> Result<(), BuildError> {
    span.validate().map_err(|e| BuildError::span(field, e))?;
    if !span.max().is_finite() {
        return Err(BuildError::field(field, "must be finite"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
