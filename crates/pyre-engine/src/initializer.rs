//! Initializers -- one-time spawn setup rules.
//!
//! An [`Initializer`] runs exactly once per particle, at spawn, stamping it
//! with starting properties: life span, mass, radius, position inside a zone,
//! launch velocity, rotation, body key. After spawn it never touches the
//! particle again; per-step evolution is the behaviours' job.

use glam::Vec3;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;
use std::sync::Arc;

use crate::error::BuildError;
use crate::particle::Particle;
use pyre_core::prelude::*;

// ---------------------------------------------------------------------------
// Initializer kinds
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
enum InitializerKind {
    Mass {
        mass: Span,
    },
    Life {
        life: Span,
    },
    Radius {
        width: f32,
        height: f32,
        center: bool,
    },
    Position {
        zone: Arc<dyn Zone>,
        zone_config: Option<ZoneConfig>,
    },
    RadialVelocity {
        direction: Vec3,
        speed: Span,
        /// Cone half-angle in degrees around `direction`.
        theta: f32,
    },
    VectorVelocity {
        direction: Vec3,
        speed: Span,
    },
    Rotation {
        x: Span,
        y: Span,
        z: Span,
    },
    Body {
        keys: Vec<String>,
    },
}

impl InitializerKind {
    fn name(&self) -> &'static str {
        match self {
            InitializerKind::Mass { .. } => "Mass",
            InitializerKind::Life { .. } => "Life",
            InitializerKind::Radius { .. } => "Radius",
            InitializerKind::Position { .. } => "Position",
            InitializerKind::RadialVelocity { .. } => "RadialVelocity",
            InitializerKind::VectorVelocity { .. } => "VectorVelocity",
            InitializerKind::Rotation { .. } => "Rotation",
            InitializerKind::Body { .. } => "Body",
        }
    }
}

// ---------------------------------------------------------------------------
// Initializer
// ---------------------------------------------------------------------------

/// One spawn-time setup rule.
#[derive(Debug, Clone)]
pub struct Initializer {
    enabled: bool,
    kind: InitializerKind,
}

impl Initializer {
    fn with_kind(kind: InitializerKind) -> Self {
        Self {
            enabled: true,
            kind,
        }
    }

    /// Sample the particle's mass from `mass`.
    pub fn mass(mass: Span) -> Self {
        Self::with_kind(InitializerKind::Mass { mass })
    }

    /// Sample the particle's life span (ms) from `life`.
    pub fn life(life: Span) -> Self {
        Self::with_kind(InitializerKind::Life { life })
    }

    /// Sample the particle's radius between `width` and `height`, or use
    /// their average when `center` is set.
    pub fn radius(width: f32, height: f32, center: bool) -> Self {
        Self::with_kind(InitializerKind::Radius {
            width,
            height,
            center,
        })
    }

    /// Place the particle at a point sampled from `zone`.
    pub fn position(zone: Arc<dyn Zone>) -> Self {
        Self::with_kind(InitializerKind::Position {
            zone,
            zone_config: None,
        })
    }

    /// Launch the particle along `direction`, jittered within a cone of
    /// `theta` degrees, at a speed sampled from `speed` (units per ms).
    pub fn radial_velocity(direction: Vec3, speed: Span, theta: f32) -> Self {
        Self::with_kind(InitializerKind::RadialVelocity {
            direction,
            speed,
            theta,
        })
    }

    /// Launch the particle straight along `direction` at a sampled speed.
    pub fn vector_velocity(direction: Vec3, speed: Span) -> Self {
        Self::with_kind(InitializerKind::VectorVelocity { direction, speed })
    }

    /// Sample a starting Euler rotation (radians) per axis.
    pub fn rotation(x: Span, y: Span, z: Span) -> Self {
        Self::with_kind(InitializerKind::Rotation { x, y, z })
    }

    /// Pick one of `keys` uniformly as the particle's body key.
    pub fn body(keys: Vec<String>) -> Self {
        Self::with_kind(InitializerKind::Body { keys })
    }

    /// Enable or disable the rule.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// The rule's `type` tag, as it appears in JSON.
    pub fn kind_name(&self) -> &'static str {
        self.kind.name()
    }

    /// Stamp a freshly spawned particle. Disabled rules do nothing.
    pub fn initialize(&self, rng: &mut Pcg32, particle: &mut Particle) {
        if !self.enabled {
            return;
        }
        match &self.kind {
            InitializerKind::Mass { mass } => {
                particle.mass = mass.sample(rng);
            }
            InitializerKind::Life { life } => {
                particle.state.life = life.sample(rng);
            }
            InitializerKind::Radius {
                width,
                height,
                center,
            } => {
                let (lo, hi) = (width.min(*height), width.max(*height));
                particle.radius = if *center {
                    (lo + hi) / 2.0
                } else if lo == hi {
                    lo
                } else {
                    rng.gen_range(lo..hi)
                };
            }
            InitializerKind::Position { zone, .. } => {
                particle.state.position = zone.sample(rng);
            }
            InitializerKind::RadialVelocity {
                direction,
                speed,
                theta,
            } => {
                particle.state.velocity = cone_sample(rng, *direction, *theta) * speed.sample(rng);
            }
            InitializerKind::VectorVelocity { direction, speed } => {
                particle.state.velocity = direction.normalize_or_zero() * speed.sample(rng);
            }
            InitializerKind::Rotation { x, y, z } => {
                particle.state.rotation =
                    Vec3::new(x.sample(rng), y.sample(rng), z.sample(rng));
            }
            InitializerKind::Body { keys } => {
                particle.body = Some(keys[rng.gen_range(0..keys.len())].clone());
            }
        }
    }

    // -- configuration ------------------------------------------------------

    /// Build an initializer from its declarative description, validating
    /// every field.
    pub fn from_config(config: &InitializerConfig) -> Result<Self, BuildError> {
        let kind = match &config.kind {
            InitializerKindConfig::Mass { mass } => {
                check_span("mass", mass)?;
                if mass.min() < 0.0 {
                    return Err(BuildError::field("mass", "must be non-negative"));
                }
                InitializerKind::Mass { mass: *mass }
            }
            InitializerKindConfig::Life { life } => {
                life.validate().map_err(|e| BuildError::span("life", e))?;
                if life.min() <= 0.0 {
                    return Err(BuildError::field("life", "must be positive"));
                }
                InitializerKind::Life { life: *life }
            }
            InitializerKindConfig::Radius {
                width,
                height,
                center,
            } => {
                check_positive_scalar("width", *width)?;
                check_positive_scalar("height", *height)?;
                InitializerKind::Radius {
                    width: *width,
                    height: *height,
                    center: *center,
                }
            }
            InitializerKindConfig::Position { zone } => match zone {
                Some(zone) => InitializerKind::Position {
                    zone: zone.build()?,
                    zone_config: Some(zone.clone()),
                },
                None => {
                    return Err(BuildError::MissingZone { rule: "Position" });
                }
            },
            InitializerKindConfig::RadialVelocity {
                direction,
                speed,
                theta,
            } => {
                check_direction(*direction)?;
                check_span("speed", speed)?;
                if !theta.is_finite() || !(0.0..=180.0).contains(theta) {
                    return Err(BuildError::field("theta", "must be within [0, 180] degrees"));
                }
                InitializerKind::RadialVelocity {
                    direction: *direction,
                    speed: *speed,
                    theta: *theta,
                }
            }
            InitializerKindConfig::VectorVelocity { direction, speed } => {
                check_direction(*direction)?;
                check_span("speed", speed)?;
                InitializerKind::VectorVelocity {
                    direction: *direction,
                    speed: *speed,
                }
            }
            InitializerKindConfig::Rotation { x, y, z } => {
                check_span("x", x)?;
                check_span("y", y)?;
                check_span("z", z)?;
                InitializerKind::Rotation {
                    x: *x,
                    y: *y,
                    z: *z,
                }
            }
            InitializerKindConfig::Body { keys } => {
                if keys.is_empty() {
                    return Err(BuildError::field("keys", "must not be empty"));
                }
                InitializerKind::Body { keys: keys.clone() }
            }
        };
        Ok(Self {
            enabled: config.enabled,
            kind,
        })
    }

    /// The declarative description of this initializer.
    ///
    /// Fails for position rules built around externally supplied zones.
    pub fn to_config(&self) -> Result<InitializerConfig, BuildError> {
        let kind = match &self.kind {
            InitializerKind::Mass { mass } => InitializerKindConfig::Mass { mass: *mass },
            InitializerKind::Life { life } => InitializerKindConfig::Life { life: *life },
            InitializerKind::Radius {
                width,
                height,
                center,
            } => InitializerKindConfig::Radius {
                width: *width,
                height: *height,
                center: *center,
            },
            InitializerKind::Position { zone_config, .. } => match zone_config {
                Some(zone) => InitializerKindConfig::Position {
                    zone: Some(zone.clone()),
                },
                None => {
                    return Err(BuildError::NotSerializable { rule: "Position" });
                }
            },
            InitializerKind::RadialVelocity {
                direction,
                speed,
                theta,
            } => InitializerKindConfig::RadialVelocity {
                direction: *direction,
                speed: *speed,
                theta: *theta,
            },
            InitializerKind::VectorVelocity { direction, speed } => {
                InitializerKindConfig::VectorVelocity {
                    direction: *direction,
                    speed: *speed,
                }
            }
            InitializerKind::Rotation { x, y, z } => InitializerKindConfig::Rotation {
                x: *x,
                y: *y,
                z: *z,
            },
            InitializerKind::Body { keys } => InitializerKindConfig::Body { keys: keys.clone() },
        };
        Ok(InitializerConfig {
            kind,
            enabled: self.enabled,
        })
    }
}

/// Uniformly tilt `direction` within a cone of `theta` degrees.
fn cone_sample(rng: &mut Pcg32, direction: Vec3, theta: f32) -> Vec3 {
    let dir = direction.normalize_or_zero();
    if dir == Vec3::ZERO {
        return Vec3::ZERO;
    }
    let theta = theta.to_radians();
    if theta <= 0.0 {
        return dir;
    }
    let up = if dir.x.abs() < 0.99 { Vec3::X } else { Vec3::Y };
    let right = dir.cross(up).normalize();
    let forward = dir.cross(right);
    let azimuth = rng.gen_range(0.0..TAU);
    let spread = rng.gen_range(0.0..theta);
    right * (spread.sin() * azimuth.cos())
        + forward * (spread.sin() * azimuth.sin())
        + dir * spread.cos()
}

// ---------------------------------------------------------------------------
// InitializerConfig
// ---------------------------------------------------------------------------

/// Kind-specific configuration payload. The `type` field selects the rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum InitializerKindConfig {
    Mass {
        mass: Span,
    },
    Life {
        life: Span,
    },
    Radius {
        width: f32,
        height: f32,
        #[serde(default)]
        center: bool,
    },
    Position {
        /// Omitting the zone is a configuration error; the field is optional
        /// only so the error can name the rule instead of failing in serde.
        #[serde(default)]
        zone: Option<ZoneConfig>,
    },
    RadialVelocity {
        direction: Vec3,
        speed: Span,
        theta: f32,
    },
    VectorVelocity {
        direction: Vec3,
        speed: Span,
    },
    Rotation {
        x: Span,
        y: Span,
        z: Span,
    },
    Body {
        keys: Vec<String>,
    },
}

fn default_true() -> bool {
    true
}

/// Declarative description of an [`Initializer`]:
///
/// ```json
/// { "type": "Life", "life": [1000, 2000] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitializerConfig {
    #[serde(flatten)]
    pub kind: InitializerKindConfig,
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn check_span(field: &'static str, span: &Span) -> Result<(), BuildError> {
    span.validate().map_err(|e| BuildError::span(field, e))?;
    if !span.max().is_finite() {
        return Err(BuildError::field(field, "must be finite"));
    }
    Ok(())
}

fn check_positive_scalar(field: &'static str, v: f32) -> Result<(), BuildError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(BuildError::field(field, "must be finite and positive"))
    }
}

fn check_direction(v: Vec3) -> Result<(), BuildError> {
    if !v.is_finite() {
        return Err(BuildError::field("direction", "must be finite"));
    }
    if v == Vec3::ZERO {
        return Err(BuildError::field("direction", "must not be the zero vector"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(21)
    }

    // -- stamping -----------------------------------------------------------

    #[test]
    fn life_and_mass_sample_into_the_particle() {
        let mut rng = rng();
        let mut p = Particle::with_slot(0);
        Initializer::life(Span::Range(1000.0, 2000.0)).initialize(&mut rng, &mut p);
        Initializer::mass(Span::Value(2.5)).initialize(&mut rng, &mut p);
        assert!((1000.0..2000.0).contains(&p.state.life));
        assert_eq!(p.mass, 2.5);
    }

    #[test]
    fn radius_averages_when_centered() {
        let mut rng = rng();
        let mut p = Particle::with_slot(0);
        Initializer::radius(4.0, 8.0, true).initialize(&mut rng, &mut p);
        assert_eq!(p.radius, 6.0);

        Initializer::radius(4.0, 8.0, false).initialize(&mut rng, &mut p);
        assert!((4.0..8.0).contains(&p.radius));
    }

    #[test]
    fn position_samples_inside_the_zone() {
        let mut rng = rng();
        let zone = ZoneConfig::Sphere {
            center: Vec3::new(10.0, 0.0, 0.0),
            radius: 2.0,
        }
        .build()
        .unwrap();
        let init = Initializer::position(Arc::clone(&zone));
        for _ in 0..50 {
            let mut p = Particle::with_slot(0);
            init.initialize(&mut rng, &mut p);
            assert!(zone.contains(p.state.position));
        }
    }

    #[test]
    fn vector_velocity_points_along_the_direction() {
        let mut rng = rng();
        let mut p = Particle::with_slot(0);
        Initializer::vector_velocity(Vec3::new(0.0, 2.0, 0.0), Span::Value(0.5))
            .initialize(&mut rng, &mut p);
        assert!((p.state.velocity - Vec3::new(0.0, 0.5, 0.0)).length() < 1e-5);
    }

    #[test]
    fn radial_velocity_stays_within_its_cone() {
        let mut rng = rng();
        let dir = Vec3::new(0.0, 1.0, 0.0);
        let init = Initializer::radial_velocity(dir, Span::Value(1.0), 30.0);
        for _ in 0..100 {
            let mut p = Particle::with_slot(0);
            init.initialize(&mut rng, &mut p);
            let v = p.state.velocity;
            assert!((v.length() - 1.0).abs() < 1e-4, "speed preserved");
            let angle = v.normalize().dot(dir).acos().to_degrees();
            assert!(angle <= 30.0 + 1e-3, "angle {angle} exceeds the cone");
        }
    }

    #[test]
    fn zero_theta_means_no_jitter() {
        let mut rng = rng();
        let mut p = Particle::with_slot(0);
        Initializer::radial_velocity(Vec3::X, Span::Value(2.0), 0.0)
            .initialize(&mut rng, &mut p);
        assert!((p.state.velocity - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn body_picks_one_of_the_keys() {
        let mut rng = rng();
        let keys = vec!["a".to_owned(), "b".to_owned(), "c".to_owned()];
        let init = Initializer::body(keys.clone());
        for _ in 0..20 {
            let mut p = Particle::with_slot(0);
            init.initialize(&mut rng, &mut p);
            assert!(keys.contains(&p.body.clone().unwrap()));
        }
    }

    #[test]
    fn disabled_initializer_is_a_no_op() {
        let mut rng = rng();
        let mut p = Particle::with_slot(0);
        Initializer::mass(Span::Value(99.0))
            .with_enabled(false)
            .initialize(&mut rng, &mut p);
        assert_eq!(p.mass, 1.0);
    }

    // -- config -------------------------------------------------------------

    #[test]
    fn config_builds_and_round_trips() {
        let json = r#"{ "type": "Life", "life": [1000, 2000] }"#;
        let config: InitializerConfig = serde_json::from_str(json).unwrap();
        let init = Initializer::from_config(&config).unwrap();
        assert_eq!(init.kind_name(), "Life");
        assert_eq!(init.to_config().unwrap(), config);
    }

    #[test]
    fn position_config_without_a_zone_is_rejected() {
        let json = r#"{ "type": "Position" }"#;
        let config: InitializerConfig = serde_json::from_str(json).unwrap();
        assert!(matches!(
            Initializer::from_config(&config),
            Err(BuildError::MissingZone { rule: "Position" })
        ));
    }

    #[test]
    fn config_rejects_unknown_type_tags() {
        let json = r#"{ "type": "Magnetize", "strength": 2 }"#;
        assert!(serde_json::from_str::<InitializerConfig>(json).is_err());
    }

    #[test]
    fn config_rejects_non_positive_life() {
        let config = InitializerConfig {
            kind: InitializerKindConfig::Life {
                life: Span::Value(0.0),
            },
            enabled: true,
        };
        assert!(Initializer::from_config(&config).is_err());
    }

    #[test]
    fn externally_zoned_position_refuses_to_serialize() {
        let zone = ZoneConfig::Point {
            position: Vec3::ZERO,
        }
        .build()
        .unwrap();
        let init = Initializer::position(zone);
        assert!(matches!(
            init.to_config(),
            Err(BuildError::NotSerializable { rule: "Position" })
        ));
    }
}
