//! Whole-emitter declarative configuration.
//!
//! An [`EmitterConfig`] describes everything about an emitter in JSON: its
//! transform, life span, emission budget, rate, and the full rule lists.
//! Building validates every field up front; a built emitter round-trips back
//! to an equal configuration as long as none of its rules hold runtime-only
//! state (externally supplied zones).

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::behaviour::{Behaviour, BehaviourConfig};
use crate::emitter::Emitter;
use crate::error::BuildError;
use crate::initializer::{Initializer, InitializerConfig};
use crate::rate::{Rate, RateConfig};

// ---------------------------------------------------------------------------
// EmitterConfig
// ---------------------------------------------------------------------------

/// Declarative description of an [`Emitter`].
///
/// ```json
/// {
///   "id": "sparks",
///   "rate": { "numPan": [2, 5], "timePan": 50 },
///   "initializers": [
///     { "type": "Life", "life": [500, 1500] },
///     { "type": "RadialVelocity", "direction": [0, 1, 0], "speed": 0.3, "theta": 30 }
///   ],
///   "behaviours": [
///     { "type": "Gravity", "gravity": 0.001 },
///     { "type": "Alpha", "from": 1.0, "to": 0.0, "easing": "outQuad" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmitterConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Vec3>,
    /// Euler rotation in radians.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<Vec3>,
    /// Emitter life span in ms; omitted means immortal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub life: Option<f32>,
    /// Emission budget; omitted means unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub damping: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind_emitter: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_destroy: Option<bool>,
    /// RNG seed for reproducible runs; omitted means entropy-seeded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    pub rate: RateConfig,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub initializers: Vec<InitializerConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub behaviours: Vec<BehaviourConfig>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emitter_behaviours: Vec<BehaviourConfig>,
}

impl Emitter {
    /// Build an emitter from a declarative description.
    ///
    /// Everything is validated here; the emitter comes back idle, waiting for
    /// [`emit`](Emitter::emit).
    pub fn from_config(config: &EmitterConfig) -> Result<Self, BuildError> {
        let mut emitter = Emitter::new();

        if let Some(id) = &config.id {
            emitter.id = id.clone();
        }
        if let Some(position) = config.position {
            if !position.is_finite() {
                return Err(BuildError::field("position", "must be finite"));
            }
            emitter.state.position = position;
        }
        if let Some(rotation) = config.rotation {
            if !rotation.is_finite() {
                return Err(BuildError::field("rotation", "must be finite"));
            }
            emitter.state.rotation = rotation;
        }
        if let Some(life) = config.life {
            if life.is_nan() || life <= 0.0 {
                return Err(BuildError::field("life", "must be positive or infinite"));
            }
            emitter.state.life = life;
        }
        if let Some(damping) = config.damping {
            if !damping.is_finite() || !(0.0..1.0).contains(&damping) {
                return Err(BuildError::field("damping", "must be within [0, 1)"));
            }
            emitter.damping = damping;
        }
        if let Some(seed) = config.seed {
            emitter.seed = Some(seed);
            emitter.rng = Pcg32::seed_from_u64(seed);
        }

        emitter.total_emit_count = config.total;
        emitter.bind_emitter = config.bind_emitter.unwrap_or(false);
        emitter.auto_destroy = config.auto_destroy.unwrap_or(false);
        emitter.rate = Rate::from_config(&config.rate)?;

        emitter.initializers = config
            .initializers
            .iter()
            .map(Initializer::from_config)
            .collect::<Result<_, _>>()?;
        emitter.behaviours = config
            .behaviours
            .iter()
            .map(Behaviour::from_config)
            .collect::<Result<_, _>>()?;
        emitter.emitter_behaviours = config
            .emitter_behaviours
            .iter()
            .map(Behaviour::from_config)
            .collect::<Result<_, _>>()?;

        Ok(emitter)
    }

    /// Build an emitter straight from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, BuildError> {
        let config: EmitterConfig = serde_json::from_str(json)?;
        Self::from_config(&config)
    }

    /// The declarative description of this emitter.
    ///
    /// Fails if any rule holds runtime-only state with no JSON form.
    pub fn to_config(&self) -> Result<EmitterConfig, BuildError> {
        Ok(EmitterConfig {
            id: Some(self.id.clone()),
            position: Some(self.state.position),
            rotation: Some(self.state.rotation),
            life: self.state.life.is_finite().then_some(self.state.life),
            total: self.total_emit_count,
            damping: Some(self.damping),
            bind_emitter: Some(self.bind_emitter),
            auto_destroy: Some(self.auto_destroy),
            seed: self.seed,
            rate: self.rate.to_config(),
            initializers: self
                .initializers
                .iter()
                .map(Initializer::to_config)
                .collect::<Result<_, _>>()?,
            behaviours: self
                .behaviours
                .iter()
                .map(Behaviour::to_config)
                .collect::<Result<_, _>>()?,
            emitter_behaviours: self
                .emitter_behaviours
                .iter()
                .map(Behaviour::to_config)
                .collect::<Result<_, _>>()?,
        })
    }

    /// Serialize the emitter's recipe to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, BuildError> {
        Ok(serde_json::to_string_pretty(&self.to_config()?)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
