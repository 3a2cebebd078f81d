//! Easing curves for time-varying rules.
//!
//! An [`Easing`] remaps a normalized progress value `t in [0, 1]` onto a
//! shaped curve. Behaviours use these to make lifetime-driven interpolation
//! (alpha fades, scale ramps) non-linear without per-rule math.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Easing
// ---------------------------------------------------------------------------

/// A fixed family of easing curves.
///
/// Serializes as a camelCase string (`"outQuad"`, `"inOutCubic"`, ...).
/// Every curve maps `0.0 -> 0.0` and `1.0 -> 1.0`; inputs outside `[0, 1]`
/// are clamped before evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Easing {
    #[default]
    Linear,
    InQuad,
    OutQuad,
    InOutQuad,
    InCubic,
    OutCubic,
    InOutCubic,
    InQuart,
    OutQuart,
    InOutQuart,
    InSine,
    OutSine,
    InOutSine,
    InBack,
    OutBack,
    InOutBack,
}

impl Easing {
    /// Evaluate the curve at `t`, clamping `t` to `[0, 1]` first.
    pub fn apply(self, t: f32) -> f32 {
        use std::f32::consts::PI;

        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::InQuad => t * t,
            Easing::OutQuad => t * (2.0 - t),
            Easing::InOutQuad => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    -1.0 + (4.0 - 2.0 * t) * t
                }
            }
            Easing::InCubic => t * t * t,
            Easing::OutCubic => {
                let u = t - 1.0;
                u * u * u + 1.0
            }
            Easing::InOutCubic => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let u = 2.0 * t - 2.0;
                    0.5 * u * u * u + 1.0
                }
            }
            Easing::InQuart => t * t * t * t,
            Easing::OutQuart => {
                let u = t - 1.0;
                1.0 - u * u * u * u
            }
            Easing::InOutQuart => {
                if t < 0.5 {
                    8.0 * t * t * t * t
                } else {
                    let u = t - 1.0;
                    1.0 - 8.0 * u * u * u * u
                }
            }
            Easing::InSine => 1.0 - (t * PI / 2.0).cos(),
            Easing::OutSine => (t * PI / 2.0).sin(),
            Easing::InOutSine => -((t * PI).cos() - 1.0) / 2.0,
            Easing::InBack => {
                const C1: f32 = 1.70158;
                const C3: f32 = C1 + 1.0;
                C3 * t * t * t - C1 * t * t
            }
            Easing::OutBack => {
                const C1: f32 = 1.70158;
                const C3: f32 = C1 + 1.0;
                let u = t - 1.0;
                1.0 + C3 * u * u * u + C1 * u * u
            }
            Easing::InOutBack => {
                const C1: f32 = 1.70158;
                const C2: f32 = C1 * 1.525;
                if t < 0.5 {
                    let u = 2.0 * t;
                    (u * u * ((C2 + 1.0) * u - C2)) / 2.0
                } else {
                    let u = 2.0 * t - 2.0;
                    (u * u * ((C2 + 1.0) * u + C2) + 2.0) / 2.0
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
