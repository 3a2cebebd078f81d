//! Spatial zones -- sampleable regions of 3D space.
//!
//! A [`Zone`] answers two questions: "give me a point inside you" (for spawn
//! placement) and "is this point inside you" (for boundary rules). The
//! built-in shapes cover points, segments, boxes, and spheres; anything
//! fancier (mesh surfaces, screen-space regions) lives outside this crate and
//! plugs in through the same trait.

use glam::Vec3;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::ZoneError;

// ---------------------------------------------------------------------------
// Zone trait
// ---------------------------------------------------------------------------

/// A region of space that can be sampled and membership-tested.
///
/// Zones are immutable once built and shared via `Arc`, so one zone instance
/// can serve many rules.
pub trait Zone: fmt::Debug + Send + Sync {
    /// Draw a uniformly distributed point from the zone.
    fn sample(&self, rng: &mut dyn RngCore) -> Vec3;

    /// Whether `point` lies inside the zone (boundary inclusive).
    fn contains(&self, point: Vec3) -> bool;

    /// The nearest point of the zone to `point`. Used by boundary rules to
    /// push escapees back inside. Points already inside return unchanged.
    fn clamp_inside(&self, point: Vec3) -> Vec3;
}

// ---------------------------------------------------------------------------
// Shapes
// ---------------------------------------------------------------------------

/// A single point. Degenerate but useful as a spawn origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointZone {
    pub position: Vec3,
}

impl PointZone {
    pub fn new(position: Vec3) -> Self {
        Self { position }
    }
}

impl Zone for PointZone {
    fn sample(&self, _rng: &mut dyn RngCore) -> Vec3 {
        self.position
    }

    fn contains(&self, point: Vec3) -> bool {
        point == self.position
    }

    fn clamp_inside(&self, _point: Vec3) -> Vec3 {
        self.position
    }
}

/// A line segment between two endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineZone {
    pub a: Vec3,
    pub b: Vec3,
}

impl LineZone {
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self { a, b }
    }

    /// Parameter of the closest point on the segment to `point`.
    fn closest_t(&self, point: Vec3) -> f32 {
        let ab = self.b - self.a;
        let len_sq = ab.length_squared();
        if len_sq == 0.0 {
            return 0.0;
        }
        ((point - self.a).dot(ab) / len_sq).clamp(0.0, 1.0)
    }
}

impl Zone for LineZone {
    fn sample(&self, rng: &mut dyn RngCore) -> Vec3 {
        self.a + (self.b - self.a) * rng.gen::<f32>()
    }

    fn contains(&self, point: Vec3) -> bool {
        let closest = self.a + (self.b - self.a) * self.closest_t(point);
        point.distance_squared(closest) < 1e-6
    }

    fn clamp_inside(&self, point: Vec3) -> Vec3 {
        self.a + (self.b - self.a) * self.closest_t(point)
    }
}

/// An axis-aligned box. Corners are normalized per axis at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxZone {
    min: Vec3,
    max: Vec3,
}

impl BoxZone {
    /// Build a box from any two opposite corners.
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn min(&self) -> Vec3 {
        self.min
    }

    pub fn max(&self) -> Vec3 {
        self.max
    }
}

impl Zone for BoxZone {
    fn sample(&self, rng: &mut dyn RngCore) -> Vec3 {
        let axis = |lo: f32, hi: f32, rng: &mut dyn RngCore| {
            if lo == hi {
                lo
            } else {
                rng.gen_range(lo..hi)
            }
        };
        Vec3::new(
            axis(self.min.x, self.max.x, rng),
            axis(self.min.y, self.max.y, rng),
            axis(self.min.z, self.max.z, rng),
        )
    }

    fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    fn clamp_inside(&self, point: Vec3) -> Vec3 {
        point.clamp(self.min, self.max)
    }
}

/// A solid sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereZone {
    pub center: Vec3,
    pub radius: f32,
}

impl SphereZone {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }
}

impl Zone for SphereZone {
    fn sample(&self, rng: &mut dyn RngCore) -> Vec3 {
        if self.radius == 0.0 {
            return self.center;
        }
        // Rejection sampling over the unit cube keeps the distribution
        // uniform over the ball.
        loop {
            let candidate = Vec3::new(
                rng.gen_range(-1.0..1.0f32),
                rng.gen_range(-1.0..1.0f32),
                rng.gen_range(-1.0..1.0f32),
            );
            if candidate.length_squared() <= 1.0 {
                return self.center + candidate * self.radius;
            }
        }
    }

    fn contains(&self, point: Vec3) -> bool {
        point.distance_squared(self.center) <= self.radius * self.radius
    }

    fn clamp_inside(&self, point: Vec3) -> Vec3 {
        let offset = point - self.center;
        let dist = offset.length();
        if dist <= self.radius || dist == 0.0 {
            point
        } else {
            self.center + offset * (self.radius / dist)
        }
    }
}

// ---------------------------------------------------------------------------
// ZoneConfig
// ---------------------------------------------------------------------------

/// Declarative description of a built-in zone.
///
/// The `type` field selects the shape:
///
/// ```json
/// { "type": "Sphere", "center": [0, 0, 0], "radius": 5 }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ZoneConfig {
    Point { position: Vec3 },
    Line { a: Vec3, b: Vec3 },
    Box { min: Vec3, max: Vec3 },
    Sphere { center: Vec3, radius: f32 },
}

impl ZoneConfig {
    /// Validate the description and build the shared zone instance.
    pub fn build(&self) -> Result<Arc<dyn Zone>, ZoneError> {
        match *self {
            ZoneConfig::Point { position } => {
                check_finite(position)?;
                Ok(Arc::new(PointZone::new(position)))
            }
            ZoneConfig::Line { a, b } => {
                check_finite(a)?;
                check_finite(b)?;
                Ok(Arc::new(LineZone::new(a, b)))
            }
            ZoneConfig::Box { min, max } => {
                check_finite(min)?;
                check_finite(max)?;
                Ok(Arc::new(BoxZone::new(min, max)))
            }
            ZoneConfig::Sphere { center, radius } => {
                check_finite(center)?;
                if !radius.is_finite() || radius < 0.0 {
                    return Err(ZoneError::InvalidRadius(radius));
                }
                Ok(Arc::new(SphereZone::new(center, radius)))
            }
        }
    }
}

fn check_finite(v: Vec3) -> Result<(), ZoneError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(ZoneError::NonFiniteCoordinate)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(11)
    }

    // -- sampling stays inside ----------------------------------------------

    #[test]
    fn point_zone_always_samples_its_point() {
        let mut rng = rng();
        let z = PointZone::new(Vec3::new(1.0, 2.0, 3.0));
        for _ in 0..5 {
            assert_eq!(z.sample(&mut rng), Vec3::new(1.0, 2.0, 3.0));
        }
    }

    #[test]
    fn line_samples_lie_on_the_segment() {
        let mut rng = rng();
        let z = LineZone::new(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0));
        for _ in 0..100 {
            let p = z.sample(&mut rng);
            assert!(z.contains(p), "sample {p} off the segment");
        }
    }

    #[test]
    fn box_samples_stay_inside() {
        let mut rng = rng();
        let z = BoxZone::new(Vec3::splat(-2.0), Vec3::splat(2.0));
        for _ in 0..500 {
            assert!(z.contains(z.sample(&mut rng)));
        }
    }

    #[test]
    fn sphere_samples_stay_inside() {
        let mut rng = rng();
        let z = SphereZone::new(Vec3::new(5.0, 0.0, 0.0), 3.0);
        for _ in 0..500 {
            assert!(z.contains(z.sample(&mut rng)));
        }
    }

    #[test]
    fn degenerate_shapes_sample_without_panicking() {
        let mut rng = rng();
        assert_eq!(
            BoxZone::new(Vec3::ONE, Vec3::ONE).sample(&mut rng),
            Vec3::ONE
        );
        assert_eq!(
            SphereZone::new(Vec3::ONE, 0.0).sample(&mut rng),
            Vec3::ONE
        );
        assert_eq!(
            LineZone::new(Vec3::ONE, Vec3::ONE).sample(&mut rng),
            Vec3::ONE
        );
    }

    // -- membership and clamping --------------------------------------------

    #[test]
    fn box_corners_swap_automatically() {
        let z = BoxZone::new(Vec3::new(5.0, -1.0, 2.0), Vec3::new(-5.0, 1.0, 0.0));
        assert_eq!(z.min(), Vec3::new(-5.0, -1.0, 0.0));
        assert!(z.contains(Vec3::ZERO));
    }

    #[test]
    fn box_clamp_projects_to_the_nearest_face() {
        let z = BoxZone::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        assert_eq!(z.clamp_inside(Vec3::new(3.0, 0.0, 0.0)), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(z.clamp_inside(Vec3::ZERO), Vec3::ZERO);
    }

    #[test]
    fn sphere_clamp_projects_onto_the_surface() {
        let z = SphereZone::new(Vec3::ZERO, 2.0);
        let clamped = z.clamp_inside(Vec3::new(10.0, 0.0, 0.0));
        assert!((clamped - Vec3::new(2.0, 0.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn line_clamp_finds_the_closest_segment_point() {
        let z = LineZone::new(Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0));
        let clamped = z.clamp_inside(Vec3::new(4.0, 5.0, 0.0));
        assert!((clamped - Vec3::new(4.0, 0.0, 0.0)).length() < 1e-5);
        // Beyond an endpoint clamps to the endpoint.
        let end = z.clamp_inside(Vec3::new(20.0, 0.0, 0.0));
        assert_eq!(end, Vec3::new(10.0, 0.0, 0.0));
    }

    // -- config -------------------------------------------------------------

    #[test]
    fn config_builds_each_shape() {
        let configs = [
            r#"{ "type": "Point", "position": [1, 2, 3] }"#,
            r#"{ "type": "Line", "a": [0, 0, 0], "b": [1, 0, 0] }"#,
            r#"{ "type": "Box", "min": [-1, -1, -1], "max": [1, 1, 1] }"#,
            r#"{ "type": "Sphere", "center": [0, 0, 0], "radius": 5 }"#,
        ];
        for json in configs {
            let config: ZoneConfig = serde_json::from_str(json).unwrap();
            assert!(config.build().is_ok(), "failed to build {json}");
        }
    }

    #[test]
    fn config_rejects_negative_radius() {
        let config = ZoneConfig::Sphere {
            center: Vec3::ZERO,
            radius: -1.0,
        };
        assert_eq!(config.build().unwrap_err(), ZoneError::InvalidRadius(-1.0));
    }

    #[test]
    fn config_rejects_non_finite_coordinates() {
        let config = ZoneConfig::Point {
            position: Vec3::new(f32::NAN, 0.0, 0.0),
        };
        assert_eq!(
            config.build().unwrap_err(),
            ZoneError::NonFiniteCoordinate
        );
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = ZoneConfig::Sphere {
            center: Vec3::new(1.0, 2.0, 3.0),
            radius: 4.0,
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: ZoneConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
