//! Shared kinematic and lifetime state.
//!
//! [`PhysicalState`] is the block of position/velocity/age data common to
//! anything that moves and ages in the simulation. Particles embed one, and
//! so does the emitter itself, which is how emitter-targeted rules can reuse
//! the particle rule machinery without an inheritance relationship.
//!
//! All times are milliseconds; velocities are units-per-ms and accelerations
//! units-per-ms^2.

use glam::Vec3;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// PhysicalState
// ---------------------------------------------------------------------------

/// Kinematics plus lifetime bookkeeping for one simulated body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhysicalState {
    /// Current position.
    pub position: Vec3,
    /// Current velocity (units per ms).
    pub velocity: Vec3,
    /// Force accumulator for the current step (units per ms^2). Cleared by
    /// [`integrate`](Self::integrate).
    pub acceleration: Vec3,
    /// Euler rotation in radians.
    pub rotation: Vec3,
    /// Uniform scale factor.
    pub scale: f32,
    /// Time lived so far, in ms.
    pub age: f32,
    /// Total life span in ms. `f32::INFINITY` means immortal.
    pub life: f32,
    /// Set once the body has died; dead bodies are skipped and pruned.
    pub dead: bool,
}

impl PhysicalState {
    /// A fresh, immortal body at the origin.
    pub fn new() -> Self {
        Self {
            position: Vec3::ZERO,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: 1.0,
            age: 0.0,
            life: f32::INFINITY,
            dead: false,
        }
    }

    /// Advance the body's age by `dt` ms, marking it dead when its life span
    /// is reached. Negative deltas are treated as zero.
    pub fn update_age(&mut self, dt: f32) {
        self.age += dt.max(0.0);
        if self.age >= self.life {
            self.dead = true;
        }
    }

    /// Remaining life as a fraction in `[0, 1]`: `1.0` at birth, `0.0` at
    /// death. Immortal bodies always report `1.0`.
    pub fn energy(&self) -> f32 {
        if !self.life.is_finite() {
            return 1.0;
        }
        if self.life <= 0.0 {
            return 0.0;
        }
        (1.0 - self.age / self.life).clamp(0.0, 1.0)
    }

    /// One explicit-Euler step: fold the force accumulator into velocity,
    /// apply the damping factor, advance position, and clear the accumulator.
    ///
    /// `damping_factor` is the per-step velocity multiplier (`1.0` means no
    /// damping).
    pub fn integrate(&mut self, dt: f32, damping_factor: f32) {
        self.velocity += self.acceleration * dt;
        self.velocity *= damping_factor;
        self.position += self.velocity * dt;
        self.acceleration = Vec3::ZERO;
    }

    /// Whether every field still holds a usable number. Positions, velocities,
    /// accelerations, and age must be finite; life may be `+inf` but never
    /// `NaN` or negative. Bodies failing this check are killed by the caller
    /// rather than propagated.
    pub fn is_numeric(&self) -> bool {
        self.position.is_finite()
            && self.velocity.is_finite()
            && self.acceleration.is_finite()
            && self.rotation.is_finite()
            && self.scale.is_finite()
            && self.age.is_finite()
            && !self.life.is_nan()
            && self.life >= 0.0
    }

    /// Reset to the pristine state produced by [`new`](Self::new).
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for PhysicalState {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    // -- aging --------------------------------------------------------------

    #[test]
    fn ages_accumulate_and_kill_at_life() {
        let mut s = PhysicalState::new();
        s.life = 100.0;
        s.update_age(60.0);
        assert!(!s.dead);
        s.update_age(60.0);
        assert!(s.dead, "age 120 >= life 100 must mark dead");
    }

    #[test]
    fn exact_life_boundary_is_dead() {
        let mut s = PhysicalState::new();
        s.life = 50.0;
        s.update_age(50.0);
        assert!(s.dead);
    }

    #[test]
    fn negative_dt_does_not_rewind_age() {
        let mut s = PhysicalState::new();
        s.update_age(10.0);
        s.update_age(-5.0);
        assert_eq!(s.age, 10.0);
    }

    #[test]
    fn immortal_bodies_never_age_out() {
        let mut s = PhysicalState::new();
        s.update_age(1.0e9);
        assert!(!s.dead);
        assert_eq!(s.energy(), 1.0);
    }

    // -- energy -------------------------------------------------------------

    #[test]
    fn energy_runs_from_one_to_zero() {
        let mut s = PhysicalState::new();
        s.life = 200.0;
        assert_eq!(s.energy(), 1.0);
        s.update_age(50.0);
        assert!((s.energy() - 0.75).abs() < 1e-6);
        s.update_age(150.0);
        assert_eq!(s.energy(), 0.0);
    }

    // -- integration --------------------------------------------------------

    #[test]
    fn integrate_folds_acceleration_then_moves() {
        let mut s = PhysicalState::new();
        s.acceleration = Vec3::new(0.0, 2.0, 0.0);
        s.integrate(1.0, 1.0);
        assert_eq!(s.velocity, Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(s.position, Vec3::new(0.0, 2.0, 0.0));
        assert_eq!(s.acceleration, Vec3::ZERO, "accumulator must clear");
    }

    #[test]
    fn damping_scales_velocity_each_step() {
        let mut s = PhysicalState::new();
        s.velocity = Vec3::new(10.0, 0.0, 0.0);
        s.integrate(1.0, 0.5);
        assert_eq!(s.velocity.x, 5.0);
        s.integrate(1.0, 0.5);
        assert_eq!(s.velocity.x, 2.5);
    }

    // -- numeric health -----------------------------------------------------

    #[test]
    fn nan_position_fails_numeric_check() {
        let mut s = PhysicalState::new();
        assert!(s.is_numeric());
        s.position.x = f32::NAN;
        assert!(!s.is_numeric());
    }

    #[test]
    fn infinite_life_is_still_numeric() {
        let s = PhysicalState::new();
        assert_eq!(s.life, f32::INFINITY);
        assert!(s.is_numeric());
    }

    #[test]
    fn reset_restores_pristine_state() {
        let mut s = PhysicalState::new();
        s.position = Vec3::splat(9.0);
        s.life = 10.0;
        s.update_age(20.0);
        s.reset();
        assert_eq!(s, PhysicalState::new());
    }
}
