//! Per-frame model transform for an orbiting figure.
//!
//! Every function here is pure: the angle lives in an [`AngleAccumulator`]
//! owned by the caller and each frame produces a fresh [`Mat4`].

use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Circular orbit of a fixed-size figure around the origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Orbit {
    /// Distance from the origin to the figure's local origin, in NDC units
    pub radius: f32,
    /// Angle advanced every frame, in radians
    pub speed: f32,
    /// Anisotropic (x, y) scale applied before translation
    pub scale: [f32; 2],
}

impl Default for Orbit {
    fn default() -> Self {
        Self {
            radius: 0.5,
            speed: 0.01,
            scale: [0.25, 0.25],
        }
    }
}

/// Wraps an angle into [0, 2π)
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(TAU);
    // rem_euclid may round up to exactly TAU for tiny negative inputs
    if wrapped >= TAU {
        0.0
    } else {
        wrapped
    }
}

/// Monotonic angle that wraps around at 2π
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AngleAccumulator {
    angle: f32,
}

impl AngleAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_angle(angle: f32) -> Self {
        Self {
            angle: wrap_angle(angle),
        }
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }

    /// Adds `step` and returns the wrapped angle
    pub fn advance(&mut self, step: f32) -> f32 {
        self.angle = wrap_angle(self.angle + step);
        self.angle
    }
}

pub fn orbit_position(angle: f32, radius: f32) -> Vec2 {
    Vec2::new(radius * angle.cos(), radius * angle.sin())
}

/// Translate-then-scale: the figure keeps its size while its origin
/// travels along the orbit.
pub fn compute_transform(angle: f32, orbit: &Orbit) -> Mat4 {
    let position = orbit_position(angle, orbit.radius);
    let [sx, sy] = orbit.scale;

    Mat4::from_translation(position.extend(0.0)) * Mat4::from_scale(Vec3::new(sx, sy, 1.0))
}

/// Orbit parameters plus the running angle
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Motion {
    orbit: Orbit,
    angle: AngleAccumulator,
}

impl Motion {
    pub fn new(orbit: Orbit) -> Self {
        Self {
            orbit,
            angle: AngleAccumulator::new(),
        }
    }

    pub fn angle(&self) -> f32 {
        self.angle.angle()
    }

    /// Advances one frame and returns that frame's model matrix
    pub fn next_transform(&mut self) -> Mat4 {
        let angle = self.angle.advance(self.orbit.speed);
        compute_transform(angle, &self.orbit)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use glam::Vec4;
    use test_case::test_case;

    const EPSILON: f32 = 1e-4;

    #[test]
    fn zero_angle_sits_on_positive_x() {
        let position = orbit_position(0.0, 0.5);
        assert!((position.x - 0.5).abs() < EPSILON);
        assert!(position.y.abs() < EPSILON);
    }

    #[test_case(0.0)]
    #[test_case(1.0)]
    #[test_case(std::f32::consts::PI)]
    #[test_case(4.5)]
    #[test_case(TAU - 0.001)]
    fn orbit_stays_on_circle(angle: f32) {
        let radius = 0.5;
        let position = orbit_position(angle, radius);
        assert!((position.length_squared() - radius * radius).abs() < EPSILON);
    }

    #[test_case(-0.5, TAU - 0.5 ; "negative")]
    #[test_case(TAU, 0.0 ; "full turn")]
    #[test_case(TAU + 1.0, 1.0 ; "past full turn")]
    #[test_case(3.0, 3.0 ; "in range")]
    fn wrap(angle: f32, expected: f32) {
        let wrapped = wrap_angle(angle);
        assert!((wrapped - expected).abs() < EPSILON, "{wrapped} != {expected}");
    }

    #[test]
    fn wrap_tiny_negative_stays_below_tau() {
        let wrapped = wrap_angle(-f32::EPSILON * 0.01);
        assert!((0.0..TAU).contains(&wrapped));
    }

    #[test]
    fn accumulator_stays_in_range() {
        let mut accumulator = AngleAccumulator::new();
        for _ in 0..10_000 {
            let angle = accumulator.advance(0.37);
            assert!((0.0..TAU).contains(&angle), "angle {angle} escaped [0, 2π)");
        }
    }

    #[test_case(100, 0.01)]
    #[test_case(629, 0.01 ; "just past one turn")]
    #[test_case(1000, 0.01)]
    #[test_case(50, 1.3)]
    fn accumulator_matches_modulo(frames: u32, step: f32) {
        let mut accumulator = AngleAccumulator::new();
        for _ in 0..frames {
            accumulator.advance(step);
        }

        let expected = (frames as f64 * step as f64).rem_euclid(std::f64::consts::TAU) as f32;
        assert!(
            (accumulator.angle() - expected).abs() < 1e-3,
            "{} != {expected}",
            accumulator.angle()
        );
    }

    #[test]
    fn transform_scales_then_translates() {
        let orbit = Orbit::default();
        let matrix = compute_transform(0.0, &orbit);

        // local origin lands on the orbit
        let origin = matrix * Vec4::new(0.0, 0.0, 0.0, 1.0);
        assert!((origin.x - 0.5).abs() < EPSILON);
        assert!(origin.y.abs() < EPSILON);

        // local unit vectors are scaled, not translated twice
        let corner = matrix * Vec4::new(1.0, 1.0, 0.0, 1.0);
        assert!((corner.x - 0.75).abs() < EPSILON);
        assert!((corner.y - 0.25).abs() < EPSILON);
        assert!((corner.w - 1.0).abs() < EPSILON);
    }

    #[test]
    fn transform_is_pure() {
        let orbit = Orbit::default();
        assert_eq!(compute_transform(1.25, &orbit), compute_transform(1.25, &orbit));
    }

    #[test]
    fn motion_advances_before_computing() {
        let orbit = Orbit::default();
        let mut motion = Motion::new(orbit);

        let first = motion.next_transform();
        assert!((motion.angle() - orbit.speed).abs() < EPSILON);
        assert_eq!(first, compute_transform(orbit.speed, &orbit));

        motion.next_transform();
        assert!((motion.angle() - 2.0 * orbit.speed).abs() < EPSILON);
    }
}
