//! Vehicle state and per-tick boundary types
//!
//! All simulation-owned car state lives here; it is mutated exactly once per
//! tick by [`super::car::advance`].

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Per-tick input snapshot: the five driving commands.
///
/// Fields are 0..1 analog; boolean devices map to 0.0/1.0. The simulation is
/// agnostic to device origin and clamps every field on use.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TickInput {
    pub accelerate: f32,
    /// Brakes while rolling forward, reverses from rest.
    pub brake: f32,
    pub steer_left: f32,
    pub steer_right: f32,
    pub handbrake: f32,
}

impl TickInput {
    /// Net steer command in [-1, 1], positive = right turn (clockwise).
    pub(crate) fn steer(&self) -> f32 {
        self.steer_right.clamp(0.0, 1.0) - self.steer_left.clamp(0.0, 1.0)
    }
}

/// Complete kinematic and slip state of one car.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CarState {
    pub pos: Vec2,
    /// Heading in degrees, wrapped to (-180, 180]. 0 = +x, 90 = +y (north).
    pub heading: f32,
    pub vel: Vec2,
    /// Current wheel angle in degrees; chases the steering target.
    pub wheel_angle: f32,
    /// Yaw rate in degrees per tick.
    pub angular_vel: f32,
    /// Dynamic front axle weight fraction. `weight_front + weight_rear == 1`
    /// at all times, both within [0.2, 0.8].
    pub weight_front: f32,
    pub weight_rear: f32,
    /// Overall slip angle: heading minus velocity direction, degrees in
    /// (-180, 180].
    pub slip: f32,
    pub slip_front: f32,
    pub slip_rear: f32,
    /// Per-axle grip coefficients in [0, 1].
    pub grip_front: f32,
    pub grip_rear: f32,
    /// Drift intensity in [0, 1], for downstream effects (smoke, score).
    pub drift: f32,
    /// Speed after the per-tick cap (the reported magnitude).
    pub speed: f32,
}

impl CarState {
    pub fn new(pos: Vec2, heading: f32) -> Self {
        Self {
            pos,
            heading: crate::wrap_angle(heading),
            vel: Vec2::ZERO,
            wheel_angle: 0.0,
            angular_vel: 0.0,
            weight_front: 0.5,
            weight_rear: 0.5,
            slip: 0.0,
            slip_front: 0.0,
            slip_rear: 0.0,
            grip_front: 1.0,
            grip_rear: 1.0,
            drift: 0.0,
            speed: 0.0,
        }
    }
}

/// Pose snapshot the presentation layer reads each frame.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CarPose {
    pub pos: Vec2,
    pub heading: f32,
    pub wheel_angle: f32,
    pub speed: f32,
    pub drift: f32,
}

impl From<&CarState> for CarPose {
    fn from(car: &CarState) -> Self {
        Self {
            pos: car.pos,
            heading: car.heading,
            wheel_angle: car.wheel_angle,
            speed: car.speed,
            drift: car.drift,
        }
    }
}
