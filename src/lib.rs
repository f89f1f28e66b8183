//! Slipstream - simulation core for a top-down racing game
//!
//! Core modules:
//! - `sim`: deterministic fixed-tick simulation (vehicle dynamics, track
//!   boundary tests, procedural track generators)
//! - `tuning`: data-driven handling balance
//!
//! Rendering, asset persistence, camera work and input decoding live in the
//! embedding game. It feeds a [`sim::TickInput`] snapshot and a [`Tuning`]
//! record into [`sim::Simulation::tick`] once per frame and reads back the
//! car pose, track geometry and off-road/lap-progress flags.

pub mod sim;
pub mod tuning;

pub use sim::{Simulation, TickInput};
pub use tuning::Tuning;

use glam::Vec2;

/// Simulation constants
pub mod consts {
    /// Nominal fixed tick rate. All tuning rates are per-tick quantities
    /// at this rate.
    pub const TICK_RATE: u32 = 60;

    /// Below this speed the slip pipeline is skipped and slip/grip state
    /// decays toward neutral (division instability near zero speed).
    pub const REST_SPEED: f32 = 0.05;

    /// Counter-steer assist engages beyond this slip angle (degrees).
    pub const COUNTER_STEER_SLIP: f32 = 15.0;
    /// Drift assist engages beyond this slip angle (degrees).
    pub const DRIFT_ASSIST_SLIP: f32 = 20.0;

    /// Distance between generated centerline points (corridor/pass tracks).
    pub const SEGMENT_LENGTH: f32 = 48.0;
    /// Generate ahead while the frontier is within this distance of the car.
    pub const GEN_AHEAD: f32 = 1400.0;
    /// Trim centerline points once they fall this far behind the car.
    pub const TRIM_BEHIND: f32 = 900.0;
    /// Hard cap on segments produced per frame (teleport guard).
    pub const MAX_SEGMENTS_PER_FRAME: u32 = 12;
    /// Period of the centerline dash marking, tracked across trims.
    pub const DASH_PERIOD: f32 = 64.0;

    /// Grid-city tile edge length in world units.
    pub const TILE_SIZE: f32 = 512.0;
    /// Tiles are kept loaded within this many cells of the car.
    pub const LOAD_RADIUS: i32 = 2;
    /// Off-road corrective push strength (units/tick^2) in grid worlds.
    pub const ROAD_PUSH: f32 = 0.35;
    /// Velocity damping applied while being pushed back onto the road.
    pub const ROAD_PUSH_DAMPING: f32 = 0.93;
}

/// Wrap an angle in degrees to (-180, 180].
#[inline]
pub fn wrap_angle(mut deg: f32) -> f32 {
    while deg > 180.0 {
        deg -= 360.0;
    }
    while deg <= -180.0 {
        deg += 360.0;
    }
    deg
}

/// Unit vector for a heading in degrees (0 = +x, 90 = +y/north).
#[inline]
pub fn heading_vec(deg: f32) -> Vec2 {
    let r = deg.to_radians();
    Vec2::new(r.cos(), r.sin())
}

/// Rotate a vector counter-clockwise by an angle in degrees.
#[inline]
pub fn rotate_deg(v: Vec2, deg: f32) -> Vec2 {
    let (s, c) = deg.to_radians().sin_cos();
    Vec2::new(v.x * c - v.y * s, v.x * s + v.y * c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_angle_range() {
        assert_eq!(wrap_angle(180.0), 180.0);
        assert_eq!(wrap_angle(-180.0), 180.0);
        assert!((wrap_angle(270.0) + 90.0).abs() < 1e-4);
        assert!((wrap_angle(-450.0) + 90.0).abs() < 1e-4);
    }

    #[test]
    fn test_heading_vec_cardinals() {
        assert!((heading_vec(0.0) - Vec2::X).length() < 1e-5);
        assert!((heading_vec(90.0) - Vec2::Y).length() < 1e-5);
        assert!((heading_vec(180.0) + Vec2::X).length() < 1e-5);
    }

    #[test]
    fn test_rotate_deg_quarter_turn() {
        let v = rotate_deg(Vec2::X, 90.0);
        assert!((v - Vec2::Y).length() < 1e-5);
    }
}
