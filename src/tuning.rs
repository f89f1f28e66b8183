//! Data-driven handling balance
//!
//! A [`Tuning`] record is the flat set of numeric/boolean knobs the
//! simulation reads every tick. Records arrive from outside the core (a
//! control panel, a JSON preset, a saved setup) and may be older or partial:
//! every field is optional and falls back to the documented default, so a
//! record containing only `{"max_speed": 10.0}` is valid. Out-of-range
//! values are never rejected here; the consuming formulas clamp them.

use serde::{Deserialize, Serialize};

/// All handling knobs, grouped by concern. Rates are per-tick quantities at
/// the fixed simulation rate; angles are degrees; forces pair with `mass`
/// so acceleration = force / mass.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Mass / inertia ===
    /// Vehicle mass. Default 1200.
    pub mass: f32,
    /// Yaw inertia multiplier. Default 1.5.
    pub inertia: f32,

    // === Weight transfer ===
    /// Static front axle weight fraction. Default 0.52, clamped [0.2, 0.8].
    pub front_weight_static: f32,
    /// Longitudinal weight transfer factor. Default 6.0.
    pub weight_transfer: f32,
    /// Gravity constant for the transfer formula. Default 9.8.
    pub gravity: f32,

    // === Traction curve ===
    /// Peak grip coefficient. Default 1.0, clamped [0, 1].
    pub grip_peak: f32,
    /// Sliding grip coefficient approached as slip nears 90 deg. Default 0.35.
    pub grip_sliding: f32,
    /// Slip angle (deg) where the linear rise reaches the peak. Default 8.
    pub slip_angle_optimal: f32,
    /// Slip angle (deg) where the plateau breaks away. Default 22.
    pub slip_angle_peak: f32,
    /// Power-law exponent of the falloff past the breakaway angle. Default 1.4.
    pub grip_falloff: f32,
    /// Front axle share of total traction. Default 0.5.
    pub traction_bias: f32,
    /// Global grip loss multiplier. Default 1.0.
    pub grip_multiplier: f32,
    /// Grip attenuation while off-road. Default 0.6.
    pub offroad_grip: f32,

    // === Drivetrain ===
    /// Engine drive force. Default 260.
    pub engine_force: f32,
    /// Reverse drive force. Default 140.
    pub reverse_force: f32,
    /// Drive split: 0 = rear-drive, 1 = front-drive. Default 0.0.
    pub drive_bias: f32,
    /// Converts an axle grip coefficient into a force-per-mass capacity.
    /// Default 2.0.
    pub traction_scale: f32,
    /// Yaw kick per unit of rear drive force beyond grip. Default 6.0.
    pub wheelspin_oversteer: f32,

    // === Braking ===
    /// Brake force. Default 420.
    pub brake_force: f32,
    /// Brake split: front axle share. Default 0.65.
    pub brake_bias: f32,
    /// Anti-lock braking: caps per-axle brake force at the axle's grip
    /// capacity. Default true.
    pub abs: bool,
    /// Without ABS, yaw kick per unit of rear brake force beyond grip.
    /// Default 4.0.
    pub lockup_factor: f32,
    /// Handbrake deceleration force. Default 180.
    pub handbrake_force: f32,
    /// Rear grip multiplier while the handbrake is pulled. Default 0.45.
    pub handbrake_grip: f32,
    /// Rear slip angle (deg) the handbrake forces the axle toward. Default 48.
    pub handbrake_slip_angle: f32,

    // === Steering geometry ===
    /// Maximum wheel angle (deg). Default 32.
    pub max_wheel_angle: f32,
    /// Exponent shaping raw steer input. Default 1.6.
    pub steer_curve: f32,
    /// Wheel angle chase rate while turning in (deg/tick). Default 3.2.
    pub steer_rate_in: f32,
    /// Wheel angle chase rate while returning to center (deg/tick).
    /// Default 4.8.
    pub steer_rate_out: f32,
    /// Steering authority fraction remaining at max speed. Default 0.35.
    pub steer_speed_floor: f32,

    // === Stability assists ===
    /// Counter-steer assist past 15 deg of slip. Default true.
    pub counter_steer: bool,
    /// Counter-steer correction per degree of excess slip. Default 0.35.
    pub counter_steer_gain: f32,
    /// Drift assist past 20 deg of slip. Default false.
    pub drift_assist: bool,
    /// Drift assist correction per degree of excess slip. Default 0.25.
    pub drift_assist_gain: f32,

    // === Global motion ===
    /// Speed cap (units/tick). Default 12.
    pub max_speed: f32,
    /// Reverse speed cap (units/tick). Default 4.5.
    pub max_reverse_speed: f32,
    /// Multiplicative aerodynamic drag per tick. Default 0.004.
    pub drag: f32,
    /// Multiplicative rolling friction per tick on road. Default 0.012.
    pub rolling_friction: f32,
    /// Multiplicative rolling friction per tick off-road. Default 0.055.
    pub offroad_friction: f32,
    /// Multiplicative yaw damping per tick. Default 0.88.
    pub angular_damping: f32,
    /// Yaw rate clamp (deg/tick). Default 5.5.
    pub max_angular_velocity: f32,
    /// Steering torque constant. Default 30.
    pub steer_torque: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            mass: 1200.0,
            inertia: 1.5,

            front_weight_static: 0.52,
            weight_transfer: 6.0,
            gravity: 9.8,

            grip_peak: 1.0,
            grip_sliding: 0.35,
            slip_angle_optimal: 8.0,
            slip_angle_peak: 22.0,
            grip_falloff: 1.4,
            traction_bias: 0.5,
            grip_multiplier: 1.0,
            offroad_grip: 0.6,

            engine_force: 260.0,
            reverse_force: 140.0,
            drive_bias: 0.0,
            traction_scale: 2.0,
            wheelspin_oversteer: 6.0,

            brake_force: 420.0,
            brake_bias: 0.65,
            abs: true,
            lockup_factor: 4.0,
            handbrake_force: 180.0,
            handbrake_grip: 0.45,
            handbrake_slip_angle: 48.0,

            max_wheel_angle: 32.0,
            steer_curve: 1.6,
            steer_rate_in: 3.2,
            steer_rate_out: 4.8,
            steer_speed_floor: 0.35,

            counter_steer: true,
            counter_steer_gain: 0.35,
            drift_assist: false,
            drift_assist_gain: 0.25,

            max_speed: 12.0,
            max_reverse_speed: 4.5,
            drag: 0.004,
            rolling_friction: 0.012,
            offroad_friction: 0.055,
            angular_damping: 0.88,
            max_angular_velocity: 5.5,
            steer_torque: 30.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_record_fills_defaults() {
        let t: Tuning = serde_json::from_str(r#"{"max_speed": 10.0}"#).unwrap();
        let d = Tuning::default();
        assert_eq!(t.max_speed, 10.0);
        assert_eq!(t.mass, d.mass);
        assert_eq!(t.engine_force, d.engine_force);
        assert_eq!(t.abs, d.abs);
        assert_eq!(t.slip_angle_peak, d.slip_angle_peak);
    }

    #[test]
    fn test_empty_record_is_default() {
        let t: Tuning = serde_json::from_str("{}").unwrap();
        let d = Tuning::default();
        assert_eq!(t.max_speed, d.max_speed);
        assert_eq!(t.front_weight_static, d.front_weight_static);
    }

    #[test]
    fn test_roundtrip() {
        let d = Tuning::default();
        let json = serde_json::to_string(&d).unwrap();
        let back: Tuning = serde_json::from_str(&json).unwrap();
        assert_eq!(back.brake_bias, d.brake_bias);
        assert_eq!(back.counter_steer, d.counter_steer);
    }
}
