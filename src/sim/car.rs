//! Vehicle dynamics model
//!
//! [`advance`] moves one car forward by one fixed tick. The pipeline order
//! matters: each stage consumes the previous stage's velocity and angles.
//! There are no error outcomes; every input is clamped where it is consumed.

use glam::Vec2;

use super::state::{CarState, TickInput};
use crate::consts::{COUNTER_STEER_SLIP, DRIFT_ASSIST_SLIP, REST_SPEED};
use crate::tuning::Tuning;
use crate::{heading_vec, rotate_deg, wrap_angle};

/// Three-segment slip/grip curve: linear rise to the peak coefficient up to
/// the optimal slip angle, flat up to the breakaway angle, then a power-law
/// falloff toward the sliding coefficient as slip approaches 90 degrees.
pub fn slip_curve(slip_deg: f32, t: &Tuning) -> f32 {
    let s = slip_deg.abs().min(90.0);
    let optimal = t.slip_angle_optimal.clamp(0.5, 89.0);
    let breakaway = t.slip_angle_peak.clamp(optimal, 89.5);
    let peak = t.grip_peak.clamp(0.0, 1.0);
    let sliding = t.grip_sliding.clamp(0.0, peak);

    if s <= optimal {
        peak * (s / optimal)
    } else if s <= breakaway {
        peak
    } else {
        let f = ((s - breakaway) / (90.0 - breakaway)).clamp(0.0, 1.0);
        peak - (peak - sliding) * f.powf(t.grip_falloff.max(0.1))
    }
}

/// Advance the car by one tick. `off_road` is the previous tick's boundary
/// verdict and feeds the friction and grip terms.
pub fn advance(car: &mut CarState, input: &TickInput, t: &Tuning, off_road: bool) {
    let throttle = input.accelerate.clamp(0.0, 1.0);
    let brake = input.brake.clamp(0.0, 1.0);
    let handbrake = input.handbrake.clamp(0.0, 1.0);
    let steer = input.steer();

    let mass = t.mass.max(1.0);
    let max_speed = t.max_speed.max(0.1);
    let forward = heading_vec(car.heading);
    let forward_speed = car.vel.dot(forward);
    let entry_speed = car.vel.length();

    // Yaw contributions accumulated by the drivetrain/brake stages and
    // integrated in stage 7.
    let mut yaw_kick = 0.0;

    // --- 1. Steering ---
    // Negative wheel angle turns left (counter-clockwise heading increase),
    // so a right steer command maps to a negative target.
    let shaped = steer.signum() * steer.abs().powf(t.steer_curve.max(0.01));
    let authority = 1.0
        - (1.0 - t.steer_speed_floor.clamp(0.0, 1.0)) * (entry_speed / max_speed).clamp(0.0, 1.0);
    let mut target = -shaped * t.max_wheel_angle * authority;

    if t.counter_steer && car.slip.abs() > COUNTER_STEER_SLIP {
        target -= car.slip.signum() * (car.slip.abs() - COUNTER_STEER_SLIP) * t.counter_steer_gain;
    }
    if t.drift_assist && car.slip.abs() > DRIFT_ASSIST_SLIP {
        target -= car.slip.signum() * (car.slip.abs() - DRIFT_ASSIST_SLIP) * t.drift_assist_gain;
    }
    target = target.clamp(-t.max_wheel_angle, t.max_wheel_angle);

    let rate = if target.abs() > car.wheel_angle.abs() {
        t.steer_rate_in
    } else {
        t.steer_rate_out
    };
    car.wheel_angle += (target - car.wheel_angle).clamp(-rate.abs(), rate.abs());

    // --- 2. Weight transfer ---
    let drive_force = throttle * t.engine_force;
    let (brake_decel_force, reverse_force) = if brake > 0.0 {
        if forward_speed > REST_SPEED {
            (brake * t.brake_force, 0.0)
        } else {
            (0.0, brake * t.reverse_force)
        }
    } else {
        (0.0, 0.0)
    };
    let handbrake_decel_force = handbrake * t.handbrake_force;

    let commanded = drive_force - reverse_force - brake_decel_force - handbrake_decel_force;
    let shift = t.weight_transfer * commanded / (mass * t.gravity.max(0.1));
    car.weight_front = (t.front_weight_static.clamp(0.2, 0.8) - shift).clamp(0.2, 0.8);
    car.weight_rear = 1.0 - car.weight_front;

    // Grip capacities use the previous tick's grip estimate; the fresh
    // values are not known until stage 6.
    let front_cap = car.grip_front * t.traction_scale.max(0.0);
    let rear_cap = car.grip_rear * t.traction_scale.max(0.0);

    // --- 3. Drivetrain ---
    let front_bias = t.drive_bias.clamp(0.0, 1.0);
    let thrust = (drive_force - reverse_force) / mass;
    let front_thrust = (thrust * front_bias).abs();
    let rear_thrust = (thrust * (1.0 - front_bias)).abs();

    // Rear wheels spinning up past grip torque the tail toward the steered
    // direction; front wheelspin just washes out steering authority.
    let rear_excess = (rear_thrust - rear_cap).max(0.0);
    let front_excess = (front_thrust - front_cap).max(0.0);
    if rear_excess > 0.0 && car.wheel_angle.abs() > 0.5 {
        yaw_kick += rear_excess * t.wheelspin_oversteer * car.wheel_angle.signum();
    }
    let steer_effect = if front_excess > 0.0 {
        front_cap / (front_cap + front_excess)
    } else {
        1.0
    };

    car.vel += forward * thrust;

    // --- 4. Braking ---
    if brake_decel_force > 0.0 {
        let decel = brake_decel_force / mass;
        let bias = t.brake_bias.clamp(0.0, 1.0);
        let mut front_decel = decel * bias;
        let mut rear_decel = decel * (1.0 - bias);
        if t.abs {
            front_decel = front_decel.min(front_cap);
            rear_decel = rear_decel.min(rear_cap);
        } else {
            let lockup = (rear_decel - rear_cap).max(0.0);
            if lockup > 0.0 && car.wheel_angle.abs() > 0.5 {
                yaw_kick += lockup * t.lockup_factor * car.wheel_angle.signum();
            }
        }
        let speed = car.vel.length();
        let total = (front_decel + rear_decel).min(speed);
        car.vel -= car.vel.normalize_or_zero() * total;
    }
    if handbrake_decel_force > 0.0 {
        let speed = car.vel.length();
        let decel = (handbrake_decel_force / mass).min(speed);
        car.vel -= car.vel.normalize_or_zero() * decel;
    }

    // --- 5. Integration ---
    car.pos += car.vel;
    let surface = if off_road {
        t.offroad_friction
    } else {
        t.rolling_friction
    };
    car.vel *= (1.0 - t.drag.clamp(0.0, 1.0)) * (1.0 - surface.clamp(0.0, 1.0));

    let speed = car.vel.length();

    // --- 6. Slip & grip ---
    if speed < REST_SPEED {
        // Near rest the slip pipeline divides by speed-like quantities;
        // decay everything toward neutral instead.
        car.angular_vel *= 0.5;
        car.heading = wrap_angle(car.heading + car.angular_vel);
        car.slip *= 0.5;
        car.slip_front *= 0.5;
        car.slip_rear *= 0.5;
        car.grip_front += (1.0 - car.grip_front) * 0.2;
        car.grip_rear += (1.0 - car.grip_rear) * 0.2;
        car.drift *= 0.5;
        car.speed = speed;
        return;
    }

    let vel_angle = car.vel.y.atan2(car.vel.x).to_degrees();
    let mut slip = wrap_angle(car.heading - vel_angle);
    if car.vel.dot(forward) < 0.0 {
        // Reverse travel: measure slip against the rear-facing direction,
        // otherwise backing up straight reads as 180 degrees of slide.
        slip = wrap_angle(slip + 180.0);
    }
    car.slip = slip;
    car.slip_front = wrap_angle(car.slip + car.wheel_angle * 0.5);
    car.slip_rear = car.slip;

    if handbrake > 0.0 {
        // The handbrake drags the rear axle into a deep slide.
        let dir = if car.slip.abs() > 1.0 {
            car.slip.signum()
        } else if car.wheel_angle.abs() > 0.5 {
            car.wheel_angle.signum()
        } else {
            1.0
        };
        let slide_target = dir * t.handbrake_slip_angle;
        car.slip_rear += (slide_target - car.slip_rear) * 0.5 * handbrake;
    }

    let bias_front = t.traction_bias.clamp(0.0, 1.0);
    let off = if off_road {
        t.offroad_grip.clamp(0.0, 1.0)
    } else {
        1.0
    };
    let mult = t.grip_multiplier.max(0.0);
    car.grip_front =
        (slip_curve(car.slip_front, t) * bias_front * car.weight_front * mult * off).clamp(0.0, 1.0);
    car.grip_rear = (slip_curve(car.slip_rear, t) * (1.0 - bias_front) * car.weight_rear * mult
        * off)
        .clamp(0.0, 1.0);
    if handbrake > 0.0 {
        car.grip_rear *= 1.0 - (1.0 - t.handbrake_grip.clamp(0.0, 1.0)) * handbrake;
    }

    // --- 7. Angular integration ---
    // Reversing flips the steering torque, so backing up turns the tail the
    // way the wheels point.
    let travel_dir = if car.vel.dot(forward) < 0.0 { -1.0 } else { 1.0 };
    let torque =
        car.wheel_angle * steer_effect * (speed / max_speed) * t.steer_torque * travel_dir;
    let ang_accel = torque / (mass * t.inertia.max(0.01));
    car.angular_vel += ang_accel + yaw_kick;
    car.angular_vel *= t.angular_damping.clamp(0.0, 1.0);
    let max_ang = t.max_angular_velocity.abs();
    car.angular_vel = car.angular_vel.clamp(-max_ang, max_ang);
    car.heading = wrap_angle(car.heading + car.angular_vel);

    // --- 8. Velocity realignment ---
    // The single mechanism behind both grip and drift: rotate the velocity
    // toward the heading by slip * average grip. High grip snaps the car
    // into line; low grip leaves it sliding.
    let avg_grip = 0.5 * (car.grip_front + car.grip_rear);
    car.vel = rotate_deg(car.vel, car.slip * avg_grip);

    car.drift = (car.slip.abs() / 90.0 * (1.0 - avg_grip) * (speed / max_speed)).clamp(0.0, 1.0);

    // --- 9. Speed cap ---
    let mut speed = car.vel.length();
    if speed > max_speed {
        car.vel *= max_speed / speed;
        speed = max_speed;
    }
    let max_reverse = t.max_reverse_speed.clamp(0.0, max_speed);
    if car.vel.dot(heading_vec(car.heading)) < 0.0 && speed > max_reverse {
        car.vel *= max_reverse / speed;
        speed = max_reverse;
    }
    car.speed = speed;
}
