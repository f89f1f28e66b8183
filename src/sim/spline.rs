//! Geometry utilities
//!
//! Closed-curve Catmull-Rom interpolation (dense centerline from sparse
//! author-placed nodes) and point-to-segment distance for boundary tests.

use glam::Vec2;

/// Catmull-Rom interpolation between `p1` and `p2` for `t` in [0, 1].
pub fn catmull_rom(p0: Vec2, p1: Vec2, p2: Vec2, p3: Vec2, t: f32) -> Vec2 {
    let t2 = t * t;
    let t3 = t2 * t;
    0.5 * (2.0 * p1
        + (p2 - p0) * t
        + (2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3) * t2
        + (3.0 * p1 - 3.0 * p2 + p3 - p0) * t3)
}

/// Densify a closed ring of control nodes into `nodes.len() * samples_per`
/// interpolated points. The ring wraps: the segment after the last node
/// returns to the first.
pub fn sample_closed(nodes: &[Vec2], samples_per: usize) -> Vec<Vec2> {
    assert!(nodes.len() >= 3, "closed spline needs at least 3 control nodes");
    assert!(samples_per >= 1);
    let n = nodes.len();
    let mut out = Vec::with_capacity(n * samples_per);
    for i in 0..n {
        let p0 = nodes[(i + n - 1) % n];
        let p1 = nodes[i];
        let p2 = nodes[(i + 1) % n];
        let p3 = nodes[(i + 2) % n];
        for s in 0..samples_per {
            let t = s as f32 / samples_per as f32;
            out.push(catmull_rom(p0, p1, p2, p3, t));
        }
    }
    out
}

/// Closest point on segment `ab` to `p`.
pub fn closest_point_on_segment(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq < 1e-6 {
        return a;
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}

/// Perpendicular (clamped) distance from `p` to segment `ab`.
#[inline]
pub fn point_segment_distance(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    (p - closest_point_on_segment(p, a, b)).length()
}
