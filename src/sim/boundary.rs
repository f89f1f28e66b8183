//! Track boundary oracle
//!
//! Curve-following tracks (loop, corridor, descending pass) keep a
//! last-validated index into the centerline and search a small window of
//! segments around it each tick, falling back to an exhaustive scan only
//! when the car has left the window entirely. Open-grid tracks test
//! road-rectangle membership in the car's current tile.

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::city::CityWorld;
use super::spline::point_segment_distance;

/// Segments searched ahead of the last validated index.
const SEARCH_AHEAD: usize = 8;
/// Segments searched behind it.
const SEARCH_BEHIND: usize = 2;
/// Windowed result farther than this many half-widths triggers the
/// exhaustive fallback scan.
const FALLBACK_FACTOR: f32 = 4.0;

/// Result of a curve boundary probe.
#[derive(Debug, Clone, Copy)]
pub struct CurveProbe {
    /// Nearest segment index after this probe.
    pub index: usize,
    /// Perpendicular distance to that segment.
    pub distance: f32,
    /// Distance exceeded half the track width.
    pub off_road: bool,
    /// Signed, wrap-aware index movement since the previous probe
    /// (meaningful for closed rings; lap logic integrates it).
    pub delta: i64,
}

/// Windowed nearest-segment tracker for one curve-following track.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CurveTracker {
    index: usize,
}

impl CurveTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Account for `removed` points trimmed from the head of the sequence.
    pub fn on_trimmed(&mut self, removed: usize) {
        self.index = self.index.saturating_sub(removed);
    }

    /// Probe a closed ring of `n` points (`n` segments, wrapping).
    pub fn probe_loop(&mut self, ring: &[Vec2], pos: Vec2, half_width: f32) -> CurveProbe {
        let n = ring.len();
        assert!(n >= 3, "loop geometry must not be empty");
        let seg = |i: usize| (ring[i % n], ring[(i + 1) % n]);

        let start = self.index as i64 - SEARCH_BEHIND as i64;
        let end = self.index as i64 + SEARCH_AHEAD as i64;
        let mut best = (self.index, f32::MAX);
        for raw in start..=end {
            let i = raw.rem_euclid(n as i64) as usize;
            let (a, b) = seg(i);
            let d = point_segment_distance(pos, a, b);
            if d < best.1 {
                best = (i, d);
            }
        }

        if best.1 > half_width * FALLBACK_FACTOR {
            // Far outside the window: pay for one full scan.
            for i in 0..n {
                let (a, b) = seg(i);
                let d = point_segment_distance(pos, a, b);
                if d < best.1 {
                    best = (i, d);
                }
            }
        }

        let half_n = (n / 2) as i64;
        let mut delta = best.0 as i64 - self.index as i64;
        if delta > half_n {
            delta -= n as i64;
        } else if delta < -half_n {
            delta += n as i64;
        }

        self.index = best.0;
        CurveProbe {
            index: best.0,
            distance: best.1,
            off_road: best.1 > half_width,
            delta,
        }
    }

    /// Probe an open polyline (`points.len() - 1` segments, no wrap).
    pub fn probe_path(&mut self, points: &VecDeque<Vec2>, pos: Vec2, half_width: f32) -> CurveProbe {
        let n = points.len();
        assert!(n >= 2, "path geometry must not be empty");
        let last_seg = n - 2;

        let start = self.index.saturating_sub(SEARCH_BEHIND);
        let end = (self.index + SEARCH_AHEAD).min(last_seg);
        let mut best = (self.index.min(last_seg), f32::MAX);
        for i in start..=end {
            let d = point_segment_distance(pos, points[i], points[i + 1]);
            if d < best.1 {
                best = (i, d);
            }
        }

        if best.1 > half_width * FALLBACK_FACTOR {
            for i in 0..=last_seg {
                let d = point_segment_distance(pos, points[i], points[i + 1]);
                if d < best.1 {
                    best = (i, d);
                }
            }
        }

        let delta = best.0 as i64 - self.index as i64;
        self.index = best.0;
        CurveProbe {
            index: best.0,
            distance: best.1,
            off_road: best.1 > half_width,
            delta,
        }
    }
}

/// Result of an open-grid boundary probe.
#[derive(Debug, Clone, Copy)]
pub struct GridProbe {
    pub off_road: bool,
    /// Nearest point on any road rectangle of the current tile, for the
    /// corrective push. `None` when no tile is loaded at the car's cell.
    pub push_target: Option<Vec2>,
}

/// Test road membership at `pos`. A missing tile counts as off-road.
pub fn probe_grid(world: &CityWorld, pos: Vec2) -> GridProbe {
    if world.on_road(pos) {
        GridProbe {
            off_road: false,
            push_target: None,
        }
    } else {
        GridProbe {
            off_road: true,
            push_target: world.nearest_road_point(pos),
        }
    }
}
