//! Track descriptors and live track geometry
//!
//! Three geometry kinds back the boundary oracle: a fixed interpolated ring
//! (closed loops), a live deque of centerline points with a generation
//! frontier and a trim frontier (corridor and descending-pass tracks), and
//! the sparse tile lattice (city worlds, in [`super::city`]).

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::boundary::CurveTracker;
use super::city::CityWorld;
use super::corridor::CorridorGen;
use super::descent::DescentGen;
use super::spline::sample_closed;
use crate::consts::{DASH_PERIOD, SEGMENT_LENGTH, TRIM_BEHIND};

/// Interpolated points per control segment when densifying a loop spline.
const LOOP_SAMPLES: usize = 8;
/// A live centerline never shrinks below this many points.
const MIN_PATH_POINTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackKind {
    Loop,
    Corridor,
    Descent,
    City,
}

/// Lap goal for loop tracks; generated tracks run endless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LapTarget {
    Laps(u32),
    Endless,
}

/// Authoring-time track input, immutable at simulation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackDescriptor {
    pub id: u32,
    pub name: String,
    pub kind: TrackKind,
    /// Author-placed control nodes (closed loops only).
    pub control_nodes: Vec<Vec2>,
    pub road_width: f32,
    pub lap_target: LapTarget,
}

/// A closed-loop track: the dense interpolated ring plus the control points
/// that produced it (kept for the editor, unused at simulation time).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopTrack {
    pub ring: Vec<Vec2>,
    pub control: Vec<Vec2>,
    pub width: f32,
    pub lap_target: LapTarget,
    tracker: CurveTracker,
    /// Accumulated ring progress in segments; a full ring is one lap.
    progress: f32,
    pub laps: u32,
}

impl LoopTrack {
    pub fn from_descriptor(desc: &TrackDescriptor) -> Self {
        let ring = sample_closed(&desc.control_nodes, LOOP_SAMPLES);
        log::info!(
            "loop track '{}': {} control nodes -> {} centerline points",
            desc.name,
            desc.control_nodes.len(),
            ring.len()
        );
        Self {
            ring,
            control: desc.control_nodes.clone(),
            width: desc.road_width,
            lap_target: desc.lap_target,
            tracker: CurveTracker::new(),
            progress: 0.0,
            laps: 0,
        }
    }

    /// Boundary probe plus lap bookkeeping. The nearest-segment search is
    /// approximate, so laps integrate wrap-aware index deltas rather than
    /// watching a single finish line.
    pub fn probe(&mut self, pos: Vec2) -> bool {
        let n = self.ring.len() as f32;
        let probe = self.tracker.probe_loop(&self.ring, pos, self.width * 0.5);
        self.progress += probe.delta as f32;
        if self.progress >= n {
            self.progress -= n;
            self.laps += 1;
            log::info!("lap {} complete", self.laps);
        }
        probe.off_road
    }

    pub fn finished(&self) -> bool {
        match self.lap_target {
            LapTarget::Laps(target) => self.laps >= target,
            LapTarget::Endless => false,
        }
    }
}

/// The live centerline of a corridor or descending-pass track: a deque with
/// a generation frontier at the back and a trim frontier at the front.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathTrack {
    pub points: VecDeque<Vec2>,
    pub width: f32,
    /// Phase offset of the dashed centerline marking, advanced on trim so
    /// the regrown marking does not visibly jump.
    pub dash_phase: f32,
    /// Length retired past the trim frontier: the distance score counter.
    pub distance: f32,
    pub(crate) tracker: CurveTracker,
}

impl PathTrack {
    pub fn new(start: Vec2, heading_deg: f32, width: f32, initial_points: usize) -> Self {
        let dir = crate::heading_vec(heading_deg);
        let points = (0..initial_points.max(2))
            .map(|i| start + dir * (i as f32 * SEGMENT_LENGTH))
            .collect();
        Self {
            points,
            width,
            dash_phase: 0.0,
            distance: 0.0,
            tracker: CurveTracker::new(),
        }
    }

    /// The generation frontier: the last (newest) centerline point.
    pub fn frontier(&self) -> Vec2 {
        *self
            .points
            .back()
            .expect("track geometry must not be empty")
    }

    pub fn push(&mut self, p: Vec2) {
        self.points.push_back(p);
    }

    /// Boundary probe against the live centerline.
    pub fn probe(&mut self, pos: Vec2) -> bool {
        self.tracker
            .probe_path(&self.points, pos, self.width * 0.5)
            .off_road
    }

    /// Drop points the car is sufficiently far past, keeping the validated
    /// window intact, advancing the dash phase and the distance counter.
    pub fn trim_passed(&mut self, car_pos: Vec2) {
        while self.points.len() > MIN_PATH_POINTS
            && self.tracker.index() > 2
            && self
                .points
                .front()
                .is_some_and(|p| p.distance(car_pos) > TRIM_BEHIND)
        {
            let removed = self.points.pop_front().expect("checked non-empty");
            let seg = self
                .points
                .front()
                .map_or(0.0, |next| (*next - removed).length());
            self.distance += seg;
            self.dash_phase = (self.dash_phase + seg) % DASH_PERIOD;
            self.tracker.on_trimmed(1);
        }
    }
}

/// Live track state: geometry plus (for generated kinds) the generator
/// owned by and scoped to this track instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Track {
    Loop(LoopTrack),
    Corridor {
        path: PathTrack,
        generator: CorridorGen,
    },
    Descent {
        path: PathTrack,
        generator: DescentGen,
    },
    City(CityWorld),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn octagon(radius: f32) -> Vec<Vec2> {
        (0..8)
            .map(|i| {
                let a = i as f32 / 8.0 * std::f32::consts::TAU;
                Vec2::new(a.cos(), a.sin()) * radius
            })
            .collect()
    }

    fn loop_descriptor() -> TrackDescriptor {
        TrackDescriptor {
            id: 1,
            name: "test ring".into(),
            kind: TrackKind::Loop,
            control_nodes: octagon(300.0),
            road_width: 60.0,
            lap_target: LapTarget::Laps(2),
        }
    }

    #[test]
    fn test_loop_lap_increments_once_per_circuit() {
        let mut track = LoopTrack::from_descriptor(&loop_descriptor());
        let ring = track.ring.clone();
        let n = ring.len();
        // Drive the segment midpoints so every probe lands on exactly one
        // nearest segment
        let mid = |i: usize| (ring[i] + ring[(i + 1) % n]) * 0.5;

        for i in 0..n {
            assert!(!track.probe(mid(i)), "centerline flagged off-road");
        }
        assert_eq!(track.laps, 0, "no lap before the seam is re-crossed");

        // Each further circuit crosses the seam exactly once
        for i in 0..n {
            track.probe(mid(i));
        }
        assert_eq!(track.laps, 1);
        for i in 0..n {
            track.probe(mid(i));
        }
        assert_eq!(track.laps, 2);
        assert!(track.finished());
    }

    #[test]
    fn test_loop_backwards_does_not_count_laps() {
        let mut track = LoopTrack::from_descriptor(&loop_descriptor());
        let ring = track.ring.clone();
        for _ in 0..3 {
            for p in ring.iter().rev() {
                track.probe(*p);
            }
        }
        assert_eq!(track.laps, 0);
    }

    #[test]
    fn test_path_trim_keeps_minimum_points() {
        let mut path = PathTrack::new(Vec2::ZERO, 0.0, 80.0, 40);
        // Probe far along, then trim against a car at the far end
        let far = Vec2::new(39.0 * SEGMENT_LENGTH, 0.0);
        path.probe(far);
        path.trim_passed(far);
        assert!(path.points.len() >= MIN_PATH_POINTS);
        assert!(path.distance > 0.0);
    }

    #[test]
    fn test_dash_phase_tracks_trimmed_length() {
        let mut path = PathTrack::new(Vec2::ZERO, 0.0, 80.0, 40);
        let far = Vec2::new(39.0 * SEGMENT_LENGTH, 0.0);
        path.probe(far);
        path.trim_passed(far);
        let expected = path.distance % DASH_PERIOD;
        assert!((path.dash_phase - expected).abs() < 1e-3);
    }
}
