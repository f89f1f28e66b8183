//! Infinite-corridor generator
//!
//! Patterned straight / hairpin / chicane sequencing with anti-loop bias:
//! hairpin directions alternate, a hairpin's total turn is capped at 90
//! degrees by construction, and curvature decays back to zero on straights
//! so the corridor never winds over itself.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::track::PathTrack;
use crate::consts::{GEN_AHEAD, MAX_SEGMENTS_PER_FRAME, SEGMENT_LENGTH};
use crate::{heading_vec, wrap_angle};

/// Curvature easing per segment on straights and gentle turns.
const EASE_STRAIGHT: f32 = 0.8;
/// Faster easing while winding into or out of a hairpin.
const EASE_HAIRPIN: f32 = 2.5;
/// Segments spent holding a hairpin.
const HAIRPIN_SEGMENTS: u32 = 10;
/// Per-segment curvature of a gentle turn (degrees).
const GENTLE_CURVATURE: f32 = 3.5;

/// Corridor phase. The rotation is fixed:
/// straight -> hairpin -> straight -> gentle-turn sequence -> repeat;
/// `gentle_next` remembers which half of the rotation the straight is in.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum CorridorPhase {
    Straight { remaining: u32, gentle_next: bool },
    Hairpin { remaining: u32, direction: f32 },
    GentleTurns { remaining: u32, turns_left: u32, direction: f32 },
}

/// State machine extending one corridor track. Owned by and scoped to that
/// track instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorridorGen {
    phase: CorridorPhase,
    /// Heading the next segment is emitted along (degrees).
    heading: f32,
    /// Current per-segment curvature, eased toward `target_curvature`.
    curvature: f32,
    target_curvature: f32,
    /// 0.0 until the first hairpin has rolled its random direction.
    last_hairpin_dir: f32,
    rng: Pcg32,
}

impl CorridorGen {
    pub fn new(seed: u64, heading: f32) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let remaining = rng.random_range(14..=26);
        Self {
            phase: CorridorPhase::Straight {
                remaining,
                gentle_next: false,
            },
            heading: wrap_angle(heading),
            curvature: 0.0,
            target_curvature: 0.0,
            last_hairpin_dir: 0.0,
            rng,
        }
    }

    pub fn phase(&self) -> CorridorPhase {
        self.phase
    }

    /// Extend the frontier while the car is close and moving, bounded per
    /// frame, then trim retired points behind the car.
    pub fn update(&mut self, path: &mut PathTrack, car_pos: Vec2, moving: bool) {
        let mut produced = 0;
        while moving
            && produced < MAX_SEGMENTS_PER_FRAME
            && path.frontier().distance(car_pos) < GEN_AHEAD
        {
            let next = path.frontier() + heading_vec(self.heading) * SEGMENT_LENGTH;
            path.push(next);
            self.step();
            produced += 1;
        }
        path.trim_passed(car_pos);
    }

    /// Advance the state machine by one emitted segment.
    fn step(&mut self) {
        // Sharp curvature winds and unwinds at the hairpin rate, so the
        // post-hairpin straight sheds its residual turn quickly.
        let ease = if matches!(self.phase, CorridorPhase::Hairpin { .. })
            || self.curvature.abs() > GENTLE_CURVATURE
        {
            EASE_HAIRPIN
        } else {
            EASE_STRAIGHT
        };
        self.curvature += (self.target_curvature - self.curvature).clamp(-ease, ease);
        self.heading = wrap_angle(self.heading + self.curvature);

        self.phase = match self.phase {
            CorridorPhase::Straight {
                remaining,
                gentle_next,
            } => {
                if remaining > 1 {
                    CorridorPhase::Straight {
                        remaining: remaining - 1,
                        gentle_next,
                    }
                } else if gentle_next {
                    let direction = if self.rng.random_bool(0.5) { 1.0 } else { -1.0 };
                    self.target_curvature = direction * GENTLE_CURVATURE;
                    CorridorPhase::GentleTurns {
                        remaining: self.rng.random_range(4..=8),
                        turns_left: self.rng.random_range(2..=4),
                        direction,
                    }
                } else {
                    // Alternate from the previous hairpin; the first rolls
                    // its direction at random.
                    let direction = if self.last_hairpin_dir == 0.0 {
                        if self.rng.random_bool(0.5) { 1.0 } else { -1.0 }
                    } else {
                        -self.last_hairpin_dir
                    };
                    self.last_hairpin_dir = direction;
                    // Segment count times per-segment curvature caps the
                    // total turn at 90 degrees.
                    self.target_curvature = direction * (90.0 / HAIRPIN_SEGMENTS as f32);
                    log::debug!("corridor hairpin, direction {direction}");
                    CorridorPhase::Hairpin {
                        remaining: HAIRPIN_SEGMENTS,
                        direction,
                    }
                }
            }
            CorridorPhase::Hairpin {
                remaining,
                direction,
            } => {
                if remaining > 1 {
                    CorridorPhase::Hairpin {
                        remaining: remaining - 1,
                        direction,
                    }
                } else {
                    self.target_curvature = 0.0;
                    CorridorPhase::Straight {
                        remaining: self.rng.random_range(14..=26),
                        gentle_next: true,
                    }
                }
            }
            CorridorPhase::GentleTurns {
                remaining,
                turns_left,
                direction,
            } => {
                if remaining > 1 {
                    CorridorPhase::GentleTurns {
                        remaining: remaining - 1,
                        turns_left,
                        direction,
                    }
                } else if turns_left > 1 {
                    // Chicane: alternate within the sequence
                    let direction = -direction;
                    self.target_curvature = direction * GENTLE_CURVATURE;
                    CorridorPhase::GentleTurns {
                        remaining: self.rng.random_range(4..=8),
                        turns_left: turns_left - 1,
                        direction,
                    }
                } else {
                    self.target_curvature = 0.0;
                    CorridorPhase::Straight {
                        remaining: self.rng.random_range(14..=26),
                        gentle_next: false,
                    }
                }
            }
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Drive the state machine for `segments` steps, recording the
    /// direction of every hairpin entered.
    fn hairpin_directions(seed: u64, segments: usize) -> Vec<f32> {
        let mut generator = CorridorGen::new(seed, 0.0);
        let mut dirs = Vec::new();
        let mut in_hairpin = false;
        for _ in 0..segments {
            generator.step();
            match generator.phase {
                CorridorPhase::Hairpin { direction, .. } => {
                    if !in_hairpin {
                        dirs.push(direction);
                        in_hairpin = true;
                    }
                }
                _ => in_hairpin = false,
            }
        }
        dirs
    }

    #[test]
    fn test_hairpin_directions_alternate() {
        for seed in [1, 7, 99, 12345] {
            let dirs = hairpin_directions(seed, 2000);
            assert!(dirs.len() >= 4, "seed {seed} produced {} hairpins", dirs.len());
            for pair in dirs.windows(2) {
                assert_eq!(pair[0], -pair[1], "seed {seed}: {dirs:?}");
            }
        }
    }

    #[test]
    fn test_hairpin_turn_capped_at_90_degrees() {
        let mut generator = CorridorGen::new(4242, 0.0);
        let mut entry_heading = None;
        for _ in 0..2000 {
            let before = generator.heading;
            generator.step();
            match (entry_heading, matches!(generator.phase, CorridorPhase::Hairpin { .. })) {
                (None, true) => entry_heading = Some(before),
                (Some(start), false) => {
                    let turned = crate::wrap_angle(generator.heading - start).abs();
                    assert!(turned <= 90.0 + 1e-3, "hairpin turned {turned}");
                    entry_heading = None;
                }
                _ => {}
            }
        }
    }

    #[test]
    fn test_curvature_decays_on_straights() {
        let mut generator = CorridorGen::new(3, 0.0);
        let mut straight_run = 0;
        for _ in 0..3000 {
            generator.step();
            if matches!(generator.phase, CorridorPhase::Straight { .. }) {
                straight_run += 1;
                if straight_run > 10 {
                    assert!(
                        generator.curvature.abs() < 1e-3,
                        "curvature {} after {} straight segments",
                        generator.curvature,
                        straight_run
                    );
                }
            } else {
                straight_run = 0;
            }
        }
    }

    #[test]
    fn test_generation_respects_per_frame_cap() {
        let mut generator = CorridorGen::new(5, 0.0);
        let mut path = PathTrack::new(Vec2::ZERO, 0.0, 80.0, 2);
        // Car sits on the frontier: plenty of room to generate, but one
        // update may only produce the per-frame cap.
        let frontier = path.frontier();
        generator.update(&mut path, frontier, true);
        assert_eq!(path.points.len(), 2 + MAX_SEGMENTS_PER_FRAME as usize);
    }

    #[test]
    fn test_no_generation_when_parked() {
        let mut generator = CorridorGen::new(5, 0.0);
        let mut path = PathTrack::new(Vec2::ZERO, 0.0, 80.0, 2);
        let frontier = path.frontier();
        generator.update(&mut path, frontier, false);
        assert_eq!(path.points.len(), 2);
    }

    #[test]
    fn test_determinism_per_seed() {
        let a = hairpin_directions(77, 1500);
        let b = hairpin_directions(77, 1500);
        assert_eq!(a, b);
    }
}
