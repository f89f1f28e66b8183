//! Descending-pass generator
//!
//! Alternating straight descents and multi-hairpin S-sequences down a
//! mountain road. Every emitted heading is clamped to a cone around the
//! downhill center angle, so forward progress is never reversed; hairpin
//! directions flip within a sequence, guaranteeing the S shape.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::track::PathTrack;
use crate::consts::{GEN_AHEAD, MAX_SEGMENTS_PER_FRAME, SEGMENT_LENGTH};
use crate::{heading_vec, wrap_angle};

/// Downhill center angle: due south.
pub const DOWNHILL_CENTER: f32 = -90.0;
/// Emitted headings stay within this cone around the center.
pub const HEADING_CONE: f32 = 65.0;

/// Per-segment angular noise during a descent (degrees).
const DESCENT_NOISE: f32 = 4.0;
/// Pull of the heading back toward the downhill center per segment.
const CENTER_PULL: f32 = 0.08;
/// Per-segment turn at full hairpin hold (degrees).
const HAIRPIN_TURN: f32 = 22.0;
const EASE_SEGMENTS: u32 = 3;
const HOLD_SEGMENTS: u32 = 4;

/// Progress through one hairpin, counting segments left in each stage.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum HairpinStage {
    EaseIn(u32),
    Hold(u32),
    EaseOut(u32),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum DescentPhase {
    Descent { remaining: u32 },
    Hairpins { remaining: u32, direction: f32, stage: HairpinStage },
}

/// State machine extending one descending-pass track.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DescentGen {
    phase: DescentPhase,
    heading: f32,
    rng: Pcg32,
}

impl DescentGen {
    pub fn new(seed: u64) -> Self {
        let mut rng = Pcg32::seed_from_u64(seed);
        let remaining = rng.random_range(18..=32);
        Self {
            phase: DescentPhase::Descent { remaining },
            heading: DOWNHILL_CENTER,
            rng,
        }
    }

    pub fn phase(&self) -> DescentPhase {
        self.phase
    }

    /// Extend the frontier down the pass while the car is close and moving;
    /// trim retired points, which accumulates the distance score counter.
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

    fn clamp_heading(&mut self) {
        self.heading = wrap_angle(self.heading)
            .clamp(DOWNHILL_CENTER - HEADING_CONE, DOWNHILL_CENTER + HEADING_CONE);
    }

    /// Advance the state machine by one emitted segment.
    fn step(&mut self) {
        self.phase = match self.phase {
            DescentPhase::Descent { remaining } => {
                // Mostly straight: small angular noise pulled back toward
                // the downhill center.
                self.heading += self.rng.random_range(-DESCENT_NOISE..DESCENT_NOISE);
                self.heading += (DOWNHILL_CENTER - self.heading) * CENTER_PULL;
                self.clamp_heading();
                if remaining > 1 {
                    DescentPhase::Descent {
                        remaining: remaining - 1,
                    }
                } else {
                    let planned = self.rng.random_range(2..=5);
                    let direction = if self.rng.random_bool(0.5) { 1.0 } else { -1.0 };
                    log::debug!("descent hands off to {planned} hairpins");
                    DescentPhase::Hairpins {
                        remaining: planned,
                        direction,
                        stage: HairpinStage::EaseIn(EASE_SEGMENTS),
                    }
                }
            }
            DescentPhase::Hairpins {
                remaining,
                direction,
                stage,
            } => {
                let (turn_frac, next_stage) = match stage {
                    HairpinStage::EaseIn(n) => {
                        let frac = (EASE_SEGMENTS - n + 1) as f32 / EASE_SEGMENTS as f32;
                        let next = if n > 1 {
                            HairpinStage::EaseIn(n - 1)
                        } else {
                            HairpinStage::Hold(HOLD_SEGMENTS)
                        };
                        (frac, Some(next))
                    }
                    HairpinStage::Hold(n) => {
                        let next = if n > 1 {
                            HairpinStage::Hold(n - 1)
                        } else {
                            HairpinStage::EaseOut(EASE_SEGMENTS)
                        };
                        (1.0, Some(next))
                    }
                    HairpinStage::EaseOut(n) => {
                        let frac = n as f32 / (EASE_SEGMENTS + 1) as f32;
                        let next = if n > 1 { Some(HairpinStage::EaseOut(n - 1)) } else { None };
                        (frac, next)
                    }
                };

                self.heading += direction * HAIRPIN_TURN * turn_frac;
                self.clamp_heading();

                match next_stage {
                    Some(stage) => DescentPhase::Hairpins {
                        remaining,
                        direction,
                        stage,
                    },
                    // Hairpin done: flip for the S shape or return to the
                    // descent once the planned count is exhausted.
                    None if remaining > 1 => DescentPhase::Hairpins {
                        remaining: remaining - 1,
                        direction: -direction,
                        stage: HairpinStage::EaseIn(EASE_SEGMENTS),
                    },
                    None => DescentPhase::Descent {
                        remaining: self.rng.random_range(18..=32),
                    },
                }
            }
        };
    }
}
