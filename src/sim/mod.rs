//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must stay pure and
//! deterministic:
//! - Fixed timestep only
//! - Seeded RNG only (stateless coordinate hash for the city lattice)
//! - No rendering or platform dependencies
//!
//! Per frame, data flows one way: input snapshot + tuning -> vehicle
//! dynamics -> boundary oracle -> active generator. The off-road verdict
//! feeds back into the next tick's friction term.

pub mod boundary;
pub mod car;
pub mod city;
pub mod corridor;
pub mod descent;
pub mod spline;
pub mod state;
pub mod tick;
pub mod track;

pub use boundary::{CurveProbe, CurveTracker, GridProbe, probe_grid};
pub use car::{advance, slip_curve};
pub use city::{CityWorld, EdgeKind, Rect, Tile, cell_of};
pub use corridor::{CorridorGen, CorridorPhase};
pub use descent::{DOWNHILL_CENTER, DescentGen, DescentPhase};
pub use spline::{catmull_rom, sample_closed};
pub use state::{CarPose, CarState, TickInput};
pub use tick::Simulation;
pub use track::{LapTarget, LoopTrack, PathTrack, Track, TrackDescriptor, TrackKind};
