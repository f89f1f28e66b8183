//! Grid-city generator
//!
//! Constraint-propagating tile placement over an unbounded integer lattice.
//! Every tile is chosen by a stateless seeded hash of its grid coordinate,
//! so tiles evicted outside the load radius regenerate bit-for-bit when the
//! car returns. The origin tile is always the 4-way crossroads and is the
//! guaranteed spawn point.

use std::collections::HashMap;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::{LOAD_RADIUS, TILE_SIZE};

/// Edge label for one side of a tile. Adjacent tiles must agree on their
/// shared edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EdgeKind {
    Road,
    Building,
}

/// Edge indices: north, east, south, west.
pub const N: usize = 0;
pub const E: usize = 1;
pub const S: usize = 2;
pub const W: usize = 3;

fn opposite(dir: usize) -> usize {
    (dir + 2) % 4
}

/// Axis-aligned rectangle in tile-local space.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min: Vec2::new(min_x, min_y),
            max: Vec2::new(max_x, max_y),
        }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Closest point of the rectangle to `p` (identity when inside).
    pub fn clamp_point(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min, self.max)
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }
}

/// A placed tile: archetype id, edge labels, road rectangles and building
/// footprints in tile-local space. Generated once, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tile {
    pub archetype: u8,
    pub edges: [EdgeKind; 4],
    pub roads: Vec<Rect>,
    pub buildings: Vec<Rect>,
}

impl Tile {
    pub fn contains_road(&self, local: Vec2) -> bool {
        self.roads.iter().any(|r| r.contains(local))
    }

    pub fn nearest_road_point(&self, local: Vec2) -> Option<Vec2> {
        self.roads
            .iter()
            .map(|r| r.clamp_point(local))
            .min_by(|a, b| {
                (*a - local)
                    .length_squared()
                    .total_cmp(&(*b - local).length_squared())
            })
    }
}

/// Deterministic per-cell hash: coordinate-weighted XOR fold passed through
/// a sine hash, yielding [0, 1).
///
/// World reproducibility across tile eviction and reload depends on this
/// exact formula staying bit-stable; do not swap in a different PRNG.
pub fn cell_hash(x: i32, y: i32, seed: u32, salt: u32) -> f32 {
    let folded = (x as i64).wrapping_mul(374_761_393)
        ^ (y as i64).wrapping_mul(668_265_263)
        ^ ((seed as i64) << 1)
        ^ (salt as i64).wrapping_mul(974_634_361);
    let t = ((folded % 1_000_003) as f64 * 0.618_033_988).sin() * 43_758.545_3;
    (t - t.floor()) as f32
}

const ROAD_MIN: f32 = TILE_SIZE * 0.5 - 64.0;
const ROAD_MAX: f32 = TILE_SIZE * 0.5 + 64.0;
const CROSSROADS: u8 = 0;
const ARCHETYPE_COUNT: u8 = 16;

fn ns_full() -> Rect {
    Rect::new(ROAD_MIN, 0.0, ROAD_MAX, TILE_SIZE)
}
fn ew_full() -> Rect {
    Rect::new(0.0, ROAD_MIN, TILE_SIZE, ROAD_MAX)
}
fn n_stub() -> Rect {
    Rect::new(ROAD_MIN, ROAD_MIN, ROAD_MAX, TILE_SIZE)
}
fn e_stub() -> Rect {
    Rect::new(ROAD_MIN, ROAD_MIN, TILE_SIZE, ROAD_MAX)
}
fn s_stub() -> Rect {
    Rect::new(ROAD_MIN, 0.0, ROAD_MAX, ROAD_MAX)
}
fn w_stub() -> Rect {
    Rect::new(0.0, ROAD_MIN, ROAD_MAX, ROAD_MAX)
}

/// The fixed 16-archetype catalog. Edge labels cover every combination of
/// road/building per side, so any neighbor constraint set has at least one
/// candidate.
fn catalog_entry(id: u8) -> ([EdgeKind; 4], Vec<Rect>) {
    use EdgeKind::{Building as B, Road as R};
    match id {
        // Crossroads: the spawn tile
        0 => ([R, R, R, R], vec![ns_full(), ew_full()]),
        // T-junctions (named by the missing arm)
        1 => ([B, R, R, R], vec![ew_full(), s_stub()]),
        2 => ([R, B, R, R], vec![ns_full(), w_stub()]),
        3 => ([R, R, B, R], vec![ew_full(), n_stub()]),
        4 => ([R, R, R, B], vec![ns_full(), e_stub()]),
        // Straights
        5 => ([R, B, R, B], vec![ns_full()]),
        6 => ([B, R, B, R], vec![ew_full()]),
        // Corners
        7 => ([R, R, B, B], vec![n_stub(), e_stub()]),
        8 => ([B, R, R, B], vec![e_stub(), s_stub()]),
        9 => ([B, B, R, R], vec![s_stub(), w_stub()]),
        10 => ([R, B, B, R], vec![w_stub(), n_stub()]),
        // Dead ends
        11 => ([R, B, B, B], vec![n_stub()]),
        12 => ([B, R, B, B], vec![e_stub()]),
        13 => ([B, B, R, B], vec![s_stub()]),
        14 => ([B, B, B, R], vec![w_stub()]),
        // Solid block
        _ => ([B, B, B, B], vec![]),
    }
}

/// The open-grid world: a sparse map from cell coordinate to placed tile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityWorld {
    pub seed: u32,
    tiles: HashMap<(i32, i32), Tile>,
    last_cell: (i32, i32),
}

/// Grid cell containing a world position.
pub fn cell_of(pos: Vec2) -> (i32, i32) {
    (
        (pos.x / TILE_SIZE).floor() as i32,
        (pos.y / TILE_SIZE).floor() as i32,
    )
}

/// Tile-local coordinates of a world position within `cell`.
pub fn local_in_cell(pos: Vec2, cell: (i32, i32)) -> Vec2 {
    Vec2::new(
        pos.x - cell.0 as f32 * TILE_SIZE,
        pos.y - cell.1 as f32 * TILE_SIZE,
    )
}

impl CityWorld {
    pub fn new(seed: u32) -> Self {
        let mut world = Self {
            seed,
            tiles: HashMap::new(),
            last_cell: (0, 0),
        };
        world.ensure_loaded((0, 0));
        log::info!("city world seeded ({seed}), origin crossroads placed");
        world
    }

    /// Spawn point: the center of the origin crossroads.
    pub fn spawn_point(&self) -> Vec2 {
        Vec2::splat(TILE_SIZE * 0.5)
    }

    pub fn tile(&self, cell: (i32, i32)) -> Option<&Tile> {
        self.tiles.get(&cell)
    }

    pub fn loaded_count(&self) -> usize {
        self.tiles.len()
    }

    /// Per-frame maintenance: when the car crosses into a new cell, make
    /// sure every tile within the load radius exists and drop everything
    /// beyond radius + 1 (hysteresis margin).
    pub fn update(&mut self, car_pos: Vec2) {
        let cell = cell_of(car_pos);
        if cell == self.last_cell && !self.tiles.is_empty() {
            return;
        }
        self.last_cell = cell;
        self.ensure_loaded(cell);

        let keep = LOAD_RADIUS + 1;
        let before = self.tiles.len();
        self.tiles.retain(|&(tx, ty), _| {
            (tx - cell.0).abs() <= keep && (ty - cell.1).abs() <= keep
        });
        let dropped = before - self.tiles.len();
        if dropped > 0 {
            log::debug!("evicted {dropped} tiles beyond cell {cell:?}");
        }
    }

    fn ensure_loaded(&mut self, center: (i32, i32)) {
        for dy in -LOAD_RADIUS..=LOAD_RADIUS {
            for dx in -LOAD_RADIUS..=LOAD_RADIUS {
                let cell = (center.0 + dx, center.1 + dy);
                if !self.tiles.contains_key(&cell) {
                    let tile = self.generate_tile(cell);
                    self.tiles.insert(cell, tile);
                }
            }
        }
    }

    /// Label of one lattice edge, derived from the hash of the edge's
    /// canonical coordinate. Both tiles sharing an edge hash the same
    /// coordinate, so adjacent tiles agree by construction and a tile's
    /// constraints do not depend on which neighbors happen to be loaded.
    fn edge_label(&self, cell: (i32, i32), dir: usize) -> EdgeKind {
        let (x, y) = cell;
        // Horizontal boundaries key on (x, boundary_y); vertical ones on
        // (boundary_x, y), with distinct salts.
        let (kx, ky, salt) = match dir {
            N => (x, y + 1, 1),
            S => (x, y, 1),
            E => (x + 1, y, 2),
            _ => (x, y, 2),
        };
        // The spawn crossroads pins its four edges to road.
        let touches_origin = (cell == (0, 0))
            || (dir == N && cell == (0, -1))
            || (dir == S && cell == (0, 1))
            || (dir == E && cell == (-1, 0))
            || (dir == W && cell == (1, 0));
        if touches_origin {
            return EdgeKind::Road;
        }
        if cell_hash(kx, ky, self.seed, salt) < 0.62 {
            EdgeKind::Road
        } else {
            EdgeKind::Building
        }
    }

    /// Deterministically place the tile for `cell`: the four edge
    /// constraints (from placed neighbors where present, from the edge hash
    /// otherwise, which is always the same value) filter the catalog; the cell
    /// hash picks among the survivors.
    fn generate_tile(&self, cell: (i32, i32)) -> Tile {
        let (x, y) = cell;
        let archetype = if cell == (0, 0) {
            CROSSROADS
        } else {
            let mut required = [EdgeKind::Building; 4];
            let neighbors = [(x, y + 1), (x + 1, y), (x, y - 1), (x - 1, y)];
            for (dir, ncell) in neighbors.iter().enumerate() {
                required[dir] = match self.tiles.get(ncell) {
                    Some(n) => n.edges[opposite(dir)],
                    None => self.edge_label(cell, dir),
                };
            }

            let candidates: Vec<u8> = (0..ARCHETYPE_COUNT)
                .filter(|&id| {
                    let (edges, _) = catalog_entry(id);
                    (0..4).all(|d| edges[d] == required[d])
                })
                .collect();

            if candidates.is_empty() {
                // The catalog covers every edge combination, so this should
                // not occur; fall back to the crossroads rather than fail.
                log::warn!("no tile archetype fits constraints at {cell:?}, using crossroads");
                CROSSROADS
            } else {
                let roll = cell_hash(x, y, self.seed, 0);
                let idx = ((roll * candidates.len() as f32) as usize).min(candidates.len() - 1);
                candidates[idx]
            }
        };

        let (edges, roads) = catalog_entry(archetype);
        let buildings = self.place_buildings(cell, &roads);
        Tile {
            archetype,
            edges,
            roads,
            buildings,
        }
    }

    /// Derive building footprints from the cell hash, one candidate per
    /// corner quadrant, kept only where it does not overlap a road.
    fn place_buildings(&self, cell: (i32, i32), roads: &[Rect]) -> Vec<Rect> {
        let (x, y) = cell;
        let q = ROAD_MIN; // quadrant extent from each tile corner
        let quadrants = [
            Rect::new(0.0, 0.0, q, q),
            Rect::new(TILE_SIZE - q, 0.0, TILE_SIZE, q),
            Rect::new(0.0, TILE_SIZE - q, q, TILE_SIZE),
            Rect::new(TILE_SIZE - q, TILE_SIZE - q, TILE_SIZE, TILE_SIZE),
        ];

        let mut out = Vec::new();
        for (i, quad) in quadrants.iter().enumerate() {
            let salt = 16 + i as u32;
            if cell_hash(x, y, self.seed, salt) < 0.3 {
                continue; // vacant lot
            }
            let inset_x = 8.0 + cell_hash(x, y, self.seed, salt + 4) * 40.0;
            let inset_y = 8.0 + cell_hash(x, y, self.seed, salt + 8) * 40.0;
            let footprint = Rect::new(
                quad.min.x + inset_x,
                quad.min.y + inset_y,
                quad.max.x - inset_x,
                quad.max.y - inset_y,
            );
            if roads.iter().all(|r| !r.intersects(&footprint)) {
                out.push(footprint);
            }
        }
        out
    }

    /// Road membership at a world position. No loaded tile means off-road.
    pub fn on_road(&self, pos: Vec2) -> bool {
        let cell = cell_of(pos);
        match self.tiles.get(&cell) {
            Some(tile) => tile.contains_road(local_in_cell(pos, cell)),
            None => false,
        }
    }

    /// Nearest point of any road rectangle in the car's current tile, in
    /// world space. Used to synthesize the corrective push when off-road.
    pub fn nearest_road_point(&self, pos: Vec2) -> Option<Vec2> {
        let cell = cell_of(pos);
        let tile = self.tiles.get(&cell)?;
        let local = local_in_cell(pos, cell);
        let nearest = tile.nearest_road_point(local)?;
        Some(nearest + Vec2::new(cell.0 as f32 * TILE_SIZE, cell.1 as f32 * TILE_SIZE))
    }
}
