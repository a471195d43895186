//! Turns an analyzed level into a Quake map.
//!
//! Every tile is `64 * scale` units square. The floor slab is one tile
//! thick and walls rise from its top surface to the level's floor height.

use tracing::{debug, info, warn};

use crate::analysis::actors::{extract_hazards, Difficulty, Hazard, TargetGame};
use crate::analysis::doors::{Door, DoorLock};
use crate::analysis::tiles::{masked_flags, masked_wall, platform, tile_texture_name, Axis, MaskedWall, TileKind};
use crate::analysis::AnalyzedLevel;
use crate::level::{Heading, Level};
use crate::plane::MAP_SIZE;

use super::{Brush, Entity, Face, QuakeMap};

const BASE_CELL: f64 = 64.0;
const PLAYER_EYE_OFFSET: f64 = 32.0;
const THIN_HALF_WIDTH: f64 = 2.0;
const HARD_ONLY_SPAWNFLAG: u32 = 256;

#[derive(Debug, Clone)]
pub struct ConvertOptions {
    pub scale: f64,
    pub target: TargetGame,
    /// Mirror U on north and west faces.
    pub wrap: bool,
    /// Texture WADs listed in worldspawn.
    pub wads: Vec<String>,
}

impl Default for ConvertOptions {
    fn default() -> Self {
        ConvertOptions { scale: 1.0, target: TargetGame::Quake, wrap: false, wads: Vec::new() }
    }
}

/// World-space layout of the tile grid.
struct Grid {
    cell: f64,
    floor_depth: f64,
    /// Wall height in tiles.
    height: u32,
    scale: f64,
    wrap: bool,
}

impl Grid {
    fn x(&self, x: usize) -> f64 {
        x as f64 * self.cell
    }

    fn y(&self, y: usize) -> f64 {
        y as f64 * self.cell
    }

    /// Height of `tiles` tiles above the floor surface.
    fn z(&self, tiles: f64) -> f64 {
        self.floor_depth + tiles * self.cell
    }

    fn center(&self, x: usize, y: usize) -> (f64, f64) {
        (self.x(x) + self.cell / 2.0, self.y(y) + self.cell / 2.0)
    }

    /// Footprint of a thin slab through the middle of a cell, spanning
    /// `from..to` across it relative to the centre line.
    fn slab(&self, x: usize, y: usize, axis: Axis, from: f64, to: f64) -> ([f64; 2], [f64; 2]) {
        let (cx, cy) = self.center(x, y);
        match axis {
            Axis::NorthSouth => ([cx + from, self.y(y)], [cx + to, self.y(y + 1)]),
            Axis::EastWest => ([self.x(x), cy + from], [self.x(x + 1), cy + to]),
        }
    }

    fn cuboid(&self, min: [f64; 2], max: [f64; 2], z1: f64, z2: f64, texture: &str) -> Brush {
        Brush::cuboid([min[0], min[1], z1], [max[0], max[1], z2], texture, self.scale, self.wrap)
    }
}

fn spawn_angle(heading: Heading) -> f64 {
    match heading {
        Heading::North => 180.0,
        Heading::East => 90.0,
        Heading::South => 0.0,
        Heading::West => 270.0,
    }
}

/// Facing index order is east, north, west, south.
fn enemy_angle(facing: u16) -> f64 {
    match facing % 4 {
        0 => 90.0,
        1 => 180.0,
        2 => 270.0,
        _ => 0.0,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Piece {
    Above,
    Middle,
    Bottom,
}

fn masked_class(wall: &MaskedWall, piece: Piece) -> &'static str {
    use masked_flags::*;

    let passable = match piece {
        Piece::Above => ABOVE_PASSABLE,
        Piece::Middle => MIDDLE_PASSABLE,
        Piece::Bottom => BOTTOM_PASSABLE,
    };
    if wall.has(SHOOTABLE) && wall.has(BLOCKING_CHANGES) {
        "func_breakable"
    } else if wall.has(passable) {
        "func_illusionary"
    } else {
        "func_detail"
    }
}

/// Vertical extents, in tiles, of the pieces a thin wall info code draws.
fn thin_wall_spans(info: u16, height: f64) -> Vec<(f64, f64)> {
    match info {
        1 => vec![(0.0, height - 1.0)],
        4 => vec![(height - 1.0, height)],
        5 => vec![(0.0, 1.0)],
        6 => vec![(0.0, 1.0), (height - 1.0, height)],
        7 => vec![(1.0, height)],
        8 => vec![(1.0, height - 1.0)],
        9 => vec![(0.0, height - 1.0)],
        _ => Vec::new(),
    }
}

struct Converter<'a> {
    level: &'a Level,
    analyzed: &'a AnalyzedLevel,
    options: &'a ConvertOptions,
    grid: Grid,
    map: QuakeMap,
}

impl Converter<'_> {
    fn world(&mut self, brush: Brush) {
        self.map.worldspawn.brushes.push(brush);
    }

    fn entity(&mut self, entity: Entity) {
        self.map.entities.push(entity);
    }

    fn floor_and_ceiling(&mut self) {
        let side = MAP_SIZE as f64 * self.grid.cell;
        let floor = self.level.floor_texture().unwrap_or_default();
        let slab = self.grid.cuboid([0.0, 0.0], [side, side], 0.0, self.grid.floor_depth, &floor);
        self.world(slab);

        if let Some(ceiling) = self.level.ceiling_texture() {
            let h = self.grid.height as f64;
            let slab = self.grid.cuboid([0.0, 0.0], [side, side], self.grid.z(h), self.grid.z(h + 1.0), &ceiling);
            self.world(slab);
        }
    }

    fn column(&mut self, x: usize, y: usize, kind: TileKind) {
        let code = self.level.structural.get(x, y);
        let texture = tile_texture_name(kind, code).unwrap_or_default();
        let h = self.grid.height as f64;
        let brush = self.grid.cuboid(
            [self.grid.x(x), self.grid.y(y)],
            [self.grid.x(x + 1), self.grid.y(y + 1)],
            self.grid.z(0.0),
            self.grid.z(h),
            &texture,
        );

        let is_static =
            kind == TileKind::Wall && self.level.actor.get(x, y) == 0 && self.level.info.get(x, y) == 0;
        if is_static {
            self.world(brush);
        } else {
            self.entity(Entity::with_brush("func_wall", brush));
        }
    }

    fn thin_wall(&mut self, x: usize, y: usize, axis: Axis) {
        let code = self.level.structural.get(x, y);
        let texture = tile_texture_name(TileKind::ThinWall(axis), code).unwrap_or_default();
        let (min, max) = self.grid.slab(x, y, axis, -THIN_HALF_WIDTH, THIN_HALF_WIDTH);

        for (from, to) in thin_wall_spans(self.level.info.get(x, y), self.grid.height as f64) {
            if to <= from {
                continue;
            }
            let brush = self.grid.cuboid(min, max, self.grid.z(from), self.grid.z(to), &texture);
            self.world(brush);
        }
    }

    fn masked(&mut self, x: usize, y: usize) {
        let Some(wall) = masked_wall(self.level.structural.get(x, y)) else {
            return;
        };
        let axis = self.analyzed.tiles.neighbour_axis(x, y);
        let (min, max) = self.grid.slab(x, y, axis, 0.0, 1.0);
        let h = self.grid.height;
        let hf = h as f64;

        let pieces = [
            (Piece::Above, wall.above, h > 1, hf - 1.0, hf),
            (Piece::Middle, wall.middle, h > 2, 1.0, hf - 1.0),
            (Piece::Bottom, wall.bottom, true, 0.0, 1.0),
        ];
        for (piece, lump, fits, from, to) in pieces {
            if lump.is_empty() || !fits {
                continue;
            }
            let brush = self.grid.cuboid(min, max, self.grid.z(from), self.grid.z(to), &format!("{{{}", lump));
            self.entity(Entity::with_brush(masked_class(&wall, piece), brush));
        }
    }

    /// Platforms are drawn as solid blocks inset by one unit so they can
    /// be walked across.
    fn platform(&mut self, x: usize, y: usize) {
        let Some(wall) = platform(self.level.info.get(x, y)) else {
            return;
        };
        let min = [self.grid.x(x) + 1.0, self.grid.y(y) + 1.0];
        let max = [self.grid.x(x + 1) - 1.0, self.grid.y(y + 1) - 1.0];
        let h = self.grid.height;
        let hf = h as f64;

        if !wall.above.is_empty() && !wall.has(masked_flags::ABOVE_PASSABLE) && h > 1 {
            let brush = self.grid.cuboid(min, max, self.grid.z(hf - 1.0), self.grid.z(hf), &format!("{{{}", wall.above));
            self.entity(Entity::with_brush("func_detail", brush));
        }
        if !wall.middle.is_empty() && h > 2 {
            let brush = self.grid.cuboid(min, max, self.grid.z(1.0), self.grid.z(hf - 1.0), &format!("{{{}", wall.middle));
            self.world(brush);
        }
        if !wall.bottom.is_empty() && !wall.has(masked_flags::BOTTOM_PASSABLE) {
            let brush = self.grid.cuboid(
                min,
                max,
                self.grid.floor_depth + 1.0,
                self.grid.z(1.0),
                &format!("{{{}", wall.bottom),
            );
            self.entity(Entity::with_brush(masked_class(&wall, Piece::Bottom), brush));
        }
    }

    fn tiles(&mut self) {
        for y in 0..MAP_SIZE {
            for x in 0..MAP_SIZE {
                match self.analyzed.tiles.get(x, y) {
                    kind @ (TileKind::Wall | TileKind::Elevator | TileKind::Animated(_)) => self.column(x, y, kind),
                    TileKind::ThinWall(axis) => self.thin_wall(x, y, axis),
                    TileKind::Masked => self.masked(x, y),
                    TileKind::Platform => self.platform(x, y),
                    TileKind::Door | TileKind::Empty => {}
                }
            }
        }
    }

    /// One `func_door` per door, a thin slab over all its cells with the
    /// door face on the broad sides.
    fn door(&mut self, door: &Door) {
        let Some(&(first_x, first_y)) = door.cells.first() else {
            return;
        };
        let (lo_x, hi_x) = door.cells.iter().fold((first_x, first_x), |(lo, hi), &(x, _)| (lo.min(x), hi.max(x)));
        let (lo_y, hi_y) = door.cells.iter().fold((first_y, first_y), |(lo, hi), &(_, y)| (lo.min(y), hi.max(y)));

        let (min, max) = match door.axis {
            Axis::NorthSouth => {
                let (cx, _) = self.grid.center(lo_x, lo_y);
                ([cx - THIN_HALF_WIDTH, self.grid.y(lo_y)], [cx + THIN_HALF_WIDTH, self.grid.y(hi_y + 1)])
            }
            Axis::EastWest => {
                let (_, cy) = self.grid.center(lo_x, lo_y);
                ([self.grid.x(lo_x), cy - THIN_HALF_WIDTH], [self.grid.x(hi_x + 1), cy + THIN_HALF_WIDTH])
            }
        };

        let (base, side, above) = door.textures.map(|t| (t.base, t.side, t.above)).unwrap_or(("", "", ""));
        let axis = door.axis;
        let brush = Brush::cuboid_with(
            [min[0], min[1], self.grid.z(0.0)],
            [max[0], max[1], self.grid.z(1.0)],
            self.grid.scale,
            self.grid.wrap,
            |face| match (axis, face) {
                (Axis::NorthSouth, Face::West | Face::East) | (Axis::EastWest, Face::South | Face::North) => base,
                _ => side,
            },
        );

        let mut entity = Entity::with_brush("func_door", brush);
        entity.angle = -1.0;
        entity.spawnflags = match door.lock {
            DoorLock::Gold => 8,
            DoorLock::Silver => 16,
            DoorLock::Unlocked => 0,
            DoorLock::Iron | DoorLock::Oscuro => {
                debug!(x = first_x, y = first_y, key = door.lock.key_name(), "no matching key, door left unlocked");
                0
            }
        };
        self.entity(entity);

        let h = self.grid.height as f64;
        if h > 1.0 && !above.is_empty() {
            let lintel = self.grid.cuboid(min, max, self.grid.z(1.0), self.grid.z(h), above);
            self.world(lintel);
        }
    }

    fn enemies(&mut self) {
        for actor in &self.analyzed.actors {
            let Some(name) = actor.entity_name(self.options.target) else {
                debug!(x = actor.x, y = actor.y, enemy = actor.class.category.name(), "no entity for enemy");
                continue;
            };
            let (cx, cy) = self.grid.center(actor.x, actor.y);
            let mut entity = Entity::point(name, [cx, cy, self.grid.floor_depth + self.grid.cell / 2.0]);
            entity.angle = enemy_angle(actor.class.facing);
            if actor.class.difficulty == Difficulty::Hard {
                entity.spawnflags = HARD_ONLY_SPAWNFLAG;
            }
            self.map.entities.push(entity);
        }
    }

    /// Only Dusk has counterparts for these.
    fn hazards(&mut self) {
        if self.options.target != TargetGame::Dusk {
            return;
        }
        let cell = self.grid.cell;
        for (x, y, hazard) in extract_hazards(self.level) {
            let (cx, cy) = self.grid.center(x, y);
            let z = match hazard {
                Hazard::SpinningBlades => cell * 1.5,
                Hazard::Trampoline | Hazard::Flamethrower => cell,
            };
            let mut entity = Entity::point(hazard.dusk_entity(), [cx, cy, z]);
            match hazard {
                Hazard::Trampoline => {
                    let amount = (self.grid.height as f64 + 0.5).log10() * ((cell / BASE_CELL) / 2.0);
                    entity.set_key("amount", format!("{:.6}", amount));
                }
                Hazard::SpinningBlades => {
                    entity.set_key("damage", "10.0");
                    entity.set_key("frequency", "0.8");
                }
                Hazard::Flamethrower => {}
            }
            self.entity(entity);
        }
    }
}

pub fn convert_level(level: &Level, analyzed: &AnalyzedLevel, options: &ConvertOptions) -> QuakeMap {
    let height = level.floor_height().unwrap_or_else(|| {
        warn!(level = %level.name, code = level.height_code(), "unknown floor height, using one tile");
        1
    });
    let cell = BASE_CELL * options.scale;
    let grid = Grid { cell, floor_depth: cell, height, scale: options.scale, wrap: options.wrap };

    let (sx, sy) = grid.center(level.spawn.x, level.spawn.y);
    let mut map = QuakeMap::new([sx, sy, grid.floor_depth + PLAYER_EYE_OFFSET], spawn_angle(level.spawn.heading));
    map.wads = options.wads.clone();

    let mut converter = Converter { level, analyzed, options, grid, map };
    converter.floor_and_ceiling();
    converter.tiles();
    for door in &analyzed.doors {
        converter.door(door);
    }
    converter.enemies();
    converter.hazards();

    let map = converter.map;
    info!(
        level = %level.name,
        brushes = map.brush_count(),
        entities = map.entities.len(),
        "converted level"
    );
    map
}
