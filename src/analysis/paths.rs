//! Moving wall, pushwall and GAD path tracing.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::{ConvertError, Result};
use crate::level::Level;
use crate::plane::{in_bounds, MAP_SIZE};

use super::tiles::{TileKind, TileMap};

/// Actor codes 72..=79 are direction arrows, one per compass heading.
pub const ARROW_BASE: u16 = 72;

pub const STATIC_GAD: u16 = 0x1cd;
pub const ELEVATING_GAD: u16 = 0x1ce;
pub const MOVING_GADS: std::ops::RangeInclusive<u16> = 0x1cf..=0x1d2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    East,
    Northeast,
    North,
    Northwest,
    West,
    Southwest,
    South,
    Southeast,
}

impl Direction {
    pub fn from_arrow(code: u16) -> Option<Direction> {
        use Direction::*;
        let dir = match code.checked_sub(ARROW_BASE)? {
            0 => East,
            1 => Northeast,
            2 => North,
            3 => Northwest,
            4 => West,
            5 => Southwest,
            6 => South,
            7 => Southeast,
            _ => return None,
        };
        Some(dir)
    }

    /// Grid step; north is towards row 0.
    pub fn delta(self) -> (i32, i32) {
        use Direction::*;
        match self {
            East => (1, 0),
            Northeast => (1, -1),
            North => (0, -1),
            Northwest => (-1, -1),
            West => (-1, 0),
            Southwest => (-1, 1),
            South => (0, 1),
            Southeast => (1, 1),
        }
    }

    fn is_cardinal(self) -> bool {
        matches!(self, Direction::East | Direction::North | Direction::West | Direction::South)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoverKind {
    Pushwall,
    Movewall,
    TurboMovewall,
    Gad,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mover {
    pub kind: MoverKind,
    pub direction: Direction,
    /// Tiles per game tick, as the engine counts it.
    pub speed: u32,
}

/// Start direction and speed for an actor code that sets something moving.
pub fn mover_for_code(code: u16) -> Option<Mover> {
    use Direction::*;
    let (kind, direction, speed) = match code {
        72..=79 => (MoverKind::Pushwall, Direction::from_arrow(code)?, 2),
        300 => (MoverKind::Movewall, East, 2),
        318 => (MoverKind::Movewall, North, 2),
        336 => (MoverKind::Movewall, West, 2),
        354 => (MoverKind::Movewall, South, 2),
        256 => (MoverKind::TurboMovewall, East, 4),
        257 => (MoverKind::TurboMovewall, North, 4),
        258 => (MoverKind::TurboMovewall, West, 4),
        259 => (MoverKind::TurboMovewall, South, 4),
        0x1cf => (MoverKind::Gad, East, 2),
        0x1d0 => (MoverKind::Gad, North, 2),
        0x1d1 => (MoverKind::Gad, West, 2),
        0x1d2 => (MoverKind::Gad, South, 2),
        _ => return None,
    };
    Some(Mover { kind, direction, speed })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathKind {
    Unknown,
    /// Loops forever; the last waypoint links back into the path.
    Perpetual,
    /// Stops after its final waypoint.
    Terminal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Waypoint {
    pub x: usize,
    pub y: usize,
    /// Heading when leaving this cell.
    pub direction: Direction,
    /// Index of the following waypoint in [`WallPath::waypoints`].
    pub next: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WallPath {
    pub start_x: usize,
    pub start_y: usize,
    pub kind: PathKind,
    pub mover: Option<Mover>,
    pub waypoints: Vec<Waypoint>,
    /// Touchplate that sets the wall off, packed in the info plane as `x << 8 | y`.
    pub trigger: Option<(usize, usize)>,
}

impl WallPath {
    fn unknown(x: usize, y: usize) -> WallPath {
        WallPath { start_x: x, start_y: y, kind: PathKind::Unknown, mover: None, waypoints: Vec::new(), trigger: None }
    }

    /// Waypoint the perpetual loop returns to.
    pub fn loop_start(&self) -> Option<&Waypoint> {
        if self.kind != PathKind::Perpetual {
            return None;
        }
        let next = self.waypoints.last()?.next?;
        self.waypoints.get(next)
    }

    fn push(&mut self, x: usize, y: usize, direction: Direction) -> usize {
        let index = self.waypoints.len();
        if let Some(last) = self.waypoints.last_mut() {
            last.next = Some(index);
        }
        self.waypoints.push(Waypoint { x, y, direction, next: None });
        index
    }
}

/// Walk the path of whatever starts moving at (x, y).
pub fn trace_wall_path(level: &Level, x: usize, y: usize) -> Result<WallPath> {
    let mut path = WallPath::unknown(x, y);
    let mover = match mover_for_code(level.actor.get(x, y)) {
        Some(mover) => mover,
        None => return Ok(path),
    };
    path.mover = Some(mover);

    let info = level.info.get(x, y);
    if info > 0 && mover.kind != MoverKind::Gad {
        path.trigger = Some(((info >> 8) as usize, (info & 0xff) as usize));
    }

    let mut direction = mover.direction;
    let mut visited = HashMap::new();
    visited.insert((x, y), path.push(x, y, direction));

    let (mut cx, mut cy) = (x as i32, y as i32);
    loop {
        let (dx, dy) = direction.delta();
        cx += dx;
        cy += dy;
        if !in_bounds(cx, cy) {
            return Err(ConvertError::UnboundedPath { start_x: x, start_y: y, x: cx, y: cy });
        }
        let cell = (cx as usize, cy as usize);

        if mover.kind == MoverKind::Pushwall {
            path.push(cell.0, cell.1, direction);
            path.kind = PathKind::Terminal;
            return Ok(path);
        }

        if let Some(&earlier) = visited.get(&cell) {
            if let Some(last) = path.waypoints.last_mut() {
                last.next = Some(earlier);
            }
            path.kind = PathKind::Perpetual;
            return Ok(path);
        }

        if let Some(turn) = Direction::from_arrow(level.actor.get(cell.0, cell.1)).filter(|d| d.is_cardinal()) {
            direction = turn;
        }
        visited.insert(cell, path.push(cell.0, cell.1, direction));
    }
}

fn starts_path(level: &Level, tiles: &TileMap, x: usize, y: usize) -> bool {
    let actor = level.actor.get(x, y);
    if MOVING_GADS.contains(&actor) {
        return true;
    }
    matches!(tiles.get(x, y), TileKind::Wall | TileKind::Animated(_)) && mover_for_code(actor).is_some()
}

/// Trace every moving wall and GAD in the level. A path that leaves the
/// map aborts path extraction for the level.
pub fn extract_wall_paths(level: &Level, tiles: &TileMap) -> Result<Vec<WallPath>> {
    let mut paths = Vec::new();
    for y in 0..MAP_SIZE {
        for x in 0..MAP_SIZE {
            if !starts_path(level, tiles, x, y) {
                continue;
            }
            let path = trace_wall_path(level, x, y).map_err(|err| {
                warn!(level = %level.name, "{}", err);
                err
            })?;
            debug!(x, y, kind = ?path.kind, waypoints = path.waypoints.len(), "traced wall path");
            paths.push(path);
        }
    }
    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plane::Plane;

    fn level(walls: &[(usize, usize, u16)], actors: &[(usize, usize, u16)]) -> Level {
        let mut structural = Plane::empty();
        for &(x, y, code) in walls {
            structural.set(x, y, code);
        }
        let mut actor = Plane::empty();
        for &(x, y, code) in actors {
            actor.set(x, y, code);
        }
        Level::new(0, "paths", structural, actor, Plane::empty())
    }

    #[test]
    fn two_cell_cycle_is_perpetual() {
        let level = level(&[(10, 10, 1)], &[(10, 10, 300), (11, 10, 76)]);
        let path = trace_wall_path(&level, 10, 10).unwrap();
        assert_eq!(path.kind, PathKind::Perpetual);
        assert_eq!(path.waypoints.len(), 2);
        assert_eq!((path.waypoints[1].x, path.waypoints[1].y), (11, 10));
        assert_eq!(path.waypoints[1].direction, Direction::West);
        assert_eq!(path.waypoints[1].next, Some(0));
        let start = path.loop_start().unwrap();
        assert_eq!((start.x, start.y), (10, 10));
    }

    #[test]
    fn square_loop_links_to_start() {
        let level = level(
            &[(20, 20, 1)],
            &[(20, 20, 300), (22, 20, 78), (22, 22, 76), (20, 22, 74)],
        );
        let path = trace_wall_path(&level, 20, 20).unwrap();
        assert_eq!(path.kind, PathKind::Perpetual);
        assert_eq!(path.waypoints.len(), 8);
        assert_eq!(path.waypoints.last().unwrap().next, Some(0));
    }

    #[test]
    fn walk_off_the_map_is_an_error() {
        let level = level(&[(125, 3, 1)], &[(125, 3, 256)]);
        match trace_wall_path(&level, 125, 3) {
            Err(ConvertError::UnboundedPath { start_x, x, .. }) => {
                assert_eq!(start_x, 125);
                assert_eq!(x, 128);
            }
            other => panic!("expected unbounded path, got {:?}", other),
        }
    }

    #[test]
    fn pushwall_moves_one_tile() {
        let level = level(&[(5, 5, 1)], &[(5, 5, 74)]);
        let path = trace_wall_path(&level, 5, 5).unwrap();
        assert_eq!(path.kind, PathKind::Terminal);
        assert_eq!(path.waypoints.len(), 2);
        assert_eq!((path.waypoints[1].x, path.waypoints[1].y), (5, 4));
        assert_eq!(path.waypoints[1].next, None);
    }

    #[test]
    fn unrecognized_code_is_unknown() {
        let level = level(&[(5, 5, 1)], &[(5, 5, 12)]);
        let path = trace_wall_path(&level, 5, 5).unwrap();
        assert_eq!(path.kind, PathKind::Unknown);
        assert!(path.waypoints.is_empty());
    }

    #[test]
    fn diagonal_arrows_do_not_turn() {
        let level = level(&[(10, 10, 1)], &[(10, 10, 318), (10, 8, 73), (10, 5, 78)]);
        let path = trace_wall_path(&level, 10, 10).unwrap();
        assert_eq!(path.kind, PathKind::Perpetual);
        // north to row 5, then back south into its own trail
        assert_eq!(path.waypoints.len(), 6);
        assert_eq!(path.loop_start().map(|w| w.y), Some(6));
    }

    #[test]
    fn extraction_finds_walls_and_gads() {
        let level = level(
            &[(10, 10, 1), (30, 30, 1)],
            &[(10, 10, 300), (11, 10, 76), (40, 40, 0x1d0), (40, 38, 78), (30, 30, 20)],
        );
        let tiles = TileMap::new(&level);
        let paths = extract_wall_paths(&level, &tiles).unwrap();
        assert_eq!(paths.len(), 2);
        assert!(paths.iter().all(|p| p.kind == PathKind::Perpetual));
        assert_eq!(paths[1].mover.unwrap().kind, MoverKind::Gad);
    }
}
