use tracing::debug;

use crate::level::Level;
use crate::plane::{in_bounds, MAP_SIZE};

use super::tiles::{door_textures, Axis, DoorTextures, TileKind, TileMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoorLock {
    Unlocked,
    Gold,
    Silver,
    Iron,
    Oscuro,
}

impl DoorLock {
    fn from_index(index: u16) -> DoorLock {
        match index {
            1 => DoorLock::Gold,
            2 => DoorLock::Silver,
            3 => DoorLock::Iron,
            4 => DoorLock::Oscuro,
            _ => DoorLock::Unlocked,
        }
    }

    pub fn key_name(&self) -> &'static str {
        match self {
            DoorLock::Gold => "Gold",
            DoorLock::Silver => "Silver",
            DoorLock::Iron => "Iron",
            DoorLock::Oscuro => "Oscuro",
            DoorLock::Unlocked => "(no key)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Door {
    pub lock: DoorLock,
    pub axis: Axis,
    /// Cells in claim order; the first one started the scan.
    pub cells: Vec<(usize, usize)>,
    pub textures: Option<DoorTextures>,
}

struct Claims([[bool; MAP_SIZE]; MAP_SIZE]);

impl Claims {
    fn is_free_door(&self, tiles: &TileMap, x: i32, y: i32) -> bool {
        in_bounds(x, y)
            && tiles.get(x as usize, y as usize) == TileKind::Door
            && !self.0[y as usize][x as usize]
    }

    fn claim(&mut self, x: usize, y: usize) {
        self.0[y][x] = true;
    }
}

fn door_lock(level: &Level, x: usize, y: usize) -> DoorLock {
    let actor = level.actor.get(x, y);
    if (0x1d..=0x20).contains(&actor) {
        return DoorLock::from_index(actor - 0x1c);
    }
    match level.structural.get(x, y) {
        code @ 94..=97 => DoorLock::from_index(code - 93),
        _ => DoorLock::Unlocked,
    }
}

/// Groups door cells into doors. The first neighbouring door cell found,
/// checking north and south before west and east, fixes the door's axis.
pub fn extract_doors(level: &Level, tiles: &TileMap) -> Vec<Door> {
    let mut claims = Box::new(Claims([[false; MAP_SIZE]; MAP_SIZE]));
    let mut doors = Vec::new();

    for y in 0..MAP_SIZE {
        for x in 0..MAP_SIZE {
            if !claims.is_free_door(tiles, x as i32, y as i32) {
                continue;
            }
            claims.claim(x, y);
            let mut cells = vec![(x, y)];

            let (xi, yi) = (x as i32, y as i32);
            let axis = if claims.is_free_door(tiles, xi, yi - 1) || claims.is_free_door(tiles, xi, yi + 1) {
                Some((Axis::NorthSouth, [(0, -1), (0, 1)]))
            } else if claims.is_free_door(tiles, xi - 1, yi) || claims.is_free_door(tiles, xi + 1, yi) {
                Some((Axis::EastWest, [(-1, 0), (1, 0)]))
            } else {
                None
            };

            let axis = match axis {
                Some((axis, steps)) => {
                    for (dx, dy) in steps {
                        let (mut cx, mut cy) = (xi + dx, yi + dy);
                        while claims.is_free_door(tiles, cx, cy) {
                            claims.claim(cx as usize, cy as usize);
                            cells.push((cx as usize, cy as usize));
                            cx += dx;
                            cy += dy;
                        }
                    }
                    axis
                }
                None => tiles.neighbour_axis(x, y),
            };

            let door = Door {
                lock: door_lock(level, x, y),
                axis,
                textures: door_textures(level.structural.get(x, y)),
                cells,
            };
            debug!(x, y, tiles = door.cells.len(), lock = door.lock.key_name(), "found door");
            doors.push(door);
        }
    }

    doors
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plane::Plane;
    use std::collections::HashSet;

    fn doors_for(cells: &[(usize, usize, u16)], actor: &[(usize, usize, u16)]) -> Vec<Door> {
        let mut structural = Plane::empty();
        for &(x, y, code) in cells {
            structural.set(x, y, code);
        }
        let mut actor_plane = Plane::empty();
        for &(x, y, code) in actor {
            actor_plane.set(x, y, code);
        }
        let level = Level::new(0, "doors", structural, actor_plane, Plane::empty());
        let tiles = TileMap::new(&level);
        extract_doors(&level, &tiles)
    }

    #[test]
    fn vertical_run_is_one_door() {
        let doors = doors_for(&[(5, 5, 90), (5, 6, 90), (5, 7, 90)], &[]);
        assert_eq!(doors.len(), 1);
        assert_eq!(doors[0].axis, Axis::NorthSouth);
        assert_eq!(doors[0].cells, vec![(5, 5), (5, 6), (5, 7)]);
        assert_eq!(doors[0].textures.unwrap().base, "RAMDOOR1");
    }

    #[test]
    fn horizontal_run_is_one_door() {
        let doors = doors_for(&[(5, 5, 33), (6, 5, 33)], &[]);
        assert_eq!(doors.len(), 1);
        assert_eq!(doors[0].axis, Axis::EastWest);
    }

    #[test]
    fn l_shape_splits_off_axis_cell() {
        // (5,5) (5,6) vertical, (6,6) sticks out to the east
        let doors = doors_for(&[(5, 5, 90), (5, 6, 90), (6, 6, 90)], &[]);
        assert_eq!(doors.len(), 2);
        assert_eq!(doors[0].cells, vec![(5, 5), (5, 6)]);
        assert_eq!(doors[1].cells, vec![(6, 6)]);

        let mut seen = HashSet::new();
        for door in &doors {
            for cell in &door.cells {
                assert!(seen.insert(*cell), "cell {:?} claimed twice", cell);
            }
        }
    }

    #[test]
    fn single_door_uses_neighbouring_walls() {
        let doors = doors_for(&[(4, 5, 1), (5, 5, 92), (6, 5, 1)], &[]);
        assert_eq!(doors.len(), 1);
        assert_eq!(doors[0].axis, Axis::EastWest);
    }

    #[test]
    fn metadata_row_is_never_a_door() {
        let doors = doors_for(&[(2, 0, 90), (2, 1, 90), (6, 0, 90)], &[]);
        let cells: Vec<Vec<(usize, usize)>> = doors.iter().map(|d| d.cells.clone()).collect();
        assert_eq!(cells, vec![vec![(6, 0)], vec![(2, 1)]]);
    }

    #[test]
    fn dense_field_claims_each_cell_once() {
        let codes = [0, 1, 33, 90, 90, 94, 154, 0x1d];
        let mut seed = 0x2545_f491u32;
        let mut structural = Plane::empty();
        for y in 1..MAP_SIZE {
            for x in 0..MAP_SIZE {
                seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                structural.set(x, y, codes[(seed >> 24) as usize % codes.len()]);
            }
        }
        let level = Level::new(0, "dense", structural, Plane::empty(), Plane::empty());
        let tiles = TileMap::new(&level);
        let doors = extract_doors(&level, &tiles);

        let mut seen = HashSet::new();
        for door in &doors {
            for &cell in &door.cells {
                assert!(seen.insert(cell), "cell {:?} claimed twice", cell);
            }
            let (x0, y0) = door.cells[0];
            if door.cells.len() > 1 {
                match door.axis {
                    Axis::NorthSouth => assert!(door.cells.iter().all(|&(x, _)| x == x0)),
                    Axis::EastWest => assert!(door.cells.iter().all(|&(_, y)| y == y0)),
                }
            }
        }
        let door_cells = (0..MAP_SIZE)
            .flat_map(|y| (0..MAP_SIZE).map(move |x| (x, y)))
            .filter(|&(x, y)| tiles.get(x, y) == TileKind::Door)
            .count();
        assert_eq!(seen.len(), door_cells);
    }

    #[test]
    fn locks_prefer_actor_keys() {
        let doors = doors_for(&[(5, 5, 94), (20, 20, 95), (30, 30, 90)], &[(20, 20, 0x1f)]);
        let locks: Vec<DoorLock> = doors.iter().map(|d| d.lock).collect();
        assert_eq!(locks, vec![DoorLock::Gold, DoorLock::Iron, DoorLock::Unlocked]);
    }
}
