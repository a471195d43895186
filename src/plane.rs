//! RLEW plane codec for the 128x128 level grids.

use crate::binary::Cursor;
use crate::error::Result;

pub const MAP_SIZE: usize = 128;
pub const PLANE_CELLS: usize = MAP_SIZE * MAP_SIZE;

/// One decoded 128x128 grid of 16-bit cell codes, indexed `[y][x]`.
#[derive(Clone, PartialEq, Eq)]
pub struct Plane {
    cells: Box<[[u16; MAP_SIZE]; MAP_SIZE]>,
}

impl Plane {
    pub fn empty() -> Self {
        Self { cells: Box::new([[0; MAP_SIZE]; MAP_SIZE]) }
    }

    pub fn from_fn(mut f: impl FnMut(usize, usize) -> u16) -> Self {
        let mut plane = Self::empty();
        for y in 0..MAP_SIZE {
            for x in 0..MAP_SIZE {
                plane.cells[y][x] = f(x, y);
            }
        }
        plane
    }

    pub fn get(&self, x: usize, y: usize) -> u16 {
        self.cells[y][x]
    }

    pub fn set(&mut self, x: usize, y: usize, value: u16) {
        self.cells[y][x] = value;
    }

    /// Bounds-checked lookup for signed coordinates.
    pub fn checked(&self, x: i32, y: i32) -> Option<u16> {
        if in_bounds(x, y) {
            Some(self.cells[y as usize][x as usize])
        } else {
            None
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u16; MAP_SIZE]> {
        self.cells.iter()
    }

    /// Row-major cell values.
    pub fn values(&self) -> impl Iterator<Item = u16> + '_ {
        self.cells.iter().flat_map(|row| row.iter().copied())
    }

    /// Flat little-endian dump, the same layout as `u16[128][128]`.
    pub fn to_le_bytes(&self) -> Vec<u8> {
        self.values().flat_map(u16::to_le_bytes).collect()
    }
}

impl std::fmt::Debug for Plane {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let nonzero = self.values().filter(|&v| v != 0).count();
        write!(f, "Plane({} non-zero cells)", nonzero)
    }
}

pub fn in_bounds(x: i32, y: i32) -> bool {
    (0..MAP_SIZE as i32).contains(&x) && (0..MAP_SIZE as i32).contains(&y)
}

/// Decode one RLEW-compressed plane.
///
/// Words equal to `escape` start a run: `escape, count, value`. Runs may
/// overshoot the grid; the excess is dropped.
pub fn decode_plane(stream: &[u8], escape: u16) -> Result<Plane> {
    let mut plane = Plane::empty();
    let mut cursor = Cursor::new(stream);
    let mut written = 0usize;

    while written < PLANE_CELLS {
        let word = cursor.u16()?;
        if word == escape {
            let count = cursor.u16()? as usize;
            let value = cursor.u16()?;
            let to_emit = count.min(PLANE_CELLS - written);
            for i in written..written + to_emit {
                plane.cells[i / MAP_SIZE][i % MAP_SIZE] = value;
            }
            written += to_emit;
        } else {
            plane.cells[written / MAP_SIZE][written % MAP_SIZE] = word;
            written += 1;
        }
    }

    Ok(plane)
}

/// RLEW-compress a plane. Runs of three or more equal cells, and any cell
/// equal to `escape`, are written as `escape, count, value`.
pub fn compress_plane(plane: &Plane, escape: u16) -> Vec<u8> {
    let values: Vec<u16> = plane.values().collect();
    let mut out = Vec::with_capacity(PLANE_CELLS);
    let mut i = 0;

    while i < values.len() {
        let value = values[i];
        let mut run = 1;
        while i + run < values.len() && values[i + run] == value && run < u16::MAX as usize {
            run += 1;
        }

        if run >= 3 || value == escape {
            for word in [escape, run as u16, value] {
                out.extend_from_slice(&word.to_le_bytes());
            }
            i += run;
        } else {
            out.extend_from_slice(&value.to_le_bytes());
            i += 1;
        }
    }

    out
}
