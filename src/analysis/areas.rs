use crate::level::Level;
use crate::plane::MAP_SIZE;

use super::tiles::AREA_TILE_MIN;

/// Area id per cell, `None` where the structural code is below the area range.
pub struct AreaMap {
    ids: Box<[[Option<u16>; MAP_SIZE]; MAP_SIZE]>,
}

impl AreaMap {
    pub fn get(&self, x: usize, y: usize) -> Option<u16> {
        self.ids[y][x]
    }

    /// Number of cells tagged with `id`.
    pub fn cell_count(&self, id: u16) -> usize {
        self.ids.iter().flatten().filter(|&&v| v == Some(id)).count()
    }

    /// Distinct ids in ascending order.
    pub fn ids(&self) -> Vec<u16> {
        let mut ids: Vec<u16> = self.ids.iter().flatten().filter_map(|v| *v).collect();
        ids.sort_unstable();
        ids.dedup();
        ids
    }
}

pub fn extract_areas(level: &Level) -> AreaMap {
    let mut ids = Box::new([[None; MAP_SIZE]; MAP_SIZE]);
    for (y, row) in level.structural.rows().enumerate() {
        for (x, &code) in row.iter().enumerate() {
            if code >= AREA_TILE_MIN {
                ids[y][x] = Some(code - AREA_TILE_MIN);
            }
        }
    }
    AreaMap { ids }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plane::Plane;

    #[test]
    fn area_counts_match_tagged_cells() {
        let structural = Plane::from_fn(|x, y| match (x + y * 3) % 7 {
            0 => 107,
            1 => 110,
            2 => 5,
            3 => 300,
            _ => 0,
        });
        let tagged = structural.values().filter(|&v| v >= 107).count();
        let level = Level::new(0, "areas", structural, Plane::empty(), Plane::empty());
        let areas = extract_areas(&level);

        let ids = areas.ids();
        assert_eq!(ids, vec![0, 3, 193]);
        let total: usize = ids.iter().map(|&id| areas.cell_count(id)).sum();
        assert_eq!(total, tagged);
    }

    #[test]
    fn metadata_row_is_tagged_too() {
        let mut structural = Plane::empty();
        structural.set(0, 0, 180);
        let level = Level::new(0, "areas", structural, Plane::empty(), Plane::empty());
        assert_eq!(extract_areas(&level).get(0, 0), Some(73));
        assert_eq!(extract_areas(&level).get(1, 0), None);
    }
}
