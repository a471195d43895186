//! Derived structure recovered from a level's raw planes.

pub mod actors;
pub mod areas;
pub mod doors;
pub mod html;
pub mod paths;
pub mod tiles;

use tracing::{info, warn};

use crate::error::Result;
use crate::level::Level;

pub use actors::{classify_actor, extract_actors, extract_hazards, ActorRecord, Difficulty, EnemyCategory, Hazard, TargetGame};
pub use areas::{extract_areas, AreaMap};
pub use doors::{extract_doors, Door, DoorLock};
pub use html::{html_dump, write_html_dump};
pub use paths::{extract_wall_paths, trace_wall_path, PathKind, WallPath};
pub use tiles::{Axis, TileKind, TileMap};

/// Everything the map converter needs besides the level itself.
pub struct AnalyzedLevel {
    pub tiles: TileMap,
    pub areas: AreaMap,
    pub doors: Vec<Door>,
    /// Failure here only loses the wall paths; the rest of the analysis
    /// stands.
    pub paths: Result<Vec<WallPath>>,
    pub actors: Vec<ActorRecord>,
}

pub fn analyze(level: &Level) -> AnalyzedLevel {
    let tiles = TileMap::new(level);
    let areas = extract_areas(level);
    let doors = extract_doors(level, &tiles);
    let paths = extract_wall_paths(level, &tiles);
    let actors = extract_actors(level);

    match &paths {
        Ok(paths) => info!(
            level = %level.name,
            doors = doors.len(),
            paths = paths.len(),
            actors = actors.len(),
            "analyzed level"
        ),
        Err(err) => warn!(
            level = %level.name,
            doors = doors.len(),
            actors = actors.len(),
            "analyzed level without wall paths: {}",
            err
        ),
    }
    AnalyzedLevel { tiles, areas, doors, paths, actors }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConvertError;
    use crate::plane::Plane;

    #[test]
    fn runaway_mover_keeps_doors_and_actors() {
        let mut structural = Plane::empty();
        let mut actor = Plane::empty();
        structural.set(125, 3, 1);
        actor.set(125, 3, 256);
        structural.set(20, 20, 90);
        actor.set(40, 40, 108);
        let level = Level::new(0, "runaway", structural, actor, Plane::empty());

        let analyzed = analyze(&level);
        assert!(matches!(analyzed.paths, Err(ConvertError::UnboundedPath { start_x: 125, start_y: 3, .. })));
        assert_eq!(analyzed.doors.len(), 1);
        assert_eq!(analyzed.actors.len(), 1);
    }
}
