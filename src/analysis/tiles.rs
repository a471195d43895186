//! Structural tile classification and the lookup tables keyed by tile code.

use crate::level::Level;
use crate::plane::MAP_SIZE;

/// First structural code that marks an area rather than a wall.
pub const AREA_TILE_MIN: u16 = 107;
pub const NUM_AREAS: u16 = 47;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Wall plane runs north to south, faces point east and west.
    NorthSouth,
    /// Wall plane runs east to west, faces point north and south.
    EastWest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileKind {
    Empty,
    Wall,
    ThinWall(Axis),
    Elevator,
    Animated(usize),
    Masked,
    Door,
    Platform,
}

/// Classification of every cell of one level's structural plane.
pub struct TileMap {
    kinds: Box<[[TileKind; MAP_SIZE]; MAP_SIZE]>,
}

impl TileMap {
    pub fn new(level: &Level) -> TileMap {
        let mut kinds = Box::new([[TileKind::Empty; MAP_SIZE]; MAP_SIZE]);
        for (y, row) in kinds.iter_mut().enumerate() {
            for (x, kind) in row.iter_mut().enumerate() {
                *kind = classify_tile(level.structural.get(x, y), level.info.get(x, y), x, y);
            }
        }

        let mut map = TileMap { kinds };
        for y in 0..MAP_SIZE {
            for x in 0..MAP_SIZE {
                if map.kinds[y][x] == TileKind::Wall && is_thin_info(level.info.get(x, y)) {
                    let axis = map.neighbour_axis(x, y);
                    map.kinds[y][x] = TileKind::ThinWall(axis);
                }
            }
        }
        map
    }

    pub fn get(&self, x: usize, y: usize) -> TileKind {
        self.kinds[y][x]
    }

    /// Orientation of a thin piece at (x, y), judged by what surrounds it.
    /// Regular walls weigh 2, masked walls 4, anything else solid 1.
    pub fn neighbour_axis(&self, x: usize, y: usize) -> Axis {
        let weight = |kind: TileKind| match kind {
            TileKind::Wall => 2,
            TileKind::Masked => 4,
            TileKind::Empty => 0,
            _ => 1,
        };

        let mut count_x = 0;
        let mut count_y = 0;
        if x > 0 {
            count_x += weight(self.kinds[y][x - 1]);
        }
        if x < MAP_SIZE - 1 {
            count_x += weight(self.kinds[y][x + 1]);
        }
        if y > 0 {
            count_y += weight(self.kinds[y - 1][x]);
        }
        if y < MAP_SIZE - 1 {
            count_y += weight(self.kinds[y + 1][x]);
        }

        if count_x > count_y {
            Axis::EastWest
        } else {
            Axis::NorthSouth
        }
    }
}

pub fn is_door_tile(code: u16) -> bool {
    matches!(code, 33..=35 | 90..=104 | 154..=156)
}

fn is_thin_info(info: u16) -> bool {
    matches!(info, 1 | 4..=9)
}

/// Classify a single structural cell. Thin walls are resolved afterwards
/// by [`TileMap::new`] since they depend on the neighbours.
pub fn classify_tile(code: u16, info: u16, x: usize, y: usize) -> TileKind {
    // the first four cells of row 0 hold level metadata
    if (y == 0 && x < 4) || code == 0 {
        return TileKind::Empty;
    }

    match code {
        _ if is_door_tile(code) => TileKind::Door,
        1..=32 | 36..=43 | 47..=71 => TileKind::Wall,
        72..=79 => TileKind::Elevator,
        44 => TileKind::Animated(0),
        45 => TileKind::Animated(3),
        106 | 107 => TileKind::Animated(code as usize - 105),
        224..=233 => TileKind::Animated(code as usize - 224 + 4),
        242..=244 => TileKind::Animated(code as usize - 242 + 14),
        _ if masked_wall(code).is_some() => TileKind::Masked,
        _ if (AREA_TILE_MIN..=AREA_TILE_MIN + NUM_AREAS).contains(&code) && is_thin_info(info) => {
            TileKind::Platform
        }
        1..=89 => TileKind::Wall,
        _ => TileKind::Empty,
    }
}

/// Target texture name for a solid wall code.
pub fn wall_texture_name(code: u16) -> Option<String> {
    let name = match code {
        1..=32 => format!("WALL{}", code),
        36..=45 => format!("WALL{}", code - 3),
        46 => "WALL73".to_string(),
        47 => "EXIT".to_string(),
        48 => "ENTRANCE".to_string(),
        49..=71 => format!("WALL{}", code - 8),
        72..=79 => format!("ELEV{}", code - 71),
        80..=89 => format!("WALL{}", code - 16),
        _ => return None,
    };
    Some(name)
}

/// Texture name for any drawable tile kind at a cell.
pub fn tile_texture_name(kind: TileKind, code: u16) -> Option<String> {
    match kind {
        TileKind::Wall | TileKind::ThinWall(_) | TileKind::Elevator => wall_texture_name(code),
        TileKind::Animated(id) => ANIMATED_WALLS.get(id).map(|anim| anim.texture_name()),
        TileKind::Door => door_textures(code).map(|d| d.base.to_string()),
        TileKind::Masked => masked_wall(code).map(|m| format!("{{{}", m.bottom)),
        TileKind::Empty | TileKind::Platform => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimatedWall {
    pub ticks: u32,
    pub frames: u32,
    pub lump: &'static str,
}

impl AnimatedWall {
    /// Quake animates textures named `+0name`, `+1name`, ...
    pub fn frame_name(&self, frame: u32) -> String {
        format!("+{}{}", frame, self.lump.to_lowercase())
    }

    pub fn texture_name(&self) -> String {
        self.frame_name(0)
    }
}

pub const ANIMATED_WALLS: [AnimatedWall; 17] = [
    AnimatedWall { ticks: 3, frames: 4, lump: "FPLACE" },
    AnimatedWall { ticks: 3, frames: 6, lump: "ANIMY" },
    AnimatedWall { ticks: 3, frames: 6, lump: "ANIMR" },
    AnimatedWall { ticks: 40, frames: 4, lump: "ANIMFAC" },
    AnimatedWall { ticks: 3, frames: 4, lump: "ANIMONE" },
    AnimatedWall { ticks: 3, frames: 4, lump: "ANIMTWO" },
    AnimatedWall { ticks: 3, frames: 4, lump: "ANIMTHR" },
    AnimatedWall { ticks: 3, frames: 4, lump: "ANIMFOR" },
    AnimatedWall { ticks: 3, frames: 6, lump: "ANIMGW" },
    AnimatedWall { ticks: 3, frames: 6, lump: "ANIMYOU" },
    AnimatedWall { ticks: 3, frames: 6, lump: "ANIMBW" },
    AnimatedWall { ticks: 3, frames: 6, lump: "ANIMBP" },
    AnimatedWall { ticks: 3, frames: 6, lump: "ANIMBP" },
    AnimatedWall { ticks: 3, frames: 6, lump: "ANIMFW" },
    AnimatedWall { ticks: 3, frames: 6, lump: "ANIMLAT" },
    AnimatedWall { ticks: 3, frames: 6, lump: "ANIMST" },
    AnimatedWall { ticks: 3, frames: 6, lump: "ANIMRP" },
];

/// Returns the animation and 1-based frame number for a lump like `ANIMY3`.
pub fn animated_frame(lump_name: &str) -> Option<(&'static AnimatedWall, u32)> {
    ANIMATED_WALLS.iter().find_map(|anim| {
        let frame: u32 = lump_name.strip_prefix(anim.lump)?.parse().ok()?;
        (1..=anim.frames).contains(&frame).then_some((anim, frame))
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoorTextures {
    pub base: &'static str,
    pub side: &'static str,
    pub above: &'static str,
}

const fn door(base: &'static str, side: &'static str, above: &'static str) -> Option<DoorTextures> {
    Some(DoorTextures { base, side, above })
}

pub fn door_textures(code: u16) -> Option<DoorTextures> {
    let id = match code {
        33..=35 => code - 33 + 15,
        90..=93 | 98..=104 => code - 90,
        94..=97 => code - 86,
        154..=156 => code - 154 + 18,
        _ => return None,
    };
    match id {
        0 | 8 => door("RAMDOOR1", "SIDE8", "ABOVEW3"),
        1 | 9 => door("DOOR2", "SIDE8", "ABOVEW3"),
        2 | 3 | 13 => door("TRIDOOR1", "SIDE8", "ABOVEW3"),
        10 | 11 | 14 => door("SDOOR4", "SIDE8", "ABOVEW3"),
        12 => door("EDOOR", "SIDE8", "ABOVEW3"),
        15 => door("SNDOOR", "SIDE16", "ABOVEW16"),
        16 => door("SNADOOR", "SIDE16", "ABOVEW16"),
        17 => door("SNKDOOR", "SIDE16", "ABOVEW16"),
        18 => door("TNDOOR", "SIDE17", "ABOVEW17"),
        19 => door("TNADOOR", "SIDE17", "ABOVEW17"),
        20 => door("TNKDOOR", "SIDE17", "ABOVEW17"),
        _ => None,
    }
}

pub mod masked_flags {
    pub const SHOOTABLE: u16 = 1;
    pub const BLOCKING: u16 = 1 << 1;
    pub const MULTI: u16 = 1 << 2;
    pub const BLOCKING_CHANGES: u16 = 1 << 3;
    pub const ABOVE_PASSABLE: u16 = 1 << 4;
    pub const NON_DOG_BLOCKING: u16 = 1 << 5;
    pub const WEAPON_BLOCKING: u16 = 1 << 6;
    pub const BOTTOM_PASSABLE: u16 = 1 << 7;
    pub const MIDDLE_PASSABLE: u16 = 1 << 8;
    pub const ABP: u16 = 1 << 9;
    pub const SWITCH_ON: u16 = 1 << 10;
    pub const BOTTOM_FLIPPING: u16 = 1 << 11;
    pub const TOP_FLIPPING: u16 = 1 << 12;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MaskedWall {
    pub flags: u16,
    pub side: &'static str,
    pub middle: &'static str,
    pub above: &'static str,
    pub bottom: &'static str,
    pub is_switch: bool,
}

impl MaskedWall {
    pub fn has(&self, flag: u16) -> bool {
        self.flags & flag != 0
    }

    /// All lump names this wall draws with, skipping the empty slots.
    pub fn lumps(&self) -> impl Iterator<Item = &'static str> {
        [self.side, self.middle, self.above, self.bottom].into_iter().filter(|s| !s.is_empty())
    }
}

const fn masked(flags: u16, side: &'static str, middle: &'static str, above: &'static str, bottom: &'static str) -> MaskedWall {
    MaskedWall { flags, side, middle, above, bottom, is_switch: false }
}

pub fn masked_wall(code: u16) -> Option<MaskedWall> {
    use masked_flags::*;

    let glass = MULTI | BLOCKING | BLOCKING_CHANGES | SHOOTABLE;
    let wall = match code {
        157 => MaskedWall { is_switch: true, ..masked(BLOCKING, "", "HSWITCH2", "HSWITCH3", "HSWITCH1") },
        158 => masked(glass, "SIDE21", "ABOVEM5A", "ABOVEM5", "MULTI1A"),
        159 => masked(glass, "SIDE21", "ABOVEM5B", "ABOVEM5", "MULTI2A"),
        160 => masked(glass, "SIDE21", "ABOVEM5C", "ABOVEM5", "MULTI3A"),
        162 => masked(BLOCKING | SHOOTABLE, "SIDE21", "ABOVEM4A", "ABOVEM4", "MASKED1A"),
        163 => masked(BLOCKING, "SIDE21", "ABOVEM4A", "ABOVEM4", "MASKED1"),
        164 => masked(BLOCKING | SHOOTABLE, "SIDE21", "ABOVEM4A", "ABOVEM4", "MASKED2A"),
        165 => masked(BLOCKING, "SIDE21", "ABOVEM4A", "ABOVEM4", "MASKED2"),
        166 => masked(BLOCKING | SHOOTABLE, "SIDE21", "ABOVEM4A", "ABOVEM4", "MASKED3A"),
        167 => masked(BLOCKING, "SIDE21", "ABOVEM4A", "ABOVEM4", "MASKED3"),
        168 => masked(SHOOTABLE | BLOCKING_CHANGES | BLOCKING, "SIDE21", "ABOVEM4A", "ABOVEM4", "MASKED4A"),
        169 => masked(BOTTOM_PASSABLE, "SIDE21", "ABOVEM4A", "ABOVEM4", "MASKED4"),
        170 => masked(NON_DOG_BLOCKING | WEAPON_BLOCKING, "SIDE21", "ABOVEM4A", "ABOVEM4", "DOGMASK"),
        171 => masked(WEAPON_BLOCKING | BLOCKING, "SIDE21", "ABOVEM4A", "ABOVEM4", "PEEPMASK"),
        172 => masked(BOTTOM_PASSABLE, "SIDE21", "ABOVEM4A", "ABOVEM4", "EXITARCH"),
        173 => masked(BOTTOM_PASSABLE, "SIDE21", "ABOVEM4A", "ABOVEM4", "EXITARCA"),
        174 => masked(BLOCKING, "SIDE21", "ABOVEM4A", "ABOVEM4", "ENTRARCH"),
        // HSWTICH4 is spelled that way in the game data
        175 => MaskedWall {
            is_switch: true,
            ..masked(BLOCKING | SWITCH_ON, "", "HSWITCH2", "HSWTICH4", "HSWITCH1")
        },
        176 => masked(BOTTOM_PASSABLE, "SIDE21", "ABOVEM5A", "ABOVEM5", "MULTI1"),
        177 => masked(BOTTOM_PASSABLE, "SIDE21", "ABOVEM5B", "ABOVEM5", "MULTI2"),
        178 => masked(BOTTOM_PASSABLE, "SIDE21", "ABOVEM5C", "ABOVEM5", "MULTI3"),
        179 => masked(ABOVE_PASSABLE | MIDDLE_PASSABLE, "", "", "", "RAILING"),
        _ => return None,
    };
    Some(wall)
}

/// Every lump drawn by any masked wall, used when guessing lump types.
pub fn masked_wall_lumps() -> impl Iterator<Item = (u16, MaskedWall)> {
    (157..=179).filter_map(|code| masked_wall(code).map(|wall| (code, wall)))
}

/// Raised platforms, keyed by the info code of an area cell.
pub fn platform(info: u16) -> Option<MaskedWall> {
    use masked_flags::*;

    let wall = match info {
        4 => masked(BOTTOM_PASSABLE | MIDDLE_PASSABLE, "", "", "HSWTCH9", ""),
        5 => masked(ABOVE_PASSABLE | MIDDLE_PASSABLE, "", "", "", "HSWITCH8"),
        6 => masked(MIDDLE_PASSABLE, "", "", "HSWTCH9", "HSWITCH8"),
        7 => masked(BOTTOM_PASSABLE, "", "HSWITCH7", "HSWITCH7", "HSWTCH11"),
        8 => masked(BOTTOM_PASSABLE | ABOVE_PASSABLE, "", "HSWITCH7", "HSWITCH6", "HSWTCH11"),
        1 | 9 => masked(ABOVE_PASSABLE, "", "HSWITCH7", "HSWITCH6", "HSWITCH5"),
        _ => return None,
    };
    Some(wall)
}

/// Masked walls followed by platforms.
pub fn structure_walls() -> impl Iterator<Item = MaskedWall> {
    masked_wall_lumps()
        .map(|(_, wall)| wall)
        .chain([4, 5, 6, 7, 8, 9].into_iter().filter_map(platform))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plane::Plane;

    fn level_with(cells: &[(usize, usize, u16, u16)]) -> Level {
        let mut structural = Plane::empty();
        let mut info = Plane::empty();
        for &(x, y, code, info_code) in cells {
            structural.set(x, y, code);
            info.set(x, y, info_code);
        }
        Level::new(0, "tiles", structural, Plane::empty(), info)
    }

    #[test]
    fn classifies_tile_ranges() {
        assert_eq!(classify_tile(5, 0, 0, 0), TileKind::Empty);
        assert_eq!(classify_tile(5, 0, 10, 10), TileKind::Wall);
        assert_eq!(classify_tile(34, 0, 10, 10), TileKind::Door);
        assert_eq!(classify_tile(75, 0, 10, 10), TileKind::Elevator);
        assert_eq!(classify_tile(44, 0, 10, 10), TileKind::Animated(0));
        assert_eq!(classify_tile(230, 0, 10, 10), TileKind::Animated(10));
        assert_eq!(classify_tile(163, 0, 10, 10), TileKind::Masked);
        assert_eq!(classify_tile(161, 0, 10, 10), TileKind::Empty);
        assert_eq!(classify_tile(120, 4, 10, 10), TileKind::Platform);
        assert_eq!(classify_tile(120, 0, 10, 10), TileKind::Empty);
        assert_eq!(classify_tile(85, 0, 10, 10), TileKind::Wall);
    }

    #[test]
    fn texture_names_follow_lump_numbering() {
        assert_eq!(wall_texture_name(1).as_deref(), Some("WALL1"));
        assert_eq!(wall_texture_name(40).as_deref(), Some("WALL37"));
        assert_eq!(wall_texture_name(47).as_deref(), Some("EXIT"));
        assert_eq!(wall_texture_name(60).as_deref(), Some("WALL52"));
        assert_eq!(wall_texture_name(73).as_deref(), Some("ELEV2"));
        assert_eq!(wall_texture_name(89).as_deref(), Some("WALL73"));
        assert_eq!(tile_texture_name(TileKind::Animated(3), 45).as_deref(), Some("+0animfac"));
        assert_eq!(tile_texture_name(TileKind::Masked, 163).as_deref(), Some("{MASKED1"));
    }

    #[test]
    fn door_table_lookup() {
        assert_eq!(door_textures(90).unwrap().base, "RAMDOOR1");
        assert_eq!(door_textures(94).unwrap().base, "RAMDOOR1");
        assert_eq!(door_textures(33).unwrap().side, "SIDE16");
        assert_eq!(door_textures(156).unwrap().base, "TNKDOOR");
        assert!(door_textures(200).is_none());
    }

    #[test]
    fn finds_animation_frames() {
        let (anim, frame) = animated_frame("ANIMFAC2").unwrap();
        assert_eq!(anim.ticks, 40);
        assert_eq!(frame, 2);
        assert!(animated_frame("FPLACE5").is_none());
        assert_eq!(anim.frame_name(frame - 1), "+1animfac");
    }

    #[test]
    fn thin_walls_pick_axis_from_neighbours() {
        // wall run along x with a thin piece in the middle
        let level = level_with(&[(10, 10, 1, 0), (11, 10, 1, 1), (12, 10, 1, 0)]);
        let tiles = TileMap::new(&level);
        assert_eq!(tiles.get(11, 10), TileKind::ThinWall(Axis::EastWest));

        let level = level_with(&[(10, 10, 1, 0), (10, 11, 1, 5), (10, 12, 163, 0)]);
        let tiles = TileMap::new(&level);
        assert_eq!(tiles.get(10, 11), TileKind::ThinWall(Axis::NorthSouth));
    }

    #[test]
    fn masked_table_covers_switches() {
        let on = masked_wall(175).unwrap();
        assert!(on.is_switch);
        assert!(on.has(masked_flags::SWITCH_ON));
        assert_eq!(on.above, "HSWTICH4");
        assert_eq!(masked_wall(179).unwrap().lumps().collect::<Vec<_>>(), vec!["RAILING"]);
        assert_eq!(masked_wall_lumps().count(), 22);
    }

    #[test]
    fn platforms_share_the_switch_lumps() {
        assert_eq!(platform(1), platform(9));
        assert_eq!(platform(6).unwrap().above, "HSWTCH9");
        assert_eq!(platform(5).unwrap().bottom, "HSWITCH8");
        assert!(platform(4).unwrap().has(masked_flags::BOTTOM_PASSABLE));
        assert!(platform(2).is_none());
        assert_eq!(structure_walls().count(), 28);
    }
}
