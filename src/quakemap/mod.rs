//! Quake `.map` documents: planes, brushes and entities, rendered as text.

pub mod convert;

use std::fmt::Write as _;

pub use convert::{convert_level, ConvertOptions};

/// Texture name TrenchBroom uses for faces with nothing assigned.
pub const EMPTY_TEXTURE: &str = "__TB_empty";

#[derive(Debug, Clone, PartialEq)]
pub struct MapPlane {
    /// Three points on the plane, counter-clockwise seen from outside.
    pub points: [[f64; 3]; 3],
    pub texture: String,
    pub x_offset: f64,
    pub y_offset: f64,
    pub rotation: f64,
    pub x_scale: f64,
    pub y_scale: f64,
}

impl MapPlane {
    fn render(&self, out: &mut String) {
        let texture = if self.texture.is_empty() { EMPTY_TEXTURE } else { &self.texture };
        for p in &self.points {
            let _ = write!(out, "({:.2} {:.2} {:.2}) ", p[0], p[1], p[2]);
        }
        let _ = writeln!(
            out,
            "{} {:.2} {:.2} {:.2} {:.2} {:.2}",
            texture, self.x_offset, self.y_offset, self.rotation, self.x_scale, self.y_scale
        );
    }
}

/// Faces of an axis-aligned cuboid, in the order they are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Face {
    South,
    North,
    West,
    East,
    Top,
    Bottom,
}

impl Face {
    pub const ALL: [Face; 6] = [Face::South, Face::North, Face::West, Face::East, Face::Top, Face::Bottom];
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Brush {
    pub planes: Vec<MapPlane>,
}

impl Brush {
    /// Cuboid between two opposite corners with one texture on every face.
    pub fn cuboid(min: [f64; 3], max: [f64; 3], texture: &str, scale: f64, wrap: bool) -> Brush {
        Brush::cuboid_with(min, max, scale, wrap, |_| texture)
    }

    /// Cuboid with a texture chosen per face. With `wrap` the north and
    /// west faces get a mirrored U scale so textures run continuously
    /// around corners.
    pub fn cuboid_with<'a>(
        min: [f64; 3],
        max: [f64; 3],
        scale: f64,
        wrap: bool,
        texture: impl Fn(Face) -> &'a str,
    ) -> Brush {
        let [x1, y1, z1] = min;
        let [x2, y2, z2] = max;

        let planes = Face::ALL
            .iter()
            .map(|&face| {
                let points = match face {
                    Face::South => [[x1, y1, z1], [x1, y1, z1 + 1.0], [x1 + 1.0, y1, z1]],
                    Face::North => [[x1, y2, z1], [x1 + 1.0, y2, z1], [x1, y2, z1 + 1.0]],
                    Face::West => [[x1, y1, z1], [x1, y1 + 1.0, z1], [x1, y1, z1 + 1.0]],
                    Face::East => [[x2, y1, z1], [x2, y1, z1 + 1.0], [x2, y1 + 1.0, z1]],
                    Face::Top => [[x1, y1, z2], [x1, y1 + 1.0, z2], [x1 + 1.0, y1, z2]],
                    Face::Bottom => [[x1, y1, z1], [x1 + 1.0, y1, z1], [x1, y1 + 1.0, z1]],
                };
                let flipped = wrap && matches!(face, Face::North | Face::West);
                MapPlane {
                    points,
                    texture: texture(face).to_string(),
                    x_offset: 0.0,
                    y_offset: 0.0,
                    rotation: 0.0,
                    x_scale: if flipped { -scale } else { scale },
                    y_scale: scale,
                }
            })
            .collect();
        Brush { planes }
    }

    fn render(&self, out: &mut String) {
        out.push_str("{\n");
        for plane in &self.planes {
            plane.render(out);
        }
        out.push_str("}\n");
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub spawnflags: u32,
    pub classname: String,
    /// Extra key/value pairs, written in insertion order.
    pub keys: Vec<(String, String)>,
    pub origin: [f64; 3],
    pub angle: f64,
    pub brushes: Vec<Brush>,
}

impl Entity {
    pub fn new(classname: &str) -> Entity {
        Entity {
            spawnflags: 0,
            classname: classname.to_string(),
            keys: Vec::new(),
            origin: [0.0; 3],
            angle: 0.0,
            brushes: Vec::new(),
        }
    }

    pub fn point(classname: &str, origin: [f64; 3]) -> Entity {
        Entity { origin, ..Entity::new(classname) }
    }

    pub fn with_brush(classname: &str, brush: Brush) -> Entity {
        Entity { brushes: vec![brush], ..Entity::new(classname) }
    }

    pub fn set_key(&mut self, key: &str, value: impl Into<String>) {
        self.keys.push((key.to_string(), value.into()));
    }

    pub fn key(&self, key: &str) -> Option<&str> {
        self.keys.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }

    fn render(&self, wads: &[String], out: &mut String) {
        let _ = write!(out, "{{\n\"spawnflags\" \"{}\"\n\"classname\" \"{}\"\n", self.spawnflags, self.classname);
        for (key, value) in &self.keys {
            let _ = writeln!(out, "\"{}\" \"{}\"", key, value);
        }

        if self.classname == "worldspawn" {
            let _ = writeln!(out, "\"wad\" \"{}\"", wads.join(";"));
        } else {
            let [x, y, z] = self.origin;
            let _ = writeln!(out, "\"origin\" \"{:.2} {:.2} {:.2}\"", x, y, z);
            if self.classname == "info_player_start" || self.angle != 0.0 {
                let _ = writeln!(out, "\"angle\" \"{:.2}\"", self.angle);
            }
        }

        for (i, brush) in self.brushes.iter().enumerate() {
            let _ = writeln!(out, "// brush {}", i);
            brush.render(out);
            out.push('\n');
        }
        out.push_str("}\n");
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuakeMap {
    pub wads: Vec<String>,
    pub worldspawn: Entity,
    pub player_start: Entity,
    pub entities: Vec<Entity>,
}

impl QuakeMap {
    pub fn new(start: [f64; 3], angle: f64) -> QuakeMap {
        let mut worldspawn = Entity::new("worldspawn");
        worldspawn.set_key("light", "256");
        let player_start = Entity { angle, ..Entity::point("info_player_start", start) };
        QuakeMap { wads: Vec::new(), worldspawn, player_start, entities: Vec::new() }
    }

    pub fn brush_count(&self) -> usize {
        self.worldspawn.brushes.len() + self.entities.iter().map(|e| e.brushes.len()).sum::<usize>()
    }

    pub fn entities_named<'a>(&'a self, classname: &'a str) -> impl Iterator<Item = &'a Entity> + 'a {
        self.entities.iter().filter(move |e| e.classname == classname)
    }

    /// Worldspawn first, then the player start, then everything else.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.worldspawn.render(&self.wads, &mut out);
        out.push('\n');
        self.player_start.render(&self.wads, &mut out);
        for entity in &self.entities {
            out.push('\n');
            entity.render(&self.wads, &mut out);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_brush(brush: &Brush) -> String {
        let mut out = String::new();
        brush.render(&mut out);
        out
    }

    #[test]
    fn cuboid_planes_in_face_order() {
        let brush = Brush::cuboid([0.0, 0.0, 0.0], [64.0, 32.0, 16.0], "WALL1", 1.0, false);
        let text = render_brush(&brush);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], "{");
        assert_eq!(lines[1], "(0.00 0.00 0.00) (0.00 0.00 1.00) (1.00 0.00 0.00) WALL1 0.00 0.00 0.00 1.00 1.00");
        assert_eq!(lines[2], "(0.00 32.00 0.00) (1.00 32.00 0.00) (0.00 32.00 1.00) WALL1 0.00 0.00 0.00 1.00 1.00");
        assert_eq!(lines[4], "(64.00 0.00 0.00) (64.00 0.00 1.00) (64.00 1.00 0.00) WALL1 0.00 0.00 0.00 1.00 1.00");
        assert_eq!(lines[5], "(0.00 0.00 16.00) (0.00 1.00 16.00) (1.00 0.00 16.00) WALL1 0.00 0.00 0.00 1.00 1.00");
        assert_eq!(lines[7], "}");
    }

    #[test]
    fn wrap_mirrors_north_and_west() {
        let brush = Brush::cuboid([0.0; 3], [1.0; 3], "WALL1", 2.0, true);
        let scales: Vec<f64> = brush.planes.iter().map(|p| p.x_scale).collect();
        assert_eq!(scales, vec![2.0, -2.0, -2.0, 2.0, 2.0, 2.0]);
        assert!(brush.planes.iter().all(|p| p.y_scale == 2.0));
    }

    #[test]
    fn per_face_textures_and_empty_name() {
        let brush = Brush::cuboid_with([0.0; 3], [1.0; 3], 1.0, false, |face| match face {
            Face::East | Face::West => "DOOR2",
            _ => "",
        });
        let text = render_brush(&brush);
        assert_eq!(text.matches("DOOR2").count(), 2);
        assert_eq!(text.matches(EMPTY_TEXTURE).count(), 4);
    }

    #[test]
    fn renders_worldspawn_then_player_start() {
        let mut map = QuakeMap::new([96.0, 224.0, 96.0], 0.0);
        map.wads.push("rott.wad".to_string());
        map.wads.push("extra.wad".to_string());
        map.worldspawn.brushes.push(Brush::cuboid([0.0; 3], [1.0; 3], "FLRCL1", 1.0, false));
        let mut monster = Entity::point("monster_army", [1.0, 2.0, 3.0]);
        monster.spawnflags = 256;
        monster.angle = 90.0;
        map.entities.push(monster);

        let text = map.render();
        let expected_head = "{\n\"spawnflags\" \"0\"\n\"classname\" \"worldspawn\"\n\"light\" \"256\"\n\"wad\" \"rott.wad;extra.wad\"\n// brush 0\n{\n";
        assert!(text.starts_with(expected_head), "{}", text);
        assert!(text.contains("}\n\n}\n\n{\n\"spawnflags\" \"0\"\n\"classname\" \"info_player_start\"\n\"origin\" \"96.00 224.00 96.00\"\n\"angle\" \"0.00\"\n}\n"));
        assert!(text.ends_with(
            "\n{\n\"spawnflags\" \"256\"\n\"classname\" \"monster_army\"\n\"origin\" \"1.00 2.00 3.00\"\n\"angle\" \"90.00\"\n}\n"
        ));
        assert_eq!(map.brush_count(), 1);
    }

    #[test]
    fn zero_angle_is_omitted_for_other_entities() {
        let mut map = QuakeMap::new([0.0; 3], 180.0);
        let mut pad = Entity::point("object_jump_pad", [0.0; 3]);
        pad.set_key("amount", "0.5");
        map.entities.push(pad);
        let text = map.render();
        assert_eq!(text.matches("\"angle\"").count(), 1);
        assert!(text.contains("\"angle\" \"180.00\""));
        assert!(text.contains("\"classname\" \"object_jump_pad\"\n\"amount\" \"0.5\"\n\"origin\""));
        assert_eq!(map.entities_named("object_jump_pad").next().unwrap().key("amount"), Some("0.5"));
    }
}
