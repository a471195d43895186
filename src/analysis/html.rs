//! Browsable HTML view of a level: one table cell per tile with its three
//! plane values, its tile kind and the dumped picture behind it.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::level::Level;
use crate::plane::MAP_SIZE;

use super::tiles::{door_textures, masked_wall, wall_texture_name, TileKind, TileMap, ANIMATED_WALLS};

const HEAD: &str = r#"<!DOCTYPE html>
<html>
  <head>
    <title>Map</title>
    <style type="text/css">
      .map { border: 0px; margin: 0px; padding: 0px; width: 8452px; }
      .maprow > td:hover { background: #be5454 !important; }
      .mapcell { width: 64px; height: 64px; display: inline-block; border: 1px solid #000; padding: 0px; margin: 0px; }
      .mapcell > div { font-size: 11px; padding: 0px; margin: 0px; }
    </style>
  </head>
  <body>
    <table class="map">
"#;

const TAIL: &str = "    </table>\n  </body>\n</html>\n";

fn kind_label(kind: TileKind) -> &'static str {
    match kind {
        TileKind::Empty => "",
        TileKind::Wall => "Wall",
        TileKind::ThinWall(_) => "ThinWall",
        TileKind::Elevator => "Elevator",
        TileKind::Animated(_) => "AnimatedWall",
        TileKind::Masked => "MaskedWall",
        TileKind::Door => "Door",
        TileKind::Platform => "Platform",
    }
}

/// Path of the dumped lump drawn at a cell, relative to the dump's
/// `imgs/` directory, in the folders `--dump` sorts lumps into.
fn cell_image(kind: TileKind, code: u16) -> Option<String> {
    match kind {
        TileKind::Wall | TileKind::ThinWall(_) => wall_texture_name(code).map(|name| format!("wall/{}", name)),
        TileKind::Elevator => wall_texture_name(code).map(|name| format!("elev/{}", name)),
        TileKind::Animated(id) => ANIMATED_WALLS.get(id).map(|anim| format!("anim/{}1", anim.lump)),
        TileKind::Door => door_textures(code).map(|door| format!("doors/{}", door.base)),
        TileKind::Masked => masked_wall(code).map(|wall| format!("masked/{}", wall.bottom)),
        TileKind::Empty | TileKind::Platform => None,
    }
}

pub fn html_dump(level: &Level, tiles: &TileMap) -> String {
    let mut out = String::from(HEAD);
    for y in 0..MAP_SIZE {
        out.push_str("    <tr class=\"maprow\">");
        for x in 0..MAP_SIZE {
            let code = level.structural.get(x, y);
            let kind = tiles.get(x, y);
            let _ = write!(out, "<td class=\"mapcell\" id=\"cell-{}-{}\"", x, y);
            if let Some(image) = cell_image(kind, code) {
                let _ = write!(out, " style=\"background: url(imgs/{}.png)\"", image);
            }
            let _ = write!(
                out,
                "><div>(X:{},Y:{}) {}</div><div>W: {:04x}</div><div>S: {:04x}</div><div>I: {:04x}</div></td>",
                x,
                y,
                kind_label(kind),
                code,
                level.actor.get(x, y),
                level.info.get(x, y)
            );
        }
        out.push_str("</tr>\n");
    }
    out.push_str(TAIL);
    out
}

/// Writes `mapNNN.html` into `dir`.
pub fn write_html_dump(level: &Level, tiles: &TileMap, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(format!("map{:03}.html", level.slot + 1));
    fs::write(&path, html_dump(level, tiles))?;
    Ok(path)
}
