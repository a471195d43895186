//! RTL level archives: header table, plane decoding and per-level metadata.

use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::binary::{read_magic, read_name, read_u32_le, slice};
use crate::error::{ConvertError, Result};
use crate::plane::{decode_plane, Plane, MAP_SIZE};

pub const MAP_SLOTS: usize = 100;
const FILE_HEADER_SIZE: usize = 8;
const MAP_HEADER_SIZE: usize = 64;

/// Cell codes 19..=22 in the actor plane mark the player start.
const SPAWN_CODES: std::ops::RangeInclusive<u16> = 19..=22;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Heading {
    North,
    East,
    South,
    West,
}

impl Heading {
    pub fn from_index(index: u16) -> Heading {
        match index % 4 {
            0 => Heading::North,
            1 => Heading::East,
            2 => Heading::South,
            _ => Heading::West,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spawn {
    pub x: usize,
    pub y: usize,
    pub heading: Heading,
}

#[derive(Debug, Clone)]
pub struct MapHeader {
    pub used: bool,
    pub crc: [u8; 4],
    pub escape: u32,
    pub specials: u32,
    /// Structural, actor, info.
    pub plane_offsets: [u32; 3],
    pub plane_lengths: [u32; 3],
    pub name: String,
}

impl MapHeader {
    fn parse(data: &[u8], offset: usize) -> Result<MapHeader> {
        let field = |i: usize| read_u32_le(data, offset + i * 4);
        Ok(MapHeader {
            used: field(0)? != 0,
            crc: read_magic(data, offset + 4)?,
            escape: field(2)?,
            specials: field(3)?,
            plane_offsets: [field(4)?, field(5)?, field(6)?],
            plane_lengths: [field(7)?, field(8)?, field(9)?],
            name: read_name(data, offset + 40, 24)?,
        })
    }
}

/// One decoded map slot. The planes are never modified after loading.
#[derive(Debug, Clone)]
pub struct Level {
    pub slot: usize,
    pub name: String,
    pub structural: Plane,
    pub actor: Plane,
    pub info: Plane,
    pub spawn: Spawn,
}

impl Level {
    pub fn new(slot: usize, name: impl Into<String>, structural: Plane, actor: Plane, info: Plane) -> Level {
        let spawn = find_spawn(&actor);
        Level { slot, name: name.into(), structural, actor, info, spawn }
    }

    pub fn floor_number(&self) -> u16 {
        self.structural.get(0, 0)
    }

    pub fn ceiling_number(&self) -> u16 {
        self.structural.get(1, 0)
    }

    pub fn brightness(&self) -> u16 {
        self.structural.get(2, 0)
    }

    pub fn light_fade_rate(&self) -> u16 {
        self.structural.get(3, 0)
    }

    pub fn height_code(&self) -> u16 {
        self.actor.get(0, 0)
    }

    pub fn sky_height(&self) -> u16 {
        self.actor.get(1, 0)
    }

    pub fn song_number(&self) -> Option<u16> {
        (0..MAP_SIZE)
            .map(|x| self.info.get(x, 0))
            .find(|v| v & 0xff00 == 0xba00)
            .map(|v| v & 0xff)
    }

    pub fn floor_texture(&self) -> Option<String> {
        match self.floor_number() {
            n @ 180..=195 => Some(format!("FLRCL{}", n - 179)),
            _ => None,
        }
    }

    /// None means the level is open to the sky.
    pub fn ceiling_texture(&self) -> Option<String> {
        match self.ceiling_number() {
            n @ 198..=213 => Some(format!("FLRCL{}", n - 197)),
            _ => None,
        }
    }

    /// Wall height in tiles.
    pub fn floor_height(&self) -> Option<u32> {
        match self.height_code() {
            n @ 90..=98 => Some(n as u32 - 89),
            n @ 450..=457 => Some(n as u32 - 441),
            _ => None,
        }
    }

    /// ASCII view of the structural plane, four characters per cell.
    pub fn structural_dump(&self) -> String {
        let mut out = String::with_capacity(MAP_SIZE * (MAP_SIZE * 4 + 2));
        for y in 0..MAP_SIZE {
            for x in 0..MAP_SIZE {
                let code = self.structural.get(x, y);
                if x == self.spawn.x && y == self.spawn.y {
                    out.push_str(match self.spawn.heading {
                        Heading::North => " P^ ",
                        Heading::East => " P> ",
                        Heading::South => " PV ",
                        Heading::West => " <P ",
                    });
                } else if code != 0 {
                    let _ = write!(out, " {:02x} ", code & 0xff);
                } else {
                    out.push_str("    ");
                }
            }
            out.push_str("\r\n");
        }
        out
    }

    /// Writes `mapNNN-walls.bin`, `mapNNN-sprites.bin` and `mapNNN-info.bin`.
    pub fn write_plane_dumps(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let mut written = Vec::with_capacity(3);
        for (suffix, plane) in [("walls", &self.structural), ("sprites", &self.actor), ("info", &self.info)] {
            let path = dir.join(format!("map{:03}-{}.bin", self.slot + 1, suffix));
            fs::write(&path, plane.to_le_bytes())?;
            written.push(path);
        }
        Ok(written)
    }
}

fn find_spawn(actor: &Plane) -> Spawn {
    let mut spawn = Spawn { x: 0, y: 0, heading: Heading::North };
    // the last marker wins, matching the engine's own scan order
    for y in 0..MAP_SIZE {
        for x in 0..MAP_SIZE {
            let code = actor.get(x, y);
            if SPAWN_CODES.contains(&code) {
                spawn = Spawn { x, y, heading: Heading::from_index(code - 19) };
            }
        }
    }
    spawn
}

#[derive(Debug)]
pub struct RtlArchive {
    pub version: u32,
    pub headers: Vec<MapHeader>,
    pub levels: Vec<Level>,
}

impl RtlArchive {
    pub fn open(path: &Path) -> Result<RtlArchive> {
        let data = fs::read(path)?;
        RtlArchive::parse(&data)
    }

    pub fn parse(data: &[u8]) -> Result<RtlArchive> {
        let magic = read_magic(data, 0)?;
        if &magic != b"RTL\0" && &magic != b"RXL\0" {
            return Err(ConvertError::BadMagic { format: "RTL", found: magic });
        }
        let version = read_u32_le(data, 4)?;

        let headers = (0..MAP_SLOTS)
            .map(|i| MapHeader::parse(data, FILE_HEADER_SIZE + i * MAP_HEADER_SIZE))
            .collect::<Result<Vec<_>>>()?;

        let mut levels = Vec::new();
        for (slot, header) in headers.iter().enumerate() {
            if !header.used {
                continue;
            }
            let escape = header.escape as u16;
            let mut planes = Vec::with_capacity(3);
            for (offset, length) in header.plane_offsets.iter().zip(&header.plane_lengths) {
                let offset = *offset as usize;
                let stream = if *length > 0 {
                    slice(data, offset, *length as usize)?
                } else {
                    slice(data, offset, data.len().saturating_sub(offset))?
                };
                planes.push(decode_plane(stream, escape)?);
            }
            let info_plane = planes.pop().unwrap_or_else(Plane::empty);
            let actor_plane = planes.pop().unwrap_or_else(Plane::empty);
            let structural_plane = planes.pop().unwrap_or_else(Plane::empty);
            let level = Level::new(slot, header.name.clone(), structural_plane, actor_plane, info_plane);
            debug!(slot = slot + 1, name = %level.name, "decoded level planes");
            levels.push(level);
        }

        info!("loaded RTL archive version 0x{:x} with {} levels", version, levels.len());
        Ok(RtlArchive { version, headers, levels })
    }

    /// Human readable summary of every used slot.
    pub fn metadata_report(&self) -> String {
        let mut out = format!("Version: 0x{:x}\n", self.version);
        for level in &self.levels {
            let header = &self.headers[level.slot];
            let _ = writeln!(out, "Map #{}", level.slot + 1);
            let _ = writeln!(out, "\tCRC: {:02x?}", header.crc);
            let _ = writeln!(out, "\tRLEW tag: 0x{:x}", header.escape);
            let _ = writeln!(out, "\tPlane offsets: {:?}", header.plane_offsets);
            let _ = writeln!(out, "\tPlane lengths: {:?}", header.plane_lengths);
            let _ = writeln!(out, "\tMap name: {}", level.name);
            match level.floor_height() {
                Some(height) => {
                    let _ = writeln!(out, "\tHeight: {}", height);
                }
                None => {
                    let _ = writeln!(out, "\tHeight: invalid ({})", level.height_code());
                }
            }
            let _ = writeln!(out, "\tSky height: {}", level.sky_height());
            let _ = writeln!(
                out,
                "\tFloor: {} Ceiling: {}",
                level.floor_texture().unwrap_or_else(|| level.floor_number().to_string()),
                level.ceiling_texture().unwrap_or_else(|| "sky".to_string())
            );
            let _ = writeln!(out, "\tBrightness: {} Fade: {}", level.brightness(), level.light_fade_rate());
            if let Some(song) = level.song_number() {
                let _ = writeln!(out, "\tSong: {}", song);
            }
            let _ = writeln!(out, "\tSpawn: ({}, {}) {:?}", level.spawn.x, level.spawn.y, level.spawn.heading);
        }
        out
    }
}
