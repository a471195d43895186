//! ROTT `IWAD` reader and the lump type guesser.

use tracing::debug;

use crate::analysis::tiles::structure_walls;
use crate::binary::{read_magic, read_name, read_u32_le, slice};
use crate::error::{ConvertError, Result};

use super::{lump_bytes, Archive, ArchiveKind, LumpEntry, LumpKind};

const IWAD_MAGIC: [u8; 4] = *b"IWAD";
const HEADER_SIZE: usize = 12;
const ENTRY_SIZE: usize = 16;
const NAME_LEN: usize = 8;

pub struct RottWad {
    data: Vec<u8>,
    entries: Vec<LumpEntry>,
    kinds: Vec<(LumpKind, &'static str)>,
}

impl RottWad {
    pub fn parse(data: Vec<u8>) -> Result<RottWad> {
        let magic = read_magic(&data, 0)?;
        if magic != IWAD_MAGIC {
            return Err(ConvertError::BadMagic { format: "IWAD", found: magic });
        }
        let count = read_u32_le(&data, 4)? as usize;
        let dir_offset = read_u32_le(&data, 8)? as usize;
        slice(&data, dir_offset, count * ENTRY_SIZE)?;

        let mut entries = Vec::with_capacity(count);
        for i in 0..count {
            let at = dir_offset + i * ENTRY_SIZE;
            entries.push(LumpEntry {
                offset: read_u32_le(&data, at)? as usize,
                size: read_u32_le(&data, at + 4)? as usize,
                name: read_name(&data, at + 8, NAME_LEN)?,
            });
        }

        let kinds = guess_types(&entries);
        debug!(lumps = entries.len(), "parsed IWAD directory");
        Ok(RottWad { data, entries, kinds })
    }
}

impl Archive for RottWad {
    fn kind(&self) -> ArchiveKind {
        ArchiveKind::RottWad
    }

    fn entries(&self) -> &[LumpEntry] {
        &self.entries
    }

    fn read_lump(&self, entry: &LumpEntry) -> Result<&[u8]> {
        lump_bytes(&self.data, entry)
    }

    fn guess_type(&self, index: usize) -> (LumpKind, &'static str) {
        self.kinds.get(index).copied().unwrap_or((LumpKind::Raw, ""))
    }
}

/// Lumps whose type does not follow from the surrounding markers.
fn one_off(name: &str) -> Option<(LumpKind, &'static str)> {
    use LumpKind::*;

    let guess = match name {
        "SND_ON" | "SND_OFF" => (Patch, "widgets"),
        "BLOCK1" | "BLOCK2" | "BLOCK3" => (Patch, "block"),
        "CACHEBAR" => (Patch, "misc"),
        "INFO1" | "INFO2" | "INFO3" | "INFO4" | "INFO5" | "INFO6" | "INFO7" | "INFO8" | "INFO9" => (Patch, "info"),
        "DEADJOE" | "DEADROBO" | "DEADSTEV" | "DEADTOM" => (Patch, "boss-deaths"),
        "HSWITCH5" | "HSWITCH8" => (TranslucentPatch, "masked"),
        "HSWTICH4" | "HSWITCH6" | "HSWITCH7" | "HSWTCH9" => (Patch, "masked"),
        "PAL" | "LICENSE" => (Raw, "misc"),
        "IMFREE" | "BOOTBLOD" | "BOOTNORM" | "SVENDOR" | "DEADBOSS" => (Lbm, "misc"),
        "MMBK" | "PAUSED" | "WAIT" | "TNUMB" | "BATTP" => (Pic, "misc"),
        "DOOR2" | "EDOOR" | "RAMDOOR1" | "SDOOR4" | "SNADOOR" | "SNDOOR" | "SNKDOOR" | "TNADOOR" | "TNDOOR"
        | "TNKDOOR" | "TRIDOOR1" => (Wall, "doors"),
        "SIDE8" | "SIDE21" | "LOCK1" | "LOCK2" | "LOCK3" | "LOCK4" | "SIDE13" | "SIDE16" | "SIDE17" => {
            (Wall, "side")
        }
        _ => return None,
    };
    Some(guess)
}

/// Section a marker lump opens, or `None` if the name is not a marker.
fn marker(name: &str) -> Option<(LumpKind, &'static str)> {
    use LumpKind::*;

    let section = match name {
        "WALLSTRT" => (Wall, "wall"),
        "SONGSTRT" => (Midi, "music"),
        "ANIMSTRT" => (Wall, "anim"),
        "EXITSTRT" | "ABVWSTRT" | "ABVMSTRT" | "HMSKSTRT" | "ORDRSTRT" => (Raw, ""),
        "GUNSTART" => (Patch, "guns"),
        "ELEVSTRT" => (Wall, "elev"),
        "DOORSTRT" => (Patch, "doors"),
        "SIDESTRT" => (Patch, "side"),
        "MASKSTRT" => (Raw, "masked-unknown"),
        "UPDNSTRT" => (Lpic, "floors-ceilings"),
        "SKYSTART" => (Sky, "skies"),
        "SHAPSTRT" => (Patch, "shapes"),
        "DIGISTRT" => (Raw, "sounds-digital"),
        "G_START" => (Raw, "sounds"),
        "PCSTART" => (Raw, "sounds-pcspkr"),
        "ADSTART" => (Raw, "sounds-adlib"),
        "WALLSTOP" | "EXITSTOP" | "ELEVSTOP" | "DOORSTOP" | "SIDESTOP" | "MASKSTOP" | "UPDNSTOP" | "SKYSTOP"
        | "ORDRSTOP" | "SHAPSTOP" | "DIGISTOP" | "PCSTOP" | "ADSTOP" => (Raw, ""),
        "PAL" => (Raw, "misc"),
        _ => return None,
    };
    Some(section)
}

/// Masked wall and platform lumps are drawn in specific formats
/// regardless of where they sit in the directory.
fn structure_lump(name: &str) -> Option<(LumpKind, &'static str)> {
    structure_walls().find_map(|wall| {
        if name == wall.bottom {
            Some((LumpKind::TranslucentPatch, "masked"))
        } else if name == wall.above || name == wall.middle {
            Some((LumpKind::Patch, "masked"))
        } else if name == wall.side {
            Some((LumpKind::Wall, "masked"))
        } else {
            None
        }
    })
}

/// One pass over the directory. A marker governs the lumps after it, not
/// itself.
fn guess_types(entries: &[LumpEntry]) -> Vec<(LumpKind, &'static str)> {
    let mut section = (LumpKind::Raw, "");
    entries
        .iter()
        .map(|entry| {
            let name = entry.name.as_str();
            let guess = if name.is_empty() {
                section
            } else {
                structure_lump(name).or_else(|| one_off(name)).unwrap_or(section)
            };
            if let Some(next) = marker(name) {
                section = next;
            }
            guess
        })
        .collect()
}
