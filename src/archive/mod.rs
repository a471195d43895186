//! Lump containers: ROTT IWADs, Quake WAD2 files and Quake PAKs.

pub mod pak;
pub mod wad;
pub mod wad2;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::binary::slice;
use crate::error::{ConvertError, Result};
use crate::picture::Palette;

pub use pak::PakArchive;
pub use wad::RottWad;
pub use wad2::{LumpType, Wad2Archive, Wad2Writer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LumpEntry {
    pub name: String,
    pub offset: usize,
    pub size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveKind {
    RottWad,
    QuakeWad,
    QuakePak,
}

impl ArchiveKind {
    pub fn game(&self) -> &'static str {
        match self {
            ArchiveKind::RottWad => "rott",
            ArchiveKind::QuakeWad | ArchiveKind::QuakePak => "quake",
        }
    }

    pub fn palette_lump(&self) -> &'static str {
        match self {
            ArchiveKind::RottWad => "PAL",
            ArchiveKind::QuakeWad => "PALETTE",
            ArchiveKind::QuakePak => "gfx/palette.lmp",
        }
    }
}

/// How a lump's bytes should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LumpKind {
    Raw,
    Wall,
    Sky,
    Midi,
    Patch,
    TranslucentPatch,
    Lpic,
    Pic,
    Lbm,
}

impl LumpKind {
    /// Extension of the file a dump of this kind produces.
    pub fn extension(&self) -> &'static str {
        match self {
            LumpKind::Midi => "mid",
            LumpKind::Raw => "dat",
            _ => "png",
        }
    }

    pub fn is_picture(&self) -> bool {
        self.extension() == "png"
    }

    pub fn name(&self) -> &'static str {
        match self {
            LumpKind::Raw => "raw",
            LumpKind::Wall => "wall",
            LumpKind::Sky => "sky",
            LumpKind::Midi => "midi",
            LumpKind::Patch => "patch",
            LumpKind::TranslucentPatch => "tpatch",
            LumpKind::Lpic => "lpic",
            LumpKind::Pic => "pic",
            LumpKind::Lbm => "lbm",
        }
    }
}

impl fmt::Display for LumpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LumpKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let kind = match s {
            "raw" => LumpKind::Raw,
            "wall" => LumpKind::Wall,
            "sky" => LumpKind::Sky,
            "midi" => LumpKind::Midi,
            "patch" => LumpKind::Patch,
            "tpatch" => LumpKind::TranslucentPatch,
            "lpic" => LumpKind::Lpic,
            "pic" => LumpKind::Pic,
            "lbm" => LumpKind::Lbm,
            other => return Err(format!("unknown lump type {:?}", other)),
        };
        Ok(kind)
    }
}

/// A container of named lumps held fully in memory.
pub trait Archive {
    fn kind(&self) -> ArchiveKind;

    fn entries(&self) -> &[LumpEntry];

    /// The lump's bytes, bounded to the entry.
    fn read_lump(&self, entry: &LumpEntry) -> Result<&[u8]>;

    /// Interpretation and output subdirectory for the lump at `index`.
    fn guess_type(&self, index: usize) -> (LumpKind, &'static str);

    fn find(&self, name: &str) -> Option<&LumpEntry> {
        self.entries().iter().find(|e| e.name == name)
    }
}

pub(crate) fn lump_bytes<'a>(data: &'a [u8], entry: &LumpEntry) -> Result<&'a [u8]> {
    slice(data, entry.offset, entry.size)
}

pub fn palette_from_archive(archive: &dyn Archive, name: &str) -> Result<Palette> {
    let entry = archive
        .find(name)
        .ok_or_else(|| ConvertError::decode("palette", format!("no {} lump in archive", name)))?;
    Palette::from_bytes(archive.read_lump(entry)?)
}

/// Read a whole archive file and parse it as the given kind.
pub fn open_archive(path: &Path, kind: ArchiveKind) -> Result<Box<dyn Archive>> {
    let data = std::fs::read(path)?;
    let archive: Box<dyn Archive> = match kind {
        ArchiveKind::RottWad => Box::new(RottWad::parse(data)?),
        ArchiveKind::QuakeWad => Box::new(Wad2Archive::parse(data)?),
        ArchiveKind::QuakePak => Box::new(PakArchive::parse(data)?),
    };
    Ok(archive)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lump_kinds_parse_from_cli_names() {
        for kind in [LumpKind::Raw, LumpKind::TranslucentPatch, LumpKind::Lbm, LumpKind::Midi] {
            assert_eq!(kind.name().parse::<LumpKind>().unwrap(), kind);
        }
        assert!("bitmap".parse::<LumpKind>().is_err());
    }

    #[test]
    fn extensions_by_kind() {
        assert_eq!(LumpKind::Sky.extension(), "png");
        assert_eq!(LumpKind::Midi.extension(), "mid");
        assert_eq!(LumpKind::Raw.extension(), "dat");
        assert!(!LumpKind::Midi.is_picture());
    }

    #[test]
    fn opens_archive_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.wad");
        let mut pal = vec![0u8; 768];
        pal[3] = 9;
        std::fs::write(&path, wad::tests::build_iwad(&[("PAL", &pal)])).unwrap();

        let archive = open_archive(&path, ArchiveKind::RottWad).unwrap();
        assert_eq!(archive.kind().game(), "rott");
        let palette = palette_from_archive(archive.as_ref(), archive.kind().palette_lump()).unwrap();
        assert_eq!(palette.rgb(1), [9, 0, 0]);
        assert!(palette_from_archive(archive.as_ref(), "PLAYPAL").is_err());
    }
}
