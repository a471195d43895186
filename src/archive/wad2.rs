//! Quake `WAD2` texture archives: a reader for existing files and the
//! writer used for texture export.

use std::io::Write;

use tracing::debug;

use crate::binary::{read_magic, read_name, read_u32_le, read_u8, slice};
use crate::error::{ConvertError, Result};

use super::{lump_bytes, Archive, ArchiveKind, LumpEntry, LumpKind};

const WAD2_MAGIC: [u8; 4] = *b"WAD2";
const HEADER_SIZE: usize = 12;
const ENTRY_SIZE: usize = 32;
const NAME_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LumpType {
    /// Untyped data such as the palette.
    Raw,
    QPic,
    MipTex,
}

impl LumpType {
    pub fn code(&self) -> u8 {
        match self {
            LumpType::Raw => 0x40,
            LumpType::QPic => 0x42,
            LumpType::MipTex => 0x44,
        }
    }
}

pub struct Wad2Archive {
    data: Vec<u8>,
    entries: Vec<LumpEntry>,
    types: Vec<u8>,
}

impl Wad2Archive {
    pub fn parse(data: Vec<u8>) -> Result<Wad2Archive> {
        let magic = read_magic(&data, 0)?;
        if magic != WAD2_MAGIC {
            return Err(ConvertError::BadMagic { format: "WAD2", found: magic });
        }
        let count = read_i32(&data, 4, "entry count")?;
        let dir_offset = read_i32(&data, 8, "directory offset")?;
        slice(&data, dir_offset, count * ENTRY_SIZE)?;

        let mut entries = Vec::with_capacity(count);
        let mut types = Vec::with_capacity(count);
        for i in 0..count {
            let at = dir_offset + i * ENTRY_SIZE;
            entries.push(LumpEntry {
                offset: read_i32(&data, at, "lump offset")?,
                size: read_i32(&data, at + 4, "lump size")?,
                name: read_name(&data, at + 16, NAME_LEN)?,
            });
            types.push(read_u8(&data, at + 12)?);
        }

        debug!(lumps = entries.len(), "parsed WAD2 directory");
        Ok(Wad2Archive { data, entries, types })
    }

    pub fn lump_type(&self, index: usize) -> Option<u8> {
        self.types.get(index).copied()
    }
}

fn read_i32(data: &[u8], offset: usize, what: &str) -> Result<usize> {
    let value = read_u32_le(data, offset)? as i32;
    usize::try_from(value).map_err(|_| ConvertError::decode("WAD2 directory", format!("negative {}: {}", what, value)))
}

impl Archive for Wad2Archive {
    fn kind(&self) -> ArchiveKind {
        ArchiveKind::QuakeWad
    }

    fn entries(&self) -> &[LumpEntry] {
        &self.entries
    }

    fn read_lump(&self, entry: &LumpEntry) -> Result<&[u8]> {
        lump_bytes(&self.data, entry)
    }

    fn guess_type(&self, index: usize) -> (LumpKind, &'static str) {
        let subdir = match self.lump_type(index) {
            Some(0x40) => "palette",
            Some(0x42) => "qpic",
            Some(0x44) => "miptex",
            _ => "",
        };
        (LumpKind::Raw, subdir)
    }
}

struct PendingLump {
    name: [u8; NAME_LEN],
    data: Vec<u8>,
    lump_type: LumpType,
}

/// Collects lumps, then writes header, directory and data in that order.
#[derive(Default)]
pub struct Wad2Writer {
    lumps: Vec<PendingLump>,
}

impl Wad2Writer {
    pub fn new() -> Wad2Writer {
        Wad2Writer::default()
    }

    pub fn len(&self) -> usize {
        self.lumps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lumps.is_empty()
    }

    pub fn add_lump(&mut self, name: &str, data: Vec<u8>, lump_type: LumpType) -> Result<()> {
        let bytes = name.as_bytes();
        if bytes.len() > NAME_LEN {
            return Err(ConvertError::InvalidName(name.to_string()));
        }
        let mut field = [0u8; NAME_LEN];
        field[..bytes.len()].copy_from_slice(bytes);
        self.lumps.push(PendingLump { name: field, data, lump_type });
        Ok(())
    }

    /// Returns the number of bytes written.
    pub fn write<W: Write>(&self, mut w: W) -> Result<u64> {
        let count = self.lumps.len();
        w.write_all(&WAD2_MAGIC)?;
        w.write_all(&(count as u32).to_le_bytes())?;
        w.write_all(&(HEADER_SIZE as u32).to_le_bytes())?;

        let mut offset = HEADER_SIZE + count * ENTRY_SIZE;
        for lump in &self.lumps {
            let size = lump.data.len() as u32;
            w.write_all(&(offset as u32).to_le_bytes())?;
            w.write_all(&size.to_le_bytes())?;
            w.write_all(&size.to_le_bytes())?;
            w.write_all(&[lump.lump_type.code(), 0, 0, 0])?;
            w.write_all(&lump.name)?;
            offset += lump.data.len();
        }
        for lump in &self.lumps {
            w.write_all(&lump.data)?;
        }
        w.flush()?;
        Ok(offset as u64)
    }
}
