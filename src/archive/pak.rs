//! Quake `PACK` files. Entry names carry their own directory path.

use tracing::debug;

use crate::binary::{read_magic, read_name, read_u32_le, slice};
use crate::error::{ConvertError, Result};

use super::{lump_bytes, Archive, ArchiveKind, LumpEntry, LumpKind};

const PAK_MAGIC: [u8; 4] = *b"PACK";
const ENTRY_SIZE: usize = 64;
const NAME_LEN: usize = 56;

pub struct PakArchive {
    data: Vec<u8>,
    entries: Vec<LumpEntry>,
}

impl PakArchive {
    pub fn parse(data: Vec<u8>) -> Result<PakArchive> {
        let magic = read_magic(&data, 0)?;
        if magic != PAK_MAGIC {
            return Err(ConvertError::BadMagic { format: "PACK", found: magic });
        }
        let table_offset = read_u32_le(&data, 4)? as usize;
        let table_size = read_u32_le(&data, 8)? as usize;
        slice(&data, table_offset, table_size)?;

        let count = table_size / ENTRY_SIZE;
        let mut entries = Vec::with_capacity(count);
        for i in 0..count {
            let at = table_offset + i * ENTRY_SIZE;
            entries.push(LumpEntry {
                name: read_name(&data, at, NAME_LEN)?,
                offset: read_u32_le(&data, at + NAME_LEN)? as usize,
                size: read_u32_le(&data, at + NAME_LEN + 4)? as usize,
            });
        }

        debug!(entries = entries.len(), "parsed PAK table");
        Ok(PakArchive { data, entries })
    }
}

impl Archive for PakArchive {
    fn kind(&self) -> ArchiveKind {
        ArchiveKind::QuakePak
    }

    fn entries(&self) -> &[LumpEntry] {
        &self.entries
    }

    fn read_lump(&self, entry: &LumpEntry) -> Result<&[u8]> {
        lump_bytes(&self.data, entry)
    }

    fn guess_type(&self, _index: usize) -> (LumpKind, &'static str) {
        (LumpKind::Raw, "")
    }
}
