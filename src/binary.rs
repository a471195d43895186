//! Little-endian field access over in-memory lump and archive buffers.

use crate::error::{ConvertError, Result};

fn field<const N: usize>(data: &[u8], offset: usize) -> Result<[u8; N]> {
    match data.get(offset..offset + N) {
        Some(bytes) => {
            let mut out = [0u8; N];
            out.copy_from_slice(bytes);
            Ok(out)
        }
        None => Err(ConvertError::Truncated {
            offset,
            needed: offset + N - data.len().min(offset + N),
        }),
    }
}

pub fn read_u8(data: &[u8], offset: usize) -> Result<u8> {
    Ok(field::<1>(data, offset)?[0])
}

pub fn read_u16_le(data: &[u8], offset: usize) -> Result<u16> {
    Ok(u16::from_le_bytes(field(data, offset)?))
}

pub fn read_i16_le(data: &[u8], offset: usize) -> Result<i16> {
    Ok(i16::from_le_bytes(field(data, offset)?))
}

pub fn read_u32_le(data: &[u8], offset: usize) -> Result<u32> {
    Ok(u32::from_le_bytes(field(data, offset)?))
}

pub fn read_magic(data: &[u8], offset: usize) -> Result<[u8; 4]> {
    field(data, offset)
}

/// Borrow `len` bytes starting at `offset`.
pub fn slice(data: &[u8], offset: usize, len: usize) -> Result<&[u8]> {
    data.get(offset..offset.saturating_add(len)).ok_or(ConvertError::Truncated {
        offset,
        needed: offset.saturating_add(len).saturating_sub(data.len()),
    })
}

/// Fixed-width NUL padded name field, trimmed.
pub fn read_name(data: &[u8], offset: usize, len: usize) -> Result<String> {
    let raw = slice(data, offset, len)?;
    let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
    Ok(String::from_utf8_lossy(&raw[..end]).trim().to_string())
}

/// Sequential reader used by the run-based codecs.
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn at(data: &'a [u8], pos: usize) -> Self {
        Self { data, pos }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn u8(&mut self) -> Result<u8> {
        let value = read_u8(self.data, self.pos)?;
        self.pos += 1;
        Ok(value)
    }

    pub fn u16(&mut self) -> Result<u16> {
        let value = read_u16_le(self.data, self.pos)?;
        self.pos += 2;
        Ok(value)
    }

    pub fn bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let out = slice(self.data, self.pos, len)?;
        self.pos += len;
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_little_endian_fields() {
        let data = [0x34, 0x12, 0x78, 0x56, 0xff, 0xff];
        assert_eq!(read_u16_le(&data, 0).unwrap(), 0x1234);
        assert_eq!(read_u32_le(&data, 0).unwrap(), 0x5678_1234);
        assert_eq!(read_i16_le(&data, 4).unwrap(), -1);
    }

    #[test]
    fn short_reads_are_truncated_errors() {
        let data = [1u8, 2, 3];
        match read_u32_le(&data, 1) {
            Err(ConvertError::Truncated { offset, needed }) => {
                assert_eq!(offset, 1);
                assert_eq!(needed, 2);
            }
            other => panic!("expected truncation, got {:?}", other),
        }
    }

    #[test]
    fn names_stop_at_nul() {
        let mut data = [0u8; 8];
        data[..4].copy_from_slice(b"WALL");
        assert_eq!(read_name(&data, 0, 8).unwrap(), "WALL");
    }
}
