//! Decoders for the source game's picture lumps.

use crate::binary::{read_i16_le, read_u16_le, read_u8, slice, Cursor};
use crate::error::{ConvertError, Result};

use super::{Palette, Raster, PALETTE_BYTES};

const PATCH_HEADER_SIZE: usize = 10;
const TRANSLUCENT_PATCH_HEADER_SIZE: usize = 12;
const LPIC_HEADER_SIZE: usize = 8;
const LPIC_SIZE: usize = 128;
const POST_END: u8 = 255;

/// A picture that runs past the end of its lump is malformed, not a short
/// archive read.
fn truncated_as_decode(what: &'static str) -> impl Fn(ConvertError) -> ConvertError {
    move |err| match err {
        ConvertError::Truncated { offset, needed } => {
            ConvertError::decode(what, format!("lump ends at offset {} ({} more bytes needed)", offset, needed))
        }
        other => other,
    }
}

/// Plain row-major indices: walls are 64x64, skies 256x200.
pub fn decode_flat(data: &[u8], width: usize, height: usize) -> Result<Raster> {
    let pixels = slice(data, 0, width * height)
        .map_err(|_| ConvertError::decode("flat", format!("{} bytes is short of {}x{}", data.len(), width, height)))?;
    Raster::from_indices(width, height, pixels.to_vec())
}

/// VGA planar picture: u8 width, u8 height, then four planes. Plane `p`
/// holds every fourth column starting at `p`.
pub fn decode_pic(data: &[u8]) -> Result<Raster> {
    let plane_width = read_u8(data, 0).map_err(truncated_as_decode("pic"))? as usize;
    let height = read_u8(data, 1).map_err(truncated_as_decode("pic"))? as usize;
    let plane_size = plane_width * height;
    let planes = slice(data, 2, plane_size * 4)
        .map_err(|_| ConvertError::decode("pic", format!("{} planes of {}x{} do not fit", 4, plane_width, height)))?;

    let width = plane_width * 4;
    let mut indices = vec![0u8; width * height];
    for (p, plane) in planes.chunks_exact(plane_size.max(1)).enumerate().take(4) {
        for y in 0..height {
            for j in 0..plane_width {
                indices[y * width + j * 4 + p] = plane[y * plane_width + j];
            }
        }
    }
    Raster::from_indices(width, height, indices)
}

/// Floor and ceiling pictures: 8-byte header then a 128x128 raster.
pub fn decode_lpic(data: &[u8]) -> Result<Raster> {
    let pixels = slice(data, LPIC_HEADER_SIZE, LPIC_SIZE * LPIC_SIZE)
        .map_err(|_| ConvertError::decode("lpic", format!("{} bytes is too short", data.len())))?;
    Raster::from_indices(LPIC_SIZE, LPIC_SIZE, pixels.to_vec())
}

pub fn decode_patch(data: &[u8]) -> Result<Raster> {
    decode_posts(data, PATCH_HEADER_SIZE, false).map_err(truncated_as_decode("patch"))
}

/// Like [`decode_patch`], with a translucency word in the header and an
/// extra pad byte ahead of each post's pixels.
pub fn decode_translucent_patch(data: &[u8]) -> Result<Raster> {
    decode_posts(data, TRANSLUCENT_PATCH_HEADER_SIZE, true).map_err(truncated_as_decode("translucent patch"))
}

fn decode_posts(data: &[u8], header_size: usize, translucent: bool) -> Result<Raster> {
    let what = if translucent { "translucent patch" } else { "patch" };
    let width = read_i16_le(data, 2)?;
    let height = read_i16_le(data, 4)?;
    if width <= 0 || height <= 0 {
        return Err(ConvertError::decode(what, format!("bad dimensions {}x{}", width, height)));
    }
    let (width, height) = (width as usize, height as usize);

    let mut raster = Raster::transparent(width, height);
    for column in 0..width {
        let offset = read_u16_le(data, header_size + column * 2)? as usize;
        let mut cursor = Cursor::at(data, offset);
        loop {
            let row_start = cursor.u8()?;
            if row_start == POST_END {
                break;
            }
            let length = cursor.u8()? as usize;
            if translucent {
                cursor.u8()?;
            }
            let pixels = cursor.bytes(length)?;
            cursor.u8()?;

            let row_start = row_start as usize;
            if row_start + length > height {
                return Err(ConvertError::decode(
                    what,
                    format!("post at row {} with {} pixels overruns height {}", row_start, length, height),
                ));
            }
            for (i, &index) in pixels.iter().enumerate() {
                raster.set(column, row_start + i, index);
            }
        }
    }
    Ok(raster)
}

/// Run-length encoded picture carrying its own palette.
pub fn decode_lbm(data: &[u8]) -> Result<(Raster, Palette)> {
    read_lbm(data).map_err(truncated_as_decode("lbm"))
}

fn read_lbm(data: &[u8]) -> Result<(Raster, Palette)> {
    let width = read_u16_le(data, 0)? as usize;
    let height = read_u16_le(data, 2)? as usize;
    let palette = Palette::from_bytes(slice(data, 4, PALETTE_BYTES)?)?;

    let mut cursor = Cursor::at(data, 4 + PALETTE_BYTES);
    let mut indices = vec![0u8; width * height];
    for y in 0..height {
        let row = &mut indices[y * width..(y + 1) * width];
        let mut x = 0;
        while x < width {
            let code = cursor.u8()?;
            let filled = match code {
                0x80 => continue,
                c if c > 0x80 => {
                    let count = (c ^ 0xff) as usize + 2;
                    let value = cursor.u8()?;
                    fill(row, x, count)?.fill(value);
                    count
                }
                c => {
                    let count = c as usize + 1;
                    let values = cursor.bytes(count)?;
                    fill(row, x, count)?.copy_from_slice(values);
                    count
                }
            };
            x += filled;
        }
    }
    Ok((Raster::from_indices(width, height, indices)?, palette))
}

fn fill(row: &mut [u8], x: usize, count: usize) -> Result<&mut [u8]> {
    let width = row.len();
    row.get_mut(x..x + count)
        .ok_or_else(|| ConvertError::decode("lbm", format!("run of {} at column {} overruns width {}", count, x, width)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patch(width: i16, height: i16, columns: &[Vec<u8>], translucent: bool) -> Vec<u8> {
        let header = if translucent { TRANSLUCENT_PATCH_HEADER_SIZE } else { PATCH_HEADER_SIZE };
        let mut data = Vec::new();
        for field in [width, width, height, 0, 0] {
            data.extend_from_slice(&field.to_le_bytes());
        }
        if translucent {
            data.extend_from_slice(&0i16.to_le_bytes());
        }
        let mut offset = header + columns.len() * 2;
        for column in columns {
            data.extend_from_slice(&(offset as u16).to_le_bytes());
            offset += column.len();
        }
        for column in columns {
            data.extend_from_slice(column);
        }
        data
    }

    #[test]
    fn flat_is_row_major() {
        let data: Vec<u8> = (0..6).collect();
        let raster = decode_flat(&data, 3, 2).unwrap();
        assert_eq!(raster.index(2, 0), 2);
        assert_eq!(raster.index(0, 1), 3);
        assert!(decode_flat(&data, 4, 2).is_err());
    }

    #[test]
    fn pic_interleaves_planes() {
        let mut data = vec![1u8, 1];
        data.extend_from_slice(&[10, 11, 12, 13]);
        let raster = decode_pic(&data).unwrap();
        assert_eq!(raster.width, 4);
        assert_eq!(raster.indices(), &[10, 11, 12, 13]);

        let mut data = vec![2u8, 1];
        data.extend_from_slice(&[0, 4, 1, 5, 2, 6, 3, 7]);
        let raster = decode_pic(&data).unwrap();
        assert_eq!(raster.indices(), &[0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn single_pixel_patch() {
        let data = patch(1, 1, &[vec![0, 1, 42, 0, 255]], false);
        let raster = decode_patch(&data).unwrap();
        assert_eq!(raster.index(0, 0), 42);
        assert!(raster.fully_opaque());
    }

    #[test]
    fn patch_gaps_are_transparent() {
        let data = patch(2, 4, &[vec![1, 2, 7, 8, 0, 255], vec![255]], false);
        let raster = decode_patch(&data).unwrap();
        assert!(!raster.is_opaque(0, 0));
        assert_eq!(raster.index(0, 1), 7);
        assert_eq!(raster.index(0, 2), 8);
        assert!(!raster.is_opaque(0, 3));
        assert!(!raster.is_opaque(1, 1));
    }

    #[test]
    fn translucent_patch_skips_leading_pad() {
        let data = patch(1, 2, &[vec![0, 2, 0, 5, 6, 0, 255]], true);
        let raster = decode_translucent_patch(&data).unwrap();
        assert_eq!(raster.indices(), &[5, 6]);
    }

    #[test]
    fn overrunning_post_is_a_decode_error() {
        let data = patch(1, 1, &[vec![0, 3, 1, 2, 3, 0, 255]], false);
        assert!(matches!(decode_patch(&data), Err(ConvertError::Decode { .. })));
    }

    #[test]
    fn short_lumps_are_decode_errors() {
        // post body runs past the end
        let data = patch(1, 1, &[vec![0, 1]], false);
        assert!(matches!(decode_patch(&data), Err(ConvertError::Decode { what: "patch", .. })));
        // column table runs past the end
        let mut data = patch(3, 1, &[vec![255]], true);
        data.truncate(TRANSLUCENT_PATCH_HEADER_SIZE + 3);
        assert!(matches!(decode_translucent_patch(&data), Err(ConvertError::Decode { what: "translucent patch", .. })));
        assert!(matches!(decode_patch(&[1, 0]), Err(ConvertError::Decode { .. })));
        assert!(matches!(decode_pic(&[]), Err(ConvertError::Decode { what: "pic", .. })));
        assert!(matches!(decode_lbm(&[4, 0, 1, 0, 7]), Err(ConvertError::Decode { what: "lbm", .. })));
    }

    #[test]
    fn lpic_skips_header() {
        let mut data = vec![0u8; LPIC_HEADER_SIZE];
        data.extend((0..LPIC_SIZE * LPIC_SIZE).map(|i| (i % 256) as u8));
        let raster = decode_lpic(&data).unwrap();
        assert_eq!(raster.index(5, 1), 133);
        assert!(decode_lpic(&data[..100]).is_err());
    }

    #[test]
    fn lbm_runs_and_literals() {
        let mut data = Vec::new();
        data.extend_from_slice(&4u16.to_le_bytes());
        data.extend_from_slice(&1u16.to_le_bytes());
        data.extend(std::iter::repeat(7u8).take(PALETTE_BYTES));
        // run of 3 nines, then one literal
        data.extend_from_slice(&[0xfe, 9, 0x00, 4]);
        let (raster, palette) = decode_lbm(&data).unwrap();
        assert_eq!(raster.indices(), &[9, 9, 9, 4]);
        assert_eq!(palette.rgb(3), [7, 7, 7]);
    }
}
