//! Quake texture encoders: mip textures for walls and qpics for 2D art.

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::error::{ConvertError, Result};

use super::{Palette, Raster};

pub const MIP_HEADER_SIZE: usize = 40;
pub const MIP_NAME_LEN: usize = 16;
const MIP_LEVELS: [usize; 4] = [1, 2, 4, 8];
const ALPHA_CUTOFF: u8 = 128;

/// Masked textures are named with a leading `{` and reserve index 255.
pub fn is_masked_name(name: &str) -> bool {
    name.starts_with('{')
}

fn reserved_index(masked: bool) -> u8 {
    if masked {
        255
    } else {
        0
    }
}

/// Re-index a raster into the target palette without resampling.
fn quantize_direct(raster: &Raster, source: &Palette, target: &Palette, masked: bool) -> Vec<u8> {
    let exclude = masked.then_some(255);
    let mut table = [0u8; 256];
    for (i, slot) in table.iter_mut().enumerate() {
        *slot = target.nearest(source.rgb(i as u8), exclude);
    }

    let mut out = Vec::with_capacity(raster.width * raster.height);
    for y in 0..raster.height {
        for x in 0..raster.width {
            out.push(if raster.is_opaque(x, y) {
                table[raster.index(x, y) as usize]
            } else {
                reserved_index(masked)
            });
        }
    }
    out
}

fn quantize_rgba(image: &RgbaImage, target: &Palette, masked: bool) -> Vec<u8> {
    let exclude = masked.then_some(255);
    image
        .pixels()
        .map(|p| {
            if p[3] < ALPHA_CUTOFF {
                reserved_index(masked)
            } else {
                target.nearest([p[0], p[1], p[2]], exclude)
            }
        })
        .collect()
}

/// Scale colour by alpha so transparent texels carry no colour into the
/// resampled levels.
fn premultiply(image: &mut RgbaImage) {
    for p in image.pixels_mut() {
        let alpha = p[3] as u32;
        for c in 0..3 {
            p[c] = ((p[c] as u32 * alpha + 127) / 255) as u8;
        }
    }
}

fn unpremultiply(image: &mut RgbaImage) {
    for p in image.pixels_mut() {
        let alpha = p[3] as u32;
        if alpha == 0 {
            continue;
        }
        for c in 0..3 {
            p[c] = ((p[c] as u32 * 255 + alpha / 2) / alpha).min(255) as u8;
        }
    }
}

fn name_field(name: &str) -> Result<[u8; MIP_NAME_LEN]> {
    let bytes = name.as_bytes();
    if bytes.len() > MIP_NAME_LEN {
        return Err(ConvertError::InvalidName(name.to_string()));
    }
    let mut field = [0u8; MIP_NAME_LEN];
    field[..bytes.len()].copy_from_slice(bytes);
    Ok(field)
}

/// Pack a raster as a Quake mip texture: the 40-byte header followed by
/// the full, half, quarter and eighth size pixel blocks.
pub fn encode_mip_texture(raster: &Raster, source: &Palette, target: &Palette, name: &str) -> Result<Vec<u8>> {
    let name_bytes = name_field(name)?;
    let masked = is_masked_name(name);
    let (width, height) = (raster.width, raster.height);

    let mut rgba = RgbaImage::from_raw(width as u32, height as u32, raster.to_rgba(source))
        .ok_or_else(|| ConvertError::decode("mip texture", format!("bad raster size {}x{}", width, height)))?;
    premultiply(&mut rgba);

    let mut blocks = Vec::with_capacity(MIP_LEVELS.len());
    for factor in MIP_LEVELS {
        if factor == 1 {
            blocks.push(quantize_direct(raster, source, target, masked));
            continue;
        }
        let w = (width / factor).max(1) as u32;
        let h = (height / factor).max(1) as u32;
        let mut scaled = imageops::resize(&rgba, w, h, FilterType::Lanczos3);
        unpremultiply(&mut scaled);
        blocks.push(quantize_rgba(&scaled, target, masked));
    }

    let mut out = Vec::with_capacity(MIP_HEADER_SIZE + blocks.iter().map(Vec::len).sum::<usize>());
    out.extend_from_slice(&name_bytes);
    out.extend_from_slice(&(width as u32).to_le_bytes());
    out.extend_from_slice(&(height as u32).to_le_bytes());
    let mut offset = MIP_HEADER_SIZE;
    for block in &blocks {
        out.extend_from_slice(&(offset as u32).to_le_bytes());
        offset += block.len();
    }
    for block in &blocks {
        out.extend_from_slice(block);
    }
    Ok(out)
}

/// Quake `qpic`: u32 width, u32 height, then raw indices. Transparent
/// pixels become 255.
pub fn encode_qpic(raster: &Raster, source: &Palette, target: &Palette) -> Vec<u8> {
    let mut out = Vec::with_capacity(8 + raster.width * raster.height);
    out.extend_from_slice(&(raster.width as u32).to_le_bytes());
    out.extend_from_slice(&(raster.height as u32).to_le_bytes());
    out.extend(quantize_direct(raster, source, target, true));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary::read_u32_le;
    use crate::picture::tests::grey_palette;

    #[test]
    fn mip_layout_for_64x64() {
        let palette = grey_palette();
        let raster = Raster::from_indices(64, 64, (0..64 * 64).map(|i| (i % 200) as u8).collect()).unwrap();
        let data = encode_mip_texture(&raster, &palette, &palette, "WALL1").unwrap();

        assert_eq!(data.len(), MIP_HEADER_SIZE + 4096 + 1024 + 256 + 64);
        assert_eq!(&data[..5], b"WALL1");
        assert!(data[5..16].iter().all(|&b| b == 0));
        assert_eq!(read_u32_le(&data, 16).unwrap(), 64);
        assert_eq!(read_u32_le(&data, 20).unwrap(), 64);
        let offsets: Vec<u32> = (0..4).map(|i| read_u32_le(&data, 24 + i * 4).unwrap()).collect();
        assert_eq!(offsets, vec![40, 40 + 4096, 40 + 5120, 40 + 5376]);
        // identical palettes map the full-size level one to one
        assert_eq!(&data[40..40 + 64], &raster.indices()[..64]);
    }

    #[test]
    fn masked_texture_reserves_255() {
        let palette = grey_palette();
        let mut raster = Raster::transparent(16, 16);
        raster.set(0, 0, 255);
        let data = encode_mip_texture(&raster, &palette, &palette, "{MASKED1").unwrap();
        let level0 = &data[MIP_HEADER_SIZE..MIP_HEADER_SIZE + 256];
        assert_eq!(level0[0], 254);
        assert!(level0[1..].iter().all(|&b| b == 255));
    }

    #[test]
    fn masked_edges_keep_their_colour() {
        let palette = grey_palette();
        let mut raster = Raster::transparent(32, 32);
        for y in 0..32 {
            for x in 0..16 {
                raster.set(x, y, 200);
            }
        }
        let data = encode_mip_texture(&raster, &palette, &palette, "{HALF").unwrap();
        // levels 1..3 are 16x16, 8x8 and 4x4
        let reduced = &data[MIP_HEADER_SIZE + 1024..];
        assert_eq!(reduced.len(), 256 + 64 + 16);
        let opaque: Vec<u8> = reduced.iter().copied().filter(|&b| b != 255).collect();
        assert!(!opaque.is_empty());
        assert!(opaque.iter().all(|&b| (176..=232).contains(&b)), "{:?}", opaque);
    }

    #[test]
    fn unmasked_transparency_uses_index_0() {
        let palette = grey_palette();
        let raster = Raster::transparent(8, 8);
        let data = encode_mip_texture(&raster, &palette, &palette, "SKY1").unwrap();
        assert!(data[MIP_HEADER_SIZE..].iter().all(|&b| b == 0));
    }

    #[test]
    fn long_names_are_rejected() {
        let palette = grey_palette();
        let raster = Raster::transparent(8, 8);
        let result = encode_mip_texture(&raster, &palette, &palette, "THIS_NAME_IS_TOO_LONG");
        assert!(matches!(result, Err(ConvertError::InvalidName(_))));
    }

    #[test]
    fn qpic_is_header_plus_pixels() {
        let palette = grey_palette();
        let raster = Raster::from_indices(2, 1, vec![3, 4]).unwrap();
        let data = encode_qpic(&raster, &palette, &palette);
        assert_eq!(data, vec![2, 0, 0, 0, 1, 0, 0, 0, 3, 4]);
    }
}
