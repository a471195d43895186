//! Indexed rasters, palettes and the picture codecs built on them.

pub mod decode;
pub mod mip;
pub mod png;

use crate::error::{ConvertError, Result};

pub use decode::{decode_flat, decode_lbm, decode_lpic, decode_patch, decode_pic, decode_translucent_patch};
pub use mip::{encode_mip_texture, encode_qpic};

pub const PALETTE_BYTES: usize = 768;

/// 256 RGB entries.
#[derive(Clone, PartialEq, Eq)]
pub struct Palette {
    colors: [[u8; 3]; 256],
}

impl Palette {
    pub fn from_bytes(data: &[u8]) -> Result<Palette> {
        if data.len() < PALETTE_BYTES {
            return Err(ConvertError::decode(
                "palette",
                format!("expected {} bytes, got {}", PALETTE_BYTES, data.len()),
            ));
        }
        let mut colors = [[0u8; 3]; 256];
        for (i, rgb) in data[..PALETTE_BYTES].chunks_exact(3).enumerate() {
            colors[i] = [rgb[0], rgb[1], rgb[2]];
        }
        Ok(Palette { colors })
    }

    pub fn rgb(&self, index: u8) -> [u8; 3] {
        self.colors[index as usize]
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        self.colors.iter().flatten().copied().collect()
    }

    /// Closest entry by squared RGB distance; ties go to the lower index.
    pub fn nearest(&self, rgb: [u8; 3], exclude: Option<u8>) -> u8 {
        let mut best = 0u8;
        let mut best_dist = u32::MAX;
        for (i, c) in self.colors.iter().enumerate() {
            if Some(i as u8) == exclude {
                continue;
            }
            let dist: u32 = c
                .iter()
                .zip(rgb.iter())
                .map(|(&a, &b)| {
                    let d = a as i32 - b as i32;
                    (d * d) as u32
                })
                .sum();
            if dist < best_dist {
                best_dist = dist;
                best = i as u8;
                if dist == 0 {
                    break;
                }
            }
        }
        best
    }
}

impl std::fmt::Debug for Palette {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Palette({:?} .. {:?})", self.colors[0], self.colors[255])
    }
}

/// Palette indices plus a per-pixel opacity mask, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    pub width: usize,
    pub height: usize,
    indices: Vec<u8>,
    opaque: Vec<bool>,
}

impl Raster {
    /// A raster with every pixel transparent.
    pub fn transparent(width: usize, height: usize) -> Raster {
        Raster { width, height, indices: vec![0; width * height], opaque: vec![false; width * height] }
    }

    /// A fully opaque raster over existing indices.
    pub fn from_indices(width: usize, height: usize, indices: Vec<u8>) -> Result<Raster> {
        if indices.len() != width * height {
            return Err(ConvertError::decode(
                "raster",
                format!("{}x{} needs {} pixels, got {}", width, height, width * height, indices.len()),
            ));
        }
        Ok(Raster { width, height, opaque: vec![true; indices.len()], indices })
    }

    pub fn index(&self, x: usize, y: usize) -> u8 {
        self.indices[y * self.width + x]
    }

    pub fn is_opaque(&self, x: usize, y: usize) -> bool {
        self.opaque[y * self.width + x]
    }

    pub fn set(&mut self, x: usize, y: usize, index: u8) {
        let i = y * self.width + x;
        self.indices[i] = index;
        self.opaque[i] = true;
    }

    pub fn indices(&self) -> &[u8] {
        &self.indices
    }

    pub fn fully_opaque(&self) -> bool {
        self.opaque.iter().all(|&o| o)
    }

    pub fn to_rgba(&self, palette: &Palette) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.indices.len() * 4);
        for (&index, &opaque) in self.indices.iter().zip(&self.opaque) {
            let [r, g, b] = palette.rgb(index);
            out.extend_from_slice(&[r, g, b, if opaque { 255 } else { 0 }]);
        }
        out
    }

    /// Grow both dimensions up to a multiple of `alignment`. The picture
    /// stays in the lower right; the added rows and columns are transparent.
    pub fn align(&self, alignment: usize) -> Raster {
        let width = self.width.div_ceil(alignment) * alignment;
        let height = self.height.div_ceil(alignment) * alignment;
        if width == self.width && height == self.height {
            return self.clone();
        }

        let (dx, dy) = (width - self.width, height - self.height);
        let mut out = Raster::transparent(width, height);
        for y in 0..self.height {
            for x in 0..self.width {
                let src = y * self.width + x;
                let dst = (y + dy) * width + x + dx;
                out.indices[dst] = self.indices[src];
                out.opaque[dst] = self.opaque[src];
            }
        }
        out
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Grey ramp: entry i is (i, i, i).
    pub fn grey_palette() -> Palette {
        let bytes: Vec<u8> = (0..=255u8).flat_map(|i| [i, i, i]).collect();
        Palette::from_bytes(&bytes).unwrap()
    }

    #[test]
    fn palette_needs_768_bytes() {
        assert!(Palette::from_bytes(&[0u8; 767]).is_err());
        assert_eq!(grey_palette().to_bytes().len(), PALETTE_BYTES);
    }

    #[test]
    fn nearest_skips_excluded_entry() {
        let palette = grey_palette();
        assert_eq!(palette.nearest([100, 100, 100], None), 100);
        assert_eq!(palette.nearest([255, 250, 255], None), 253);
        assert_eq!(palette.nearest([255, 255, 255], Some(255)), 254);
    }

    #[test]
    fn align_keeps_drawing_lower_right() {
        let raster = Raster::from_indices(3, 2, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let aligned = raster.align(4);
        assert_eq!((aligned.width, aligned.height), (4, 4));
        assert!(!aligned.is_opaque(0, 0));
        assert!(!aligned.is_opaque(0, 3));
        assert_eq!(aligned.index(1, 2), 1);
        assert_eq!(aligned.index(3, 3), 6);
        assert!(aligned.is_opaque(3, 3));
    }

    #[test]
    fn rgba_marks_transparency() {
        let mut raster = Raster::transparent(2, 1);
        raster.set(1, 0, 9);
        let rgba = raster.to_rgba(&grey_palette());
        assert_eq!(rgba, vec![0, 0, 0, 0, 9, 9, 9, 255]);
    }
}
