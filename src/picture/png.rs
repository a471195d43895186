use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::Result;

use super::{Palette, Raster};

/// Encode a raster as PNG. Fully opaque rasters are written indexed with
/// the palette embedded, anything with holes as RGBA.
pub fn write_png<W: Write>(w: W, raster: &Raster, palette: &Palette) -> Result<()> {
    let mut encoder = png::Encoder::new(w, raster.width as u32, raster.height as u32);
    encoder.set_depth(png::BitDepth::Eight);
    encoder.set_compression(png::Compression::Default);

    if raster.fully_opaque() {
        encoder.set_color(png::ColorType::Indexed);
        encoder.set_palette(palette.to_bytes());
        let mut writer = encoder.write_header()?;
        writer.write_image_data(raster.indices())?;
    } else {
        encoder.set_color(png::ColorType::Rgba);
        let mut writer = encoder.write_header()?;
        writer.write_image_data(&raster.to_rgba(palette))?;
    }
    Ok(())
}

pub fn save_png(path: &Path, raster: &Raster, palette: &Palette) -> Result<()> {
    let file = File::create(path)?;
    write_png(BufWriter::new(file), raster, palette)
}
