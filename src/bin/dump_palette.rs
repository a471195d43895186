use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use rott2quake::picture::png::save_png;
use rott2quake::picture::{Palette, Raster};

/// Renders a 768-byte palette as a 16x16 swatch PNG, one pixel per entry.
#[derive(Parser, Debug)]
#[command(name = "dump_palette")]
struct Args {
    /// Raw palette, e.g. PAL.dat from a ROTT dump or palette.lmp
    palette: PathBuf,

    /// Output PNG
    output: PathBuf,

    /// Pixels per palette entry
    #[arg(long, default_value_t = 8)]
    cell: usize,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let bytes = fs::read(&args.palette).with_context(|| format!("failed to read {}", args.palette.display()))?;
    let palette = Palette::from_bytes(&bytes).context("not a palette")?;

    let cell = args.cell.max(1);
    let side = 16 * cell;
    let indices = (0..side * side).map(|i| (((i / side) / cell) * 16 + (i % side) / cell) as u8).collect();
    let raster = Raster::from_indices(side, side, indices)?;

    save_png(&args.output, &raster, &palette).with_context(|| format!("failed to write {}", args.output.display()))?;
    println!("{} -> {} ({}x{})", args.palette.display(), args.output.display(), side, side);
    Ok(())
}
