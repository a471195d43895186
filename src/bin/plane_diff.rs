use std::fs;

use anyhow::{bail, Context, Result};

const MAP_SIZE: usize = 128;
const PLANE_BYTES: usize = MAP_SIZE * MAP_SIZE * 2;

fn read_plane(path: &str) -> Result<Vec<u16>> {
    let data = fs::read(path).with_context(|| format!("failed to read {}", path))?;
    if data.len() != PLANE_BYTES {
        bail!("{} is {} bytes, expected a {}x{} u16 plane ({} bytes)", path, data.len(), MAP_SIZE, MAP_SIZE, PLANE_BYTES);
    }
    Ok(data.chunks_exact(2).map(|b| u16::from_le_bytes([b[0], b[1]])).collect())
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 3 {
        eprintln!("Usage: {} <plane1.bin> <plane2.bin>", args[0]);
        std::process::exit(1);
    }

    let plane1 = read_plane(&args[1])?;
    let plane2 = read_plane(&args[2])?;

    let mut diff_count = 0;
    let mut first_diffs = Vec::new();

    for (i, (&a, &b)) in plane1.iter().zip(&plane2).enumerate() {
        if a != b {
            if first_diffs.len() < 20 {
                first_diffs.push((i % MAP_SIZE, i / MAP_SIZE, a, b));
            }
            diff_count += 1;
        }
    }

    println!("Total different cells: {}", diff_count);
    println!("First {} differences:", first_diffs.len());
    for (x, y, a, b) in &first_diffs {
        println!("  ({}, {}): 0x{:04x} vs 0x{:04x}", x, y, a, b);
    }

    let nonzero1 = plane1.iter().filter(|&&v| v != 0).count();
    let nonzero2 = plane2.iter().filter(|&&v| v != 0).count();
    println!("\nNon-zero cells in first: {}", nonzero1);
    println!("Non-zero cells in second: {}", nonzero2);
    Ok(())
}
