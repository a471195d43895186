use std::ffi::OsString;
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use rott2quake::analysis::tiles::{animated_frame, structure_walls};
use rott2quake::analysis::{analyze, write_html_dump, TargetGame};
use rott2quake::archive::{
    open_archive, palette_from_archive, Archive, ArchiveKind, LumpEntry, LumpKind, LumpType, Wad2Writer,
};
use rott2quake::level::RtlArchive;
use rott2quake::picture::png::save_png;
use rott2quake::picture::{
    decode_flat, decode_lbm, decode_lpic, decode_patch, decode_pic, decode_translucent_patch, encode_mip_texture,
    encode_qpic, Palette, Raster,
};
use rott2quake::quakemap::{convert_level, ConvertOptions};
use rott2quake::ConvertError;

const TEXTURE_ALIGNMENT: usize = 64;

/// Rips Rise of the Triad assets and converts its levels to Quake maps.
#[derive(Parser, Debug)]
#[command(name = "rott2quake", version)]
struct Cli {
    /// Lump archive: a ROTT IWAD unless --quake or --pak is given
    archive: Option<PathBuf>,

    /// Destination directory for --dump
    dest: Option<PathBuf>,

    /// RTL level archive
    #[arg(long)]
    rtl: Option<PathBuf>,

    /// Write text and HTML dumps, raw planes and .map files for every level here
    #[arg(long)]
    rtl_map_outdir: Option<PathBuf>,

    /// Scale generated maps by this factor
    #[arg(long, default_value_t = 1.0)]
    rtl_map_scale: f64,

    /// Generate maps for Dusk rather than Quake
    #[arg(long)]
    dusk: bool,

    /// Mirror textures on north and west faces so they wrap around corners
    #[arg(long)]
    wrap: bool,

    /// Print RTL metadata (requires --rtl)
    #[arg(long, requires = "rtl")]
    print_rtl_info: bool,

    /// Print the lump directory
    #[arg(long)]
    list: bool,

    /// Dump lump data to the destination directory
    #[arg(long)]
    dump: bool,

    /// Also write each lump's raw bytes next to the rendered file
    #[arg(long)]
    dump_raw: bool,

    /// Collect ripped textures into this Quake WAD2 (with --dump); also
    /// named in the worldspawn of generated maps
    #[arg(long)]
    wad_out: Option<PathBuf>,

    /// Dump only this lump
    #[arg(long)]
    lname: Option<String>,

    /// Force the lump type (only with --lname)
    #[arg(long, requires = "lname")]
    ltype: Option<LumpKind>,

    /// The archive is a Quake WAD2
    #[arg(long, conflicts_with = "pak")]
    quake: bool,

    /// The archive is a Quake PAK
    #[arg(long)]
    pak: bool,

    /// 768-byte palette exported textures are quantized against
    #[arg(long)]
    target_palette: Option<PathBuf>,
}

impl Cli {
    fn archive_kind(&self) -> ArchiveKind {
        if self.quake {
            ArchiveKind::QuakeWad
        } else if self.pak {
            ArchiveKind::QuakePak
        } else {
            ArchiveKind::RottWad
        }
    }

    fn convert_options(&self) -> ConvertOptions {
        ConvertOptions {
            scale: self.rtl_map_scale,
            target: if self.dusk { TargetGame::Dusk } else { TargetGame::Quake },
            wrap: self.wrap,
            wads: self.wad_out.iter().map(|p| p.display().to_string()).collect(),
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rott2quake=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn convert_maps(rtl: &RtlArchive, outdir: &Path, options: &ConvertOptions) -> Result<()> {
    fs::create_dir_all(outdir).with_context(|| format!("could not create {}", outdir.display()))?;
    info!("converting maps for {:?}", options.target);

    for level in &rtl.levels {
        let number = level.slot + 1;
        info!("generating map{:03} ({})", number, level.name);

        let dump_path = outdir.join(format!("map{:03}.txt", number));
        fs::write(&dump_path, level.structural_dump())
            .with_context(|| format!("could not write map to {}", dump_path.display()))?;
        level
            .write_plane_dumps(outdir)
            .with_context(|| format!("could not write raw planes for map{:03}", number))?;

        let analyzed = analyze(level);
        write_html_dump(level, &analyzed.tiles, outdir)
            .with_context(|| format!("could not write html dump for map{:03}", number))?;
        let map = convert_level(level, &analyzed, options);
        let map_path = outdir.join(format!("map{:03}.map", number));
        fs::write(&map_path, map.render())
            .with_context(|| format!("could not write quake map to {}", map_path.display()))?;
    }
    Ok(())
}

fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut name = OsString::from(path);
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// Decoded picture plus its own palette, if the format carries one.
type Picture = (Raster, Option<Palette>);

fn decode_picture(data: &[u8], kind: LumpKind) -> rott2quake::Result<Option<Picture>> {
    let raster = match kind {
        LumpKind::Wall => decode_flat(data, 64, 64)?,
        LumpKind::Sky => decode_flat(data, 256, 200)?,
        LumpKind::Patch => decode_patch(data)?,
        LumpKind::TranslucentPatch => decode_translucent_patch(data)?,
        LumpKind::Lpic => decode_lpic(data)?,
        LumpKind::Pic => decode_pic(data)?,
        LumpKind::Lbm => {
            let (raster, palette) = decode_lbm(data)?;
            return Ok(Some((raster, Some(palette))));
        }
        LumpKind::Raw | LumpKind::Midi => return Ok(None),
    };
    Ok(Some((raster, None)))
}

/// Patches only make it into the WAD when a masked wall or platform
/// draws with them.
fn is_structure_patch(name: &str) -> bool {
    structure_walls().any(|wall| name == wall.side || name == wall.above || name == wall.middle)
}

struct Dumper<'a> {
    archive: &'a dyn Archive,
    dest: &'a Path,
    source: Option<Palette>,
    target: Option<Palette>,
    wad: Option<Wad2Writer>,
    dump_raw: bool,
}

impl Dumper<'_> {
    fn dump(&mut self, index: usize, entry: &LumpEntry, forced: Option<LumpKind>) -> Result<()> {
        let (guessed, subdir) = self.archive.guess_type(index);
        let kind = forced.unwrap_or(guessed);
        let base = if subdir.is_empty() { self.dest.join(&entry.name) } else { self.dest.join(subdir).join(&entry.name) };
        let path = append_extension(&base, kind.extension());
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("could not create folder for {}", path.display()))?;
        }

        let data = self.archive.read_lump(entry).with_context(|| format!("could not read lump {}", entry.name))?;
        debug!("dumping {} as {}", path.display(), kind);

        let picture = match self.render(data, kind) {
            Ok(Some((raster, own_palette))) => {
                let palette = own_palette.as_ref().or(self.source.as_ref());
                if let Some(palette) = palette {
                    save_png(&path, &raster, palette).with_context(|| format!("could not write {}", path.display()))?;
                }
                Some(raster)
            }
            Ok(None) => {
                fs::write(&path, data).with_context(|| format!("could not write {}", path.display()))?;
                None
            }
            Err(err) => {
                let fallback = append_extension(&base, "dat");
                warn!("could not decode {} as {} ({}), writing raw to {}", entry.name, kind, err, fallback.display());
                fs::write(&fallback, data).with_context(|| format!("could not write {}", fallback.display()))?;
                None
            }
        };

        if self.dump_raw {
            let raw = append_extension(&path, "raw");
            fs::write(&raw, data).with_context(|| format!("could not write {}", raw.display()))?;
        }

        if self.wad.is_some() {
            if let Err(err) = self.export(entry, kind, data, picture.as_ref()) {
                warn!("could not add {} to the texture wad: {}", entry.name, err);
            }
        }
        Ok(())
    }

    /// `None` for lumps that are copied through unchanged.
    fn render(&self, data: &[u8], kind: LumpKind) -> rott2quake::Result<Option<Picture>> {
        let picture = decode_picture(data, kind)?;
        if let Some((_, None)) = &picture {
            if self.source.is_none() {
                return Err(ConvertError::decode("picture", "archive has no palette"));
            }
        }
        Ok(picture)
    }

    fn export(&mut self, entry: &LumpEntry, kind: LumpKind, data: &[u8], raster: Option<&Raster>) -> rott2quake::Result<()> {
        let (Some(wad), Some(source)) = (self.wad.as_mut(), self.source.as_ref()) else {
            return Ok(());
        };
        let target = self.target.as_ref().unwrap_or(source);
        let name = entry.name.as_str();

        if name == self.archive.kind().palette_lump() {
            let bytes = if self.target.is_some() { target.to_bytes() } else { Palette::from_bytes(data)?.to_bytes() };
            return wad.add_lump("PALETTE", bytes, LumpType::Raw);
        }
        let Some(raster) = raster else {
            return Ok(());
        };

        match kind {
            LumpKind::Sky | LumpKind::Lpic => {
                wad.add_lump(name, encode_mip_texture(raster, source, target, name)?, LumpType::MipTex)
            }
            LumpKind::Pic => wad.add_lump(name, encode_qpic(raster, source, target), LumpType::QPic),
            LumpKind::Patch if !is_structure_patch(name) => Ok(()),
            LumpKind::Patch | LumpKind::TranslucentPatch => {
                let masked = format!("{{{}", name);
                let aligned = raster.align(TEXTURE_ALIGNMENT);
                wad.add_lump(&masked, encode_mip_texture(&aligned, source, target, &masked)?, LumpType::MipTex)
            }
            LumpKind::Wall => {
                let texture = match animated_frame(name) {
                    Some((anim, frame)) => anim.frame_name(frame - 1),
                    None => name.to_string(),
                };
                wad.add_lump(&texture, encode_mip_texture(raster, source, target, &texture)?, LumpType::MipTex)
            }
            LumpKind::Raw | LumpKind::Midi | LumpKind::Lbm => Ok(()),
        }
    }
}

fn dump_archive(cli: &Cli, archive: &dyn Archive, dest: &Path) -> Result<()> {
    fs::create_dir_all(dest).with_context(|| format!("could not create dest dir {}", dest.display()))?;

    let source = match palette_from_archive(archive, archive.kind().palette_lump()) {
        Ok(palette) => Some(palette),
        Err(err) => {
            if archive.kind() == ArchiveKind::RottWad {
                return Err(err).context("IWAD has no usable palette");
            }
            debug!("no palette in archive: {}", err);
            None
        }
    };

    let target = match &cli.target_palette {
        Some(path) => {
            let bytes = fs::read(path).with_context(|| format!("could not read {}", path.display()))?;
            Some(Palette::from_bytes(&bytes).with_context(|| format!("bad target palette {}", path.display()))?)
        }
        None => {
            if cli.wad_out.is_some() {
                warn!("no --target-palette given, quantizing textures against the source palette");
            }
            None
        }
    };

    let mut dumper = Dumper {
        archive,
        dest,
        source,
        target,
        wad: cli.wad_out.as_ref().map(|_| Wad2Writer::new()),
        dump_raw: cli.dump_raw,
    };

    for (index, entry) in archive.entries().iter().enumerate() {
        if let Some(only) = &cli.lname {
            if &entry.name != only {
                continue;
            }
        }
        if entry.size == 0 {
            continue;
        }
        dumper.dump(index, entry, cli.ltype)?;
    }

    if let (Some(path), Some(wad)) = (&cli.wad_out, dumper.wad.as_ref()) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("could not create wad out dir {}", parent.display()))?;
        }
        let file = File::create(path).with_context(|| format!("could not open wad file {}", path.display()))?;
        let written = wad.write(BufWriter::new(file)).with_context(|| format!("could not write {}", path.display()))?;
        info!("wad file {} written ({} lumps, {} bytes)", path.display(), wad.len(), written);
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    if cli.archive.is_none() && cli.rtl.is_none() {
        bail!("nothing to do: pass an archive and/or --rtl");
    }

    let rtl = match &cli.rtl {
        Some(path) => Some(
            RtlArchive::open(path).with_context(|| format!("could not parse RTL file {}", path.display()))?,
        ),
        None => None,
    };

    if let (Some(rtl), true) = (&rtl, cli.print_rtl_info) {
        print!("{}", rtl.metadata_report());
    }

    if let Some(outdir) = &cli.rtl_map_outdir {
        let Some(rtl) = &rtl else {
            bail!("must provide an RTL file with --rtl when dumping map data");
        };
        convert_maps(rtl, outdir, &cli.convert_options())?;
    }

    let Some(archive_path) = &cli.archive else {
        return Ok(());
    };
    let kind = cli.archive_kind();
    let archive = open_archive(archive_path, kind)
        .with_context(|| format!("could not open {} archive {}", kind.game(), archive_path.display()))?;
    info!("{} has {} lumps", archive_path.display(), archive.entries().len());

    if cli.list {
        for entry in archive.entries() {
            println!("{} ({} bytes)", entry.name, entry.size);
        }
    }

    if cli.dump {
        let Some(dest) = &cli.dest else {
            bail!("--dump needs a destination directory");
        };
        dump_archive(cli, archive.as_ref(), dest)?;
    }
    Ok(())
}

fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
