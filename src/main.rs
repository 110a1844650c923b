//! RustyNES cartridge probe
//!
//! Builds a cartridge from a ROM dump, pokes mapper registers from the
//! command line and prints what the CPU and PPU would see afterwards.

use anyhow::{bail, Context, Result};
use clap::Parser;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

use rusty_nes_cart::{sram, Cartridge, RomMetadata};

/// Size of the iNES header
const INES_HEADER_SIZE: usize = 16;

/// Size of an iNES trainer block
const TRAINER_SIZE: usize = 512;

/// Command line arguments for the cartridge probe
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// PRG ROM dump, or a complete iNES file
    #[clap(name = "PRG")]
    prg_path: PathBuf,

    /// CHR ROM dump (CHR RAM is allocated when omitted)
    #[clap(long)]
    chr: Option<PathBuf>,

    /// Mapper number, overrides the header and the metadata file
    #[clap(short, long)]
    mapper: Option<u16>,

    /// JSON file with the board metadata
    #[clap(long)]
    meta: Option<PathBuf>,

    /// Treat PRG RAM as battery backed
    #[clap(long)]
    battery: bool,

    /// Save file for battery-backed PRG RAM (default: <PRG>.sav)
    #[clap(long)]
    sram: Option<PathBuf>,

    /// Disk image to insert into a Famicom Disk System drive
    #[clap(long)]
    disk: Option<PathBuf>,

    /// CPU write applied in order, e.g. 0x8000=0x03 or $A001=128
    #[clap(short, long = "write", value_parser = parse_write)]
    writes: Vec<(u16, u8)>,

    /// Scanlines to clock after the writes
    #[clap(long, default_value = "0")]
    scanlines: u16,

    /// CPU address to read after the writes
    #[clap(short, long = "peek", value_parser = parse_number::<u16>)]
    peeks: Vec<u16>,

    /// PPU address to read after the writes
    #[clap(long = "peek-chr", value_parser = parse_number::<u16>)]
    chr_peeks: Vec<u16>,

    /// Enable debug logging
    #[clap(short, long)]
    debug: bool,
}

/// Parse `$1F`, `0x1F` or `31`
fn parse_number<T>(text: &str) -> Result<T, String>
where
    T: TryFrom<u32>,
{
    let text = text.trim();
    let value = if let Some(hex) = text.strip_prefix('$').or_else(|| text.strip_prefix("0x")) {
        u32::from_str_radix(hex, 16)
    } else {
        text.parse::<u32>()
    }
    .map_err(|e| format!("invalid number '{}': {}", text, e))?;

    T::try_from(value).map_err(|_| format!("value out of range: {}", text))
}

/// Parse an `ADDR=VAL` pair
fn parse_write(text: &str) -> Result<(u16, u8), String> {
    let (addr, value) = text
        .split_once('=')
        .ok_or_else(|| format!("expected ADDR=VAL, got '{}'", text))?;
    Ok((parse_number(addr)?, parse_number(value)?))
}

/// Board metadata and ROM buffers gathered from the command line
struct RomSource {
    metadata: RomMetadata,
    prg_rom: Vec<u8>,
    chr_rom: Vec<u8>,
}

fn read_rom(args: &Args) -> Result<RomSource> {
    let data = fs::read(&args.prg_path)
        .with_context(|| format!("Failed to read ROM file: {}", args.prg_path.display()))?;

    let mut source = if data.starts_with(b"NES\x1A") {
        split_ines(&data)?
    } else {
        RomSource { metadata: RomMetadata::default(), prg_rom: data, chr_rom: Vec::new() }
    };

    if let Some(path) = &args.meta {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read metadata: {}", path.display()))?;
        source.metadata = serde_json::from_str(&text)
            .with_context(|| format!("Invalid metadata file: {}", path.display()))?;
    }

    if let Some(path) = &args.chr {
        source.chr_rom = fs::read(path)
            .with_context(|| format!("Failed to read CHR file: {}", path.display()))?;
    }

    if let Some(mapper) = args.mapper {
        source.metadata.mapper_number = mapper;
    }
    if args.battery {
        source.metadata.has_battery = true;
    }

    Ok(source)
}

/// Split an iNES file into header metadata and its PRG/CHR sections
fn split_ines(data: &[u8]) -> Result<RomSource> {
    let metadata = RomMetadata::from_ines_header(data)?;

    let prg_size = data[4] as usize * 16 * 1024;
    let chr_size = data[5] as usize * 8 * 1024;
    let mut offset = INES_HEADER_SIZE;
    if data[6] & 0x04 != 0 {
        offset += TRAINER_SIZE;
    }

    if data.len() < offset + prg_size + chr_size {
        bail!(
            "ROM file is truncated: expected {} bytes, found {}",
            offset + prg_size + chr_size,
            data.len()
        );
    }

    let prg_rom = data[offset..offset + prg_size].to_vec();
    let chr_rom = data[offset + prg_size..offset + prg_size + chr_size].to_vec();

    Ok(RomSource { metadata, prg_rom, chr_rom })
}

fn insert_disk(cartridge: &mut Cartridge, path: &Path) -> Result<()> {
    let image = fs::read(path)
        .with_context(|| format!("Failed to read disk image: {}", path.display()))?;
    let mapper_number = cartridge.mapper_number();
    let drive = cartridge
        .disk_drive()
        .with_context(|| format!("Mapper {} has no disk drive", mapper_number))?;
    let sides = drive.insert(&image)?;
    info!("Inserted {} ({} side(s))", path.display(), sides);
    Ok(())
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    if args.debug {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    }

    let source = read_rom(&args)?;
    let mut cartridge = Cartridge::new(source.metadata, source.prg_rom, source.chr_rom)
        .with_context(|| format!("Failed to load ROM: {}", args.prg_path.display()))?;

    cartridge.set_irq_callback(|| debug!("IRQ asserted"));

    let sram_path = args.sram.clone().unwrap_or_else(|| sram::default_path(&args.prg_path));
    if cartridge.has_battery() && sram_path.exists() {
        cartridge
            .load_sram(&sram_path)
            .with_context(|| format!("Failed to load SRAM: {}", sram_path.display()))?;
        info!("Loaded SRAM from {}", sram_path.display());
    }

    if let Some(path) = &args.disk {
        insert_disk(&mut cartridge, path)?;
    }

    for (addr, value) in &args.writes {
        if *addr < 0x4020 {
            warn!("${:04X} is outside the cartridge space, ignored", addr);
        }
        cartridge.cpu_write(*addr, *value);
    }

    for scanline in 0..args.scanlines {
        cartridge.notify_scanline(scanline);
    }

    for addr in &args.peeks {
        println!("CPU ${:04X} = ${:02X}", addr, cartridge.cpu_read(*addr));
    }
    for addr in &args.chr_peeks {
        println!("PPU ${:04X} = ${:02X}", addr, cartridge.chr_read(*addr));
    }

    println!("Mapper:    {} ({})", cartridge.mapper_number(), cartridge.mapper_name());
    println!("Mirroring: {:?}", cartridge.mirroring());
    println!("IRQ:       {}", if cartridge.irq_pending() { "asserted" } else { "clear" });

    if cartridge.sram_dirty() {
        cartridge
            .save_sram(&sram_path)
            .with_context(|| format!("Failed to save SRAM: {}", sram_path.display()))?;
        info!("Saved SRAM to {}", sram_path.display());
    }

    cartridge.shutdown();
    Ok(())
}
