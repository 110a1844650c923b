//! NES cartridge implementation
//!
//! This module owns the cartridge memory (PRG ROM, CHR ROM/RAM, PRG RAM) and
//! the façade the CPU and PPU talk to. Every access in the cartridge address
//! space goes through `Cartridge`, which forwards it to the active mapper
//! together with a borrow of the `CartridgeImage` the mapper banks into.

use std::fmt;
use std::path::Path;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bank::{bank_count, BankIndex, BANK_8K};
use crate::mappers::{self, DiskDrive, Mapper};
use crate::sram::{self, SramError};

/// Size of the iNES header
const INES_HEADER_SIZE: usize = 16;

/// Default CHR RAM size when the board has no CHR ROM (8KB)
const DEFAULT_CHR_RAM_SIZE: usize = 8 * 1024;

/// PRG RAM unit used by the iNES header (8KB)
const PRG_RAM_UNIT: usize = 8 * 1024;

/// Errors that can occur while building a cartridge
#[derive(Error, Debug)]
pub enum CartridgeError {
    #[error("Unsupported mapper: {0}")]
    UnsupportedMapper(u16),

    #[error("PRG ROM is empty")]
    EmptyPrgRom,

    #[error("Failed to allocate {size} bytes of {region}")]
    Allocation { region: &'static str, size: usize },

    #[error("Invalid cartridge metadata: {0}")]
    InvalidMetadata(String),

    #[error(transparent)]
    Sram(#[from] SramError),
}

/// Mirroring modes for the NES
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mirroring {
    /// Horizontal mirroring (vertical arrangement of nametables)
    Horizontal,

    /// Vertical mirroring (horizontal arrangement of nametables)
    Vertical,

    /// Four-screen mirroring (no mirroring)
    FourScreen,

    /// Single-screen mirroring, lower bank
    SingleScreenLower,

    /// Single-screen mirroring, upper bank
    SingleScreenUpper,
}

/// Graphics memory of the board. Exactly one kind exists per cartridge.
#[derive(Clone, PartialEq, Eq)]
pub enum ChrMemory {
    /// Read-only pattern tables; writes are dropped
    Rom(Vec<u8>),

    /// Writable pattern tables
    Ram(Vec<u8>),
}

impl ChrMemory {
    fn bytes(&self) -> &[u8] {
        match self {
            ChrMemory::Rom(data) | ChrMemory::Ram(data) => data,
        }
    }
}

/// Board description supplied by the ROM loader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RomMetadata {
    /// Mapper number from the header
    pub mapper_number: u16,

    /// PRG RAM size in bytes (0 for boards without RAM)
    pub prg_ram_size: usize,

    /// CHR RAM size in bytes, used only when there is no CHR ROM
    pub chr_ram_size: usize,

    /// Whether PRG RAM is battery-backed
    pub has_battery: bool,

    /// Initial nametable arrangement
    pub mirroring: Mirroring,
}

impl Default for RomMetadata {
    fn default() -> Self {
        RomMetadata {
            mapper_number: 0,
            prg_ram_size: PRG_RAM_UNIT,
            chr_ram_size: DEFAULT_CHR_RAM_SIZE,
            has_battery: false,
            mirroring: Mirroring::Horizontal,
        }
    }
}

impl RomMetadata {
    /// Read the board description out of a 16 byte iNES header
    pub fn from_ines_header(header: &[u8]) -> Result<Self, CartridgeError> {
        if header.len() < INES_HEADER_SIZE || header[0..4] != [0x4E, 0x45, 0x53, 0x1A] {
            return Err(CartridgeError::InvalidMetadata("missing iNES signature".into()));
        }

        let flags6 = header[6];
        let flags7 = header[7];

        let mirroring = if (flags6 & 0x08) != 0 {
            Mirroring::FourScreen
        } else if (flags6 & 0x01) != 0 {
            Mirroring::Vertical
        } else {
            Mirroring::Horizontal
        };

        let mapper_number = ((flags7 & 0xF0) | (flags6 >> 4)) as u16;

        Ok(RomMetadata {
            mapper_number,
            prg_ram_size: (header[8].max(1) as usize) * PRG_RAM_UNIT,
            chr_ram_size: DEFAULT_CHR_RAM_SIZE,
            has_battery: (flags6 & 0x02) != 0,
            mirroring,
        })
    }
}

/// Reserve a zeroed buffer, reporting allocation failure instead of aborting
fn allocate(region: &'static str, size: usize) -> Result<Vec<u8>, CartridgeError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(size)
        .map_err(|_| CartridgeError::Allocation { region, size })?;
    buffer.resize(size, 0);
    Ok(buffer)
}

/// Raw memory of a loaded cartridge
pub struct CartridgeImage {
    /// PRG ROM data, never empty
    prg_rom: Vec<u8>,

    /// CHR ROM or CHR RAM
    chr: ChrMemory,

    /// PRG RAM data, possibly empty
    prg_ram: Vec<u8>,

    /// Mapper number
    mapper_number: u16,

    /// Current mirroring mode
    mirroring: Mirroring,

    /// Whether battery-backed RAM is present
    has_battery: bool,

    /// PRG RAM written since the last save
    sram_dirty: bool,
}

impl CartridgeImage {
    /// Take ownership of the ROM buffers and allocate the RAM the board needs
    pub fn new(
        metadata: &RomMetadata,
        prg_rom: Vec<u8>,
        chr_rom: Vec<u8>,
    ) -> Result<Self, CartridgeError> {
        if prg_rom.is_empty() {
            return Err(CartridgeError::EmptyPrgRom);
        }

        let chr = if chr_rom.is_empty() {
            let size = if metadata.chr_ram_size == 0 {
                DEFAULT_CHR_RAM_SIZE
            } else {
                metadata.chr_ram_size
            };
            ChrMemory::Ram(allocate("CHR RAM", size)?)
        } else {
            ChrMemory::Rom(chr_rom)
        };

        let prg_ram = allocate("PRG RAM", metadata.prg_ram_size)?;

        Ok(CartridgeImage {
            prg_rom,
            chr,
            prg_ram,
            mapper_number: metadata.mapper_number,
            mirroring: metadata.mirroring,
            has_battery: metadata.has_battery,
            sram_dirty: false,
        })
    }

    pub fn mapper_number(&self) -> u16 {
        self.mapper_number
    }

    pub fn mirroring(&self) -> Mirroring {
        self.mirroring
    }

    /// Change the nametable arrangement. Four-screen boards carry their own
    /// VRAM and ignore the mapper's mirroring control.
    pub fn set_mirroring(&mut self, mirroring: Mirroring) {
        if self.mirroring != Mirroring::FourScreen {
            self.mirroring = mirroring;
        }
    }

    pub fn has_battery(&self) -> bool {
        self.has_battery
    }

    pub fn sram_dirty(&self) -> bool {
        self.sram_dirty
    }

    pub fn prg_rom_len(&self) -> usize {
        self.prg_rom.len()
    }

    pub fn chr_len(&self) -> usize {
        self.chr.bytes().len()
    }

    pub fn chr_is_ram(&self) -> bool {
        matches!(self.chr, ChrMemory::Ram(_))
    }

    pub fn prg_ram(&self) -> &[u8] {
        &self.prg_ram
    }

    pub fn prg_ram_len(&self) -> usize {
        self.prg_ram.len()
    }

    // PRG ROM

    /// Wrap a PRG bank register value into the number of `size` banks
    pub fn prg_bank(&self, raw: usize, size: usize) -> BankIndex {
        BankIndex::new(raw, bank_count(self.prg_rom.len(), size))
    }

    /// PRG bank counted from the end, `0` being the last bank
    pub fn prg_bank_from_end(&self, back: usize, size: usize) -> BankIndex {
        BankIndex::from_end(back, bank_count(self.prg_rom.len(), size))
    }

    pub fn prg_bank_count(&self, size: usize) -> usize {
        bank_count(self.prg_rom.len(), size)
    }

    /// Read `addr` through a `size` byte PRG window mapped to `bank`
    pub fn read_prg(&self, bank: BankIndex, size: usize, addr: u16) -> u8 {
        let index = bank.offset(size, addr as usize);
        self.prg_rom[index % self.prg_rom.len()]
    }

    // CHR ROM/RAM

    /// Wrap a CHR bank register value into the number of `size` banks
    pub fn chr_bank(&self, raw: usize, size: usize) -> BankIndex {
        BankIndex::new(raw, bank_count(self.chr_len(), size))
    }

    pub fn read_chr(&self, bank: BankIndex, size: usize, addr: u16) -> u8 {
        let data = self.chr.bytes();
        if data.is_empty() {
            return 0;
        }
        data[bank.offset(size, addr as usize) % data.len()]
    }

    /// Write through a CHR window; silently dropped when the board has CHR ROM
    pub fn write_chr(&mut self, bank: BankIndex, size: usize, addr: u16, value: u8) {
        if let ChrMemory::Ram(data) = &mut self.chr {
            if !data.is_empty() {
                let index = bank.offset(size, addr as usize) % data.len();
                data[index] = value;
            }
        }
    }

    /// Unbanked 8KB pattern table access used by the simplest boards
    pub fn read_chr_fixed(&self, addr: u16) -> u8 {
        self.read_chr(BankIndex::new(0, 1), BANK_8K, addr)
    }

    pub fn write_chr_fixed(&mut self, addr: u16, value: u8) {
        self.write_chr(BankIndex::new(0, 1), BANK_8K, addr, value);
    }

    // PRG RAM

    /// Read PRG RAM at an absolute offset (wrapped); 0 when there is no RAM
    pub fn read_prg_ram(&self, offset: usize) -> u8 {
        if self.prg_ram.is_empty() {
            return 0;
        }
        self.prg_ram[offset % self.prg_ram.len()]
    }

    /// Write PRG RAM at an absolute offset (wrapped), flagging battery RAM dirty
    pub fn write_prg_ram(&mut self, offset: usize, value: u8) {
        if self.prg_ram.is_empty() {
            return;
        }
        let index = offset % self.prg_ram.len();
        self.prg_ram[index] = value;
        if self.has_battery {
            self.sram_dirty = true;
        }
    }
}

impl fmt::Debug for CartridgeImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartridgeImage")
            .field("mapper", &self.mapper_number)
            .field("mirroring", &self.mirroring)
            .field("prg_rom_size", &self.prg_rom.len())
            .field("chr_size", &self.chr_len())
            .field("chr_is_ram", &self.chr_is_ram())
            .field("prg_ram_size", &self.prg_ram.len())
            .field("has_battery", &self.has_battery)
            .field("sram_dirty", &self.sram_dirty)
            .finish()
    }
}

/// Represents an NES cartridge: the memory image plus the mapper that banks it
pub struct Cartridge {
    /// Memory owned by the cartridge
    image: CartridgeImage,

    /// Active mapper, holding only register state
    mapper: Box<dyn Mapper>,

    /// Last IRQ line level reported to the CPU
    irq_line: bool,

    /// CPU interrupt input
    irq_callback: Option<Box<dyn FnMut()>>,
}

impl Cartridge {
    /// Build a cartridge from loader-supplied metadata and ROM buffers
    pub fn new(
        metadata: RomMetadata,
        prg_rom: Vec<u8>,
        chr_rom: Vec<u8>,
    ) -> Result<Self, CartridgeError> {
        let mut image = CartridgeImage::new(&metadata, prg_rom, chr_rom)?;
        let mapper = mappers::create_mapper(metadata.mapper_number, &mut image)?;

        info!(
            "Loaded cartridge - Mapper: {} ({}), PRG ROM: {}KB, CHR {}: {}KB, PRG RAM: {}KB, \
             Mirroring: {:?}, Battery: {}",
            image.mapper_number,
            mappers::mapper_name(image.mapper_number).unwrap_or("unknown"),
            image.prg_rom_len() / 1024,
            if image.chr_is_ram() { "RAM" } else { "ROM" },
            image.chr_len() / 1024,
            image.prg_ram_len() / 1024,
            image.mirroring,
            image.has_battery
        );

        Ok(Cartridge {
            image,
            mapper,
            irq_line: false,
            irq_callback: None,
        })
    }

    /// Install the CPU interrupt input, called on every rising edge of the
    /// mapper IRQ line
    pub fn set_irq_callback<F>(&mut self, callback: F)
    where
        F: FnMut() + 'static,
    {
        self.irq_callback = Some(Box::new(callback));
    }

    /// Forward a newly asserted IRQ line to the CPU
    fn poll_irq(&mut self) {
        let pending = self.mapper.irq_state();
        if pending && !self.irq_line {
            if let Some(callback) = self.irq_callback.as_mut() {
                callback();
            }
        }
        self.irq_line = pending;
    }

    /// Read a byte from the CPU address space ($4020-$FFFF)
    pub fn cpu_read(&mut self, addr: u16) -> u8 {
        if addr < 0x4020 {
            return 0;
        }
        let value = self.mapper.cpu_read(&self.image, addr);
        self.poll_irq();
        value
    }

    /// Write a byte to the CPU address space ($4020-$FFFF)
    pub fn cpu_write(&mut self, addr: u16, value: u8) {
        if addr < 0x4020 {
            return;
        }
        self.mapper.cpu_write(&mut self.image, addr, value);
        self.poll_irq();
    }

    /// Read a byte from the pattern tables ($0000-$1FFF)
    pub fn chr_read(&mut self, addr: u16) -> u8 {
        let value = self.mapper.chr_read(&self.image, addr & 0x1FFF);
        self.poll_irq();
        value
    }

    /// Write a byte to the pattern tables; dropped for CHR ROM
    pub fn chr_write(&mut self, addr: u16, value: u8) {
        self.mapper.chr_write(&mut self.image, addr & 0x1FFF, value);
        self.poll_irq();
    }

    /// Nametable byte supplied by the cartridge, `None` when the console's
    /// nametable RAM answers ($2000-$3EFF, mirrored down to $2000-$2FFF)
    pub fn nametable_read(&mut self, addr: u16) -> Option<u8> {
        self.mapper.nametable_read(0x2000 | (addr & 0x0FFF))
    }

    /// Offer a nametable write to the cartridge; `false` when the console's
    /// nametable RAM should take it
    pub fn nametable_write(&mut self, addr: u16, value: u8) -> bool {
        self.mapper.nametable_write(0x2000 | (addr & 0x0FFF), value)
    }

    /// Called by the PPU once per scanline
    pub fn notify_scanline(&mut self, scanline: u16) {
        self.mapper.scanline(scanline);
        self.poll_irq();
    }

    /// Put the mapper registers back to power-on state; RAM is kept
    pub fn reset(&mut self) {
        info!("Resetting mapper {}", self.image.mapper_number);
        self.mapper.reset(&mut self.image);
        self.irq_line = self.mapper.irq_state();
    }

    /// Let the mapper release whatever it holds before the cartridge goes away
    pub fn shutdown(&mut self) {
        debug!("Shutting down mapper {}", self.image.mapper_number);
        self.mapper.shutdown();
    }

    /// Whether the mapper currently asserts its IRQ line
    pub fn irq_pending(&self) -> bool {
        self.mapper.irq_state()
    }

    /// Acknowledge the mapper IRQ
    pub fn acknowledge_irq(&mut self) {
        self.mapper.irq_clear();
        self.irq_line = self.mapper.irq_state();
    }

    pub fn mirroring(&self) -> Mirroring {
        self.image.mirroring()
    }

    pub fn mapper_number(&self) -> u16 {
        self.image.mapper_number()
    }

    pub fn mapper_name(&self) -> &'static str {
        mappers::mapper_name(self.image.mapper_number()).unwrap_or("unknown")
    }

    pub fn image(&self) -> &CartridgeImage {
        &self.image
    }

    pub fn has_battery(&self) -> bool {
        self.image.has_battery()
    }

    pub fn sram_dirty(&self) -> bool {
        self.image.sram_dirty()
    }

    pub fn mark_sram_clean(&mut self) {
        self.image.sram_dirty = false;
    }

    /// Disk drive of a Famicom Disk System adapter
    pub fn disk_drive(&mut self) -> Option<&mut DiskDrive> {
        self.mapper.disk_drive()
    }

    /// Dump battery-backed PRG RAM to `path`; no-op without a battery
    pub fn save_sram(&mut self, path: &Path) -> Result<(), CartridgeError> {
        if !self.image.has_battery {
            return Ok(());
        }
        sram::save(path, &self.image.prg_ram)?;
        self.image.sram_dirty = false;
        Ok(())
    }

    /// Restore battery-backed PRG RAM from `path`; no-op without a battery
    pub fn load_sram(&mut self, path: &Path) -> Result<(), CartridgeError> {
        if !self.image.has_battery {
            return Ok(());
        }
        sram::load(path, &mut self.image.prg_ram)?;
        self.image.sram_dirty = false;
        Ok(())
    }
}

impl fmt::Debug for Cartridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cartridge")
            .field("image", &self.image)
            .field("mapper_name", &self.mapper_name())
            .field("irq_line", &self.irq_line)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn metadata(mapper_number: u16) -> RomMetadata {
        RomMetadata { mapper_number, ..RomMetadata::default() }
    }

    #[test]
    fn parses_ines_header_fields() {
        let header = [0x4E, 0x45, 0x53, 0x1A, 2, 1, 0x13, 0x40, 0, 0, 0, 0, 0, 0, 0, 0];
        let meta = RomMetadata::from_ines_header(&header).unwrap();
        assert_eq!(meta.mapper_number, 0x41);
        assert_eq!(meta.mirroring, Mirroring::Vertical);
        assert!(meta.has_battery);
        assert_eq!(meta.prg_ram_size, 8 * 1024);
    }

    #[test]
    fn four_screen_flag_wins_over_vertical() {
        let header = [0x4E, 0x45, 0x53, 0x1A, 1, 0, 0x09, 0, 2, 0, 0, 0, 0, 0, 0, 0];
        let meta = RomMetadata::from_ines_header(&header).unwrap();
        assert_eq!(meta.mirroring, Mirroring::FourScreen);
        assert_eq!(meta.prg_ram_size, 16 * 1024);
    }

    #[test]
    fn rejects_header_without_signature() {
        let header = [0u8; 16];
        assert!(matches!(
            RomMetadata::from_ines_header(&header),
            Err(CartridgeError::InvalidMetadata(_))
        ));
    }

    #[test]
    fn empty_prg_rom_is_rejected() {
        assert!(matches!(
            Cartridge::new(metadata(0), Vec::new(), Vec::new()),
            Err(CartridgeError::EmptyPrgRom)
        ));
    }

    #[test]
    fn unsupported_mapper_produces_no_cartridge() {
        assert!(matches!(
            Cartridge::new(metadata(42), vec![0; 0x8000], Vec::new()),
            Err(CartridgeError::UnsupportedMapper(42))
        ));
    }

    #[test]
    fn chr_ram_allocated_when_no_chr_rom() {
        let cart = Cartridge::new(metadata(0), vec![0; 0x4000], Vec::new()).unwrap();
        assert!(cart.image().chr_is_ram());
        assert_eq!(cart.image().chr_len(), 8 * 1024);
    }

    #[test]
    fn oversized_chr_ram_is_an_allocation_error() {
        let meta = RomMetadata { chr_ram_size: usize::MAX, ..metadata(0) };
        assert!(matches!(
            Cartridge::new(meta, vec![0; 0x4000], Vec::new()),
            Err(CartridgeError::Allocation { region: "CHR RAM", size: usize::MAX })
        ));
    }

    #[test]
    fn chr_rom_write_is_dropped() {
        let chr: Vec<u8> = (0..0x2000).map(|i| i as u8).collect();
        let mut cart = Cartridge::new(metadata(0), vec![0; 0x4000], chr).unwrap();
        cart.chr_write(0x0123, 0xEE);
        assert_eq!(cart.chr_read(0x0123), 0x23);
    }

    #[test]
    fn prg_ram_write_marks_battery_ram_dirty() {
        let meta = RomMetadata { has_battery: true, ..metadata(0) };
        let mut cart = Cartridge::new(meta, vec![0; 0x4000], Vec::new()).unwrap();
        assert!(!cart.sram_dirty());
        cart.cpu_write(0x6000, 0x42);
        assert!(cart.sram_dirty());
        cart.mark_sram_clean();
        assert!(!cart.sram_dirty());
    }

    #[test]
    fn four_screen_ignores_mapper_mirroring() {
        let meta = RomMetadata { mirroring: Mirroring::FourScreen, ..metadata(7) };
        let cart = Cartridge::new(meta, vec![0; 0x8000], Vec::new()).unwrap();
        assert_eq!(cart.mirroring(), Mirroring::FourScreen);
    }

    #[test]
    fn sram_calls_are_noops_without_battery() {
        let mut cart = Cartridge::new(metadata(0), vec![0; 0x4000], Vec::new()).unwrap();
        let path = std::env::temp_dir()
            .join(format!("rusty_nes_cart_{}_nobattery.sav", std::process::id()));
        cart.save_sram(&path).unwrap();
        assert!(!path.exists());
        cart.load_sram(&path).unwrap();
    }

    #[test]
    fn irq_callback_fires_once_per_assertion() {
        // MMC3 with latch 0: every A12 rising edge reloads to zero and fires
        let mut cart = Cartridge::new(metadata(4), vec![0; 0x8000], vec![0; 0x2000]).unwrap();
        let fired = Rc::new(Cell::new(0));
        let counter = Rc::clone(&fired);
        cart.set_irq_callback(move || counter.set(counter.get() + 1));

        cart.cpu_write(0xC000, 0);
        cart.cpu_write(0xC001, 0);
        cart.cpu_write(0xE001, 0);

        cart.chr_read(0x0000);
        cart.chr_read(0x1000);
        assert!(cart.irq_pending());
        assert_eq!(fired.get(), 1);

        cart.chr_read(0x0000);
        cart.chr_read(0x1000);
        assert_eq!(fired.get(), 1);

        cart.acknowledge_irq();
        assert!(!cart.irq_pending());
        cart.chr_read(0x0000);
        cart.chr_read(0x1000);
        assert_eq!(fired.get(), 2);
    }
}
