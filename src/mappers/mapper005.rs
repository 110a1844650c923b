//! Mapper 005 (MMC5) implementation
//!
//! The most capable Nintendo mapper. Used by games like Castlevania III,
//! Just Breed, Uncharted Waters and Laser Invasion.
//!
//! Memory map:
//! - 0x5000-0x5015: expansion audio registers (stored only)
//! - 0x5100-0x5130: mode, protect, nametable and bank registers
//! - 0x5200-0x5206: split screen (ignored), scanline IRQ and 8x8 multiplier
//! - 0x5C00-0x5FFF: 1KB ExRAM
//! - 0x6000-0x7FFF: 8KB PRG RAM bank ($5113)
//! - 0x8000-0xFFFF: PRG ROM/RAM in 32KB, 16KB+16KB, 16KB+8KB+8KB or 4x8KB
//! - PPU 0x0000-0x1FFF: CHR in 8KB, 4KB, 2KB or 1KB banks
//!
//! Nametables marked 2 in $5105 come from ExRAM and those marked 3 from the
//! fill tile/attribute; 0 and 1 are left to the console's nametable RAM.
//!
//! Pattern fetches use CHR register set A ($5120-$5127) unless the last CHR
//! register written belonged to set B ($5128-$512B).

use log::debug;
use crate::bank::{BANK_1K, BANK_8K};
use crate::cartridge::{CartridgeImage, Mirroring};
use crate::irq::IrqState;
use super::Mapper;

const EXRAM_SIZE: usize = 1024;

#[derive(Debug)]
pub struct Mapper005 {
    /// PRG mode ($5100, 0-3)
    prg_mode: u8,

    /// CHR mode ($5101, 0-3)
    chr_mode: u8,

    /// PRG RAM protect registers ($5102/$5103); writes need 2 and 1
    prg_ram_protect: [u8; 2],

    /// ExRAM mode ($5104)
    exram_mode: u8,

    /// Nametable mapping ($5105), two bits per nametable
    nametable_mapping: u8,

    /// Fill mode tile and attribute ($5106/$5107)
    fill_tile: u8,
    fill_attribute: u8,

    /// PRG bank registers $5113-$5117
    prg_regs: [u8; 5],

    /// CHR bank registers $5120-$512B with the upper bits applied
    chr_regs: [u16; 12],

    /// Upper CHR bank bits ($5130)
    chr_upper: u8,

    /// Last CHR register write went to set B
    chr_set_b: bool,

    /// Scanline compare value ($5203)
    irq_scanline: u8,

    /// Scanline IRQ; `pending` doubles as the status flag read at $5204
    irq: IrqState,

    /// PPU is rendering a visible scanline
    in_frame: bool,

    /// Multiplier inputs ($5205/$5206)
    multiplicand: u8,
    multiplier: u8,

    /// Expansion audio registers $5000-$5015
    audio: [u8; 0x16],

    /// 1KB expansion RAM
    exram: [u8; EXRAM_SIZE],
}

impl Mapper005 {
    pub fn new() -> Self {
        Mapper005 {
            prg_mode: 3,
            chr_mode: 3,
            prg_ram_protect: [0; 2],
            exram_mode: 0,
            nametable_mapping: 0,
            fill_tile: 0,
            fill_attribute: 0,
            prg_regs: [0, 0, 0, 0, 0xFF],
            chr_regs: [0; 12],
            chr_upper: 0,
            chr_set_b: false,
            irq_scanline: 0,
            irq: IrqState::new(),
            in_frame: false,
            multiplicand: 0xFF,
            multiplier: 0xFF,
            audio: [0; 0x16],
            exram: [0; EXRAM_SIZE],
        }
    }

    /// $5105 source for the nametable holding `addr`: 0/1 console RAM
    /// pages, 2 ExRAM, 3 fill mode
    fn nametable_source(&self, addr: u16) -> u8 {
        let quadrant = (addr >> 10) & 0x03;
        (self.nametable_mapping >> (quadrant * 2)) & 0x03
    }

    fn prg_ram_writable(&self) -> bool {
        self.prg_ram_protect[0] & 0x03 == 0x02 && self.prg_ram_protect[1] & 0x03 == 0x01
    }

    /// Resolve a CPU address in 0x8000-0xFFFF to (is_rom, 8KB bank number)
    fn prg_slot(&self, addr: u16) -> (bool, usize) {
        let slot = ((addr - 0x8000) >> 13) as usize;
        let r = &self.prg_regs;
        let is_rom = |v: u8| v & 0x80 != 0;

        match self.prg_mode & 0x03 {
            0 => (true, (r[4] & 0x7C) as usize | slot),
            1 => {
                if slot < 2 {
                    (is_rom(r[2]), (r[2] & 0x7E) as usize | slot)
                } else {
                    (true, (r[4] & 0x7E) as usize | (slot - 2))
                }
            }
            2 => match slot {
                0 | 1 => (is_rom(r[2]), (r[2] & 0x7E) as usize | slot),
                2 => (is_rom(r[3]), (r[3] & 0x7F) as usize),
                _ => (true, (r[4] & 0x7F) as usize),
            },
            _ => match slot {
                3 => (true, (r[4] & 0x7F) as usize),
                _ => (is_rom(r[slot + 1]), (r[slot + 1] & 0x7F) as usize),
            },
        }
    }

    /// PRG RAM offset of an 8KB RAM bank
    fn ram_offset(bank: usize, addr: u16) -> usize {
        (bank & 0x07) * BANK_8K + (addr & 0x1FFF) as usize
    }

    /// 1KB CHR bank number for a PPU address under the current mode and set
    fn chr_bank_1k(&self, addr: u16) -> usize {
        let shift = 3 - (self.chr_mode & 0x03) as usize;
        // Window size in 1KB units: 8, 4, 2 or 1
        let units = 1usize << shift;
        let addr = (addr & 0x1FFF) as usize;

        let reg = if self.chr_set_b {
            // Set B repeats over both 4KB halves
            let per_half = (4 / units).max(1);
            let window = (addr & 0x0FFF) / (units * BANK_1K).min(0x1000);
            8 + (window % per_half + 1) * (4 / per_half) - 1
        } else {
            let window = addr / (units * BANK_1K);
            (window + 1) * units - 1
        };

        let value = self.chr_regs[reg] as usize;
        value * units + (addr / BANK_1K) % units
    }

    /// Keep the cartridge mirroring in step with the standard $5105 layouts
    fn apply_nametable_mapping(&self, cart: &mut CartridgeImage) {
        let mirroring = match self.nametable_mapping {
            0x44 => Some(Mirroring::Vertical),
            0x50 => Some(Mirroring::Horizontal),
            0x00 => Some(Mirroring::SingleScreenLower),
            0x55 => Some(Mirroring::SingleScreenUpper),
            _ => None,
        };
        if let Some(mirroring) = mirroring {
            cart.set_mirroring(mirroring);
        }
    }

    fn read_register(&self, addr: u16) -> u8 {
        match addr {
            0x5000..=0x5015 => self.audio[(addr - 0x5000) as usize],
            0x5204 => {
                let mut status = 0;
                if self.irq.pending {
                    status |= 0x80;
                }
                if self.in_frame {
                    status |= 0x40;
                }
                status
            }
            0x5205 => (self.multiplicand as u16 * self.multiplier as u16) as u8,
            0x5206 => ((self.multiplicand as u16 * self.multiplier as u16) >> 8) as u8,
            0x5C00..=0x5FFF if self.exram_mode >= 2 => self.exram[(addr - 0x5C00) as usize],
            _ => 0,
        }
    }

    fn write_register(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        match addr {
            0x5000..=0x5015 => self.audio[(addr - 0x5000) as usize] = data,
            0x5100 => {
                self.prg_mode = data & 0x03;
                debug!("MMC5 PRG mode {}", self.prg_mode);
            }
            0x5101 => {
                self.chr_mode = data & 0x03;
                debug!("MMC5 CHR mode {}", self.chr_mode);
            }
            0x5102 => self.prg_ram_protect[0] = data & 0x03,
            0x5103 => self.prg_ram_protect[1] = data & 0x03,
            0x5104 => self.exram_mode = data & 0x03,
            0x5105 => {
                self.nametable_mapping = data;
                self.apply_nametable_mapping(cart);
            }
            0x5106 => self.fill_tile = data,
            0x5107 => self.fill_attribute = data & 0x03,
            0x5113..=0x5117 => self.prg_regs[(addr - 0x5113) as usize] = data,
            0x5120..=0x512B => {
                let index = (addr - 0x5120) as usize;
                self.chr_regs[index] = data as u16 | ((self.chr_upper as u16) << 8);
                self.chr_set_b = index >= 8;
            }
            0x5130 => self.chr_upper = data & 0x03,
            // Split screen only changes how the PPU composes tiles
            0x5200..=0x5202 => debug!("MMC5 split ${:04X} = ${:02X} ignored", addr, data),
            0x5203 => self.irq_scanline = data,
            0x5204 => self.irq.enabled = data & 0x80 != 0,
            0x5205 => self.multiplicand = data,
            0x5206 => self.multiplier = data,
            // Modes 0-2 accept writes, mode 3 is read-only
            0x5C00..=0x5FFF if self.exram_mode != 3 => self.exram[(addr - 0x5C00) as usize] = data,
            _ => {}
        }
    }
}

impl Default for Mapper005 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper for Mapper005 {
    fn cpu_read(&mut self, cart: &CartridgeImage, addr: u16) -> u8 {
        match addr {
            0x5000..=0x5FFF => self.read_register(addr),
            0x6000..=0x7FFF => cart.read_prg_ram(Self::ram_offset(self.prg_regs[0] as usize, addr)),
            0x8000..=0xFFFF => {
                let (is_rom, bank) = self.prg_slot(addr);
                if is_rom {
                    cart.read_prg(cart.prg_bank(bank, BANK_8K), BANK_8K, addr)
                } else {
                    cart.read_prg_ram(Self::ram_offset(bank, addr))
                }
            }
            _ => 0,
        }
    }

    fn cpu_write(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        match addr {
            0x5000..=0x5FFF => self.write_register(cart, addr, data),
            0x6000..=0x7FFF => {
                if self.prg_ram_writable() {
                    cart.write_prg_ram(Self::ram_offset(self.prg_regs[0] as usize, addr), data);
                }
            }
            0x8000..=0xDFFF => {
                let (is_rom, bank) = self.prg_slot(addr);
                if !is_rom && self.prg_ram_writable() {
                    cart.write_prg_ram(Self::ram_offset(bank, addr), data);
                }
            }
            _ => {}
        }
    }

    fn chr_read(&mut self, cart: &CartridgeImage, addr: u16) -> u8 {
        cart.read_chr(cart.chr_bank(self.chr_bank_1k(addr), BANK_1K), BANK_1K, addr)
    }

    fn chr_write(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        let bank = cart.chr_bank(self.chr_bank_1k(addr), BANK_1K);
        cart.write_chr(bank, BANK_1K, addr, data);
    }

    fn scanline(&mut self, scanline: u16) {
        if scanline == 0 {
            self.in_frame = true;
        } else if scanline >= 240 {
            self.in_frame = false;
        }

        if self.in_frame
            && self.irq_scanline != 0
            && scanline == self.irq_scanline as u16
            && self.irq.enabled
        {
            self.irq.raise();
        }
    }

    fn nametable_read(&mut self, addr: u16) -> Option<u8> {
        let offset = (addr & 0x03FF) as usize;
        match self.nametable_source(addr) {
            // ExRAM used as CPU RAM reads back as zeros on the PPU side
            2 if self.exram_mode >= 2 => Some(0),
            2 => Some(self.exram[offset]),
            3 if offset < 0x03C0 => Some(self.fill_tile),
            3 => Some(self.fill_attribute * 0x55),
            _ => None,
        }
    }

    fn nametable_write(&mut self, addr: u16, value: u8) -> bool {
        match self.nametable_source(addr) {
            2 => {
                if self.exram_mode < 2 {
                    self.exram[(addr & 0x03FF) as usize] = value;
                }
                true
            }
            3 => true,
            _ => false,
        }
    }

    fn reset(&mut self, _cart: &mut CartridgeImage) {
        let exram = self.exram;
        *self = Mapper005::new();
        self.exram = exram;
    }

    fn irq_state(&self) -> bool {
        self.irq.pending
    }

    fn irq_clear(&mut self) {
        self.irq.acknowledge();
    }
}
