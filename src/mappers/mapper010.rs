//! Mapper 010 (MMC4/FxROM) implementation
//!
//! Same latch-switched CHR as MMC2, with 16KB PRG banking and PRG RAM.
//! Used by Fire Emblem and Famicom Wars.
//!
//! Memory map:
//! - PRG RAM: 8KB (0x6000-0x7FFF)
//! - PRG ROM: switchable 16KB bank at 0x8000 + fixed last 16KB bank
//! - CHR ROM: two latch-switched 4KB windows

use crate::bank::BANK_16K;
use crate::cartridge::CartridgeImage;
use super::mapper009::Mmc2Latch;
use super::Mapper;

#[derive(Debug)]
pub struct Mapper010 {
    /// Switchable 16KB PRG bank at 0x8000
    prg_bank: u8,

    latch: Mmc2Latch,
}

impl Mapper010 {
    pub fn new() -> Self {
        Mapper010 {
            prg_bank: 0,
            latch: Mmc2Latch::new(),
        }
    }
}

impl Default for Mapper010 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper for Mapper010 {
    fn cpu_read(&mut self, cart: &CartridgeImage, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => cart.read_prg_ram((addr & 0x1FFF) as usize),
            0x8000..=0xBFFF => {
                cart.read_prg(cart.prg_bank(self.prg_bank as usize, BANK_16K), BANK_16K, addr)
            }
            0xC000..=0xFFFF => cart.read_prg(cart.prg_bank_from_end(0, BANK_16K), BANK_16K, addr),
            _ => 0,
        }
    }

    fn cpu_write(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        match addr {
            0x6000..=0x7FFF => cart.write_prg_ram((addr & 0x1FFF) as usize, data),
            0xA000..=0xAFFF => self.prg_bank = data & 0x0F,
            0xB000..=0xFFFF => {
                self.latch.write_register(cart, addr, data);
            }
            _ => {}
        }
    }

    fn chr_read(&mut self, cart: &CartridgeImage, addr: u16) -> u8 {
        self.latch.chr_read(cart, addr)
    }

    fn chr_write(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        self.latch.chr_write(cart, addr, data);
    }

    fn reset(&mut self, _cart: &mut CartridgeImage) {
        self.prg_bank = 0;
        self.latch.reset();
    }
}
