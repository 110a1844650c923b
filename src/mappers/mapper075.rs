//! Mapper 075 (Konami VRC1) implementation
//!
//! Three switchable 8KB PRG banks, two 4KB CHR banks whose fifth bank bit
//! lives in the shared 0x9000 register.
//!
//! Memory map:
//! - PRG ROM: 8KB at 0x8000, 0xA000, 0xC000 switchable, last 8KB fixed at 0xE000
//! - CHR ROM: Two switchable 4KB banks

use log::warn;
use crate::bank::{BANK_4K, BANK_8K};
use crate::cartridge::{CartridgeImage, Mirroring};
use super::Mapper;

#[derive(Debug, Default)]
pub struct Mapper075 {
    prg_banks: [u8; 3],

    /// Full 5-bit CHR bank numbers
    chr_banks: [u8; 2],
}

impl Mapper075 {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Mapper for Mapper075 {
    fn cpu_read(&mut self, cart: &CartridgeImage, addr: u16) -> u8 {
        let bank = match addr {
            0x8000..=0x9FFF => cart.prg_bank(self.prg_banks[0] as usize, BANK_8K),
            0xA000..=0xBFFF => cart.prg_bank(self.prg_banks[1] as usize, BANK_8K),
            0xC000..=0xDFFF => cart.prg_bank(self.prg_banks[2] as usize, BANK_8K),
            0xE000..=0xFFFF => cart.prg_bank_from_end(0, BANK_8K),
            _ => return 0,
        };
        cart.read_prg(bank, BANK_8K, addr)
    }

    fn cpu_write(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        match addr & 0xF000 {
            0x8000 => self.prg_banks[0] = data & 0x0F,
            0x9000 => {
                // Four-screen boards ignore this bit
                cart.set_mirroring(if data & 0x01 != 0 {
                    Mirroring::Horizontal
                } else {
                    Mirroring::Vertical
                });
                self.chr_banks[0] = (self.chr_banks[0] & 0x0F) | ((data & 0x02) << 3);
                self.chr_banks[1] = (self.chr_banks[1] & 0x0F) | ((data & 0x04) << 2);
            }
            0xA000 => self.prg_banks[1] = data & 0x0F,
            0xC000 => self.prg_banks[2] = data & 0x0F,
            0xE000 => self.chr_banks[0] = (self.chr_banks[0] & 0x10) | (data & 0x0F),
            0xF000 => self.chr_banks[1] = (self.chr_banks[1] & 0x10) | (data & 0x0F),
            0xB000 | 0xD000 => {
                warn!("VRC1: no register at ${:04X}, write ${:02X} ignored", addr, data)
            }
            _ => {}
        }
    }

    fn chr_read(&mut self, cart: &CartridgeImage, addr: u16) -> u8 {
        let slot = ((addr >> 12) & 0x01) as usize;
        let bank = cart.chr_bank(self.chr_banks[slot] as usize, BANK_4K);
        cart.read_chr(bank, BANK_4K, addr)
    }

    fn chr_write(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        let slot = ((addr >> 12) & 0x01) as usize;
        let bank = cart.chr_bank(self.chr_banks[slot] as usize, BANK_4K);
        cart.write_chr(bank, BANK_4K, addr, data);
    }

    fn reset(&mut self, _cart: &mut CartridgeImage) {
        *self = Mapper075::new();
    }
}
