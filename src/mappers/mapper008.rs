//! Mapper 008 (Front Fareast Magic Card 1M/2M, "FFE F3xxx") implementation
//!
//! - 0x8000-0xAFFF: 32KB PRG bank (4 bits)
//! - 0xB000-0xDFFF: 8KB CHR bank (4 bits)
//! - 0x6000-0x7FFF: PRG RAM

use crate::bank::{BANK_32K, BANK_8K};
use crate::cartridge::CartridgeImage;
use super::Mapper;

#[derive(Debug, Default)]
pub struct Mapper008 {
    prg_bank: u8,
    chr_bank: u8,
}

impl Mapper008 {
    pub fn new() -> Self {
        Mapper008::default()
    }
}

impl Mapper for Mapper008 {
    fn cpu_read(&mut self, cart: &CartridgeImage, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => cart.read_prg_ram((addr & 0x1FFF) as usize),
            0x8000..=0xFFFF => {
                cart.read_prg(cart.prg_bank(self.prg_bank as usize, BANK_32K), BANK_32K, addr)
            }
            _ => 0,
        }
    }

    fn cpu_write(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        match addr {
            0x6000..=0x7FFF => cart.write_prg_ram((addr & 0x1FFF) as usize, data),
            0x8000..=0xAFFF => self.prg_bank = data & 0x0F,
            0xB000..=0xDFFF => self.chr_bank = data & 0x0F,
            _ => {}
        }
    }

    fn chr_read(&mut self, cart: &CartridgeImage, addr: u16) -> u8 {
        cart.read_chr(cart.chr_bank(self.chr_bank as usize, BANK_8K), BANK_8K, addr)
    }

    fn chr_write(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        let bank = cart.chr_bank(self.chr_bank as usize, BANK_8K);
        cart.write_chr(bank, BANK_8K, addr, data);
    }

    fn reset(&mut self, _cart: &mut CartridgeImage) {
        self.prg_bank = 0;
        self.chr_bank = 0;
    }
}
