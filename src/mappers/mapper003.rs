//! Mapper 003 (CNROM) implementation
//!
//! This mapper features CHR ROM banking with fixed PRG ROM.
//! Used by games like Arkanoid, Gradius, Solomon's Key, etc.
//!
//! Memory map:
//! - PRG ROM: 16KB (mirrored) or 32KB (fixed)
//! - PRG RAM: 0x6000-0x7FFF when present
//! - CHR ROM: Switchable 8KB bank

use crate::bank::{BANK_32K, BANK_8K};
use crate::cartridge::CartridgeImage;
use super::Mapper;

#[derive(Debug, Default)]
pub struct Mapper003 {
    /// Current CHR bank (2 bits)
    chr_bank: u8,
}

impl Mapper003 {
    /// Create a new Mapper003 instance
    pub fn new() -> Self {
        Mapper003 { chr_bank: 0 }
    }
}

impl Mapper for Mapper003 {
    fn cpu_read(&mut self, cart: &CartridgeImage, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => cart.read_prg_ram((addr & 0x1FFF) as usize),
            0x8000..=0xFFFF => cart.read_prg(cart.prg_bank(0, BANK_32K), BANK_32K, addr),
            _ => 0,
        }
    }

    fn cpu_write(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        match addr {
            0x6000..=0x7FFF => cart.write_prg_ram((addr & 0x1FFF) as usize, data),
            0x8000..=0xFFFF => self.chr_bank = data & 0x03,
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
        self.chr_bank = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mappers::fixtures::{banked, image};

    #[test]
    fn selects_8kb_chr_bank() {
        let mut cart = image(3, banked(0x4000, 2), banked(0x2000, 4));
        let mut mapper = Mapper003::new();

        mapper.cpu_write(&mut cart, 0x8000, 2);
        assert_eq!(mapper.chr_read(&cart, 0x0000), 2);
        assert_eq!(mapper.chr_read(&cart, 0x1FFF), 2);
    }

    #[test]
    fn chr_bank_wraps_into_chr_size() {
        let mut cart = image(3, banked(0x4000, 2), banked(0x2000, 2));
        let mut mapper = Mapper003::new();
        mapper.cpu_write(&mut cart, 0x8000, 3);
        assert_eq!(mapper.chr_read(&cart, 0x0100), 1);
    }

    #[test]
    fn chr_rom_ignores_writes() {
        let mut cart = image(3, banked(0x4000, 2), banked(0x2000, 4));
        let mut mapper = Mapper003::new();
        mapper.chr_write(&mut cart, 0x0010, 0xEE);
        assert_eq!(mapper.chr_read(&cart, 0x0010), 0);
    }

    #[test]
    fn prg_is_fixed() {
        let mut cart = image(3, banked(0x4000, 2), banked(0x2000, 4));
        let mut mapper = Mapper003::new();
        mapper.cpu_write(&mut cart, 0x8000, 1);
        assert_eq!(mapper.cpu_read(&cart, 0x8000), 0);
        assert_eq!(mapper.cpu_read(&cart, 0xC000), 1);
    }
}
