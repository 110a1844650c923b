//! Mapper 007 (AxROM) implementation
//!
//! 32KB PRG ROM switching with single-screen mirroring selected by the same
//! register. Used by games like Battletoads, Marble Madness and Wizards & Warriors.
//!
//! Register (0x8000-0xFFFF):
//! - Bits 0-2: 32KB PRG bank
//! - Bit 4: nametable select (single-screen lower/upper)

use log::debug;
use crate::bank::BANK_32K;
use crate::cartridge::{CartridgeImage, Mirroring};
use super::Mapper;

#[derive(Debug)]
pub struct Mapper007 {
    /// Current 32KB PRG bank
    prg_bank: u8,
}

impl Mapper007 {
    /// AxROM boards power up showing the lower nametable
    pub fn new(cart: &mut CartridgeImage) -> Self {
        cart.set_mirroring(Mirroring::SingleScreenLower);
        Mapper007 { prg_bank: 0 }
    }
}

impl Mapper for Mapper007 {
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
            0x8000..=0xFFFF => {
                self.prg_bank = data & 0x07;
                cart.set_mirroring(if data & 0x10 != 0 {
                    Mirroring::SingleScreenUpper
                } else {
                    Mirroring::SingleScreenLower
                });
                debug!("AxROM: prg=${:02X}, mirroring={:?}", self.prg_bank, cart.mirroring());
            }
            _ => {}
        }
    }

    fn chr_read(&mut self, cart: &CartridgeImage, addr: u16) -> u8 {
        cart.read_chr_fixed(addr)
    }

    fn chr_write(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        cart.write_chr_fixed(addr, data);
    }

    fn reset(&mut self, cart: &mut CartridgeImage) {
        self.prg_bank = 0;
        cart.set_mirroring(Mirroring::SingleScreenLower);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cartridge::RomMetadata;
    use crate::mappers::fixtures::{banked, image};

    #[test]
    fn register_selects_bank_and_nametable() {
        let mut cart = image(7, banked(0x8000, 8), Vec::new());
        let mut mapper = Mapper007::new(&mut cart);
        assert_eq!(cart.mirroring(), Mirroring::SingleScreenLower);

        mapper.cpu_write(&mut cart, 0x8000, 0x15);
        assert_eq!(mapper.cpu_read(&cart, 0x8000), 5);
        assert_eq!(mapper.cpu_read(&cart, 0xFFFF), 5);
        assert_eq!(cart.mirroring(), Mirroring::SingleScreenUpper);

        mapper.cpu_write(&mut cart, 0x8000, 0x02);
        assert_eq!(cart.mirroring(), Mirroring::SingleScreenLower);
    }

    #[test]
    fn reset_restores_bank_and_nametable() {
        let mut cart = image(7, banked(0x8000, 4), Vec::new());
        let mut mapper = Mapper007::new(&mut cart);
        mapper.cpu_write(&mut cart, 0x8000, 0x13);
        mapper.reset(&mut cart);
        assert_eq!(mapper.cpu_read(&cart, 0x8000), 0);
        assert_eq!(cart.mirroring(), Mirroring::SingleScreenLower);
    }

    #[test]
    fn board_without_work_ram_reads_zero() {
        let meta = RomMetadata { mapper_number: 7, prg_ram_size: 0, ..RomMetadata::default() };
        let mut cart = CartridgeImage::new(&meta, banked(0x8000, 2), Vec::new()).unwrap();
        let mut mapper = Mapper007::new(&mut cart);

        mapper.cpu_write(&mut cart, 0x6000, 0x5A);
        assert_eq!(mapper.cpu_read(&cart, 0x6000), 0);
        assert_eq!(mapper.cpu_read(&cart, 0x7FFF), 0);
    }
}
