//! Mapper 002 (UxROM) implementation
//!
//! This mapper features PRG ROM banking with fixed last bank.
//! Used by games like Mega Man, Duck Tales, Castlevania, etc.
//!
//! Memory map:
//! - PRG ROM: Switchable 16KB bank + fixed 16KB bank
//! - CHR ROM/RAM: 8KB (fixed)

use crate::bank::BANK_16K;
use crate::cartridge::CartridgeImage;
use super::Mapper;

#[derive(Debug, Default)]
pub struct Mapper002 {
    /// Current PRG ROM bank
    prg_bank: u8,
}

impl Mapper002 {
    /// Create a new Mapper002 instance
    pub fn new() -> Self {
        Mapper002 { prg_bank: 0 }
    }
}

impl Mapper for Mapper002 {
    fn cpu_read(&mut self, cart: &CartridgeImage, addr: u16) -> u8 {
        match addr {
            0x8000..=0xBFFF => {
                // Switchable bank
                let bank = cart.prg_bank(self.prg_bank as usize, BANK_16K);
                cart.read_prg(bank, BANK_16K, addr)
            }
            0xC000..=0xFFFF => {
                // Fixed last bank
                cart.read_prg(cart.prg_bank_from_end(0, BANK_16K), BANK_16K, addr)
            }
            _ => 0,
        }
    }

    fn cpu_write(&mut self, _cart: &mut CartridgeImage, addr: u16, data: u8) {
        if addr >= 0x8000 {
            // Bank select (ignore address, only data matters)
            self.prg_bank = data;
        }
    }

    fn chr_read(&mut self, cart: &CartridgeImage, addr: u16) -> u8 {
        cart.read_chr_fixed(addr)
    }

    fn chr_write(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        cart.write_chr_fixed(addr, data);
    }

    fn reset(&mut self, _cart: &mut CartridgeImage) {
        self.prg_bank = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mappers::fixtures::{banked, image};

    #[test]
    fn low_window_switches_high_window_fixed() {
        let mut cart = image(2, banked(0x4000, 8), Vec::new());
        let mut mapper = Mapper002::new();

        mapper.cpu_write(&mut cart, 0x8000, 3);
        assert_eq!(mapper.cpu_read(&cart, 0x8000), 3);
        assert_eq!(mapper.cpu_read(&cart, 0xBFFF), 3);
        assert_eq!(mapper.cpu_read(&cart, 0xC000), 7);
    }

    #[test]
    fn any_address_in_rom_area_selects_bank() {
        let mut cart = image(2, banked(0x4000, 8), Vec::new());
        let mut mapper = Mapper002::new();
        mapper.cpu_write(&mut cart, 0xF123, 5);
        assert_eq!(mapper.cpu_read(&cart, 0x9000), 5);
    }

    #[test]
    fn bank_value_wraps_into_rom_size() {
        let mut cart = image(2, banked(0x4000, 4), Vec::new());
        let mut mapper = Mapper002::new();
        mapper.cpu_write(&mut cart, 0x8000, 0x0E);
        assert_eq!(mapper.cpu_read(&cart, 0x8000), 2);
    }

    #[test]
    fn reset_returns_to_bank_zero_and_keeps_chr_ram() {
        let mut cart = image(2, banked(0x4000, 8), Vec::new());
        let mut mapper = Mapper002::new();

        mapper.chr_write(&mut cart, 0x0040, 0x99);
        mapper.cpu_write(&mut cart, 0x8000, 6);
        mapper.reset(&mut cart);

        assert_eq!(mapper.cpu_read(&cart, 0x8000), 0);
        assert_eq!(mapper.chr_read(&cart, 0x0040), 0x99);
    }
}
