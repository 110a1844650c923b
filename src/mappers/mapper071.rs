//! Mapper 071 (Camerica/Codemasters) implementation
//!
//! UxROM-like board: a 16KB bank register at 0xC000-0xFFFF switches
//! 0x8000-0xBFFF while 0xC000-0xFFFF stays on the last bank. Fire Hawk's
//! board adds single-screen mirroring control at 0x9000-0x9FFF.
//!
//! Memory map:
//! - PRG ROM: Switchable 16KB bank + fixed last 16KB bank
//! - CHR RAM: 8KB

use crate::bank::BANK_16K;
use crate::cartridge::{CartridgeImage, Mirroring};
use super::Mapper;

#[derive(Debug, Default)]
pub struct Mapper071 {
    /// Current PRG ROM bank
    prg_bank: u8,
}

impl Mapper071 {
    pub fn new() -> Self {
        Mapper071 { prg_bank: 0 }
    }
}

impl Mapper for Mapper071 {
    fn cpu_read(&mut self, cart: &CartridgeImage, addr: u16) -> u8 {
        match addr {
            0x8000..=0xBFFF => {
                cart.read_prg(cart.prg_bank(self.prg_bank as usize, BANK_16K), BANK_16K, addr)
            }
            0xC000..=0xFFFF => cart.read_prg(cart.prg_bank_from_end(0, BANK_16K), BANK_16K, addr),
            _ => 0,
        }
    }

    fn cpu_write(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        match addr {
            0x9000..=0x9FFF => {
                cart.set_mirroring(if data & 0x10 != 0 {
                    Mirroring::SingleScreenUpper
                } else {
                    Mirroring::SingleScreenLower
                });
            }
            0xC000..=0xFFFF => self.prg_bank = data & 0x0F,
            _ => {}
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
    fn bank_register_lives_in_upper_half() {
        let mut cart = image(71, banked(0x4000, 8), Vec::new());
        let mut mapper = Mapper071::new();

        mapper.cpu_write(&mut cart, 0x8000, 3);
        assert_eq!(mapper.cpu_read(&cart, 0x8000), 0);

        mapper.cpu_write(&mut cart, 0xC000, 3);
        assert_eq!(mapper.cpu_read(&cart, 0x8000), 3);
        assert_eq!(mapper.cpu_read(&cart, 0xC000), 7);
    }

    #[test]
    fn fire_hawk_mirroring_register() {
        let mut cart = image(71, banked(0x4000, 8), Vec::new());
        let mut mapper = Mapper071::new();

        mapper.cpu_write(&mut cart, 0x9000, 0x10);
        assert_eq!(cart.mirroring(), Mirroring::SingleScreenUpper);
        mapper.cpu_write(&mut cart, 0x9FFF, 0x00);
        assert_eq!(cart.mirroring(), Mirroring::SingleScreenLower);
    }
}
