//! Mapper 011 (Color Dreams) implementation
//!
//! Unlicensed discrete-logic board with one register at 0x8000-0xFFFF:
//! - Bits 0-1: 32KB PRG bank
//! - Bits 4-7: 8KB CHR bank

use crate::bank::{BANK_32K, BANK_8K};
use crate::cartridge::CartridgeImage;
use super::Mapper;

#[derive(Debug, Default)]
pub struct Mapper011 {
    prg_bank: u8,
    chr_bank: u8,
}

impl Mapper011 {
    pub fn new() -> Self {
        Mapper011::default()
    }
}

impl Mapper for Mapper011 {
    fn cpu_read(&mut self, cart: &CartridgeImage, addr: u16) -> u8 {
        match addr {
            0x8000..=0xFFFF => {
                cart.read_prg(cart.prg_bank(self.prg_bank as usize, BANK_32K), BANK_32K, addr)
            }
            _ => 0,
        }
    }

    fn cpu_write(&mut self, _cart: &mut CartridgeImage, addr: u16, data: u8) {
        if addr >= 0x8000 {
            self.prg_bank = data & 0x03;
            self.chr_bank = data >> 4;
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
