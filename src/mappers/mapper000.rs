//! Mapper 000 (NROM) implementation
//!
//! This is the simplest mapper, with no bank switching capabilities.
//! Used by games like Super Mario Bros., Donkey Kong, Ice Climber, etc.
//!
//! Memory map:
//! - PRG ROM: 16KB (mirrored) or 32KB at 0x8000-0xFFFF
//! - PRG RAM: up to 8KB at 0x6000-0x7FFF (Family Basic)
//! - CHR ROM/RAM: 8KB (fixed)

use log::warn;
use crate::bank::BANK_32K;
use crate::cartridge::CartridgeImage;
use super::Mapper;

#[derive(Debug, Default)]
pub struct Mapper000;

impl Mapper000 {
    pub fn new() -> Self {
        Mapper000
    }
}

impl Mapper for Mapper000 {
    fn cpu_read(&mut self, cart: &CartridgeImage, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => cart.read_prg_ram((addr & 0x1FFF) as usize),
            // A 16KB image wraps into both halves of the window
            0x8000..=0xFFFF => cart.read_prg(cart.prg_bank(0, BANK_32K), BANK_32K, addr),
            _ => 0,
        }
    }

    fn cpu_write(&mut self, cart: &mut CartridgeImage, addr: u16, value: u8) {
        match addr {
            0x6000..=0x7FFF => cart.write_prg_ram((addr & 0x1FFF) as usize, value),
            0x8000..=0xFFFF => warn!("NROM: write ${:02X} to ROM at ${:04X} ignored", value, addr),
            _ => {}
        }
    }

    fn chr_read(&mut self, cart: &CartridgeImage, addr: u16) -> u8 {
        cart.read_chr_fixed(addr)
    }

    fn chr_write(&mut self, cart: &mut CartridgeImage, addr: u16, value: u8) {
        cart.write_chr_fixed(addr, value);
    }

    fn reset(&mut self, _cart: &mut CartridgeImage) {
        // No registers
    }
}
