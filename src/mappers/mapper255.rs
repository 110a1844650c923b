//! Mapper 255 (110-in-1 multicart) implementation
//!
//! The whole register is the address of the write; the data byte is ignored.
//!
//! Latched address bits:
//! - A14: outer bank (selects the second half of 2MB boards)
//! - A13: mirroring (0 = vertical, 1 = horizontal)
//! - A12: PRG mode (0 = 32KB, 1 = 16KB)
//! - A6-A11: 16KB PRG bank
//! - A0-A5: 8KB CHR bank
//!
//! Four 4-bit RAM cells sit at 0x5800-0x5FFF, mirrored every 4 bytes.

use log::debug;
use crate::bank::{BANK_16K, BANK_32K, BANK_8K};
use crate::cartridge::{CartridgeImage, Mirroring};
use super::Mapper;

#[derive(Debug, Default)]
pub struct Mapper255 {
    /// Address of the last write to 0x8000-0xFFFF
    latch: u16,

    ram: [u8; 4],
}

impl Mapper255 {
    pub fn new() -> Self {
        Self::default()
    }

    fn outer(&self) -> usize {
        ((self.latch >> 14) & 0x01) as usize
    }

    fn prg_bank_16k(&self) -> usize {
        self.outer() << 6 | ((self.latch >> 6) & 0x3F) as usize
    }

    fn chr_bank(&self) -> usize {
        self.outer() << 6 | (self.latch & 0x3F) as usize
    }

    fn prg_16k_mode(&self) -> bool {
        self.latch & 0x1000 != 0
    }
}

impl Mapper for Mapper255 {
    fn cpu_read(&mut self, cart: &CartridgeImage, addr: u16) -> u8 {
        match addr {
            0x5800..=0x5FFF => self.ram[(addr & 0x03) as usize] & 0x0F,
            0x8000..=0xFFFF if self.prg_16k_mode() => {
                cart.read_prg(cart.prg_bank(self.prg_bank_16k(), BANK_16K), BANK_16K, addr)
            }
            0x8000..=0xFFFF => {
                cart.read_prg(cart.prg_bank(self.prg_bank_16k() >> 1, BANK_32K), BANK_32K, addr)
            }
            _ => 0,
        }
    }

    fn cpu_write(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        match addr {
            0x5800..=0x5FFF => self.ram[(addr & 0x03) as usize] = data & 0x0F,
            0x8000..=0xFFFF => {
                self.latch = addr;
                cart.set_mirroring(if addr & 0x2000 != 0 {
                    Mirroring::Horizontal
                } else {
                    Mirroring::Vertical
                });
                debug!(
                    "110-in-1 latch ${:04X}: PRG {} ({}), CHR {}",
                    addr,
                    self.prg_bank_16k(),
                    if self.prg_16k_mode() { "16KB" } else { "32KB" },
                    self.chr_bank()
                );
            }
            _ => {}
        }
    }

    fn chr_read(&mut self, cart: &CartridgeImage, addr: u16) -> u8 {
        cart.read_chr(cart.chr_bank(self.chr_bank(), BANK_8K), BANK_8K, addr)
    }

    fn chr_write(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        let bank = cart.chr_bank(self.chr_bank(), BANK_8K);
        cart.write_chr(bank, BANK_8K, addr, data);
    }

    fn reset(&mut self, cart: &mut CartridgeImage) {
        // The RAM cells survive a soft reset, the latch does not
        self.latch = 0;
        cart.set_mirroring(Mirroring::Vertical);
    }
}
