//! Mapper 006 (Front Fareast Magic Card 4M, "FFE F4xxx") implementation
//!
//! Copier-style board. Registers are decoded on `addr & 0xF000`:
//! - 0x8000: 16KB PRG bank at 0x8000 (4 bits)
//! - 0x9000: mirroring (bit 0: 1 = horizontal, 0 = vertical)
//! - 0xA000: PRG RAM protect (bit 7 enables reads, writes need bits 7-6 = 10)
//! - 0xB000: 8KB CHR bank (2 bits)
//!
//! 0xC000-0xFFFF is fixed to the last 16KB bank.

use crate::bank::{BANK_16K, BANK_8K};
use crate::cartridge::{CartridgeImage, Mirroring};
use super::Mapper;

#[derive(Debug, Default)]
pub struct Mapper006 {
    prg_bank: u8,
    chr_bank: u8,
    prg_ram_protect: u8,
}

impl Mapper006 {
    pub fn new() -> Self {
        Mapper006::default()
    }

    fn prg_ram_readable(&self) -> bool {
        self.prg_ram_protect & 0x80 != 0
    }

    fn prg_ram_writable(&self) -> bool {
        self.prg_ram_protect & 0xC0 == 0x80
    }
}

impl Mapper for Mapper006 {
    fn cpu_read(&mut self, cart: &CartridgeImage, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF if self.prg_ram_readable() => {
                cart.read_prg_ram((addr & 0x1FFF) as usize)
            }
            0x8000..=0xBFFF => {
                cart.read_prg(cart.prg_bank(self.prg_bank as usize, BANK_16K), BANK_16K, addr)
            }
            0xC000..=0xFFFF => cart.read_prg(cart.prg_bank_from_end(0, BANK_16K), BANK_16K, addr),
            _ => 0,
        }
    }

    fn cpu_write(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        match addr {
            0x6000..=0x7FFF => {
                if self.prg_ram_writable() {
                    cart.write_prg_ram((addr & 0x1FFF) as usize, data);
                }
            }
            0x8000..=0xFFFF => match addr & 0xF000 {
                0x8000 => self.prg_bank = data & 0x0F,
                0x9000 => cart.set_mirroring(if data & 0x01 != 0 {
                    Mirroring::Horizontal
                } else {
                    Mirroring::Vertical
                }),
                0xA000 => self.prg_ram_protect = data,
                0xB000 => self.chr_bank = data & 0x03,
                _ => {}
            },
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
        *self = Mapper006::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mappers::fixtures::{banked, image};

    #[test]
    fn registers_decode_on_high_nibble() {
        let mut cart = image(6, banked(0x4000, 8), banked(0x2000, 4));
        let mut mapper = Mapper006::new();

        mapper.cpu_write(&mut cart, 0x8FFF, 5);
        mapper.cpu_write(&mut cart, 0xB123, 2);
        assert_eq!(mapper.cpu_read(&cart, 0x8000), 5);
        assert_eq!(mapper.cpu_read(&cart, 0xC000), 7);
        assert_eq!(mapper.chr_read(&cart, 0x0000), 2);

        mapper.cpu_write(&mut cart, 0x9000, 1);
        assert_eq!(cart.mirroring(), Mirroring::Horizontal);
        mapper.cpu_write(&mut cart, 0x9000, 0);
        assert_eq!(cart.mirroring(), Mirroring::Vertical);
    }

    #[test]
    fn prg_ram_protect_gates_reads_and_writes() {
        let mut cart = image(6, banked(0x4000, 2), Vec::new());
        let mut mapper = Mapper006::new();

        mapper.cpu_write(&mut cart, 0x6000, 0x11);
        mapper.cpu_write(&mut cart, 0xA000, 0x80);
        assert_eq!(mapper.cpu_read(&cart, 0x6000), 0);

        mapper.cpu_write(&mut cart, 0x6000, 0x22);
        assert_eq!(mapper.cpu_read(&cart, 0x6000), 0x22);

        // Read-only
        mapper.cpu_write(&mut cart, 0xA000, 0xC0);
        mapper.cpu_write(&mut cart, 0x6000, 0x33);
        assert_eq!(mapper.cpu_read(&cart, 0x6000), 0x22);
    }
}
