//! Mapper 009 (MMC2/PxROM) implementation
//!
//! Used only by Mike Tyson's Punch-Out!!. Each 4KB pattern table half has two
//! CHR bank registers and a latch choosing between them. The PPU flips a latch
//! simply by fetching the tiles $FD or $FE, which lets the game swap graphics
//! mid-frame without any CPU involvement.
//!
//! Memory map:
//! - PRG ROM: switchable 8KB bank at 0x8000 + three fixed last 8KB banks
//! - CHR ROM: two 4KB windows, each with a $FD and a $FE bank register

use crate::bank::{BANK_4K, BANK_8K};
use crate::cartridge::{CartridgeImage, Mirroring};
use super::Mapper;

/// Value a pattern table latch can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Latch {
    Fd,
    Fe,
}

/// CHR latch logic shared by MMC2 and MMC4
#[derive(Debug, Clone)]
pub(super) struct Mmc2Latch {
    /// CHR bank registers: [half][0 = $FD, 1 = $FE]
    chr_banks: [[u8; 2]; 2],

    /// Latch of each pattern table half
    latches: [Latch; 2],
}

impl Mmc2Latch {
    pub(super) fn new() -> Self {
        Mmc2Latch {
            chr_banks: [[0; 2]; 2],
            latches: [Latch::Fe; 2],
        }
    }

    /// Handle 0xB000-0xFFFF register writes; true if the address was decoded
    pub(super) fn write_register(
        &mut self,
        cart: &mut CartridgeImage,
        addr: u16,
        data: u8,
    ) -> bool {
        match addr & 0xF000 {
            0xB000 => self.chr_banks[0][0] = data & 0x1F,
            0xC000 => self.chr_banks[0][1] = data & 0x1F,
            0xD000 => self.chr_banks[1][0] = data & 0x1F,
            0xE000 => self.chr_banks[1][1] = data & 0x1F,
            0xF000 => cart.set_mirroring(if data & 0x01 != 0 {
                Mirroring::Horizontal
            } else {
                Mirroring::Vertical
            }),
            _ => return false,
        }
        true
    }

    fn window(&self, addr: u16) -> usize {
        let half = ((addr >> 12) & 0x01) as usize;
        let latch = match self.latches[half] {
            Latch::Fd => 0,
            Latch::Fe => 1,
        };
        self.chr_banks[half][latch] as usize
    }

    /// Flip a latch when the fetch hits one of the trigger tiles
    fn observe(&mut self, addr: u16) {
        match addr & 0x1FF8 {
            0x0FD8 => self.latches[0] = Latch::Fd,
            0x0FE8 => self.latches[0] = Latch::Fe,
            0x1FD8 => self.latches[1] = Latch::Fd,
            0x1FE8 => self.latches[1] = Latch::Fe,
            _ => {}
        }
    }

    /// PPU read through the latched bank; the latch switches after the fetch
    pub(super) fn chr_read(&mut self, cart: &CartridgeImage, addr: u16) -> u8 {
        let value = cart.read_chr(cart.chr_bank(self.window(addr), BANK_4K), BANK_4K, addr);
        self.observe(addr);
        value
    }

    pub(super) fn chr_write(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        let bank = cart.chr_bank(self.window(addr), BANK_4K);
        cart.write_chr(bank, BANK_4K, addr, data);
    }

    pub(super) fn reset(&mut self) {
        *self = Mmc2Latch::new();
    }

    #[cfg(test)]
    pub(super) fn latch(&self, half: usize) -> Latch {
        self.latches[half]
    }
}

#[derive(Debug)]
pub struct Mapper009 {
    /// Switchable 8KB PRG bank at 0x8000
    prg_bank: u8,

    latch: Mmc2Latch,
}

impl Mapper009 {
    pub fn new() -> Self {
        Mapper009 {
            prg_bank: 0,
            latch: Mmc2Latch::new(),
        }
    }
}

impl Default for Mapper009 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper for Mapper009 {
    fn cpu_read(&mut self, cart: &CartridgeImage, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF => cart.read_prg_ram((addr & 0x1FFF) as usize),
            0x8000..=0x9FFF => {
                cart.read_prg(cart.prg_bank(self.prg_bank as usize, BANK_8K), BANK_8K, addr)
            }
            0xA000..=0xFFFF => {
                // Last three banks, in order
                let back = (0xFFFF - addr as usize) / BANK_8K;
                cart.read_prg(cart.prg_bank_from_end(back, BANK_8K), BANK_8K, addr)
            }
            _ => 0,
        }
    }

    fn cpu_write(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        match addr {
            0x6000..=0x7FFF => cart.write_prg_ram((addr & 0x1FFF) as usize, data),
            0xA000..=0xAFFF => self.prg_bank = data & 0x0F,
            0xB000..=0xFFFF => {
                self.latch.write_register(cart, addr, data);
            }
            _ => {}
        }
    }

    fn chr_read(&mut self, cart: &CartridgeImage, addr: u16) -> u8 {
        self.latch.chr_read(cart, addr)
    }

    fn chr_write(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        self.latch.chr_write(cart, addr, data);
    }

    fn reset(&mut self, _cart: &mut CartridgeImage) {
        self.prg_bank = 0;
        self.latch.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mappers::fixtures::{banked, image};

    fn punch_out() -> (Mapper009, CartridgeImage) {
        let mut cart = image(9, banked(0x2000, 16), banked(0x1000, 32));
        let mut mapper = Mapper009::new();
        mapper.cpu_write(&mut cart, 0xB000, 4);
        mapper.cpu_write(&mut cart, 0xC000, 5);
        mapper.cpu_write(&mut cart, 0xD000, 6);
        mapper.cpu_write(&mut cart, 0xE000, 7);
        (mapper, cart)
    }

    #[test]
    fn fd_and_fe_tiles_flip_lower_latch() {
        let (mut mapper, cart) = punch_out();

        mapper.chr_read(&cart, 0x0FD8);
        assert_eq!(mapper.chr_read(&cart, 0x0000), 4);

        mapper.chr_read(&cart, 0x0FE8);
        assert_eq!(mapper.chr_read(&cart, 0x0000), 5);
    }

    #[test]
    fn upper_latch_is_independent() {
        let (mut mapper, cart) = punch_out();

        assert_eq!(mapper.chr_read(&cart, 0x1000), 7);
        mapper.chr_read(&cart, 0x1FDF);
        assert_eq!(mapper.chr_read(&cart, 0x1000), 6);
        assert_eq!(mapper.chr_read(&cart, 0x0000), 5);

        mapper.chr_read(&cart, 0x1FE8);
        assert_eq!(mapper.chr_read(&cart, 0x1000), 7);
    }

    #[test]
    fn other_tiles_leave_latches_alone() {
        let (mut mapper, cart) = punch_out();
        mapper.chr_read(&cart, 0x0FD8);
        for addr in [0x0FD0, 0x0FE0, 0x0FF8, 0x1FD0, 0x0000] {
            mapper.chr_read(&cart, addr);
        }
        assert_eq!(mapper.latch.latch(0), Latch::Fd);
        assert_eq!(mapper.latch.latch(1), Latch::Fe);
    }

    #[test]
    fn cpu_writes_never_move_latches() {
        let (mut mapper, mut cart) = punch_out();
        mapper.cpu_write(&mut cart, 0x8FD8, 0xFD);
        mapper.cpu_write(&mut cart, 0xBFD8, 4);
        assert_eq!(mapper.latch.latch(0), Latch::Fe);
    }

    #[test]
    fn prg_has_one_switchable_bank_and_three_fixed() {
        let (mut mapper, mut cart) = punch_out();
        mapper.cpu_write(&mut cart, 0xA000, 9);

        assert_eq!(mapper.cpu_read(&cart, 0x8000), 9);
        assert_eq!(mapper.cpu_read(&cart, 0xA000), 13);
        assert_eq!(mapper.cpu_read(&cart, 0xC000), 14);
        assert_eq!(mapper.cpu_read(&cart, 0xE000), 15);
    }

    #[test]
    fn mirroring_register() {
        let (mut mapper, mut cart) = punch_out();
        mapper.cpu_write(&mut cart, 0xF000, 1);
        assert_eq!(cart.mirroring(), Mirroring::Horizontal);
        mapper.cpu_write(&mut cart, 0xF000, 0);
        assert_eq!(cart.mirroring(), Mirroring::Vertical);
    }

    #[test]
    fn reset_returns_latches_to_fe() {
        let (mut mapper, mut cart) = punch_out();
        mapper.chr_read(&cart, 0x0FD8);
        mapper.reset(&mut cart);
        assert_eq!(mapper.latch.latch(0), Latch::Fe);
    }
}
