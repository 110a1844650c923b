//! Mapper 001 (MMC1) implementation
//!
//! This mapper features PRG ROM banking, CHR ROM banking, and configurable mirroring.
//! Used by games like The Legend of Zelda, Metroid, Final Fantasy, etc.
//!
//! Registers are loaded serially: five writes to 0x8000-0xFFFF shift one bit
//! each (LSB first) into a shift register, and the fifth write copies the
//! result into the register selected by the address of that write.
//!
//! Memory map:
//! - PRG ROM: 16KB/32KB with banking
//! - PRG RAM: 8KB (0x6000-0x7FFF)
//! - CHR ROM/RAM: 4KB/8KB with banking

use log::debug;
use crate::bank::{BankIndex, BANK_16K, BANK_32K, BANK_4K, BANK_8K};
use crate::cartridge::{CartridgeImage, Mirroring};
use super::Mapper;

/// Control register value at power-on and after a reset write:
/// PRG mode 3 (fix last bank at 0xC000)
const CONTROL_POWER_ON: u8 = 0x0C;

#[derive(Debug)]
pub struct Mapper001 {
    /// Shift register for serial MMC1 writes
    shift_register: u8,

    /// Shift register bit counter
    shift_count: u8,

    /// Control register (0x8000-0x9FFF)
    /// - Bits 0-1: Mirroring
    /// - Bits 2-3: PRG ROM bank mode
    /// - Bit 4: CHR ROM bank mode
    control: u8,

    /// CHR bank 0 register (0xA000-0xBFFF)
    chr_bank_0: u8,

    /// CHR bank 1 register (0xC000-0xDFFF)
    chr_bank_1: u8,

    /// PRG bank register (0xE000-0xFFFF)
    /// - Bits 0-3: PRG bank
    /// - Bit 4: PRG RAM disable
    prg_bank: u8,
}

impl Mapper001 {
    /// Create a new Mapper001 instance
    pub fn new() -> Self {
        Mapper001 {
            shift_register: 0,
            shift_count: 0,
            control: CONTROL_POWER_ON,
            chr_bank_0: 0,
            chr_bank_1: 0,
            prg_bank: 0,
        }
    }

    fn prg_ram_enabled(&self) -> bool {
        self.prg_bank & 0x10 == 0
    }

    /// Read PRG ROM through the current PRG mode
    fn read_prg_rom(&self, cart: &CartridgeImage, addr: u16) -> u8 {
        let bank = (self.prg_bank & 0x0F) as usize;

        match (self.control >> 2) & 0x03 {
            0 | 1 => {
                // 32KB mode (ignore bit 0)
                cart.read_prg(cart.prg_bank(bank >> 1, BANK_32K), BANK_32K, addr)
            }
            2 => {
                // Fixed first bank, switchable second bank
                let bank = if addr < 0xC000 {
                    cart.prg_bank(0, BANK_16K)
                } else {
                    cart.prg_bank(bank, BANK_16K)
                };
                cart.read_prg(bank, BANK_16K, addr)
            }
            _ => {
                // Switchable first bank, fixed last bank
                let bank = if addr < 0xC000 {
                    cart.prg_bank(bank, BANK_16K)
                } else {
                    cart.prg_bank_from_end(0, BANK_16K)
                };
                cart.read_prg(bank, BANK_16K, addr)
            }
        }
    }

    /// Map a PPU address to its CHR bank and window size
    fn chr_window(&self, cart: &CartridgeImage, addr: u16) -> (BankIndex, usize) {
        if self.control & 0x10 == 0 {
            // 8KB mode, low bit of CHR bank 0 ignored
            (cart.chr_bank((self.chr_bank_0 >> 1) as usize, BANK_8K), BANK_8K)
        } else if addr < 0x1000 {
            (cart.chr_bank(self.chr_bank_0 as usize, BANK_4K), BANK_4K)
        } else {
            (cart.chr_bank(self.chr_bank_1 as usize, BANK_4K), BANK_4K)
        }
    }

    /// Update the mirroring mode based on the control register
    fn update_mirroring(&self, cart: &mut CartridgeImage) {
        cart.set_mirroring(match self.control & 0x03 {
            0 => Mirroring::SingleScreenLower,
            1 => Mirroring::SingleScreenUpper,
            2 => Mirroring::Vertical,
            _ => Mirroring::Horizontal,
        });
    }

    /// Write to a mapper register
    fn write_register(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        // Register area is selected by bits 13-14 of the address
        match (addr >> 13) & 0x03 {
            0 => {
                // Control register (0x8000-0x9FFF)
                self.control = data;
                self.update_mirroring(cart);
            }
            1 => {
                // CHR bank 0 register (0xA000-0xBFFF)
                self.chr_bank_0 = data;
            }
            2 => {
                // CHR bank 1 register (0xC000-0xDFFF)
                self.chr_bank_1 = data;
            }
            _ => {
                // PRG bank register (0xE000-0xFFFF)
                self.prg_bank = data & 0x1F;
            }
        }

        debug!(
            "MMC1 Register update: addr=${:04X}, data=${:02X}, control=${:02X}, chr0=${:02X}, \
             chr1=${:02X}, prg=${:02X}",
            addr, data, self.control, self.chr_bank_0, self.chr_bank_1, self.prg_bank
        );
    }
}

impl Default for Mapper001 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper for Mapper001 {
    fn cpu_read(&mut self, cart: &CartridgeImage, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF if self.prg_ram_enabled() => {
                cart.read_prg_ram((addr & 0x1FFF) as usize)
            }
            0x8000..=0xFFFF => self.read_prg_rom(cart, addr),
            _ => 0,
        }
    }

    fn cpu_write(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        match addr {
            0x6000..=0x7FFF => {
                if self.prg_ram_enabled() {
                    cart.write_prg_ram((addr & 0x1FFF) as usize, data);
                }
            }
            0x8000..=0xFFFF => {
                // Reset on bit 7 set
                if (data & 0x80) != 0 {
                    self.shift_register = 0;
                    self.shift_count = 0;
                    self.control |= CONTROL_POWER_ON;
                    return;
                }

                // Serial shift register, LSB first
                self.shift_register |= (data & 0x01) << self.shift_count;
                self.shift_count += 1;

                // If 5 bits have been written, update the register
                if self.shift_count == 5 {
                    let value = self.shift_register;
                    self.write_register(cart, addr, value);
                    self.shift_register = 0;
                    self.shift_count = 0;
                }
            }
            _ => {}
        }
    }

    fn chr_read(&mut self, cart: &CartridgeImage, addr: u16) -> u8 {
        let (bank, size) = self.chr_window(cart, addr);
        cart.read_chr(bank, size, addr)
    }

    fn chr_write(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        let (bank, size) = self.chr_window(cart, addr);
        cart.write_chr(bank, size, addr, data);
    }

    fn reset(&mut self, _cart: &mut CartridgeImage) {
        *self = Mapper001::new();
    }
}
