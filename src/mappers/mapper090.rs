//! Mapper 090 (JY Company) implementation
//!
//! Pirate ASIC with four PRG banking modes, four CHR banking modes, a
//! hardware 8x8 multiplier and a down-counting scanline IRQ.
//!
//! Memory map:
//! - 0x5800/0x5801: multiplier operands (write), product low/high (read)
//! - 0x5803: one byte of scratch RAM
//! - PRG RAM: 8KB (0x6000-0x7FFF), or a ROM bank when 0xD000 bit 7 is set
//! - PRG ROM: 32KB/16KB/8KB modes at 0x8000-0xFFFF
//! - CHR ROM/RAM: 8KB/4KB/2KB/1KB modes with 16-bit bank registers
//!
//! Registers (decoded with `addr & 0xF007`):
//! - 0x8000-0x8003 PRG banks, 0x9000-0x9007 CHR low, 0xA000-0xA007 CHR high
//! - 0xC000-0xC007 IRQ, 0xD000 banking mode, 0xD001 mirroring

use log::debug;
use crate::bank::{BANK_16K, BANK_1K, BANK_2K, BANK_32K, BANK_4K, BANK_8K};
use crate::cartridge::{CartridgeImage, Mirroring};
use crate::irq::IrqState;
use super::Mapper;

#[derive(Debug)]
pub struct Mapper090 {
    prg_banks: [u8; 4],
    chr_low: [u8; 8],
    chr_high: [u8; 8],

    /// 0xD000: bits 0-1 PRG mode, bit 2 last bank from register 3,
    /// bits 3-4 CHR mode, bit 7 ROM at 0x6000
    mode: u8,

    multiplicand: u8,
    multiplier: u8,
    scratch: u8,

    irq: IrqState,
}

impl Mapper090 {
    pub fn new() -> Self {
        Mapper090 {
            prg_banks: [0; 4],
            chr_low: [0; 8],
            chr_high: [0; 8],
            mode: 0,
            multiplicand: 0,
            multiplier: 0,
            scratch: 0,
            irq: IrqState::new(),
        }
    }

    fn product(&self) -> u16 {
        self.multiplicand as u16 * self.multiplier as u16
    }

    fn prg_mode(&self) -> u8 {
        self.mode & 0x03
    }

    /// Bank number mapped at 0xE000 (or the top of larger windows)
    fn last_bank(&self, cart: &CartridgeImage, size: usize) -> usize {
        if self.mode & 0x04 != 0 {
            self.prg_banks[3] as usize
        } else {
            cart.prg_bank_count(size) - 1
        }
    }

    fn read_prg_rom(&self, cart: &CartridgeImage, addr: u16) -> u8 {
        let slot = ((addr - 0x8000) >> 13) as usize;
        let (raw, size) = match self.prg_mode() {
            0 => (self.last_bank(cart, BANK_32K), BANK_32K),
            1 if slot < 2 => (self.prg_banks[1] as usize, BANK_16K),
            1 => (self.last_bank(cart, BANK_16K), BANK_16K),
            mode => {
                let raw = match slot {
                    3 if self.mode & 0x04 == 0 => cart.prg_bank_count(BANK_8K) - 1,
                    // Mode 3 wires the register bits in reverse order
                    _ if mode == 3 => (self.prg_banks[slot].reverse_bits() >> 1) as usize,
                    _ => self.prg_banks[slot] as usize,
                };
                (raw, BANK_8K)
            }
        };
        cart.read_prg(cart.prg_bank(raw, size), size, addr)
    }

    fn chr_register(&self, index: usize) -> usize {
        (self.chr_high[index] as usize) << 8 | self.chr_low[index] as usize
    }

    /// Bank number and bank size for a PPU address
    fn chr_mapping(&self, addr: u16) -> (usize, usize) {
        let slot = ((addr >> 10) & 0x07) as usize;
        match (self.mode >> 3) & 0x03 {
            0 => (self.chr_register(0), BANK_8K),
            1 => (self.chr_register(slot & 0x04), BANK_4K),
            2 => (self.chr_register(slot & 0x06), BANK_2K),
            _ => (self.chr_register(slot), BANK_1K),
        }
    }

    fn write_register(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        let reg = addr & 0xF007;
        match reg {
            0x8000..=0x8003 => self.prg_banks[(reg & 0x03) as usize] = data & 0x7F,
            0x9000..=0x9007 => self.chr_low[(reg & 0x07) as usize] = data,
            0xA000..=0xA007 => self.chr_high[(reg & 0x07) as usize] = data,
            0xC000 => {
                self.irq.enabled = data & 0x01 != 0;
                if !self.irq.enabled {
                    self.irq.acknowledge();
                }
            }
            // Counting source select; the counter always advances per scanline
            0xC001 => debug!("JY IRQ source ${:02X}", data),
            0xC002 => {
                self.irq.enabled = false;
                self.irq.acknowledge();
            }
            0xC003 => self.irq.enabled = true,
            0xC005 => {
                self.irq.latch = data as u16;
                self.irq.counter = data as u16;
            }
            0xD000 => {
                self.mode = data;
                debug!("JY mode: PRG {}, CHR {}", data & 0x03, (data >> 3) & 0x03);
            }
            0xD001 => {
                cart.set_mirroring(match data & 0x03 {
                    0 => Mirroring::Vertical,
                    1 => Mirroring::Horizontal,
                    2 => Mirroring::SingleScreenLower,
                    _ => Mirroring::SingleScreenUpper,
                });
            }
            _ => {}
        }
    }
}

impl Default for Mapper090 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper for Mapper090 {
    fn cpu_read(&mut self, cart: &CartridgeImage, addr: u16) -> u8 {
        match addr {
            0x5800 => self.product() as u8,
            0x5801 => (self.product() >> 8) as u8,
            0x5803 => self.scratch,
            0x6000..=0x7FFF if self.mode & 0x80 != 0 => {
                cart.read_prg(cart.prg_bank(self.prg_banks[3] as usize, BANK_8K), BANK_8K, addr)
            }
            0x6000..=0x7FFF => cart.read_prg_ram((addr & 0x1FFF) as usize),
            0x8000..=0xFFFF => self.read_prg_rom(cart, addr),
            _ => 0,
        }
    }

    fn cpu_write(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        match addr {
            0x5800 => self.multiplicand = data,
            0x5801 => self.multiplier = data,
            0x5803 => self.scratch = data,
            0x6000..=0x7FFF => {
                if self.mode & 0x80 == 0 {
                    cart.write_prg_ram((addr & 0x1FFF) as usize, data);
                }
            }
            0x8000..=0xFFFF => self.write_register(cart, addr, data),
            _ => {}
        }
    }

    fn chr_read(&mut self, cart: &CartridgeImage, addr: u16) -> u8 {
        let (raw, size) = self.chr_mapping(addr);
        cart.read_chr(cart.chr_bank(raw, size), size, addr)
    }

    fn chr_write(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        let (raw, size) = self.chr_mapping(addr);
        let bank = cart.chr_bank(raw, size);
        cart.write_chr(bank, size, addr, data);
    }

    fn scanline(&mut self, _scanline: u16) {
        self.irq.clock_down();
    }

    fn reset(&mut self, _cart: &mut CartridgeImage) {
        *self = Mapper090::new();
    }

    fn irq_state(&self) -> bool {
        self.irq.pending
    }

    fn irq_clear(&mut self) {
        self.irq.acknowledge();
    }
}
