//! Mapper 085 (Konami VRC7) implementation
//!
//! VRC7 pairs three 8KB PRG banks and eight 1KB CHR banks with the Konami
//! scanline IRQ and an FM synthesis unit. Boards wire the "odd" register line
//! to A4 (VRC7b, Lagrange Point) or A3 (VRC7a, Tiny Toon Adventures 2); both
//! are decoded here.
//!
//! Memory map:
//! - PRG RAM: 8KB (0x6000-0x7FFF), enabled through 0xE000 bit 7
//! - PRG ROM: 8KB at 0x8000, 0xA000, 0xC000 switchable, last 8KB fixed at 0xE000
//! - CHR ROM/RAM: eight switchable 1KB banks

use log::debug;
use crate::bank::{BANK_1K, BANK_8K};
use crate::cartridge::{CartridgeImage, Mirroring};
use crate::irq::IrqState;
use super::Mapper;

/// Size of the FM unit's register file
const AUDIO_REGISTER_COUNT: usize = 0x40;

#[derive(Debug)]
pub struct Mapper085 {
    prg_banks: [u8; 3],
    chr_banks: [u8; 8],
    prg_ram_enabled: bool,

    irq: IrqState,
    irq_enable_after_ack: bool,
    irq_cycle_mode: bool,

    /// FM register selected through 0x9010
    audio_select: u8,
    audio_registers: [u8; AUDIO_REGISTER_COUNT],
}

impl Mapper085 {
    pub fn new() -> Self {
        Mapper085 {
            prg_banks: [0; 3],
            chr_banks: [0; 8],
            prg_ram_enabled: false,
            irq: IrqState::new(),
            irq_enable_after_ack: false,
            irq_cycle_mode: false,
            audio_select: 0,
            audio_registers: [0; AUDIO_REGISTER_COUNT],
        }
    }

    /// FM register file as last written by the CPU
    pub fn audio_registers(&self) -> &[u8] {
        &self.audio_registers
    }

    fn write_register(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        let odd = addr & 0x18 != 0;
        match (addr & 0xF000, odd) {
            (0x8000, false) => self.prg_banks[0] = data & 0x3F,
            (0x8000, true) => self.prg_banks[1] = data & 0x3F,
            (0x9000, false) => self.prg_banks[2] = data & 0x3F,
            (0x9000, true) if addr & 0x20 != 0 => {
                self.audio_registers[self.audio_select as usize % AUDIO_REGISTER_COUNT] = data;
            }
            (0x9000, true) => self.audio_select = data,
            (0xA000..=0xD000, _) => {
                let slot = (((addr >> 12) - 0x0A) * 2) as usize + odd as usize;
                self.chr_banks[slot] = data;
            }
            (0xE000, false) => {
                cart.set_mirroring(match data & 0x03 {
                    0 => Mirroring::Vertical,
                    1 => Mirroring::Horizontal,
                    2 => Mirroring::SingleScreenLower,
                    _ => Mirroring::SingleScreenUpper,
                });
                self.prg_ram_enabled = data & 0x80 != 0;
            }
            (0xE000, true) => self.irq.latch = data as u16,
            (0xF000, false) => {
                self.irq_enable_after_ack = data & 0x01 != 0;
                self.irq.enabled = data & 0x02 != 0;
                self.irq_cycle_mode = data & 0x04 != 0;
                if self.irq.enabled {
                    self.irq.counter = self.irq.latch;
                }
                self.irq.acknowledge();
                debug!(
                    "VRC7 IRQ control: enabled={}, after_ack={}, cycle_mode={}",
                    self.irq.enabled, self.irq_enable_after_ack, self.irq_cycle_mode
                );
            }
            (0xF000, true) => {
                self.irq.acknowledge();
                self.irq.enabled = self.irq_enable_after_ack;
            }
            _ => {}
        }
    }
}

impl Default for Mapper085 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper for Mapper085 {
    fn cpu_read(&mut self, cart: &CartridgeImage, addr: u16) -> u8 {
        let bank = match addr {
            0x6000..=0x7FFF if self.prg_ram_enabled => {
                return cart.read_prg_ram((addr & 0x1FFF) as usize);
            }
            0x8000..=0x9FFF => cart.prg_bank(self.prg_banks[0] as usize, BANK_8K),
            0xA000..=0xBFFF => cart.prg_bank(self.prg_banks[1] as usize, BANK_8K),
            0xC000..=0xDFFF => cart.prg_bank(self.prg_banks[2] as usize, BANK_8K),
            0xE000..=0xFFFF => cart.prg_bank_from_end(0, BANK_8K),
            _ => return 0,
        };
        cart.read_prg(bank, BANK_8K, addr)
    }

    fn cpu_write(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        match addr {
            0x6000..=0x7FFF => {
                if self.prg_ram_enabled {
                    cart.write_prg_ram((addr & 0x1FFF) as usize, data);
                }
            }
            0x8000..=0xFFFF => self.write_register(cart, addr, data),
            _ => {}
        }
    }

    fn chr_read(&mut self, cart: &CartridgeImage, addr: u16) -> u8 {
        let slot = ((addr >> 10) & 0x07) as usize;
        let bank = cart.chr_bank(self.chr_banks[slot] as usize, BANK_1K);
        cart.read_chr(bank, BANK_1K, addr)
    }

    fn chr_write(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        let slot = ((addr >> 10) & 0x07) as usize;
        let bank = cart.chr_bank(self.chr_banks[slot] as usize, BANK_1K);
        cart.write_chr(bank, BANK_1K, addr, data);
    }

    fn scanline(&mut self, _scanline: u16) {
        self.irq.clock_up_8bit();
    }

    fn reset(&mut self, _cart: &mut CartridgeImage) {
        *self = Mapper085::new();
    }

    fn irq_state(&self) -> bool {
        self.irq.pending
    }

    fn irq_clear(&mut self) {
        self.irq.acknowledge();
    }
}
