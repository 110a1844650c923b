//! Mapper 024/026 (Konami VRC6) implementation
//!
//! VRC6 adds three expansion sound channels, a 16KB + 8KB PRG layout, eight
//! 1KB CHR banks and the Konami scanline IRQ. Mapper 26 (VRC6a) is the same
//! chip with the A0 and A1 address pins swapped on the board.
//!
//! Used by Akumajou Densetsu (VRC6, mapper 24), Madara and Esper Dream 2
//! (VRC6a, mapper 26).
//!
//! Memory map:
//! - PRG RAM: 8KB (0x6000-0x7FFF), enabled through 0xB003 bit 7
//! - PRG ROM: 16KB switchable at 0x8000, 8KB switchable at 0xC000, last 8KB fixed at 0xE000
//! - CHR ROM/RAM: eight switchable 1KB banks
//!
//! Registers (after pin normalization, decoded with `addr & 0xF003`):
//! - 0x8000 16KB PRG select, 0xC000 8KB PRG select
//! - 0x9000-0x9003, 0xA000-0xA002, 0xB000-0xB002 sound
//! - 0xB003 banking style / mirroring / PRG RAM enable
//! - 0xD000-0xD003, 0xE000-0xE003 CHR selects
//! - 0xF000 IRQ latch, 0xF001 IRQ control, 0xF002 IRQ acknowledge

use log::debug;
use crate::bank::{BANK_16K, BANK_1K, BANK_8K};
use crate::cartridge::{CartridgeImage, Mirroring};
use crate::irq::IrqState;
use super::Mapper;

/// Board wiring of the two low address lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VrcPins {
    /// A0 -> A0, A1 -> A1 (iNES mapper 24)
    Vrc6,
    /// A0 -> A1, A1 -> A0 (iNES mapper 26)
    Vrc6a,
}

impl VrcPins {
    /// Register address as seen by the chip
    fn normalize(self, addr: u16) -> u16 {
        let addr = addr & 0xF003;
        match self {
            VrcPins::Vrc6 => addr,
            VrcPins::Vrc6a => (addr & 0xF000) | ((addr & 0x01) << 1) | ((addr & 0x02) >> 1),
        }
    }
}

#[derive(Debug)]
pub struct Mapper024 {
    pins: VrcPins,

    /// 16KB bank at 0x8000
    prg_bank_16k: u8,

    /// 8KB bank at 0xC000
    prg_bank_8k: u8,

    chr_banks: [u8; 8],

    /// 0xB003 bit 7
    prg_ram_enabled: bool,

    irq: IrqState,

    /// Re-enable the counter when the IRQ is acknowledged
    irq_enable_after_ack: bool,

    /// Cycle mode (control bit 2); counted per scanline here as well
    irq_cycle_mode: bool,

    /// Pulse 1 ($9000-$9002) and frequency scaling ($9003)
    pulse1: [u8; 4],
    pulse2: [u8; 3],
    sawtooth: [u8; 3],
}

impl Mapper024 {
    pub fn new(pins: VrcPins) -> Self {
        Mapper024 {
            pins,
            prg_bank_16k: 0,
            prg_bank_8k: 0,
            chr_banks: [0; 8],
            prg_ram_enabled: false,
            irq: IrqState::new(),
            irq_enable_after_ack: false,
            irq_cycle_mode: false,
            pulse1: [0; 4],
            pulse2: [0; 3],
            sawtooth: [0; 3],
        }
    }

    /// Expansion sound register file: pulse 1 (+ $9003), pulse 2, sawtooth
    pub fn sound_registers(&self) -> ([u8; 4], [u8; 3], [u8; 3]) {
        (self.pulse1, self.pulse2, self.sawtooth)
    }

    fn chr_slot(addr: u16) -> usize {
        ((addr >> 10) & 0x07) as usize
    }

    fn write_register(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        let reg = self.pins.normalize(addr);
        match reg {
            0x8000..=0x8003 => self.prg_bank_16k = data & 0x0F,
            0x9000..=0x9003 => self.pulse1[(reg & 0x03) as usize] = data,
            0xA000..=0xA002 => self.pulse2[(reg & 0x03) as usize] = data,
            0xB000..=0xB002 => self.sawtooth[(reg & 0x03) as usize] = data,
            0xB003 => {
                cart.set_mirroring(match (data >> 2) & 0x03 {
                    0 => Mirroring::Vertical,
                    1 => Mirroring::Horizontal,
                    2 => Mirroring::SingleScreenLower,
                    _ => Mirroring::SingleScreenUpper,
                });
                self.prg_ram_enabled = data & 0x80 != 0;
            }
            0xC000..=0xC003 => self.prg_bank_8k = data & 0x1F,
            0xD000..=0xD003 => self.chr_banks[(reg & 0x03) as usize] = data,
            0xE000..=0xE003 => self.chr_banks[4 + (reg & 0x03) as usize] = data,
            0xF000 => self.irq.latch = data as u16,
            0xF001 => {
                self.irq_enable_after_ack = data & 0x01 != 0;
                self.irq.enabled = data & 0x02 != 0;
                self.irq_cycle_mode = data & 0x04 != 0;
                if self.irq.enabled {
                    self.irq.counter = self.irq.latch;
                }
                self.irq.acknowledge();
                debug!(
                    "VRC6 IRQ control: enabled={}, after_ack={}, cycle_mode={}",
                    self.irq.enabled, self.irq_enable_after_ack, self.irq_cycle_mode
                );
            }
            0xF002 => {
                self.irq.acknowledge();
                self.irq.enabled = self.irq_enable_after_ack;
            }
            _ => {}
        }
    }
}

impl Mapper for Mapper024 {
    fn cpu_read(&mut self, cart: &CartridgeImage, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF if self.prg_ram_enabled => cart.read_prg_ram((addr & 0x1FFF) as usize),
            0x8000..=0xBFFF => {
                let bank = cart.prg_bank(self.prg_bank_16k as usize, BANK_16K);
                cart.read_prg(bank, BANK_16K, addr)
            }
            0xC000..=0xDFFF => {
                let bank = cart.prg_bank(self.prg_bank_8k as usize, BANK_8K);
                cart.read_prg(bank, BANK_8K, addr)
            }
            0xE000..=0xFFFF => cart.read_prg(cart.prg_bank_from_end(0, BANK_8K), BANK_8K, addr),
            _ => 0,
        }
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
        let bank = cart.chr_bank(self.chr_banks[Self::chr_slot(addr)] as usize, BANK_1K);
        cart.read_chr(bank, BANK_1K, addr)
    }

    fn chr_write(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        let bank = cart.chr_bank(self.chr_banks[Self::chr_slot(addr)] as usize, BANK_1K);
        cart.write_chr(bank, BANK_1K, addr, data);
    }

    fn scanline(&mut self, _scanline: u16) {
        // Cycle mode would clock every CPU cycle; without a cycle feed both
        // modes advance once per scanline.
        self.irq.clock_up_8bit();
    }

    fn reset(&mut self, _cart: &mut CartridgeImage) {
        *self = Mapper024::new(self.pins);
    }

    fn irq_state(&self) -> bool {
        self.irq.pending
    }

    fn irq_clear(&mut self) {
        self.irq.acknowledge();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mappers::fixtures::{banked, image};

    fn vrc6(pins: VrcPins) -> (Mapper024, CartridgeImage) {
        (Mapper024::new(pins), image(24, banked(0x2000, 16), banked(0x0400, 32)))
    }

    #[test]
    fn prg_layout_is_16k_8k_and_fixed_last() {
        let (mut mapper, mut cart) = vrc6(VrcPins::Vrc6);
        mapper.cpu_write(&mut cart, 0x8000, 2);
        mapper.cpu_write(&mut cart, 0xC000, 9);

        // 16KB bank 2 spans 8KB banks 4 and 5
        assert_eq!(mapper.cpu_read(&cart, 0x8000), 4);
        assert_eq!(mapper.cpu_read(&cart, 0xA000), 5);
        assert_eq!(mapper.cpu_read(&cart, 0xC000), 9);
        assert_eq!(mapper.cpu_read(&cart, 0xE000), 15);
        assert_eq!(mapper.cpu_read(&cart, 0xFFFF), 15);
    }

    #[test]
    fn chr_registers_follow_pin_wiring() {
        let (mut mapper, mut cart) = vrc6(VrcPins::Vrc6);
        mapper.cpu_write(&mut cart, 0xD001, 7);
        mapper.cpu_write(&mut cart, 0xE002, 20);
        assert_eq!(mapper.chr_read(&cart, 0x0400), 7);
        assert_eq!(mapper.chr_read(&cart, 0x1800), 20);

        let (mut mapper, mut cart) = vrc6(VrcPins::Vrc6a);
        // A0 and A1 are swapped: 0xD001 reaches CHR register 2
        mapper.cpu_write(&mut cart, 0xD001, 7);
        mapper.cpu_write(&mut cart, 0xE002, 20);
        assert_eq!(mapper.chr_read(&cart, 0x0800), 7);
        assert_eq!(mapper.chr_read(&cart, 0x1400), 20);
        mapper.cpu_write(&mut cart, 0xD003, 3);
        assert_eq!(mapper.chr_read(&cart, 0x0C00), 3);
    }

    #[test]
    fn mirroring_and_ram_enable_share_b003() {
        let (mut mapper, mut cart) = vrc6(VrcPins::Vrc6);
        mapper.cpu_write(&mut cart, 0x6000, 0x55);
        assert_eq!(mapper.cpu_read(&cart, 0x6000), 0);

        mapper.cpu_write(&mut cart, 0xB003, 0x80 | 0x04);
        assert_eq!(cart.mirroring(), Mirroring::Horizontal);
        mapper.cpu_write(&mut cart, 0x6000, 0x55);
        assert_eq!(mapper.cpu_read(&cart, 0x6000), 0x55);

        mapper.cpu_write(&mut cart, 0xB003, 0x0C);
        assert_eq!(cart.mirroring(), Mirroring::SingleScreenUpper);

        // On VRC6a the same register sits at 0xB003 too (both low bits set)
        let (mut mapper, mut cart) = vrc6(VrcPins::Vrc6a);
        mapper.cpu_write(&mut cart, 0xB003, 0x08);
        assert_eq!(cart.mirroring(), Mirroring::SingleScreenLower);
    }

    #[test]
    fn sound_registers_are_stored() {
        let (mut mapper, mut cart) = vrc6(VrcPins::Vrc6a);
        mapper.cpu_write(&mut cart, 0x9001, 0x12);
        mapper.cpu_write(&mut cart, 0xA000, 0x34);
        mapper.cpu_write(&mut cart, 0xB002, 0x56);
        let (pulse1, pulse2, saw) = mapper.sound_registers();
        assert_eq!(pulse1[2], 0x12);
        assert_eq!(pulse2[0], 0x34);
        assert_eq!(saw[1], 0x56);
    }

    #[test]
    fn irq_counts_up_from_latch_and_fires_on_overflow() {
        let (mut mapper, mut cart) = vrc6(VrcPins::Vrc6);
        mapper.cpu_write(&mut cart, 0xF000, 0xFD);
        mapper.cpu_write(&mut cart, 0xF001, 0x02);

        mapper.scanline(0);
        mapper.scanline(1);
        assert!(!mapper.irq_state());
        mapper.scanline(2);
        assert!(mapper.irq_state());

        // Reading does not acknowledge
        mapper.cpu_read(&cart, 0x8000);
        assert!(mapper.irq_state());

        mapper.cpu_write(&mut cart, 0xF002, 0);
        assert!(!mapper.irq_state());
        // Enable-after-ack was clear, so the counter stops
        assert!(!mapper.irq.enabled);
    }

    #[test]
    fn acknowledge_restores_enable_after_ack() {
        let (mut mapper, mut cart) = vrc6(VrcPins::Vrc6a);
        mapper.cpu_write(&mut cart, 0xF000, 0xFF);
        // VRC6a: control lives at 0xF002
        mapper.cpu_write(&mut cart, 0xF002, 0x03);
        mapper.scanline(0);
        assert!(mapper.irq_state());

        mapper.cpu_write(&mut cart, 0xF001, 0);
        assert!(!mapper.irq_state());
        assert!(mapper.irq.enabled);
    }

    #[test]
    fn reset_keeps_pin_wiring() {
        let (mut mapper, mut cart) = vrc6(VrcPins::Vrc6a);
        mapper.cpu_write(&mut cart, 0x8000, 3);
        mapper.reset(&mut cart);
        assert_eq!(mapper.pins, VrcPins::Vrc6a);
        assert_eq!(mapper.cpu_read(&cart, 0x8000), 0);
    }
}
