//! Mapper 004 (MMC3) implementation
//!
//! This mapper features PRG ROM banking, CHR ROM banking, and configurable mirroring.
//! It also has an IRQ counter clocked by rising edges of PPU address line A12,
//! which happen once per scanline when backgrounds and sprites use different
//! pattern tables.
//!
//! Used by games like Super Mario Bros. 2/3, Mega Man 3-6, Kirby's Adventure, etc.
//!
//! Memory map:
//! - PRG ROM: Two switchable 8KB banks + fixed second-last and last 8KB banks
//! - PRG RAM: 8KB (0x6000-0x7FFF)
//! - CHR ROM/RAM: Two switchable 2KB banks + four switchable 1KB banks
//!
//! Registers (decoded with `addr & 0xE001`):
//! - 0x8000 bank select, 0x8001 bank data
//! - 0xA000 mirroring, 0xA001 PRG RAM protect
//! - 0xC000 IRQ latch, 0xC001 IRQ reload
//! - 0xE000 IRQ disable/acknowledge, 0xE001 IRQ enable

use log::debug;
use crate::bank::{BANK_1K, BANK_8K};
use crate::cartridge::{CartridgeImage, Mirroring};
use crate::irq::{A12Watcher, IrqState};
use super::Mapper;

#[derive(Debug)]
pub struct Mapper004 {
    /// Bank register targeted by the next bank data write (0-7)
    bank_select: u8,

    /// PRG ROM bank mode: swaps 0x8000 and 0xC000
    prg_mode: bool,

    /// CHR A12 inversion: swaps the 2KB and 1KB halves
    chr_mode: bool,

    /// Bank registers (R0-R7)
    bank_registers: [u8; 8],

    /// PRG RAM chip enable (0xA001 bit 7)
    prg_ram_enabled: bool,

    /// PRG RAM write protect (0xA001 bit 6)
    prg_ram_write_protect: bool,

    /// Scanline counter state, latch is the reload value
    irq: IrqState,

    /// Reload flag (true = reload on next clock)
    irq_reload: bool,

    /// A12 edge detection across PPU accesses
    a12: A12Watcher,
}

impl Mapper004 {
    /// Create a new Mapper004 instance
    pub fn new() -> Self {
        Mapper004 {
            bank_select: 0,
            prg_mode: false,
            chr_mode: false,
            bank_registers: [0; 8],
            prg_ram_enabled: true,
            prg_ram_write_protect: false,
            irq: IrqState::new(),
            irq_reload: false,
            a12: A12Watcher::default(),
        }
    }

    /// Map a CPU address in 0x8000-0xFFFF to a PRG byte
    fn read_prg_rom(&self, cart: &CartridgeImage, addr: u16) -> u8 {
        let r6 = cart.prg_bank(self.bank_registers[6] as usize, BANK_8K);
        let r7 = cart.prg_bank(self.bank_registers[7] as usize, BANK_8K);
        let second_last = cart.prg_bank_from_end(1, BANK_8K);
        let last = cart.prg_bank_from_end(0, BANK_8K);

        let bank = match (addr, self.prg_mode) {
            (0x8000..=0x9FFF, false) => r6,
            (0x8000..=0x9FFF, true) => second_last,
            (0xA000..=0xBFFF, _) => r7,
            (0xC000..=0xDFFF, false) => second_last,
            (0xC000..=0xDFFF, true) => r6,
            _ => last,
        };
        cart.read_prg(bank, BANK_8K, addr)
    }

    /// Raw 1KB bank number for a PPU address
    fn chr_bank_1k(&self, addr: u16) -> usize {
        // Inversion swaps the two pattern table halves
        let addr = if self.chr_mode { addr ^ 0x1000 } else { addr };
        let r = &self.bank_registers;

        match addr & 0x1FFF {
            0x0000..=0x03FF => (r[0] & 0xFE) as usize,
            0x0400..=0x07FF => (r[0] | 0x01) as usize,
            0x0800..=0x0BFF => (r[1] & 0xFE) as usize,
            0x0C00..=0x0FFF => (r[1] | 0x01) as usize,
            0x1000..=0x13FF => r[2] as usize,
            0x1400..=0x17FF => r[3] as usize,
            0x1800..=0x1BFF => r[4] as usize,
            _ => r[5] as usize,
        }
    }

    /// Clock the scanline counter on an A12 rising edge
    fn clock_irq_counter(&mut self) {
        if self.irq.counter == 0 || self.irq_reload {
            self.irq.counter = self.irq.latch;
            self.irq_reload = false;
        } else {
            self.irq.counter -= 1;
        }

        if self.irq.counter == 0 && self.irq.enabled {
            self.irq.raise();
        }
    }

    fn watch_a12(&mut self, addr: u16) {
        if self.a12.rising_edge(addr) {
            self.clock_irq_counter();
        }
    }

    fn write_register(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        match addr & 0xE001 {
            0x8000 => {
                self.bank_select = data & 0x07;
                self.prg_mode = data & 0x40 != 0;
                self.chr_mode = data & 0x80 != 0;
            }
            0x8001 => {
                let index = self.bank_select as usize;
                // R6/R7 only have 6 bits on the PRG side
                self.bank_registers[index] = if index >= 6 { data & 0x3F } else { data };
                debug!("MMC3 R{} = ${:02X}", index, self.bank_registers[index]);
            }
            0xA000 => {
                cart.set_mirroring(if data & 0x01 != 0 {
                    Mirroring::Horizontal
                } else {
                    Mirroring::Vertical
                });
            }
            0xA001 => {
                self.prg_ram_enabled = data & 0x80 != 0;
                self.prg_ram_write_protect = data & 0x40 != 0;
            }
            0xC000 => self.irq.latch = data as u16,
            0xC001 => {
                self.irq.counter = 0;
                self.irq_reload = true;
            }
            0xE000 => {
                self.irq.enabled = false;
                self.irq.acknowledge();
            }
            _ => self.irq.enabled = true,
        }
    }
}

impl Default for Mapper004 {
    fn default() -> Self {
        Self::new()
    }
}

impl Mapper for Mapper004 {
    fn cpu_read(&mut self, cart: &CartridgeImage, addr: u16) -> u8 {
        match addr {
            0x6000..=0x7FFF if self.prg_ram_enabled => cart.read_prg_ram((addr & 0x1FFF) as usize),
            0x8000..=0xFFFF => self.read_prg_rom(cart, addr),
            _ => 0,
        }
    }

    fn cpu_write(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        match addr {
            0x6000..=0x7FFF => {
                if self.prg_ram_enabled && !self.prg_ram_write_protect {
                    cart.write_prg_ram((addr & 0x1FFF) as usize, data);
                }
            }
            0x8000..=0xFFFF => self.write_register(cart, addr, data),
            _ => {}
        }
    }

    fn chr_read(&mut self, cart: &CartridgeImage, addr: u16) -> u8 {
        self.watch_a12(addr);
        let bank = cart.chr_bank(self.chr_bank_1k(addr), BANK_1K);
        cart.read_chr(bank, BANK_1K, addr)
    }

    fn chr_write(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        self.watch_a12(addr);
        let bank = cart.chr_bank(self.chr_bank_1k(addr), BANK_1K);
        cart.write_chr(bank, BANK_1K, addr, data);
    }

    fn reset(&mut self, _cart: &mut CartridgeImage) {
        *self = Mapper004::new();
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

    fn mmc3() -> (Mapper004, CartridgeImage) {
        (Mapper004::new(), image(4, banked(0x2000, 16), banked(0x0400, 64)))
    }

    /// One low/high pair of pattern fetches, producing one A12 rising edge
    fn a12_edge(mapper: &mut Mapper004, cart: &CartridgeImage) {
        mapper.chr_read(cart, 0x0000);
        mapper.chr_read(cart, 0x1000);
    }

    #[test]
    fn r0_selects_2kb_window_at_0000() {
        let (mut mapper, mut cart) = mmc3();
        mapper.cpu_write(&mut cart, 0x8000, 0x00);
        mapper.cpu_write(&mut cart, 0x8001, 12);

        assert_eq!(mapper.chr_read(&cart, 0x0000), 12);
        assert_eq!(mapper.chr_read(&cart, 0x0400), 13);

        // Low bit ignored: the same 2KB window
        mapper.cpu_write(&mut cart, 0x8001, 13);
        assert_eq!(mapper.chr_read(&cart, 0x0000), 12);
        assert_eq!(mapper.chr_read(&cart, 0x07FF), 13);
    }

    #[test]
    fn r0_matches_chr_rom_at_2kb_granularity() {
        let chr: Vec<u8> = (0..0x10000).map(|i| (i >> 8) as u8 ^ (i as u8)).collect();
        let mut cart = image(4, banked(0x2000, 4), chr.clone());
        let mut mapper = Mapper004::new();

        for n in (0u8..64).step_by(2) {
            mapper.cpu_write(&mut cart, 0x8000, 0x00);
            mapper.cpu_write(&mut cart, 0x8001, n);
            assert_eq!(mapper.chr_read(&cart, 0x0000), chr[(n as usize / 2) * 0x800]);
        }
    }

    #[test]
    fn chr_inversion_swaps_pattern_table_halves() {
        let (mut mapper, mut cart) = mmc3();
        mapper.cpu_write(&mut cart, 0x8000, 0x02);
        mapper.cpu_write(&mut cart, 0x8001, 33);
        mapper.cpu_write(&mut cart, 0x8000, 0x00);
        mapper.cpu_write(&mut cart, 0x8001, 8);

        assert_eq!(mapper.chr_read(&cart, 0x1000), 33);
        assert_eq!(mapper.chr_read(&cart, 0x0000), 8);

        mapper.cpu_write(&mut cart, 0x8000, 0x80);
        assert_eq!(mapper.chr_read(&cart, 0x0000), 33);
        assert_eq!(mapper.chr_read(&cart, 0x1000), 8);
        assert_eq!(mapper.chr_read(&cart, 0x1400), 9);
    }

    #[test]
    fn prg_mode_swaps_fixed_second_last_bank() {
        let (mut mapper, mut cart) = mmc3();
        mapper.cpu_write(&mut cart, 0x8000, 0x06);
        mapper.cpu_write(&mut cart, 0x8001, 3);
        mapper.cpu_write(&mut cart, 0x8000, 0x07);
        mapper.cpu_write(&mut cart, 0x8001, 4);

        assert_eq!(mapper.cpu_read(&cart, 0x8000), 3);
        assert_eq!(mapper.cpu_read(&cart, 0xA000), 4);
        assert_eq!(mapper.cpu_read(&cart, 0xC000), 14);
        assert_eq!(mapper.cpu_read(&cart, 0xE000), 15);

        mapper.cpu_write(&mut cart, 0x8000, 0x46);
        assert_eq!(mapper.cpu_read(&cart, 0x8000), 14);
        assert_eq!(mapper.cpu_read(&cart, 0xA000), 4);
        assert_eq!(mapper.cpu_read(&cart, 0xC000), 3);
        assert_eq!(mapper.cpu_read(&cart, 0xE000), 15);
    }

    #[test]
    fn irq_fires_only_after_sixth_edge_with_latch_five() {
        let (mut mapper, mut cart) = mmc3();
        mapper.cpu_write(&mut cart, 0xC000, 5);
        mapper.cpu_write(&mut cart, 0xC001, 0);
        mapper.cpu_write(&mut cart, 0xE001, 0);

        for edge in 1..=5 {
            a12_edge(&mut mapper, &cart);
            assert!(!mapper.irq_state(), "pending after edge {}", edge);
        }
        a12_edge(&mut mapper, &cart);
        assert!(mapper.irq_state());
    }

    #[test]
    fn staying_high_is_not_an_edge() {
        let (mut mapper, mut cart) = mmc3();
        mapper.cpu_write(&mut cart, 0xC000, 1);
        mapper.cpu_write(&mut cart, 0xC001, 0);
        mapper.cpu_write(&mut cart, 0xE001, 0);

        mapper.chr_read(&cart, 0x0000);
        for addr in [0x1000, 0x1010, 0x1FF0, 0x1800] {
            mapper.chr_read(&cart, addr);
        }
        assert_eq!(mapper.irq.counter, 1);
        assert!(!mapper.irq_state());
    }

    #[test]
    fn chr_writes_also_clock_the_counter() {
        let mut cart = image(4, banked(0x2000, 4), Vec::new());
        let mut mapper = Mapper004::new();
        mapper.cpu_write(&mut cart, 0xC000, 0);
        mapper.cpu_write(&mut cart, 0xE001, 0);

        mapper.chr_write(&mut cart, 0x0000, 1);
        mapper.chr_write(&mut cart, 0x1000, 1);
        assert!(mapper.irq_state());
    }

    #[test]
    fn pending_is_kept_until_acknowledged() {
        let (mut mapper, mut cart) = mmc3();
        mapper.cpu_write(&mut cart, 0xC000, 0);
        mapper.cpu_write(&mut cart, 0xE001, 0);
        a12_edge(&mut mapper, &cart);
        assert!(mapper.irq_state());

        mapper.cpu_read(&cart, 0x8000);
        mapper.cpu_read(&cart, 0x6000);
        assert!(mapper.irq_state());

        mapper.irq_clear();
        assert!(!mapper.irq_state());
    }

    #[test]
    fn disabling_acknowledges_and_blocks_irq() {
        let (mut mapper, mut cart) = mmc3();
        mapper.cpu_write(&mut cart, 0xC000, 0);
        mapper.cpu_write(&mut cart, 0xE001, 0);
        a12_edge(&mut mapper, &cart);
        assert!(mapper.irq_state());

        mapper.cpu_write(&mut cart, 0xE000, 0);
        assert!(!mapper.irq_state());
        a12_edge(&mut mapper, &cart);
        assert!(!mapper.irq_state());
    }

    #[test]
    fn reload_request_waits_for_next_edge() {
        let (mut mapper, mut cart) = mmc3();
        mapper.cpu_write(&mut cart, 0xC000, 3);
        mapper.cpu_write(&mut cart, 0xC001, 0);
        a12_edge(&mut mapper, &cart);
        a12_edge(&mut mapper, &cart);
        assert_eq!(mapper.irq.counter, 2);

        mapper.cpu_write(&mut cart, 0xC000, 7);
        mapper.cpu_write(&mut cart, 0xC001, 0);
        assert_eq!(mapper.irq.counter, 0);
        a12_edge(&mut mapper, &cart);
        assert_eq!(mapper.irq.counter, 7);
    }

    #[test]
    fn mirroring_and_ram_protect() {
        let (mut mapper, mut cart) = mmc3();
        mapper.cpu_write(&mut cart, 0xA000, 1);
        assert_eq!(cart.mirroring(), Mirroring::Horizontal);
        mapper.cpu_write(&mut cart, 0xA000, 0);
        assert_eq!(cart.mirroring(), Mirroring::Vertical);

        mapper.cpu_write(&mut cart, 0x6000, 0x12);
        mapper.cpu_write(&mut cart, 0xA001, 0xC0);
        mapper.cpu_write(&mut cart, 0x6000, 0x34);
        assert_eq!(mapper.cpu_read(&cart, 0x6000), 0x12);

        mapper.cpu_write(&mut cart, 0xA001, 0x00);
        assert_eq!(mapper.cpu_read(&cart, 0x6000), 0);
    }

    #[test]
    fn reset_restores_power_on_registers_but_not_ram() {
        let (mut mapper, mut cart) = mmc3();
        mapper.cpu_write(&mut cart, 0x6000, 0x42);
        mapper.cpu_write(&mut cart, 0x8000, 0x46);
        mapper.cpu_write(&mut cart, 0x8001, 9);
        mapper.reset(&mut cart);

        assert_eq!(mapper.bank_registers, [0; 8]);
        assert!(!mapper.prg_mode);
        assert_eq!(mapper.cpu_read(&cart, 0x6000), 0x42);
    }
}
