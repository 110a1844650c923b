//! Mapper interrupt state
//!
//! Mappers that can interrupt the CPU embed an `IrqState`. The `pending` flag
//! is only ever cleared through `acknowledge` (or a mapper register that is
//! documented as an acknowledge), never as a side effect of reading a status
//! register.

use log::trace;

/// Reload value, counter and the enable/pending pair of a mapper IRQ
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IrqState {
    /// Reload value
    pub latch: u16,

    /// Current counter value
    pub counter: u16,

    /// Whether reaching the trigger condition raises `pending`
    pub enabled: bool,

    /// IRQ line asserted towards the CPU
    pub pending: bool,
}

impl IrqState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assert the IRQ line
    pub fn raise(&mut self) {
        if !self.pending {
            trace!("Mapper IRQ asserted (latch={}, counter={})", self.latch, self.counter);
        }
        self.pending = true;
    }

    /// Explicit acknowledge, the only way `pending` clears
    pub fn acknowledge(&mut self) {
        self.pending = false;
    }

    /// Back to power-on state
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Konami VRC style clock: count up, reload from the latch and fire on
    /// overflow past 0xFF.
    pub fn clock_up_8bit(&mut self) {
        if !self.enabled {
            return;
        }
        if self.counter >= 0xFF {
            self.counter = self.latch & 0xFF;
            self.raise();
        } else {
            self.counter += 1;
        }
    }

    /// Down counter that fires when it is clocked at zero and then reloads
    pub fn clock_down(&mut self) {
        if !self.enabled {
            return;
        }
        if self.counter == 0 {
            self.raise();
            self.counter = self.latch;
        } else {
            self.counter -= 1;
        }
    }
}

/// Rising edge detector for PPU address line A12
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct A12Watcher {
    last_address_bit12: bool,
}

impl A12Watcher {
    /// Record the address seen on the PPU bus; true on a 0 -> 1 transition of A12
    pub fn rising_edge(&mut self, addr: u16) -> bool {
        let bit12 = addr & 0x1000 != 0;
        let rising = bit12 && !self.last_address_bit12;
        self.last_address_bit12 = bit12;
        rising
    }

    pub fn reset(&mut self) {
        self.last_address_bit12 = false;
    }
}
