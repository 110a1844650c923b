//! Bank index arithmetic
//!
//! Every mapper resolves a CPU or PPU address in two steps: pick a bank number
//! from its registers, then add the offset of the address inside the bank
//! window. `BankIndex` owns the first step and guarantees that the bank number
//! is always wrapped into the number of banks the target buffer really has,
//! the same way the missing high address lines do on a real board.

/// 1KB bank granularity
pub const BANK_1K: usize = 0x0400;

/// 2KB bank granularity
pub const BANK_2K: usize = 0x0800;

/// 4KB bank granularity
pub const BANK_4K: usize = 0x1000;

/// 8KB bank granularity
pub const BANK_8K: usize = 0x2000;

/// 16KB bank granularity
pub const BANK_16K: usize = 0x4000;

/// 32KB bank granularity
pub const BANK_32K: usize = 0x8000;

/// Number of `bank_size` banks in a buffer of `len` bytes.
///
/// A buffer smaller than one bank still counts as one bank; reads inside it
/// wrap around the buffer length instead.
pub fn bank_count(len: usize, bank_size: usize) -> usize {
    (len / bank_size).max(1)
}

/// A bank number wrapped into the bank count of its target buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BankIndex(usize);

impl BankIndex {
    /// Wrap a raw register value into `[0, bank_count)`
    pub fn new(raw: usize, bank_count: usize) -> Self {
        if bank_count == 0 {
            BankIndex(0)
        } else {
            BankIndex(raw % bank_count)
        }
    }

    /// Bank counted from the end of the buffer, `0` being the last bank
    pub fn from_end(back: usize, bank_count: usize) -> Self {
        if bank_count == 0 {
            BankIndex(0)
        } else {
            BankIndex(bank_count - 1 - (back % bank_count))
        }
    }

    /// The wrapped bank number
    pub fn get(self) -> usize {
        self.0
    }

    /// Absolute byte offset of `addr` inside this bank.
    ///
    /// `bank_size` must be a power of two; only the low address bits that
    /// fall inside the bank window are used.
    pub fn offset(self, bank_size: usize, addr: usize) -> usize {
        self.0 * bank_size + (addr & (bank_size - 1))
    }
}
