//! NES mapper implementations
//!
//! Mappers are the hardware on the cartridge that decides which ROM/RAM bank
//! answers a given CPU or PPU address. Each mapper keeps only its register
//! state; the memory itself lives in the `CartridgeImage` passed in on every
//! call.

mod mapper000; // NROM
mod mapper001; // MMC1
mod mapper002; // UxROM
mod mapper003; // CNROM
mod mapper004; // MMC3
mod mapper005; // MMC5
mod mapper006; // FFE F4xxx
mod mapper007; // AxROM
mod mapper008; // FFE F3xxx
mod mapper009; // MMC2
mod mapper010; // MMC4
mod mapper011; // Color Dreams
mod mapper020; // Famicom Disk System
mod mapper024; // VRC6 / VRC6a
mod mapper071; // Camerica
mod mapper075; // VRC1
mod mapper085; // VRC7
mod mapper090; // JY Company
mod mapper255; // 110-in-1 multicart

#[cfg(test)]
pub(crate) mod fixtures;

pub use mapper000::Mapper000;
pub use mapper001::Mapper001;
pub use mapper002::Mapper002;
pub use mapper003::Mapper003;
pub use mapper004::Mapper004;
pub use mapper005::Mapper005;
pub use mapper006::Mapper006;
pub use mapper007::Mapper007;
pub use mapper008::Mapper008;
pub use mapper009::Mapper009;
pub use mapper010::Mapper010;
pub use mapper011::Mapper011;
pub use mapper020::{DiskDrive, Mapper020, DISK_SIDE_SIZE};
pub use mapper024::{Mapper024, VrcPins};
pub use mapper071::Mapper071;
pub use mapper075::Mapper075;
pub use mapper085::Mapper085;
pub use mapper090::Mapper090;
pub use mapper255::Mapper255;

use log::info;
use crate::cartridge::{CartridgeError, CartridgeImage};

/// Mapper numbers this crate can build, with their board names
pub const SUPPORTED_MAPPERS: &[(u16, &str)] = &[
    (0, "NROM"),
    (1, "MMC1"),
    (2, "UxROM"),
    (3, "CNROM"),
    (4, "MMC3"),
    (5, "MMC5"),
    (6, "FFE F4xxx"),
    (7, "AxROM"),
    (8, "FFE F3xxx"),
    (9, "MMC2/PxROM"),
    (10, "MMC4/FxROM"),
    (11, "Color Dreams"),
    (20, "Famicom Disk System"),
    (24, "VRC6"),
    (26, "VRC6a"),
    (71, "Camerica"),
    (75, "VRC1"),
    (85, "VRC7"),
    (90, "JY Company"),
    (255, "110-in-1"),
];

/// Board name of a supported mapper number
pub fn mapper_name(mapper_number: u16) -> Option<&'static str> {
    SUPPORTED_MAPPERS
        .iter()
        .find(|(number, _)| *number == mapper_number)
        .map(|(_, name)| *name)
}

pub fn is_mapper_supported(mapper_number: u16) -> bool {
    mapper_name(mapper_number).is_some()
}

/// Trait for NES mappers
pub trait Mapper {
    /// CPU read in $4020-$FFFF; 0 for addresses the board does not decode
    fn cpu_read(&mut self, cart: &CartridgeImage, addr: u16) -> u8;

    /// CPU write in $4020-$FFFF
    fn cpu_write(&mut self, cart: &mut CartridgeImage, addr: u16, value: u8);

    /// PPU pattern table read in $0000-$1FFF
    fn chr_read(&mut self, cart: &CartridgeImage, addr: u16) -> u8;

    /// PPU pattern table write in $0000-$1FFF
    fn chr_write(&mut self, cart: &mut CartridgeImage, addr: u16, value: u8);

    /// Called once per scanline with the PPU's current scanline number
    fn scanline(&mut self, _scanline: u16) {}

    /// PPU nametable read in $2000-$2FFF. `None` leaves the byte to the
    /// console's own nametable RAM.
    fn nametable_read(&mut self, _addr: u16) -> Option<u8> {
        None
    }

    /// PPU nametable write; `true` when the board consumed it
    fn nametable_write(&mut self, _addr: u16, _value: u8) -> bool {
        false
    }

    /// Registers back to power-on defaults. Buffers are not reallocated.
    fn reset(&mut self, cart: &mut CartridgeImage);

    fn shutdown(&mut self) {}

    fn irq_state(&self) -> bool {
        false
    }

    fn irq_clear(&mut self) {}

    /// Famicom Disk System drive, if this board has one
    fn disk_drive(&mut self) -> Option<&mut DiskDrive> {
        None
    }
}

/// Create a mapper instance for `mapper_number` over `cart`
pub fn create_mapper(
    mapper_number: u16,
    cart: &mut CartridgeImage,
) -> Result<Box<dyn Mapper>, CartridgeError> {
    let mapper: Box<dyn Mapper> = match mapper_number {
        0 => Box::new(Mapper000::new()),
        1 => Box::new(Mapper001::new()),
        2 => Box::new(Mapper002::new()),
        3 => Box::new(Mapper003::new()),
        4 => Box::new(Mapper004::new()),
        5 => Box::new(Mapper005::new()),
        6 => Box::new(Mapper006::new()),
        7 => Box::new(Mapper007::new(cart)),
        8 => Box::new(Mapper008::new()),
        9 => Box::new(Mapper009::new()),
        10 => Box::new(Mapper010::new()),
        11 => Box::new(Mapper011::new()),
        20 => Box::new(Mapper020::new()?),
        24 => Box::new(Mapper024::new(VrcPins::Vrc6)),
        26 => Box::new(Mapper024::new(VrcPins::Vrc6a)),
        71 => Box::new(Mapper071::new()),
        75 => Box::new(Mapper075::new()),
        85 => Box::new(Mapper085::new()),
        90 => Box::new(Mapper090::new()),
        255 => Box::new(Mapper255::new()),
        _ => return Err(CartridgeError::UnsupportedMapper(mapper_number)),
    };

    info!("Created mapper {} ({})", mapper_number, mapper_name(mapper_number).unwrap_or("unknown"));
    Ok(mapper)
}
