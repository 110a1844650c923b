//! RustyNES cartridge core
//!
//! Address decoding and bank switching for NES cartridges. The CPU and PPU
//! talk to a [`Cartridge`], which forwards every access in $4020-$FFFF (CPU)
//! and $0000-$1FFF (PPU) to the board's mapper.

pub mod bank;
pub mod cartridge;
pub mod irq;
pub mod mappers;
pub mod sram;

pub use bank::BankIndex;
pub use cartridge::{Cartridge, CartridgeError, CartridgeImage, ChrMemory, Mirroring, RomMetadata};
pub use irq::IrqState;
pub use mappers::{create_mapper, is_mapper_supported, mapper_name, DiskDrive, Mapper};
pub use sram::SramError;
