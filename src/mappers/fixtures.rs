//! ROM fixtures shared by the mapper tests

use crate::cartridge::{CartridgeImage, Mirroring, RomMetadata};

/// `banks` banks of `bank_size` bytes, every byte holding its bank number
pub(crate) fn banked(bank_size: usize, banks: usize) -> Vec<u8> {
    (0..banks).flat_map(|bank| std::iter::repeat(bank as u8).take(bank_size)).collect()
}

/// Image for `mapper_number` with default RAM sizes and horizontal mirroring
pub(crate) fn image(mapper_number: u16, prg_rom: Vec<u8>, chr_rom: Vec<u8>) -> CartridgeImage {
    let meta = RomMetadata { mapper_number, ..RomMetadata::default() };
    CartridgeImage::new(&meta, prg_rom, chr_rom).unwrap()
}

/// Same as `image` with an explicit initial mirroring
pub(crate) fn image_mirrored(
    mapper_number: u16,
    prg_rom: Vec<u8>,
    chr_rom: Vec<u8>,
    mirroring: Mirroring,
) -> CartridgeImage {
    let meta = RomMetadata { mapper_number, mirroring, ..RomMetadata::default() };
    CartridgeImage::new(&meta, prg_rom, chr_rom).unwrap()
}
