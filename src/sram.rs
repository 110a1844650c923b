//! Battery-backed PRG-RAM persistence
//!
//! Save files are a raw dump of the PRG-RAM buffer with no header, so they
//! stay interchangeable with the `.sav` files other emulators write.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use log::{info, warn};
use thiserror::Error;

/// Errors that can occur while saving or loading SRAM
#[derive(Error, Debug)]
pub enum SramError {
    #[error("SRAM I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Conventional save file next to a ROM: `game.nes` -> `game.sav`
pub fn default_path(rom_path: &Path) -> PathBuf {
    rom_path.with_extension("sav")
}

/// Write `data` to `path`, replacing any previous file
pub fn save(path: &Path, data: &[u8]) -> Result<(), SramError> {
    let mut file = fs::File::create(path)?;
    file.write_all(data)?;
    file.flush()?;

    info!("Saved {} bytes of SRAM to {}", data.len(), path.display());
    Ok(())
}

/// Fill `dest` from `path`, returning the number of bytes restored.
///
/// The file is read completely before `dest` is touched, so a failed read
/// leaves the buffer as it was. A size mismatch is tolerated: extra bytes are
/// dropped and a short file only restores the prefix.
pub fn load(path: &Path, dest: &mut [u8]) -> Result<usize, SramError> {
    let data = fs::read(path)?;

    if data.len() != dest.len() {
        warn!("SRAM file {} is {} bytes, expected {}", path.display(), data.len(), dest.len());
    }

    let count = data.len().min(dest.len());
    dest[..count].copy_from_slice(&data[..count]);

    info!("Loaded {} bytes of SRAM from {}", count, path.display());
    Ok(count)
}
