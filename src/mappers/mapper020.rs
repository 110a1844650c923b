//! Mapper 020 (Famicom Disk System) implementation
//!
//! The disk system replaces the cartridge with a RAM adapter: 32KB of work
//! RAM at 0x6000-0xDFFF, the 8KB BIOS at 0xE000-0xFFFF (supplied as the PRG
//! buffer), 8KB of CHR RAM and a register block at 0x4020-0x409F driving the
//! disk drive, a timer IRQ and the wavetable sound channel.
//!
//! Registers:
//! - 0x4020/0x4021: timer reload low/high
//! - 0x4022: timer control (bit 0 enables and reloads)
//! - 0x4023: drive mode (bit 0 motor, bit 1 write mode)
//! - 0x4024: disk write data
//! - 0x4025: control (bit 3 mirroring, bit 7 disk IRQ enable)
//! - 0x4030: status, 0x4031: disk read data, 0x4032: drive status, 0x4033: battery
//! - 0x4040-0x407F: wave RAM, 0x4080-0x408A: sound registers

use log::{debug, info, warn};
use crate::bank::BANK_8K;
use crate::cartridge::{CartridgeError, CartridgeImage, Mirroring};
use crate::irq::IrqState;
use super::Mapper;

/// Usable bytes on one disk side
pub const DISK_SIDE_SIZE: usize = 65500;

/// fwNES header found in front of many `.fds` images
const FDS_HEADER: [u8; 4] = [0x46, 0x44, 0x53, 0x1A];
const FDS_HEADER_SIZE: usize = 16;

const WORK_RAM_SIZE: usize = 32 * 1024;
const WAVE_RAM_SIZE: usize = 64;
const SOUND_REGISTER_COUNT: usize = 11;

/// Disk drive with the inserted disk image
#[derive(Debug, Default)]
pub struct DiskDrive {
    /// Raw data of every disk side
    sides: Vec<Vec<u8>>,

    /// Side under the head
    side: usize,

    inserted: bool,

    /// Head position within the side
    position: usize,

    motor_on: bool,

    write_mode: bool,
}

impl DiskDrive {
    /// Insert a disk image, with or without fwNES header; returns the side count
    pub fn insert(&mut self, image: &[u8]) -> Result<usize, CartridgeError> {
        let data = if image.len() >= FDS_HEADER_SIZE && image[0..4] == FDS_HEADER {
            &image[FDS_HEADER_SIZE..]
        } else {
            image
        };

        if data.is_empty() {
            return Err(CartridgeError::InvalidMetadata("empty disk image".into()));
        }

        self.sides = data
            .chunks(DISK_SIDE_SIZE)
            .map(|chunk| {
                let mut side = chunk.to_vec();
                side.resize(DISK_SIDE_SIZE, 0);
                side
            })
            .collect();
        self.side = 0;
        self.position = 0;
        self.inserted = true;

        info!("Inserted disk with {} side(s)", self.sides.len());
        Ok(self.sides.len())
    }

    pub fn eject(&mut self) {
        self.inserted = false;
        self.position = 0;
    }

    /// Flip or swap to `side`, rewinding the head; false if the side does not exist
    pub fn select_side(&mut self, side: usize) -> bool {
        if side >= self.sides.len() {
            warn!("Disk side {} does not exist ({} sides)", side, self.sides.len());
            return false;
        }
        self.side = side;
        self.position = 0;
        self.inserted = true;
        true
    }

    pub fn side_count(&self) -> usize {
        self.sides.len()
    }

    pub fn is_inserted(&self) -> bool {
        self.inserted && !self.sides.is_empty()
    }

    /// Contents of a side, including bytes written by the program
    pub fn side_data(&self, side: usize) -> Option<&[u8]> {
        self.sides.get(side).map(|data| data.as_slice())
    }

    fn readable(&self) -> bool {
        self.is_inserted() && self.motor_on && !self.write_mode
    }

    fn writable(&self) -> bool {
        self.is_inserted() && self.motor_on && self.write_mode
    }

    /// Move the head forward; true when it wrapped past the end of the side
    fn advance(&mut self) -> bool {
        self.position += 1;
        if self.position >= DISK_SIDE_SIZE {
            debug!("End of disk side {} reached", self.side);
            self.position = 0;
            return true;
        }
        false
    }

    /// Byte under the head and whether the side ended
    fn read_byte(&mut self) -> (u8, bool) {
        let value = self.sides[self.side][self.position];
        (value, self.advance())
    }

    fn write_byte(&mut self, value: u8) -> bool {
        self.sides[self.side][self.position] = value;
        self.advance()
    }
}

#[derive(Debug)]
pub struct Mapper020 {
    /// 32KB work RAM at 0x6000-0xDFFF
    ram: Vec<u8>,

    /// Timer IRQ; `latch` is the 16-bit reload value
    irq: IrqState,

    /// Raise the IRQ when a disk side ends
    disk_irq_enabled: bool,

    drive: DiskDrive,

    wave_ram: [u8; WAVE_RAM_SIZE],

    /// Wave RAM accepts writes (0x4080 bit 7)
    wave_write_enabled: bool,

    /// Sound registers 0x4080-0x408A
    sound: [u8; SOUND_REGISTER_COUNT],
}

impl Mapper020 {
    pub fn new() -> Result<Self, CartridgeError> {
        let mut ram = Vec::new();
        ram.try_reserve_exact(WORK_RAM_SIZE)
            .map_err(|_| CartridgeError::Allocation {
                region: "FDS work RAM",
                size: WORK_RAM_SIZE,
            })?;
        ram.resize(WORK_RAM_SIZE, 0);

        Ok(Mapper020 {
            ram,
            irq: IrqState::new(),
            disk_irq_enabled: false,
            drive: DiskDrive::default(),
            wave_ram: [0; WAVE_RAM_SIZE],
            wave_write_enabled: false,
            sound: [0; SOUND_REGISTER_COUNT],
        })
    }

    /// Sound registers 0x4080-0x408A as last written
    pub fn sound_registers(&self) -> &[u8] {
        &self.sound
    }

    pub fn wave_ram(&self) -> &[u8] {
        &self.wave_ram
    }

    fn status(&self) -> u8 {
        let mut status = 0;
        if self.irq.pending {
            status |= 0x01;
        }
        if !self.drive.is_inserted() {
            status |= 0x02;
        }
        if !self.drive.write_mode {
            status |= 0x04;
        }
        if self.drive.motor_on {
            status |= 0x08;
        }
        if self.drive.write_mode {
            status |= 0x40;
        }
        status
    }

    fn end_of_side(&mut self, wrapped: bool) {
        if wrapped && self.disk_irq_enabled {
            self.irq.raise();
        }
    }

    fn read_register(&mut self, addr: u16) -> u8 {
        match addr {
            0x4030 => self.status(),
            0x4031 => {
                if !self.drive.readable() {
                    return 0;
                }
                let (value, wrapped) = self.drive.read_byte();
                self.end_of_side(wrapped);
                value
            }
            0x4032 => {
                if self.drive.is_inserted() {
                    0x40
                } else {
                    0x41
                }
            }
            0x4033 => 0x80,
            0x4040..=0x407F => self.wave_ram[(addr - 0x4040) as usize],
            _ => 0,
        }
    }

    fn write_register(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        match addr {
            0x4020 => self.irq.latch = (self.irq.latch & 0xFF00) | data as u16,
            0x4021 => self.irq.latch = (self.irq.latch & 0x00FF) | ((data as u16) << 8),
            0x4022 => {
                self.irq.enabled = data & 0x01 != 0;
                if self.irq.enabled {
                    self.irq.counter = self.irq.latch;
                }
                self.irq.acknowledge();
                debug!(
                    "FDS timer IRQ {} (reload={})",
                    if self.irq.enabled { "enabled" } else { "disabled" },
                    self.irq.latch
                );
            }
            0x4023 => {
                self.drive.motor_on = data & 0x01 != 0;
                self.drive.write_mode = data & 0x02 != 0;
            }
            0x4024 => {
                if self.drive.writable() {
                    let wrapped = self.drive.write_byte(data);
                    self.end_of_side(wrapped);
                }
            }
            0x4025 => {
                self.disk_irq_enabled = data & 0x80 != 0;
                cart.set_mirroring(if data & 0x08 != 0 {
                    Mirroring::Horizontal
                } else {
                    Mirroring::Vertical
                });
            }
            0x4040..=0x407F => {
                if self.wave_write_enabled {
                    self.wave_ram[(addr - 0x4040) as usize] = data & 0x3F;
                }
            }
            0x4080..=0x408A => {
                if addr == 0x4080 {
                    self.wave_write_enabled = data & 0x80 != 0;
                }
                self.sound[(addr - 0x4080) as usize] = data;
            }
            _ => {}
        }
    }
}

impl Mapper for Mapper020 {
    fn cpu_read(&mut self, cart: &CartridgeImage, addr: u16) -> u8 {
        match addr {
            0x4020..=0x409F => self.read_register(addr),
            0x6000..=0xDFFF => self.ram[(addr - 0x6000) as usize],
            0xE000..=0xFFFF => cart.read_prg(cart.prg_bank_from_end(0, BANK_8K), BANK_8K, addr),
            _ => 0,
        }
    }

    fn cpu_write(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        match addr {
            0x4020..=0x409F => self.write_register(cart, addr, data),
            0x6000..=0xDFFF => self.ram[(addr - 0x6000) as usize] = data,
            _ => {}
        }
    }

    fn chr_read(&mut self, cart: &CartridgeImage, addr: u16) -> u8 {
        cart.read_chr_fixed(addr)
    }

    fn chr_write(&mut self, cart: &mut CartridgeImage, addr: u16, data: u8) {
        cart.write_chr_fixed(addr, data);
    }

    fn scanline(&mut self, _scanline: u16) {
        self.irq.clock_down();
    }

    fn reset(&mut self, _cart: &mut CartridgeImage) {
        self.irq.reset();
        self.disk_irq_enabled = false;
        self.drive.motor_on = false;
        self.drive.write_mode = false;
        self.drive.position = 0;
        self.wave_write_enabled = false;
        self.sound = [0; SOUND_REGISTER_COUNT];
    }

    fn shutdown(&mut self) {
        self.drive.eject();
    }

    fn irq_state(&self) -> bool {
        self.irq.pending
    }

    fn irq_clear(&mut self) {
        self.irq.acknowledge();
    }

    fn disk_drive(&mut self) -> Option<&mut DiskDrive> {
        Some(&mut self.drive)
    }
}
