//! CRC-16/CCITT frame check sequence, as carried by HDLC and AX.25.
//!
//! The register starts at `0xffff` and runs LSB first (reflected `0x1021`).
//! Transmitters append the ones' complement of the register, low octet first;
//! running the same checksum over a frame *and* its trailer then leaves the
//! fixed [`CRC_RESIDUE`](crate::consts::CRC_RESIDUE) in the register.

use crate::consts::CRC_RESIDUE;

/// Initial register value.
pub const CRC_INIT: u16 = 0xffff;

/// Folds one octet into the running register.
pub fn crc_ccitt_update(crc: u16, data: u8) -> u16 {
    let mut d = u16::from(data);
    d ^= lo8(crc);
    d ^= d << 4;
    d = u16::from(d as u8);

    ((d << 8) | hi8(crc)) ^ u16::from((d >> 4) as u8) ^ (d << 3)
}

fn lo8(x: u16) -> u16 {
    x & 0xff
}

fn hi8(x: u16) -> u16 {
    x >> 8
}

/// Running checksum for callers that see a frame one octet at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Crc16 {
    value: u16,
}

impl Default for Crc16 {
    fn default() -> Self {
        Self::new()
    }
}

impl Crc16 {
    /// Creates a checksum with the register at [`CRC_INIT`].
    pub const fn new() -> Self {
        Self { value: CRC_INIT }
    }

    /// Feeds a single octet.
    pub fn push(&mut self, byte: u8) {
        self.value = crc_ccitt_update(self.value, byte);
    }

    /// Feeds a run of octets.
    pub fn update(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.push(b);
        }
    }

    /// Current register value.
    pub fn value(&self) -> u16 {
        self.value
    }

    /// Whether the octets seen so far end in a matching trailer.
    pub fn is_residue(&self) -> bool {
        self.value == CRC_RESIDUE
    }
}

/// Runs the checksum over `data` from a fresh register.
///
/// Over a frame that still carries its trailer, a result of
/// [`CRC_RESIDUE`] means the frame arrived intact.
pub fn crc16_ccitt(data: &[u8]) -> u16 {
    data.iter().fold(CRC_INIT, |crc, &b| crc_ccitt_update(crc, b))
}

/// Computes the 2 octet trailer a transmitter appends to `data`.
pub fn fcs(data: &[u8]) -> [u8; 2] {
    (!crc16_ccitt(data)).to_le_bytes()
}
