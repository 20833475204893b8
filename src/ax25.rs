//! AX.25 address and payload decoding.
//!
//! Works on the octets of one deframed frame, trailer already removed:
//!
//! ```text
//! | Dest (7) | Source (7) | Repeaters (7 each) | Control (1) | PID (1) | Info (N) |
//! ```
//!
//! Each address field carries six callsign characters shifted left by one
//! bit, then an SSID octet whose low bit is the address extension bit: a
//! clear bit means another address follows.
//!
//! Decoding never fails. Whatever the octets run out before is left empty.

use core::fmt;

use crate::consts::{
    AX25_ADDRESS_LEN, AX25_CALLSIGN_LEN, AX25_MAX_INFO_LEN, AX25_MAX_REPEATERS,
};

#[cfg(not(feature = "std"))]
/// Callsign text, at most six characters.
pub type Callsign = heapless::String<AX25_CALLSIGN_LEN>;
#[cfg(feature = "std")]
/// Callsign text, at most six characters.
pub type Callsign = String;

#[cfg(not(feature = "std"))]
/// Decoded information field, at most [`AX25_MAX_INFO_LEN`] characters.
pub type InfoText = heapless::String<AX25_MAX_INFO_LEN>;
#[cfg(feature = "std")]
/// Decoded information field, at most [`AX25_MAX_INFO_LEN`] characters.
pub type InfoText = String;

#[cfg(not(feature = "std"))]
/// Repeater path in wire order, at most [`AX25_MAX_REPEATERS`] entries.
pub type Repeaters = heapless::Vec<Address, AX25_MAX_REPEATERS>;
#[cfg(feature = "std")]
/// Repeater path in wire order, at most [`AX25_MAX_REPEATERS`] entries.
pub type Repeaters = Vec<Address>;

/// Where the SSID is read from in the last octet of an address field.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum SsidLayout {
    /// Bits 1-4, per the AX.25 address layout.
    #[default]
    Field,
    /// The low four bits, extension bit included. Matches decoders that
    /// mask the octet with `0x0f` without shifting it first.
    LowNibble,
}

impl SsidLayout {
    fn ssid(self, octet: u8) -> u8 {
        match self {
            SsidLayout::Field => (octet >> 1) & 0x0f,
            SsidLayout::LowNibble => octet & 0x0f,
        }
    }
}

/// A station address: callsign plus SSID.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    /// Callsign with padding removed.
    pub callsign: Callsign,
    /// Secondary station identifier, 0 to 15.
    pub ssid: u8,
}

impl Address {
    /// Decodes one address field.
    ///
    /// Returns the address and whether another address follows it.
    pub fn decode(field: &[u8; AX25_ADDRESS_LEN], layout: SsidLayout) -> (Self, bool) {
        let mut callsign = Callsign::new();
        for &octet in &field[..AX25_CALLSIGN_LEN] {
            let c = printable(octet >> 1);
            if c == ' ' {
                break;
            }
            callsign.push_char(c);
        }

        let last = field[AX25_CALLSIGN_LEN];
        let more = last & 0x01 == 0;
        let address = Self {
            callsign,
            ssid: layout.ssid(last),
        };
        (address, more)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.ssid != 0 {
            write!(f, "{}-{}", self.callsign, self.ssid)
        } else {
            write!(f, "{}", self.callsign)
        }
    }
}

/// A decoded AX.25 frame.
///
/// Renders as `SOURCE>DEST[,REPEATER...]:INFO`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ax25Frame {
    /// Destination address.
    pub destination: Address,
    /// Source address.
    pub source: Address,
    /// Repeater path, in wire order.
    pub repeaters: Repeaters,
    /// Low two bits of the control octet following the addresses.
    pub pid: u8,
    /// Information field, non-printable octets replaced by `?`.
    pub info: InfoText,
}

impl Ax25Frame {
    /// Decodes a frame reading SSIDs per the AX.25 address layout.
    ///
    /// Repeaters past [`AX25_MAX_REPEATERS`] are skipped and information
    /// past [`AX25_MAX_INFO_LEN`] octets is cut off; frames from the
    /// deframer always fit the latter.
    pub fn decode(octets: &[u8]) -> Self {
        Self::decode_with(octets, SsidLayout::Field)
    }

    /// Decodes a frame with an explicit SSID layout.
    pub fn decode_with(octets: &[u8], layout: SsidLayout) -> Self {
        let mut frame = Self::default();

        let Some(dest) = address_at(octets, 0) else {
            return frame;
        };
        // The destination's extension bit carries no meaning here.
        (frame.destination, _) = Address::decode(dest, layout);

        let Some(source) = address_at(octets, AX25_ADDRESS_LEN) else {
            return frame;
        };
        let (source, mut more) = Address::decode(source, layout);
        frame.source = source;

        let mut pos = 2 * AX25_ADDRESS_LEN;
        while more {
            let Some(field) = address_at(octets, pos) else {
                trace!("ax25: repeater path truncated at {}", pos);
                return frame;
            };
            let (repeater, next) = Address::decode(field, layout);
            frame.push_repeater(repeater);
            more = next;
            pos += AX25_ADDRESS_LEN;
        }

        let Some(&control) = octets.get(pos) else {
            return frame;
        };
        frame.pid = control & 0x03;

        // Skip the PID octet; the rest is information.
        if let Some(info) = octets.get(pos + 2..) {
            if info.len() > AX25_MAX_INFO_LEN {
                trace!(
                    "ax25: information field truncated from {} octets",
                    info.len()
                );
            }
            for &octet in info.iter().take(AX25_MAX_INFO_LEN) {
                frame.info.push_char(printable(octet));
            }
        }
        frame
    }

    fn push_repeater(&mut self, repeater: Address) {
        if self.repeaters.len() >= AX25_MAX_REPEATERS {
            trace!("ax25: repeater path full, skipping");
            return;
        }
        #[cfg(not(feature = "std"))]
        let _ = self.repeaters.push(repeater);
        #[cfg(feature = "std")]
        self.repeaters.push(repeater);
    }
}

impl fmt::Display for Ax25Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}>{}", self.source, self.destination)?;
        for repeater in &self.repeaters {
            write!(f, ",{}", repeater)?;
        }
        write!(f, ":{}", self.info)
    }
}

fn address_at(octets: &[u8], pos: usize) -> Option<&[u8; AX25_ADDRESS_LEN]> {
    octets.get(pos..pos + AX25_ADDRESS_LEN)?.try_into().ok()
}

fn printable(octet: u8) -> char {
    if (0x20..=0x7e).contains(&octet) {
        char::from(octet)
    } else {
        '?'
    }
}

trait PushChar {
    fn push_char(&mut self, c: char);
}

#[cfg(not(feature = "std"))]
impl<const N: usize> PushChar for heapless::String<N> {
    fn push_char(&mut self, c: char) {
        // Callers stay within capacity.
        let _ = self.push(c);
    }
}

#[cfg(feature = "std")]
impl PushChar for String {
    fn push_char(&mut self, c: char) {
        self.push(c);
    }
}
