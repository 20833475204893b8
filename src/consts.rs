//! Constants used across the receive chain.
//!
//! This module collects the protocol-wide values shared by the timing
//! recovery loop, the HDLC deframer and the AX.25 decoder.
//!
//! ## Key Concepts
//!
//! - **Flags and fill patterns**: the octets HDLC reserves for delimiting
//!   frames and for marking idle or broken links.
//! - **Frame limits**: the shortest frame worth emitting and the longest
//!   frame the deframer will buffer before giving up.
//! - **Loop tuning**: the thresholds and gains that steer the software PLL
//!   between fast pull-in and fine tracking.
//!
//! Values are expressed in octets unless noted otherwise.

/// HDLC flag octet (`01111110`) delimiting every frame.
pub const HDLC_FLAG: u8 = 0x7e;

/// Abort pattern: seven ones in a row.
pub const HDLC_ABORT: u8 = 0x7f;

/// Idle line fill (all ones).
pub const HDLC_IDLE: u8 = 0xff;

/// Fill patterns that push the deframer back to flag search when seen in
/// place of the first frame octet.
pub const HDLC_BOGONS: [u8; 3] = [HDLC_IDLE, 0xfe, HDLC_ABORT];

/// Octets that cannot open a frame. Anything else seen right after a flag
/// starts a frame.
pub const HDLC_FRAME_ERRORS: [u8; 5] = [HDLC_IDLE, 0xfe, 0xfc, HDLC_ABORT, HDLC_FLAG];

/// Number of consecutive one bits after which the transmitter stuffs a zero.
pub const HDLC_MAX_ONES: u8 = 5;

/// CRC-16/CCITT register value left after running the checksum over a
/// frame together with its own trailer.
pub const CRC_RESIDUE: u16 = 0xf0b8;

/// Length of the frame check sequence trailer, in octets.
pub const FCS_LEN: usize = 2;

/// Length of one encoded AX.25 address field.
pub const AX25_ADDRESS_LEN: usize = 7;

/// Number of callsign characters within an address field.
pub const AX25_CALLSIGN_LEN: usize = 6;

/// Length of the destination and source address pair.
///
/// Buffered frames must grow past this length before they are emitted.
pub const AX25_ADDRESS_PAIR_LEN: usize = 2 * AX25_ADDRESS_LEN;

/// Maximum number of repeater addresses retained per frame.
pub const AX25_MAX_REPEATERS: usize = 8;

/// Largest frame buffered by the deframer, FCS included.
///
/// Ten address fields, control and PID octets, a 256 octet information
/// field and the 2 octet trailer.
pub const AX25_MAX_FRAME_LEN: usize =
    (2 + AX25_MAX_REPEATERS) * AX25_ADDRESS_LEN + 2 + 256 + FCS_LEN;

/// Capacity of the decoded information text.
pub const AX25_MAX_INFO_LEN: usize = AX25_MAX_FRAME_LEN;

/// Number of completed frames a [`Receiver`](crate::driver::Receiver) holds
/// until they are read.
pub const RX_QUEUE_LEN: usize = 4;

/// Symbol periods without a transition after which the PLL forces a resync.
pub const PLL_MAX_RUN_SYMBOLS: u16 = 127;

/// Jitter, as a fraction of samples per symbol, at or below which the PLL
/// declares lock.
pub const PLL_LOCK_THRESHOLD: f64 = 0.025;

/// Jitter, as a fraction of samples per symbol, at or above which the PLL
/// drops lock.
pub const PLL_UNLOCK_THRESHOLD: f64 = 0.15;

/// Phase correction gain applied while locked.
pub const PLL_LOCKED_GAIN: f64 = 0.012;

/// Phase correction gain applied while searching for lock.
pub const PLL_UNLOCKED_GAIN: f64 = 0.048;

/// Jitter reported before the first transition has been seen.
pub const PLL_INITIAL_JITTER: f64 = 10.0;
