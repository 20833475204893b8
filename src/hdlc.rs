//! HDLC deframer: flag detection, bit destuffing and frame check.
//!
//! The deframer is fed one data bit per recovered symbol together with the
//! PLL lock state. Bits shift into a 16 bit register from the top, so the
//! high octet always holds the eight most recent bits and the low octet the
//! eight before them, both in transmission (LSB first) order.
//!
//! ## States
//!
//! | State        | Looking for |
//! |--------------|-------------|
//! | `Searching`  | a flag anywhere in the bit stream |
//! | `Hunting`    | the first octet after a flag, octet aligned |
//! | `InFrame`    | frame octets, stuffed zeros and the closing flag |
//!
//! Run-length tracking happens as bits leave the high octet: after five
//! ones the next bit is either a stuffed zero, dropped from the register,
//! or the sixth one of a flag or abort.
//!
//! A closing flag also opens the next frame, so after a frame is handed out
//! the deframer goes straight back to `Hunting`.

use crate::consts::{
    AX25_ADDRESS_PAIR_LEN, AX25_MAX_FRAME_LEN, CRC_RESIDUE, FCS_LEN, HDLC_BOGONS, HDLC_FLAG,
    HDLC_FRAME_ERRORS, HDLC_MAX_ONES,
};
use crate::crc::crc16_ccitt;

#[cfg(not(feature = "std"))]
/// Octets of one frame as buffered by the deframer.
pub type FrameBytes = heapless::Vec<u8, AX25_MAX_FRAME_LEN>;

#[cfg(feature = "std")]
/// Octets of one frame as buffered by the deframer.
pub type FrameBytes = Vec<u8>;

/// Observer called with every frame the deframer hands out.
///
/// It sees frames only after the accept/reject decision and cannot change it.
pub type FrameHook = fn(&CompletedFrame);

/// Synchronization state of the deframer.
#[derive(PartialEq, Eq, Clone, Copy, Default, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum FramerState {
    /// Scanning the raw bit stream for a flag.
    #[default]
    Searching,
    /// Flag seen; classifying the next octet.
    Hunting,
    /// Accumulating frame octets.
    InFrame,
}

/// How a frame came to be handed out.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum FrameOrigin {
    /// Terminated by a closing flag. The trailer has been stripped.
    Closed,
    /// Cut short by an abort sequence. Only produced in passthrough mode.
    Aborted,
    /// Cut short by loss of PLL lock. Only produced in passthrough mode.
    LockLost,
}

/// A frame handed out by the deframer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedFrame {
    /// CRC register after running over every buffered octet, trailer included.
    pub crc: u16,
    /// Frame octets. Closed frames have their 2 octet trailer removed;
    /// salvaged frames carry everything that was buffered.
    pub data: FrameBytes,
    /// What ended the frame.
    pub origin: FrameOrigin,
}

impl CompletedFrame {
    /// Whether the frame closed normally and its trailer checks out.
    ///
    /// Salvaged frames never count as valid, whatever their residue.
    pub fn is_valid(&self) -> bool {
        self.origin == FrameOrigin::Closed && self.crc == CRC_RESIDUE
    }

    /// Frame octets.
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }
}

/// Running counters kept by the deframer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FramerStats {
    /// Closed frames whose trailer checked out.
    pub frames: u32,
    /// Closed frames whose trailer did not check out.
    pub crc_errors: u32,
    /// Frames cut short by an abort sequence.
    pub aborts: u32,
    /// Frames cut short by loss of PLL lock.
    pub lock_losses: u32,
    /// Frames abandoned for growing past [`AX25_MAX_FRAME_LEN`].
    pub overruns: u32,
}

/// Bit-level HDLC deframer.
///
/// Call [`process()`](Hdlc::process) once per recovered symbol, in order.
/// Valid frames are returned as they close; with `passthrough` set, frames
/// that fail the check or are cut short are returned too, tagged with their
/// [`FrameOrigin`] and residue so the caller can decide.
#[derive(Debug, Clone)]
pub struct Hdlc {
    state: FramerState,

    /// Most recent bits, newest at bit 15.
    register: u16,

    /// Number of valid bits in `register`, 0 to 16.
    valid: u8,

    /// Consecutive ones seen leaving the high octet.
    ones: u8,

    frame: FrameBytes,
    passthrough: bool,
    hook: Option<FrameHook>,
    stats: FramerStats,
}

impl Default for Hdlc {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Hdlc {
    /// Creates a deframer.
    ///
    /// # Arguments
    /// - `passthrough`: also hand out frames with a bad check or an abnormal end
    pub fn new(passthrough: bool) -> Self {
        Self::with_hook(passthrough, None)
    }

    /// Creates a deframer that reports every frame it hands out to `hook`.
    pub fn with_hook(passthrough: bool, hook: Option<FrameHook>) -> Self {
        Self {
            state: FramerState::Searching,
            register: 0,
            valid: 0,
            ones: 0,
            frame: FrameBytes::new(),
            passthrough,
            hook,
            stats: FramerStats::default(),
        }
    }

    /// Drops any partial frame and returns to flag search.
    pub fn reset(&mut self) {
        self.state = FramerState::Searching;
        self.register = 0;
        self.valid = 0;
        self.ones = 0;
        self.frame.clear();
    }

    /// Feeds one data bit.
    ///
    /// # Arguments
    /// - `bit`: the data bit sampled at this symbol's decision instant
    /// - `timing_locked`: whether the PLL is locked; `false` resets the deframer
    ///
    /// # Returns
    /// A frame when one completes and is accepted.
    pub fn process(&mut self, bit: bool, timing_locked: bool) -> Option<CompletedFrame> {
        if !timing_locked {
            let salvage = if self.passthrough && self.frame.len() > AX25_ADDRESS_PAIR_LEN {
                Some(self.take_frame(FrameOrigin::LockLost))
            } else {
                None
            };
            if self.state == FramerState::InFrame {
                self.stats.lock_losses = self.stats.lock_losses.saturating_add(1);
                debug!("hdlc: lost lock mid-frame");
            }
            self.reset();
            return salvage.map(|frame| self.emit(frame));
        }

        let completed = match self.state {
            FramerState::Searching => {
                self.search(bit);
                None
            }
            FramerState::Hunting => {
                self.hunt(bit);
                None
            }
            FramerState::InFrame => self.frame_bit(bit),
        }?;

        // The flag that closed this frame may open the next one.
        self.start_hunt();

        if completed.origin == FrameOrigin::Closed {
            if completed.crc == CRC_RESIDUE {
                self.stats.frames = self.stats.frames.saturating_add(1);
            } else {
                self.stats.crc_errors = self.stats.crc_errors.saturating_add(1);
            }
        }

        if completed.crc == CRC_RESIDUE || self.passthrough {
            Some(self.emit(completed))
        } else {
            debug!(
                "hdlc: dropping {} octets, crc {:#x}",
                completed.data.len(),
                completed.crc
            );
            None
        }
    }

    /// Current synchronization state.
    pub fn state(&self) -> FramerState {
        self.state
    }

    /// Whether a frame is being accumulated.
    pub fn framing(&self) -> bool {
        self.state == FramerState::InFrame
    }

    /// Whether frames failing the check are handed out too.
    pub fn passthrough(&self) -> bool {
        self.passthrough
    }

    /// Octets buffered for the frame in progress.
    pub fn buffered(&self) -> usize {
        self.frame.len()
    }

    /// Counters accumulated since construction.
    pub fn stats(&self) -> &FramerStats {
        &self.stats
    }

    fn emit(&self, frame: CompletedFrame) -> CompletedFrame {
        debug!(
            "hdlc: frame {} octets, crc {:#x}, {:?}",
            frame.data.len(),
            frame.crc,
            frame.origin
        );
        if let Some(hook) = self.hook {
            hook(&frame);
        }
        frame
    }

    fn push_bit(&mut self, bit: bool) {
        self.register = (self.register >> 1) | (u16::from(bit) << 15);
        self.valid = (self.valid + 1).min(16);
    }

    fn high_octet(&self) -> u8 {
        (self.register >> 8) as u8
    }

    fn start_search(&mut self) {
        trace!("hdlc: searching");
        self.state = FramerState::Searching;
        self.frame.clear();
    }

    fn start_hunt(&mut self) {
        trace!("hdlc: hunting");
        self.state = FramerState::Hunting;
        self.register = 0;
        self.valid = 0;
        self.ones = 0;
        self.frame.clear();
    }

    fn start_frame(&mut self) {
        trace!("hdlc: in frame");
        self.state = FramerState::InFrame;
        self.frame.clear();
        self.ones = 0;
        self.register &= 0xff00;
    }

    fn search(&mut self, bit: bool) {
        self.push_bit(bit);
        if self.high_octet() == HDLC_FLAG {
            self.start_hunt();
        }
    }

    fn hunt(&mut self, bit: bool) {
        self.push_bit(bit);
        if self.valid < 8 {
            return;
        }

        let octet = self.high_octet();
        if octet == HDLC_FLAG {
            self.start_hunt();
        } else if HDLC_BOGONS.contains(&octet) {
            self.start_search();
        } else if !HDLC_FRAME_ERRORS.contains(&octet) {
            // Only the octet just classified carries over into the frame.
            self.valid = 8;
            self.start_frame();
        } else {
            self.start_search();
        }
    }

    fn frame_bit(&mut self, bit: bool) -> Option<CompletedFrame> {
        self.push_bit(bit);

        if self.ones < HDLC_MAX_ONES {
            if self.register & 0x80 != 0 {
                self.ones += 1;
            } else {
                self.ones = 0;
            }

            if self.valid == 16 {
                if !self.push_octet(self.register as u8) {
                    return None;
                }
                self.register &= 0xff00;
                self.valid -= 8;
            }

            if self.high_octet() == HDLC_FLAG {
                let frame = if self.frame.len() > AX25_ADDRESS_PAIR_LEN {
                    Some(self.close_frame())
                } else {
                    None
                };
                self.start_frame();
                return frame;
            }
            None
        } else if self.register & 0x80 == 0 {
            // Stuffed zero after five ones: drop it from the low octet.
            let tail = (self.register & 0x7f) << 1;
            self.register = (self.register & 0xff00) | tail;
            self.valid -= 1;
            self.ones = 0;
            None
        } else {
            // Sixth one: the tail of a flag, or an abort.
            let salvage = if self.passthrough && self.frame.len() > AX25_ADDRESS_PAIR_LEN {
                Some(self.take_frame(FrameOrigin::Aborted))
            } else {
                None
            };

            let oldest = (self.register >> (16 - self.valid)) as u8;
            if oldest == HDLC_FLAG {
                // Keep the bits after the flag; they are the next octet.
                self.valid -= 8;
                self.state = FramerState::Hunting;
                self.frame.clear();
            } else {
                self.stats.aborts = self.stats.aborts.saturating_add(1);
                debug!("hdlc: abort after {} octets", self.frame.len());
                self.start_search();
            }
            salvage
        }
    }

    /// Appends a destuffed octet, abandoning the frame when it is too long.
    fn push_octet(&mut self, octet: u8) -> bool {
        if self.frame.len() >= AX25_MAX_FRAME_LEN {
            self.stats.overruns = self.stats.overruns.saturating_add(1);
            warn!("hdlc: frame exceeds {} octets", AX25_MAX_FRAME_LEN);
            self.start_search();
            return false;
        }
        #[cfg(not(feature = "std"))]
        let _ = self.frame.push(octet);
        #[cfg(feature = "std")]
        self.frame.push(octet);
        true
    }

    fn take_frame(&mut self, origin: FrameOrigin) -> CompletedFrame {
        let data = core::mem::take(&mut self.frame);
        CompletedFrame {
            crc: crc16_ccitt(&data),
            data,
            origin,
        }
    }

    fn close_frame(&mut self) -> CompletedFrame {
        let mut frame = self.take_frame(FrameOrigin::Closed);
        let len = frame.data.len() - FCS_LEN;
        frame.data.truncate(len);
        frame
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::crc::fcs;
    use core::sync::atomic::{AtomicUsize, Ordering};

    /// Bits of one octet in transmission order.
    pub(crate) fn octet_bits(octet: u8) -> impl Iterator<Item = bool> {
        (0..8).map(move |i| (octet >> i) & 1 == 1)
    }

    pub(crate) fn flags(count: usize) -> Vec<bool> {
        (0..count).flat_map(|_| octet_bits(HDLC_FLAG)).collect()
    }

    /// Bit-stuffed body of a frame: payload followed by its trailer.
    pub(crate) fn stuffed(payload: &[u8]) -> Vec<bool> {
        let mut body = payload.to_vec();
        body.extend_from_slice(&fcs(payload));

        let mut bits = Vec::new();
        let mut ones = 0;
        for bit in body.into_iter().flat_map(octet_bits) {
            bits.push(bit);
            if bit {
                ones += 1;
                if ones == 5 {
                    bits.push(false);
                    ones = 0;
                }
            } else {
                ones = 0;
            }
        }
        bits
    }

    /// Encodes an address field with the SSID in bits 1-4.
    pub(crate) fn address(callsign: &str, ssid: u8, last: bool) -> [u8; 7] {
        let mut field = [b' ' << 1; 7];
        for (slot, c) in field.iter_mut().zip(callsign.bytes()) {
            *slot = c << 1;
        }
        field[6] = 0x60 | (ssid << 1) | u8::from(last);
        field
    }

    /// A UI frame with PID 0xF0 and no repeaters.
    pub(crate) fn ui_frame(dest: &str, source: &str, ssid: u8, info: &[u8]) -> Vec<u8> {
        let mut frame = Vec::new();
        frame.extend_from_slice(&address(dest, 0, false));
        frame.extend_from_slice(&address(source, ssid, true));
        frame.extend_from_slice(&[0x03, 0xf0]);
        frame.extend_from_slice(info);
        frame
    }

    fn run(hdlc: &mut Hdlc, bits: &[bool]) -> Vec<CompletedFrame> {
        bits.iter()
            .filter_map(|&bit| hdlc.process(bit, true))
            .collect()
    }

    #[test]
    fn test_single_frame() {
        let payload = ui_frame("APRS", "N0CALL", 7, b"test");
        let mut bits = flags(3);
        bits.extend(stuffed(&payload));
        bits.extend(flags(2));

        let mut hdlc = Hdlc::new(false);
        let frames = run(&mut hdlc, &bits);
        assert_eq!(frames.len(), 1);
        assert!(frames[0].is_valid());
        assert_eq!(frames[0].crc, CRC_RESIDUE);
        assert_eq!(frames[0].bytes(), &payload[..]);
        assert_eq!(hdlc.state(), FramerState::Hunting);
        assert_eq!(hdlc.stats().frames, 1);
    }

    #[test]
    fn test_destuffing_restores_payload() {
        let payloads: [&[u8]; 3] = [
            &[0xff, 0xfe, 0x7e, 0x7f, 0x3f, 0x1f, 0xf8, 0x00],
            &[0x7e; 12],
            &[0xff; 20],
        ];
        for tail in payloads {
            let mut payload = ui_frame("APRS", "N0CALL", 7, b"");
            payload.extend_from_slice(tail);

            let mut bits = flags(2);
            bits.extend(stuffed(&payload));
            bits.extend(flags(1));

            let frames = run(&mut Hdlc::new(false), &bits);
            assert_eq!(frames.len(), 1, "payload {tail:02x?}");
            assert_eq!(frames[0].bytes(), &payload[..]);
        }
    }

    #[test]
    fn test_shared_flag_between_frames() {
        let first = ui_frame("APRS", "N0CALL", 7, b"test");
        let second = ui_frame("APRS", "N0CALL", 1, b"second");
        let mut bits = flags(2);
        bits.extend(stuffed(&first));
        bits.extend(flags(1));
        bits.extend(stuffed(&second));
        bits.extend(flags(1));

        let mut hdlc = Hdlc::new(false);
        let mut frames = Vec::new();
        for bit in bits {
            if let Some(frame) = hdlc.process(bit, true) {
                assert_eq!(hdlc.state(), FramerState::Hunting);
                frames.push(frame);
            }
        }
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].bytes(), &first[..]);
        assert_eq!(frames[1].bytes(), &second[..]);
    }

    #[test]
    fn test_repeated_flags_between_frames() {
        let payload = ui_frame("APRS", "N0CALL", 7, b"test");
        let mut bits = flags(3);
        bits.extend(stuffed(&payload));
        bits.extend(flags(3));
        bits.extend(stuffed(&payload));
        bits.extend(flags(1));

        assert_eq!(run(&mut Hdlc::new(false), &bits).len(), 2);
    }

    #[test]
    fn test_short_frame_is_skipped() {
        let short = [1, 2, 3, 4, 5, 6, 7, 8];
        let payload = ui_frame("APRS", "N0CALL", 7, b"test");
        let mut bits = flags(2);
        bits.extend(stuffed(&short));
        bits.extend(flags(1));
        bits.extend(stuffed(&payload));
        bits.extend(flags(1));

        let frames = run(&mut Hdlc::new(true), &bits);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].bytes(), &payload[..]);
    }

    #[test]
    fn test_bad_crc() {
        let payload = ui_frame("APRS", "N0CALL", 7, b"test");
        let mut corrupted = stuffed(&payload);
        // Flip a data bit inside the info field.
        let at = corrupted.len() - 30;
        corrupted[at] = !corrupted[at];

        let mut bits = flags(2);
        bits.extend(corrupted);
        bits.extend(flags(1));

        let mut strict = Hdlc::new(false);
        assert!(run(&mut strict, &bits).is_empty());
        assert_eq!(strict.stats().crc_errors, 1);
        assert_eq!(strict.stats().frames, 0);

        let mut lenient = Hdlc::new(true);
        let frames = run(&mut lenient, &bits);
        assert_eq!(frames.len(), 1);
        assert_ne!(frames[0].crc, CRC_RESIDUE);
        assert!(!frames[0].is_valid());
        assert_eq!(frames[0].origin, FrameOrigin::Closed);
        assert_eq!(frames[0].data.len(), payload.len());
    }

    #[test]
    fn test_abort_mid_frame() {
        let payload = ui_frame("APRS", "N0CALL", 7, b"test");
        let mut bits = flags(2);
        bits.extend(stuffed(&payload).into_iter().take(150));
        bits.extend([true; 16]);

        let mut strict = Hdlc::new(false);
        assert!(run(&mut strict, &bits).is_empty());
        assert_ne!(strict.state(), FramerState::InFrame);
        assert_eq!(strict.stats().aborts, 1);

        let mut lenient = Hdlc::new(true);
        let frames = run(&mut lenient, &bits);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].origin, FrameOrigin::Aborted);
        assert!(!frames[0].is_valid());
        assert_ne!(lenient.state(), FramerState::InFrame);
    }

    #[test]
    fn test_recovers_after_abort() {
        let payload = ui_frame("APRS", "N0CALL", 7, b"test");
        let mut bits = flags(2);
        bits.extend(stuffed(&payload).into_iter().take(150));
        bits.extend([true; 16]);
        bits.extend(flags(2));
        bits.extend(stuffed(&payload));
        bits.extend(flags(1));

        let frames = run(&mut Hdlc::new(false), &bits);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].bytes(), &payload[..]);
    }

    #[test]
    fn test_lock_loss_resets() {
        let payload = ui_frame("APRS", "N0CALL", 7, b"test");
        let mut bits = flags(2);
        bits.extend(stuffed(&payload).into_iter().take(140));

        let mut strict = Hdlc::new(false);
        assert!(run(&mut strict, &bits).is_empty());
        assert!(strict.framing());
        assert!(strict.process(false, false).is_none());
        assert_eq!(strict.state(), FramerState::Searching);
        assert_eq!(strict.buffered(), 0);
        assert_eq!(strict.stats().lock_losses, 1);

        let mut lenient = Hdlc::new(true);
        assert!(run(&mut lenient, &bits).is_empty());
        assert_eq!(lenient.buffered(), 16);
        let salvage = lenient.process(false, false).unwrap();
        assert_eq!(salvage.origin, FrameOrigin::LockLost);
        assert_eq!(salvage.bytes(), &payload[..16]);
        assert_eq!(salvage.crc, crc16_ccitt(&payload[..16]));
        assert_eq!(lenient.state(), FramerState::Searching);
    }

    #[test]
    fn test_hunting_classification() {
        let mut hdlc = Hdlc::new(false);
        let bits: Vec<bool> = octet_bits(HDLC_FLAG).collect();
        assert!(run(&mut hdlc, &bits).is_empty());
        assert_eq!(hdlc.state(), FramerState::Hunting);

        let idle: Vec<bool> = octet_bits(0xff).collect();
        assert!(run(&mut hdlc, &idle).is_empty());
        assert_eq!(hdlc.state(), FramerState::Searching);

        let mut hdlc = Hdlc::new(false);
        let mut bits: Vec<bool> = octet_bits(HDLC_FLAG).collect();
        bits.extend(octet_bits(0x82));
        assert!(run(&mut hdlc, &bits).is_empty());
        assert_eq!(hdlc.state(), FramerState::InFrame);

        hdlc.reset();
        assert_eq!(hdlc.state(), FramerState::Searching);
        assert_eq!(hdlc.buffered(), 0);
    }

    #[test]
    fn test_overlong_frame_is_dropped() {
        let mut payload = ui_frame("APRS", "N0CALL", 7, b"");
        payload.extend(core::iter::repeat_n(b'x', AX25_MAX_FRAME_LEN));
        let mut bits = flags(2);
        bits.extend(stuffed(&payload));
        bits.extend(flags(1));

        let mut hdlc = Hdlc::new(true);
        assert!(run(&mut hdlc, &bits).is_empty());
        assert_eq!(hdlc.stats().overruns, 1);
    }

    static HOOK_CALLS: AtomicUsize = AtomicUsize::new(0);

    fn count_frame(_: &CompletedFrame) {
        let _ = HOOK_CALLS.fetch_add(1, Ordering::Relaxed);
    }

    #[test]
    fn test_hook_observes_frames() {
        let payload = ui_frame("APRS", "N0CALL", 7, b"test");
        let mut bits = flags(2);
        bits.extend(stuffed(&payload));
        bits.extend(flags(1));

        let mut hdlc = Hdlc::with_hook(false, Some(count_frame));
        let frames = run(&mut hdlc, &bits);
        assert_eq!(frames.len(), 1);
        assert_eq!(HOOK_CALLS.load(Ordering::Relaxed), 1);
    }
}
