//! Per-channel receive driver.
//!
//! This module provides the [`Receiver`] struct, which chains the software
//! PLL, the NRZI line decoder and the HDLC deframer for one channel, and
//! queues completed frames until the application reads them.
//!
//! The receiver operates independently of the platform, provided that
//! [`tick()`](Receiver::tick) is called once per sample with the sliced
//! demodulator output, in order and at a fixed rate.
//!
//! ## Example
//!
//! ```rust
//! use ax25rx::driver::{Receiver, ReceiverConfig};
//!
//! let mut receiver = Receiver::new(ReceiverConfig::default()).unwrap();
//! # let levels = [false; 64];
//! for level in levels {
//!     if receiver.tick(level) {
//!         if let Some(frame) = receiver.receive() {
//!             // e.g. "N0CALL-7>APRS:test"
//!             # let _ = frame;
//!         }
//!     }
//! }
//! ```
//!
//! ## Design Notes
//!
//! Channels share nothing: run one `Receiver` per channel, each on whatever
//! thread or interrupt owns that channel's samples.
//!
//! For demodulation internals, see [`crate::pll::DigitalPll`] and
//! [`crate::hdlc::Hdlc`]. For timer and tick scheduling helpers, see
//! [`crate::timer`].

use core::convert::Infallible;

use embedded_hal::digital::InputPin;

use crate::ax25::{Ax25Frame, SsidLayout};
use crate::consts::RX_QUEUE_LEN;
use crate::encoding::NrziDecoder;
use crate::error::Result;
use crate::hdlc::{CompletedFrame, FrameHook, Hdlc};
use crate::pll::{DigitalPll, PllFilters};

#[cfg(not(feature = "std"))]
type FrameQueue = heapless::Deque<CompletedFrame, RX_QUEUE_LEN>;
#[cfg(feature = "std")]
type FrameQueue = std::collections::VecDeque<CompletedFrame>;

/// Receiver settings.
#[derive(Debug, Clone, Copy)]
pub struct ReceiverConfig {
    /// Rate at which [`Receiver::tick()`] is called, in Hz.
    pub sample_rate: u32,
    /// Symbol rate of the channel, in baud.
    pub symbol_rate: u32,
    /// Also queue frames that fail the check or end abnormally.
    pub passthrough: bool,
    /// NRZI-decode sampled levels before deframing. AX.25 over AFSK needs
    /// this; turn it off when the slicer already delivers data bits.
    pub nrzi: bool,
    /// Where to read SSIDs from when decoding addresses.
    pub ssid_layout: SsidLayout,
    /// Loop and lock filter tables for the PLL.
    pub filters: PllFilters,
    /// Observer for every frame the deframer hands out.
    pub hook: Option<FrameHook>,
}

impl Default for ReceiverConfig {
    /// 1200 Bd AFSK sampled at 26.4 kHz, 22 samples per symbol.
    fn default() -> Self {
        Self {
            sample_rate: 26_400,
            symbol_rate: 1_200,
            passthrough: false,
            nrzi: true,
            ssid_layout: SsidLayout::Field,
            filters: PllFilters::default(),
            hook: None,
        }
    }
}

/// The receive chain for one channel.
///
/// ## Reception
///
/// Each [`tick()`](Receiver::tick) advances the PLL with the sliced level. On
/// the ticks the PLL marks as decision instants, the level is NRZI-decoded
/// and fed to the deframer along with the PLL's lock state; losing lock
/// drops any partial frame.
///
/// Completed frames are queued (up to [`RX_QUEUE_LEN`]) and decoded to
/// [`Ax25Frame`] as they are read. When the queue is full, new frames are
/// dropped and counted in `rx_dropped`.
#[derive(Debug)]
pub struct Receiver {
    /// [`DigitalPll`] instance
    pub pll: DigitalPll,
    /// [`Hdlc`] instance
    pub hdlc: Hdlc,
    nrzi: Option<NrziDecoder>,
    ssid_layout: SsidLayout,
    queue: FrameQueue,

    /// Queued frames whose trailer checked out.
    pub rx_good: u16,

    /// Queued frames that failed the check or ended abnormally.
    /// Only counted in passthrough mode, where such frames are kept.
    pub rx_bad: u16,

    /// Frames lost to a full queue.
    pub rx_dropped: u16,
}

impl Receiver {
    /// Creates a receiver.
    ///
    /// # Errors
    /// Fails when the configured rates cannot drive the PLL.
    pub fn new(config: ReceiverConfig) -> Result<Self> {
        let pll = DigitalPll::with_filters(config.sample_rate, config.symbol_rate, config.filters)?;
        info!(
            "receiver: {} Hz, {} Bd, passthrough {}",
            config.sample_rate,
            config.symbol_rate,
            config.passthrough
        );
        Ok(Self {
            pll,
            hdlc: Hdlc::with_hook(config.passthrough, config.hook),
            nrzi: config.nrzi.then(NrziDecoder::new),
            ssid_layout: config.ssid_layout,
            queue: FrameQueue::new(),
            rx_good: 0,
            rx_bad: 0,
            rx_dropped: 0,
        })
    }

    /// Advances the receive chain by one sample.
    ///
    /// Must be called at the configured sample rate, with samples in order.
    ///
    /// # Returns
    /// `true` when this sample completed a frame and it was queued.
    pub fn tick(&mut self, level: bool) -> bool {
        if !self.pll.advance(level) {
            return false;
        }

        let bit = match self.nrzi.as_mut() {
            Some(nrzi) => nrzi.decode(level),
            None => level,
        };
        match self.hdlc.process(bit, self.pll.locked()) {
            Some(frame) => self.enqueue(frame),
            None => false,
        }
    }

    fn enqueue(&mut self, frame: CompletedFrame) -> bool {
        if self.queue.len() >= RX_QUEUE_LEN {
            self.rx_dropped = self.rx_dropped.wrapping_add(1);
            warn!("receiver: queue full, dropping frame");
            return false;
        }

        if frame.is_valid() {
            self.rx_good = self.rx_good.wrapping_add(1);
        } else {
            self.rx_bad = self.rx_bad.wrapping_add(1);
        }

        #[cfg(not(feature = "std"))]
        let _ = self.queue.push_back(frame);
        #[cfg(feature = "std")]
        self.queue.push_back(frame);
        true
    }

    /// Whether a frame is waiting to be read.
    pub fn available(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Number of frames waiting to be read.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Takes the oldest queued frame without decoding it.
    pub fn receive_raw(&mut self) -> Option<CompletedFrame> {
        self.queue.pop_front()
    }

    /// Takes and decodes the oldest queued frame.
    pub fn receive(&mut self) -> Option<Ax25Frame> {
        let frame = self.receive_raw()?;
        Some(Ax25Frame::decode_with(frame.bytes(), self.ssid_layout))
    }

    /// Non-blocking read, for use with [`nb::block!`].
    ///
    /// # Errors
    /// [`nb::Error::WouldBlock`] while no frame is queued.
    pub fn read(&mut self) -> nb::Result<Ax25Frame, Infallible> {
        self.receive().ok_or(nb::Error::WouldBlock)
    }

    /// Whether the PLL is tracking the symbol clock.
    pub fn locked(&self) -> bool {
        self.pll.locked()
    }
}

/// A [`Receiver`] sampling the sliced signal straight from an input pin.
///
/// ## Type Parameters
///
/// - `RX`: A type implementing [`embedded_hal::digital::InputPin`] wired to
///   the slicer or modem data output
#[derive(Debug)]
pub struct PinReceiver<RX>
where
    RX: InputPin,
{
    /// Receive chain
    pub receiver: Receiver,
    /// RX pin
    pub rx: RX,
    /// Whether the pin level should be inverted before use.
    inverted: bool,
}

impl<RX> PinReceiver<RX>
where
    RX: InputPin,
{
    /// Creates a pin-driven receiver.
    ///
    /// # Arguments
    /// - `rx`: The input pin carrying the sliced signal.
    /// - `config`: Receiver settings.
    /// - `rx_inverted`: Whether pin levels should be inverted (HIGH => LOW).
    pub fn new(rx: RX, config: ReceiverConfig, rx_inverted: Option<bool>) -> Result<Self> {
        Ok(Self {
            receiver: Receiver::new(config)?,
            rx,
            inverted: rx_inverted.unwrap_or(false),
        })
    }

    /// Samples the pin and advances the receive chain by one tick.
    ///
    /// # Errors
    /// Propagates pin read errors; the receive chain is not advanced then.
    pub fn tick(&mut self) -> core::result::Result<bool, RX::Error> {
        let level = self.rx.is_high()? != self.inverted;
        Ok(self.receiver.tick(level))
    }
}
