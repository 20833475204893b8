//! # ax25rx
//!
//! A portable, no_std Rust receive chain for AX.25 packet radio, turning the sliced output
//! of an AFSK demodulator into decoded frames such as `N0CALL-7>APRS,WIDE2-1:!4903.50N/...`.
//!
//! This crate implements the bit-level half of a packet modem in software using:
//! - a digital PLL for symbol timing recovery and lock detection
//! - NRZI line decoding
//! - an HDLC deframer with bit destuffing and CRC-16/CCITT validation
//! - an AX.25 address and payload decoder
//! - `embedded-hal` traits for sampling an input pin and for timing
//! - optional tick sources using either timer interrupts or blocking delay
//!
//! ## Crate features
//! | Feature               | Description |
//! |-----------------------|-------------|
//! | `std`                 | Disables `#![no_std]` support and replaces `heapless` buffers with
//! `std` collections |
//! | `delay-loop`          | Uses `embedded_hal::delay::DelayNs` for sample timing |
//! | `timer-isr` (default) | Uses `critical_section::with` to share a receiver with a timer ISR |
//! | `defmt-0-3`           | Uses `defmt` logging |
//! | `log`                 | Uses `log` logging |
//!
//! ## Usage
//!
//! ```rust
//! use ax25rx::driver::{Receiver, ReceiverConfig};
//!
//! let mut receiver = Receiver::new(ReceiverConfig {
//!     sample_rate: 26_400,
//!     symbol_rate: 1_200,
//!     ..ReceiverConfig::default()
//! })
//! .unwrap();
//!
//! # let slicer_output = [false; 64];
//! for level in slicer_output {
//!     if receiver.tick(level) {
//!         while let Some(frame) = receiver.receive() {
//!             # let _ = frame;
//!             // frame renders as "SOURCE>DEST[,REPEATER...]:INFO"
//!         }
//!     }
//! }
//! ```
//!
//! Or, sample a pin with `run_rx_tick_loop()` and a `DelayNs` implementation:
//!
//! ```rust,ignore
//! let mut receiver = PinReceiver::new(rx, ReceiverConfig::default(), None)?;
//! ax25rx::timer::run_rx_tick_loop(&mut receiver, &mut delay, tick_interval_ns(26_400), handle)?;
//! ```
//!
//! ## Building blocks
//!
//! Each stage can be used on its own:
//!
//! - [`pll::DigitalPll`]: one call per sample, reports decision instants and lock
//! - [`encoding::NrziDecoder`]: level to data bit
//! - [`hdlc::Hdlc`]: one call per data bit, hands out [`hdlc::CompletedFrame`]s
//! - [`ax25::Ax25Frame`]: octets to addresses and text
//!
//! ## Integration Notes
//!
//! - The sample rate must be at least the symbol rate; 8 or more samples per symbol
//!   are recommended
//! - Timing precision matters less than for transmit: the PLL tracks offsets of a
//!   few tenths of a percent
//! - One receiver per channel; channels share no state

#![deny(
    bad_style,
    dead_code,
    improper_ctypes,
    non_shorthand_field_patterns,
    no_mangle_generic_items,
    overflowing_literals,
    path_statements,
    patterns_in_fns_without_body,
    unconditional_recursion,
    unused,
    while_true,
    missing_debug_implementations,
    missing_docs,
    trivial_casts,
    trivial_numeric_casts,
    unused_extern_crates,
    unused_import_braces,
    unused_qualifications,
    unused_results
)]
#![cfg_attr(not(feature = "std"), no_std)]

#[macro_use]
mod fmt;

#[cfg(feature = "timer-isr")]
pub use critical_section;

#[cfg(not(feature = "std"))]
pub use heapless;

pub mod ax25;
pub mod consts;
pub mod crc;
pub mod driver;
pub mod encoding;
pub mod error;
pub mod filter;
pub mod hdlc;
pub mod pll;
pub mod timer;

pub use ax25::{Address, Ax25Frame, SsidLayout};
pub use driver::{PinReceiver, Receiver, ReceiverConfig};
pub use error::{Error, Result};
