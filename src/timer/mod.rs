//! Timer and tick-loop utilities for the receiver.
//!
//! The receive chain needs exactly one [`tick()`](crate::driver::Receiver::tick)
//! per sample period. This module offers two ways to provide it: an interrupt
//! service routine sharing the receiver through `critical_section::with`
//! (`timer-isr` feature), or a busy-loop delay timer (`delay-loop` feature).
//!
//! Contains helpers for polling- and ISR-based scheduling, including:
//! - `compute_ocr_value`: runtime OCR calculator for a sample rate
//! - `const_ocr_value`: compile-time OCR calculator
//! - `run_rx_tick_loop`: blocking receive loop for `DelayNs` (feature `delay-loop`)
//! - `global_receiver_tick` and `tick_receiver!()`: interrupt-based tick callback wrapper
//!   (feature `timer-isr`)
//!
//! Sample rates reachable from a 16 MHz clock:
//!
//! | PRESCALER | OCR | Sample rate | Samples / symbol at 1200 Bd |
//! |-----------|-----|-------------|-----------------------------|
//! |         8 | 207 |    9615 Hz  |  8.01                       |
//! |         1 | 605 |   26403 Hz  | 22.00                       |
//! |         8 |  75 |   26316 Hz  | 21.93                       |

use libm::round;

#[cfg(feature = "delay-loop")]
mod delay;
#[cfg(feature = "delay-loop")]
pub use delay::*;

#[cfg(feature = "timer-isr")]
mod isr;
#[cfg(feature = "timer-isr")]
pub use isr::*;

#[cfg(feature = "timer-isr")]
mod macros;

/// Nanoseconds in one second.
pub const NANOS_PER_SECOND: u32 = 1_000_000_000;

/// Computes the compare value for an AVR timer in CTC mode.
///
/// # Arguments
/// - `f_cpu`: CPU frequency in Hz
/// - `prescaler`: timer prescaler (e.g., 1, 8, 64)
/// - `sample_rate`: desired tick rate in Hz (e.g., 26 400)
///
/// # Returns
/// - OCR value for OCRnA (rounded to the nearest count)
/// - The sample rate the timer actually achieves with it, for configuring the receiver
pub fn compute_ocr_value(f_cpu: u32, prescaler: u32, sample_rate: u32) -> (u16, u32) {
    let counts = f64::from(f_cpu) / f64::from(prescaler) / f64::from(sample_rate);
    let ocr = (round(counts) - 1.0).clamp(0.0, f64::from(u16::MAX)) as u16;
    (ocr, f_cpu / prescaler / (u32::from(ocr) + 1))
}

/// Compile-time OCR value calculator
///
/// Same as [`compute_ocr_value`], rounding with integer arithmetic.
pub const fn const_ocr_value(f_cpu: u32, prescaler: u32, sample_rate: u32) -> (u16, u32) {
    let timer_hz = f_cpu / prescaler;
    let counts = (timer_hz + sample_rate / 2) / sample_rate;
    let ocr = if counts == 0 { 0 } else { counts - 1 };
    let ocr = if ocr > u16::MAX as u32 {
        u16::MAX
    } else {
        ocr as u16
    };
    (ocr, timer_hz / (ocr as u32 + 1))
}

/// Tick interval for a delay-driven loop, in nanoseconds.
///
/// # Arguments
/// - `sample_rate`: desired tick rate in Hz
pub const fn tick_interval_ns(sample_rate: u32) -> u32 {
    if sample_rate == 0 {
        return 0;
    }
    NANOS_PER_SECOND / sample_rate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ocr_values() {
        assert_eq!(compute_ocr_value(16_000_000, 8, 9_600), (207, 9_615));
        assert_eq!(compute_ocr_value(16_000_000, 1, 26_400), (605, 26_402));
        assert_eq!(compute_ocr_value(16_000_000, 8, 26_400), (75, 26_315));
    }

    #[test]
    fn test_const_ocr_matches_runtime() {
        for (prescaler, rate) in [(1, 26_400), (8, 9_600), (8, 26_400), (64, 1_200)] {
            assert_eq!(
                const_ocr_value(16_000_000, prescaler, rate),
                compute_ocr_value(16_000_000, prescaler, rate)
            );
        }
        assert_eq!(const_ocr_value(16_000_000, 1, 100), (u16::MAX, 244));
    }

    #[test]
    fn test_tick_interval() {
        assert_eq!(tick_interval_ns(26_400), 37_878);
        assert_eq!(tick_interval_ns(9_600), 104_166);
        assert_eq!(tick_interval_ns(0), 0);
    }
}
