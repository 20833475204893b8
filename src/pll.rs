//! Software PLL for symbol timing recovery.
//!
//! This module recovers the symbol clock from a sliced binary signal. It is
//! clocked once per sample, watches for level transitions, and nudges a
//! phase accumulator so that the decision instant settles halfway between
//! transitions. A smoothed measure of the phase error drives a lock detector
//! which the deframer uses as its liveness signal.

use embedded_hal::digital::InputPin;
use libm::fabs;

use crate::consts::{
    PLL_INITIAL_JITTER, PLL_LOCK_THRESHOLD, PLL_LOCKED_GAIN, PLL_MAX_RUN_SYMBOLS,
    PLL_UNLOCK_THRESHOLD, PLL_UNLOCKED_GAIN,
};
use crate::error::{Error, Result};
use crate::filter::{IirCoefficients, LOCK_FILTER, LOOP_FILTER, OnePoleIir, SchmittLatch};

/// Coefficient tables for the two loop filters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PllFilters {
    /// Smooths the per-transition phase error into a correction.
    pub loop_filter: IirCoefficients,
    /// Smooths the phase error magnitude into the jitter estimate.
    pub lock_filter: IirCoefficients,
}

impl Default for PllFilters {
    fn default() -> Self {
        Self {
            loop_filter: LOOP_FILTER,
            lock_filter: LOCK_FILTER,
        }
    }
}

#[derive(Debug, Clone)]
/// A digital phase-locked loop recovering symbol timing from a binary signal.
///
/// The loop keeps a phase accumulator (`count`, in samples) that runs from
/// `-sps/2` to `+sps/2` across each symbol. Crossing `+sps/2` without a
/// transition marks the middle of a symbol: that tick is reported as the
/// sampling instant. A transition measures how far `count` sits from zero,
/// spreads that error over the symbols seen since the last transition, and
/// pulls the accumulator back toward the boundary.
///
/// The loop runs for the life of a channel and has no reset: losing lock is
/// tracked through [`locked()`](DigitalPll::locked) alone.
pub struct DigitalPll {
    sample_rate: u32,
    symbol_rate: u32,

    /// Samples per symbol.
    sps: f64,

    /// Half a symbol period, in samples.
    limit: f64,

    /// Phase accumulator, in samples relative to the expected transition.
    count: f64,

    /// Symbol periods elapsed since the last transition, at least 1.
    bits: u16,

    /// Level seen on the previous tick.
    last: bool,

    loop_filter: OnePoleIir,
    lock_filter: OnePoleIir,

    /// Lock detector over `jitter`.
    lock: SchmittLatch,

    /// Filtered phase error magnitude, in samples.
    jitter: f64,

    /// Decision reported by the most recent tick.
    sample: bool,
}

impl DigitalPll {
    /// Creates a PLL with the stock loop and lock filters.
    ///
    /// # Arguments
    /// - `sample_rate`: rate at which [`advance()`](DigitalPll::advance) is called, in Hz
    /// - `symbol_rate`: symbol rate of the incoming signal, in baud
    ///
    /// # Errors
    /// Fails when either rate is zero or the sample rate is below the symbol rate.
    pub fn new(sample_rate: u32, symbol_rate: u32) -> Result<Self> {
        Self::with_filters(sample_rate, symbol_rate, PllFilters::default())
    }

    /// Creates a PLL with caller-provided filter tables.
    pub fn with_filters(sample_rate: u32, symbol_rate: u32, filters: PllFilters) -> Result<Self> {
        Error::check_rates(sample_rate, symbol_rate)?;
        let sps = f64::from(sample_rate) / f64::from(symbol_rate);
        Ok(Self {
            sample_rate,
            symbol_rate,
            sps,
            limit: sps / 2.0,
            count: 0.0,
            bits: 1,
            last: false,
            loop_filter: OnePoleIir::new(filters.loop_filter),
            lock_filter: OnePoleIir::new(filters.lock_filter),
            lock: SchmittLatch::new(sps * PLL_LOCK_THRESHOLD, sps * PLL_UNLOCK_THRESHOLD),
            jitter: PLL_INITIAL_JITTER,
            sample: false,
        })
    }

    /// Advances the loop by one sample tick.
    ///
    /// Returns `true` when this tick is the decision instant for a symbol,
    /// i.e. when the data level should be sampled now.
    pub fn advance(&mut self, level: bool) -> bool {
        self.sample = false;

        if level != self.last || self.bits > PLL_MAX_RUN_SYMBOLS {
            // Transition, or a run long enough that drift needs bounding.
            self.last = level;

            if self.count > self.limit {
                self.count -= self.sps;
            }

            let offset = self.count / f64::from(self.bits);
            let correction = self.loop_filter.filter(offset);
            self.jitter = self.lock_filter.filter(fabs(offset));
            let was_locked = self.lock.engaged();
            let locked = self.lock.update(self.jitter);
            if locked != was_locked {
                debug!("pll lock {}, jitter {}", locked, self.jitter);
            }

            let gain = if locked {
                PLL_LOCKED_GAIN
            } else {
                PLL_UNLOCKED_GAIN
            };
            self.count -= correction * self.sps * gain;
            self.bits = 1;
        } else if self.count > self.limit {
            // No transition, halfway through the symbol.
            self.sample = true;
            self.count -= self.sps;
            self.bits = self.bits.saturating_add(1);
        }

        self.count += 1.0;
        self.sample
    }

    /// Reads one level from `rx` and advances the loop with it.
    ///
    /// # Errors
    /// Propagates the pin's read error; the loop is left untouched in that case.
    pub fn advance_pin<RX: InputPin>(
        &mut self,
        rx: &mut RX,
        inverted: bool,
    ) -> core::result::Result<bool, RX::Error> {
        let level = rx.is_high()? != inverted;
        Ok(self.advance(level))
    }

    /// Whether the loop is currently tracking the symbol clock.
    pub fn locked(&self) -> bool {
        self.lock.engaged()
    }

    /// Smoothed phase error magnitude, in samples.
    pub fn jitter(&self) -> f64 {
        self.jitter
    }

    /// Decision reported by the most recent [`advance()`](DigitalPll::advance).
    pub fn sample(&self) -> bool {
        self.sample
    }

    /// Samples per symbol.
    pub fn samples_per_symbol(&self) -> f64 {
        self.sps
    }

    /// Configured sample rate, in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Configured symbol rate, in baud.
    pub fn symbol_rate(&self) -> u32 {
        self.symbol_rate
    }
}
