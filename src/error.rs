//! Error types for receiver construction.
//!
//! Decoding itself never fails: framing problems resolve by resynchronizing
//! on the next flag and short frames decode to empty fields. The only
//! fallible step is building a receiver from a bad rate configuration.

use thiserror::Error;

/// Result type alias for receiver operations.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Errors raised while configuring the receive chain.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt-0-3", derive(defmt::Format))]
pub enum Error {
    /// The sample rate was zero.
    #[error("sample rate must be positive")]
    ZeroSampleRate,

    /// The symbol rate was zero.
    #[error("symbol rate must be positive")]
    ZeroSymbolRate,

    /// Fewer than one sample per symbol.
    #[error("sample rate {sample_rate} Hz is below the symbol rate {symbol_rate} Bd")]
    SampleRateTooLow {
        /// Requested sample rate, in Hz.
        sample_rate: u32,
        /// Requested symbol rate, in baud.
        symbol_rate: u32,
    },
}

impl Error {
    /// Checks a sample/symbol rate pair, returning the first problem found.
    pub fn check_rates(sample_rate: u32, symbol_rate: u32) -> Result<()> {
        if sample_rate == 0 {
            return Err(Error::ZeroSampleRate);
        }
        if symbol_rate == 0 {
            return Err(Error::ZeroSymbolRate);
        }
        if sample_rate < symbol_rate {
            return Err(Error::SampleRateTooLow {
                sample_rate,
                symbol_rate,
            });
        }
        Ok(())
    }
}
