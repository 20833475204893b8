//! Signal conditioning primitives for the software PLL.
//!
//! - [`OnePoleIir`]: a first-order IIR low-pass run as a transposed
//!   direct-form II difference equation, one sample at a time
//! - [`SchmittLatch`]: a two-threshold latch that holds its state while the
//!   input sits between the thresholds
//!
//! The coefficient presets are first-order Bessel prototypes normalized to
//! the PLL update rate. They are plain data handed to the filters at
//! construction, so a receiver may be built with its own tables.

/// Feed-forward (`b`) and feedback (`a`) taps of a first-order IIR section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IirCoefficients {
    /// Feed-forward taps `b[0]`, `b[1]`.
    pub b: [f64; 2],
    /// Feedback taps `a[0]`, `a[1]`. `a[0]` normalizes the section.
    pub a: [f64; 2],
}

/// 64 Hz Bessel low-pass smoothing the loop's phase correction.
pub const LOOP_FILTER: IirCoefficients = IirCoefficients {
    b: [0.144668495309, 0.144668495309],
    a: [1.0, -0.710663009381],
};

/// 40 Hz Bessel low-pass smoothing the jitter estimate used for lock.
pub const LOCK_FILTER: IirCoefficients = IirCoefficients {
    b: [0.0951079834025, 0.0951079834025],
    a: [1.0, -0.809784033195],
};

/// First-order IIR filter holding one sample of delay state.
///
/// Computes
/// ```text
/// y[n] = b0 * x[n] + z
/// z    = b1 * x[n] - a1 * y[n]
/// ```
/// with all taps divided by `a0`. The delay state starts at zero.
#[derive(Debug, Clone)]
pub struct OnePoleIir {
    b0: f64,
    b1: f64,
    a1: f64,
    z: f64,
}

impl OnePoleIir {
    /// Creates a filter from a coefficient table.
    pub fn new(coeffs: IirCoefficients) -> Self {
        let a0 = coeffs.a[0];
        Self {
            b0: coeffs.b[0] / a0,
            b1: coeffs.b[1] / a0,
            a1: coeffs.a[1] / a0,
            z: 0.0,
        }
    }

    /// Filters one input sample.
    pub fn filter(&mut self, x: f64) -> f64 {
        let y = self.b0 * x + self.z;
        self.z = self.b1 * x - self.a1 * y;
        y
    }
}

/// Schmitt trigger over a scalar: engages at or below `engage_at`, releases at
/// or above `release_at`, and otherwise keeps its last state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SchmittLatch {
    engage_at: f64,
    release_at: f64,
    engaged: bool,
}

impl SchmittLatch {
    /// Creates a released latch.
    pub fn new(engage_at: f64, release_at: f64) -> Self {
        Self {
            engage_at,
            release_at,
            engaged: false,
        }
    }

    /// Feeds a new value and returns the resulting state.
    pub fn update(&mut self, value: f64) -> bool {
        if value <= self.engage_at {
            self.engaged = true;
        } else if value >= self.release_at {
            self.engaged = false;
        }
        self.engaged
    }

    /// State after the most recent update.
    pub fn engaged(&self) -> bool {
        self.engaged
    }
}
