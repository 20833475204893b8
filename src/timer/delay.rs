use core::convert::Infallible;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::InputPin;

use crate::ax25::Ax25Frame;
use crate::driver::PinReceiver;

/// Runs a blocking loop that samples the receiver's pin once per tick.
///
/// This is a simple timing loop for use in environments where interrupts are
/// unavailable or undesired. Each decoded frame is handed to `on_frame` from
/// inside the loop, so the callback must return well within one tick.
///
/// # Arguments
/// - `receiver`: A mutable reference to a `PinReceiver` instance.
/// - `delay`: A delay provider implementing `DelayNs`, typically from the HAL.
/// - `tick_ns`: The delay between ticks, see [`tick_interval_ns`](super::tick_interval_ns).
/// - `on_frame`: Called with every decoded frame.
///
/// # Example
/// ```rust,ignore
/// use ax25rx::timer::{run_rx_tick_loop, tick_interval_ns};
///
/// let mut receiver = PinReceiver::new(rx, ReceiverConfig::default(), None)?;
/// run_rx_tick_loop(&mut receiver, &mut delay, tick_interval_ns(26_400), |frame| {
///     defmt::info!("{}", defmt::Display2Format(&frame));
/// })?;
/// ```
///
/// # Notes
/// - The loop only returns when reading the pin fails.
/// - The delay does not account for the time spent decoding, so the real
///   sample rate runs slightly low; the PLL absorbs small offsets.
pub fn run_rx_tick_loop<D, RX, F>(
    receiver: &mut PinReceiver<RX>,
    delay: &mut D,
    tick_ns: u32,
    mut on_frame: F,
) -> Result<Infallible, RX::Error>
where
    D: DelayNs,
    RX: InputPin,
    F: FnMut(Ax25Frame),
{
    loop {
        if receiver.tick()? {
            while let Some(frame) = receiver.receiver.receive() {
                on_frame(frame);
            }
        }
        delay.delay_ns(tick_ns);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::ReceiverConfig;
    use embedded_hal::digital::{ErrorKind, ErrorType};
    use embedded_hal_mock::eh1::delay::NoopDelay;

    /// Replays levels, then fails.
    struct ScriptedPin<'a>(&'a [bool]);

    impl ErrorType for ScriptedPin<'_> {
        type Error = ErrorKind;
    }

    impl InputPin for ScriptedPin<'_> {
        fn is_high(&mut self) -> Result<bool, ErrorKind> {
            let (&level, rest) = self.0.split_first().ok_or(ErrorKind::Other)?;
            self.0 = rest;
            Ok(level)
        }

        fn is_low(&mut self) -> Result<bool, ErrorKind> {
            self.is_high().map(|level| !level)
        }
    }

    #[test]
    fn test_loop_stops_on_pin_error() {
        let levels = [false, true, true, false];
        let rx = ScriptedPin(&levels);
        let mut receiver = PinReceiver::new(rx, ReceiverConfig::default(), None).unwrap();

        let mut frames = 0;
        let result = run_rx_tick_loop(&mut receiver, &mut NoopDelay::new(), 37_878, |_| {
            frames += 1
        });
        assert_eq!(result.unwrap_err(), ErrorKind::Other);
        assert_eq!(frames, 0);
        assert!(receiver.rx.0.is_empty());
    }
}
