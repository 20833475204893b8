use core::cell::RefCell;

use critical_section::Mutex;
use embedded_hal::digital::InputPin;

use crate::ax25::Ax25Frame;
use crate::driver::{PinReceiver, ReceiverConfig};
use crate::error::Result;

/// Shared slot for a receiver ticked from an interrupt.
pub type GlobalReceiver<RX> = Mutex<RefCell<Option<PinReceiver<RX>>>>;

/// Used to initialize the global static `PinReceiver` for use with
/// `critical_section`.
///
/// # Returns
/// * An empty mutable ref-cell
///
/// # Example
/// ```rust,ignore
/// use ax25rx::timer::{GlobalReceiver, global_receiver_init};
/// use some_hal::PD2;
///
/// static RECEIVER: GlobalReceiver<PD2> = global_receiver_init::<PD2>();
/// ```
pub const fn global_receiver_init<RX: InputPin>() -> GlobalReceiver<RX> {
    Mutex::new(RefCell::new(None))
}

/// Builds a receiver on `rx` and stores it in the global slot.
///
/// # Arguments
/// * The global static receiver slot
/// * The rx pin
/// * Receiver settings; `sample_rate` must match the interrupt frequency
/// * Whether the pin level should be inverted
///
/// # Errors
/// Fails when the configured rates cannot drive the PLL; the slot is left
/// untouched in that case.
///
/// # Example
/// ```rust,ignore
/// fn main() {
///     global_receiver_setup(&RECEIVER, rx, ReceiverConfig::default(), None)?;
/// }
/// ```
pub fn global_receiver_setup<RX: InputPin>(
    global_receiver: &'static GlobalReceiver<RX>,
    rx: RX,
    config: ReceiverConfig,
    rx_inverted: Option<bool>,
) -> Result<()> {
    let receiver = PinReceiver::new(rx, config, rx_inverted)?;
    critical_section::with(|cs| {
        let _ = global_receiver.borrow(cs).replace(Some(receiver));
    });
    Ok(())
}

/// Runs the tick at each interrupt
///
/// Does nothing until the slot has been set up.
///
/// # Returns
/// Whether a frame was queued on this tick.
///
/// # Errors
/// Propagates pin read errors.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn TIM2() {
///     let _ = global_receiver_tick(&RECEIVER);
/// }
/// ```
pub fn global_receiver_tick<RX: InputPin>(
    global_receiver: &'static GlobalReceiver<RX>,
) -> core::result::Result<bool, RX::Error> {
    critical_section::with(|cs| match global_receiver.borrow(cs).borrow_mut().as_mut() {
        Some(receiver) => receiver.tick(),
        None => Ok(false),
    })
}

/// Takes the oldest decoded frame out of the global receiver, if any.
///
/// Call from the main loop; the critical section only spans the decode.
pub fn global_receiver_read<RX: InputPin>(
    global_receiver: &'static GlobalReceiver<RX>,
) -> Option<Ax25Frame> {
    critical_section::with(|cs| {
        global_receiver
            .borrow(cs)
            .borrow_mut()
            .as_mut()
            .and_then(|receiver| receiver.receiver.receive())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::eh1::digital::{
        Mock as PinMock, State as PinState, Transaction as PinTransaction,
    };

    static RECEIVER: GlobalReceiver<PinMock> = global_receiver_init::<PinMock>();

    #[test]
    fn test_global_receiver_lifecycle() {
        assert!(!global_receiver_tick(&RECEIVER).unwrap());
        assert!(global_receiver_read(&RECEIVER).is_none());

        let bad = ReceiverConfig {
            symbol_rate: 0,
            ..ReceiverConfig::default()
        };
        let mut unused = PinMock::new(&[]);
        unused.done();
        assert!(global_receiver_setup(&RECEIVER, unused.clone(), bad, None).is_err());

        let rx = PinMock::new(&[
            PinTransaction::get(PinState::Low),
            PinTransaction::get(PinState::High),
        ]);
        global_receiver_setup(&RECEIVER, rx, ReceiverConfig::default(), None).unwrap();
        assert!(!global_receiver_tick(&RECEIVER).unwrap());
        assert!(!global_receiver_tick(&RECEIVER).unwrap());
        assert!(global_receiver_read(&RECEIVER).is_none());

        let mut receiver = critical_section::with(|cs| RECEIVER.borrow(cs).take()).unwrap();
        assert!(!receiver.receiver.locked());
        receiver.rx.done();
    }
}
