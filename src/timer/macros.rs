/// Declares a static global `RECEIVER` instance protected by a `critical_section` mutex.
///
/// This macro creates a `static` singleton `RECEIVER` suitable for use in
/// interrupt-based environments, where both the main thread and an ISR need
/// to safely access the shared receiver state.
///
/// # Arguments
/// - `$rx`: The concrete type of the RX pin (must implement `InputPin`)
///
/// # Example
/// ```rust,ignore
/// init_receiver!(MyRxPinType);
/// ```
#[macro_export]
macro_rules! init_receiver {
    ( $rx:ty ) => {
        pub static RECEIVER: $crate::timer::GlobalReceiver<$rx> =
            $crate::timer::global_receiver_init::<$rx>();
    };
}

/// Initializes the global `RECEIVER` singleton with a new receiver.
///
/// Expands to a [`Result`](crate::error::Result) that is `Err` when the
/// configuration is rejected.
///
/// # Arguments
/// - `$rx`: The RX pin (must implement `InputPin`)
/// - `$config`: A [`ReceiverConfig`](crate::driver::ReceiverConfig)
/// - `$rx_inverted`: Optional; whether the RX pin should be inverted
///
/// # Example
/// ```rust,ignore
/// fn main() {
///     setup_receiver!(rx, ReceiverConfig::default()).unwrap();
/// }
/// ```
///
/// # Notes
/// - Requires `init_receiver!` to have been used earlier.
#[macro_export]
macro_rules! setup_receiver {
    ( $rx:expr, $config:expr ) => {
        $crate::setup_receiver!($rx, $config, None)
    };
    ( $rx:expr, $config:expr, $rx_inverted:expr ) => {
        $crate::timer::global_receiver_setup(&RECEIVER, $rx, $config, $rx_inverted)
    };
}

/// Calls `tick()` on the global `RECEIVER` if it has been initialized.
///
/// This macro is intended to be invoked from a timer ISR firing at the
/// configured sample rate. Pin read errors are discarded.
///
/// # Example
/// ```rust,ignore
/// #[interrupt]
/// fn TIM2() {
///     tick_receiver!();
/// }
/// ```
#[macro_export]
macro_rules! tick_receiver {
    () => {
        let _ = $crate::timer::global_receiver_tick(&RECEIVER);
    };
}

/// Takes the oldest decoded frame from the global `RECEIVER`.
///
/// Expands to an `Option<Ax25Frame>`.
///
/// # Example
/// ```rust,ignore
/// loop {
///     if let Some(frame) = read_receiver!() {
///         // handle frame
///     }
/// }
/// ```
#[macro_export]
macro_rules! read_receiver {
    () => {
        $crate::timer::global_receiver_read(&RECEIVER)
    };
}
