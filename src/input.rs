//! Hardware sampling capabilities: analog sensor, shifter pins and clock.
//!
//! The control loop only sees these traits, so it runs the same against the
//! RP2040 peripherals and against the fakes used in tests.

use embedded_hal::digital::InputPin;

/// Raw analog sampling.
///
/// Implementations return a value in `[0, 2^input_resolution_bits)`. There is
/// no failure return: a stuck or disconnected sensor simply yields a flat
/// reading.
pub trait AnalogInput {
    /// Sample the sensor once.
    fn sample(&mut self) -> u16;
}

/// Raw digital sampling with the "active" level already resolved.
pub trait DigitalInput {
    /// `true` while the switch is held.
    fn is_active(&mut self) -> bool;
}

/// Monotonic millisecond clock.
///
/// The counter wraps at `u32::MAX`; consumers compare timestamps with
/// wrapping subtraction.
pub trait Clock {
    /// Milliseconds since boot.
    fn now_ms(&self) -> u32;
}

/// Active-low switch on a pulled-up pin: electrically LOW means pressed.
///
/// Read errors are reported as "released", the state that never injects a
/// gear change.
pub struct ActiveLow<P> {
    pin: P,
}

impl<P: InputPin> ActiveLow<P> {
    /// Wrap a pin configured with its pull-up enabled.
    #[must_use]
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    /// Release the wrapped pin.
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: InputPin> DigitalInput for ActiveLow<P> {
    fn is_active(&mut self) -> bool {
        match self.pin.is_low() {
            Ok(low) => low,
            Err(_) => {
                warn!("Shifter pin read failed, treating as released");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::{ErrorKind, ErrorType};

    struct FakePin {
        low: bool,
    }

    impl ErrorType for FakePin {
        type Error = Infallible;
    }

    impl InputPin for FakePin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.low)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(self.low)
        }
    }

    struct BrokenPin;

    impl ErrorType for BrokenPin {
        type Error = ErrorKind;
    }

    impl InputPin for BrokenPin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Err(ErrorKind::Other)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Err(ErrorKind::Other)
        }
    }

    #[test]
    fn test_active_low_pressed_when_low() {
        let mut switch = ActiveLow::new(FakePin { low: true });
        assert!(switch.is_active());
    }

    #[test]
    fn test_active_low_released_when_high() {
        let mut switch = ActiveLow::new(FakePin { low: false });
        assert!(!switch.is_active());
    }

    #[test]
    fn test_read_error_is_released() {
        let mut switch = ActiveLow::new(BrokenPin);
        assert!(!switch.is_active());
    }

    #[test]
    fn test_into_inner_returns_pin() {
        let pin = ActiveLow::new(FakePin { low: true }).into_inner();
        assert!(pin.low);
    }
}
