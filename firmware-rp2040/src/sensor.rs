//! RP2040 sampling: ADC handbrake sensor and the embassy-time clock.

use defmt::warn;
use embassy_rp::adc::{Adc, Blocking, Channel};
use embassy_time::Instant;
use handbrake_core::{AnalogInput, Clock};

/// Native resolution of the RP2040 ADC.
pub const ADC_RESOLUTION_BITS: u8 = 12;

/// Handbrake sensor on one of the ADC-capable pins (GPIO 26-29).
///
/// Uses blocking single-shot conversions, which take about 2us and keep the
/// control loop free of suspension points.
pub struct AdcSensor<'d> {
    adc: Adc<'d, Blocking>,
    channel: Channel<'d>,
    /// Last good conversion, repeated when a read fails.
    last: u16,
}

impl<'d> AdcSensor<'d> {
    /// Create a sensor from a blocking ADC driver and its input channel.
    #[must_use]
    pub fn new(adc: Adc<'d, Blocking>, channel: Channel<'d>) -> Self {
        Self {
            adc,
            channel,
            last: 0,
        }
    }
}

impl AnalogInput for AdcSensor<'_> {
    fn sample(&mut self) -> u16 {
        match self.adc.blocking_read(&mut self.channel) {
            Ok(value) => self.last = value,
            Err(e) => warn!("ADC read failed: {:?}, repeating {}", e, self.last),
        }
        self.last
    }
}

/// Millisecond clock backed by the embassy time driver.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmbassyClock;

impl Clock for EmbassyClock {
    #[inline]
    fn now_ms(&self) -> u32 {
        // Truncation gives the wrapping u32 counter the core expects.
        Instant::now().as_millis() as u32
    }
}
