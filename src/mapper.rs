//! Raw sample to axis value mapping with headroom clipping and auto-calibration.

use crate::config::{CalibrationMode, Settings};

/// Observed sensor extremes.
///
/// Starts at the middle 50% of the theoretical input range and only ever
/// widens, so a freshly booted device does not report full travel before the
/// sensor has actually been moved there.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    min: u16,
    max: u16,
}

impl Calibration {
    /// Initial window for an input range of `input_range` values.
    #[must_use]
    pub const fn new(input_range: u32) -> Self {
        Self {
            min: (input_range / 4) as u16,
            max: (input_range * 3 / 4) as u16,
        }
    }

    /// Smallest sample seen so far (or the initial lower bound).
    #[inline]
    #[must_use]
    pub const fn min(&self) -> u16 {
        self.min
    }

    /// Largest sample seen so far (or the initial upper bound).
    #[inline]
    #[must_use]
    pub const fn max(&self) -> u16 {
        self.max
    }

    /// Widen the window to include `raw`. Returns `true` if a bound moved.
    pub fn observe(&mut self, raw: u16) -> bool {
        if raw < self.min {
            trace!("Calibration min widened {} -> {}", self.min, raw);
            self.min = raw;
            true
        } else if raw > self.max {
            trace!("Calibration max widened {} -> {}", self.max, raw);
            self.max = raw;
            true
        } else {
            false
        }
    }
}

/// Maps raw samples into the output range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RangeMapper {
    input_max: u32,
    output_max: u32,
    deadzone: u32,
    mode: CalibrationMode,
    calibration: Calibration,
}

impl RangeMapper {
    /// Build a mapper from validated settings.
    #[must_use]
    pub const fn new(settings: &Settings) -> Self {
        Self {
            input_max: settings.input_range() - 1,
            output_max: settings.output_range() - 1,
            deadzone: settings.deadzone_width(),
            mode: settings.config().calibration,
            calibration: Calibration::new(settings.input_range()),
        }
    }

    /// Current calibration window, if calibration is enabled.
    #[must_use]
    pub fn calibration(&self) -> Option<&Calibration> {
        match self.mode {
            CalibrationMode::Disabled => None,
            CalibrationMode::TrackOnly | CalibrationMode::Apply => Some(&self.calibration),
        }
    }

    /// Map one raw sample, updating calibration first.
    pub fn map(&mut self, raw: u16) -> u16 {
        // Samples wider than the configured resolution saturate at full scale.
        let raw = (raw as u32).min(self.input_max);

        let scaled = match self.mode {
            CalibrationMode::Disabled => self.scale(raw),
            CalibrationMode::TrackOnly => {
                self.calibration.observe(raw as u16);
                self.scale(raw)
            }
            CalibrationMode::Apply => {
                self.calibration.observe(raw as u16);
                self.scale_calibrated(raw)
            }
        };

        self.clip(scaled) as u16
    }

    /// Linear rescale of `[0, input_max]` onto `[0, output_max]`, truncating.
    #[inline]
    fn scale(&self, raw: u32) -> u32 {
        (raw as u64 * self.output_max as u64 / self.input_max as u64) as u32
    }

    /// Linear rescale of the calibration window onto `[0, output_max]`.
    ///
    /// The window is never narrower than half the input range and always
    /// contains `raw` after [`Calibration::observe`].
    #[inline]
    fn scale_calibrated(&self, raw: u32) -> u32 {
        let min = self.calibration.min as u32;
        let span = self.calibration.max as u32 - min;
        ((raw - min) as u64 * self.output_max as u64 / span as u64) as u32
    }

    /// Force values inside the headroom bands to the range extremes.
    #[inline]
    fn clip(&self, scaled: u32) -> u32 {
        if scaled < self.deadzone {
            0
        } else if scaled > self.output_max - self.deadzone {
            self.output_max
        } else {
            scaled
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HandbrakeConfig;

    fn mapper(input_bits: u8, output_bits: u8, deadzone: u8, mode: CalibrationMode) -> RangeMapper {
        let settings = HandbrakeConfig {
            input_resolution_bits: input_bits,
            output_resolution_bits: output_bits,
            deadzone_percentage: deadzone,
            calibration: mode,
            ..HandbrakeConfig::DEFAULT
        }
        .validate()
        .unwrap();
        RangeMapper::new(&settings)
    }

    /// Smallest raw sample whose scaled value reaches `target` (16 -> 10 bits).
    fn raw_for_scaled(target: u32) -> u16 {
        ((target * 65535).div_ceil(1023)) as u16
    }

    #[test]
    fn test_worked_example_extremes() {
        let mut m = mapper(16, 10, 1, CalibrationMode::Disabled);
        assert_eq!(m.map(0), 0);
        assert_eq!(m.map(65535), 1023);
    }

    #[test]
    fn test_worked_example_deadzone_clipping() {
        let mut m = mapper(16, 10, 1, CalibrationMode::Disabled);
        assert_eq!(m.map(raw_for_scaled(5)), 0);
        assert_eq!(m.map(raw_for_scaled(1020)), 1023);
        // Just outside the bands values pass through.
        assert_eq!(m.map(raw_for_scaled(10)), 10);
        assert_eq!(m.map(raw_for_scaled(1013)), 1013);
        assert_eq!(m.map(raw_for_scaled(1014)), 1023);
    }

    #[test]
    fn test_output_in_range_and_monotonic() {
        for &(input_bits, output_bits, deadzone) in
            &[(1, 1, 0), (4, 8, 5), (8, 4, 10), (10, 10, 1), (12, 16, 3), (16, 10, 1)]
        {
            let mut m = mapper(input_bits, output_bits, deadzone, CalibrationMode::Disabled);
            let output_range = 1u32 << output_bits;
            let mut previous = 0u16;
            for raw in 0..(1u32 << input_bits) {
                let out = m.map(raw as u16);
                assert!((out as u32) < output_range, "raw {raw} -> {out} out of range");
                assert!(out >= previous, "raw {raw} -> {out} decreased from {previous}");
                previous = out;
            }
        }
    }

    #[test]
    fn test_endpoints_reachable() {
        for deadzone in 1..50 {
            let mut m = mapper(12, 10, deadzone, CalibrationMode::Disabled);
            assert_eq!(m.map(0), 0);
            assert_eq!(m.map(4095), 1023);
        }
    }

    #[test]
    fn test_single_bit_ranges_do_not_divide_by_zero() {
        let mut m = mapper(1, 1, 0, CalibrationMode::Apply);
        assert_eq!(m.map(0), 0);
        assert_eq!(m.map(1), 1);
    }

    #[test]
    fn test_oversized_sample_saturates() {
        let mut m = mapper(12, 10, 0, CalibrationMode::Disabled);
        assert_eq!(m.map(u16::MAX), 1023);
    }

    #[test]
    fn test_calibration_starts_at_middle_half() {
        let m = mapper(16, 16, 1, CalibrationMode::TrackOnly);
        let cal = m.calibration().unwrap();
        assert_eq!(cal.min(), 16384);
        assert_eq!(cal.max(), 49152);
    }

    #[test]
    fn test_calibration_disabled_has_no_window() {
        let m = mapper(16, 16, 1, CalibrationMode::Disabled);
        assert!(m.calibration().is_none());
    }

    #[test]
    fn test_calibration_only_widens() {
        let mut m = mapper(16, 16, 1, CalibrationMode::TrackOnly);
        let samples = [30000, 10000, 20000, 60000, 5000, 40000, 65535, 0, 32768];
        let mut last_min = u16::MAX;
        let mut last_max = 0;
        for raw in samples {
            m.map(raw);
            let cal = *m.calibration().unwrap();
            assert!(cal.min() <= last_min);
            assert!(cal.max() >= last_max);
            assert!(cal.min() <= raw && raw <= cal.max());
            last_min = cal.min();
            last_max = cal.max();
        }
        assert_eq!(last_min, 0);
        assert_eq!(last_max, 65535);
    }

    #[test]
    fn test_track_only_does_not_change_mapping() {
        let mut tracked = mapper(16, 10, 1, CalibrationMode::TrackOnly);
        let mut plain = mapper(16, 10, 1, CalibrationMode::Disabled);
        for raw in [0u16, 100, 16000, 32768, 50000, 65535] {
            assert_eq!(tracked.map(raw), plain.map(raw));
        }
    }

    #[test]
    fn test_apply_maps_initial_window_to_full_travel() {
        let mut m = mapper(16, 16, 0, CalibrationMode::Apply);
        assert_eq!(m.map(16384), 0);
        assert_eq!(m.map(49152), 65535);
        assert_eq!(m.map(32768), 32767);
    }

    #[test]
    fn test_apply_rescales_after_widening() {
        let mut m = mapper(16, 16, 0, CalibrationMode::Apply);
        assert_eq!(m.map(0), 0);
        // Window is now [0, 49152]; the old upper bound still hits full travel.
        assert_eq!(m.map(49152), 65535);
        assert_eq!(m.map(24576), 32767);
    }

    #[test]
    fn test_observe_reports_change() {
        let mut cal = Calibration::new(1024);
        assert!(!cal.observe(512));
        assert!(cal.observe(10));
        assert!(!cal.observe(10));
        assert!(cal.observe(1000));
    }
}
