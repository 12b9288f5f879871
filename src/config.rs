//! Startup configuration and the constants derived from it.
//!
//! Configuration is a set of compile-time constants. [`HandbrakeConfig::validate`]
//! is a `const fn`, so firmware can evaluate it in a `const` item and turn a
//! bad configuration into a build failure instead of a division by zero at
//! runtime.

use core::fmt;

/// Widest supported sample or output resolution in bits.
pub const MAX_RESOLUTION_BITS: u8 = 16;

/// Longest device name advertised in the USB product string.
pub const MAX_DEVICE_NAME_LEN: usize = 32;

/// How observed sensor extremes influence the axis mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CalibrationMode {
    /// No calibration state is kept; the full theoretical input range is used.
    Disabled,
    /// Observed min/max are tracked (and reported) but the mapping still
    /// spans the full theoretical input range.
    TrackOnly,
    /// The mapping spans the observed `[min, max]` window instead of the
    /// theoretical input range.
    Apply,
}

/// Compile-time configuration of the handbrake.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HandbrakeConfig {
    /// Control loop frequency. The tick interval is `1000 / loop_frequency_hz`
    /// milliseconds; frequencies above 1 kHz give a free-running loop.
    pub loop_frequency_hz: u32,
    /// Minimum time between two axis updates (and report flushes).
    pub update_interval_ms: u32,
    /// Resolution of the raw analog sample.
    pub input_resolution_bits: u8,
    /// Resolution of the reported axis.
    pub output_resolution_bits: u8,
    /// Headroom at each end of the output range, in percent.
    pub deadzone_percentage: u8,
    /// Minimum time between two diagnostic lines. `0` disables them.
    pub console_interval_ms: u32,
    /// Minimum time between two gear shift edges, shared by all shifters.
    pub min_shift_interval_ms: u32,
    /// Master switch for diagnostic output.
    pub diagnostics_enabled: bool,
    /// Auto-calibration behaviour.
    pub calibration: CalibrationMode,
    /// Name advertised as the USB product string.
    pub device_name: &'static str,
}

impl HandbrakeConfig {
    /// Defaults matching the original Teensy handbrake build.
    pub const DEFAULT: Self = Self {
        loop_frequency_hz: 100,
        update_interval_ms: 10,
        input_resolution_bits: 16,
        output_resolution_bits: 16,
        deadzone_percentage: 1,
        console_interval_ms: 0,
        min_shift_interval_ms: 100,
        diagnostics_enabled: false,
        calibration: CalibrationMode::TrackOnly,
        device_name: "SL Handbrake",
    };

    /// Single-cadence variant: axis updates run on every loop tick.
    #[must_use]
    pub const fn with_fixed_rate(mut self) -> Self {
        self.update_interval_ms = tick_interval(self.loop_frequency_hz);
        self
    }

    /// Check the configuration and compute the derived constants.
    pub const fn validate(self) -> Result<Settings, ConfigError> {
        if self.input_resolution_bits == 0 {
            return Err(ConfigError::ZeroInputResolution);
        }
        if self.input_resolution_bits > MAX_RESOLUTION_BITS {
            return Err(ConfigError::InputResolutionTooWide);
        }
        if self.output_resolution_bits == 0 {
            return Err(ConfigError::ZeroOutputResolution);
        }
        if self.output_resolution_bits > MAX_RESOLUTION_BITS {
            return Err(ConfigError::OutputResolutionTooWide);
        }
        if self.deadzone_percentage >= 50 {
            return Err(ConfigError::DeadzoneTooWide);
        }
        if self.loop_frequency_hz == 0 {
            return Err(ConfigError::ZeroLoopFrequency);
        }

        let name = self.device_name.as_bytes();
        if name.is_empty() {
            return Err(ConfigError::EmptyDeviceName);
        }
        if name.len() > MAX_DEVICE_NAME_LEN {
            return Err(ConfigError::DeviceNameTooLong);
        }
        let mut i = 0;
        while i < name.len() {
            if !name[i].is_ascii() || name[i].is_ascii_control() {
                return Err(ConfigError::NonAsciiDeviceName);
            }
            i += 1;
        }

        let input_range = 1u32 << self.input_resolution_bits;
        let output_range = 1u32 << self.output_resolution_bits;
        Ok(Settings {
            config: self,
            input_range,
            output_range,
            deadzone_width: self.deadzone_percentage as u32 * output_range / 100,
            tick_interval_ms: tick_interval(self.loop_frequency_hz),
        })
    }
}

impl Default for HandbrakeConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

const fn tick_interval(loop_frequency_hz: u32) -> u32 {
    if loop_frequency_hz == 0 {
        0
    } else {
        1000 / loop_frequency_hz
    }
}

/// A validated configuration plus its derived constants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    config: HandbrakeConfig,
    input_range: u32,
    output_range: u32,
    deadzone_width: u32,
    tick_interval_ms: u32,
}

impl Settings {
    /// The configuration these settings were derived from.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &HandbrakeConfig {
        &self.config
    }

    /// Number of distinct raw sample values (`2^input_resolution_bits`).
    #[inline]
    #[must_use]
    pub const fn input_range(&self) -> u32 {
        self.input_range
    }

    /// Number of distinct output values (`2^output_resolution_bits`).
    #[inline]
    #[must_use]
    pub const fn output_range(&self) -> u32 {
        self.output_range
    }

    /// Largest reportable axis value.
    #[inline]
    #[must_use]
    pub const fn output_max(&self) -> u16 {
        (self.output_range - 1) as u16
    }

    /// Width of the headroom band at each end of the output range.
    #[inline]
    #[must_use]
    pub const fn deadzone_width(&self) -> u32 {
        self.deadzone_width
    }

    /// Delay between two loop iterations.
    #[inline]
    #[must_use]
    pub const fn tick_interval_ms(&self) -> u32 {
        self.tick_interval_ms
    }

    /// Axis value above which the "engaged" button is reported pressed.
    #[inline]
    #[must_use]
    pub const fn engage_threshold(&self) -> u16 {
        (self.output_range / 2) as u16
    }
}

/// Configuration rejected by [`HandbrakeConfig::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// `input_resolution_bits` is zero (single-value input range).
    ZeroInputResolution,
    /// `output_resolution_bits` is zero (single-value output range).
    ZeroOutputResolution,
    /// Input resolution exceeds [`MAX_RESOLUTION_BITS`].
    InputResolutionTooWide,
    /// Output resolution exceeds [`MAX_RESOLUTION_BITS`].
    OutputResolutionTooWide,
    /// Headroom of 50% or more would overlap at both ends.
    DeadzoneTooWide,
    /// Loop frequency is zero.
    ZeroLoopFrequency,
    /// Device name is empty.
    EmptyDeviceName,
    /// Device name exceeds [`MAX_DEVICE_NAME_LEN`].
    DeviceNameTooLong,
    /// Device name contains non-printable or non-ASCII characters.
    NonAsciiDeviceName,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            ConfigError::ZeroInputResolution => "input resolution must be at least 1 bit",
            ConfigError::ZeroOutputResolution => "output resolution must be at least 1 bit",
            ConfigError::InputResolutionTooWide => "input resolution exceeds 16 bits",
            ConfigError::OutputResolutionTooWide => "output resolution exceeds 16 bits",
            ConfigError::DeadzoneTooWide => "deadzone must be below 50 percent",
            ConfigError::ZeroLoopFrequency => "loop frequency must be non-zero",
            ConfigError::EmptyDeviceName => "device name is empty",
            ConfigError::DeviceNameTooLong => "device name exceeds 32 characters",
            ConfigError::NonAsciiDeviceName => "device name must be printable ASCII",
        };
        f.write_str(msg)
    }
}
