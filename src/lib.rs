//! Platform-agnostic core of the SL Handbrake firmware.
//!
//! Turns a noisy analog handbrake sensor and two spring-loaded gear shift
//! paddles into a stable USB HID joystick report. Everything here is
//! `#![no_std]` with no heap allocation and no dependency on a particular
//! chip, so the whole control loop runs on host for testing.
//!
//! # Overview
//!
//! - [`config`]: compile-time configuration ([`HandbrakeConfig`]) and derived [`Settings`]
//! - [`input`]: sampling capabilities ([`AnalogInput`], [`DigitalInput`], [`Clock`])
//! - [`mapper`]: raw-to-axis mapping with headroom and auto-calibration ([`RangeMapper`])
//! - [`shifter`]: debounced gear shift edges ([`ShiftDebouncer`])
//! - [`report`]: HID report, descriptor and buffered emitter ([`ReportEmitter`])
//! - [`diag`]: best-effort diagnostic lines ([`DiagnosticSink`])
//! - [`scheduler`]: the loop body tying it together ([`LoopScheduler`])
//!
//! # Example
//!
//! ```
//! use handbrake_core::{HandbrakeConfig, RangeMapper};
//!
//! let settings = HandbrakeConfig {
//!     output_resolution_bits: 10,
//!     ..HandbrakeConfig::DEFAULT
//! }
//! .validate()
//! .unwrap();
//!
//! let mut mapper = RangeMapper::new(&settings);
//! assert_eq!(mapper.map(0), 0);
//! assert_eq!(mapper.map(u16::MAX), 1023);
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Log through defmt (for embedded targets)
//! - **`log`**: Log through the `log` facade

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

#[macro_use]
mod fmt;

pub mod config;
pub mod diag;
pub mod input;
pub mod mapper;
pub mod report;
pub mod scheduler;
pub mod shifter;

// Re-export main types at crate root
pub use config::{CalibrationMode, ConfigError, HandbrakeConfig, Settings, MAX_DEVICE_NAME_LEN};
pub use diag::{DiagnosticLine, DiagnosticSink, NullSink, MAX_DIAGNOSTIC_LINE};
pub use input::{ActiveLow, AnalogInput, Clock, DigitalInput};
pub use mapper::{Calibration, RangeMapper};
pub use report::{
    report_descriptor, JoystickButton, JoystickReport, ReportBuffer, ReportEmitter,
    REPORT_DESCRIPTOR_LEN,
};
pub use scheduler::{AxisUpdate, Board, LoopScheduler, LoopTiming, ShiftEvent, TickOutcome};
pub use shifter::{ButtonState, Edge, ShiftDebouncer, Shifter};
