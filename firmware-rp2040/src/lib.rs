//! SL Handbrake firmware for RP2040.
//!
//! This crate provides the embedded implementation of a USB handbrake with
//! a sequential shifter: the control loop from [`handbrake_core`] wired to
//! the RP2040 ADC, GPIO and USB peripherals.
//!
//! # Overview
//!
//! The firmware runs on a Raspberry Pi Pico (RP2040) and:
//! 1. Samples the handbrake sensor on the ADC and the two shift paddles on GPIO
//! 2. Maps the sample onto the joystick Z axis and debounces the paddles
//! 3. Outputs the result as a USB HID joystick
//! 4. Optionally streams diagnostic lines over a USB serial console
//!
//! # Hardware Configuration
//!
//! | Function   | GPIO | Description |
//! |------------|------|-------------|
//! | Sensor     | 26   | ADC0, pressure sensor or potentiometer wiper |
//! | Shift up   | 2    | Paddle to GND, internal pull-up |
//! | Shift down | 3    | Paddle to GND, internal pull-up |
//!
//! # Architecture
//!
//! The firmware uses the Embassy async runtime with four tasks:
//!
//! - **USB Task**: Manages the USB device stack
//! - **Control Task**: Runs [`LoopScheduler::tick`] at the configured loop rate
//! - **HID Task**: Receives published reports and writes them to the host
//! - **Console Task**: Writes queued diagnostic lines to the CDC-ACM port
//!
//! Reports travel from the control task to the HID task through an Embassy
//! [`Signal`](embassy_sync::signal::Signal) with "latest value wins"
//! semantics; diagnostic lines through a bounded
//! [`Channel`](embassy_sync::channel::Channel).
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)
//! - **`diagnostics`**: Stream `<raw>/<mapped>` lines over the USB serial console
//!
//! # Re-exports
//!
//! This crate re-exports the public items of [`handbrake_core`] it is built
//! around, so the binary only needs to depend on this crate.

#![no_std]

// Ensure mutually exclusive panic handlers
#[cfg(all(feature = "dev-panic", feature = "prod-panic"))]
compile_error!("Cannot enable both `dev-panic` and `prod-panic` features - they define conflicting panic handlers");

// Re-export core types for convenience
pub use handbrake_core::{
    report_descriptor, ActiveLow, Board, CalibrationMode, HandbrakeConfig, JoystickReport,
    LoopScheduler, Settings, TickOutcome, REPORT_DESCRIPTOR_LEN,
};

pub mod console;
pub mod sensor;
pub mod usb_output;

pub use console::{run_console, ConsoleChannel, ConsoleSink};
pub use sensor::{AdcSensor, EmbassyClock, ADC_RESOLUTION_BITS};
pub use usb_output::{
    configure_usb_hid, JoystickHidOutput, ReportSignal, SignalReportEmitter, UsbDriver,
    REPORT_SIZE,
};

/// The board as seen by the control loop.
pub type RpBoard = Board<
    AdcSensor<'static>,
    ActiveLow<embassy_rp::gpio::Input<'static>>,
    EmbassyClock,
>;
