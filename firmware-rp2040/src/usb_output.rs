//! USB HID joystick output.
//!
//! The control loop stages axis and button values in a [`SignalReportEmitter`].
//! `flush()` hands the finished report to the HID task through a [`Signal`],
//! so the host only ever sees complete reports and a slow host simply skips to
//! the newest one.

use defmt::{error, info, trace};
use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_usb::class::hid::{HidWriter, State};
use embassy_usb::driver::EndpointError;
use embassy_usb::Builder;
use handbrake_core::{JoystickReport, ReportBuffer, ReportEmitter};

/// USB driver of the RP2040.
pub type UsbDriver<'d> = Driver<'d, USB>;

/// Size of one HID input report.
pub const REPORT_SIZE: usize = JoystickReport::SIZE;

/// Latest published report, waiting to be written to the host.
pub type ReportSignal = Signal<CriticalSectionRawMutex, JoystickReport>;

/// [`ReportEmitter`] that publishes flushed reports through a [`ReportSignal`].
pub struct SignalReportEmitter<'a> {
    buffer: ReportBuffer,
    signal: &'a ReportSignal,
}

impl<'a> SignalReportEmitter<'a> {
    #[must_use]
    pub fn new(signal: &'a ReportSignal) -> Self {
        Self {
            buffer: ReportBuffer::new(),
            signal,
        }
    }
}

impl ReportEmitter for SignalReportEmitter<'_> {
    #[inline]
    fn set_axis(&mut self, value: u16) {
        self.buffer.set_axis(value);
    }

    #[inline]
    fn set_button(&mut self, index: u8, pressed: bool) {
        self.buffer.set_button(index, pressed);
    }

    fn flush(&mut self) {
        // Overwrites a report the HID task has not picked up yet.
        self.signal.signal(self.buffer.flush());
    }
}

/// USB HID joystick output.
///
/// Wraps an embassy-usb HID writer to send joystick reports.
pub struct JoystickHidOutput<'d> {
    writer: HidWriter<'d, UsbDriver<'d>, REPORT_SIZE>,
    ready: bool,
}

impl<'d> JoystickHidOutput<'d> {
    /// Create a new USB HID output from the given HID writer.
    pub fn new(writer: HidWriter<'d, UsbDriver<'d>, REPORT_SIZE>) -> Self {
        Self {
            writer,
            ready: false,
        }
    }

    /// Wait until the device is ready (USB enumerated).
    pub async fn wait_ready(&mut self) {
        self.writer.ready().await;
        self.ready = true;
    }

    /// Whether [`wait_ready`](Self::wait_ready) has completed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Write one report to the interrupt endpoint.
    pub async fn send(&mut self, report: &JoystickReport) -> Result<(), EndpointError> {
        self.writer.write(&report.as_bytes()).await
    }

    /// Forward every signalled report to the host. Never returns.
    pub async fn run(&mut self, reports: &ReportSignal) -> ! {
        self.wait_ready().await;
        info!("USB HID ready, forwarding joystick reports...");

        loop {
            let report = reports.wait().await;
            trace!("HID report {:?}", report);
            if let Err(e) = self.send(&report).await {
                error!("HID write failed: {:?}", e);
            }
        }
    }
}

/// Configure the USB HID class in the USB builder.
///
/// `report_descriptor` must describe [`JoystickReport`]; build it with
/// [`handbrake_core::report_descriptor`].
pub fn configure_usb_hid<'d>(
    builder: &mut Builder<'d, UsbDriver<'d>>,
    state: &'d mut State<'d>,
    report_descriptor: &'d [u8],
) -> HidWriter<'d, UsbDriver<'d>, REPORT_SIZE> {
    let config = embassy_usb::class::hid::Config {
        report_descriptor,
        request_handler: None,
        poll_ms: 1,
        max_packet_size: 8,
        hid_subclass: embassy_usb::class::hid::HidSubclass::No,
        hid_boot_protocol: embassy_usb::class::hid::HidBootProtocol::None,
    };

    HidWriter::new(builder, state, config)
}
