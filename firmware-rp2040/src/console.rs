//! USB serial (CDC-ACM) diagnostic console.
//!
//! The control loop never waits on the host: lines are queued with
//! `try_send` and dropped when the queue is full or nobody is listening.

use defmt::{debug, info, warn};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_usb::class::cdc_acm::CdcAcmClass;
use embassy_usb::driver::EndpointError;
use handbrake_core::{DiagnosticLine, DiagnosticSink};

use crate::usb_output::UsbDriver;

/// Lines buffered while the console task is busy.
pub const CONSOLE_DEPTH: usize = 8;

/// Max packet size of the CDC-ACM bulk endpoints.
pub const CONSOLE_PACKET_SIZE: u16 = 64;

/// Queue between the control loop and the console task.
pub type ConsoleChannel = Channel<CriticalSectionRawMutex, DiagnosticLine, CONSOLE_DEPTH>;

/// [`DiagnosticSink`] feeding a [`ConsoleChannel`].
pub struct ConsoleSink<'a> {
    lines: &'a ConsoleChannel,
}

impl<'a> ConsoleSink<'a> {
    #[must_use]
    pub fn new(lines: &'a ConsoleChannel) -> Self {
        Self { lines }
    }
}

impl DiagnosticSink for ConsoleSink<'_> {
    fn write_line(&mut self, line: &str) {
        debug!("{}", line);

        let mut owned = DiagnosticLine::new();
        if owned.push_str(line).is_err() {
            warn!("Diagnostic line too long, dropped");
            return;
        }
        // Full queue: no host reading, drop the line.
        let _ = self.lines.try_send(owned);
    }
}

async fn write_line(
    class: &mut CdcAcmClass<'static, UsbDriver<'static>>,
    line: &str,
) -> Result<(), EndpointError> {
    for chunk in line.as_bytes().chunks(CONSOLE_PACKET_SIZE as usize) {
        class.write_packet(chunk).await?;
    }
    class.write_packet(b"\r\n").await
}

/// Drain the console queue into the serial port. Never returns.
pub async fn run_console(
    class: &mut CdcAcmClass<'static, UsbDriver<'static>>,
    lines: &ConsoleChannel,
) -> ! {
    loop {
        class.wait_connection().await;
        info!("Console connected");

        // Lines queued while disconnected are stale.
        lines.clear();
        loop {
            let line = lines.receive().await;
            if write_line(class, &line).await.is_err() {
                break;
            }
        }
        info!("Console disconnected");
    }
}
