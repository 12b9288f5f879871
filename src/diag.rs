//! Diagnostic console lines.

use core::fmt::Write;
use heapless::String;

use crate::config::Settings;

/// Longest diagnostic line, without line ending.
pub const MAX_DIAGNOSTIC_LINE: usize = 64;

/// A formatted diagnostic line.
pub type DiagnosticLine = String<MAX_DIAGNOSTIC_LINE>;

/// Best-effort text output.
///
/// Implementations must never block the control loop; a line that cannot be
/// delivered is dropped.
pub trait DiagnosticSink {
    fn write_line(&mut self, line: &str);
}

/// Sink that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    #[inline]
    fn write_line(&mut self, _line: &str) {}
}

/// `"<raw>/<mapped>"` line emitted after an axis update.
#[must_use]
pub fn sample_line(raw: u16, mapped: u16) -> DiagnosticLine {
    let mut line = DiagnosticLine::new();
    // Two u16 values and a slash always fit.
    let _ = write!(line, "{}/{}", raw, mapped);
    line
}

/// Startup banner describing the output resolution and loop rate.
#[must_use]
pub fn banner(settings: &Settings) -> DiagnosticLine {
    let config = settings.config();
    let mut line = DiagnosticLine::new();
    let _ = write!(
        line,
        "Starting joystick at {} bits resolution, running at {}Hz",
        config.output_resolution_bits, config.loop_frequency_hz
    );
    line
}
