//! The control loop body.
//!
//! [`LoopScheduler::tick`] runs one iteration: shifter polling gated by the
//! shared debounce timer, then an axis update gated by its own interval. All
//! state that survives between iterations lives in the scheduler itself; the
//! hardware is passed in on every call.

use crate::config::Settings;
use crate::diag::{banner, sample_line, DiagnosticSink};
use crate::input::{AnalogInput, Clock, DigitalInput};
use crate::mapper::RangeMapper;
use crate::report::{JoystickButton, ReportEmitter};
use crate::shifter::{Edge, ShiftDebouncer, Shifter};

/// The sampling capabilities of a board.
pub struct Board<A, S, C> {
    /// Handbrake pressure sensor or potentiometer.
    pub sensor: A,
    /// Up-shift paddle.
    pub shift_up: S,
    /// Down-shift paddle.
    pub shift_down: S,
    /// Millisecond clock.
    pub clock: C,
}

impl<A, S, C> Board<A, S, C> {
    fn shifter(&mut self, shifter: Shifter) -> &mut S {
        match shifter {
            Shifter::Up => &mut self.shift_up,
            Shifter::Down => &mut self.shift_down,
        }
    }
}

/// Timestamps gating the axis and console sub-loops.
///
/// `None` means the sub-loop has not run yet; it then runs on the next tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LoopTiming {
    pub last_update_ms: Option<u32>,
    pub last_console_ms: Option<u32>,
}

#[inline]
fn elapsed(last: Option<u32>, now_ms: u32, interval_ms: u32) -> bool {
    match last {
        None => true,
        Some(last) => now_ms.wrapping_sub(last) >= interval_ms,
    }
}

/// A shifter edge forwarded during a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ShiftEvent {
    pub shifter: Shifter,
    pub edge: Edge,
}

/// An axis update performed during a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisUpdate {
    pub raw: u16,
    pub mapped: u16,
}

/// What a single tick did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[must_use]
pub struct TickOutcome {
    pub shift: Option<ShiftEvent>,
    pub axis: Option<AxisUpdate>,
}

const fn shifter_button(shifter: Shifter) -> JoystickButton {
    match shifter {
        Shifter::Up => JoystickButton::ShiftUp,
        Shifter::Down => JoystickButton::ShiftDown,
    }
}

/// Owns every piece of state the control loop keeps between iterations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoopScheduler {
    settings: Settings,
    mapper: RangeMapper,
    shifters: ShiftDebouncer,
    timing: LoopTiming,
}

impl LoopScheduler {
    #[must_use]
    pub const fn new(settings: Settings) -> Self {
        Self {
            mapper: RangeMapper::new(&settings),
            shifters: ShiftDebouncer::new(settings.config().min_shift_interval_ms),
            timing: LoopTiming {
                last_update_ms: None,
                last_console_ms: None,
            },
            settings,
        }
    }

    #[inline]
    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    #[inline]
    #[must_use]
    pub const fn mapper(&self) -> &RangeMapper {
        &self.mapper
    }

    #[inline]
    #[must_use]
    pub const fn shifters(&self) -> &ShiftDebouncer {
        &self.shifters
    }

    #[inline]
    #[must_use]
    pub const fn timing(&self) -> &LoopTiming {
        &self.timing
    }

    /// Delay the caller should wait between two ticks.
    #[inline]
    #[must_use]
    pub const fn tick_interval_ms(&self) -> u32 {
        self.settings.tick_interval_ms()
    }

    /// Log the configuration and print the startup banner.
    pub fn start<L: DiagnosticSink>(&self, sink: &mut L) {
        let config = self.settings.config();
        info!(
            "Handbrake: {}-bit in, {}-bit out, {}% headroom, {}Hz loop, {}ms update",
            config.input_resolution_bits,
            config.output_resolution_bits,
            config.deadzone_percentage,
            config.loop_frequency_hz,
            config.update_interval_ms
        );
        if config.diagnostics_enabled {
            sink.write_line(banner(&self.settings).as_str());
        }
    }

    /// Run one loop iteration.
    pub fn tick<A, S, C, E, L>(
        &mut self,
        board: &mut Board<A, S, C>,
        emitter: &mut E,
        sink: &mut L,
    ) -> TickOutcome
    where
        A: AnalogInput,
        S: DigitalInput,
        C: Clock,
        E: ReportEmitter,
        L: DiagnosticSink,
    {
        let now = board.clock.now_ms();
        let mut outcome = TickOutcome::default();

        if self.shifters.is_armed(now) {
            for shifter in Shifter::ALL {
                let active = board.shifter(shifter).is_active();
                if let Some(edge) = self.shifters.update(shifter, active, now) {
                    emitter.set_button(shifter_button(shifter).index(), edge.is_pressed());
                    outcome.shift = Some(ShiftEvent { shifter, edge });
                }
            }
        }

        let config = *self.settings.config();
        if elapsed(self.timing.last_update_ms, now, config.update_interval_ms) {
            let raw = board.sensor.sample();
            let mapped = self.mapper.map(raw);

            emitter.set_axis(mapped);
            emitter.set_button(
                JoystickButton::Engaged.index(),
                mapped > self.settings.engage_threshold(),
            );
            emitter.flush();
            self.timing.last_update_ms = Some(now);
            outcome.axis = Some(AxisUpdate { raw, mapped });

            if config.diagnostics_enabled
                && config.console_interval_ms > 0
                && elapsed(self.timing.last_console_ms, now, config.console_interval_ms)
            {
                sink.write_line(sample_line(raw, mapped).as_str());
                self.timing.last_console_ms = Some(now);
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::config::{CalibrationMode, HandbrakeConfig};
    use crate::diag::NullSink;
    use crate::report::{JoystickReport, ReportBuffer};
    use std::string::{String, ToString};
    use std::vec;
    use std::vec::Vec;

    struct FakeSensor {
        value: u16,
        samples: usize,
    }

    impl AnalogInput for FakeSensor {
        fn sample(&mut self) -> u16 {
            self.samples += 1;
            self.value
        }
    }

    struct FakeSwitch {
        active: bool,
    }

    impl DigitalInput for FakeSwitch {
        fn is_active(&mut self) -> bool {
            self.active
        }
    }

    struct ManualClock {
        now: u32,
    }

    impl Clock for ManualClock {
        fn now_ms(&self) -> u32 {
            self.now
        }
    }

    #[derive(Default)]
    struct RecordingEmitter {
        buffer: ReportBuffer,
        flushed: Vec<[u8; JoystickReport::SIZE]>,
    }

    impl ReportEmitter for RecordingEmitter {
        fn set_axis(&mut self, value: u16) {
            self.buffer.set_axis(value);
        }

        fn set_button(&mut self, index: u8, pressed: bool) {
            self.buffer.set_button(index, pressed);
        }

        fn flush(&mut self) {
            let report = self.buffer.flush();
            self.flushed.push(report.as_bytes());
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        lines: Vec<String>,
    }

    impl DiagnosticSink for RecordingSink {
        fn write_line(&mut self, line: &str) {
            self.lines.push(line.to_string());
        }
    }

    type TestBoard = Board<FakeSensor, FakeSwitch, ManualClock>;

    fn board() -> TestBoard {
        Board {
            sensor: FakeSensor {
                value: 0,
                samples: 0,
            },
            shift_up: FakeSwitch { active: false },
            shift_down: FakeSwitch { active: false },
            clock: ManualClock { now: 0 },
        }
    }

    fn scheduler(config: HandbrakeConfig) -> LoopScheduler {
        LoopScheduler::new(config.validate().unwrap())
    }

    /// 16-bit in, 10-bit out, 1% headroom, 10ms updates.
    fn ten_bit() -> HandbrakeConfig {
        HandbrakeConfig {
            output_resolution_bits: 10,
            calibration: CalibrationMode::Disabled,
            ..HandbrakeConfig::DEFAULT
        }
    }

    #[test]
    fn test_first_tick_publishes_axis() {
        let mut s = scheduler(ten_bit());
        let mut b = board();
        let mut e = RecordingEmitter::default();
        b.sensor.value = 65535;

        let outcome = s.tick(&mut b, &mut e, &mut NullSink);
        assert_eq!(
            outcome.axis,
            Some(AxisUpdate {
                raw: 65535,
                mapped: 1023
            })
        );
        assert_eq!(e.flushed, vec![[0xFF, 0x03, 0b001]]);
        assert_eq!(s.timing().last_update_ms, Some(0));
    }

    #[test]
    fn test_axis_throttled_by_update_interval() {
        let mut s = scheduler(ten_bit());
        let mut b = board();
        let mut e = RecordingEmitter::default();

        for t in 0..10 {
            b.clock.now = t;
            let _ = s.tick(&mut b, &mut e, &mut NullSink);
        }
        assert_eq!(b.sensor.samples, 1);
        assert_eq!(e.flushed.len(), 1);

        b.clock.now = 10;
        let outcome = s.tick(&mut b, &mut e, &mut NullSink);
        assert!(outcome.axis.is_some());
        assert_eq!(b.sensor.samples, 2);
        assert_eq!(e.flushed.len(), 2);
    }

    #[test]
    fn test_fixed_rate_updates_every_tick() {
        let mut s = scheduler(ten_bit().with_fixed_rate());
        let mut b = board();
        let mut e = RecordingEmitter::default();
        let step = s.tick_interval_ms();
        assert_eq!(step, 10);

        for i in 0..5 {
            b.clock.now = i * step;
            assert!(s.tick(&mut b, &mut e, &mut NullSink).axis.is_some());
        }
        assert_eq!(e.flushed.len(), 5);
    }

    #[test]
    fn test_shift_events_share_debounce_timer() {
        let mut s = scheduler(ten_bit());
        let mut b = board();
        let mut e = RecordingEmitter::default();

        b.shift_up.active = true;
        let outcome = s.tick(&mut b, &mut e, &mut NullSink);
        assert_eq!(
            outcome.shift,
            Some(ShiftEvent {
                shifter: Shifter::Up,
                edge: Edge::Pressed
            })
        );
        assert!(e.buffer.published().button(JoystickButton::ShiftUp.index()));

        b.shift_down.active = true;
        b.clock.now = 50;
        assert_eq!(s.tick(&mut b, &mut e, &mut NullSink).shift, None);
        assert!(!s.shifters().state(Shifter::Down).pressed);

        b.clock.now = 100;
        let outcome = s.tick(&mut b, &mut e, &mut NullSink);
        assert_eq!(
            outcome.shift,
            Some(ShiftEvent {
                shifter: Shifter::Down,
                edge: Edge::Pressed
            })
        );
        assert_eq!(e.flushed.last(), Some(&[0, 0, 0b110]));
    }

    #[test]
    fn test_up_shifter_polled_before_down() {
        let mut s = scheduler(ten_bit());
        let mut b = board();
        let mut e = RecordingEmitter::default();

        b.shift_up.active = true;
        b.shift_down.active = true;
        let outcome = s.tick(&mut b, &mut e, &mut NullSink);
        assert_eq!(outcome.shift.map(|event| event.shifter), Some(Shifter::Up));
        assert!(!s.shifters().state(Shifter::Down).pressed);
    }

    #[test]
    fn test_shift_release_clears_button() {
        let mut s = scheduler(ten_bit());
        let mut b = board();
        let mut e = RecordingEmitter::default();

        b.shift_up.active = true;
        let _ = s.tick(&mut b, &mut e, &mut NullSink);
        b.shift_up.active = false;
        b.clock.now = 150;
        let outcome = s.tick(&mut b, &mut e, &mut NullSink);
        assert_eq!(outcome.shift.map(|event| event.edge), Some(Edge::Released));
        assert_eq!(e.flushed.last(), Some(&[0, 0, 0]));
    }

    #[test]
    fn test_engaged_button_above_half_travel() {
        let mut s = scheduler(ten_bit());
        let mut b = board();
        let mut e = RecordingEmitter::default();

        // floor(32800 * 1023 / 65535) = 512, not above half of 1024.
        b.sensor.value = 32800;
        let outcome = s.tick(&mut b, &mut e, &mut NullSink);
        assert_eq!(outcome.axis.map(|axis| axis.mapped), Some(512));
        assert!(!e.buffer.published().button(0));

        b.sensor.value = 32900;
        b.clock.now = 10;
        let outcome = s.tick(&mut b, &mut e, &mut NullSink);
        assert_eq!(outcome.axis.map(|axis| axis.mapped), Some(513));
        assert!(e.buffer.published().button(0));
    }

    #[test]
    fn test_console_lines_rate_limited() {
        let config = HandbrakeConfig {
            diagnostics_enabled: true,
            console_interval_ms: 100,
            ..ten_bit()
        };
        let mut s = scheduler(config);
        let mut b = board();
        let mut e = RecordingEmitter::default();
        let mut sink = RecordingSink::default();
        b.sensor.value = 65535;

        for t in (0..=200).step_by(10) {
            b.clock.now = t;
            let _ = s.tick(&mut b, &mut e, &mut sink);
        }
        assert_eq!(sink.lines, vec!["65535/1023"; 3]);
        assert_eq!(s.timing().last_console_ms, Some(200));
    }

    #[test]
    fn test_console_disabled() {
        for config in [
            HandbrakeConfig {
                diagnostics_enabled: false,
                console_interval_ms: 100,
                ..ten_bit()
            },
            HandbrakeConfig {
                diagnostics_enabled: true,
                console_interval_ms: 0,
                ..ten_bit()
            },
        ] {
            let mut s = scheduler(config);
            let mut b = board();
            let mut e = RecordingEmitter::default();
            let mut sink = RecordingSink::default();
            for t in 0..500 {
                b.clock.now = t;
                let _ = s.tick(&mut b, &mut e, &mut sink);
            }
            assert!(sink.lines.is_empty());
            assert_eq!(s.timing().last_console_ms, None);
        }
    }

    #[test]
    fn test_banner_only_with_diagnostics() {
        let mut sink = RecordingSink::default();
        scheduler(ten_bit()).start(&mut sink);
        assert!(sink.lines.is_empty());

        let config = HandbrakeConfig {
            diagnostics_enabled: true,
            ..ten_bit()
        };
        scheduler(config).start(&mut sink);
        assert_eq!(
            sink.lines,
            vec!["Starting joystick at 10 bits resolution, running at 100Hz"]
        );
    }

    #[test]
    fn test_updates_continue_across_clock_wrap() {
        let mut s = scheduler(ten_bit());
        let mut b = board();
        let mut e = RecordingEmitter::default();

        b.clock.now = u32::MAX - 4;
        assert!(s.tick(&mut b, &mut e, &mut NullSink).axis.is_some());
        b.clock.now = 2;
        assert!(s.tick(&mut b, &mut e, &mut NullSink).axis.is_none());
        b.clock.now = 5;
        assert!(s.tick(&mut b, &mut e, &mut NullSink).axis.is_some());
    }

    #[test]
    fn test_unchanged_state_flushes_identical_bytes() {
        let mut s = scheduler(ten_bit());
        let mut b = board();
        let mut e = RecordingEmitter::default();
        b.sensor.value = 20000;

        for t in (0..100).step_by(10) {
            b.clock.now = t;
            let _ = s.tick(&mut b, &mut e, &mut NullSink);
        }
        assert_eq!(e.flushed.len(), 10);
        assert!(e.flushed.windows(2).all(|pair| pair[0] == pair[1]));
    }

    #[test]
    fn test_calibration_tracked_through_ticks() {
        let config = HandbrakeConfig {
            calibration: CalibrationMode::TrackOnly,
            ..ten_bit()
        };
        let mut s = scheduler(config);
        let mut b = board();
        let mut e = RecordingEmitter::default();

        b.sensor.value = 100;
        let _ = s.tick(&mut b, &mut e, &mut NullSink);
        let calibration = s.mapper().calibration().copied().unwrap();
        assert_eq!(calibration.min(), 100);
        assert_eq!(calibration.max(), 49152);
    }
}
