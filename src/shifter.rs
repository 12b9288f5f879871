//! Debounced edge detection for the gear shift paddles.
//!
//! Spring-loaded shifters bounce hard enough that a per-input debounce still
//! lets a release of one paddle chatter into the other. All shifters therefore
//! share a single re-trigger timestamp: any confirmed edge blocks every
//! shifter until `min_interval_ms` has passed.

/// A gear shift input, in polling order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Shifter {
    Up,
    Down,
}

impl Shifter {
    /// All shifters in the order they are polled.
    pub const ALL: [Shifter; 2] = [Shifter::Up, Shifter::Down];

    #[inline]
    const fn slot(self) -> usize {
        match self {
            Shifter::Up => 0,
            Shifter::Down => 1,
        }
    }
}

/// A confirmed transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Edge {
    Pressed,
    Released,
}

impl Edge {
    /// Button level after this edge.
    #[inline]
    #[must_use]
    pub const fn is_pressed(self) -> bool {
        matches!(self, Edge::Pressed)
    }
}

/// Remembered state of one shifter.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ButtonState {
    /// Debounced level.
    pub pressed: bool,
    /// Time of the last confirmed transition, `None` before the first one.
    pub last_transition_ms: Option<u32>,
}

/// Debouncer for all shifters, gated by one shared timestamp.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ShiftDebouncer {
    min_interval_ms: u32,
    last_shift_ms: Option<u32>,
    states: [ButtonState; 2],
}

impl ShiftDebouncer {
    #[must_use]
    pub const fn new(min_interval_ms: u32) -> Self {
        Self {
            min_interval_ms,
            last_shift_ms: None,
            states: [
                ButtonState {
                    pressed: false,
                    last_transition_ms: None,
                },
                ButtonState {
                    pressed: false,
                    last_transition_ms: None,
                },
            ],
        }
    }

    /// Whether the shared re-trigger interval has elapsed at `now_ms`.
    ///
    /// Always `true` before the first edge. Uses wrapping subtraction, so a
    /// single wrap of the millisecond counter is handled.
    #[inline]
    #[must_use]
    pub fn is_armed(&self, now_ms: u32) -> bool {
        match self.last_shift_ms {
            None => true,
            Some(last) => now_ms.wrapping_sub(last) >= self.min_interval_ms,
        }
    }

    /// Time of the most recent edge on any shifter.
    #[inline]
    #[must_use]
    pub const fn last_shift_ms(&self) -> Option<u32> {
        self.last_shift_ms
    }

    /// Debounced state of one shifter.
    #[inline]
    #[must_use]
    pub const fn state(&self, shifter: Shifter) -> &ButtonState {
        &self.states[shifter.slot()]
    }

    /// Feed the raw level of `shifter` sampled at `now_ms`.
    ///
    /// Returns the confirmed edge, if any. An edge restarts the shared
    /// interval for every shifter.
    pub fn update(&mut self, shifter: Shifter, active: bool, now_ms: u32) -> Option<Edge> {
        let state = &self.states[shifter.slot()];
        if active == state.pressed || !self.is_armed(now_ms) {
            return None;
        }

        let edge = if active { Edge::Pressed } else { Edge::Released };
        self.states[shifter.slot()] = ButtonState {
            pressed: active,
            last_transition_ms: Some(now_ms),
        };
        self.last_shift_ms = Some(now_ms);
        debug!("Shifter {:?} {:?} at {}ms", shifter, edge, now_ms);
        Some(edge)
    }
}
