//! HID joystick report, its descriptor, and the buffered report emitter.

/// Buttons carried in the joystick report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum JoystickButton {
    /// Handbrake pulled past half travel.
    Engaged,
    /// Up-shift paddle.
    ShiftUp,
    /// Down-shift paddle.
    ShiftDown,
}

impl JoystickButton {
    /// Zero-based HID button index.
    #[inline]
    #[must_use]
    pub const fn index(self) -> u8 {
        match self {
            JoystickButton::Engaged => 0,
            JoystickButton::ShiftUp => 1,
            JoystickButton::ShiftDown => 2,
        }
    }
}

/// Number of buttons declared in the report descriptor.
pub const BUTTON_COUNT: u8 = 3;

/// USB HID joystick report.
///
/// Total size: 3 bytes (Z axis: 2, buttons: 1).
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(C)]
pub struct JoystickReport {
    /// Z axis, `0..=output_max`.
    pub z: u16,
    /// Button bitfield, bit `n` = button `n + 1`.
    pub buttons: u8,
}

impl JoystickReport {
    /// Size of the report in bytes.
    pub const SIZE: usize = 3;

    /// Released report with the axis at rest.
    #[must_use]
    pub const fn neutral() -> Self {
        Self { z: 0, buttons: 0 }
    }

    /// Whether button `index` is set.
    #[inline]
    #[must_use]
    pub const fn button(&self, index: u8) -> bool {
        index < BUTTON_COUNT && self.buttons & (1 << index) != 0
    }

    /// Set or clear button `index`. Indices past [`BUTTON_COUNT`] are ignored.
    #[inline]
    pub fn set_button(&mut self, index: u8, pressed: bool) {
        if index >= BUTTON_COUNT {
            return;
        }
        if pressed {
            self.buttons |= 1 << index;
        } else {
            self.buttons &= !(1 << index);
        }
    }

    /// Convert the report to bytes.
    #[must_use]
    pub fn as_bytes(&self) -> [u8; Self::SIZE] {
        let z = self.z.to_le_bytes();
        [z[0], z[1], self.buttons]
    }
}

/// Length of the descriptor returned by [`report_descriptor`].
pub const REPORT_DESCRIPTOR_LEN: usize = 44;

/// HID report descriptor for a joystick with one Z axis and three buttons.
///
/// `logical_max` is the largest axis value the firmware reports; the axis
/// field is always 16 bits wide.
#[must_use]
pub const fn report_descriptor(logical_max: u16) -> [u8; REPORT_DESCRIPTOR_LEN] {
    let max = (logical_max as u32).to_le_bytes();
    [
        0x05, 0x01, // Usage Page (Generic Desktop)
        0x09, 0x04, // Usage (Joystick)
        0xA1, 0x01, // Collection (Application)
        //
        // --- Z axis ---
        0x09, 0x32, //   Usage (Z)
        0x15, 0x00, //   Logical Minimum (0)
        0x27, max[0], max[1], max[2], max[3], // Logical Maximum (32-bit, unsigned range)
        0x75, 0x10, //   Report Size (16)
        0x95, 0x01, //   Report Count (1)
        0x81, 0x02, //   Input (Data, Variable, Absolute)
        //
        // --- Buttons ---
        0x05, 0x09, //   Usage Page (Button)
        0x19, 0x01, //   Usage Minimum (Button 1)
        0x29, BUTTON_COUNT, // Usage Maximum (Button 3)
        0x15, 0x00, //   Logical Minimum (0)
        0x25, 0x01, //   Logical Maximum (1)
        0x75, 0x01, //   Report Size (1)
        0x95, BUTTON_COUNT, // Report Count (3)
        0x81, 0x02, //   Input (Data, Variable, Absolute)
        //
        // --- Padding to a full byte ---
        0x75, 0x05, //   Report Size (5)
        0x95, 0x01, //   Report Count (1)
        0x81, 0x03, //   Input (Constant)
        //
        0xC0, // End Collection
    ]
}

/// HID report capability.
///
/// `set_axis` and `set_button` only edit a local copy; the host observes new
/// state at [`ReportEmitter::flush`], which publishes axis and buttons
/// together.
pub trait ReportEmitter {
    /// Stage a new axis value.
    fn set_axis(&mut self, value: u16);

    /// Stage a button level.
    fn set_button(&mut self, index: u8, pressed: bool);

    /// Publish the staged report.
    fn flush(&mut self);
}

/// Staged and published copies of the joystick report.
///
/// Emitters embed this and forward [`ReportBuffer::flush`]'s result to the
/// transport.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReportBuffer {
    pending: JoystickReport,
    published: JoystickReport,
}

impl ReportBuffer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: JoystickReport::neutral(),
            published: JoystickReport::neutral(),
        }
    }

    /// Report being edited.
    #[inline]
    #[must_use]
    pub const fn pending(&self) -> &JoystickReport {
        &self.pending
    }

    /// Report the host saw last.
    #[inline]
    #[must_use]
    pub const fn published(&self) -> &JoystickReport {
        &self.published
    }

    #[inline]
    pub fn set_axis(&mut self, value: u16) {
        self.pending.z = value;
    }

    #[inline]
    pub fn set_button(&mut self, index: u8, pressed: bool) {
        self.pending.set_button(index, pressed);
    }

    /// Publish the pending report and return it.
    pub fn flush(&mut self) -> JoystickReport {
        self.published = self.pending;
        trace!("Report flushed: z={} buttons={}", self.published.z, self.published.buttons);
        self.published
    }
}
