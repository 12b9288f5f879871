#![no_std]
#![no_main]

use defmt::{debug, info};
use defmt_rtt as _;
use embassy_executor::Spawner;
use embassy_rp::adc::{Adc, Channel as AdcChannel, Config as AdcConfig};
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::{Input, Pull};
use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_time::{Duration, Ticker};
use embassy_usb::class::cdc_acm::{CdcAcmClass, State as CdcState};
use embassy_usb::class::hid::State as HidState;
use embassy_usb::{Builder, Config as UsbConfig};
use sl_handbrake_rp2040::console::CONSOLE_PACKET_SIZE;
use sl_handbrake_rp2040::{
    configure_usb_hid, report_descriptor, run_console, ActiveLow, AdcSensor, Board,
    CalibrationMode, ConsoleChannel, ConsoleSink, EmbassyClock, HandbrakeConfig,
    JoystickHidOutput, LoopScheduler, ReportSignal, RpBoard, Settings, SignalReportEmitter,
    UsbDriver, ADC_RESOLUTION_BITS, REPORT_DESCRIPTOR_LEN,
};
use static_cell::StaticCell;

#[cfg(feature = "dev-panic")]
use panic_probe as _;
#[cfg(feature = "prod-panic")]
use panic_reset as _;

bind_interrupts!(struct Irqs {
    USBCTRL_IRQ => embassy_rp::usb::InterruptHandler<USB>;
});

/// Handbrake configuration.
const CONFIG: HandbrakeConfig = HandbrakeConfig {
    loop_frequency_hz: 1000,
    update_interval_ms: 10,
    input_resolution_bits: ADC_RESOLUTION_BITS,
    output_resolution_bits: 16,
    deadzone_percentage: 1,
    console_interval_ms: 100,
    min_shift_interval_ms: 100,
    diagnostics_enabled: cfg!(feature = "diagnostics"),
    calibration: CalibrationMode::TrackOnly,
    device_name: "SL Handbrake",
};

/// Validated at compile time: a bad configuration fails the build.
const SETTINGS: Settings = match CONFIG.validate() {
    Ok(settings) => settings,
    Err(_) => panic!("invalid handbrake configuration"),
};

/// HID report descriptor matching the configured output resolution.
static REPORT_DESCRIPTOR: [u8; REPORT_DESCRIPTOR_LEN] = report_descriptor(SETTINGS.output_max());

/// Latest flushed joystick report, "latest value wins".
static REPORTS: StaticCell<ReportSignal> = StaticCell::new();

/// Diagnostic lines waiting for the serial console.
static CONSOLE_LINES: StaticCell<ConsoleChannel> = StaticCell::new();

/// USB device configuration buffer.
static CONFIG_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static MSOS_DESCRIPTOR: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();

/// USB class state.
static HID_STATE: StaticCell<HidState> = StaticCell::new();
static CDC_STATE: StaticCell<CdcState> = StaticCell::new();

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("{} starting...", CONFIG.device_name);

    let p = embassy_rp::init(embassy_rp::config::Config::default());

    let reports: &'static ReportSignal = REPORTS.init(ReportSignal::new());
    let console_lines: &'static ConsoleChannel = CONSOLE_LINES.init(ConsoleChannel::new());

    // --- Sampling Setup ---
    let adc = Adc::new_blocking(p.ADC, AdcConfig::default());
    let sensor_channel = AdcChannel::new_pin(p.PIN_26, Pull::None);
    let board: RpBoard = Board {
        sensor: AdcSensor::new(adc, sensor_channel),
        shift_up: ActiveLow::new(Input::new(p.PIN_2, Pull::Up)),
        shift_down: ActiveLow::new(Input::new(p.PIN_3, Pull::Up)),
        clock: EmbassyClock,
    };

    // --- USB Setup ---
    let usb_driver = Driver::new(p.USB, Irqs);

    let mut usb_config = UsbConfig::new(0x1209, 0x0001); // pid.codes test VID/PID
    usb_config.manufacturer = Some("SL");
    usb_config.product = Some(CONFIG.device_name);
    usb_config.serial_number = Some("001");
    usb_config.max_power = 100;
    usb_config.max_packet_size_0 = 64;

    let config_descriptor = CONFIG_DESCRIPTOR.init([0; 256]);
    let bos_descriptor = BOS_DESCRIPTOR.init([0; 256]);
    let msos_descriptor = MSOS_DESCRIPTOR.init([0; 256]);
    let control_buf = CONTROL_BUF.init([0; 64]);

    let mut builder = Builder::new(
        usb_driver,
        usb_config,
        config_descriptor,
        bos_descriptor,
        msos_descriptor,
        control_buf,
    );

    // Configure HID class
    let hid_state = HID_STATE.init(HidState::new());
    let hid_writer = configure_usb_hid(&mut builder, hid_state, &REPORT_DESCRIPTOR);

    // Configure serial console
    let cdc_state = CDC_STATE.init(CdcState::new());
    let console = CdcAcmClass::new(&mut builder, cdc_state, CONSOLE_PACKET_SIZE);

    // Build the USB device
    let usb_device = builder.build();

    let hid_output = JoystickHidOutput::new(hid_writer);
    let emitter = SignalReportEmitter::new(reports);
    let sink = ConsoleSink::new(console_lines);

    // Spawn tasks (unwrap the SpawnToken, then spawn)
    spawner.spawn(usb_task(usb_device).unwrap());
    spawner.spawn(hid_task(hid_output, reports).unwrap());
    spawner.spawn(console_task(console, console_lines).unwrap());
    spawner.spawn(control_task(board, emitter, sink).unwrap());

    info!("{} initialized", CONFIG.device_name);
}

/// USB device task - runs the USB stack.
#[embassy_executor::task]
async fn usb_task(mut device: embassy_usb::UsbDevice<'static, UsbDriver<'static>>) {
    device.run().await;
}

/// HID task - writes each published report to the host.
#[embassy_executor::task]
async fn hid_task(mut output: JoystickHidOutput<'static>, reports: &'static ReportSignal) {
    output.run(reports).await
}

/// Console task - drains diagnostic lines into the USB serial port.
#[embassy_executor::task]
async fn console_task(
    mut class: CdcAcmClass<'static, UsbDriver<'static>>,
    lines: &'static ConsoleChannel,
) {
    run_console(&mut class, lines).await
}

/// Control task - samples, maps and debounces at the configured loop rate.
#[embassy_executor::task]
async fn control_task(
    mut board: RpBoard,
    mut emitter: SignalReportEmitter<'static>,
    mut sink: ConsoleSink<'static>,
) {
    let mut scheduler = LoopScheduler::new(SETTINGS);
    scheduler.start(&mut sink);

    let interval = scheduler.tick_interval_ms();
    let mut ticker = Ticker::every(Duration::from_millis(interval.into()));

    loop {
        let outcome = scheduler.tick(&mut board, &mut emitter, &mut sink);
        if let Some(shift) = outcome.shift {
            debug!("{:?} {:?}", shift.shifter, shift.edge);
        }

        if interval == 0 {
            // Free-running: still let the USB tasks make progress.
            embassy_futures::yield_now().await;
        } else {
            ticker.next().await;
        }
    }
}
