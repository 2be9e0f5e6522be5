//! stepseq-hw-interface
//!
//! Step sequencer firmware for the Raspberry Pi Pico 2. Wires the RP2350
//! peripherals into the `stepseq-io` scan loop:
//!
//! 1. Both multiplexer pairs are scanned: potentiometers edit the selected
//!    step and the tempo, switches drive the transport and step flags.
//! 2. The tempo clock is polled against the embassy-time monotonic clock.
//! 3. Note-off / note-on messages go out over UART0 at MIDI baud rate.
//! 4. The step LEDs are rewritten through the LED multiplexer.
//!
//! Everything runs in one blocking loop; there is no executor.

#![no_std]
#![no_main]

use cortex_m_rt::entry;
use defmt::*;
use embassy_rp::adc::{self, Adc, Channel};
use embassy_rp::block::ImageDef;
use embassy_rp::gpio::{Input, Level, Output, Pull};
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{self, Blocking, UartTx};
use embassy_time::{Delay, Instant};
use {defmt_rtt as _, panic_probe as _};

use stepseq_io::{
    AnalogInput, AnalogRead, DigitalInput, DigitalOutput, MidiOut, MuxPair, ScanConfig, ScanLoop,
};

/// Steps in the pattern, one per LED / step-select button.
const STEP_COUNT: usize = 8;

/// Standard MIDI DIN baud rate.
const MIDI_BAUD: u32 = 31_250;

// ---------------------------------------------------------------------------
// Boot block
// ---------------------------------------------------------------------------

/// Tell the RP2350 Boot ROM about our application.
#[link_section = ".start_block"]
#[used]
pub static IMAGE_DEF: ImageDef = embassy_rp::block::ImageDef::secure_exe();

// ---------------------------------------------------------------------------
// Peripheral adapters
// ---------------------------------------------------------------------------

/// One ADC input behind the potentiometer multiplexer.
///
/// The RP2350 converts to 12 bits; the scan loop works in 10.
struct PotAdc {
    adc: Adc<'static, adc::Blocking>,
    channel: Channel<'static>,
}

impl AnalogRead for PotAdc {
    type Error = adc::Error;

    fn read_raw(&mut self) -> Result<u16, adc::Error> {
        self.adc.blocking_read(&mut self.channel).map(|raw| raw >> 2)
    }
}

/// MIDI output on the UART TX line.
struct UartMidi {
    tx: UartTx<'static, UART0, Blocking>,
}

impl MidiOut for UartMidi {
    type Error = uart::Error;

    fn send(&mut self, message: [u8; 3]) -> Result<(), uart::Error> {
        self.tx.blocking_write(&message)
    }
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[entry]
fn main() -> ! {
    let p = embassy_rp::init(Default::default());
    info!("stepseq-hw-interface starting");

    // —— Pin assignments ————————————————————————————————————————————————————
    // MUX_A_S0..S2 → GP2, GP3, GP4    address bus, pots + LEDs
    // MUX_B_S0..S2 → GP5, GP6, GP7    address bus, switches + step buttons
    // POTS         → GP26 (ADC0)      potentiometer mux common
    // LEDS         → GP27             LED mux common, push-pull
    // SWITCHES     → GP28             switch mux common, pull-up, active-low
    // STEP_BUTTONS → GP22             step button mux common, pull-up, active-low
    // MIDI_TX      → GP0  (UART0 TX)
    // ———————————————————————————————————————————————————————————————————————

    let config = ScanConfig::default();
    info!(
        "midi channel {}, {} bpm, {} pulses per step",
        config.sequencer.midi_channel + 1,
        config.sequencer.initial_bpm,
        config.sequencer.pulses_per_step
    );

    // Potentiometer ADC, blocking conversions only.
    let pots = PotAdc {
        adc: Adc::new_blocking(p.ADC, adc::Config::default()),
        channel: Channel::new_pin(p.PIN_26, Pull::None),
    };

    // Pots (unit 1) and LEDs (unit 2) share address bus A.
    let panel = MuxPair::new(
        [
            Output::new(p.PIN_2, Level::Low),
            Output::new(p.PIN_3, Level::Low),
            Output::new(p.PIN_4, Level::Low),
        ],
        AnalogInput::new(pots),
        DigitalOutput::new(Output::new(p.PIN_27, Level::Low)),
        Delay,
        config.timing,
    );

    // Switches (unit 3) and step buttons (unit 4) share address bus B.
    let controls = MuxPair::new(
        [
            Output::new(p.PIN_5, Level::Low),
            Output::new(p.PIN_6, Level::Low),
            Output::new(p.PIN_7, Level::Low),
        ],
        DigitalInput::new(Input::new(p.PIN_28, Pull::Up)),
        DigitalInput::new(Input::new(p.PIN_22, Pull::Up)),
        Delay,
        config.timing,
    );

    let mut uart_config = uart::Config::default();
    uart_config.baudrate = MIDI_BAUD;
    let midi = UartMidi {
        tx: UartTx::new_blocking(p.UART0, p.PIN_0, uart_config),
    };

    let mut scan: ScanLoop<STEP_COUNT, _, _, _, _, _, _, _> =
        ScanLoop::new(&config, panel, controls, midi);

    scan.run(|| Instant::now().as_millis())
}
