//! The control loop: scan the panel, dispatch to the engine, send MIDI and
//! refresh the step LEDs.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use stepseq::sequencer::{BitField, Engine, MidiBatch, SequencerConfig, MUX_CHANNELS};

use crate::line::{ReadLine, WriteLine};
use crate::pair::{MuxPair, MuxTiming};

/// Everything configurable about the running instrument, built once at
/// startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ScanConfig {
    pub sequencer: SequencerConfig,
    pub timing: MuxTiming,
}

/// Byte-level MIDI output.
///
/// One call carries one complete three-byte channel message. Implementations
/// write the bytes in order and return when they have been queued or sent.
pub trait MidiOut {
    type Error;

    fn send(&mut self, message: [u8; 3]) -> Result<(), Self::Error>;
}

/// One panel wired to one [`Engine`].
///
/// - `panel` pairs the potentiometers (unit A) with the step LEDs (unit B).
/// - `controls` pairs the control switches (unit A) with the step-select
///   buttons (unit B).
///
/// A failing multiplexer or MIDI operation is logged and skipped; the rest
/// of the iteration still runs and the loop never stops.
pub struct ScanLoop<const N: usize, P, POT, LED, SW, SEL, D, M> {
    panel: MuxPair<P, POT, LED, D>,
    controls: MuxPair<P, SW, SEL, D>,
    midi: M,
    engine: Engine<N>,
}

impl<const N: usize, P, POT, LED, SW, SEL, D, M> ScanLoop<N, P, POT, LED, SW, SEL, D, M>
where
    P: OutputPin,
    POT: ReadLine<Value = u16>,
    LED: WriteLine,
    SW: ReadLine<Value = bool>,
    SEL: ReadLine<Value = bool>,
    D: DelayNs,
    M: MidiOut,
{
    pub fn new(
        config: &ScanConfig,
        panel: MuxPair<P, POT, LED, D>,
        controls: MuxPair<P, SW, SEL, D>,
        midi: M,
    ) -> Self {
        Self {
            panel,
            controls,
            midi,
            engine: Engine::new(config.sequencer),
        }
    }

    pub fn engine(&self) -> &Engine<N> {
        &self.engine
    }

    /// Access for loading a pattern before [`run()`](Self::run).
    pub fn engine_mut(&mut self) -> &mut Engine<N> {
        &mut self.engine
    }

    pub fn midi(&self) -> &M {
        &self.midi
    }

    /// One pass over the panel at time `now_ms`.
    pub fn run_once(&mut self, now_ms: u64) {
        // ── Potentiometers ───────────────────────────────────────────
        match self.panel.read_bank_a() {
            Ok(raw) => self.engine.apply_pots(&raw),
            Err(_e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("pot scan failed: {}", _e);
            }
        }

        // ── Switches ─────────────────────────────────────────────────
        let levels = self
            .controls
            .read_bank_a()
            .and_then(|switches| Ok((switches, self.controls.read_bank_b()?)));
        match levels {
            Ok((switches, steps)) => {
                let batch = self
                    .engine
                    .apply_switches(pack(&switches), pack(&steps), now_ms);
                self.send(&batch);
            }
            Err(_e) => {
                #[cfg(feature = "defmt")]
                defmt::warn!("switch scan failed: {}", _e);
            }
        }

        // ── Clock ────────────────────────────────────────────────────
        let batch = self.engine.on_clock(now_ms);
        self.send(&batch);

        // ── LEDs ─────────────────────────────────────────────────────
        if let Err(_e) = self.panel.write_bank_b(self.engine.led_bits()) {
            #[cfg(feature = "defmt")]
            defmt::warn!("LED refresh failed: {}", _e);
        }
    }

    /// Scan forever, reading the time from `now_ms` before each pass.
    pub fn run(&mut self, mut now_ms: impl FnMut() -> u64) -> ! {
        #[cfg(feature = "defmt")]
        defmt::info!("scan loop started, {} steps at {} bpm", N, self.engine.clock().bpm());

        loop {
            self.run_once(now_ms());
        }
    }

    fn send(&mut self, batch: &MidiBatch) {
        for message in batch {
            if self.midi.send(message.to_bytes()).is_err() {
                #[cfg(feature = "defmt")]
                defmt::error!("MIDI send failed: {}", message);
            }
        }
    }
}

/// Pack one scanned bank into a byte, channel `n` in bit `n`.
fn pack(levels: &[bool; MUX_CHANNELS]) -> u8 {
    levels
        .iter()
        .enumerate()
        .fold(0u8, |bits, (channel, &high)| bits.set_flag(channel as u32, high))
}
