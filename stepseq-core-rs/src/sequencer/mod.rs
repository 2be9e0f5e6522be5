//! Step sequencer model and MIDI dispatch.
//!
//! This module holds everything the sequencer needs that does not touch a
//! pin: the packed per-step note state, the fixed-size ring of steps, the
//! tempo clock, and the [`Engine`] that turns scanned control values and
//! clock ticks into MIDI messages.
//!
//! # Architecture
//!
//! ```text
//! pots/switches ──► Engine::apply_pots / apply_switches ──► Sequence (edit)
//!                                                          TempoClock (bpm)
//! now (ms) ───────► Engine::on_clock ──► TempoClock::tick ──► Sequence::advance
//!                                   └──► MidiBatch [note-off, note-on]
//! Engine::led_bits ──► LED bank byte
//! ```
//!
//! The engine is driven from a single control loop and never blocks. All
//! storage is fixed-size; nothing here allocates.
//!
//! # Timing
//!
//! Tempo follows the MIDI clock convention of [`PULSES_PER_QUARTER_NOTE`]
//! pulses per beat. The pulse interval is
//! `1000 / ((bpm / 60) * 24)` milliseconds and a step lasts
//! `pulses_per_step` pulses.

mod bits;
mod config;
mod controls;
mod engine;
mod error;
mod midi;
mod sequence;
mod step;
mod tempo;

pub use bits::{get_flag, set_flag, BitField};
pub use config::SequencerConfig;
pub use controls::{rescale, Pot, PotBank, Switch, SwitchBank};
pub use engine::Engine;
pub use error::SequenceError;
pub use midi::{MidiBatch, MidiMessage};
pub use sequence::Sequence;
pub use step::{StepFlag, StepFlags, StepRecord};
pub use tempo::TempoClock;

/// MIDI clock pulses per quarter note.
pub const PULSES_PER_QUARTER_NOTE: u32 = 24;

/// Lowest accepted tempo in beats per minute.
pub const MIN_BPM: u16 = 20;

/// Highest accepted tempo in beats per minute.
pub const MAX_BPM: u16 = 300;

/// Tempo used until the tempo control is moved.
pub const DEFAULT_BPM: u16 = 120;

/// Default MIDI note number for a fresh step (C3).
pub const DEFAULT_PITCH: u8 = 48;

/// Default MIDI velocity for a fresh step.
pub const DEFAULT_VELOCITY: u8 = 127;

/// Default step length in clock ticks.
pub const DEFAULT_LENGTH: u8 = 1;

/// Longest step length, in clock ticks, reachable from the length control.
pub const MAX_STEP_LENGTH: u8 = 16;

/// Largest value a 7-bit MIDI data byte can carry.
pub const MIDI_DATA_MAX: u8 = 127;

/// Full-scale reading of the 10-bit analog inputs.
pub const ADC_MAX: u16 = 1023;

/// Logical channels behind one multiplexer unit.
pub const MUX_CHANNELS: usize = 8;
