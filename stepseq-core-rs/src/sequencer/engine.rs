use super::bits::BitField;
use super::config::SequencerConfig;
use super::controls::{rescale, Pot, PotBank, Switch, SwitchBank};
use super::error::SequenceError;
use super::midi::{MidiBatch, MidiMessage};
use super::sequence::Sequence;
use super::step::StepFlag;
use super::tempo::TempoClock;
use super::{MAX_BPM, MAX_STEP_LENGTH, MIDI_DATA_MAX, MIN_BPM, MUX_CHANNELS};

/// Sequencer state driven by one control loop.
///
/// The engine is the only writer of the [`Sequence`] and the
/// [`TempoClock`]. Each loop iteration feeds it, in order:
///
/// 1. the raw potentiometer bank via [`apply_pots()`](Self::apply_pots),
/// 2. the packed switch levels via [`apply_switches()`](Self::apply_switches),
/// 3. the current time via [`on_clock()`](Self::on_clock),
///
/// sends every returned [`MidiMessage`] in order, then writes
/// [`led_bits()`](Self::led_bits) to the LED bank.
///
/// # Note ordering
///
/// When the sequence advances the batch is always `[note-off, note-on]`:
/// the outgoing note is released before the incoming one starts, so two
/// equal pitches are never merged into one held note downstream. The
/// note-on is dropped for a disabled or muted step; the note-off never is.
///
/// # Examples
///
/// ```
/// use stepseq::sequencer::{Engine, SequencerConfig, Switch};
///
/// let config = SequencerConfig {
///     pulses_per_step: 1,
///     switch_active_low: false,
///     ..SequencerConfig::default()
/// };
/// let mut engine: Engine<8> = Engine::new(config);
///
/// // Press play at t = 0: step 0 sounds immediately.
/// let started = engine.apply_switches(1 << Switch::PlayStop.bit(), 0, 0);
/// assert_eq!(started[0].to_bytes(), [0x90, 48, 127]);
///
/// // One pulse later (20.8 ms at 120 BPM) the sequence advances.
/// let batch = engine.on_clock(21);
/// assert_eq!(batch[0].to_bytes(), [0x80, 48, 0]);
/// assert_eq!(batch[1].to_bytes(), [0x90, 48, 127]);
/// assert_eq!(engine.sequence().current_index(), 1);
/// ```
pub struct Engine<const N: usize> {
    config: SequencerConfig,
    sequence: Sequence<N>,
    clock: TempoClock,
    pots: PotBank,
    transport: SwitchBank,
    step_buttons: SwitchBank,
    /// Step the potentiometers and flag switches act on.
    edit_index: usize,
    /// Pitch of the note-on still waiting for its note-off.
    sounding: Option<u8>,
    /// Clock ticks spent on the current step.
    ticks_on_step: u8,
}

impl<const N: usize> Engine<N> {
    /// Create a stopped engine with default steps, the edit cursor on step
    /// 0 and the clock at `config.initial_bpm`.
    pub fn new(config: SequencerConfig) -> Self {
        Self {
            sequence: Sequence::new(),
            clock: TempoClock::with_pulses_per_step(config.initial_bpm, config.pulses_per_step),
            pots: PotBank::new(config.pot_deadband),
            transport: SwitchBank::default(),
            step_buttons: SwitchBank::default(),
            edit_index: 0,
            sounding: None,
            ticks_on_step: 0,
            config,
        }
    }

    /// Returns the configuration the engine was built with.
    pub fn config(&self) -> &SequencerConfig {
        &self.config
    }

    /// Returns the step sequence.
    pub fn sequence(&self) -> &Sequence<N> {
        &self.sequence
    }

    /// Direct access for loading a pattern before the loop starts.
    pub fn sequence_mut(&mut self) -> &mut Sequence<N> {
        &mut self.sequence
    }

    /// Returns the tempo clock.
    pub fn clock(&self) -> &TempoClock {
        &self.clock
    }

    /// Index of the step the potentiometers and flag switches act on.
    pub fn edit_index(&self) -> usize {
        self.edit_index
    }

    /// Pitch currently held by a note-on, if any.
    pub fn sounding_pitch(&self) -> Option<u8> {
        self.sounding
    }

    // ── Control input ────────────────────────────────────────────────

    /// Apply one scan of the potentiometer bank.
    ///
    /// Pitch, velocity and length go to the edited step, tempo goes to the
    /// clock. Knobs that have not moved past the deadband are ignored.
    pub fn apply_pots(&mut self, raw: &[u16; MUX_CHANNELS]) {
        for pot in Pot::ALL {
            let Some(value) = self.pots.moved(pot.channel(), raw[pot.channel()]) else {
                continue;
            };

            let edit = self.edit_index;
            let result = match pot {
                Pot::Pitch => self
                    .sequence
                    .set_pitch(edit, rescale(value, 0, MIDI_DATA_MAX.into()) as u8),
                Pot::Velocity => self
                    .sequence
                    .set_velocity(edit, rescale(value, 0, MIDI_DATA_MAX.into()) as u8),
                Pot::Length => self
                    .sequence
                    .set_length(edit, rescale(value, 1, MAX_STEP_LENGTH.into()) as u8),
                Pot::Tempo => {
                    self.clock.set_bpm(rescale(value, MIN_BPM, MAX_BPM));
                    #[cfg(feature = "defmt")]
                    defmt::debug!("tempo: {} bpm", self.clock.bpm());
                    Ok(())
                }
            };
            Self::log_rejected(result);
        }
    }

    /// Apply one scan of the switch banks and return any notes the
    /// transport change produced.
    ///
    /// `transport` carries the control switches packed by [`Switch`] bit,
    /// `steps` carries one step-select button per bit. Both are raw line
    /// levels; polarity follows [`SequencerConfig::switch_active_low`].
    /// Only press edges act. Moving the edit cursor re-captures the
    /// potentiometer baselines, so the newly selected step keeps its values
    /// until a knob is turned.
    pub fn apply_switches(&mut self, transport: u8, steps: u8, now_ms: u64) -> MidiBatch {
        let (transport, steps) = if self.config.switch_active_low {
            (!transport, !steps)
        } else {
            (transport, steps)
        };

        let mut out = MidiBatch::new();
        let pressed = self.transport.pressed(transport);
        let edit_before = self.edit_index;

        if pressed.get_flag(Switch::Reset.bit()) {
            self.release(&mut out);
            self.sequence.reset();
            self.ticks_on_step = 0;
            #[cfg(feature = "defmt")]
            defmt::info!("reset");
        }

        if pressed.get_flag(Switch::PlayStop.bit()) {
            if self.sequence.is_running() {
                self.stop(&mut out);
            } else {
                self.start(now_ms, &mut out);
            }
        }

        let edit = self.edit_index;
        for (switch, flag) in [
            (Switch::Enable, StepFlag::Enabled),
            (Switch::Mute, StepFlag::Muted),
            (Switch::Accent, StepFlag::Accent),
        ] {
            if pressed.get_flag(switch.bit()) {
                Self::log_rejected(self.sequence.toggle_flag(edit, flag));
            }
        }

        if pressed.get_flag(Switch::EditPrevious.bit()) {
            self.edit_index = (self.edit_index + N - 1) % N;
        }
        if pressed.get_flag(Switch::EditNext.bit()) {
            self.edit_index = (self.edit_index + 1) % N;
        }

        let selected = self.step_buttons.pressed(steps);
        for index in 0..N.min(MUX_CHANNELS) {
            if !selected.get_flag(index as u32) {
                continue;
            }
            self.edit_index = index;
            if !self.sequence.is_running() {
                Self::log_rejected(self.sequence.jump_to(index));
                self.ticks_on_step = 0;
            }
        }

        if self.edit_index != edit_before {
            self.pots.rebase();
        }

        out
    }

    // ── Clock ────────────────────────────────────────────────────────

    /// Poll the tempo clock and advance the sequence when a step is due.
    ///
    /// A step of length `L` holds for `L` clock ticks. On advance the
    /// returned batch is `[note-off(outgoing), note-on(incoming)]`, the
    /// note-on omitted when the incoming step is not playable.
    pub fn on_clock(&mut self, now_ms: u64) -> MidiBatch {
        let mut out = MidiBatch::new();
        if !self.clock.tick(now_ms) || !self.sequence.is_running() {
            return out;
        }

        self.ticks_on_step = self.ticks_on_step.saturating_add(1);
        if self.ticks_on_step < self.sequence.current().length {
            return out;
        }
        self.ticks_on_step = 0;

        // Release with the pitch that was actually sent; the pitch knob may
        // have moved since.
        let outgoing = self
            .sounding
            .take()
            .unwrap_or(self.sequence.current().pitch);
        Self::emit(&mut out, MidiMessage::note_off(self.config.midi_channel, outgoing));

        let (_previous, _current) = self.sequence.advance();
        #[cfg(feature = "defmt")]
        defmt::trace!("step {} -> {}", _previous, _current);

        self.sound_current(&mut out);
        out
    }

    // ── LED output ───────────────────────────────────────────────────

    /// LED bank state, one bit per step (first 8 steps).
    ///
    /// A lit bit means the step is playable. The step under the play cursor
    /// (while running) or the edit cursor (while stopped) is shown inverted.
    pub fn led_bits(&self) -> u8 {
        let cursor = if self.sequence.is_running() {
            self.sequence.current_index()
        } else {
            self.edit_index
        };

        self.sequence
            .steps()
            .iter()
            .take(MUX_CHANNELS)
            .enumerate()
            .fold(0u8, |bits, (index, step)| {
                let lit = step.is_playable() != (index == cursor);
                bits.set_flag(index as u32, lit)
            })
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn start(&mut self, now_ms: u64, out: &mut MidiBatch) {
        self.sequence.set_running(true);
        self.clock.restart(now_ms);
        self.ticks_on_step = 0;
        #[cfg(feature = "defmt")]
        defmt::info!("play from step {}", self.sequence.current_index());
        self.sound_current(out);
    }

    fn stop(&mut self, out: &mut MidiBatch) {
        self.sequence.set_running(false);
        self.release(out);
        #[cfg(feature = "defmt")]
        defmt::info!("stop at step {}", self.sequence.current_index());
    }

    /// Note-off for the held note, if any.
    fn release(&mut self, out: &mut MidiBatch) {
        if let Some(pitch) = self.sounding.take() {
            Self::emit(out, MidiMessage::note_off(self.config.midi_channel, pitch));
        }
    }

    /// Note-on for the step under the play cursor, if it is playable.
    fn sound_current(&mut self, out: &mut MidiBatch) {
        let step = *self.sequence.current();
        if !step.is_playable() {
            return;
        }

        let velocity = if step.flags.get(StepFlag::Accent) {
            step.velocity
                .saturating_add(self.config.accent_boost)
                .min(MIDI_DATA_MAX)
        } else {
            step.velocity
        };
        Self::emit(
            out,
            MidiMessage::note_on(self.config.midi_channel, step.pitch, velocity),
        );
        self.sounding = Some(step.pitch);
    }

    fn emit(out: &mut MidiBatch, message: MidiMessage) {
        if let Err(_dropped) = out.push(message) {
            #[cfg(feature = "defmt")]
            defmt::error!("MIDI batch full, dropped {}", _dropped);
        }
    }

    fn log_rejected(result: Result<(), SequenceError>) {
        if let Err(_e) = result {
            #[cfg(feature = "defmt")]
            defmt::warn!("step edit rejected: {}", _e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequencer::DEFAULT_PITCH;

    const PLAY: u8 = 1 << Switch::PlayStop.bit();
    const RESET: u8 = 1 << Switch::Reset.bit();
    const ENABLE: u8 = 1 << Switch::Enable.bit();
    const MUTE: u8 = 1 << Switch::Mute.bit();
    const ACCENT: u8 = 1 << Switch::Accent.bit();
    const EDIT_PREV: u8 = 1 << Switch::EditPrevious.bit();
    const EDIT_NEXT: u8 = 1 << Switch::EditNext.bit();

    /// One step per MIDI pulse (20.833 ms at 120 BPM), active-high switches.
    fn config() -> SequencerConfig {
        SequencerConfig {
            pulses_per_step: 1,
            switch_active_low: false,
            ..SequencerConfig::default()
        }
    }

    fn engine() -> Engine<8> {
        Engine::new(config())
    }

    /// Press and release `transport` switches at `now`.
    fn press(engine: &mut Engine<8>, transport: u8, now: u64) -> MidiBatch {
        let out = engine.apply_switches(transport, 0, now);
        let released = engine.apply_switches(0, 0, now);
        assert!(released.is_empty());
        out
    }

    fn bytes(batch: &MidiBatch) -> std::vec::Vec<[u8; 3]> {
        batch.iter().map(|m| m.to_bytes()).collect()
    }

    #[test]
    fn play_sounds_current_step() {
        let mut engine = engine();
        let out = press(&mut engine, PLAY, 0);
        assert!(engine.sequence().is_running());
        assert_eq!(bytes(&out), [[0x90, 48, 127]]);
        assert_eq!(engine.sounding_pitch(), Some(48));
    }

    #[test]
    fn advance_sends_note_off_then_note_on() {
        let mut engine = engine();
        engine.sequence_mut().set_pitch(0, 60).unwrap();
        engine.sequence_mut().set_pitch(1, 62).unwrap();
        engine.sequence_mut().set_velocity(1, 90).unwrap();
        press(&mut engine, PLAY, 0);

        let out = engine.on_clock(21);
        assert_eq!(bytes(&out), [[0x80, 60, 0], [0x90, 62, 90]]);
        assert_eq!(engine.sequence().current_index(), 1);
    }

    #[test]
    fn disabled_incoming_step_only_releases() {
        let mut engine = engine();
        engine
            .sequence_mut()
            .set_flag(1, StepFlag::Enabled, false)
            .unwrap();
        press(&mut engine, PLAY, 0);

        let out = engine.on_clock(21);
        assert_eq!(bytes(&out), [[0x80, 48, 0]]);
        assert_eq!(engine.sounding_pitch(), None);

        // Leaving the silent step still sends a note-off, using its pitch.
        let out = engine.on_clock(42);
        assert_eq!(bytes(&out), [[0x80, 48, 0], [0x90, 48, 127]]);
    }

    #[test]
    fn muted_incoming_step_only_releases() {
        let mut engine = engine();
        engine.sequence_mut().set_flag(1, StepFlag::Muted, true).unwrap();
        press(&mut engine, PLAY, 0);

        let out = engine.on_clock(21);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].to_bytes(), [0x80, 48, 0]);
    }

    #[test]
    fn note_off_uses_sounded_pitch_after_edit() {
        let mut engine = engine();
        press(&mut engine, PLAY, 0);
        engine.sequence_mut().set_pitch(0, 72).unwrap();

        let out = engine.on_clock(21);
        assert_eq!(out[0].to_bytes(), [0x80, 48, 0]);
    }

    #[test]
    fn stopped_sequence_ignores_clock() {
        let mut engine = engine();
        for now in 0..200 {
            assert!(engine.on_clock(now).is_empty());
        }
        assert_eq!(engine.sequence().current_index(), 0);
    }

    #[test]
    fn full_cycle_returns_to_first_step() {
        let mut engine = engine();
        press(&mut engine, PLAY, 0);
        let mut advances = 0;
        for now in 1..=167 {
            if !engine.on_clock(now).is_empty() {
                advances += 1;
            }
        }
        // 8 steps of 20.833 ms fit in 166.67 ms.
        assert_eq!(advances, 8);
        assert_eq!(engine.sequence().current_index(), 0);
    }

    #[test]
    fn step_length_holds_for_that_many_ticks() {
        let mut engine = engine();
        engine.sequence_mut().set_length(0, 3).unwrap();
        press(&mut engine, PLAY, 0);

        assert!(engine.on_clock(21).is_empty());
        assert!(engine.on_clock(42).is_empty());
        assert_eq!(engine.on_clock(63).len(), 2);
        assert_eq!(engine.sequence().current_index(), 1);
    }

    #[test]
    fn accent_boosts_velocity() {
        let mut engine = engine();
        engine.sequence_mut().set_velocity(0, 80).unwrap();
        engine.sequence_mut().set_flag(0, StepFlag::Accent, true).unwrap();
        let out = press(&mut engine, PLAY, 0);
        assert_eq!(out[0].data2, 112);

        press(&mut engine, PLAY, 0);
        engine.sequence_mut().set_velocity(0, 120).unwrap();
        let out = press(&mut engine, PLAY, 0);
        assert_eq!(out[0].data2, 127);
    }

    #[test]
    fn stop_releases_held_note() {
        let mut engine = engine();
        engine.sequence_mut().set_pitch(0, 55).unwrap();
        press(&mut engine, PLAY, 0);

        let out = press(&mut engine, PLAY, 10);
        assert_eq!(bytes(&out), [[0x80, 55, 0]]);
        assert!(!engine.sequence().is_running());
        assert_eq!(engine.sounding_pitch(), None);
    }

    #[test]
    fn reset_releases_rewinds_and_stops() {
        let mut engine = engine();
        press(&mut engine, PLAY, 0);
        engine.on_clock(21);
        engine.on_clock(42);
        assert_eq!(engine.sequence().current_index(), 2);

        let out = press(&mut engine, RESET, 50);
        assert_eq!(bytes(&out), [[0x80, 48, 0]]);
        assert_eq!(engine.sequence().current_index(), 0);
        assert!(!engine.sequence().is_running());
    }

    #[test]
    fn held_switch_acts_once() {
        let mut engine = engine();
        engine.apply_switches(PLAY, 0, 0);
        engine.apply_switches(PLAY, 0, 5);
        engine.apply_switches(PLAY, 0, 10);
        assert!(engine.sequence().is_running());
    }

    #[test]
    fn active_low_switches_are_inverted() {
        let mut engine: Engine<8> = Engine::new(SequencerConfig {
            pulses_per_step: 1,
            ..SequencerConfig::default()
        });
        // All lines high: nothing pressed.
        assert!(engine.apply_switches(0xFF, 0xFF, 0).is_empty());
        assert!(!engine.sequence().is_running());

        // Play line pulled low.
        let out = engine.apply_switches(!PLAY, 0xFF, 0);
        assert_eq!(out.len(), 1);
        assert!(engine.sequence().is_running());
    }

    #[test]
    fn flag_switches_toggle_edited_step() {
        let mut engine = engine();
        press(&mut engine, EDIT_NEXT, 0);
        press(&mut engine, EDIT_NEXT, 0);
        assert_eq!(engine.edit_index(), 2);

        press(&mut engine, MUTE | ACCENT, 0);
        press(&mut engine, ENABLE, 0);
        let step = engine.sequence().get(2).unwrap();
        assert!(step.flags.get(StepFlag::Muted));
        assert!(step.flags.get(StepFlag::Accent));
        assert!(!step.flags.get(StepFlag::Enabled));
        assert_eq!(engine.sequence().get(1), Some(&Default::default()));
    }

    #[test]
    fn edit_cursor_wraps_both_ways() {
        let mut engine = engine();
        press(&mut engine, EDIT_PREV, 0);
        assert_eq!(engine.edit_index(), 7);
        press(&mut engine, EDIT_NEXT, 0);
        assert_eq!(engine.edit_index(), 0);
    }

    #[test]
    fn step_button_moves_play_cursor_only_while_stopped() {
        let mut engine = engine();
        engine.apply_switches(0, 1 << 5, 0);
        assert_eq!(engine.edit_index(), 5);
        assert_eq!(engine.sequence().current_index(), 5);

        press(&mut engine, PLAY, 0);
        engine.apply_switches(0, 1 << 2, 0);
        assert_eq!(engine.edit_index(), 2);
        assert_eq!(engine.sequence().current_index(), 5);
    }

    #[test]
    fn pots_edit_the_selected_step_after_moving() {
        let mut engine = engine();
        engine.apply_switches(0, 1 << 3, 0);

        let mut raw = [0u16; MUX_CHANNELS];
        raw[Pot::Pitch.channel()] = 100;
        raw[Pot::Velocity.channel()] = 100;
        raw[Pot::Length.channel()] = 100;
        raw[Pot::Tempo.channel()] = 100;
        engine.apply_pots(&raw);
        // Baseline only.
        assert_eq!(engine.sequence().get(3), Some(&Default::default()));
        assert_eq!(engine.clock().bpm(), 120);

        raw[Pot::Pitch.channel()] = 1023;
        raw[Pot::Velocity.channel()] = 512;
        raw[Pot::Length.channel()] = 1023;
        raw[Pot::Tempo.channel()] = 0;
        engine.apply_pots(&raw);

        let step = engine.sequence().get(3).unwrap();
        assert_eq!(step.pitch, 127);
        assert_eq!(step.velocity, 64);
        assert_eq!(step.length, MAX_STEP_LENGTH);
        assert_eq!(engine.clock().bpm(), MIN_BPM);

        // Jitter inside the deadband changes nothing.
        raw[Pot::Pitch.channel()] = 1019;
        engine.apply_pots(&raw);
        assert_eq!(engine.sequence().get(3).unwrap().pitch, 127);
    }

    #[test]
    fn changing_edited_step_keeps_its_values_until_a_knob_turns() {
        let mut engine = engine();
        let mut raw = [0u16; MUX_CHANNELS];
        raw[Pot::Pitch.channel()] = 100;
        engine.apply_pots(&raw);
        raw[Pot::Pitch.channel()] = 1023;
        engine.apply_pots(&raw);
        assert_eq!(engine.sequence().get(0).unwrap().pitch, 127);

        press(&mut engine, EDIT_NEXT, 0);
        assert_eq!(engine.edit_index(), 1);

        // Same knob position on the new step: baseline only.
        engine.apply_pots(&raw);
        raw[Pot::Pitch.channel()] = 1020;
        engine.apply_pots(&raw);
        assert_eq!(engine.sequence().get(1).unwrap().pitch, DEFAULT_PITCH);

        raw[Pot::Pitch.channel()] = 0;
        engine.apply_pots(&raw);
        assert_eq!(engine.sequence().get(1).unwrap().pitch, 0);
        assert_eq!(engine.sequence().get(0).unwrap().pitch, 127);
    }

    #[test]
    fn reselecting_the_same_step_keeps_pot_baselines() {
        let mut engine = engine();
        let mut raw = [0u16; MUX_CHANNELS];
        engine.apply_pots(&raw);

        engine.apply_switches(0, 1, 0);
        assert_eq!(engine.edit_index(), 0);

        raw[Pot::Velocity.channel()] = 512;
        engine.apply_pots(&raw);
        assert_eq!(engine.sequence().get(0).unwrap().velocity, 64);
    }

    #[test]
    fn led_bits_show_playable_steps_and_cursor() {
        let mut engine = engine();
        engine.sequence_mut().set_flag(1, StepFlag::Muted, true).unwrap();
        engine.sequence_mut().set_flag(2, StepFlag::Enabled, false).unwrap();

        // Stopped: edit cursor on step 0 is inverted.
        assert_eq!(engine.led_bits(), 0b1111_1000);

        press(&mut engine, PLAY, 0);
        engine.on_clock(21);
        engine.on_clock(42);
        engine.on_clock(63);
        // Running: play cursor on step 3 is inverted.
        assert_eq!(engine.led_bits(), 0b1111_0001);
    }

    #[test]
    fn sixteen_step_engine_maps_leds_to_first_bank() {
        let mut engine: Engine<16> = Engine::new(config());
        engine.sequence_mut().jump_to(12).unwrap();
        engine.apply_switches(0, 0, 0);
        assert_eq!(engine.led_bits(), 0b1111_1110);
    }
}
