use super::DEFAULT_BPM;

/// Runtime configuration of the sequencer engine.
///
/// Built once at startup and handed to [`Engine::new()`](super::Engine::new).
/// [`SequencerConfig::default()`] matches the reference hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SequencerConfig {
    /// MIDI channel (0-15) for all note messages. Default: 0.
    pub midi_channel: u8,
    /// Tempo until the tempo control is moved. Default: 120.
    pub initial_bpm: u16,
    /// MIDI clock pulses per sequencer tick. Default: 6 (sixteenth notes).
    pub pulses_per_step: u16,
    /// Raw ADC counts a potentiometer must move before it is applied.
    /// Default: 8.
    pub pot_deadband: u16,
    /// Velocity added to accented steps, saturating at 127. Default: 32.
    pub accent_boost: u8,
    /// Switches pull their line low when pressed. Default: `true`.
    pub switch_active_low: bool,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        Self {
            midi_channel: 0,
            initial_bpm: DEFAULT_BPM,
            pulses_per_step: 6,
            pot_deadband: 8,
            accent_boost: 32,
            switch_active_low: true,
        }
    }
}
