use super::bits::BitField;
use super::{DEFAULT_LENGTH, DEFAULT_PITCH, DEFAULT_VELOCITY, MAX_STEP_LENGTH, MIDI_DATA_MAX};

/// Named bits of [`StepFlags`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum StepFlag {
    /// The step produces a note when reached.
    Enabled = 0,
    /// The step is silenced without losing its enabled state.
    Muted = 1,
    /// The step plays with boosted velocity.
    Accent = 2,
}

impl StepFlag {
    /// Bit position inside [`StepFlags`].
    pub const fn bit(self) -> u32 {
        self as u32
    }
}

/// Packed boolean state of one step.
///
/// Only the bits named by [`StepFlag`] are ever set; undefined bits always
/// read as 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepFlags(u8);

impl StepFlags {
    /// Mask of all defined flag bits.
    pub const MASK: u8 = 0b0000_0111;

    /// Builds flags from raw bits, dropping undefined bits.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & Self::MASK)
    }

    /// Raw packed bits.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns the state of `flag`.
    pub fn get(self, flag: StepFlag) -> bool {
        self.0.get_flag(flag.bit())
    }

    /// Set `flag` to `value`, leaving the other flags unchanged.
    pub fn set(&mut self, flag: StepFlag, value: bool) {
        self.0 = self.0.set_flag(flag.bit(), value);
    }

    /// Invert `flag`.
    pub fn toggle(&mut self, flag: StepFlag) {
        let current = self.get(flag);
        self.set(flag, !current);
    }
}

/// Note state for one sequence step.
///
/// All fields stay inside their MIDI ranges: setters and [`unpack`](Self::unpack)
/// clamp instead of failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepRecord {
    /// Duration in sequencer ticks, `1..=MAX_STEP_LENGTH`.
    pub length: u8,
    /// MIDI note number, `0..=127`.
    pub pitch: u8,
    /// MIDI velocity, `0..=127`.
    pub velocity: u8,
    pub flags: StepFlags,
}

impl Default for StepRecord {
    fn default() -> Self {
        let mut flags = StepFlags::default();
        flags.set(StepFlag::Enabled, true);
        Self {
            length: DEFAULT_LENGTH,
            pitch: DEFAULT_PITCH,
            velocity: DEFAULT_VELOCITY,
            flags,
        }
    }
}

impl StepRecord {
    /// Set the length in ticks, clamped to `1..=MAX_STEP_LENGTH`.
    pub fn set_length(&mut self, length: u8) {
        self.length = length.clamp(1, MAX_STEP_LENGTH);
    }

    /// Set the MIDI note number, clamped to `0..=127`.
    pub fn set_pitch(&mut self, pitch: u8) {
        self.pitch = pitch.min(MIDI_DATA_MAX);
    }

    /// Set the MIDI velocity, clamped to `0..=127`.
    pub fn set_velocity(&mut self, velocity: u8) {
        self.velocity = velocity.min(MIDI_DATA_MAX);
    }

    /// `true` when reaching this step should produce a note-on.
    pub fn is_playable(&self) -> bool {
        self.flags.get(StepFlag::Enabled) && !self.flags.get(StepFlag::Muted)
    }

    /// Pack into one word: pitch in bits 0-7, velocity 8-15, length 16-23,
    /// flags 24-31.
    ///
    /// # Examples
    ///
    /// ```
    /// use stepseq::sequencer::StepRecord;
    ///
    /// let step = StepRecord::default();
    /// assert_eq!(StepRecord::unpack(step.pack()), step);
    /// ```
    pub fn pack(&self) -> u32 {
        u32::from(self.pitch)
            | u32::from(self.velocity) << 8
            | u32::from(self.length) << 16
            | u32::from(self.flags.bits()) << 24
    }

    /// Inverse of [`pack`](Self::pack). Out-of-range fields are clamped and
    /// undefined flag bits dropped.
    pub fn unpack(word: u32) -> Self {
        let [pitch, velocity, length, flags] = word.to_le_bytes();
        let mut step = Self {
            flags: StepFlags::from_bits(flags),
            ..Self::default()
        };
        step.set_pitch(pitch);
        step.set_velocity(velocity);
        step.set_length(length);
        step
    }
}
