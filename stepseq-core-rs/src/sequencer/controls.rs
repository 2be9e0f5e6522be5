//! Mapping of physical controls onto multiplexer channels, plus the small
//! amount of state needed to turn raw scans into edits.

use super::{ADC_MAX, MUX_CHANNELS};

/// Potentiometers on the analog multiplexer, by channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Pot {
    Pitch = 0,
    Velocity = 1,
    Length = 2,
    Tempo = 3,
}

impl Pot {
    pub const ALL: [Pot; 4] = [Pot::Pitch, Pot::Velocity, Pot::Length, Pot::Tempo];

    pub const fn channel(self) -> usize {
        self as usize
    }
}

/// Switches on the control multiplexer, by channel. Channel 7 is unused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Switch {
    PlayStop = 0,
    Reset = 1,
    Enable = 2,
    Mute = 3,
    Accent = 4,
    EditPrevious = 5,
    EditNext = 6,
}

impl Switch {
    pub const ALL: [Switch; 7] = [
        Switch::PlayStop,
        Switch::Reset,
        Switch::Enable,
        Switch::Mute,
        Switch::Accent,
        Switch::EditPrevious,
        Switch::EditNext,
    ];

    pub const fn bit(self) -> u32 {
        self as u32
    }
}

/// Map a raw 10-bit reading onto `min..=max` in equal-width bands.
///
/// Readings above [`ADC_MAX`] are treated as full scale.
///
/// # Examples
///
/// ```
/// use stepseq::sequencer::rescale;
///
/// assert_eq!(rescale(0, 0, 127), 0);
/// assert_eq!(rescale(512, 0, 127), 64);
/// assert_eq!(rescale(1023, 20, 300), 300);
/// ```
pub fn rescale(raw: u16, min: u16, max: u16) -> u16 {
    if max <= min {
        return min;
    }
    let raw = u32::from(raw.min(ADC_MAX));
    let span = u32::from(max - min) + 1;
    let scaled = raw * span / (u32::from(ADC_MAX) + 1);
    (u32::from(min) + scaled).min(u32::from(max)) as u16
}

/// Change detector for one bank of potentiometers.
///
/// A reading is reported only when it differs from the last reported one by
/// more than the deadband. The first reading of each channel only sets the
/// baseline, so switching the edited step does not overwrite it with
/// whatever the knobs happen to point at.
#[derive(Debug, Clone)]
pub struct PotBank {
    last: [Option<u16>; MUX_CHANNELS],
    deadband: u16,
}

impl PotBank {
    /// Bank with no baselines, reporting moves larger than `deadband`.
    pub fn new(deadband: u16) -> Self {
        Self {
            last: [None; MUX_CHANNELS],
            deadband,
        }
    }

    /// Returns `Some(raw)` if `channel` moved past the deadband.
    ///
    /// Channels outside the bank are ignored.
    pub fn moved(&mut self, channel: usize, raw: u16) -> Option<u16> {
        let last = self.last.get_mut(channel)?;
        match *last {
            Some(previous) if previous.abs_diff(raw) <= self.deadband => None,
            Some(_) => {
                *last = Some(raw);
                Some(raw)
            }
            None => {
                *last = Some(raw);
                None
            }
        }
    }

    /// Drop all baselines; the next scan re-captures them. Called when the
    /// edited step changes.
    pub fn rebase(&mut self) {
        self.last = [None; MUX_CHANNELS];
    }
}

/// Press-edge detector for one bank of up to 8 switches.
///
/// Levels are packed one switch per bit, `1` meaning pressed.
#[derive(Debug, Clone, Copy, Default)]
pub struct SwitchBank {
    levels: u8,
}

impl SwitchBank {
    /// Record new levels and return the switches that went from released to
    /// pressed since the previous call.
    pub fn pressed(&mut self, levels: u8) -> u8 {
        let edges = levels & !self.levels;
        self.levels = levels;
        edges
    }
}
