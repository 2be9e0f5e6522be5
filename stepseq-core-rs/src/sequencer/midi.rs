use super::MIDI_DATA_MAX;

/// Status nibble of a note-off message.
const NOTE_OFF: u8 = 0x80;
/// Status nibble of a note-on message.
const NOTE_ON: u8 = 0x90;

/// Messages produced by one engine call. Capacity covers the worst case of a
/// note-off followed by a note-on.
pub type MidiBatch = heapless::Vec<MidiMessage, 2>;

/// A three-byte MIDI channel voice message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MidiMessage {
    pub status: u8,
    pub data1: u8,
    pub data2: u8,
}

impl MidiMessage {
    /// Note-on on `channel` (0-15). Data bytes are clamped to 7 bits.
    ///
    /// # Examples
    ///
    /// ```
    /// use stepseq::sequencer::MidiMessage;
    ///
    /// assert_eq!(MidiMessage::note_on(0, 60, 100).to_bytes(), [0x90, 60, 100]);
    /// assert_eq!(MidiMessage::note_off(2, 60).to_bytes(), [0x82, 60, 0]);
    /// ```
    pub fn note_on(channel: u8, pitch: u8, velocity: u8) -> Self {
        Self {
            status: NOTE_ON | (channel & 0x0F),
            data1: pitch.min(MIDI_DATA_MAX),
            data2: velocity.min(MIDI_DATA_MAX),
        }
    }

    /// Note-off on `channel` (0-15) with release velocity 0.
    pub fn note_off(channel: u8, pitch: u8) -> Self {
        Self {
            status: NOTE_OFF | (channel & 0x0F),
            data1: pitch.min(MIDI_DATA_MAX),
            data2: 0,
        }
    }

    /// Wire bytes in transmission order.
    pub fn to_bytes(&self) -> [u8; 3] {
        [self.status, self.data1, self.data2]
    }
}
