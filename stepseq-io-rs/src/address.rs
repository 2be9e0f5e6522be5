use stepseq::sequencer::MUX_CHANNELS;

/// Channel address on one multiplexer unit, `0..=7`.
///
/// # Examples
///
/// ```
/// use stepseq_io::MuxAddress;
///
/// assert_eq!(MuxAddress::new(5).map(|a| a.index()), Some(5));
/// assert!(MuxAddress::new(8).is_none());
/// assert_eq!(MuxAddress::all().count(), 8);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MuxAddress(u8);

impl MuxAddress {
    /// Returns `None` if `channel >= 8`.
    pub const fn new(channel: u8) -> Option<Self> {
        if (channel as usize) < MUX_CHANNELS {
            Some(Self(channel))
        } else {
            None
        }
    }

    /// Every channel in ascending order.
    pub fn all() -> impl Iterator<Item = MuxAddress> {
        (0..MUX_CHANNELS as u8).map(MuxAddress)
    }

    /// The 3-bit value put on the address pins.
    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}
