//! Shared 3-bit address bus.

use embedded_hal::digital::{Error as _, OutputPin, PinState};
use stepseq::sequencer::BitField;

use crate::address::MuxAddress;
use crate::error::MuxError;

/// The three address pins shared by one pair of multiplexer units.
///
/// Bit 0 of the address goes to the first pin, bit 1 to the second and
/// bit 2 to the third. Only pins whose bit differs from the last driven
/// address are written, which keeps the number of transient addresses seen
/// by the multiplexer during a change as small as possible.
///
/// `AddressBus` does not know about data lines; use it through
/// [`MuxPair`](crate::MuxPair), which parks the data lines first.
pub struct AddressBus<P> {
    pins: [P; 3],
    /// Address currently on the pins, `None` until the first successful
    /// drive or after a failed one.
    current: Option<MuxAddress>,
}

impl<P> AddressBus<P>
where
    P: OutputPin,
{
    /// Take ownership of the address pins, ordered bit 0 first.
    ///
    /// No pin is touched until the first [`drive()`](Self::drive).
    pub fn new(pins: [P; 3]) -> Self {
        Self {
            pins,
            current: None,
        }
    }

    pub fn current(&self) -> Option<MuxAddress> {
        self.current
    }

    /// Put `address` on the bus.
    ///
    /// # Errors
    /// [`MuxError::AddressPin`] if any pin fails. The bus is then treated as
    /// undefined and the next call rewrites all three pins.
    pub fn drive(&mut self, address: MuxAddress) -> Result<(), MuxError> {
        if self.current == Some(address) {
            return Ok(());
        }

        let previous = self.current.take();
        for (bit, pin) in self.pins.iter_mut().enumerate() {
            let bit = bit as u32;
            let high = address.bits().get_flag(bit);
            if previous.is_some_and(|p| p.bits().get_flag(bit) == high) {
                continue;
            }
            pin.set_state(PinState::from(high))
                .map_err(|e| MuxError::AddressPin(e.kind()))?;
        }

        self.current = Some(address);
        Ok(())
    }
}
