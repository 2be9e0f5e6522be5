//! Data-line adapters.
//!
//! Each multiplexer unit has one data line. What sits on it differs per
//! unit (an ADC input, a push-pull output, a digital input), so the pair
//! driver is generic over these traits instead of over raw pins.

use embedded_hal::digital::{Error as _, InputPin, OutputPin, PinState};
use stepseq::sequencer::ADC_MAX;

use crate::error::MuxError;

/// A multiplexer data line.
pub trait DataLine {
    /// Put the line into its inactive state so nothing is latched while the
    /// address pins change.
    fn park(&mut self) -> Result<(), MuxError>;
}

/// A data line that can be sampled.
pub trait ReadLine: DataLine {
    type Value: Copy + Default;

    fn sample(&mut self) -> Result<Self::Value, MuxError>;
}

/// A data line that can be driven.
pub trait WriteLine: DataLine {
    fn drive(&mut self, high: bool) -> Result<(), MuxError>;
}

/// Minimal ADC seam: one conversion on a fixed input.
///
/// Implementations return a 10-bit reading, `0..=1023`. Boards with a wider
/// converter shift down before returning.
pub trait AnalogRead {
    type Error;

    fn read_raw(&mut self) -> Result<u16, Self::Error>;
}

// ── Digital input ────────────────────────────────────────────────────────

/// Digital input data line (switch banks).
pub struct DigitalInput<P>(P);

impl<P: InputPin> DigitalInput<P> {
    pub fn new(pin: P) -> Self {
        Self(pin)
    }
}

impl<P: InputPin> DataLine for DigitalInput<P> {
    fn park(&mut self) -> Result<(), MuxError> {
        // An input has nothing to latch.
        Ok(())
    }
}

impl<P: InputPin> ReadLine for DigitalInput<P> {
    type Value = bool;

    fn sample(&mut self) -> Result<bool, MuxError> {
        self.0.is_high().map_err(|e| MuxError::DataPin(e.kind()))
    }
}

// ── Digital output ───────────────────────────────────────────────────────

/// Push-pull output data line (LED banks). Parks low.
pub struct DigitalOutput<P>(P);

impl<P: OutputPin> DigitalOutput<P> {
    pub fn new(pin: P) -> Self {
        Self(pin)
    }
}

impl<P: OutputPin> DataLine for DigitalOutput<P> {
    fn park(&mut self) -> Result<(), MuxError> {
        self.drive(false)
    }
}

impl<P: OutputPin> WriteLine for DigitalOutput<P> {
    fn drive(&mut self, high: bool) -> Result<(), MuxError> {
        self.0
            .set_state(PinState::from(high))
            .map_err(|e| MuxError::DataPin(e.kind()))
    }
}

// ── Analog input ─────────────────────────────────────────────────────────

/// Analog input data line (potentiometer banks).
pub struct AnalogInput<A>(A);

impl<A: AnalogRead> AnalogInput<A> {
    pub fn new(adc: A) -> Self {
        Self(adc)
    }
}

impl<A: AnalogRead> DataLine for AnalogInput<A> {
    fn park(&mut self) -> Result<(), MuxError> {
        Ok(())
    }
}

impl<A: AnalogRead> ReadLine for AnalogInput<A> {
    type Value = u16;

    fn sample(&mut self) -> Result<u16, MuxError> {
        let raw = self.0.read_raw().map_err(|_| MuxError::Adc)?;
        Ok(raw.min(ADC_MAX))
    }
}
