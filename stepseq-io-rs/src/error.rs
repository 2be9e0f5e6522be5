//! Error types for the multiplexer driver.

use core::fmt;

use embedded_hal::digital::ErrorKind;

/// Errors that can occur while driving a multiplexer pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MuxError {
    /// An address pin could not be driven. The bus state is unknown until
    /// the next successful select.
    AddressPin(ErrorKind),

    /// A digital data line could not be read or driven.
    DataPin(ErrorKind),

    /// The ADC behind an analog data line failed to convert.
    Adc,
}

impl fmt::Display for MuxError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MuxError::AddressPin(kind) => write!(f, "Address pin error: {}", kind),
            MuxError::DataPin(kind) => write!(f, "Data pin error: {}", kind),
            MuxError::Adc => write!(f, "ADC conversion failed"),
        }
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for MuxError {
    fn format(&self, f: defmt::Formatter) {
        match self {
            MuxError::AddressPin(_) => defmt::write!(f, "Address pin error"),
            MuxError::DataPin(_) => defmt::write!(f, "Data pin error"),
            MuxError::Adc => defmt::write!(f, "ADC conversion failed"),
        }
    }
}
