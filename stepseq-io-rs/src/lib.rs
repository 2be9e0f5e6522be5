//! Multiplexed I/O for the step sequencer.
//!
//! The front panel is wired through four 8-channel analog multiplexers
//! (CD4051-style). Each unit has one data line; the units are wired in
//! pairs that share a 3-pin address bus:
//!
//! ```text
//!            address bus A              address bus B
//!          ┌───────┴───────┐          ┌───────┴───────┐
//!       unit 1          unit 2     unit 3          unit 4
//!     pots (ADC)     LEDs (out)  switches (in)  step buttons (in)
//! ```
//!
//! # Architecture
//!
//! - **[`AddressBus`]**: owns the three address pins of one pair.
//! - **[`line`]**: data-line adapters over `embedded-hal` pins and the
//!   [`AnalogRead`] seam for the ADC.
//! - **[`MuxPair`]**: the two coupled units behind one bus. It is the only
//!   owner of the bus, so the units can never be addressed independently,
//!   and it parks both data lines before the address changes.
//! - **[`ScanLoop`]**: one control-loop iteration: scan, dispatch to the
//!   [`Engine`](stepseq::sequencer::Engine), send MIDI, refresh LEDs.
//!
//! Everything is blocking and single-threaded; the only waits are the fixed
//! settle and hold delays in [`MuxTiming`].
//!
//! # Features
//!
//! - **`defmt`**: [`defmt::Format`] on error types and logging of
//!   recovered I/O failures in the scan loop.

#![cfg_attr(not(test), no_std)]

pub use address::MuxAddress;
pub use bus::AddressBus;
pub use error::MuxError;
pub use line::{AnalogInput, AnalogRead, DataLine, DigitalInput, DigitalOutput, ReadLine, WriteLine};
pub use pair::{MuxPair, MuxTiming};
pub use scan::{MidiOut, ScanConfig, ScanLoop};

mod address;
mod bus;
mod error;
pub mod line;
mod pair;
mod scan;

#[cfg(test)]
mod sim;
