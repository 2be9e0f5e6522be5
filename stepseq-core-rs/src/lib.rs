//! Hardware-independent core of the step sequencer.
//!
//! See [`sequencer`] for the step model, tempo clock and dispatch engine.

#![cfg_attr(not(test), no_std)]

pub mod sequencer;
