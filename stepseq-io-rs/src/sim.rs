//! Simulated multiplexer pair for host tests.
//!
//! All pins of one pair share a [`SimBus`]. The address pins set the
//! selected channel; the output unit behaves like a sample-and-hold: a
//! channel only takes the output level once that level has been held for
//! the write-hold delay (`delay_us`). Parking and address settling use
//! `delay_ns` and never latch. Every pin action is appended to an event
//! log so tests can check ordering.

use std::cell::RefCell;
use std::convert::Infallible;
use std::rc::Rc;
use std::vec::Vec;

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{self, ErrorType, InputPin, OutputPin};

use crate::line::AnalogRead;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Address { pin: usize, high: bool },
    Output { high: bool },
    Settle,
    Hold,
}

#[derive(Debug, Default)]
pub struct SimBus {
    pub address: [bool; 3],
    pub output_level: bool,
    /// Levels held by each output channel.
    pub latched: [bool; 8],
    /// Raw ADC reading per analog channel.
    pub analog: [u16; 8],
    /// Levels per channel of the two input units.
    pub inputs: [[bool; 8]; 2],
    /// Digital inputs read back the output unit's latched channels.
    pub loopback: bool,
    /// Address pins fail while set.
    pub fail_address: bool,
    pub events: Vec<Event>,
}

impl SimBus {
    pub fn channel(&self) -> usize {
        self.address
            .iter()
            .enumerate()
            .fold(0, |acc, (bit, &high)| acc | (usize::from(high) << bit))
    }
}

pub type Shared = Rc<RefCell<SimBus>>;

pub fn bus() -> Shared {
    Rc::new(RefCell::new(SimBus::default()))
}

#[derive(Debug)]
pub struct SimError;

impl digital::Error for SimError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

// ── Address pins ─────────────────────────────────────────────────────────

pub struct SimAddressPin {
    bus: Shared,
    pin: usize,
}

pub fn address_pins(bus: &Shared) -> [SimAddressPin; 3] {
    core::array::from_fn(|pin| SimAddressPin {
        bus: bus.clone(),
        pin,
    })
}

impl SimAddressPin {
    fn set(&mut self, high: bool) -> Result<(), SimError> {
        let mut bus = self.bus.borrow_mut();
        if bus.fail_address {
            return Err(SimError);
        }
        bus.address[self.pin] = high;
        bus.events.push(Event::Address {
            pin: self.pin,
            high,
        });
        Ok(())
    }
}

impl ErrorType for SimAddressPin {
    type Error = SimError;
}

impl OutputPin for SimAddressPin {
    fn set_low(&mut self) -> Result<(), SimError> {
        self.set(false)
    }

    fn set_high(&mut self) -> Result<(), SimError> {
        self.set(true)
    }
}

// ── Data lines ───────────────────────────────────────────────────────────

pub struct SimOutput(pub Shared);

impl ErrorType for SimOutput {
    type Error = Infallible;
}

impl OutputPin for SimOutput {
    fn set_low(&mut self) -> Result<(), Infallible> {
        let mut bus = self.0.borrow_mut();
        bus.output_level = false;
        bus.events.push(Event::Output { high: false });
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        let mut bus = self.0.borrow_mut();
        bus.output_level = true;
        bus.events.push(Event::Output { high: true });
        Ok(())
    }
}

/// Digital input of unit `0` or `1` of the pair.
pub struct SimInput(pub Shared, pub usize);

impl ErrorType for SimInput {
    type Error = Infallible;
}

impl InputPin for SimInput {
    fn is_high(&mut self) -> Result<bool, Infallible> {
        let bus = self.0.borrow();
        let channel = bus.channel();
        Ok(if bus.loopback {
            bus.latched[channel]
        } else {
            bus.inputs[self.1][channel]
        })
    }

    fn is_low(&mut self) -> Result<bool, Infallible> {
        self.is_high().map(|high| !high)
    }
}

pub struct SimAnalog(pub Shared);

impl AnalogRead for SimAnalog {
    type Error = Infallible;

    fn read_raw(&mut self) -> Result<u16, Infallible> {
        let bus = self.0.borrow();
        Ok(bus.analog[bus.channel()])
    }
}

// ── Delay ────────────────────────────────────────────────────────────────

pub struct SimDelay(pub Shared);

impl DelayNs for SimDelay {
    fn delay_ns(&mut self, _ns: u32) {
        self.0.borrow_mut().events.push(Event::Settle);
    }

    fn delay_us(&mut self, _us: u32) {
        let mut bus = self.0.borrow_mut();
        let channel = bus.channel();
        bus.latched[channel] = bus.output_level;
        bus.events.push(Event::Hold);
    }
}
