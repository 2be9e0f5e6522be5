//! Two multiplexer units on one address bus.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use stepseq::sequencer::{BitField, MUX_CHANNELS};

use crate::address::MuxAddress;
use crate::bus::AddressBus;
use crate::error::MuxError;
use crate::line::{DataLine, ReadLine, WriteLine};

/// Multiplexer timing, validated against the part's propagation delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MuxTiming {
    /// Wait after the address pins change before the data line is used.
    /// Default: 5000 ns (covers CD4051 switching plus ADC input settling).
    pub address_settle_ns: u32,
    /// How long a written level is held on the selected channel.
    /// Default: 100 µs.
    pub write_hold_us: u32,
}

impl Default for MuxTiming {
    fn default() -> Self {
        Self {
            address_settle_ns: 5_000,
            write_hold_us: 100,
        }
    }
}

/// Two coupled multiplexer units sharing one [`AddressBus`].
///
/// Unit `a` and unit `b` each own a data line. Because the pair owns the
/// bus, selecting a channel always selects it on both units; there is no
/// way to address one unit of the pair independently.
///
/// # Bus discipline
///
/// [`select()`](Self::select) follows a fixed order:
///
/// 1. park both data lines (outputs go low, inputs are left alone),
/// 2. drive the address pins,
/// 3. wait [`MuxTiming::address_settle_ns`].
///
/// Data is only sampled or driven after step 3, so a line is never active
/// while the address passes through an unintended channel.
///
/// # Example
///
/// ```no_run
/// use stepseq_io::{AnalogInput, DigitalOutput, MuxAddress, MuxPair, MuxTiming};
///
/// # fn example<P, L, A, D>(pins: [P; 3], led: L, adc: A, delay: D)
/// # where
/// #     P: embedded_hal::digital::OutputPin,
/// #     L: embedded_hal::digital::OutputPin,
/// #     A: stepseq_io::AnalogRead,
/// #     D: embedded_hal::delay::DelayNs,
/// # {
/// let mut panel = MuxPair::new(
///     pins,
///     AnalogInput::new(adc),
///     DigitalOutput::new(led),
///     delay,
///     MuxTiming::default(),
/// );
///
/// let pots = panel.read_bank_a().unwrap();
/// panel.write_b(MuxAddress::new(3).unwrap(), true).unwrap();
/// # }
/// ```
pub struct MuxPair<P, A, B, D> {
    bus: AddressBus<P>,
    a: A,
    b: B,
    delay: D,
    timing: MuxTiming,
}

impl<P, A, B, D> MuxPair<P, A, B, D>
where
    P: OutputPin,
    A: DataLine,
    B: DataLine,
    D: DelayNs,
{
    /// Build a pair from its address pins (bit 0 first), both data lines,
    /// a delay provider and the bus timing.
    ///
    /// No pin is touched until the first select.
    pub fn new(address_pins: [P; 3], a: A, b: B, delay: D, timing: MuxTiming) -> Self {
        Self {
            bus: AddressBus::new(address_pins),
            a,
            b,
            delay,
            timing,
        }
    }

    pub fn timing(&self) -> &MuxTiming {
        &self.timing
    }

    /// Address currently selected on both units.
    pub fn selected(&self) -> Option<MuxAddress> {
        self.bus.current()
    }

    /// Select `address` on both units, parking the data lines first.
    pub fn select(&mut self, address: MuxAddress) -> Result<(), MuxError> {
        self.a.park()?;
        self.b.park()?;
        self.bus.drive(address)?;
        self.delay.delay_ns(self.timing.address_settle_ns);
        Ok(())
    }

    fn hold(&mut self) {
        self.delay.delay_us(self.timing.write_hold_us);
    }
}

// ── Unit A ───────────────────────────────────────────────────────────────

impl<P, A, B, D> MuxPair<P, A, B, D>
where
    P: OutputPin,
    A: ReadLine,
    B: DataLine,
    D: DelayNs,
{
    /// Select `address` and sample unit A.
    pub fn read_a(&mut self, address: MuxAddress) -> Result<A::Value, MuxError> {
        self.select(address)?;
        self.a.sample()
    }

    /// Sample all 8 channels of unit A.
    ///
    /// # Errors
    /// Returns the first error; no partial bank is returned.
    pub fn read_bank_a(&mut self) -> Result<[A::Value; MUX_CHANNELS], MuxError> {
        let mut values = [A::Value::default(); MUX_CHANNELS];
        for address in MuxAddress::all() {
            values[address.index()] = self.read_a(address)?;
        }
        Ok(values)
    }
}

impl<P, A, B, D> MuxPair<P, A, B, D>
where
    P: OutputPin,
    A: WriteLine,
    B: DataLine,
    D: DelayNs,
{
    /// Select `address`, drive unit A to `high` and hold it.
    pub fn write_a(&mut self, address: MuxAddress, high: bool) -> Result<(), MuxError> {
        self.select(address)?;
        self.a.drive(high)?;
        self.hold();
        Ok(())
    }

    /// Write bit `n` of `bits` to channel `n` of unit A.
    pub fn write_bank_a(&mut self, bits: u8) -> Result<(), MuxError> {
        for address in MuxAddress::all() {
            self.write_a(address, bits.get_flag(address.index() as u32))?;
        }
        Ok(())
    }
}

// ── Unit B ───────────────────────────────────────────────────────────────

impl<P, A, B, D> MuxPair<P, A, B, D>
where
    P: OutputPin,
    A: DataLine,
    B: ReadLine,
    D: DelayNs,
{
    /// Select `address` and sample unit B.
    pub fn read_b(&mut self, address: MuxAddress) -> Result<B::Value, MuxError> {
        self.select(address)?;
        self.b.sample()
    }

    /// Sample all 8 channels of unit B.
    pub fn read_bank_b(&mut self) -> Result<[B::Value; MUX_CHANNELS], MuxError> {
        let mut values = [B::Value::default(); MUX_CHANNELS];
        for address in MuxAddress::all() {
            values[address.index()] = self.read_b(address)?;
        }
        Ok(values)
    }
}

impl<P, A, B, D> MuxPair<P, A, B, D>
where
    P: OutputPin,
    A: DataLine,
    B: WriteLine,
    D: DelayNs,
{
    /// Select `address`, drive unit B to `high` and hold it.
    pub fn write_b(&mut self, address: MuxAddress, high: bool) -> Result<(), MuxError> {
        self.select(address)?;
        self.b.drive(high)?;
        self.hold();
        Ok(())
    }

    /// Write bit `n` of `bits` to channel `n` of unit B.
    pub fn write_bank_b(&mut self, bits: u8) -> Result<(), MuxError> {
        for address in MuxAddress::all() {
            self.write_b(address, bits.get_flag(address.index() as u32))?;
        }
        Ok(())
    }
}
