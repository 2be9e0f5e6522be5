use super::{DEFAULT_BPM, MAX_BPM, MIN_BPM, PULSES_PER_QUARTER_NOTE};

/// Microseconds in one minute.
const MICROS_PER_MINUTE: u64 = 60_000_000;

/// Fixed-interval step clock derived from a tempo.
///
/// The clock is polled with a monotonic millisecond timestamp. Each time at
/// least one step interval has elapsed, [`tick()`](Self::tick) returns
/// `true` once. Step boundaries are computed exactly from the number of
/// whole steps since the anchor set by [`restart()`](Self::restart), so the
/// fractional part of the interval (20.833 ms per pulse at 120 BPM) never
/// accumulates as drift. After a stall longer than one interval, the missed
/// ticks are skipped rather than fired in a burst.
///
/// # Examples
///
/// ```
/// use stepseq::sequencer::TempoClock;
///
/// let mut clock = TempoClock::new(120);
/// clock.restart(0);
/// assert!(!clock.tick(20));
/// assert!(clock.tick(21));
/// assert!(!clock.tick(22));
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TempoClock {
    bpm: u16,
    pulses_per_step: u16,
    interval_ms: f32,
    /// Time of step boundary 0, in microseconds.
    anchor_us: u64,
    /// Whole steps elapsed between the anchor and the last tick.
    steps: u64,
}

impl Default for TempoClock {
    fn default() -> Self {
        Self::new(DEFAULT_BPM)
    }
}

impl TempoClock {
    /// Clock advancing one step per MIDI clock pulse.
    pub fn new(bpm: u16) -> Self {
        Self::with_pulses_per_step(bpm, 1)
    }

    /// Clock advancing one step every `pulses_per_step` MIDI clock pulses
    /// (6 gives sixteenth notes). Zero is treated as 1.
    pub fn with_pulses_per_step(bpm: u16, pulses_per_step: u16) -> Self {
        let mut clock = Self {
            bpm: DEFAULT_BPM,
            pulses_per_step: pulses_per_step.max(1),
            interval_ms: 0.0,
            anchor_us: 0,
            steps: 0,
        };
        clock.set_bpm(bpm);
        clock
    }

    /// Current tempo in beats per minute.
    pub fn bpm(&self) -> u16 {
        self.bpm
    }

    /// MIDI clock pulses per step.
    pub fn pulses_per_step(&self) -> u16 {
        self.pulses_per_step
    }

    /// Set the tempo, clamped to `MIN_BPM..=MAX_BPM`, and recompute the
    /// cached interval.
    ///
    /// The clock is re-anchored on the last step boundary, so the next tick
    /// comes one new interval after it.
    pub fn set_bpm(&mut self, bpm: u16) {
        self.anchor_us = self.boundary_us(self.steps);
        self.steps = 0;

        self.bpm = bpm.clamp(MIN_BPM, MAX_BPM);
        let bpm = self.bpm as f32;
        self.interval_ms = 1000.0 / ((bpm / 60.0) * PULSES_PER_QUARTER_NOTE as f32);
    }

    /// Duration of one MIDI clock pulse in milliseconds.
    pub fn interval_ms(&self) -> f32 {
        self.interval_ms
    }

    /// Duration of one step in whole microseconds, rounded down.
    pub fn step_interval_us(&self) -> u64 {
        self.step_numerator() / self.step_denominator()
    }

    /// Re-anchor the clock so the next tick is one full step after `now_ms`.
    pub fn restart(&mut self, now_ms: u64) {
        self.anchor_us = now_ms.saturating_mul(1000);
        self.steps = 0;
    }

    /// Returns `true` if a step boundary has passed since the last tick.
    pub fn tick(&mut self, now_ms: u64) -> bool {
        let elapsed = now_ms.saturating_mul(1000).saturating_sub(self.anchor_us);
        let steps = elapsed.saturating_mul(self.step_denominator()) / self.step_numerator();
        if steps <= self.steps {
            return false;
        }

        self.steps = steps;
        true
    }

    // ── Private helpers ──────────────────────────────────────────────

    /// One step lasts `step_numerator / step_denominator` microseconds.
    fn step_numerator(&self) -> u64 {
        MICROS_PER_MINUTE * u64::from(self.pulses_per_step)
    }

    fn step_denominator(&self) -> u64 {
        u64::from(self.bpm) * u64::from(PULSES_PER_QUARTER_NOTE)
    }

    /// Time of step boundary `steps`, in microseconds.
    fn boundary_us(&self, steps: u64) -> u64 {
        let offset = steps.saturating_mul(self.step_numerator()) / self.step_denominator();
        self.anchor_us.saturating_add(offset)
    }
}
