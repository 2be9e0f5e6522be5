use super::error::SequenceError;
use super::step::{StepFlag, StepRecord};

/// Fixed-size ring of steps with a play cursor.
///
/// `N` is the number of physical step controls. `current_index` is always
/// in `0..N`; [`advance()`](Self::advance) wraps it.
///
/// # Examples
///
/// ```
/// use stepseq::sequencer::Sequence;
///
/// let mut seq: Sequence<4> = Sequence::new();
/// assert_eq!(seq.advance(), (0, 1));
/// seq.advance();
/// seq.advance();
/// assert_eq!(seq.advance(), (3, 0));
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Sequence<const N: usize> {
    steps: [StepRecord; N],
    current_index: usize,
    running: bool,
}

impl<const N: usize> Default for Sequence<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> Sequence<N> {
    const NON_EMPTY: () = assert!(N > 0, "a sequence needs at least one step");

    /// All steps at their defaults, cursor on step 0, stopped.
    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::NON_EMPTY;
        Self {
            steps: [StepRecord::default(); N],
            current_index: 0,
            running: false,
        }
    }

    /// Number of steps, `N`.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Index of the step under the play cursor, always in `0..N`.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Returns `true` while the sequence is playing.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Start or stop playback without moving the cursor.
    pub fn set_running(&mut self, running: bool) {
        self.running = running;
    }

    /// Move the cursor one step forward, wrapping at `N`.
    ///
    /// Returns `(previous_index, new_index)` so the caller can release the
    /// outgoing note before starting the incoming one.
    pub fn advance(&mut self) -> (usize, usize) {
        let previous = self.current_index;
        self.current_index = (previous + 1) % N;
        (previous, self.current_index)
    }

    /// Put the cursor on `index` without touching `running`.
    ///
    /// Returns [`SequenceError::InvalidStepIndex`] if `index >= N`.
    pub fn jump_to(&mut self, index: usize) -> Result<(), SequenceError> {
        Self::check(index)?;
        self.current_index = index;
        Ok(())
    }

    /// Cursor back to step 0 and stop.
    pub fn reset(&mut self) {
        self.current_index = 0;
        self.running = false;
    }

    /// Returns the step at `index`, or `None` if `index >= N`.
    pub fn get(&self, index: usize) -> Option<&StepRecord> {
        self.steps.get(index)
    }

    /// The step under the cursor.
    pub fn current(&self) -> &StepRecord {
        &self.steps[self.current_index]
    }

    /// All steps in play order.
    pub fn steps(&self) -> &[StepRecord; N] {
        &self.steps
    }

    // ── Step mutation ────────────────────────────────────────────────

    /// Set the length of step `index`, clamped to `1..=MAX_STEP_LENGTH`.
    ///
    /// Returns [`SequenceError::InvalidStepIndex`] if `index >= N`.
    pub fn set_length(&mut self, index: usize, length: u8) -> Result<(), SequenceError> {
        self.step_mut(index)?.set_length(length);
        Ok(())
    }

    /// Set the pitch of step `index`, clamped to `0..=127`.
    ///
    /// Returns [`SequenceError::InvalidStepIndex`] if `index >= N`.
    pub fn set_pitch(&mut self, index: usize, pitch: u8) -> Result<(), SequenceError> {
        self.step_mut(index)?.set_pitch(pitch);
        Ok(())
    }

    /// Set the velocity of step `index`, clamped to `0..=127`.
    ///
    /// Returns [`SequenceError::InvalidStepIndex`] if `index >= N`.
    pub fn set_velocity(&mut self, index: usize, velocity: u8) -> Result<(), SequenceError> {
        self.step_mut(index)?.set_velocity(velocity);
        Ok(())
    }

    /// Set `flag` on step `index` to `value`.
    ///
    /// Returns [`SequenceError::InvalidStepIndex`] if `index >= N`.
    pub fn set_flag(
        &mut self,
        index: usize,
        flag: StepFlag,
        value: bool,
    ) -> Result<(), SequenceError> {
        self.step_mut(index)?.flags.set(flag, value);
        Ok(())
    }

    /// Invert `flag` on step `index`.
    ///
    /// Returns [`SequenceError::InvalidStepIndex`] if `index >= N`.
    pub fn toggle_flag(&mut self, index: usize, flag: StepFlag) -> Result<(), SequenceError> {
        self.step_mut(index)?.flags.toggle(flag);
        Ok(())
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn check(index: usize) -> Result<(), SequenceError> {
        if index >= N {
            return Err(SequenceError::InvalidStepIndex);
        }
        Ok(())
    }

    fn step_mut(&mut self, index: usize) -> Result<&mut StepRecord, SequenceError> {
        self.steps
            .get_mut(index)
            .ok_or(SequenceError::InvalidStepIndex)
    }
}
