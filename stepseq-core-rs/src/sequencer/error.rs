use core::fmt;

/// Errors returned by [`Sequence`](super::Sequence) accessors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SequenceError {
    /// Step index is out of bounds (must be < the sequence capacity).
    InvalidStepIndex,
}

impl fmt::Display for SequenceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SequenceError::InvalidStepIndex => write!(f, "Invalid step index"),
        }
    }
}
