use std::{error, fmt};

/// Errors that can occur when creating a histogram.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum CreationError {
    /// Lowest discernible value must be >= 1.
    LowIsZero,
    /// Highest trackable value must be >= 2 * lowest discernible value for some internal
    /// calculations to work out. In practice, high is typically much higher than 2 * low.
    HighLessThanTwiceLow,
    /// Number of significant digits must be in the range `[1, 5]`. It is capped at 5 because 5
    /// significant digits is already more than almost anyone needs, and memory usage scales
    /// exponentially as this increases.
    SigFigOutOfRange,
    /// Cannot represent sigfig worth of values beyond the lowest discernible value. Decrease the
    /// significant figures, lowest discernible value, or both.
    ///
    /// This could happen if low is very large (like 2^60) and sigfigs is 5, which requires 18
    /// additional bits, which would then require more bits than will fit in a u64. Specifically,
    /// the exponent of the largest power of two that is smaller than the lowest value and the bits
    /// needed to represent the requested significant figures must sum to 63 or less.
    CannotRepresentSigFigBeyondLow,
    /// The `usize` type is too small to represent the desired configuration. Use fewer significant
    /// figures or a lower max.
    UsizeTypeTooSmall,
}

impl fmt::Display for CreationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CreationError::LowIsZero => write!(f, "Lowest discernible value must be >= 1"),
            CreationError::HighLessThanTwiceLow => write!(
                f,
                "Highest trackable value must be >= 2 * lowest discernible value"
            ),
            CreationError::SigFigOutOfRange => {
                write!(f, "Number of significant digits must be in the range [1, 5]")
            }
            CreationError::CannotRepresentSigFigBeyondLow => write!(
                f,
                "Cannot represent sigfig worth of values beyond the lowest discernible value"
            ),
            CreationError::UsizeTypeTooSmall => write!(
                f,
                "The usize type is too small to represent the desired configuration"
            ),
        }
    }
}

impl error::Error for CreationError {}

/// Errors that can occur while recording a value and its associated count.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum RecordError {
    /// The value to record is above the highest trackable value. Configure a histogram with a
    /// higher maximum value if such values must be recorded. The histogram is left unchanged.
    ValueOutOfRange,
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RecordError::ValueOutOfRange => {
                write!(f, "The value to record is above the highest trackable value")
            }
        }
    }
}

impl error::Error for RecordError {}

/// Errors that can occur when merging another histogram into this one.
#[derive(Debug, Eq, PartialEq, Clone, Copy)]
pub enum MergeError {
    /// The other histogram's derived bucket layout differs, so its counter slots do not line up
    /// with this histogram's. Only histograms constructed from parameters that derive the same
    /// layout can be merged. Neither histogram is modified.
    IncompatibleLayout,
}

impl fmt::Display for MergeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MergeError::IncompatibleLayout => {
                write!(f, "The histograms' derived bucket layouts are incompatible")
            }
        }
    }
}

impl error::Error for MergeError {}
