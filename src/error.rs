//! Error types returned by the operator-facing surface of the engine.
//!
//! Internal mutators (band tree counters, forest bookkeeping) never fail;
//! per the error handling design they clamp and log instead. Only the
//! operator surface (`crate::operator`) returns a `Result`.
use std::error;
use std::fmt;

/// Error produced by an operator-facing entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrecacError {
    /// The regulatory domain is not ETSI; pre-CAC is inert.
    NotEtsi,
    /// The requested intermediate (parking) channel is itself a DFS channel.
    InvalidIntermediateChannel,
    /// A lower-MAC command transport call failed; the attempt was abandoned
    /// but the forest is left consistent.
    TransportUnavailable,
}

impl PrecacError {
    /// Maps to the negative errno-style codes the legacy operator surface used.
    pub fn as_errno(self) -> i32 {
        match self {
            PrecacError::NotEtsi => -95,             // -EOPNOTSUPP
            PrecacError::InvalidIntermediateChannel => -22, // -EINVAL
            PrecacError::TransportUnavailable => -5, // -EIO
        }
    }
}

impl fmt::Display for PrecacError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            PrecacError::NotEtsi => "pre-CAC is only available in the ETSI regulatory domain",
            PrecacError::InvalidIntermediateChannel => {
                "intermediate channel must be a non-DFS frequency"
            }
            PrecacError::TransportUnavailable => {
                "lower-MAC command transport unavailable, abandoning attempt"
            }
        };
        write!(f, "{msg}")
    }
}

impl error::Error for PrecacError {}

/// Convenience alias used throughout the operator surface.
pub type Result<T> = std::result::Result<T, PrecacError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_error() {
        assert_eq!(
            "intermediate channel must be a non-DFS frequency",
            format!("{}", PrecacError::InvalidIntermediateChannel)
        );
    }

    #[test]
    fn errno_mapping() {
        assert_eq!(PrecacError::NotEtsi.as_errno(), -95);
        assert_eq!(PrecacError::TransportUnavailable.as_errno(), -5);
    }
}
