//! Error types for the reflow engine

use crate::pages::PageId;
use crate::reflow::ReflowState;
use thiserror::Error;

/// Failure reported by a [`MeasurementOracle`](crate::layout::MeasurementOracle)
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeasureError {
    /// The rendering surface is not attached, nothing can be measured
    #[error("Layout context detached: {0}")]
    Detached(String),

    #[error("Measurement failed: {0}")]
    Failed(String),
}

/// Errors surfaced by [`ReflowController`](crate::reflow::ReflowController).
///
/// None of these are fatal. An `Err` returned from a controller operation
/// always means the page sequence was left exactly as it was.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReflowError {
    /// The oracle could not measure; no overflow decision was made this cycle
    #[error("Measurement unavailable: {0}")]
    MeasurementUnavailable(#[from] MeasureError),

    /// Content does not fit on a page even alone; the page is kept oversized
    #[error("Page {page_id} cannot fit its content ({height} > {max_height})")]
    NoFitPossible {
        page_id: PageId,
        height: f32,
        max_height: f32,
    },

    /// Operation on a page id that is not (or no longer) in the sequence
    #[error("Invalid operation on page {page_id}: {reason}")]
    InvalidOperation {
        page_id: PageId,
        reason: &'static str,
    },

    /// A mutation arrived while a reflow was still settling
    #[error("Reflow in progress ({0:?})")]
    ReentrantReflow(ReflowState),
}

impl ReflowError {
    pub(crate) fn invalid(page_id: PageId, reason: &'static str) -> Self {
        ReflowError::InvalidOperation { page_id, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_measure_error_converts() {
        let err: ReflowError = MeasureError::Detached("no surface".to_string()).into();
        assert!(matches!(err, ReflowError::MeasurementUnavailable(_)));
        assert_eq!(
            err.to_string(),
            "Measurement unavailable: Layout context detached: no surface"
        );
    }

    #[test]
    fn test_no_fit_message() {
        let err = ReflowError::NoFitPossible {
            page_id: PageId(3),
            height: 900.0,
            max_height: 882.0,
        };
        assert_eq!(err.to_string(), "Page 3 cannot fit its content (900 > 882)");
    }
}
