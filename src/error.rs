//! Error types shared across the crate.

use thiserror::Error;

use crate::bounding_box::BoundingBox;
use crate::section::PayloadKind;

/// Errors that can occur while constructing or re-expressing amplifier
/// image regions.
///
/// All of these indicate programming or configuration errors in the caller;
/// none are transient and none are retried internally.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmplifierImageError {
    /// A transform's input and output boxes have different sizes.
    #[error("transform input box {input} and output box {output} have different sizes")]
    DimensionMismatch {
        input: BoundingBox,
        output: BoundingBox,
    },
    /// A requested sub-box is not contained in the source box.
    #[error("box {requested} is not contained in {available}")]
    OutOfBounds {
        requested: BoundingBox,
        available: BoundingBox,
    },
    /// Payload kinds disagree where matching kinds are required.
    #[error("payload kind {found:?} does not match expected kind {expected:?}")]
    TypeMismatch {
        expected: PayloadKind,
        found: PayloadKind,
    },
    /// Supplied geometry disagrees with the box an operation expected.
    #[error("box {found} is inconsistent with expected box {expected}")]
    BboxMismatch {
        expected: BoundingBox,
        found: BoundingBox,
    },
    /// Assembly was attempted on an empty set or one missing amplifiers.
    #[error("cannot assemble an amplifier set unless all amplifiers in the detector are present")]
    IncompleteSet,
}

/// Result alias for amplifier image operations.
pub type Result<T> = std::result::Result<T, AmplifierImageError>;
