//! Geometry and assembly of detector amplifier sub-images.
//!
//! A detector is read out through several amplifiers, each producing a small
//! sub-image that may be flipped or offset relative to its position on the
//! assembled detector. This crate models *where* those pixels are and how
//! regions are re-expressed between three coordinate systems:
//!
//! - **readout coordinates**: rows and columns ordered as clocked off the
//!   sensor, origin at (0, 0);
//! - **physical coordinates**: the assembled, trimmed detector image;
//! - **raw detector coordinates**: the assembled, untrimmed detector image,
//!   overscan and prescan regions included.
//!
//! It performs no pixel-level processing (bias subtraction, flat-fielding,
//! etc.); it only manages region geometry, flips, and the composition of
//! many amplifier views into one detector-sized canvas.

pub mod amplifier;
pub mod amplifier_set;
pub mod bounding_box;
pub mod error;
pub mod section;
pub mod transform;

pub use amplifier::{
    Amplifier, TrimmedAmplifier, TrimmedAmplifierParams, UntrimmedAmplifier,
    UntrimmedAmplifierParams,
};
pub use amplifier_set::{
    AssembledTrimmedAmplifierSet, AssembledUntrimmedAmplifierSet, UnassembledTrimmedAmplifierSet,
    UnassembledUntrimmedAmplifierSet,
};
pub use bounding_box::BoundingBox;
pub use error::AmplifierImageError;
pub use section::{BufferPayload, Gray16Image, GrayPayload, ImagePayload, ImageSection, PayloadKind};
pub use transform::ImageSectionTransform;
