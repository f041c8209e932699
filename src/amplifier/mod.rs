//! Single-amplifier images in their two trim states.
//!
//! A [`TrimmedAmplifier`] holds only the data (light-sensitive) section; an
//! [`UntrimmedAmplifier`] holds the full readout including overscan and
//! prescan regions. Both carry transforms into the coordinate systems of the
//! detector they belong to, and both are immutable value objects: coordinate
//! conversions return new amplifiers, and only pixel contents can be
//! mutated (through section views).

pub mod trimmed;
pub mod untrimmed;

pub use trimmed::{TrimmedAmplifier, TrimmedAmplifierParams};
pub use untrimmed::{UntrimmedAmplifier, UntrimmedAmplifierParams};

use crate::error::Result;
use crate::section::ImageSection;
use crate::transform::ImageSectionTransform;

/// The contract shared by both amplifier trim states.
pub trait Amplifier: Clone + Sized {
    /// Integer ID for this amplifier, unique within its detector.
    fn amplifier_id(&self) -> u32;

    /// The data section. Always a view sharing pixels with `self`.
    fn data(&self) -> ImageSection;

    /// An amplifier view containing just the data section.
    ///
    /// Always shares pixels with `self`.
    fn trimmed_view(&self) -> Result<TrimmedAmplifier>;

    /// The transform that maps this amplifier into readout coordinates.
    ///
    /// In readout coordinates, rows and columns are ordered consistently
    /// with the order in which they were read out, and the origin of the
    /// full untrimmed amplifier image is (0, 0).
    fn readout_transform(&self) -> &ImageSectionTransform;

    /// A new amplifier with the same trim state that is guaranteed to
    /// satisfy `readout_transform().is_identity()`.
    ///
    /// `allow_view` permits the result to share pixels with `self`. It
    /// should stay `false` unless aliasing is genuinely acceptable: a copy
    /// is required whenever a flip is involved, which is common across real
    /// instruments, so code that implicitly assumes a view is returned
    /// probably isn't instrument-generic.
    fn into_readout_coordinates(&self, allow_view: bool) -> Result<Self>;

    /// A copy that deep-copies all pixel values.
    fn deep_copy(&self) -> Self;

    /// This amplifier with no pixel data, just bounding boxes and metadata.
    fn without_images(&self) -> Self;

    /// The x coordinate of the data-box edge adjacent to the horizontal
    /// overscan region: always the data box's minimum or maximum x.
    fn horizontal_overscan_boundary(&self) -> i32;

    /// The y coordinate of the data-box edge adjacent to the vertical
    /// overscan region: always the data box's minimum or maximum y.
    fn vertical_overscan_boundary(&self) -> i32;

    /// The x coordinate of the data-box edge adjacent to the horizontal
    /// prescan region: always the data box's minimum or maximum x.
    fn horizontal_prescan_boundary(&self) -> i32;
}
