//! Mapping of image sections between detector coordinate systems.
//!
//! Sections can only be flipped or shifted, and only flips require pixel
//! values to move (pixel storage is assumed to support only non-negative
//! strides). A transform records both the exact box a section will occupy
//! after it is applied and whether each axis must be inverted relative to the
//! current pixel order. That mix of absolute and relative information makes a
//! transform a mapping of one *particular* section into a new coordinate
//! system, not a general mapping that could be applied to other geometries.

use serde::{Deserialize, Serialize};

use crate::bounding_box::BoundingBox;
use crate::error::{AmplifierImageError, Result};

/// Describes how a rectangular image section maps into another coordinate
/// system: a destination box plus optional per-axis flips.
///
/// Invariant: the input and output boxes always have the same size, checked
/// at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSectionTransform {
    input_bbox: BoundingBox,
    output_bbox: BoundingBox,
    flip_x: bool,
    flip_y: bool,
}

impl ImageSectionTransform {
    /// Create a transform mapping `input_bbox` to `output_bbox` with the
    /// given flips.
    ///
    /// Fails with [`AmplifierImageError::DimensionMismatch`] if the two boxes
    /// have different sizes.
    pub fn new(
        input_bbox: BoundingBox,
        output_bbox: BoundingBox,
        flip_x: bool,
        flip_y: bool,
    ) -> Result<Self> {
        if input_bbox.size() != output_bbox.size() {
            return Err(AmplifierImageError::DimensionMismatch {
                input: input_bbox,
                output: output_bbox,
            });
        }
        Ok(Self {
            input_bbox,
            output_bbox,
            flip_x,
            flip_y,
        })
    }

    /// The identity transform on `bbox`: no flips, input equals output.
    pub fn identity(bbox: BoundingBox) -> Self {
        Self {
            input_bbox: bbox,
            output_bbox: bbox,
            flip_x: false,
            flip_y: false,
        }
    }

    /// The box the section is expected to start with.
    pub fn input_bbox(&self) -> BoundingBox {
        self.input_bbox
    }

    /// The box the section will occupy after this transform is applied.
    pub fn output_bbox(&self) -> BoundingBox {
        self.output_bbox
    }

    /// Whether the x axis must be inverted.
    pub fn flip_x(&self) -> bool {
        self.flip_x
    }

    /// Whether the y axis must be inverted.
    pub fn flip_y(&self) -> bool {
        self.flip_y
    }

    /// `true` if this transform does nothing.
    pub fn is_identity(&self) -> bool {
        !(self.flip_x || self.flip_y) && self.input_bbox == self.output_bbox
    }

    /// Compose "`self` applied after `other`".
    ///
    /// The result starts from `other`'s input box and ends at `self`'s output
    /// box, with the flips of the two transforms cancelling pairwise.
    /// Fails with [`AmplifierImageError::DimensionMismatch`] if the box sizes
    /// of the two transforms are incompatible.
    pub fn after(&self, other: &Self) -> Result<Self> {
        Self::new(
            other.input_bbox,
            self.output_bbox,
            self.flip_x != other.flip_x,
            self.flip_y != other.flip_y,
        )
    }

    /// The inverse transform: output box back to input box, same flips
    /// (a flip is its own inverse).
    pub fn inverted(&self) -> Self {
        Self {
            input_bbox: self.output_bbox,
            output_bbox: self.input_bbox,
            flip_x: self.flip_x,
            flip_y: self.flip_y,
        }
    }

    /// Restrict this transform to a sub-box of its input.
    ///
    /// Returns the transform whose input box is `bbox` and whose output is
    /// the corresponding sub-box of `self.output_bbox()`, with the same
    /// flips. The per-axis offsets from `bbox`'s edges to the input box's
    /// edges are swapped on any flipped axis before being applied to the
    /// output box's edges; this is what makes "assemble first, then derive
    /// sub-region transforms" agree with deriving per-piece transforms
    /// independently.
    ///
    /// Fails with [`AmplifierImageError::OutOfBounds`] unless
    /// `self.input_bbox().contains(&bbox)`.
    pub fn for_subimage(&self, bbox: BoundingBox) -> Result<Self> {
        if !self.input_bbox.contains(&bbox) {
            return Err(AmplifierImageError::OutOfBounds {
                requested: bbox,
                available: self.input_bbox,
            });
        }
        // Distances (defined to be positive) between the minimum points of
        // both boxes and the maximum points of both boxes.
        let mut lower_dist_x = bbox.min_x - self.input_bbox.min_x;
        let mut lower_dist_y = bbox.min_y - self.input_bbox.min_y;
        let mut upper_dist_x = self.input_bbox.max_x - bbox.max_x;
        let mut upper_dist_y = self.input_bbox.max_y - bbox.max_y;
        if self.flip_x {
            std::mem::swap(&mut lower_dist_x, &mut upper_dist_x);
        }
        if self.flip_y {
            std::mem::swap(&mut lower_dist_y, &mut upper_dist_y);
        }
        let output_bbox = BoundingBox::new(
            self.output_bbox.min_x + lower_dist_x,
            self.output_bbox.min_y + lower_dist_y,
            self.output_bbox.max_x - upper_dist_x,
            self.output_bbox.max_y - upper_dist_y,
        );
        Ok(Self {
            input_bbox: bbox,
            output_bbox,
            flip_x: self.flip_x,
            flip_y: self.flip_y,
        })
    }
}
