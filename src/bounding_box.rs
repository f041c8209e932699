//! Integer bounding boxes for detector image regions.
//!
//! Regions are rectangles in one of the detector coordinate systems
//! (readout, physical, or raw detector). Bounds are inclusive on both ends,
//! and coordinates are signed so that boxes can be positioned anywhere in an
//! assembled coordinate system.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An axis-aligned rectangle with inclusive integer bounds.
///
/// The x axis increases along a row (columns) and the y axis across rows.
/// An *empty* box, as produced by [`BoundingBox::new_empty`], has inverted
/// bounds, reports `is_valid() == false`, and acts as the identity for
/// [`BoundingBox::union`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Minimum x coordinate (inclusive)
    pub min_x: i32,
    /// Minimum y coordinate (inclusive)
    pub min_y: i32,
    /// Maximum x coordinate (inclusive)
    pub max_x: i32,
    /// Maximum y coordinate (inclusive)
    pub max_y: i32,
}

impl BoundingBox {
    /// Create a box from explicit inclusive bounds.
    pub fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    /// Create a box from its minimum corner and size in pixels.
    pub fn from_min_size(min_x: i32, min_y: i32, width: i32, height: i32) -> Self {
        Self {
            min_x,
            min_y,
            max_x: min_x + width - 1,
            max_y: min_y + height - 1,
        }
    }

    /// Create an empty box with inverted bounds.
    ///
    /// Used as the starting point for accumulating a union over several
    /// boxes, e.g. when computing the full detector extent from per-amplifier
    /// regions.
    pub fn new_empty() -> Self {
        Self {
            min_x: i32::MAX,
            min_y: i32::MAX,
            max_x: i32::MIN,
            max_y: i32::MIN,
        }
    }

    /// Width in pixels.
    pub fn width(&self) -> i32 {
        self.max_x - self.min_x + 1
    }

    /// Height in pixels.
    pub fn height(&self) -> i32 {
        self.max_y - self.min_y + 1
    }

    /// Size as a `(width, height)` tuple.
    pub fn size(&self) -> (i32, i32) {
        (self.width(), self.height())
    }

    /// Area in pixels.
    pub fn area(&self) -> i64 {
        self.width() as i64 * self.height() as i64
    }

    /// Minimum corner as `(x, y)`.
    pub fn min(&self) -> (i32, i32) {
        (self.min_x, self.min_y)
    }

    /// Maximum corner as `(x, y)`.
    pub fn max(&self) -> (i32, i32) {
        (self.max_x, self.max_y)
    }

    /// `true` if the bounds are not inverted on either axis.
    pub fn is_valid(&self) -> bool {
        self.min_x <= self.max_x && self.min_y <= self.max_y
    }

    /// `true` if the point `(x, y)` lies within the bounds.
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// `true` if `other` lies entirely within `self` (boundary contact
    /// allowed).
    pub fn contains(&self, other: &Self) -> bool {
        self.min_x <= other.min_x
            && self.max_x >= other.max_x
            && self.min_y <= other.min_y
            && self.max_y >= other.max_y
    }

    /// `true` if the boxes share any pixels.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    /// The smallest box containing both `self` and `other`.
    ///
    /// An empty box is the identity: `empty.union(&b) == b`.
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Translate the box by `(dx, dy)`.
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        Self {
            min_x: self.min_x + dx,
            min_y: self.min_y + dy,
            max_x: self.max_x + dx,
            max_y: self.max_y + dy,
        }
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "({},{})-({},{})",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}
