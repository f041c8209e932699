//! Image sections: a bounding box plus optional pixel payload.
//!
//! The point of [`ImageSection`] is to make a bare bounding box behave just
//! like an image (which has a bounding box) to higher-level code; amplifier
//! objects with several named regions can then hold either plain geometry or
//! complete pixel data through one interface.
//!
//! Payloads form a closed set of three kinds (no payload, `ndarray` buffer,
//! `image`-crate grayscale buffer). Pixel-bearing payloads are *handles* into
//! shared storage: cloning a section, or taking a [`ImageSection::subimage`],
//! aliases the same pixels. Flips can never be expressed by a handle because
//! backing storage supports only non-negative strides, so any operation that
//! flips always produces fresh storage.

pub mod buffer;
pub mod gray;

pub use buffer::BufferPayload;
pub use gray::{Gray16Image, GrayPayload};

use ndarray::Array2;

use crate::bounding_box::BoundingBox;
use crate::error::{AmplifierImageError, Result};
use crate::transform::ImageSectionTransform;

/// Tag identifying the payload kind of a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    /// No pixel data, just a bounding box.
    NoData,
    /// `ndarray`-backed in-memory array.
    Buffer,
    /// `image`-crate 16-bit grayscale buffer.
    Gray,
}

/// The closed set of pixel payloads a section can carry.
#[derive(Debug, Clone)]
pub enum ImagePayload {
    /// No pixel data.
    NoData,
    /// Handle into shared `Array2<f32>` storage.
    Buffer(BufferPayload),
    /// Handle into shared [`Gray16Image`] storage.
    Gray(GrayPayload),
}

impl ImagePayload {
    /// The kind tag for this payload.
    pub fn kind(&self) -> PayloadKind {
        match self {
            Self::NoData => PayloadKind::NoData,
            Self::Buffer(_) => PayloadKind::Buffer,
            Self::Gray(_) => PayloadKind::Gray,
        }
    }

    /// The box covered by the payload's backing storage, if it has any.
    pub fn storage_bbox(&self) -> Option<BoundingBox> {
        match self {
            Self::NoData => None,
            Self::Buffer(p) => Some(p.storage_bbox()),
            Self::Gray(p) => Some(p.storage_bbox()),
        }
    }
}

/// A rectangular region of a detector image: a bounding box plus an optional
/// pixel payload.
///
/// Cloning a section is cheap and produces an aliasing view; use
/// [`ImageSection::copy`] for a deep copy of the pixels.
#[derive(Debug, Clone)]
pub struct ImageSection {
    bbox: BoundingBox,
    payload: ImagePayload,
}

impl ImageSection {
    /// A section with no pixel payload, just a bounding box.
    pub fn box_only(bbox: BoundingBox) -> Self {
        Self {
            bbox,
            payload: ImagePayload::NoData,
        }
    }

    /// Wrap an owned `ndarray` buffer whose minimum corner sits at
    /// `(min_x, min_y)`; the section covers the whole array.
    pub fn from_buffer(array: Array2<f32>, min_x: i32, min_y: i32) -> Self {
        let payload = BufferPayload::new(array, min_x, min_y);
        Self {
            bbox: payload.storage_bbox(),
            payload: ImagePayload::Buffer(payload),
        }
    }

    /// Wrap an owned grayscale image whose minimum corner sits at
    /// `(min_x, min_y)`; the section covers the whole image.
    pub fn from_gray(image: Gray16Image, min_x: i32, min_y: i32) -> Self {
        let payload = GrayPayload::new(image, min_x, min_y);
        Self {
            bbox: payload.storage_bbox(),
            payload: ImagePayload::Gray(payload),
        }
    }

    /// A section over `bbox` carrying the given payload.
    ///
    /// Fails with [`AmplifierImageError::BboxMismatch`] if the payload's
    /// backing storage does not cover `bbox`.
    pub fn new(bbox: BoundingBox, payload: ImagePayload) -> Result<Self> {
        if let Some(storage_bbox) = payload.storage_bbox() {
            if !storage_bbox.contains(&bbox) {
                return Err(AmplifierImageError::BboxMismatch {
                    expected: bbox,
                    found: storage_bbox,
                });
            }
        }
        Ok(Self { bbox, payload })
    }

    /// The bounding box for this section.
    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    /// The pixel payload, possibly [`ImagePayload::NoData`].
    pub fn payload(&self) -> &ImagePayload {
        &self.payload
    }

    /// The kind tag of the payload.
    pub fn payload_kind(&self) -> PayloadKind {
        self.payload.kind()
    }

    /// `true` if this section carries pixel data.
    pub fn has_image(&self) -> bool {
        !matches!(self.payload, ImagePayload::NoData)
    }

    /// Deep copy: the result has the same bounding box but shares no pixel
    /// storage with `self`. Box-only sections are returned as-is, since
    /// there is nothing mutable to alias.
    pub fn copy(&self) -> Self {
        let payload = match &self.payload {
            ImagePayload::NoData => ImagePayload::NoData,
            ImagePayload::Buffer(p) => {
                ImagePayload::Buffer(p.extract(self.bbox, false, false, self.bbox))
            }
            ImagePayload::Gray(p) => {
                ImagePayload::Gray(p.extract(self.bbox, false, false, self.bbox))
            }
        };
        Self {
            bbox: self.bbox,
            payload,
        }
    }

    /// A new zero-filled section of the same payload kind for `bbox`.
    pub fn make_empty(&self, bbox: BoundingBox) -> Self {
        let payload = match &self.payload {
            ImagePayload::NoData => ImagePayload::NoData,
            ImagePayload::Buffer(_) => ImagePayload::Buffer(BufferPayload::zeros(bbox)),
            ImagePayload::Gray(_) => ImagePayload::Gray(GrayPayload::zeros(bbox)),
        };
        Self { bbox, payload }
    }

    /// A view restricted to `bbox` that shares pixel storage with `self`.
    ///
    /// Fails with [`AmplifierImageError::OutOfBounds`] unless
    /// `self.bbox().contains(&bbox)`.
    pub fn subimage(&self, bbox: BoundingBox) -> Result<Self> {
        if !self.bbox.contains(&bbox) {
            return Err(AmplifierImageError::OutOfBounds {
                requested: bbox,
                available: self.bbox,
            });
        }
        Ok(Self {
            bbox,
            payload: self.payload.clone(),
        })
    }

    /// View restricted to `bbox` without the containment check.
    ///
    /// For callers that have already established `self.bbox()` contains
    /// `bbox` through their own invariants.
    pub(crate) fn subimage_unchecked(&self, bbox: BoundingBox) -> Self {
        Self {
            bbox,
            payload: self.payload.clone(),
        }
    }

    /// Copy pixel values from `other` into the corresponding region of
    /// `self`.
    ///
    /// Requires `self.bbox().contains(&other.bbox())` (else
    /// [`AmplifierImageError::OutOfBounds`]) and matching payload kinds
    /// (else [`AmplifierImageError::TypeMismatch`]). When `self` carries no
    /// payload, only the containment check applies.
    pub fn assign(&self, other: &Self) -> Result<()> {
        if !self.bbox.contains(&other.bbox) {
            return Err(AmplifierImageError::OutOfBounds {
                requested: other.bbox,
                available: self.bbox,
            });
        }
        match (&self.payload, &other.payload) {
            (ImagePayload::NoData, _) => Ok(()),
            (ImagePayload::Buffer(dst), ImagePayload::Buffer(src)) => {
                dst.write_region(other.bbox, &src.read_region(other.bbox));
                Ok(())
            }
            (ImagePayload::Gray(dst), ImagePayload::Gray(src)) => {
                dst.write_region(other.bbox, &src.read_region(other.bbox));
                Ok(())
            }
            (mine, theirs) => Err(AmplifierImageError::TypeMismatch {
                expected: mine.kind(),
                found: theirs.kind(),
            }),
        }
    }

    /// Re-express this section at `transform.output_bbox()`.
    ///
    /// Requires `transform.input_bbox() == self.bbox()` (else
    /// [`AmplifierImageError::BboxMismatch`]). When the transform flips an
    /// axis the result always carries fresh pixel storage, regardless of
    /// `allow_view`; a pure translation with `allow_view == true` returns an
    /// aliasing view.
    pub fn apply_transform(
        &self,
        transform: &ImageSectionTransform,
        allow_view: bool,
    ) -> Result<Self> {
        if transform.input_bbox() != self.bbox {
            return Err(AmplifierImageError::BboxMismatch {
                expected: self.bbox,
                found: transform.input_bbox(),
            });
        }
        let out_bbox = transform.output_bbox();
        let needs_copy = transform.flip_x() || transform.flip_y() || !allow_view;
        let payload = match &self.payload {
            ImagePayload::NoData => ImagePayload::NoData,
            ImagePayload::Buffer(p) => {
                if needs_copy {
                    ImagePayload::Buffer(p.extract(
                        self.bbox,
                        transform.flip_x(),
                        transform.flip_y(),
                        out_bbox,
                    ))
                } else {
                    ImagePayload::Buffer(
                        p.translated(out_bbox.min_x - self.bbox.min_x, out_bbox.min_y - self.bbox.min_y),
                    )
                }
            }
            ImagePayload::Gray(p) => {
                if needs_copy {
                    ImagePayload::Gray(p.extract(
                        self.bbox,
                        transform.flip_x(),
                        transform.flip_y(),
                        out_bbox,
                    ))
                } else {
                    ImagePayload::Gray(
                        p.translated(out_bbox.min_x - self.bbox.min_x, out_bbox.min_y - self.bbox.min_y),
                    )
                }
            }
        };
        Ok(Self {
            bbox: out_bbox,
            payload,
        })
    }

    /// The same bounding box with no payload. Short-circuits to a clone when
    /// already payload-less.
    pub fn without_payload(&self) -> Self {
        match self.payload {
            ImagePayload::NoData => self.clone(),
            _ => Self {
                bbox: self.bbox,
                payload: ImagePayload::NoData,
            },
        }
    }

    /// The same bounding box wrapped around a different payload.
    ///
    /// Fails with [`AmplifierImageError::BboxMismatch`] if the payload's
    /// backing storage does not cover `self.bbox()`.
    pub fn with_new_payload(&self, payload: ImagePayload) -> Result<Self> {
        Self::new(self.bbox, payload)
    }

    /// `true` if both sections alias the same pixel storage. Box-only
    /// sections never share storage.
    pub fn shares_storage_with(&self, other: &Self) -> bool {
        match (&self.payload, &other.payload) {
            (ImagePayload::Buffer(a), ImagePayload::Buffer(b)) => a.shares_storage(b),
            (ImagePayload::Gray(a), ImagePayload::Gray(b)) => a.shares_storage(b),
            _ => false,
        }
    }
}
