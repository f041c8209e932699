//! Amplifier images with overscan and prescan regions removed.

use serde::{Deserialize, Serialize};

use crate::amplifier::Amplifier;
use crate::error::{AmplifierImageError, Result};
use crate::section::{ImagePayload, ImageSection};
use crate::transform::ImageSectionTransform;

/// Everything about a [`TrimmedAmplifier`] other than its pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrimmedAmplifierParams {
    /// Integer ID, unique within the detector.
    pub amplifier_id: u32,
    /// Maps the data section into readout coordinates.
    pub readout_transform: ImageSectionTransform,
    /// Maps the data section into physical (assembled-detector)
    /// coordinates.
    pub physical_transform: ImageSectionTransform,
    /// Whether the horizontal overscan region sits off the minimum-x edge
    /// of the data box (as opposed to the maximum-x edge).
    pub horizontal_overscan_is_at_min: bool,
    /// Whether the vertical overscan region sits off the minimum-y edge of
    /// the data box.
    pub vertical_overscan_is_at_min: bool,
    /// Whether the horizontal prescan region sits off the minimum-x edge
    /// of the data box.
    pub horizontal_prescan_is_at_min: bool,
}

/// An amplifier image holding only the data (light-sensitive) section.
///
/// The overscan and prescan regions have been trimmed away, but the
/// amplifier still remembers which data-box edges they were adjacent to,
/// and still knows how to map itself into readout and physical
/// coordinates.
#[derive(Debug, Clone)]
pub struct TrimmedAmplifier {
    data: ImageSection,
    params: TrimmedAmplifierParams,
}

impl TrimmedAmplifier {
    /// Creates a trimmed amplifier from a data section and its parameters.
    ///
    /// Both transforms must have the data section's bounding box as their
    /// input box.
    pub fn new(data: ImageSection, params: TrimmedAmplifierParams) -> Result<Self> {
        for transform in [&params.readout_transform, &params.physical_transform] {
            if transform.input_bbox() != data.bbox() {
                return Err(AmplifierImageError::BboxMismatch {
                    expected: data.bbox(),
                    found: transform.input_bbox(),
                });
            }
        }
        Ok(Self { data, params })
    }

    /// The parameters describing this amplifier.
    pub fn params(&self) -> &TrimmedAmplifierParams {
        &self.params
    }

    /// The transform that maps this amplifier into physical coordinates.
    ///
    /// In physical coordinates the amplifier occupies the region it maps
    /// to on the assembled detector, with detector-consistent row and
    /// column ordering.
    pub fn physical_transform(&self) -> &ImageSectionTransform {
        &self.params.physical_transform
    }

    /// A new amplifier whose data section is in physical coordinates.
    ///
    /// The result satisfies `physical_transform().is_identity()`. See
    /// [`Amplifier::into_readout_coordinates`] for the meaning of
    /// `allow_view`.
    pub fn into_physical_coordinates(&self, allow_view: bool) -> Result<Self> {
        self.with_transform_applied(self.params.physical_transform, allow_view)
    }

    /// This amplifier with its pixels replaced by `payload`.
    ///
    /// The payload must cover the current data bounding box. All
    /// transforms and region metadata are unchanged.
    pub fn with_new_data_image(&self, payload: ImagePayload) -> Result<Self> {
        Ok(Self {
            data: self.data.with_new_payload(payload)?,
            params: self.params.clone(),
        })
    }

    /// Applies `transform` to the data section and rebases the stored
    /// transforms so they compose from the new data box.
    fn with_transform_applied(
        &self,
        transform: ImageSectionTransform,
        allow_view: bool,
    ) -> Result<Self> {
        let data = self.data.apply_transform(&transform, allow_view)?;
        let undo = transform.inverted();
        let params = TrimmedAmplifierParams {
            amplifier_id: self.params.amplifier_id,
            readout_transform: self.params.readout_transform.after(&undo)?,
            physical_transform: self.params.physical_transform.after(&undo)?,
            horizontal_overscan_is_at_min: self.params.horizontal_overscan_is_at_min
                ^ transform.flip_x(),
            vertical_overscan_is_at_min: self.params.vertical_overscan_is_at_min
                ^ transform.flip_y(),
            horizontal_prescan_is_at_min: self.params.horizontal_prescan_is_at_min
                ^ transform.flip_x(),
        };
        Ok(Self { data, params })
    }
}

impl Amplifier for TrimmedAmplifier {
    fn amplifier_id(&self) -> u32 {
        self.params.amplifier_id
    }

    fn data(&self) -> ImageSection {
        self.data.clone()
    }

    fn trimmed_view(&self) -> Result<TrimmedAmplifier> {
        Ok(self.clone())
    }

    fn readout_transform(&self) -> &ImageSectionTransform {
        &self.params.readout_transform
    }

    fn into_readout_coordinates(&self, allow_view: bool) -> Result<Self> {
        self.with_transform_applied(self.params.readout_transform, allow_view)
    }

    fn deep_copy(&self) -> Self {
        Self {
            data: self.data.copy(),
            params: self.params.clone(),
        }
    }

    fn without_images(&self) -> Self {
        Self {
            data: self.data.without_payload(),
            params: self.params.clone(),
        }
    }

    fn horizontal_overscan_boundary(&self) -> i32 {
        if self.params.horizontal_overscan_is_at_min {
            self.data.bbox().min_x
        } else {
            self.data.bbox().max_x
        }
    }

    fn vertical_overscan_boundary(&self) -> i32 {
        if self.params.vertical_overscan_is_at_min {
            self.data.bbox().min_y
        } else {
            self.data.bbox().max_y
        }
    }

    fn horizontal_prescan_boundary(&self) -> i32 {
        if self.params.horizontal_prescan_is_at_min {
            self.data.bbox().min_x
        } else {
            self.data.bbox().max_x
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::Array2;

    use super::*;
    use crate::bounding_box::BoundingBox;
    use crate::section::BufferPayload;

    fn ramp(bbox: BoundingBox) -> ImageSection {
        let array = Array2::from_shape_fn(
            (bbox.height() as usize, bbox.width() as usize),
            |(r, c)| (r * 100 + c) as f32,
        );
        ImageSection::from_buffer(array, bbox.min_x, bbox.min_y)
    }

    fn pixel(section: &ImageSection, x: i32, y: i32) -> f32 {
        match section.payload() {
            ImagePayload::Buffer(p) => p.read_pixel(x, y),
            _ => panic!("expected buffer payload"),
        }
    }

    fn test_amplifier() -> TrimmedAmplifier {
        let data_bbox = BoundingBox::new(0, 0, 9, 19);
        let physical_bbox = BoundingBox::new(10, 0, 19, 19);
        let params = TrimmedAmplifierParams {
            amplifier_id: 3,
            readout_transform: ImageSectionTransform::identity(data_bbox),
            physical_transform: ImageSectionTransform::new(
                data_bbox,
                physical_bbox,
                true,
                false,
            )
            .unwrap(),
            horizontal_overscan_is_at_min: false,
            vertical_overscan_is_at_min: false,
            horizontal_prescan_is_at_min: true,
        };
        TrimmedAmplifier::new(ramp(data_bbox), params).unwrap()
    }

    #[test]
    fn test_new_rejects_mismatched_transform_input() {
        let data_bbox = BoundingBox::new(0, 0, 9, 19);
        let other_bbox = BoundingBox::new(0, 0, 9, 9);
        let params = TrimmedAmplifierParams {
            amplifier_id: 0,
            readout_transform: ImageSectionTransform::identity(other_bbox),
            physical_transform: ImageSectionTransform::identity(data_bbox),
            horizontal_overscan_is_at_min: false,
            vertical_overscan_is_at_min: false,
            horizontal_prescan_is_at_min: true,
        };
        let result = TrimmedAmplifier::new(ramp(data_bbox), params);
        assert!(matches!(
            result,
            Err(AmplifierImageError::BboxMismatch { .. })
        ));
    }

    #[test]
    fn test_boundaries_follow_flags() {
        let amp = test_amplifier();
        assert_eq!(amp.horizontal_overscan_boundary(), 9);
        assert_eq!(amp.vertical_overscan_boundary(), 19);
        assert_eq!(amp.horizontal_prescan_boundary(), 0);
    }

    #[test]
    fn test_into_physical_coordinates_flips_and_rebases() {
        let amp = test_amplifier();
        let physical = amp.into_physical_coordinates(false).unwrap();

        let new_bbox = BoundingBox::new(10, 0, 19, 19);
        assert_eq!(physical.data().bbox(), new_bbox);
        assert!(physical.physical_transform().is_identity());
        // Both stored transforms must compose from the new data box.
        assert_eq!(physical.readout_transform().input_bbox(), new_bbox);
        // A flip always forces a copy.
        assert!(!physical.data().shares_storage_with(&amp.data()));

        // Pre-flip column 0 lands on the new maximum-x column.
        let data = amp.data();
        let flipped = physical.data();
        assert_relative_eq!(pixel(&data, 0, 5), pixel(&flipped, 19, 5));
        assert_relative_eq!(pixel(&data, 9, 5), pixel(&flipped, 10, 5));

        // The flip moves overscan and prescan to the opposite x edges.
        assert!(physical.params().horizontal_overscan_is_at_min);
        assert!(!physical.params().horizontal_prescan_is_at_min);
        assert!(!physical.params().vertical_overscan_is_at_min);
        assert_eq!(physical.horizontal_overscan_boundary(), 10);
        assert_eq!(physical.horizontal_prescan_boundary(), 19);
    }

    #[test]
    fn test_physical_then_readout_restores_pixels() {
        let amp = test_amplifier();
        let roundtrip = amp
            .into_physical_coordinates(false)
            .unwrap()
            .into_readout_coordinates(false)
            .unwrap();
        assert_eq!(roundtrip.data().bbox(), amp.data().bbox());
        assert!(roundtrip.readout_transform().is_identity());
        let data = amp.data();
        let restored = roundtrip.data();
        assert_relative_eq!(pixel(&data, 0, 0), pixel(&restored, 0, 0));
        assert_relative_eq!(pixel(&data, 9, 19), pixel(&restored, 9, 19));
        assert_relative_eq!(pixel(&data, 4, 7), pixel(&restored, 4, 7));
        assert_eq!(
            roundtrip.physical_transform(),
            amp.physical_transform()
        );
    }

    #[test]
    fn test_into_readout_coordinates_identity_is_view() {
        let amp = test_amplifier();
        let readout = amp.into_readout_coordinates(true).unwrap();
        assert!(readout.data().shares_storage_with(&amp.data()));
        let readout_copy = amp.into_readout_coordinates(false).unwrap();
        assert!(!readout_copy.data().shares_storage_with(&amp.data()));
    }

    #[test]
    fn test_deep_copy_and_without_images() {
        let amp = test_amplifier();

        let copy = amp.deep_copy();
        assert!(!copy.data().shares_storage_with(&amp.data()));
        assert_eq!(copy.params(), amp.params());

        let bare = amp.without_images();
        assert!(!bare.data().has_image());
        assert_eq!(bare.data().bbox(), amp.data().bbox());
        assert_eq!(bare.params(), amp.params());
    }

    #[test]
    fn test_with_new_data_image() {
        let amp = test_amplifier();
        let bbox = amp.data().bbox();
        let replacement = ImagePayload::Buffer(BufferPayload::zeros(bbox));
        let replaced = amp.with_new_data_image(replacement).unwrap();
        assert_relative_eq!(pixel(&replaced.data(), 3, 3), 0.0);
        assert_eq!(replaced.params(), amp.params());

        let wrong = ImagePayload::Buffer(BufferPayload::zeros(BoundingBox::new(0, 0, 3, 3)));
        assert!(amp.with_new_data_image(wrong).is_err());
    }
}
