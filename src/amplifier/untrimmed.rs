//! Amplifier images carrying their full raw readout.

use serde::{Deserialize, Serialize};

use crate::amplifier::trimmed::{TrimmedAmplifier, TrimmedAmplifierParams};
use crate::amplifier::Amplifier;
use crate::bounding_box::BoundingBox;
use crate::error::{AmplifierImageError, Result};
use crate::section::{ImagePayload, ImageSection};
use crate::transform::ImageSectionTransform;

/// Everything about an [`UntrimmedAmplifier`] other than its pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UntrimmedAmplifierParams {
    /// Integer ID, unique within the detector.
    pub amplifier_id: u32,
    /// Maps the full amplifier image into readout coordinates.
    pub readout_transform: ImageSectionTransform,
    /// Maps the full amplifier image into raw-detector coordinates, i.e.
    /// its position on the assembled untrimmed detector.
    pub raw_detector_transform: ImageSectionTransform,
    /// The data (light-sensitive) region within the full image.
    pub data_bbox: BoundingBox,
    /// Where the data region lands on the assembled *trimmed* detector.
    pub data_physical_bbox: BoundingBox,
    /// Columns read out after the data columns of each row.
    pub horizontal_overscan_bbox: BoundingBox,
    /// Rows read out after all data rows.
    pub vertical_overscan_bbox: BoundingBox,
    /// Columns read out before the data columns of each row.
    pub horizontal_prescan_bbox: BoundingBox,
}

impl UntrimmedAmplifierParams {
    fn region_bboxes(&self) -> [BoundingBox; 4] {
        [
            self.data_bbox,
            self.horizontal_overscan_bbox,
            self.vertical_overscan_bbox,
            self.horizontal_prescan_bbox,
        ]
    }
}

/// An amplifier image holding the full readout: data plus overscan and
/// prescan regions.
///
/// The named regions are exposed as views into the full section, so
/// writing through e.g. [`UntrimmedAmplifier::horizontal_overscan`]
/// modifies the full image.
#[derive(Debug, Clone)]
pub struct UntrimmedAmplifier {
    full: ImageSection,
    params: UntrimmedAmplifierParams,
}

impl UntrimmedAmplifier {
    /// Creates an untrimmed amplifier from its full section and parameters.
    ///
    /// Both transforms must have the full section's bounding box as their
    /// input box, all named regions must lie within it, and the physical
    /// data box must have the same dimensions as the data box.
    pub fn new(full: ImageSection, params: UntrimmedAmplifierParams) -> Result<Self> {
        for transform in [&params.readout_transform, &params.raw_detector_transform] {
            if transform.input_bbox() != full.bbox() {
                return Err(AmplifierImageError::BboxMismatch {
                    expected: full.bbox(),
                    found: transform.input_bbox(),
                });
            }
        }
        // Empty region boxes are legal: not every amplifier has every kind
        // of overscan.
        for region in params.region_bboxes() {
            if region.is_valid() && !full.bbox().contains(&region) {
                return Err(AmplifierImageError::OutOfBounds {
                    requested: region,
                    available: full.bbox(),
                });
            }
        }
        if params.data_physical_bbox.width() != params.data_bbox.width()
            || params.data_physical_bbox.height() != params.data_bbox.height()
        {
            return Err(AmplifierImageError::DimensionMismatch {
                input: params.data_bbox,
                output: params.data_physical_bbox,
            });
        }
        Ok(Self { full, params })
    }

    /// The parameters describing this amplifier.
    pub fn params(&self) -> &UntrimmedAmplifierParams {
        &self.params
    }

    /// The full section, including overscan and prescan regions. Always a
    /// view sharing pixels with `self`.
    pub fn full(&self) -> ImageSection {
        self.full.clone()
    }

    /// The horizontal overscan region: columns read out after the data
    /// columns of each row. Always a view sharing pixels with `self`.
    pub fn horizontal_overscan(&self) -> ImageSection {
        self.full
            .subimage_unchecked(self.params.horizontal_overscan_bbox)
    }

    /// The vertical overscan region: rows read out after all data rows.
    /// Always a view sharing pixels with `self`.
    pub fn vertical_overscan(&self) -> ImageSection {
        self.full
            .subimage_unchecked(self.params.vertical_overscan_bbox)
    }

    /// The horizontal prescan region: columns read out before the data
    /// columns of each row. Always a view sharing pixels with `self`.
    pub fn horizontal_prescan(&self) -> ImageSection {
        self.full
            .subimage_unchecked(self.params.horizontal_prescan_bbox)
    }

    /// The transform that maps this amplifier into raw-detector
    /// coordinates.
    ///
    /// In raw-detector coordinates the amplifier occupies its position on
    /// the assembled untrimmed detector, overscans and all, with
    /// detector-consistent row and column ordering.
    pub fn raw_detector_transform(&self) -> &ImageSectionTransform {
        &self.params.raw_detector_transform
    }

    /// A new amplifier whose full section is in raw-detector coordinates.
    ///
    /// The result satisfies `raw_detector_transform().is_identity()`. See
    /// [`Amplifier::into_readout_coordinates`] for the meaning of
    /// `allow_view`.
    pub fn into_raw_detector_coordinates(&self, allow_view: bool) -> Result<Self> {
        self.with_transform_applied(self.params.raw_detector_transform, allow_view)
    }

    /// This amplifier with its pixels replaced by `payload`.
    ///
    /// The payload must cover the current full bounding box. All
    /// transforms and region boxes are unchanged.
    pub fn with_new_full_image(&self, payload: ImagePayload) -> Result<Self> {
        Ok(Self {
            full: self.full.with_new_payload(payload)?,
            params: self.params.clone(),
        })
    }

    /// Applies `transform` to the full section and rewrites the stored
    /// transforms and region boxes to match the new full box.
    fn with_transform_applied(
        &self,
        transform: ImageSectionTransform,
        allow_view: bool,
    ) -> Result<Self> {
        let full = self.full.apply_transform(&transform, allow_view)?;
        let undo = transform.inverted();
        let moved = |bbox: BoundingBox| -> Result<BoundingBox> {
            if !bbox.is_valid() {
                return Ok(bbox);
            }
            Ok(transform.for_subimage(bbox)?.output_bbox())
        };
        let params = UntrimmedAmplifierParams {
            amplifier_id: self.params.amplifier_id,
            readout_transform: self.params.readout_transform.after(&undo)?,
            raw_detector_transform: self.params.raw_detector_transform.after(&undo)?,
            data_bbox: moved(self.params.data_bbox)?,
            data_physical_bbox: self.params.data_physical_bbox,
            horizontal_overscan_bbox: moved(self.params.horizontal_overscan_bbox)?,
            vertical_overscan_bbox: moved(self.params.vertical_overscan_bbox)?,
            horizontal_prescan_bbox: moved(self.params.horizontal_prescan_bbox)?,
        };
        Ok(Self { full, params })
    }
}

impl Amplifier for UntrimmedAmplifier {
    fn amplifier_id(&self) -> u32 {
        self.params.amplifier_id
    }

    fn data(&self) -> ImageSection {
        self.full.subimage_unchecked(self.params.data_bbox)
    }

    fn trimmed_view(&self) -> Result<TrimmedAmplifier> {
        let data_bbox = self.params.data_bbox;
        let raw = &self.params.raw_detector_transform;
        let params = TrimmedAmplifierParams {
            amplifier_id: self.params.amplifier_id,
            readout_transform: self.params.readout_transform.for_subimage(data_bbox)?,
            physical_transform: ImageSectionTransform::new(
                data_bbox,
                self.params.data_physical_bbox,
                raw.flip_x(),
                raw.flip_y(),
            )?,
            horizontal_overscan_is_at_min: self.horizontal_overscan_boundary()
                == data_bbox.min_x,
            vertical_overscan_is_at_min: self.vertical_overscan_boundary() == data_bbox.min_y,
            horizontal_prescan_is_at_min: self.horizontal_prescan_boundary()
                == data_bbox.min_x,
        };
        TrimmedAmplifier::new(self.data(), params)
    }

    fn readout_transform(&self) -> &ImageSectionTransform {
        &self.params.readout_transform
    }

    fn into_readout_coordinates(&self, allow_view: bool) -> Result<Self> {
        self.with_transform_applied(self.params.readout_transform, allow_view)
    }

    fn deep_copy(&self) -> Self {
        Self {
            full: self.full.copy(),
            params: self.params.clone(),
        }
    }

    fn without_images(&self) -> Self {
        Self {
            full: self.full.without_payload(),
            params: self.params.clone(),
        }
    }

    fn horizontal_overscan_boundary(&self) -> i32 {
        let data = self.params.data_bbox;
        let overscan = self.params.horizontal_overscan_bbox;
        if overscan.max_x < data.min_x {
            data.min_x
        } else {
            assert!(overscan.min_x > data.max_x);
            data.max_x
        }
    }

    fn vertical_overscan_boundary(&self) -> i32 {
        let data = self.params.data_bbox;
        let overscan = self.params.vertical_overscan_bbox;
        if overscan.max_y < data.min_y {
            data.min_y
        } else {
            assert!(overscan.min_y > data.max_y);
            data.max_y
        }
    }

    fn horizontal_prescan_boundary(&self) -> i32 {
        let data = self.params.data_bbox;
        let prescan = self.params.horizontal_prescan_bbox;
        if prescan.max_x < data.min_x {
            data.min_x
        } else {
            assert!(prescan.min_x > data.max_x);
            data.max_x
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use ndarray::Array2;

    use super::*;
    use crate::section::BufferPayload;

    const FULL_BBOX: BoundingBox = BoundingBox {
        min_x: 0,
        min_y: 0,
        max_x: 14,
        max_y: 21,
    };

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

    fn test_params() -> UntrimmedAmplifierParams {
        UntrimmedAmplifierParams {
            amplifier_id: 7,
            // Rows and columns were read out in reverse-x order.
            readout_transform: ImageSectionTransform::new(FULL_BBOX, FULL_BBOX, true, false)
                .unwrap(),
            raw_detector_transform: ImageSectionTransform::new(
                FULL_BBOX,
                BoundingBox::new(15, 0, 29, 21),
                true,
                false,
            )
            .unwrap(),
            data_bbox: BoundingBox::new(2, 0, 11, 19),
            data_physical_bbox: BoundingBox::new(10, 0, 19, 19),
            horizontal_overscan_bbox: BoundingBox::new(12, 0, 14, 19),
            vertical_overscan_bbox: BoundingBox::new(2, 20, 11, 21),
            horizontal_prescan_bbox: BoundingBox::new(0, 0, 1, 19),
        }
    }

    fn test_amplifier() -> UntrimmedAmplifier {
        UntrimmedAmplifier::new(ramp(FULL_BBOX), test_params()).unwrap()
    }

    #[test]
    fn test_new_rejects_mismatched_transform_input() {
        let mut params = test_params();
        params.readout_transform =
            ImageSectionTransform::identity(BoundingBox::new(0, 0, 14, 19));
        assert!(matches!(
            UntrimmedAmplifier::new(ramp(FULL_BBOX), params),
            Err(AmplifierImageError::BboxMismatch { .. })
        ));
    }

    #[test]
    fn test_new_rejects_region_outside_full() {
        let mut params = test_params();
        params.vertical_overscan_bbox = BoundingBox::new(2, 20, 11, 25);
        assert!(matches!(
            UntrimmedAmplifier::new(ramp(FULL_BBOX), params),
            Err(AmplifierImageError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_new_rejects_physical_size_mismatch() {
        let mut params = test_params();
        params.data_physical_bbox = BoundingBox::new(10, 0, 19, 18);
        assert!(matches!(
            UntrimmedAmplifier::new(ramp(FULL_BBOX), params),
            Err(AmplifierImageError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_regions_are_views() {
        let amp = test_amplifier();
        let full = amp.full();
        for (section, bbox) in [
            (amp.data(), BoundingBox::new(2, 0, 11, 19)),
            (amp.horizontal_overscan(), BoundingBox::new(12, 0, 14, 19)),
            (amp.vertical_overscan(), BoundingBox::new(2, 20, 11, 21)),
            (amp.horizontal_prescan(), BoundingBox::new(0, 0, 1, 19)),
        ] {
            assert_eq!(section.bbox(), bbox);
            assert!(section.shares_storage_with(&full));
        }
        if let ImagePayload::Buffer(p) = amp.horizontal_overscan().payload() {
            p.write_pixel(12, 0, -5.0);
        }
        assert_relative_eq!(pixel(&full, 12, 0), -5.0);
    }

    #[test]
    fn test_boundaries() {
        let amp = test_amplifier();
        assert_eq!(amp.horizontal_overscan_boundary(), 11);
        assert_eq!(amp.vertical_overscan_boundary(), 19);
        assert_eq!(amp.horizontal_prescan_boundary(), 2);
    }

    #[test]
    #[should_panic]
    fn test_boundary_panics_when_overscan_overlaps_data() {
        let mut params = test_params();
        params.horizontal_overscan_bbox = params.data_bbox;
        let amp = UntrimmedAmplifier::new(ramp(FULL_BBOX), params).unwrap();
        amp.horizontal_overscan_boundary();
    }

    #[test]
    fn test_trimmed_view() {
        let amp = test_amplifier();
        let trimmed = amp.trimmed_view().unwrap();

        assert_eq!(trimmed.amplifier_id(), 7);
        assert_eq!(trimmed.data().bbox(), BoundingBox::new(2, 0, 11, 19));
        assert!(trimmed.data().shares_storage_with(&amp.full()));

        // The physical transform carries the raw-detector flips.
        let physical = trimmed.physical_transform();
        assert_eq!(physical.output_bbox(), BoundingBox::new(10, 0, 19, 19));
        assert!(physical.flip_x());
        assert!(!physical.flip_y());

        // The readout transform is the full one narrowed to the data box:
        // with the x flip, data columns 2..=11 of 0..=14 become 3..=12.
        let readout = trimmed.readout_transform();
        assert_eq!(readout.input_bbox(), BoundingBox::new(2, 0, 11, 19));
        assert_eq!(readout.output_bbox(), BoundingBox::new(3, 0, 12, 19));
        assert!(readout.flip_x());

        assert!(!trimmed.params().horizontal_overscan_is_at_min);
        assert!(!trimmed.params().vertical_overscan_is_at_min);
        assert!(trimmed.params().horizontal_prescan_is_at_min);
    }

    #[test]
    fn test_into_readout_coordinates() {
        let amp = test_amplifier();
        let readout = amp.into_readout_coordinates(false).unwrap();

        assert!(readout.readout_transform().is_identity());
        assert_eq!(readout.full().bbox(), FULL_BBOX);
        // The x flip forces a copy and mirrors columns.
        assert!(!readout.full().shares_storage_with(&amp.full()));
        assert_relative_eq!(pixel(&amp.full(), 0, 5), pixel(&readout.full(), 14, 5));

        // Region boxes move with the flip.
        assert_eq!(readout.params().data_bbox, BoundingBox::new(3, 0, 12, 19));
        assert_eq!(
            readout.params().horizontal_prescan_bbox,
            BoundingBox::new(13, 0, 14, 19)
        );
        assert_eq!(
            readout.params().horizontal_overscan_bbox,
            BoundingBox::new(0, 0, 2, 19)
        );
        assert_eq!(
            readout.params().vertical_overscan_bbox,
            BoundingBox::new(3, 20, 12, 21)
        );
        // Physical placement is unaffected by how the pixels are stored.
        assert_eq!(
            readout.params().data_physical_bbox,
            amp.params().data_physical_bbox
        );
        // The raw-detector transform is rebased onto the new full box.
        assert_eq!(readout.raw_detector_transform().input_bbox(), FULL_BBOX);
        assert!(!readout.raw_detector_transform().flip_x());

        // Prescan and overscan swap edges under the flip.
        assert_eq!(readout.horizontal_prescan_boundary(), 12);
        assert_eq!(readout.horizontal_overscan_boundary(), 3);
    }

    #[test]
    fn test_raw_detector_roundtrip_restores_pixels() {
        let amp = test_amplifier();
        let raw = amp.into_raw_detector_coordinates(false).unwrap();
        assert!(raw.raw_detector_transform().is_identity());
        assert_eq!(raw.full().bbox(), BoundingBox::new(15, 0, 29, 21));

        let back = raw.into_readout_coordinates(false).unwrap();
        let restored = back.into_raw_detector_coordinates(false).unwrap();
        assert_eq!(restored.full().bbox(), raw.full().bbox());
        assert_relative_eq!(pixel(&raw.full(), 15, 0), pixel(&restored.full(), 15, 0));
        assert_relative_eq!(pixel(&raw.full(), 29, 21), pixel(&restored.full(), 29, 21));
        assert_eq!(restored.params().data_bbox, raw.params().data_bbox);
    }

    #[test]
    fn test_deep_copy_and_without_images() {
        let amp = test_amplifier();

        let copy = amp.deep_copy();
        assert!(!copy.full().shares_storage_with(&amp.full()));
        assert_eq!(copy.params(), amp.params());

        let bare = amp.without_images();
        assert!(!bare.full().has_image());
        assert_eq!(bare.full().bbox(), FULL_BBOX);
        assert!(!bare.data().has_image());
        assert_eq!(bare.data().bbox(), amp.params().data_bbox);
    }

    #[test]
    fn test_with_new_full_image() {
        let amp = test_amplifier();
        let replacement = ImagePayload::Buffer(BufferPayload::zeros(FULL_BBOX));
        let replaced = amp.with_new_full_image(replacement).unwrap();
        assert_relative_eq!(pixel(&replaced.full(), 7, 7), 0.0);
        assert_eq!(replaced.params(), amp.params());

        let wrong = ImagePayload::Buffer(BufferPayload::zeros(BoundingBox::new(0, 0, 3, 3)));
        assert!(amp.with_new_full_image(wrong).is_err());
    }
}
