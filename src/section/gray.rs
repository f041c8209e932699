//! Pixel storage backed by the `image` crate's 16-bit grayscale buffers.
//!
//! Mirrors [`super::buffer::BufferPayload`] for callers whose pixel data
//! lives in `image::ImageBuffer` objects (e.g. frames exported for
//! visualization or file I/O) rather than `ndarray` arrays.

use std::sync::{Arc, RwLock};

use image::{ImageBuffer, Luma};

use crate::bounding_box::BoundingBox;

/// 16-bit grayscale image buffer, the pixel representation this backend
/// wraps.
pub type Gray16Image = ImageBuffer<Luma<u16>, Vec<u16>>;

/// Handle to shared [`Gray16Image`] pixel storage.
///
/// Pixel (0, 0) of the buffer corresponds to the minimum corner of
/// `storage_bbox`. Region arguments must lie within the storage box;
/// sections enforce this before delegating here.
#[derive(Debug, Clone)]
pub struct GrayPayload {
    storage: Arc<RwLock<Gray16Image>>,
    storage_bbox: BoundingBox,
}

impl GrayPayload {
    /// Wrap an owned image whose minimum corner sits at `(min_x, min_y)`.
    pub fn new(image: Gray16Image, min_x: i32, min_y: i32) -> Self {
        let storage_bbox =
            BoundingBox::from_min_size(min_x, min_y, image.width() as i32, image.height() as i32);
        Self {
            storage: Arc::new(RwLock::new(image)),
            storage_bbox,
        }
    }

    /// Zero-filled storage covering `bbox`.
    pub fn zeros(bbox: BoundingBox) -> Self {
        Self {
            storage: Arc::new(RwLock::new(Gray16Image::new(
                bbox.width() as u32,
                bbox.height() as u32,
            ))),
            storage_bbox: bbox,
        }
    }

    /// The box covered by the full backing image.
    pub fn storage_bbox(&self) -> BoundingBox {
        self.storage_bbox
    }

    /// `true` if both handles alias the same backing image.
    pub fn shares_storage(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }

    fn offsets(&self, x: i32, y: i32) -> (u32, u32) {
        (
            (x - self.storage_bbox.min_x) as u32,
            (y - self.storage_bbox.min_y) as u32,
        )
    }

    /// Owned copy of the pixels in `region`.
    pub fn read_region(&self, region: BoundingBox) -> Gray16Image {
        let guard = self.storage.read().unwrap();
        let (x0, y0) = self.offsets(region.min_x, region.min_y);
        let mut out = Gray16Image::new(region.width() as u32, region.height() as u32);
        for y in 0..out.height() {
            for x in 0..out.width() {
                out.put_pixel(x, y, *guard.get_pixel(x0 + x, y0 + y));
            }
        }
        out
    }

    /// Overwrite the pixels in `region` with `values` (same size).
    pub fn write_region(&self, region: BoundingBox, values: &Gray16Image) {
        let mut guard = self.storage.write().unwrap();
        let (x0, y0) = self.offsets(region.min_x, region.min_y);
        for y in 0..values.height() {
            for x in 0..values.width() {
                guard.put_pixel(x0 + x, y0 + y, *values.get_pixel(x, y));
            }
        }
    }

    /// Read a single pixel.
    pub fn read_pixel(&self, x: i32, y: i32) -> u16 {
        let guard = self.storage.read().unwrap();
        let (px, py) = self.offsets(x, y);
        guard.get_pixel(px, py).0[0]
    }

    /// Write a single pixel.
    pub fn write_pixel(&self, x: i32, y: i32, value: u16) {
        let mut guard = self.storage.write().unwrap();
        let (px, py) = self.offsets(x, y);
        guard.put_pixel(px, py, Luma([value]));
    }

    /// Fresh storage holding a copy of `region`, optionally flipped, with
    /// its storage box repositioned to `out_bbox`.
    pub fn extract(
        &self,
        region: BoundingBox,
        flip_x: bool,
        flip_y: bool,
        out_bbox: BoundingBox,
    ) -> Self {
        let data = self.read_region(region);
        let flipped = match (flip_x, flip_y) {
            (false, false) => data,
            (true, false) => image::imageops::flip_horizontal(&data),
            (false, true) => image::imageops::flip_vertical(&data),
            (true, true) => image::imageops::rotate180(&data),
        };
        Self::new(flipped, out_bbox.min_x, out_bbox.min_y)
    }

    /// Alias of the same storage with the coordinate system shifted by
    /// `(dx, dy)`.
    pub fn translated(&self, dx: i32, dy: i32) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            storage_bbox: self.storage_bbox.translated(dx, dy),
        }
    }
}
