//! In-memory array pixel storage backed by `ndarray`.
//!
//! A [`BufferPayload`] is a handle into shared `Array2<f32>` storage: the
//! array itself plus the bounding box that the full array covers. Cloning the
//! handle aliases the same pixels; sections narrow the region they expose by
//! carrying their own bounding box alongside the handle.

use std::sync::{Arc, RwLock};

use ndarray::{s, Array2};

use crate::bounding_box::BoundingBox;

/// Handle to shared `Array2<f32>` pixel storage.
///
/// Row 0 of the array corresponds to `storage_bbox.min_y` and column 0 to
/// `storage_bbox.min_x`. Region arguments on the methods below must lie
/// within the storage box; sections enforce this before delegating here, and
/// a violation panics on the underlying array indexing.
#[derive(Debug, Clone)]
pub struct BufferPayload {
    storage: Arc<RwLock<Array2<f32>>>,
    storage_bbox: BoundingBox,
}

impl BufferPayload {
    /// Wrap an owned array whose minimum corner sits at `(min_x, min_y)`.
    ///
    /// `array.shape()[0]` is the height and `array.shape()[1]` the width of
    /// the resulting storage box.
    pub fn new(array: Array2<f32>, min_x: i32, min_y: i32) -> Self {
        let (height, width) = array.dim();
        Self {
            storage: Arc::new(RwLock::new(array)),
            storage_bbox: BoundingBox::from_min_size(min_x, min_y, width as i32, height as i32),
        }
    }

    /// Zero-filled storage covering `bbox`.
    pub fn zeros(bbox: BoundingBox) -> Self {
        Self {
            storage: Arc::new(RwLock::new(Array2::zeros((
                bbox.height() as usize,
                bbox.width() as usize,
            )))),
            storage_bbox: bbox,
        }
    }

    /// The box covered by the full backing array.
    pub fn storage_bbox(&self) -> BoundingBox {
        self.storage_bbox
    }

    /// `true` if both handles alias the same backing array.
    pub fn shares_storage(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.storage, &other.storage)
    }

    fn row_col(&self, x: i32, y: i32) -> (usize, usize) {
        (
            (y - self.storage_bbox.min_y) as usize,
            (x - self.storage_bbox.min_x) as usize,
        )
    }

    /// Owned copy of the pixels in `region`.
    pub fn read_region(&self, region: BoundingBox) -> Array2<f32> {
        let guard = self.storage.read().unwrap();
        let (r0, c0) = self.row_col(region.min_x, region.min_y);
        let (r1, c1) = self.row_col(region.max_x, region.max_y);
        guard.slice(s![r0..=r1, c0..=c1]).to_owned()
    }

    /// Overwrite the pixels in `region` with `values` (same shape).
    pub fn write_region(&self, region: BoundingBox, values: &Array2<f32>) {
        let mut guard = self.storage.write().unwrap();
        let (r0, c0) = self.row_col(region.min_x, region.min_y);
        let (r1, c1) = self.row_col(region.max_x, region.max_y);
        guard.slice_mut(s![r0..=r1, c0..=c1]).assign(values);
    }

    /// Read a single pixel.
    pub fn read_pixel(&self, x: i32, y: i32) -> f32 {
        let guard = self.storage.read().unwrap();
        let (row, col) = self.row_col(x, y);
        guard[[row, col]]
    }

    /// Write a single pixel.
    pub fn write_pixel(&self, x: i32, y: i32, value: f32) {
        let mut guard = self.storage.write().unwrap();
        let (row, col) = self.row_col(x, y);
        guard[[row, col]] = value;
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
        let step_x: isize = if flip_x { -1 } else { 1 };
        let step_y: isize = if flip_y { -1 } else { 1 };
        let flipped = data.slice(s![..;step_y, ..;step_x]).to_owned();
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

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_read_write_region_with_offset_origin() {
        let payload = BufferPayload::zeros(BoundingBox::new(10, 20, 13, 23));
        payload.write_region(
            BoundingBox::new(11, 21, 12, 22),
            &array![[1.0, 2.0], [3.0, 4.0]],
        );
        let read = payload.read_region(BoundingBox::new(11, 21, 12, 22));
        assert_relative_eq!(read[[0, 0]], 1.0);
        assert_relative_eq!(read[[1, 1]], 4.0);
        // Pixels outside the written region stay zero.
        assert_relative_eq!(payload.read_pixel(10, 20), 0.0);
    }

    #[test]
    fn test_clone_aliases_storage() {
        let payload = BufferPayload::zeros(BoundingBox::new(0, 0, 3, 3));
        let alias = payload.clone();
        alias.write_pixel(2, 1, 7.0);
        assert_relative_eq!(payload.read_pixel(2, 1), 7.0);
        assert!(payload.shares_storage(&alias));
    }

    #[test]
    fn test_extract_flip_x() {
        let payload = BufferPayload::new(array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]], 0, 0);
        let out_bbox = BoundingBox::new(0, 0, 2, 1);
        let flipped = payload.extract(out_bbox, true, false, out_bbox);
        let data = flipped.read_region(out_bbox);
        assert_relative_eq!(data[[0, 0]], 3.0);
        assert_relative_eq!(data[[0, 2]], 1.0);
        assert_relative_eq!(data[[1, 0]], 6.0);
        assert!(!flipped.shares_storage(&payload));
    }

    #[test]
    fn test_extract_flip_y() {
        let payload = BufferPayload::new(array![[1.0, 2.0], [3.0, 4.0]], 0, 0);
        let out_bbox = BoundingBox::new(0, 0, 1, 1);
        let flipped = payload.extract(out_bbox, false, true, out_bbox);
        let data = flipped.read_region(out_bbox);
        assert_relative_eq!(data[[0, 0]], 3.0);
        assert_relative_eq!(data[[1, 0]], 1.0);
    }

    #[test]
    fn test_translated_keeps_pixels() {
        let payload = BufferPayload::new(array![[1.0, 2.0], [3.0, 4.0]], 0, 0);
        let moved = payload.translated(10, 5);
        assert_eq!(moved.storage_bbox(), BoundingBox::new(10, 5, 11, 6));
        assert_relative_eq!(moved.read_pixel(10, 5), 1.0);
        assert!(moved.shares_storage(&payload));
    }
}
