// ============================================================================
// TRANSFORM OPERATIONS — whole-canvas 90° rotation and flips
// ============================================================================
//
// Rotation and flip apply to the base image and the paint raster together
// so strokes stay registered with the pixels under them.  90°/270° swap
// the content extent; sticker and text anchors are remapped through the
// same mapping and re-clamped by the caller.

use image::{RgbaImage, imageops};

/// One whole-canvas orientation edit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Orient {
    Rotate90,
    Rotate270,
    FlipH,
    FlipV,
}

impl Orient {
    /// Content extent after applying this edit to a `w`×`h` canvas.
    pub fn apply_to_extent(self, w: u32, h: u32) -> (u32, u32) {
        match self {
            Orient::Rotate90 | Orient::Rotate270 => (h, w),
            Orient::FlipH | Orient::FlipV => (w, h),
        }
    }

    /// Map a content-space point from the old canvas into the transformed
    /// one.  `(w, h)` is the extent *before* the edit.
    pub fn apply_to_point(self, p: (f32, f32), w: u32, h: u32) -> (f32, f32) {
        let (x, y) = p;
        match self {
            Orient::Rotate90 => (h as f32 - y, x),
            Orient::Rotate270 => (y, w as f32 - x),
            Orient::FlipH => (w as f32 - x, y),
            Orient::FlipV => (x, h as f32 - y),
        }
    }
}

/// Apply the edit to one pixel layer.
pub fn apply_to_image(img: &RgbaImage, orient: Orient) -> RgbaImage {
    match orient {
        Orient::Rotate90 => imageops::rotate90(img),
        Orient::Rotate270 => imageops::rotate270(img),
        Orient::FlipH => imageops::flip_horizontal(img),
        Orient::FlipV => imageops::flip_vertical(img),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn marker_image() -> RgbaImage {
        // 3×2, unique pixel per position
        RgbaImage::from_fn(3, 2, |x, y| Rgba([x as u8, y as u8, 0, 255]))
    }

    #[test]
    fn rotate90_swaps_extent_and_maps_pixels() {
        let img = marker_image();
        let out = apply_to_image(&img, Orient::Rotate90);
        assert_eq!(out.dimensions(), (2, 3));
        // Top-left of the source ends up top-right after a clockwise turn
        assert_eq!(out.get_pixel(1, 0), img.get_pixel(0, 0));
        assert_eq!(out.get_pixel(0, 2), img.get_pixel(2, 1));
    }

    #[test]
    fn rotate90_then_270_is_identity() {
        let img = marker_image();
        let back = apply_to_image(&apply_to_image(&img, Orient::Rotate90), Orient::Rotate270);
        assert_eq!(img, back);
    }

    #[test]
    fn flips_are_involutions() {
        let img = marker_image();
        for orient in [Orient::FlipH, Orient::FlipV] {
            let back = apply_to_image(&apply_to_image(&img, orient), orient);
            assert_eq!(img, back, "{:?}", orient);
        }
    }

    #[test]
    fn extent_mapping_matches_image_output() {
        for orient in [
            Orient::Rotate90,
            Orient::Rotate270,
            Orient::FlipH,
            Orient::FlipV,
        ] {
            let img = marker_image();
            let out = apply_to_image(&img, orient);
            assert_eq!(out.dimensions(), orient.apply_to_extent(3, 2));
        }
    }

    #[test]
    fn point_mapping_follows_corners() {
        // Corner (0, 0) of a 300×200 canvas
        assert_eq!(
            Orient::Rotate90.apply_to_point((0.0, 0.0), 300, 200),
            (200.0, 0.0)
        );
        assert_eq!(
            Orient::Rotate270.apply_to_point((0.0, 0.0), 300, 200),
            (0.0, 300.0)
        );
        assert_eq!(
            Orient::FlipH.apply_to_point((0.0, 50.0), 300, 200),
            (300.0, 50.0)
        );
        assert_eq!(
            Orient::FlipV.apply_to_point((120.0, 0.0), 300, 200),
            (120.0, 200.0)
        );
    }
}
