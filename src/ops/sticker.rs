// ============================================================================
// STICKERS — draggable, scalable overlay images in content coordinates
// ============================================================================

use image::{RgbaImage, imageops};

/// Smallest allowed sticker width in content pixels.
const MIN_WIDTH: f32 = 8.0;
/// Default sticker width as a fraction of the content width.
const DEFAULT_WIDTH_FRACTION: f32 = 0.25;

/// One placed sticker.  `pos` is the top-left corner in content space;
/// height is always derived from the source aspect ratio so scaling is
/// uniform.  The bounding box is kept inside the content extent after
/// every mutation.
#[derive(Clone)]
pub struct Sticker {
    pub image: RgbaImage,
    pub pos: (f32, f32),
    pub width: f32,
}

impl Sticker {
    /// Place a sticker centered on `center`, sized relative to the content
    /// extent and clamped inside it.
    pub fn place(image: RgbaImage, center: (f32, f32), extent: (u32, u32)) -> Self {
        let width = (extent.0 as f32 * DEFAULT_WIDTH_FRACTION)
            .min(image.width() as f32)
            .max(MIN_WIDTH);
        let mut sticker = Self {
            image,
            pos: (0.0, 0.0),
            width,
        };
        let h = sticker.height();
        sticker.pos = (center.0 - width / 2.0, center.1 - h / 2.0);
        sticker.clamp_to(extent);
        sticker
    }

    /// Height derived from the source aspect ratio.
    pub fn height(&self) -> f32 {
        if self.image.width() == 0 {
            return self.width;
        }
        self.width * self.image.height() as f32 / self.image.width() as f32
    }

    /// Bounding box `(x1, y1, x2, y2)` in content space.
    pub fn bounds(&self) -> (f32, f32, f32, f32) {
        (
            self.pos.0,
            self.pos.1,
            self.pos.0 + self.width,
            self.pos.1 + self.height(),
        )
    }

    pub fn contains(&self, p: (f32, f32)) -> bool {
        let (x1, y1, x2, y2) = self.bounds();
        p.0 >= x1 && p.0 <= x2 && p.1 >= y1 && p.1 <= y2
    }

    /// Move by a content-space delta, then re-clamp.
    pub fn drag_by(&mut self, delta: (f32, f32), extent: (u32, u32)) {
        self.pos.0 += delta.0;
        self.pos.1 += delta.1;
        self.clamp_to(extent);
    }

    /// Uniform scale about the sticker center, then re-clamp.
    pub fn scale_by(&mut self, factor: f32, extent: (u32, u32)) {
        let old_w = self.width;
        let old_h = self.height();
        self.width = (self.width * factor).max(MIN_WIDTH);
        self.pos.0 -= (self.width - old_w) / 2.0;
        self.pos.1 -= (self.height() - old_h) / 2.0;
        self.clamp_to(extent);
    }

    /// Force the bounding box inside `[0, w] × [0, h]`.  A sticker wider or
    /// taller than the extent is scaled down to fit first.
    pub fn clamp_to(&mut self, extent: (u32, u32)) {
        let (ew, eh) = (extent.0 as f32, extent.1 as f32);
        if ew <= 0.0 || eh <= 0.0 {
            return;
        }
        if self.width > ew {
            self.width = ew;
        }
        if self.height() > eh {
            self.width = eh * self.image.width() as f32 / self.image.height().max(1) as f32;
        }
        let h = self.height();
        self.pos.0 = self.pos.0.clamp(0.0, ew - self.width);
        self.pos.1 = self.pos.1.clamp(0.0, eh - h);
    }

    /// Alpha-blend the sticker into `target` at its current position and
    /// size (bilinear resample for the scale, then a plain overlay).
    pub fn composite_into(&self, target: &mut RgbaImage) {
        let w = self.width.round().max(1.0) as u32;
        let h = self.height().round().max(1.0) as u32;
        let scaled = if (w, h) == self.image.dimensions() {
            self.image.clone()
        } else {
            imageops::resize(&self.image, w, h, imageops::FilterType::Triangle)
        };
        imageops::overlay(target, &scaled, self.pos.0.round() as i64, self.pos.1.round() as i64);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn asset(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_pixel(w, h, Rgba([0, 255, 0, 255]))
    }

    fn assert_contained(sticker: &Sticker, extent: (u32, u32)) {
        let (x1, y1, x2, y2) = sticker.bounds();
        assert!(x1 >= -1e-3 && y1 >= -1e-3, "({}, {})", x1, y1);
        assert!(
            x2 <= extent.0 as f32 + 1e-3 && y2 <= extent.1 as f32 + 1e-3,
            "({}, {}) vs {:?}",
            x2,
            y2,
            extent
        );
    }

    #[test]
    fn height_follows_aspect_ratio() {
        let sticker = Sticker {
            image: asset(64, 32),
            pos: (0.0, 0.0),
            width: 100.0,
        };
        assert_eq!(sticker.height(), 50.0);
    }

    #[test]
    fn placement_is_contained() {
        let extent = (800, 600);
        // Even when placed at the very corner
        let sticker = Sticker::place(asset(64, 64), (0.0, 0.0), extent);
        assert_contained(&sticker, extent);
        let sticker = Sticker::place(asset(64, 64), (800.0, 600.0), extent);
        assert_contained(&sticker, extent);
    }

    #[test]
    fn drag_clamps_to_extent() {
        let extent = (200, 100);
        let mut sticker = Sticker::place(asset(40, 40), (100.0, 50.0), extent);
        sticker.drag_by((-1000.0, -1000.0), extent);
        assert_contained(&sticker, extent);
        assert_eq!(sticker.pos, (0.0, 0.0));
        sticker.drag_by((5000.0, 5000.0), extent);
        assert_contained(&sticker, extent);
    }

    #[test]
    fn scale_clamps_to_extent() {
        let extent = (200, 100);
        let mut sticker = Sticker::place(asset(40, 40), (100.0, 50.0), extent);
        for _ in 0..20 {
            sticker.scale_by(1.5, extent);
            assert_contained(&sticker, extent);
        }
        // Tall extent limit comes from height, not width
        assert!(sticker.height() <= 100.0 + 1e-3);
        for _ in 0..40 {
            sticker.scale_by(0.5, extent);
            assert_contained(&sticker, extent);
        }
        assert!(sticker.width >= MIN_WIDTH);
    }

    #[test]
    fn hit_test_uses_bounding_box() {
        let sticker = Sticker {
            image: asset(10, 10),
            pos: (20.0, 30.0),
            width: 10.0,
        };
        assert!(sticker.contains((25.0, 35.0)));
        assert!(!sticker.contains((19.0, 35.0)));
        assert!(!sticker.contains((25.0, 41.0)));
    }

    #[test]
    fn composite_writes_inside_bounds_only() {
        let mut target = RgbaImage::new(100, 100);
        let sticker = Sticker {
            image: asset(10, 10),
            pos: (40.0, 40.0),
            width: 20.0,
        };
        sticker.composite_into(&mut target);
        assert_eq!(target.get_pixel(50, 50)[3], 255);
        assert_eq!(target.get_pixel(10, 10)[3], 0);
    }
}
