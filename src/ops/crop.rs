// ============================================================================
// CROP — rectangular selection in content space + exact sub-region copy
// ============================================================================

use image::{RgbaImage, imageops};

/// Crop selection while the tool is in its selecting state.  Corners are
/// content-space and unordered — `resolve` normalizes them, so drag
/// direction never matters.  `dragged` distinguishes a real selection from
/// a bare click: applying without a drag is a cancel, not an error.
#[derive(Clone, Copy, Debug, Default)]
pub struct Selection {
    pub start: (f32, f32),
    pub end: (f32, f32),
    pub dragged: bool,
}

impl Selection {
    pub fn begin(&mut self, p: (f32, f32)) {
        self.start = p;
        self.end = p;
        self.dragged = false;
    }

    pub fn drag_to(&mut self, p: (f32, f32)) {
        self.end = p;
        self.dragged = true;
    }

    /// Normalized bounds `(x1, y1, x2, y2)` with `x1 <= x2`, `y1 <= y2`.
    pub fn normalized(&self) -> (f32, f32, f32, f32) {
        (
            self.start.0.min(self.end.0),
            self.start.1.min(self.end.1),
            self.start.0.max(self.end.0),
            self.start.1.max(self.end.1),
        )
    }

    /// Resolve the selection against a `width`×`height` image: normalize,
    /// clamp to the image bounds, round to integer pixels.  Returns
    /// `None` when no drag happened or the rounded region is degenerate
    /// (a side of 1 pixel or less) — both are treated as cancel upstream.
    pub fn resolve(&self, width: u32, height: u32) -> Option<CropRect> {
        if !self.dragged {
            return None;
        }
        let (x1, y1, x2, y2) = self.normalized();
        let x1 = x1.clamp(0.0, width as f32);
        let y1 = y1.clamp(0.0, height as f32);
        let x2 = x2.clamp(0.0, width as f32);
        let y2 = y2.clamp(0.0, height as f32);

        let w = (x2 - x1).round() as i64;
        let h = (y2 - y1).round() as i64;
        if w <= 1 || h <= 1 {
            return None;
        }

        // Keep the rounded origin + size inside the image
        let x = (x1.round() as i64).clamp(0, width as i64 - 1) as u32;
        let y = (y1.round() as i64).clamp(0, height as i64 - 1) as u32;
        let w = (w as u32).min(width - x);
        let h = (h as u32).min(height - y);
        Some(CropRect { x, y, w, h })
    }
}

/// Integer pixel region produced by [`Selection::resolve`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// Exact nearest-pixel copy of the region — no resampling, output pixel
/// `(i, j)` equals source pixel `(x + i, y + j)`.
pub fn extract(src: &RgbaImage, rect: CropRect) -> RgbaImage {
    imageops::crop_imm(src, rect.x, rect.y, rect.w, rect.h).to_image()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn gradient_image(w: u32, h: u32) -> RgbaImage {
        RgbaImage::from_fn(w, h, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
        })
    }

    fn drag(start: (f32, f32), end: (f32, f32)) -> Selection {
        let mut sel = Selection::default();
        sel.begin(start);
        sel.drag_to(end);
        sel
    }

    #[test]
    fn click_without_drag_resolves_to_none() {
        let mut sel = Selection::default();
        sel.begin((100.0, 100.0));
        assert!(sel.resolve(800, 600).is_none());
    }

    #[test]
    fn drag_direction_is_irrelevant() {
        let a = drag((100.0, 50.0), (500.0, 450.0));
        let b = drag((500.0, 450.0), (100.0, 50.0));
        assert_eq!(a.resolve(800, 600), b.resolve(800, 600));
    }

    #[test]
    fn resolve_rounds_to_exact_pixels() {
        let sel = drag((100.0, 50.0), (500.0, 450.0));
        let rect = sel.resolve(800, 600).unwrap();
        assert_eq!(
            rect,
            CropRect {
                x: 100,
                y: 50,
                w: 400,
                h: 400
            }
        );
    }

    #[test]
    fn out_of_bounds_selection_is_clamped() {
        let clamped = drag((-50.0, -50.0), (100.0, 100.0))
            .resolve(800, 600)
            .unwrap();
        let inside = drag((0.0, 0.0), (100.0, 100.0)).resolve(800, 600).unwrap();
        assert_eq!(clamped, inside);
    }

    #[test]
    fn degenerate_region_is_none() {
        assert!(drag((10.0, 10.0), (10.9, 300.0)).resolve(800, 600).is_none());
        assert!(drag((10.0, 10.0), (300.0, 11.2)).resolve(800, 600).is_none());
        // Entirely outside the image clamps to a zero-width band
        assert!(
            drag((-90.0, 10.0), (-20.0, 200.0))
                .resolve(800, 600)
                .is_none()
        );
    }

    #[test]
    fn extract_copies_pixels_exactly() {
        let src = gradient_image(800, 600);
        let rect = drag((100.0, 50.0), (500.0, 450.0))
            .resolve(800, 600)
            .unwrap();
        let out = extract(&src, rect);
        assert_eq!(out.dimensions(), (400, 400));
        assert_eq!(out.get_pixel(0, 0), src.get_pixel(100, 50));
        assert_eq!(out.get_pixel(399, 399), src.get_pixel(499, 449));
        assert_eq!(out.get_pixel(123, 45), src.get_pixel(223, 95));
    }

    #[test]
    fn fractional_corners_round_not_truncate() {
        let rect = drag((99.6, 49.6), (500.4, 450.4))
            .resolve(800, 600)
            .unwrap();
        assert_eq!(rect.x, 100);
        assert_eq!(rect.y, 50);
        assert_eq!(rect.w, 401);
        assert_eq!(rect.h, 401);
    }

    #[test]
    fn rounded_region_never_overflows_image() {
        // round(x1) + round(x2 - x1) can exceed the width without the guard
        let rect = drag((1.5, 0.0), (800.0, 600.0)).resolve(800, 600).unwrap();
        assert!(rect.x + rect.w <= 800);
        assert!(rect.y + rect.h <= 600);
        let src = gradient_image(800, 600);
        let _ = extract(&src, rect); // must not panic
    }
}
