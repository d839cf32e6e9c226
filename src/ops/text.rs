// ============================================================================
// TEXT — glyph layout + rasterization for placed text entities
// ============================================================================

use ab_glyph::{Font, FontArc, GlyphId, ScaleFont, point};
use image::{Rgba, RgbaImage};

/// Default content for a freshly placed entity (edited afterwards).
pub const DEFAULT_TEXT: &str = "Text";
/// Font size choices offered by the text toolbar.
pub const SIZE_CHOICES: &[f32] = &[12.0, 16.0, 20.0, 24.0, 32.0, 40.0, 48.0, 64.0];

/// One placed text entity.  `pos` is the baseline-left origin in content
/// coordinates (click-to-place puts the baseline at the click point).
#[derive(Clone, Debug, PartialEq)]
pub struct TextEntity {
    pub content: String,
    pub pos: (f32, f32),
    pub size: f32,
    pub color: [u8; 4],
}

/// Metrics of a laid-out entity: advance width plus font ascent/descent.
#[derive(Clone, Copy, Debug, Default)]
pub struct TextMetrics {
    pub width: f32,
    pub ascent: f32,
    pub descent: f32,
}

impl TextEntity {
    pub fn new(content: &str, pos: (f32, f32), size: f32, color: [u8; 4]) -> Self {
        Self {
            content: content.to_string(),
            pos,
            size,
            color,
        }
    }

    /// Bounding box `(x1, y1, x2, y2)` in content space.
    pub fn bounds(&self, metrics: TextMetrics) -> (f32, f32, f32, f32) {
        (
            self.pos.0,
            self.pos.1 - metrics.ascent,
            self.pos.0 + metrics.width,
            self.pos.1 + metrics.descent,
        )
    }

    pub fn contains(&self, p: (f32, f32), metrics: TextMetrics) -> bool {
        let (x1, y1, x2, y2) = self.bounds(metrics);
        p.0 >= x1 && p.0 <= x2 && p.1 >= y1 && p.1 <= y2
    }

    /// Keep the entity's box inside `[0, w] × [0, h]` — the baseline may
    /// sit anywhere that leaves the glyphs fully on the image.
    pub fn clamp_to(&mut self, extent: (u32, u32), metrics: TextMetrics) {
        let (ew, eh) = (extent.0 as f32, extent.1 as f32);
        let max_x = (ew - metrics.width).max(0.0);
        self.pos.0 = self.pos.0.clamp(0.0, max_x);
        let min_y = metrics.ascent.min(eh);
        let max_y = (eh - metrics.descent).max(min_y);
        self.pos.1 = self.pos.1.clamp(min_y, max_y);
    }
}

/// Locate a usable system font for text entities.  Absence is reported at
/// tool activation, not treated as fatal.
pub fn load_ui_font() -> Option<FontArc> {
    use font_kit::family_name::FamilyName;
    use font_kit::properties::Properties;
    use font_kit::source::SystemSource;

    let source = SystemSource::new();
    let handle = source
        .select_best_match(
            &[FamilyName::SansSerif, FamilyName::Serif],
            &Properties::new(),
        )
        .ok()?;
    let font = handle.load().ok()?;
    let bytes: Vec<u8> = (*font.copy_font_data()?).clone();
    FontArc::try_from_vec(bytes).ok()
}

/// Kerned single-line layout; returns glyph ids with x offsets from the
/// baseline-left origin, plus overall metrics.
pub fn layout(font: &FontArc, text: &str, size: f32) -> (Vec<(GlyphId, f32)>, TextMetrics) {
    let scaled = font.as_scaled(size);
    let mut glyphs = Vec::new();
    let mut cursor_x = 0.0f32;
    let mut last: Option<GlyphId> = None;

    for ch in text.chars() {
        let id = font.glyph_id(ch);
        if let Some(prev) = last {
            cursor_x += scaled.kern(prev, id);
        }
        glyphs.push((id, cursor_x));
        cursor_x += scaled.h_advance(id);
        last = Some(id);
    }

    let metrics = TextMetrics {
        width: cursor_x,
        ascent: scaled.ascent(),
        descent: -scaled.descent(),
    };
    (glyphs, metrics)
}

/// Measure without rasterizing (hit tests, clamping).
pub fn measure(font: &FontArc, text: &str, size: f32) -> TextMetrics {
    layout(font, text, size).1
}

/// Rasterized entity: an RGBA buffer plus the offset of its top-left
/// corner relative to the entity's baseline-left origin.
pub struct RasterText {
    pub buf: RgbaImage,
    pub off_x: f32,
    pub off_y: f32,
}

/// Rasterize an entity's glyphs into a tight RGBA buffer with coverage
/// anti-aliasing in the entity color.  Returns `None` for whitespace-only
/// content.
pub fn rasterize(font: &FontArc, entity: &TextEntity) -> Option<RasterText> {
    let (glyphs, _) = layout(font, &entity.content, entity.size);

    // Tight bounds over the outlined glyphs
    let mut min_x = f32::MAX;
    let mut min_y = f32::MAX;
    let mut max_x = f32::MIN;
    let mut max_y = f32::MIN;
    let mut outlined = Vec::new();
    for &(id, gx) in &glyphs {
        let glyph = id.with_scale_and_position(entity.size, point(gx, 0.0));
        if let Some(out) = font.outline_glyph(glyph) {
            let b = out.px_bounds();
            min_x = min_x.min(b.min.x);
            min_y = min_y.min(b.min.y);
            max_x = max_x.max(b.max.x);
            max_y = max_y.max(b.max.y);
            outlined.push(out);
        }
    }
    if outlined.is_empty() || min_x >= max_x || min_y >= max_y {
        return None;
    }

    let buf_w = (max_x - min_x).ceil() as u32 + 1;
    let buf_h = (max_y - min_y).ceil() as u32 + 1;
    let mut buf = RgbaImage::new(buf_w, buf_h);
    let [r, g, b, a] = entity.color;

    for out in &outlined {
        let gb = out.px_bounds();
        let gx0 = (gb.min.x - min_x) as i32;
        let gy0 = (gb.min.y - min_y) as i32;
        out.draw(|px, py, cov| {
            let x = gx0 + px as i32;
            let y = gy0 + py as i32;
            if x < 0 || y < 0 || x >= buf_w as i32 || y >= buf_h as i32 {
                return;
            }
            let dst = buf.get_pixel_mut(x as u32, y as u32);
            let cov = (cov * a as f32) as u16;
            // Max-blend overlapping glyph edges
            if cov as u8 > dst[3] {
                *dst = Rgba([r, g, b, cov as u8]);
            }
        });
    }

    Some(RasterText {
        buf,
        off_x: min_x,
        off_y: min_y,
    })
}

/// Alpha-blend an entity into `target` (used by flatten).
pub fn composite_into(target: &mut RgbaImage, font: &FontArc, entity: &TextEntity) {
    if let Some(raster) = rasterize(font, entity) {
        let x = (entity.pos.0 + raster.off_x).round() as i64;
        let y = (entity.pos.1 + raster.off_y).round() as i64;
        image::imageops::overlay(target, &raster.buf, x, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(width: f32, ascent: f32, descent: f32) -> TextMetrics {
        TextMetrics {
            width,
            ascent,
            descent,
        }
    }

    #[test]
    fn clamp_keeps_box_inside_extent() {
        let m = metrics(120.0, 20.0, 5.0);
        let mut t = TextEntity::new("hi", (-40.0, -100.0), 24.0, [255; 4]);
        t.clamp_to((800, 600), m);
        let (x1, y1, x2, y2) = t.bounds(m);
        assert!(x1 >= 0.0 && y1 >= 0.0);
        assert!(x2 <= 800.0 && y2 <= 600.0);

        let mut t = TextEntity::new("hi", (5000.0, 5000.0), 24.0, [255; 4]);
        t.clamp_to((800, 600), m);
        let (_, _, x2, y2) = t.bounds(m);
        assert!(x2 <= 800.0 && y2 <= 600.0);
    }

    #[test]
    fn clamp_survives_text_wider_than_extent() {
        let m = metrics(1000.0, 20.0, 5.0);
        let mut t = TextEntity::new("long", (30.0, 30.0), 24.0, [255; 4]);
        t.clamp_to((200, 100), m);
        assert_eq!(t.pos.0, 0.0);
    }

    #[test]
    fn hit_test_spans_ascent_to_descent() {
        let m = metrics(50.0, 20.0, 5.0);
        let t = TextEntity::new("x", (100.0, 100.0), 24.0, [255; 4]);
        assert!(t.contains((120.0, 90.0), m));
        assert!(t.contains((120.0, 104.0), m));
        assert!(!t.contains((120.0, 79.0), m));
        assert!(!t.contains((151.0, 90.0), m));
    }

    // The remaining tests exercise real glyph outlines and skip quietly on
    // systems with no fonts installed.

    #[test]
    fn measure_grows_with_content() {
        let Some(font) = load_ui_font() else { return };
        let short = measure(&font, "hi", 24.0);
        let long = measure(&font, "hello world", 24.0);
        assert!(long.width > short.width);
        assert!(short.ascent > 0.0);
    }

    #[test]
    fn rasterize_produces_visible_pixels() {
        let Some(font) = load_ui_font() else { return };
        let entity = TextEntity::new("Hello", (0.0, 0.0), 32.0, [255, 0, 0, 255]);
        let raster = rasterize(&font, &entity).expect("glyph output");
        assert!(raster.buf.pixels().any(|p| p[3] > 128));
    }

    #[test]
    fn whitespace_rasterizes_to_none() {
        let Some(font) = load_ui_font() else { return };
        let entity = TextEntity::new("   ", (0.0, 0.0), 32.0, [255; 4]);
        assert!(rasterize(&font, &entity).is_none());
    }
}
