// ============================================================================
// CANVAS — layer stack, session state, compositing
// ============================================================================
//
// The layer stack is [base, raster, crop overlay?, stickers?, texts?],
// bottom to top.  Every layer lives in the one shared content coordinate
// space and is positioned on screen through the single `Viewport`, so a
// pan/zoom update moves the whole stack together — per-layer transforms
// would drift apart.

use ab_glyph::FontArc;
use eframe::egui;
use egui::{Color32, ColorImage, Rect, Rounding, Stroke, TextureHandle, TextureOptions};
use image::{RgbaImage, imageops};

use crate::ops::adjustments::{self, ColorSettings};
use crate::ops::crop::{self, Selection};
use crate::ops::sticker::Sticker;
use crate::ops::text::TextEntity;
use crate::ops::transform::{self, Orient};
use crate::viewport::Viewport;

/// Crop selection fill (translucent blue) and border, mirrored between the
/// on-screen overlay and the flattened output.
const SELECTION_FILL: [u8; 4] = [0, 128, 255, 51];
const SELECTION_BORDER: [u8; 4] = [255, 255, 255, 255];
/// Selection border width in content units.
const SELECTION_BORDER_WIDTH: f32 = 1.5;

/// Editor session state: the base image plus everything stacked on it.
///
/// The base is immutable-until-replaced — only image load and crop-apply
/// swap it, never in-place edits.  The raster layer is the one mutable
/// pixel buffer, always sized to the content extent.
pub struct CanvasState {
    base: RgbaImage,
    pub raster: RgbaImage,
    pub stickers: Vec<Sticker>,
    pub texts: Vec<TextEntity>,
    pub color: ColorSettings,

    // Texture cache invalidation
    pub base_dirty: bool,
    pub raster_dirty: bool,
}

impl CanvasState {
    pub fn new(base: RgbaImage) -> Self {
        let (w, h) = base.dimensions();
        Self {
            base,
            raster: RgbaImage::new(w, h),
            stickers: Vec::new(),
            texts: Vec::new(),
            color: ColorSettings::default(),
            base_dirty: true,
            raster_dirty: true,
        }
    }

    pub fn base(&self) -> &RgbaImage {
        &self.base
    }

    pub fn width(&self) -> u32 {
        self.base.width()
    }

    pub fn height(&self) -> u32 {
        self.base.height()
    }

    /// Content extent — always the base image's pixel dimensions.
    pub fn extent(&self) -> (u32, u32) {
        self.base.dimensions()
    }

    /// Replace the session with a freshly loaded image: raster cleared,
    /// entities dropped, adjustments reset.  The caller resets the
    /// viewport.
    pub fn load(&mut self, base: RgbaImage) {
        *self = Self::new(base);
    }

    /// Apply a crop selection.  Returns `false` (and changes nothing) for
    /// a degenerate or missing selection — that exit is a cancel, not an
    /// error.  On success the base and raster are replaced by the exact
    /// sub-region copy, entities are shifted into the new frame, and the
    /// caller resets the viewport.
    pub fn apply_crop(&mut self, selection: &Selection) -> bool {
        let Some(rect) = selection.resolve(self.width(), self.height()) else {
            return false;
        };
        self.base = crop::extract(&self.base, rect);
        self.raster = crop::extract(&self.raster, rect);

        let extent = self.extent();
        for sticker in &mut self.stickers {
            sticker.pos.0 -= rect.x as f32;
            sticker.pos.1 -= rect.y as f32;
            sticker.clamp_to(extent);
        }
        for text in &mut self.texts {
            text.pos.0 = (text.pos.0 - rect.x as f32).clamp(0.0, extent.0 as f32);
            text.pos.1 = (text.pos.1 - rect.y as f32).clamp(0.0, extent.1 as f32);
        }

        self.base_dirty = true;
        self.raster_dirty = true;
        true
    }

    /// Whole-canvas rotate/flip: base and raster together, entity anchors
    /// remapped through the same transform.  Viewport is left alone.
    pub fn apply_orient(&mut self, orient: Orient) {
        let (w, h) = self.extent();
        self.base = transform::apply_to_image(&self.base, orient);
        self.raster = transform::apply_to_image(&self.raster, orient);

        let extent = self.extent();
        for sticker in &mut self.stickers {
            let (cx, cy) = (
                sticker.pos.0 + sticker.width / 2.0,
                sticker.pos.1 + sticker.height() / 2.0,
            );
            let (nx, ny) = orient.apply_to_point((cx, cy), w, h);
            sticker.pos = (nx - sticker.width / 2.0, ny - sticker.height() / 2.0);
            sticker.clamp_to(extent);
        }
        for text in &mut self.texts {
            let (nx, ny) = orient.apply_to_point(text.pos, w, h);
            text.pos = (
                nx.clamp(0.0, extent.0 as f32),
                ny.clamp(0.0, extent.1 as f32),
            );
        }

        self.base_dirty = true;
        self.raster_dirty = true;
    }

    /// The base layer as displayed: color adjustments applied, original
    /// pixels untouched.
    pub fn adjusted_base(&self) -> RgbaImage {
        adjustments::apply(&self.base, &self.color)
    }

    /// Flatten the full stack into one bitmap at the content extent —
    /// adjusted base, raster, stickers, texts, and any overlay still
    /// visible (an in-progress crop selection).
    pub fn flatten(&self, font: Option<&FontArc>, selection: Option<&Selection>) -> RgbaImage {
        let mut out = self.adjusted_base();
        imageops::overlay(&mut out, &self.raster, 0, 0);
        for sticker in &self.stickers {
            sticker.composite_into(&mut out);
        }
        if let Some(font) = font {
            for text in &self.texts {
                crate::ops::text::composite_into(&mut out, font, text);
            }
        }
        if let Some(sel) = selection.filter(|s| s.dragged) {
            draw_selection(&mut out, sel);
        }
        out
    }
}

/// Rasterize the crop selection rectangle (fill + border) into `img`.
fn draw_selection(img: &mut RgbaImage, sel: &Selection) {
    let (w, h) = img.dimensions();
    let (x1, y1, x2, y2) = sel.normalized();
    let bw = SELECTION_BORDER_WIDTH;

    let px1 = x1.max(0.0) as u32;
    let py1 = y1.max(0.0) as u32;
    let px2 = (x2.min(w as f32)).max(0.0) as u32;
    let py2 = (y2.min(h as f32)).max(0.0) as u32;

    for y in py1..py2 {
        for x in px1..px2 {
            let fx = x as f32 + 0.5;
            let fy = y as f32 + 0.5;
            let on_border = fx - x1 < bw || x2 - fx < bw || fy - y1 < bw || y2 - fy < bw;
            let src = if on_border {
                SELECTION_BORDER
            } else {
                SELECTION_FILL
            };
            let dst = img.get_pixel_mut(x, y);
            let a = src[3] as f32 / 255.0;
            for ch in 0..3 {
                dst[ch] = (src[ch] as f32 * a + dst[ch] as f32 * (1.0 - a)).round() as u8;
            }
            dst[3] = dst[3].max(src[3]);
        }
    }
}

// ============================================================================
// VIEW — texture cache + per-frame paint of the stack
// ============================================================================

/// Per-frame painter for the layer stack.  Owns the GPU-side texture
/// copies of the pixel layers and re-uploads them only when the matching
/// dirty flag is set, so idle frames cost nothing.
#[derive(Default)]
pub struct CanvasView {
    base_tex: Option<TextureHandle>,
    raster_tex: Option<TextureHandle>,
    /// Sticker textures, parallel to `state.stickers`.  Rebuilt when the
    /// sticker list changes shape (images themselves never mutate).
    sticker_tex: Vec<TextureHandle>,
    /// Cached text rasterizations: (entity snapshot, texture, baseline offset).
    text_tex: Vec<(TextEntity, TextureHandle, (f32, f32))>,
    /// Nearest-neighbour filtering above this zoom so pixels stay crisp.
    linear_filter: bool,
}

fn to_color_image(img: &RgbaImage) -> ColorImage {
    ColorImage::from_rgba_unmultiplied(
        [img.width() as usize, img.height() as usize],
        img.as_raw(),
    )
}

impl CanvasView {
    /// Drop every cached texture (new image loaded).
    pub fn invalidate(&mut self) {
        *self = Self::default();
    }

    fn texture_options(&self) -> TextureOptions {
        if self.linear_filter {
            TextureOptions::LINEAR
        } else {
            TextureOptions::NEAREST
        }
    }

    /// Paint the full stack into `canvas_rect`.  `selection` is the crop
    /// overlay when the crop tool is selecting; `selected_sticker` /
    /// `selected_text` get an accent outline.
    #[allow(clippy::too_many_arguments)]
    pub fn paint(
        &mut self,
        ctx: &egui::Context,
        painter: &egui::Painter,
        canvas_rect: Rect,
        viewport: &Viewport,
        state: &mut CanvasState,
        font: Option<&FontArc>,
        selection: Option<&Selection>,
        selected_sticker: Option<usize>,
        selected_text: Option<usize>,
    ) {
        // Filter switch forces a re-upload of the pixel layers
        let want_linear = viewport.scale < 3.0;
        if want_linear != self.linear_filter {
            self.linear_filter = want_linear;
            state.base_dirty = true;
            state.raster_dirty = true;
        }

        if state.base_dirty || self.base_tex.is_none() {
            let adjusted = state.adjusted_base();
            self.base_tex = Some(ctx.load_texture(
                "layer.base",
                to_color_image(&adjusted),
                self.texture_options(),
            ));
            state.base_dirty = false;
        }
        if state.raster_dirty || self.raster_tex.is_none() {
            self.raster_tex = Some(ctx.load_texture(
                "layer.raster",
                to_color_image(&state.raster),
                self.texture_options(),
            ));
            state.raster_dirty = false;
        }

        let origin = canvas_rect.min.to_vec2();
        let (w, h) = state.extent();
        let image_rect = viewport.content_rect(w, h).translate(origin);
        let uv = Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0));

        // Bottom to top: base, raster
        if let Some(tex) = &self.base_tex {
            painter.image(tex.id(), image_rect, uv, Color32::WHITE);
        }
        if let Some(tex) = &self.raster_tex {
            painter.image(tex.id(), image_rect, uv, Color32::WHITE);
        }

        // Crop overlay sits above the raster, below stickers/text
        if let Some(sel) = selection.filter(|s| s.dragged) {
            let (x1, y1, x2, y2) = sel.normalized();
            let rect = Rect::from_min_max(
                viewport.to_screen(egui::pos2(x1, y1)) + origin,
                viewport.to_screen(egui::pos2(x2, y2)) + origin,
            );
            painter.rect_filled(
                rect,
                Rounding::ZERO,
                Color32::from_rgba_unmultiplied(
                    SELECTION_FILL[0],
                    SELECTION_FILL[1],
                    SELECTION_FILL[2],
                    SELECTION_FILL[3],
                ),
            );
            painter.rect_stroke(
                rect,
                Rounding::ZERO,
                Stroke::new(SELECTION_BORDER_WIDTH * viewport.scale, Color32::WHITE),
            );
        }

        // Stickers
        if self.sticker_tex.len() != state.stickers.len() {
            self.sticker_tex = state
                .stickers
                .iter()
                .enumerate()
                .map(|(i, s)| {
                    ctx.load_texture(
                        format!("layer.sticker.{}", i),
                        to_color_image(&s.image),
                        TextureOptions::LINEAR,
                    )
                })
                .collect();
        }
        for (i, (sticker, tex)) in state.stickers.iter().zip(&self.sticker_tex).enumerate() {
            let (x1, y1, x2, y2) = sticker.bounds();
            let rect = Rect::from_min_max(
                viewport.to_screen(egui::pos2(x1, y1)) + origin,
                viewport.to_screen(egui::pos2(x2, y2)) + origin,
            );
            painter.image(tex.id(), rect, uv, Color32::WHITE);
            if selected_sticker == Some(i) {
                painter.rect_stroke(
                    rect,
                    Rounding::ZERO,
                    Stroke::new(1.5, Color32::from_rgb(66, 133, 244)),
                );
            }
        }

        // Text entities
        if let Some(font) = font {
            self.sync_text_textures(ctx, font, &state.texts);
            for (i, (entity, tex, (off_x, off_y))) in self.text_tex.iter().enumerate() {
                let top_left = egui::pos2(entity.pos.0 + off_x, entity.pos.1 + off_y);
                let size = tex.size_vec2() * viewport.scale;
                let rect =
                    Rect::from_min_size(viewport.to_screen(top_left) + origin, size);
                painter.image(tex.id(), rect, uv, Color32::WHITE);
                if selected_text == Some(i) {
                    painter.rect_stroke(
                        rect.expand(2.0),
                        Rounding::ZERO,
                        Stroke::new(1.5, Color32::from_rgb(66, 133, 244)),
                    );
                }
            }
        }
    }

    /// Rebuild cached text rasterizations for entities that changed.
    fn sync_text_textures(&mut self, ctx: &egui::Context, font: &FontArc, texts: &[TextEntity]) {
        let mut rebuilt = Vec::with_capacity(texts.len());
        for entity in texts {
            // Position changes don't invalidate the raster, only content/size/color
            let reuse = self.text_tex.iter().position(|(cached, _, _)| {
                cached.content == entity.content
                    && cached.size == entity.size
                    && cached.color == entity.color
            });
            if let Some(idx) = reuse {
                let (_, tex, off) = self.text_tex.remove(idx);
                rebuilt.push((entity.clone(), tex, off));
                continue;
            }
            if let Some(raster) = crate::ops::text::rasterize(font, entity) {
                let tex = ctx.load_texture(
                    "layer.text",
                    to_color_image(&raster.buf),
                    TextureOptions::LINEAR,
                );
                rebuilt.push((entity.clone(), tex, (raster.off_x, raster.off_y)));
            }
        }
        self.text_tex = rebuilt;
    }
}
