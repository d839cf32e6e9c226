//! Viewport transform — the single pan/zoom model shared by every layer.
//!
//! All layers (base image, paint raster, crop overlay, stickers, text) are
//! positioned through this one transform, so a pan or zoom update repaints
//! the whole stack consistently.  Screen points here are relative to the
//! canvas panel origin; content points are in the base image's pixel grid.
//!
//! The mapping is translate-then-scale with the pivot folded into the pan:
//! `screen = pan + content * scale`.

use egui::{Pos2, Rect, Vec2};

/// Minimum uniform zoom scale.
pub const MIN_SCALE: f32 = 0.05;
/// Maximum uniform zoom scale.
pub const MAX_SCALE: f32 = 20.0;
/// Zoom factor for one scroll-up tick.
pub const ZOOM_TICK_IN: f32 = 1.1;
/// Zoom factor for one scroll-down tick.
pub const ZOOM_TICK_OUT: f32 = 0.9;

/// Pan offset (unscaled, screen space) plus uniform zoom scale.
///
/// Mutated only by the pan-drag and zoom-scroll paths in `app.rs`, and
/// reset to identity whenever the base image is replaced (load, crop).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub pan: Vec2,
    pub scale: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            pan: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

impl Viewport {
    /// Identity transform: `{pan: (0,0), scale: 1}`.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Map a screen-space point (panel-relative) to content space.
    pub fn to_content(&self, screen: Pos2) -> Pos2 {
        Pos2::new(
            (screen.x - self.pan.x) / self.scale,
            (screen.y - self.pan.y) / self.scale,
        )
    }

    /// Map a content-space point to screen space (panel-relative).
    pub fn to_screen(&self, content: Pos2) -> Pos2 {
        Pos2::new(
            content.x * self.scale + self.pan.x,
            content.y * self.scale + self.pan.y,
        )
    }

    /// Screen rect covered by a content extent of `(w, h)` pixels.
    pub fn content_rect(&self, w: u32, h: u32) -> Rect {
        Rect::from_min_max(
            self.to_screen(Pos2::ZERO),
            self.to_screen(Pos2::new(w as f32, h as f32)),
        )
    }

    /// Free panning — `startPan + pointer delta`, no bounds.
    pub fn pan_by(&mut self, delta: Vec2) {
        self.pan += delta;
    }

    /// Zoom by `factor` while keeping the content point under `anchor`
    /// visually fixed.  The resulting scale is clamped to
    /// [`MIN_SCALE`, `MAX_SCALE`]; the pan correction uses the *actual*
    /// applied factor so the invariant holds at the clamp edges too.
    pub fn zoom_at(&mut self, anchor: Pos2, factor: f32) {
        let pivot = self.to_content(anchor);
        self.scale = (self.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        // Re-solve pan so `pivot` lands back on `anchor` at the new scale.
        self.pan = anchor.to_vec2() - pivot.to_vec2() * self.scale;
    }

    /// One discrete scroll tick: up zooms in, down zooms out.
    pub fn zoom_tick(&mut self, anchor: Pos2, scroll_up: bool) {
        let factor = if scroll_up { ZOOM_TICK_IN } else { ZOOM_TICK_OUT };
        self.zoom_at(anchor, factor);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_pos_eq(a: Pos2, b: Pos2) {
        assert!(
            (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3,
            "{:?} != {:?}",
            a,
            b
        );
    }

    #[test]
    fn round_trip_screen_content() {
        let mut vp = Viewport::default();
        vp.pan = Vec2::new(-37.5, 12.0);
        vp.scale = 2.4;
        let p = Pos2::new(140.0, 260.0);
        assert_pos_eq(vp.to_screen(vp.to_content(p)), p);
        let c = Pos2::new(10.0, 99.0);
        assert_pos_eq(vp.to_content(vp.to_screen(c)), c);
    }

    #[test]
    fn zoom_to_cursor_keeps_point_fixed() {
        let anchors = [
            Pos2::new(0.0, 0.0),
            Pos2::new(400.0, 300.0),
            Pos2::new(-25.0, 712.5),
        ];
        let factors = [1.1, 0.9, 2.0, 0.5];
        let mut vp = Viewport {
            pan: Vec2::new(55.0, -90.0),
            scale: 1.7,
        };
        for &anchor in &anchors {
            for &factor in &factors {
                let before = vp.to_content(anchor);
                vp.zoom_at(anchor, factor);
                let after = vp.to_content(anchor);
                assert_pos_eq(before, after);
            }
        }
    }

    #[test]
    fn zoom_to_cursor_holds_at_clamp_edge() {
        let mut vp = Viewport::default();
        vp.scale = 19.5;
        let anchor = Pos2::new(123.0, 45.0);
        let before = vp.to_content(anchor);
        vp.zoom_at(anchor, 1.1); // clamps at 20.0, actual factor < 1.1
        assert_eq!(vp.scale, MAX_SCALE);
        assert_pos_eq(before, vp.to_content(anchor));
    }

    #[test]
    fn pan_is_linear() {
        let mut a = Viewport::default();
        a.pan_by(Vec2::new(3.0, -7.0));
        a.pan_by(Vec2::new(11.5, 2.25));
        let mut b = Viewport::default();
        b.pan_by(Vec2::new(14.5, -4.75));
        assert_eq!(a, b);
    }

    #[test]
    fn repeated_ticks_respect_scale_bounds() {
        let mut vp = Viewport::default();
        for _ in 0..200 {
            vp.zoom_tick(Pos2::new(50.0, 50.0), true);
        }
        assert!(vp.scale <= MAX_SCALE);
        for _ in 0..500 {
            vp.zoom_tick(Pos2::new(50.0, 50.0), false);
        }
        assert!(vp.scale >= MIN_SCALE);
    }

    #[test]
    fn reset_restores_identity() {
        let mut vp = Viewport {
            pan: Vec2::new(9.0, 9.0),
            scale: 4.0,
        };
        vp.reset();
        assert_eq!(vp.pan, Vec2::ZERO);
        assert_eq!(vp.scale, 1.0);
        assert_pos_eq(vp.to_content(Pos2::new(33.0, 44.0)), Pos2::new(33.0, 44.0));
    }

    #[test]
    fn content_rect_tracks_extent() {
        let vp = Viewport {
            pan: Vec2::new(10.0, 20.0),
            scale: 2.0,
        };
        let r = vp.content_rect(800, 600);
        assert_eq!(r.min, Pos2::new(10.0, 20.0));
        assert_eq!(r.max, Pos2::new(1610.0, 1220.0));
    }
}
