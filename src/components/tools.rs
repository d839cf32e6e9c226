// ============================================================================
// TOOLS — activation state, mutual exclusion, per-tool session state
// ============================================================================
//
// Exactly one interactive tool owns pointer input at any time.  The
// manager holds the single active `ToolKind` and derives the pan-enabled
// flag from it — tools never enable or disable panning themselves, so
// there is no per-tool enable/disable pairing to get out of sync.

use ab_glyph::FontArc;
use egui::Color32;

use crate::ops::crop::Selection;

/// The at-most-one active interactive tool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ToolKind {
    #[default]
    None,
    Paint,
    Erase,
    Crop,
    Rotate,
    Flip,
    ColorAdjust,
    Sticker,
    Text,
}

impl ToolKind {
    pub fn label(&self) -> &'static str {
        match self {
            ToolKind::None => "Pan",
            ToolKind::Paint => "Brush",
            ToolKind::Erase => "Eraser",
            ToolKind::Crop => "Crop",
            ToolKind::Rotate => "Rotate",
            ToolKind::Flip => "Flip",
            ToolKind::ColorAdjust => "Colors",
            ToolKind::Sticker => "Stickers",
            ToolKind::Text => "Text",
        }
    }

    /// Tools shown in the tool strip, in order.
    pub fn all() -> &'static [ToolKind] {
        &[
            ToolKind::Paint,
            ToolKind::Erase,
            ToolKind::Crop,
            ToolKind::Rotate,
            ToolKind::Flip,
            ToolKind::ColorAdjust,
            ToolKind::Sticker,
            ToolKind::Text,
        ]
    }
}

/// Brush settings — persist for the whole session, not per activation.
pub struct BrushState {
    pub color: Color32,
    pub size: f32,
}

impl Default for BrushState {
    fn default() -> Self {
        Self {
            color: Color32::RED,
            size: 6.0,
        }
    }
}

/// Eraser settings.
pub struct EraseState {
    pub size: f32,
}

impl Default for EraseState {
    fn default() -> Self {
        Self { size: 20.0 }
    }
}

/// Crop tool state: `selection` is `Some` from the first pointer-down in
/// crop mode until apply/cancel.
#[derive(Default)]
pub struct CropState {
    pub selection: Option<Selection>,
}

/// Sticker tool state.
#[derive(Default)]
pub struct StickerState {
    pub selected: Option<usize>,
    pub preset: usize,
    /// Content-space pointer position at the last drag event.
    pub drag_anchor: Option<(f32, f32)>,
}

/// Text tool state.  The font is resolved once per session; a lookup
/// failure is remembered so activation reports it once instead of
/// retrying every frame.
pub struct TextState {
    pub selected: Option<usize>,
    pub size_choice: usize,
    pub color: Color32,
    /// Waiting for a click-to-place after "Add".
    pub placing: bool,
    /// Entity index being edited plus the edit buffer.
    pub editing: Option<(usize, String)>,
    pub drag_anchor: Option<(f32, f32)>,
    pub font: Option<FontArc>,
    pub font_lookup_failed: bool,
}

impl Default for TextState {
    fn default() -> Self {
        Self {
            selected: None,
            size_choice: 3, // 24 pt
            color: Color32::BLACK,
            placing: false,
            editing: None,
            drag_anchor: None,
            font: None,
            font_lookup_failed: false,
        }
    }
}

/// Owns tool activation and the pan-disable contract.
#[derive(Default)]
pub struct ToolManager {
    active: ToolKind,
    pub brush: BrushState,
    pub erase: EraseState,
    pub crop: CropState,
    pub sticker: StickerState,
    pub text: TextState,
}

impl ToolManager {
    pub fn active(&self) -> ToolKind {
        self.active
    }

    /// Viewport panning is owned by exactly one party: it is enabled iff
    /// no tool is active.
    pub fn pan_enabled(&self) -> bool {
        self.active == ToolKind::None
    }

    /// Toggle a tool: activating it deactivates whatever else was active
    /// (paint/erase exclusivity, sticker/text hiding the edit toolbars —
    /// all covered by the single-active invariant); clicking the active
    /// tool again returns to `None`.  With no image loaded every
    /// activation is a no-op.
    pub fn toggle(&mut self, kind: ToolKind, has_image: bool) {
        if !has_image {
            return;
        }
        let next = if self.active == kind {
            ToolKind::None
        } else {
            kind
        };
        self.set_active(next);
    }

    /// Force-deactivate the current tool (crop apply/cancel, image load).
    pub fn deactivate(&mut self) {
        self.set_active(ToolKind::None);
    }

    fn set_active(&mut self, next: ToolKind) {
        if self.active == next {
            return;
        }
        // Leaving a tool runs its cleanup regardless of which exit path
        // triggered the switch.
        match self.active {
            ToolKind::Crop => self.crop.selection = None,
            ToolKind::Sticker => {
                self.sticker.selected = None;
                self.sticker.drag_anchor = None;
            }
            ToolKind::Text => {
                self.text.selected = None;
                self.text.placing = false;
                self.text.editing = None;
                self.text.drag_anchor = None;
            }
            _ => {}
        }
        self.active = next;
        if next == ToolKind::Crop {
            // Entering crop always starts with a clean overlay
            self.crop.selection = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_tool_activates_without_an_image() {
        let mut mgr = ToolManager::default();
        for &kind in ToolKind::all() {
            mgr.toggle(kind, false);
            assert_eq!(mgr.active(), ToolKind::None);
            assert!(mgr.pan_enabled());
        }
    }

    #[test]
    fn activating_paint_hides_erase() {
        let mut mgr = ToolManager::default();
        mgr.toggle(ToolKind::Erase, true);
        assert_eq!(mgr.active(), ToolKind::Erase);
        mgr.toggle(ToolKind::Paint, true);
        assert_eq!(mgr.active(), ToolKind::Paint);
        assert!(!mgr.pan_enabled());
    }

    #[test]
    fn pan_disabled_while_any_tool_active_and_restored_after() {
        let mut mgr = ToolManager::default();
        for &kind in ToolKind::all() {
            mgr.toggle(kind, true);
            assert!(!mgr.pan_enabled(), "{:?}", kind);
            mgr.toggle(kind, true); // toggle off
            assert!(mgr.pan_enabled(), "{:?}", kind);
        }
    }

    #[test]
    fn switching_tools_never_double_counts_pan() {
        let mut mgr = ToolManager::default();
        // Rapid switches between tools; a refcount-style bug would leave
        // pan disabled at the end.
        mgr.toggle(ToolKind::Paint, true);
        mgr.toggle(ToolKind::Erase, true);
        mgr.toggle(ToolKind::Sticker, true);
        mgr.toggle(ToolKind::Text, true);
        mgr.toggle(ToolKind::Text, true);
        assert_eq!(mgr.active(), ToolKind::None);
        assert!(mgr.pan_enabled());
    }

    #[test]
    fn leaving_crop_clears_the_selection() {
        let mut mgr = ToolManager::default();
        mgr.toggle(ToolKind::Crop, true);
        let mut sel = Selection::default();
        sel.begin((10.0, 10.0));
        sel.drag_to((50.0, 50.0));
        mgr.crop.selection = Some(sel);

        mgr.toggle(ToolKind::Paint, true); // any exit path
        assert!(mgr.crop.selection.is_none());

        // Re-entering starts clean too
        mgr.crop.selection = Some(sel);
        mgr.toggle(ToolKind::Crop, true);
        assert!(mgr.crop.selection.is_none());
    }

    #[test]
    fn tool_settings_persist_across_reactivation() {
        let mut mgr = ToolManager::default();
        mgr.toggle(ToolKind::Paint, true);
        mgr.brush.size = 17.0;
        mgr.toggle(ToolKind::Paint, true);
        mgr.toggle(ToolKind::Paint, true);
        assert_eq!(mgr.brush.size, 17.0);
    }
}
