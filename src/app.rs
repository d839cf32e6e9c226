// ============================================================================
// APP SHELL — menus, tool strip, canvas input routing
// ============================================================================
//
// All pointer/scroll routing happens here, once per frame, on the one UI
// thread.  The `ToolManager` arbitrates which tool receives canvas events;
// the viewport only pans while no tool is active.

use eframe::egui;
use egui::{Color32, CursorIcon, Pos2, Rect, Sense, TextureHandle, TextureOptions, Vec2};
use image::RgbaImage;

use crate::assets::{self, StickerPreset};
use crate::canvas::{CanvasState, CanvasView};
use crate::components::tools::{ToolKind, ToolManager};
use crate::ops::crop::Selection;
use crate::ops::sticker::Sticker;
use crate::ops::text::{self, TextEntity};
use crate::ops::transform::Orient;
use crate::ops::{adjustments, paint};
use crate::viewport::Viewport;
use crate::{io, log_err, log_info, log_warn};

/// Screen-corner offset for the floating tool toolbars, in points.
const TOOLBAR_OFFSET: (f32, f32) = (20.0, 20.0);

pub struct RetouchApp {
    state: Option<CanvasState>,
    viewport: Viewport,
    view: CanvasView,
    tools: ToolManager,

    /// Eraser pointer glyph, validated at startup.  `None` means the
    /// bundled asset failed to decode (a configuration error, logged
    /// once); the erase tool then falls back to the crosshair cursor.
    eraser_glyph: Option<RgbaImage>,
    eraser_glyph_tex: Option<TextureHandle>,

    /// One-line user-facing report of the last action or failure.
    status: String,
    /// Last content-space point of an in-progress paint stroke.
    stroke_last: Option<(f32, f32)>,
    /// Canvas rect of the previous frame, for menu-driven zoom anchoring.
    last_canvas_rect: Option<Rect>,
}

impl RetouchApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let eraser_glyph = match assets::eraser_cursor() {
            Ok(img) => Some(img),
            Err(e) => {
                log_err!("startup: {}", e);
                None
            }
        };
        Self {
            state: None,
            viewport: Viewport::default(),
            view: CanvasView::default(),
            tools: ToolManager::default(),
            eraser_glyph,
            eraser_glyph_tex: None,
            status: "Open an image to start editing".to_string(),
            stroke_last: None,
            last_canvas_rect: None,
        }
    }

    fn has_image(&self) -> bool {
        self.state.as_ref().is_some_and(|s| {
            let (w, h) = s.extent();
            w > 0 && h > 0
        })
    }

    // -- session actions ----------------------------------------------------

    fn open_image(&mut self) {
        let Some(path) = io::pick_image_to_open() else {
            return;
        };
        match io::load_image(&path) {
            Ok(img) => {
                let (w, h) = img.dimensions();
                match &mut self.state {
                    Some(state) => state.load(img),
                    None => self.state = Some(CanvasState::new(img)),
                }
                // Full reset: identity transform, fresh textures, no tool
                self.viewport.reset();
                self.view.invalidate();
                self.tools.deactivate();
                self.stroke_last = None;
                self.status = format!("Loaded {} ({}×{})", path.display(), w, h);
                log_info!("loaded {} ({}x{})", path.display(), w, h);
            }
            Err(e) => {
                // Decode failure must not disturb the current session
                self.status = e.clone();
                log_err!("open: {}", e);
            }
        }
    }

    fn export_image(&mut self) {
        let Some(state) = &self.state else {
            self.status = "Nothing to export — no image loaded".to_string();
            return;
        };
        let Some(requested) = io::pick_export_target() else {
            return;
        };
        let selection = if self.tools.active() == ToolKind::Crop {
            self.tools.crop.selection
        } else {
            None
        };
        let flat = state.flatten(self.tools.text.font.as_ref(), selection.as_ref());
        match io::export_image(&flat, &requested) {
            Ok(path) => {
                self.status = format!("Exported {}", path.display());
                log_info!("exported {}", path.display());
            }
            Err(e) => {
                // Edits stay intact so the user can retry
                self.status = e.clone();
                log_err!("export: {}", e);
            }
        }
    }

    fn zoom_step(&mut self, zoom_in: bool) {
        let anchor = self
            .last_canvas_rect
            .map(|r| (r.center() - r.min).to_pos2())
            .unwrap_or(Pos2::ZERO);
        self.viewport.zoom_tick(anchor, zoom_in);
    }

    // -- chrome -------------------------------------------------------------

    fn menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menubar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open…").clicked() {
                        ui.close_menu();
                        self.open_image();
                    }
                    if ui.button("Export…").clicked() {
                        ui.close_menu();
                        self.export_image();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
                ui.menu_button("View", |ui| {
                    if ui.button("Zoom in").clicked() {
                        ui.close_menu();
                        self.zoom_step(true);
                    }
                    if ui.button("Zoom out").clicked() {
                        ui.close_menu();
                        self.zoom_step(false);
                    }
                    if ui.button("Reset view").clicked() {
                        ui.close_menu();
                        self.viewport.reset();
                    }
                });
            });
        });
    }

    fn tool_strip(&mut self, ctx: &egui::Context) {
        let has_image = self.has_image();
        egui::TopBottomPanel::top("toolstrip").show(ctx, |ui| {
            ui.horizontal(|ui| {
                for &kind in ToolKind::all() {
                    let selected = self.tools.active() == kind;
                    if ui.selectable_label(selected, kind.label()).clicked() {
                        if has_image {
                            self.tools.toggle(kind, true);
                        } else {
                            // Guarded invariant, not a user error
                            self.status = "Load an image first".to_string();
                            log_warn!("{:?} activation ignored: no image", kind);
                        }
                    }
                }
            });
        });
    }

    fn status_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("statusbar").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(&self.status);
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(format!("{:.0}%", self.viewport.scale * 100.0));
                    if let Some(state) = &self.state {
                        let (w, h) = state.extent();
                        ui.label(format!("{}×{}", w, h));
                    }
                });
            });
        });
    }

    // -- canvas -------------------------------------------------------------

    fn canvas_panel(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default()
            .frame(egui::Frame::none().fill(Color32::from_gray(28)))
            .show(ctx, |ui| {
                let rect = ui.available_rect_before_wrap();
                self.last_canvas_rect = Some(rect);
                let response = ui.allocate_rect(rect, Sense::click_and_drag());

                if self.state.is_some() {
                    self.route_scroll(ctx, &response, rect);
                    self.route_pointer(ctx, &response, rect);

                    let font = self.tools.text.font.clone();
                    let selection = if self.tools.active() == ToolKind::Crop {
                        self.tools.crop.selection
                    } else {
                        None
                    };
                    let selected_sticker = self.tools.sticker.selected;
                    let selected_text = self.tools.text.selected;
                    let painter = ui.painter_at(rect);
                    if let Some(state) = &mut self.state {
                        self.view.paint(
                            ctx,
                            &painter,
                            rect,
                            &self.viewport,
                            state,
                            font.as_ref(),
                            selection.as_ref(),
                            selected_sticker,
                            selected_text,
                        );
                    }
                    self.draw_eraser_glyph(ctx, &painter, &response);
                } else {
                    ui.painter().text(
                        rect.center(),
                        egui::Align2::CENTER_CENTER,
                        "Drop nothing here — use File ▸ Open…",
                        egui::FontId::proportional(18.0),
                        Color32::from_gray(120),
                    );
                }

                self.active_toolbar(ctx, rect);
            });
    }

    /// Pointer position in content space, if the pointer is interacting.
    fn interact_content_pos(
        viewport: &Viewport,
        response: &egui::Response,
        rect: Rect,
    ) -> Option<(f32, f32)> {
        response.interact_pointer_pos().map(|p| {
            let rel = p - rect.min;
            let c = viewport.to_content(Pos2::new(rel.x, rel.y));
            (c.x, c.y)
        })
    }

    fn route_scroll(&mut self, ctx: &egui::Context, response: &egui::Response, rect: Rect) {
        if !response.hovered() {
            return;
        }
        let scroll_y = ctx.input(|i| i.scroll_delta.y);
        if scroll_y.abs() < 0.1 {
            return;
        }
        let hover = response.hover_pos().unwrap_or_else(|| rect.center());
        let rel = hover - rect.min;
        let content = self.viewport.to_content(rel.to_pos2());

        // Scroll over the selected sticker scales it; everywhere else the
        // shared viewport zooms toward the cursor.
        if self.tools.active() == ToolKind::Sticker
            && let Some(state) = &mut self.state
            && let Some(idx) = self.tools.sticker.selected
        {
            let extent = state.extent();
            if let Some(sticker) = state.stickers.get_mut(idx)
                && sticker.contains((content.x, content.y))
            {
                let factor = if scroll_y > 0.0 { 1.1 } else { 0.9 };
                sticker.scale_by(factor, extent);
                return;
            }
        }

        self.viewport.zoom_tick(rel.to_pos2(), scroll_y > 0.0);
    }

    fn route_pointer(&mut self, ctx: &egui::Context, response: &egui::Response, rect: Rect) {
        match self.tools.active() {
            ToolKind::None => {
                // Free panning: startPan + pointer delta, unclamped
                if response.dragged() {
                    self.viewport.pan_by(response.drag_delta());
                    ctx.set_cursor_icon(CursorIcon::Grabbing);
                }
            }
            ToolKind::Paint => self.pointer_paint(response, rect),
            ToolKind::Erase => self.pointer_erase(ctx, response, rect),
            ToolKind::Crop => self.pointer_crop(ctx, response, rect),
            ToolKind::Sticker => self.pointer_sticker(response, rect),
            ToolKind::Text => self.pointer_text(response, rect),
            // Rotate/Flip/ColorAdjust act through their toolbars only
            _ => {}
        }
    }

    fn pointer_paint(&mut self, response: &egui::Response, rect: Rect) {
        let Some(state) = &mut self.state else { return };
        if response.drag_started() || response.dragged() || response.clicked() {
            if let Some(p) = response.interact_pointer_pos() {
                let rel = p - rect.min;
                let c = self.viewport.to_content(rel.to_pos2());
                let cur = (c.x, c.y);
                let from = self.stroke_last.unwrap_or(cur);
                let col = self.tools.brush.color;
                paint::stroke_segment(
                    &mut state.raster,
                    from,
                    cur,
                    [col.r(), col.g(), col.b(), col.a()],
                    self.tools.brush.size,
                );
                state.raster_dirty = true;
                self.stroke_last = Some(cur);
            }
        }
        if response.drag_released() || response.clicked() {
            // Stroke finalized — it is raster now, not re-editable
            self.stroke_last = None;
        }
    }

    fn pointer_erase(&mut self, ctx: &egui::Context, response: &egui::Response, rect: Rect) {
        if self.eraser_glyph.is_some() {
            // Glyph is drawn at the pointer instead of the hardware cursor
            if response.hovered() {
                ctx.set_cursor_icon(CursorIcon::None);
            }
        } else {
            ctx.set_cursor_icon(CursorIcon::Crosshair);
        }
        let Some(state) = &mut self.state else { return };
        if response.drag_started() || response.dragged() || response.clicked() {
            if let Some(p) = Self::interact_content_pos(&self.viewport, response, rect) {
                paint::erase_square(&mut state.raster, p, self.tools.erase.size);
                state.raster_dirty = true;
            }
        }
    }

    fn pointer_crop(&mut self, ctx: &egui::Context, response: &egui::Response, rect: Rect) {
        ctx.set_cursor_icon(CursorIcon::Crosshair);
        if response.drag_started() {
            if let Some(p) = Self::interact_content_pos(&self.viewport, response, rect) {
                let mut sel = Selection::default();
                sel.begin(p);
                self.tools.crop.selection = Some(sel);
            }
        } else if response.dragged() {
            if let (Some(p), Some(sel)) = (
                Self::interact_content_pos(&self.viewport, response, rect),
                self.tools.crop.selection.as_mut(),
            ) {
                sel.drag_to(p);
            }
        }
        // Pointer-up mutates nothing: only the explicit Apply commits
    }

    fn pointer_sticker(&mut self, response: &egui::Response, rect: Rect) {
        let Some(state) = &mut self.state else { return };
        let extent = state.extent();

        if response.drag_started() || response.clicked() {
            if let Some(p) = Self::interact_content_pos(&self.viewport, response, rect) {
                // Topmost sticker under the pointer wins
                self.tools.sticker.selected = state
                    .stickers
                    .iter()
                    .rposition(|s| s.contains(p));
                self.tools.sticker.drag_anchor = Some(p);
            }
        } else if response.dragged() {
            if let (Some(p), Some(anchor), Some(idx)) = (
                Self::interact_content_pos(&self.viewport, response, rect),
                self.tools.sticker.drag_anchor,
                self.tools.sticker.selected,
            ) && let Some(sticker) = state.stickers.get_mut(idx)
            {
                sticker.drag_by((p.0 - anchor.0, p.1 - anchor.1), extent);
                self.tools.sticker.drag_anchor = Some(p);
            }
        } else if response.drag_released() {
            self.tools.sticker.drag_anchor = None;
        }
    }

    fn pointer_text(&mut self, response: &egui::Response, rect: Rect) {
        let Some(state) = &mut self.state else { return };
        let Some(font) = self.tools.text.font.clone() else {
            return;
        };
        let extent = state.extent();

        if response.clicked() {
            if let Some(p) = Self::interact_content_pos(&self.viewport, response, rect) {
                if self.tools.text.placing {
                    let size = text::SIZE_CHOICES[self.tools.text.size_choice];
                    let col = self.tools.text.color;
                    let mut entity = TextEntity::new(
                        text::DEFAULT_TEXT,
                        p,
                        size,
                        [col.r(), col.g(), col.b(), col.a()],
                    );
                    let metrics = text::measure(&font, &entity.content, entity.size);
                    // Clicks outside the image place nothing
                    if p.0 >= 0.0
                        && p.1 >= 0.0
                        && p.0 <= extent.0 as f32
                        && p.1 <= extent.1 as f32
                    {
                        entity.clamp_to(extent, metrics);
                        state.texts.push(entity);
                        self.tools.text.selected = Some(state.texts.len() - 1);
                    }
                    self.tools.text.placing = false;
                } else {
                    self.tools.text.selected = state.texts.iter().rposition(|t| {
                        t.contains(p, text::measure(&font, &t.content, t.size))
                    });
                }
            }
        }
        if response.double_clicked()
            && let Some(idx) = self.tools.text.selected
            && let Some(entity) = state.texts.get(idx)
        {
            self.tools.text.editing = Some((idx, entity.content.clone()));
        }
        if response.drag_started() {
            if let Some(p) = Self::interact_content_pos(&self.viewport, response, rect) {
                self.tools.text.drag_anchor = Some(p);
            }
        } else if response.dragged() {
            if let (Some(p), Some(anchor), Some(idx)) = (
                Self::interact_content_pos(&self.viewport, response, rect),
                self.tools.text.drag_anchor,
                self.tools.text.selected,
            ) && let Some(entity) = state.texts.get_mut(idx)
            {
                entity.pos.0 += p.0 - anchor.0;
                entity.pos.1 += p.1 - anchor.1;
                let metrics = text::measure(&font, &entity.content, entity.size);
                entity.clamp_to(extent, metrics);
                self.tools.text.drag_anchor = Some(p);
            }
        } else if response.drag_released() {
            self.tools.text.drag_anchor = None;
        }
    }

    fn draw_eraser_glyph(
        &mut self,
        ctx: &egui::Context,
        painter: &egui::Painter,
        response: &egui::Response,
    ) {
        if self.tools.active() != ToolKind::Erase || !response.hovered() {
            return;
        }
        let Some(glyph) = &self.eraser_glyph else { return };
        let Some(pos) = response.hover_pos() else { return };
        let tex = self.eraser_glyph_tex.get_or_insert_with(|| {
            let img = egui::ColorImage::from_rgba_unmultiplied(
                [glyph.width() as usize, glyph.height() as usize],
                glyph.as_raw(),
            );
            ctx.load_texture("cursor.eraser", img, TextureOptions::LINEAR)
        });
        let size = tex.size_vec2();
        painter.image(
            tex.id(),
            Rect::from_min_size(pos, size),
            Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            Color32::WHITE,
        );
    }

    // -- floating toolbars --------------------------------------------------

    fn active_toolbar(&mut self, ctx: &egui::Context, canvas_rect: Rect) {
        match self.tools.active() {
            ToolKind::Paint => self.brush_toolbar(ctx, canvas_rect),
            ToolKind::Erase => self.erase_toolbar(ctx, canvas_rect),
            ToolKind::Crop => self.crop_toolbar(ctx, canvas_rect),
            ToolKind::Rotate => self.rotate_toolbar(ctx, canvas_rect),
            ToolKind::Flip => self.flip_toolbar(ctx, canvas_rect),
            ToolKind::ColorAdjust => self.color_toolbar(ctx, canvas_rect),
            ToolKind::Sticker => self.sticker_toolbar(ctx, canvas_rect),
            ToolKind::Text => {
                self.text_toolbar(ctx, canvas_rect);
                self.text_edit_window(ctx);
            }
            ToolKind::None => {}
        }
    }

    fn toolbar_area<R>(
        ctx: &egui::Context,
        id: &str,
        canvas_rect: Rect,
        add_contents: impl FnOnce(&mut egui::Ui) -> R,
    ) {
        egui::Area::new(egui::Id::new(id))
            .order(egui::Order::Foreground)
            .fixed_pos(canvas_rect.min + Vec2::new(TOOLBAR_OFFSET.0, TOOLBAR_OFFSET.1))
            .show(ctx, |ui| {
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.horizontal(|ui| add_contents(ui));
                });
            });
    }

    fn brush_toolbar(&mut self, ctx: &egui::Context, canvas_rect: Rect) {
        let mut clear_all = false;
        let mut close = false;
        let brush = &mut self.tools.brush;
        Self::toolbar_area(ctx, "toolbar.brush", canvas_rect, |ui| {
            ui.color_edit_button_srgba(&mut brush.color);
            ui.add(egui::Slider::new(&mut brush.size, 1.0..=30.0).text("size"));
            clear_all = ui.button("Clear all").clicked();
            close = ui.button("✕").clicked();
        });
        if clear_all && let Some(state) = &mut self.state {
            paint::clear(&mut state.raster);
            state.raster_dirty = true;
        }
        if close {
            self.tools.deactivate();
        }
    }

    fn erase_toolbar(&mut self, ctx: &egui::Context, canvas_rect: Rect) {
        let mut close = false;
        let erase = &mut self.tools.erase;
        Self::toolbar_area(ctx, "toolbar.erase", canvas_rect, |ui| {
            ui.add(egui::Slider::new(&mut erase.size, 5.0..=50.0).text("size"));
            close = ui.button("✕").clicked();
        });
        if close {
            self.tools.deactivate();
        }
    }

    fn crop_toolbar(&mut self, ctx: &egui::Context, canvas_rect: Rect) {
        let mut apply = false;
        let mut cancel = false;
        Self::toolbar_area(ctx, "toolbar.crop", canvas_rect, |ui| {
            apply = ui.button("Apply").clicked();
            cancel = ui.button("Cancel").clicked();
        });
        if apply {
            let applied = match (&mut self.state, self.tools.crop.selection) {
                (Some(state), Some(sel)) => state.apply_crop(&sel),
                _ => false,
            };
            if applied {
                // New base: transform back to identity, extents follow
                self.viewport.reset();
                self.view.invalidate();
                if let Some(state) = &self.state {
                    let (w, h) = state.extent();
                    self.status = format!("Cropped to {}×{}", w, h);
                    log_info!("crop applied: {}x{}", w, h);
                }
            } else {
                self.status = "Crop cancelled (empty selection)".to_string();
            }
        }
        if apply || cancel {
            // Shared cleanup for both exit paths
            self.tools.deactivate();
        }
    }

    fn rotate_toolbar(&mut self, ctx: &egui::Context, canvas_rect: Rect) {
        let mut action: Option<Orient> = None;
        let mut close = false;
        Self::toolbar_area(ctx, "toolbar.rotate", canvas_rect, |ui| {
            if ui.button("⟲ 90°").clicked() {
                action = Some(Orient::Rotate270);
            }
            if ui.button("⟳ 90°").clicked() {
                action = Some(Orient::Rotate90);
            }
            close = ui.button("✕").clicked();
        });
        if let (Some(orient), Some(state)) = (action, &mut self.state) {
            state.apply_orient(orient);
            self.view.invalidate();
        }
        if close {
            self.tools.deactivate();
        }
    }

    fn flip_toolbar(&mut self, ctx: &egui::Context, canvas_rect: Rect) {
        let mut action: Option<Orient> = None;
        let mut close = false;
        Self::toolbar_area(ctx, "toolbar.flip", canvas_rect, |ui| {
            if ui.button("Flip H").clicked() {
                action = Some(Orient::FlipH);
            }
            if ui.button("Flip V").clicked() {
                action = Some(Orient::FlipV);
            }
            close = ui.button("✕").clicked();
        });
        if let (Some(orient), Some(state)) = (action, &mut self.state) {
            state.apply_orient(orient);
            self.view.invalidate();
        }
        if close {
            self.tools.deactivate();
        }
    }

    fn color_toolbar(&mut self, ctx: &egui::Context, canvas_rect: Rect) {
        let Some(state) = &mut self.state else { return };
        let before = state.color;
        let mut reset = false;
        let mut close = false;
        let color = &mut state.color;
        Self::toolbar_area(ctx, "toolbar.color", canvas_rect, |ui| {
            ui.label("Brightness");
            if ui.button("−").clicked() {
                color.step_brightness(-1.0);
            }
            if ui.button("+").clicked() {
                color.step_brightness(1.0);
            }
            ui.separator();
            ui.label("Contrast");
            if ui.button("−").clicked() {
                color.step_contrast(-1.0);
            }
            if ui.button("+").clicked() {
                color.step_contrast(1.0);
            }
            ui.separator();
            ui.label("Saturation");
            if ui.button("−").clicked() {
                color.step_saturation(-1.0);
            }
            if ui.button("+").clicked() {
                color.step_saturation(1.0);
            }
            ui.separator();
            ui.label("Sepia");
            if ui.button("−").clicked() {
                color.step_sepia(-1.0);
            }
            if ui.button("+").clicked() {
                color.step_sepia(1.0);
            }
            ui.separator();
            reset = ui.button("Reset").clicked();
            close = ui.button("✕").clicked();
        });
        if reset {
            *color = adjustments::ColorSettings::default();
        }
        if *color != before {
            state.base_dirty = true;
        }
        if close {
            self.tools.deactivate();
        }
    }

    fn sticker_toolbar(&mut self, ctx: &egui::Context, canvas_rect: Rect) {
        let mut add_preset = false;
        let mut add_file = false;
        let mut delete = false;
        let mut close = false;
        let preset_idx = &mut self.tools.sticker.preset;
        Self::toolbar_area(ctx, "toolbar.sticker", canvas_rect, |ui| {
            egui::ComboBox::from_id_source("sticker.preset")
                .selected_text(StickerPreset::all()[*preset_idx].label())
                .show_ui(ui, |ui| {
                    for (i, preset) in StickerPreset::all().iter().enumerate() {
                        ui.selectable_value(preset_idx, i, preset.label());
                    }
                });
            add_preset = ui.button("Add").clicked();
            add_file = ui.button("From file…").clicked();
            delete = ui.button("Delete").clicked();
            close = ui.button("✕").clicked();
        });

        if add_preset {
            let preset = StickerPreset::all()[self.tools.sticker.preset];
            match preset.decode() {
                Ok(img) => self.add_sticker(img),
                Err(e) => {
                    // Missing/broken preset: report, add nothing
                    self.status = e.clone();
                    log_err!("sticker: {}", e);
                }
            }
        }
        if add_file && let Some(path) = io::pick_sticker_file() {
            match io::load_image(&path) {
                Ok(img) => self.add_sticker(img),
                Err(e) => {
                    self.status = e.clone();
                    log_err!("sticker: {}", e);
                }
            }
        }
        if delete
            && let Some(idx) = self.tools.sticker.selected.take()
            && let Some(state) = &mut self.state
            && idx < state.stickers.len()
        {
            state.stickers.remove(idx);
        }
        if close {
            self.tools.deactivate();
        }
    }

    fn add_sticker(&mut self, img: RgbaImage) {
        let Some(state) = &mut self.state else { return };
        let extent = state.extent();
        // Drop the sticker at the center of the visible content
        let center = self
            .last_canvas_rect
            .map(|r| {
                let c = self.viewport.to_content((r.center() - r.min).to_pos2());
                (c.x, c.y)
            })
            .unwrap_or((extent.0 as f32 / 2.0, extent.1 as f32 / 2.0));
        state.stickers.push(Sticker::place(img, center, extent));
        self.tools.sticker.selected = Some(state.stickers.len() - 1);
    }

    fn text_toolbar(&mut self, ctx: &egui::Context, canvas_rect: Rect) {
        // Resolve the font on first use; remember a failure so it is
        // reported once rather than retried every frame.
        if self.tools.text.font.is_none() && !self.tools.text.font_lookup_failed {
            match text::load_ui_font() {
                Some(font) => self.tools.text.font = Some(font),
                None => {
                    self.tools.text.font_lookup_failed = true;
                    self.status = "No usable system font found — text tool disabled".to_string();
                    log_err!("text: system font lookup failed");
                }
            }
        }

        let mut add = false;
        let mut edit = false;
        let mut delete = false;
        let mut close = false;
        let text_state = &mut self.tools.text;
        let enabled = text_state.font.is_some();
        Self::toolbar_area(ctx, "toolbar.text", canvas_rect, |ui| {
            ui.add_enabled_ui(enabled, |ui| {
                ui.color_edit_button_srgba(&mut text_state.color);
                egui::ComboBox::from_id_source("text.size")
                    .selected_text(format!("{}", text::SIZE_CHOICES[text_state.size_choice]))
                    .show_ui(ui, |ui| {
                        for (i, size) in text::SIZE_CHOICES.iter().enumerate() {
                            ui.selectable_value(
                                &mut text_state.size_choice,
                                i,
                                format!("{}", size),
                            );
                        }
                    });
                add = ui
                    .selectable_label(text_state.placing, "Add")
                    .clicked();
                edit = ui.button("Edit").clicked();
                delete = ui.button("Delete").clicked();
            });
            close = ui.button("✕").clicked();
        });

        if add {
            self.tools.text.placing = !self.tools.text.placing;
        }
        if edit
            && let Some(idx) = self.tools.text.selected
            && let Some(state) = &self.state
            && let Some(entity) = state.texts.get(idx)
        {
            self.tools.text.editing = Some((idx, entity.content.clone()));
        }
        if delete
            && let Some(idx) = self.tools.text.selected.take()
            && let Some(state) = &mut self.state
            && idx < state.texts.len()
        {
            state.texts.remove(idx);
        }
        if close {
            self.tools.deactivate();
        }
    }

    fn text_edit_window(&mut self, ctx: &egui::Context) {
        let Some((idx, mut buffer)) = self.tools.text.editing.take() else {
            return;
        };
        let mut commit = false;
        let mut cancel = false;
        egui::Window::new("Edit text")
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.text_edit_singleline(&mut buffer);
                ui.horizontal(|ui| {
                    commit = ui.button("OK").clicked();
                    cancel = ui.button("Cancel").clicked();
                });
            });
        if commit {
            if let (Some(state), Some(font)) =
                (&mut self.state, self.tools.text.font.clone())
                && let extent = state.extent()
                && let Some(entity) = state.texts.get_mut(idx)
            {
                entity.content = if buffer.is_empty() {
                    text::DEFAULT_TEXT.to_string()
                } else {
                    buffer
                };
                entity.size = text::SIZE_CHOICES[self.tools.text.size_choice];
                let col = self.tools.text.color;
                entity.color = [col.r(), col.g(), col.b(), col.a()];
                let metrics = text::measure(&font, &entity.content, entity.size);
                entity.clamp_to(extent, metrics);
            }
        } else if !cancel {
            self.tools.text.editing = Some((idx, buffer));
        }
    }
}

impl eframe::App for RetouchApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.menu_bar(ctx);
        self.tool_strip(ctx);
        self.status_bar(ctx);
        self.canvas_panel(ctx);
    }
}
