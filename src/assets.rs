// ============================================================================
// EMBEDDED ASSETS — sticker presets, eraser cursor glyph
// ============================================================================
//
// Assets are compiled into the binary with `include_bytes!` and decoded on
// demand.  A preset that fails to decode is a reported error (the add
// action adds nothing); the eraser cursor is validated once at startup
// because its absence is a configuration error, not a per-operation one.

use image::RgbaImage;

/// Bundled sticker presets, resolved by logical name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StickerPreset {
    Star,
    Heart,
    Arrow,
}

impl StickerPreset {
    pub fn label(&self) -> &'static str {
        match self {
            StickerPreset::Star => "Star",
            StickerPreset::Heart => "Heart",
            StickerPreset::Arrow => "Arrow",
        }
    }

    pub fn all() -> &'static [StickerPreset] {
        &[
            StickerPreset::Star,
            StickerPreset::Heart,
            StickerPreset::Arrow,
        ]
    }

    fn bytes(&self) -> &'static [u8] {
        match self {
            StickerPreset::Star => include_bytes!("../assets/stickers/star.png"),
            StickerPreset::Heart => include_bytes!("../assets/stickers/heart.png"),
            StickerPreset::Arrow => include_bytes!("../assets/stickers/arrow.png"),
        }
    }

    /// Decode the preset to RGBA.
    pub fn decode(&self) -> Result<RgbaImage, String> {
        image::load_from_memory(self.bytes())
            .map(|img| img.into_rgba8())
            .map_err(|e| format!("sticker preset '{}' failed to decode: {}", self.label(), e))
    }
}

/// Decode the eraser cursor glyph.  Called once at startup; failure there
/// is logged as a configuration error and the erase tool falls back to
/// the plain crosshair.
pub fn eraser_cursor() -> Result<RgbaImage, String> {
    image::load_from_memory(include_bytes!("../assets/eraser.png"))
        .map(|img| img.into_rgba8())
        .map_err(|e| format!("eraser cursor asset failed to decode: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_presets_decode() {
        for preset in StickerPreset::all() {
            let img = preset.decode().expect(preset.label());
            assert!(img.width() > 0 && img.height() > 0);
            // Presets are sprites on a transparent background
            assert!(img.pixels().any(|p| p[3] == 0));
            assert!(img.pixels().any(|p| p[3] == 255));
        }
    }

    #[test]
    fn eraser_cursor_decodes() {
        let img = eraser_cursor().expect("eraser cursor");
        assert!(img.width() > 0 && img.height() > 0);
    }
}
