// ============================================================================
// COLOR ADJUSTMENTS — non-destructive settings applied to the base layer
// ============================================================================
//
// The stored base image is never touched; the display/flatten path runs the
// base through `apply` whenever any setting is non-zero.  Settings are
// stepped ±0.1 from the color toolbar and reset as one unit.

use image::RgbaImage;
use rayon::prelude::*;

/// Toolbar step for every adjustment.
pub const ADJUST_STEP: f32 = 0.1;

/// Adjustment state for the base layer.  All values default to identity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColorSettings {
    /// -1.0 ..= 1.0, additive.
    pub brightness: f32,
    /// -1.0 ..= 1.0.
    pub contrast: f32,
    /// -1.0 ..= 1.0, 0 = unchanged.
    pub saturation: f32,
    /// 0.0 ..= 1.0, blend toward a full sepia tone.
    pub sepia: f32,
}

impl Default for ColorSettings {
    fn default() -> Self {
        Self {
            brightness: 0.0,
            contrast: 0.0,
            saturation: 0.0,
            sepia: 0.0,
        }
    }
}

impl ColorSettings {
    /// True when applying the settings would change nothing — the render
    /// path skips the pixel pass entirely in that case.
    pub fn is_identity(&self) -> bool {
        self.brightness == 0.0
            && self.contrast == 0.0
            && self.saturation == 0.0
            && self.sepia == 0.0
    }

    pub fn step_brightness(&mut self, dir: f32) {
        self.brightness = (self.brightness + dir * ADJUST_STEP).clamp(-1.0, 1.0);
    }

    pub fn step_contrast(&mut self, dir: f32) {
        self.contrast = (self.contrast + dir * ADJUST_STEP).clamp(-1.0, 1.0);
    }

    pub fn step_saturation(&mut self, dir: f32) {
        self.saturation = (self.saturation + dir * ADJUST_STEP).clamp(-1.0, 1.0);
    }

    pub fn step_sepia(&mut self, dir: f32) {
        self.sepia = (self.sepia + dir * ADJUST_STEP).clamp(0.0, 1.0);
    }
}

/// Run `transform` over every pixel, parallelised per row.
fn per_pixel<F>(src: &RgbaImage, transform: F) -> RgbaImage
where
    F: Fn(f32, f32, f32, f32) -> (f32, f32, f32, f32) + Sync,
{
    let w = src.width() as usize;
    let h = src.height() as usize;
    let stride = w * 4;
    let src_raw = src.as_raw();
    let mut dst_raw = vec![0u8; w * h * 4];

    dst_raw
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row_out)| {
            let row_in = &src_raw[y * stride..(y + 1) * stride];
            for x in 0..w {
                let pi = x * 4;
                let (nr, ng, nb, na) = transform(
                    row_in[pi] as f32,
                    row_in[pi + 1] as f32,
                    row_in[pi + 2] as f32,
                    row_in[pi + 3] as f32,
                );
                row_out[pi] = nr.round().clamp(0.0, 255.0) as u8;
                row_out[pi + 1] = ng.round().clamp(0.0, 255.0) as u8;
                row_out[pi + 2] = nb.round().clamp(0.0, 255.0) as u8;
                row_out[pi + 3] = na.round().clamp(0.0, 255.0) as u8;
            }
        });

    RgbaImage::from_raw(src.width(), src.height(), dst_raw)
        .unwrap_or_else(|| src.clone())
}

/// Apply the full adjustment chain: brightness → contrast → saturation →
/// sepia.  Alpha is preserved throughout.
pub fn apply(src: &RgbaImage, settings: &ColorSettings) -> RgbaImage {
    if settings.is_identity() {
        return src.clone();
    }

    let bright = settings.brightness * 255.0;
    let c = settings.contrast * 255.0;
    let contrast_factor = (259.0 * (c + 255.0)) / (255.0 * (259.0 - c));
    let sat_factor = 1.0 + settings.saturation;
    let sepia = settings.sepia;

    per_pixel(src, move |r, g, b, a| {
        // Brightness + contrast
        let r = contrast_factor * (r + bright - 128.0) + 128.0;
        let g = contrast_factor * (g + bright - 128.0) + 128.0;
        let b = contrast_factor * (b + bright - 128.0) + 128.0;

        // Saturation around per-pixel luma
        let luma = 0.2126 * r + 0.7152 * g + 0.0722 * b;
        let r = luma + (r - luma) * sat_factor;
        let g = luma + (g - luma) * sat_factor;
        let b = luma + (b - luma) * sat_factor;

        // Sepia blend
        if sepia > 0.0 {
            let sr = (0.393 * r + 0.769 * g + 0.189 * b).min(255.0);
            let sg = (0.349 * r + 0.686 * g + 0.168 * b).min(255.0);
            let sb = (0.272 * r + 0.534 * g + 0.131 * b).min(255.0);
            (
                r + (sr - r) * sepia,
                g + (sg - g) * sepia,
                b + (sb - b) * sepia,
                a,
            )
        } else {
            (r, g, b, a)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn sample() -> RgbaImage {
        RgbaImage::from_fn(8, 8, |x, y| {
            Rgba([(x * 30) as u8, (y * 30) as u8, 120, 200])
        })
    }

    #[test]
    fn identity_settings_change_nothing() {
        let src = sample();
        let out = apply(&src, &ColorSettings::default());
        assert_eq!(src, out);
    }

    #[test]
    fn brightness_raises_all_channels() {
        let src = sample();
        let mut settings = ColorSettings::default();
        settings.step_brightness(1.0);
        let out = apply(&src, &settings);
        let before = src.get_pixel(2, 2);
        let after = out.get_pixel(2, 2);
        for ch in 0..3 {
            assert!(after[ch] > before[ch]);
        }
        assert_eq!(after[3], before[3], "alpha must be preserved");
    }

    #[test]
    fn full_desaturation_is_grayscale() {
        let src = sample();
        let settings = ColorSettings {
            saturation: -1.0,
            ..Default::default()
        };
        let out = apply(&src, &settings);
        for p in out.pixels() {
            assert!(p[0].abs_diff(p[1]) <= 1 && p[1].abs_diff(p[2]) <= 1);
        }
    }

    #[test]
    fn steps_clamp_at_range_ends() {
        let mut settings = ColorSettings::default();
        for _ in 0..30 {
            settings.step_contrast(1.0);
            settings.step_sepia(-1.0);
        }
        assert_eq!(settings.contrast, 1.0);
        assert_eq!(settings.sepia, 0.0);
        assert!(!settings.is_identity());
    }

    #[test]
    fn sepia_output_is_warm() {
        let src = RgbaImage::from_pixel(4, 4, Rgba([100, 100, 100, 255]));
        let settings = ColorSettings {
            sepia: 1.0,
            ..Default::default()
        };
        let out = apply(&src, &settings);
        let p = out.get_pixel(0, 0);
        assert!(p[0] > p[1] && p[1] > p[2]);
    }
}
