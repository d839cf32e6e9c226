// ============================================================================
// PAINT / ERASE — destructive edits on the raster layer, content coordinates
// ============================================================================

use image::{Rgba, RgbaImage};

/// Paint one stroke segment from `start` to `end` as a densely stepped run
/// of opaque round stamps (round caps and joins fall out of the circular
/// stamp shape).  Stamps write the stroke color with full alpha — every
/// segment re-asserts color/width so state left behind by another tool
/// can never leak into a stroke.
pub fn stroke_segment(
    raster: &mut RgbaImage,
    start: (f32, f32),
    end: (f32, f32),
    color: [u8; 4],
    size: f32,
) {
    let (x0, y0) = start;
    let (x1, y1) = end;
    let dx = x1 - x0;
    let dy = y1 - y0;
    let distance = (dx * dx + dy * dy).sqrt();

    if distance < 0.1 {
        stamp_circle(raster, start, color, size);
        return;
    }

    // Sub-pixel stepping keeps the line solid at any drag speed
    let steps = distance.ceil() as usize;
    for i in 0..=steps {
        let t = i as f32 / steps as f32;
        stamp_circle(raster, (x0 + dx * t, y0 + dy * t), color, size);
    }
}

/// Stamp a filled circle of diameter `size` centered at `pos`.  The stamp
/// is fully opaque (alpha forced to 255) — normal blend, no effects.
pub fn stamp_circle(raster: &mut RgbaImage, pos: (f32, f32), color: [u8; 4], size: f32) {
    let (w, h) = raster.dimensions();
    let (cx, cy) = pos;
    let radius = (size / 2.0).max(0.5);
    let r2 = radius * radius;

    let min_x = (cx - radius).floor().max(0.0) as u32;
    let min_y = (cy - radius).floor().max(0.0) as u32;
    let max_x = ((cx + radius).ceil() as i64).clamp(0, w as i64) as u32;
    let max_y = ((cy + radius).ceil() as i64).clamp(0, h as i64) as u32;

    let px = Rgba([color[0], color[1], color[2], 255]);
    for y in min_y..max_y {
        for x in min_x..max_x {
            let ddx = x as f32 + 0.5 - cx;
            let ddy = y as f32 + 0.5 - cy;
            if ddx * ddx + ddy * ddy <= r2 {
                raster.put_pixel(x, y, px);
            }
        }
    }
}

/// Erase an axis-aligned square of side `size` centered on `pos` — all four
/// channels cleared to zero.  Coordinates outside the raster are clipped,
/// so a release outside the content area is harmless.
pub fn erase_square(raster: &mut RgbaImage, pos: (f32, f32), size: f32) {
    let (w, h) = raster.dimensions();
    let (cx, cy) = pos;
    let half = size / 2.0;

    let min_x = (cx - half).floor().max(0.0) as u32;
    let min_y = (cy - half).floor().max(0.0) as u32;
    let max_x = ((cx + half).ceil() as i64).clamp(0, w as i64) as u32;
    let max_y = ((cy + half).ceil() as i64).clamp(0, h as i64) as u32;

    for y in min_y..max_y {
        for x in min_x..max_x {
            raster.put_pixel(x, y, Rgba([0, 0, 0, 0]));
        }
    }
}

/// Wipe the whole raster layer back to transparent ("clear all" button).
pub fn clear(raster: &mut RgbaImage) {
    for px in raster.pixels_mut() {
        *px = Rgba([0, 0, 0, 0]);
    }
}
