// ============================================================================
// FILE I/O — the opaque codec boundary (decode on load, encode on export)
// ============================================================================

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, RgbaImage};
use rfd::FileDialog;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

/// Default JPEG quality for exports.
const JPEG_QUALITY: u8 = 90;

/// Output formats selectable by file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Jpeg,
}

/// Decode a file to RGBA.  Errors bubble up as user-facing strings; the
/// caller leaves all session state untouched on failure.
pub fn load_image(path: &Path) -> Result<RgbaImage, String> {
    let img = image::open(path)
        .map_err(|e| format!("Could not open {}: {}", path.display(), e))?
        .into_rgba8();
    if img.width() == 0 || img.height() == 0 {
        return Err(format!("{} decoded to an empty image", path.display()));
    }
    Ok(img)
}

/// Resolve the export format from the user-supplied filename.  An
/// unrecognized or missing extension defaults to PNG and `.png` is
/// appended to the path.
pub fn normalize_export_path(path: &Path) -> (PathBuf, ExportFormat) {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => (path.to_path_buf(), ExportFormat::Png),
        Some("jpg") | Some("jpeg") => (path.to_path_buf(), ExportFormat::Jpeg),
        _ => {
            let mut name = path.as_os_str().to_os_string();
            name.push(".png");
            (PathBuf::from(name), ExportFormat::Png)
        }
    }
}

/// Encode and write the flattened bitmap.  Returns the path actually
/// written (it may differ from the request when `.png` was appended).
/// I/O failures are reported upward; in-memory state is never affected.
pub fn export_image(image: &RgbaImage, requested: &Path) -> Result<PathBuf, String> {
    let (path, format) = normalize_export_path(requested);
    let file =
        File::create(&path).map_err(|e| format!("Could not create {}: {}", path.display(), e))?;
    let mut writer = BufWriter::new(file);

    let result = match format {
        ExportFormat::Png => {
            let encoder = PngEncoder::new(&mut writer);
            #[allow(deprecated)]
            encoder.encode(
                image.as_raw(),
                image.width(),
                image.height(),
                image::ColorType::Rgba8,
            )
        }
        ExportFormat::Jpeg => {
            // JPEG carries no alpha — flatten against the RGB conversion
            let rgb = DynamicImage::ImageRgba8(image.clone()).to_rgb8();
            let mut encoder = JpegEncoder::new_with_quality(&mut writer, JPEG_QUALITY);
            encoder.encode(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                image::ColorType::Rgb8,
            )
        }
    };
    result.map_err(|e| format!("Export to {} failed: {}", path.display(), e))?;
    Ok(path)
}

// ---------------------------------------------------------------------------
//  Native dialogs
// ---------------------------------------------------------------------------

pub fn pick_image_to_open() -> Option<PathBuf> {
    FileDialog::new()
        .add_filter("Images", &["png", "jpg", "jpeg", "gif", "bmp"])
        .add_filter("All files", &["*"])
        .set_title("Open image")
        .pick_file()
}

pub fn pick_export_target() -> Option<PathBuf> {
    FileDialog::new()
        .add_filter("PNG (*.png)", &["png"])
        .add_filter("JPEG (*.jpg)", &["jpg", "jpeg"])
        .set_title("Export image")
        .save_file()
}

pub fn pick_sticker_file() -> Option<PathBuf> {
    FileDialog::new()
        .add_filter("Images", &["png", "jpg", "jpeg", "gif"])
        .set_title("Add sticker from file")
        .pick_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn recognized_extensions_pass_through() {
        let (path, fmt) = normalize_export_path(Path::new("/tmp/out.png"));
        assert_eq!(path, Path::new("/tmp/out.png"));
        assert_eq!(fmt, ExportFormat::Png);

        let (path, fmt) = normalize_export_path(Path::new("/tmp/out.JPG"));
        assert_eq!(path, Path::new("/tmp/out.JPG"));
        assert_eq!(fmt, ExportFormat::Jpeg);

        let (_, fmt) = normalize_export_path(Path::new("photo.jpeg"));
        assert_eq!(fmt, ExportFormat::Jpeg);
    }

    #[test]
    fn unrecognized_extension_defaults_to_png() {
        let (path, fmt) = normalize_export_path(Path::new("/tmp/out"));
        assert_eq!(path, Path::new("/tmp/out.png"));
        assert_eq!(fmt, ExportFormat::Png);

        let (path, fmt) = normalize_export_path(Path::new("/tmp/out.webp"));
        assert_eq!(path, Path::new("/tmp/out.webp.png"));
        assert_eq!(fmt, ExportFormat::Png);
    }

    #[test]
    fn png_export_round_trips() {
        let img = RgbaImage::from_fn(16, 12, |x, y| {
            Rgba([(x * 16) as u8, (y * 20) as u8, 33, 255])
        });
        let target = std::env::temp_dir().join("retouch_io_test_export");
        let written = export_image(&img, &target).expect("export");
        assert_eq!(written.extension().unwrap(), "png");

        let back = load_image(&written).expect("reload");
        assert_eq!(back, img);
        let _ = std::fs::remove_file(&written);
    }

    #[test]
    fn load_failure_reports_path() {
        let err = load_image(Path::new("/nonexistent/retouch.png")).unwrap_err();
        assert!(err.contains("/nonexistent/retouch.png"));
    }
}
