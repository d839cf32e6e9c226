pub mod adjustments;
pub mod crop;
pub mod paint;
pub mod sticker;
pub mod text;
pub mod transform;
