use std::{fmt, path::Path, sync::Arc};

use anyhow::{Context as _, anyhow};
use tiny_skia::{ColorU8, IntSize, Pixmap};

use super::{Op, Ops};

/// Straight (non-premultiplied) 8-bit RGBA.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const WHITE: Color = Color::rgb(0xFF, 0xFF, 0xFF);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Make `color` the current material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorOp {
    pub color: Color,
}

impl ColorOp {
    pub fn add(self, ops: &mut Ops) {
        ops.push(Op::Color(self.color));
    }
}

/// A decoded image usable as a material. Cloning shares the pixels.
#[derive(Clone)]
pub struct ImageOp {
    pixels: Arc<Pixmap>,
}

impl ImageOp {
    pub fn new(image: &image::RgbaImage) -> crate::Result<Self> {
        let size = IntSize::from_wh(image.width(), image.height())
            .ok_or_else(|| anyhow!("image has zero size"))?;
        let mut pixmap = Pixmap::new(size.width(), size.height())
            .ok_or_else(|| anyhow!("image too large: {}x{}", size.width(), size.height()))?;

        for (dst, src) in pixmap.pixels_mut().iter_mut().zip(image.pixels()) {
            let [r, g, b, a] = src.0;
            *dst = ColorU8::from_rgba(r, g, b, a).premultiply();
        }

        Ok(Self {
            pixels: Arc::new(pixmap),
        })
    }

    /// Decode an image file from disk.
    pub fn open(path: impl AsRef<Path>) -> crate::Result<Self> {
        let path = path.as_ref();
        let decoded = image::open(path)
            .with_context(|| format!("failed to load image {}", path.display()))?;
        log::debug!(
            "loaded {} ({}x{})",
            path.display(),
            decoded.width(),
            decoded.height()
        );
        Self::new(&decoded.to_rgba8())
    }

    pub fn size(&self) -> (u32, u32) {
        (self.pixels.width(), self.pixels.height())
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixels
    }

    pub fn add(&self, ops: &mut Ops) {
        ops.push(Op::Image(self.clone()));
    }
}

impl fmt::Debug for ImageOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (w, h) = self.size();
        f.debug_struct("ImageOp").field("w", &w).field("h", &h).finish()
    }
}

/// Fill the current clip with the current material.
#[derive(Debug, Clone, Copy, Default)]
pub struct PaintOp;

impl PaintOp {
    pub fn add(self, ops: &mut Ops) {
        ops.push(Op::Paint);
    }
}

/// A run of text drawn at the current origin. Leaves the material alone.
#[derive(Debug, Clone, PartialEq)]
pub struct TextOp {
    pub text: String,
    pub color: Color,
    pub size: f32,
}

impl TextOp {
    pub fn add(self, ops: &mut Ops) {
        ops.push(Op::Text(self));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_pixels_are_premultiplied() {
        let mut img = image::RgbaImage::new(2, 1);
        img.put_pixel(0, 0, image::Rgba([200, 100, 50, 255]));
        img.put_pixel(1, 0, image::Rgba([200, 100, 50, 0]));

        let op = ImageOp::new(&img).unwrap();
        assert_eq!(op.size(), (2, 1));

        let opaque = op.pixmap().pixel(0, 0).unwrap();
        assert_eq!((opaque.red(), opaque.green(), opaque.blue()), (200, 100, 50));
        let clear = op.pixmap().pixel(1, 0).unwrap();
        assert_eq!((clear.red(), clear.alpha()), (0, 0));
    }

    #[test]
    fn zero_sized_image_is_rejected() {
        let img = image::RgbaImage::new(0, 4);
        assert!(ImageOp::new(&img).is_err());
    }

    #[test]
    fn bundled_asset_decodes() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("img/gopher.png");
        let op = ImageOp::open(path).unwrap();
        assert_eq!(op.size(), (64, 80));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = ImageOp::open("does/not/exist.png").unwrap_err();
        assert!(format!("{err:#}").contains("does/not/exist.png"));
    }
}
