use cosmic_text::{Attrs, Buffer, FontSystem, Metrics, Shaping, SwashCache};

use crate::op::{Color, TextOp};

/// Shapes and rasterizes text runs. Loading the system font database is
/// slow, so the rasterizer builds one only when a frame first needs it.
pub struct TextRasterizer {
    font_system: FontSystem,
    swash_cache: SwashCache,
}

impl TextRasterizer {
    pub fn new() -> Self {
        let font_system = FontSystem::new();
        match font_system.db().len() {
            0 => log::warn!("no fonts found, text will not be drawn"),
            n => log::debug!("font database: {n} faces"),
        }
        Self {
            font_system,
            swash_cache: SwashCache::new(),
        }
    }

    pub fn has_fonts(&self) -> bool {
        !self.font_system.db().is_empty()
    }

    /// Calls `span(x, y, w, h, color)` for every covered run of pixels,
    /// relative to the top-left of the text.
    pub fn spans(&mut self, op: &TextOp, mut span: impl FnMut(i32, i32, u32, u32, Color)) {
        if !self.has_fonts() || op.text.is_empty() {
            return;
        }
        let Self {
            font_system,
            swash_cache,
        } = self;

        let metrics = Metrics::new(op.size, op.size * 1.2);
        let mut buf = Buffer::new(font_system, metrics);
        let mut buf = buf.borrow_with(font_system);

        buf.set_text(&op.text, &Attrs::new(), Shaping::Advanced);
        buf.shape_until_scroll(true);

        let fg = cosmic_text::Color::rgba(op.color.r, op.color.g, op.color.b, op.color.a);
        buf.draw(swash_cache, fg, |x, y, w, h, rgba| {
            if rgba.a() == 0 {
                return;
            }
            span(x, y, w, h, Color::rgba(rgba.r(), rgba.g(), rgba.b(), rgba.a()));
        });
    }
}

impl Default for TextRasterizer {
    fn default() -> Self {
        Self::new()
    }
}
