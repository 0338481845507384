use crate::core::errors::{RenderingError, RenderingResult};
use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use image::{Rgba, RgbaImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut, text_size};
use imageproc::rect::Rect as PixelRect;
use std::path::Path;

/// Text measuring and drawing primitive used by the typesetter.
///
/// `scale` is a unitless font scale; implementations decide how it maps to
/// pixels. `(x, y)` in [`draw_text`](Self::draw_text) is the top-left corner
/// of the line box.
pub trait TextRenderer: Send + Sync {
    fn text_width(&self, text: &str, scale: f32) -> u32;

    fn line_height(&self, scale: f32) -> u32;

    fn draw_text(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        x: i32,
        y: i32,
        scale: f32,
        color: Rgba<u8>,
    );
}

/// DejaVu Sans, used when no font file is configured.
pub const DEFAULT_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

/// Renders with a TrueType/OpenType font through ab_glyph.
pub struct FontRenderer {
    font: FontVec,
    px_per_scale: f32,
}

impl FontRenderer {
    pub fn from_bytes(data: Vec<u8>, px_per_scale: f32) -> RenderingResult<Self> {
        let font = FontVec::try_from_vec(data).map_err(|e| RenderingError::FontLoad(e.to_string()))?;
        Ok(Self { font, px_per_scale })
    }

    pub fn from_file(path: impl AsRef<Path>, px_per_scale: f32) -> RenderingResult<Self> {
        let path = path.as_ref();
        let data = std::fs::read(path)
            .map_err(|e| RenderingError::FontLoad(format!("{}: {}", path.display(), e)))?;
        Self::from_bytes(data, px_per_scale)
    }

    /// Renderer for the bundled [`DEFAULT_FONT`].
    pub fn embedded(px_per_scale: f32) -> RenderingResult<Self> {
        Self::from_bytes(DEFAULT_FONT.to_vec(), px_per_scale)
    }

    fn px(&self, scale: f32) -> PxScale {
        PxScale::from((scale * self.px_per_scale).max(1.0))
    }
}

impl TextRenderer for FontRenderer {
    fn text_width(&self, text: &str, scale: f32) -> u32 {
        text_size(self.px(scale), &self.font, text).0
    }

    fn line_height(&self, scale: f32) -> u32 {
        let scaled = self.font.as_scaled(self.px(scale));
        (scaled.height() + scaled.line_gap()).ceil().max(1.0) as u32
    }

    fn draw_text(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        x: i32,
        y: i32,
        scale: f32,
        color: Rgba<u8>,
    ) {
        draw_text_mut(canvas, color, x, y, self.px(scale), &self.font, text);
    }
}

/// Fixed-pitch block glyphs: every non-space character is drawn as a filled
/// cell. Not legible; used where exact, font-independent metrics matter.
#[derive(Debug, Clone, Copy)]
pub struct MonospaceRenderer {
    /// Horizontal advance per character at scale 1.0
    pub advance: f32,
    /// Line height at scale 1.0
    pub line: f32,
}

impl MonospaceRenderer {
    pub fn new(advance: f32, line: f32) -> Self {
        Self { advance, line }
    }

    fn cell_width(&self, scale: f32) -> f32 {
        self.advance * scale
    }
}

impl Default for MonospaceRenderer {
    fn default() -> Self {
        Self::new(18.0, 30.0)
    }
}

impl TextRenderer for MonospaceRenderer {
    fn text_width(&self, text: &str, scale: f32) -> u32 {
        (text.chars().count() as f32 * self.cell_width(scale)).ceil() as u32
    }

    fn line_height(&self, scale: f32) -> u32 {
        (self.line * scale).ceil().max(1.0) as u32
    }

    fn draw_text(
        &self,
        canvas: &mut RgbaImage,
        text: &str,
        x: i32,
        y: i32,
        scale: f32,
        color: Rgba<u8>,
    ) {
        let cell = self.cell_width(scale);
        let line = self.line_height(scale);
        let glyph_w = ((cell * 0.7).round() as u32).max(1);
        let glyph_h = ((line as f32 * 0.6).round() as u32).max(1);
        let top = y + ((line - glyph_h) / 2) as i32;

        for (i, ch) in text.chars().enumerate() {
            if ch.is_whitespace() {
                continue;
            }
            let left = x + (i as f32 * cell).round() as i32;
            draw_filled_rect_mut(
                canvas,
                PixelRect::at(left, top).of_size(glyph_w, glyph_h),
                color,
            );
        }
    }
}
