pub mod render;
pub mod wrap;

use crate::core::config::TypesetConfig;
use crate::core::errors::{RenderingError, RenderingResult};
use crate::models::{Rect, TranslatedBubble};
use crate::output::OutputSink;
use image::{DynamicImage, Rgba, RgbaImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect as PixelRect;
use std::sync::Arc;
use tracing::{debug, warn};

pub use render::{DEFAULT_FONT, FontRenderer, MonospaceRenderer, TextRenderer};
pub use wrap::{TextLayout, align_x, normalize_whitespace, wrap_and_scale, wrap_words};

/// A bubble that could not be typeset. Its rect was still filled if it
/// overlapped the page.
#[derive(Debug)]
pub struct BubbleFailure {
    pub index: usize,
    pub error: RenderingError,
}

#[derive(Debug, Default)]
pub struct RenderReport {
    pub rendered: usize,
    /// Bubbles covered with background but left without text
    pub skipped_empty: usize,
    /// Bubbles rendered at the floor scale that still overflow
    pub overflowed: usize,
    pub failures: Vec<BubbleFailure>,
}

enum BubbleOutcome {
    Rendered { fits: bool },
    Empty,
}

/// Erases source text and draws translations inside bubble bounds.
pub struct Typesetter {
    config: TypesetConfig,
    renderer: Arc<dyn TextRenderer>,
}

impl Typesetter {
    pub fn new(config: TypesetConfig, renderer: Arc<dyn TextRenderer>) -> Self {
        Self { config, renderer }
    }

    /// Use the configured font, or the bundled DejaVu Sans when none is set.
    pub fn from_config(config: TypesetConfig) -> RenderingResult<Self> {
        let renderer = match &config.font_path {
            Some(path) => FontRenderer::from_file(path, config.font_px_per_scale)?,
            None => {
                debug!("no font configured, using bundled DejaVu Sans");
                FontRenderer::embedded(config.font_px_per_scale)?
            }
        };
        Ok(Self::new(config, Arc::new(renderer)))
    }

    pub fn config(&self) -> &TypesetConfig {
        &self.config
    }

    /// Typeset `bubbles` onto a copy of `image`. Per-bubble failures are
    /// collected; the page image is always produced.
    pub fn render(
        &self,
        image: &DynamicImage,
        bubbles: &[TranslatedBubble],
    ) -> (RgbaImage, RenderReport) {
        let mut canvas = image.to_rgba8();
        let mut report = RenderReport::default();

        for (index, bubble) in bubbles.iter().enumerate() {
            match self.render_bubble(&mut canvas, bubble) {
                Ok(BubbleOutcome::Rendered { fits }) => {
                    report.rendered += 1;
                    if !fits {
                        report.overflowed += 1;
                    }
                }
                Ok(BubbleOutcome::Empty) => report.skipped_empty += 1,
                Err(error) => {
                    warn!(bubble = index, "bubble not typeset: {}", error);
                    report.failures.push(BubbleFailure { index, error });
                }
            }
        }

        debug!(
            rendered = report.rendered,
            empty = report.skipped_empty,
            overflowed = report.overflowed,
            failed = report.failures.len(),
            "typesetting done"
        );
        (canvas, report)
    }

    /// Render and hand the result to `sink`. Returns the sink's identifier.
    pub fn apply(
        &self,
        image: &DynamicImage,
        bubbles: &[TranslatedBubble],
        sink: &dyn OutputSink,
        page_name: &str,
    ) -> anyhow::Result<(String, RenderReport)> {
        let (canvas, report) = self.render(image, bubbles);
        let id = sink.persist(page_name, &canvas)?;
        Ok((id, report))
    }

    fn render_bubble(
        &self,
        canvas: &mut RgbaImage,
        bubble: &TranslatedBubble,
    ) -> RenderingResult<BubbleOutcome> {
        let rect = bubble.rect;
        let padding = self.config.padding;
        if rect.is_empty() {
            return Err(RenderingError::InvalidBubbleDimensions {
                width: rect.width,
                height: rect.height,
                padding,
            });
        }

        let visible = rect.clamp_to(canvas.width(), canvas.height());
        if visible.is_empty() {
            return Err(RenderingError::OutsidePage {
                x: rect.x,
                y: rect.y,
            });
        }
        fill(canvas, &visible, rgba(self.config.background));

        let text = normalize_whitespace(&bubble.text);
        if text.is_empty() {
            return Ok(BubbleOutcome::Empty);
        }

        let avail_w = rect.width - 2 * padding as i32;
        let avail_h = rect.height - 2 * padding as i32;
        if avail_w <= 0 || avail_h <= 0 {
            return Err(RenderingError::InvalidBubbleDimensions {
                width: rect.width,
                height: rect.height,
                padding,
            });
        }
        let (avail_w, avail_h) = (avail_w as u32, avail_h as u32);

        let layout = wrap_and_scale(
            &text,
            avail_w,
            avail_h,
            &self.config,
            self.renderer.as_ref(),
        );
        if !layout.fits {
            debug!(
                x = rect.x,
                y = rect.y,
                scale = layout.scale,
                "text overflows bubble at the floor scale"
            );
        }

        let left = rect.x + padding as i32;
        let top = rect.y + padding as i32;
        let outline = self.config.outline_width as i32;

        for (i, line) in layout.lines.iter().enumerate() {
            let width = self.renderer.text_width(line, layout.scale);
            let x = align_x(width, left, avail_w, self.config.alignment);
            let y = top + (i as u32 * layout.line_height) as i32;

            if outline > 0 {
                let color = rgba(self.config.outline_color);
                for dy in -outline..=outline {
                    for dx in -outline..=outline {
                        if dx != 0 || dy != 0 {
                            self.renderer
                                .draw_text(canvas, line, x + dx, y + dy, layout.scale, color);
                        }
                    }
                }
            }
            self.renderer.draw_text(
                canvas,
                line,
                x,
                y,
                layout.scale,
                rgba(self.config.text_color),
            );
        }

        Ok(BubbleOutcome::Rendered { fits: layout.fits })
    }
}

fn rgba([r, g, b]: [u8; 3]) -> Rgba<u8> {
    Rgba([r, g, b, 255])
}

/// `rect` must be non-empty.
fn fill(canvas: &mut RgbaImage, rect: &Rect, color: Rgba<u8>) {
    draw_filled_rect_mut(
        canvas,
        PixelRect::at(rect.x, rect.y).of_size(rect.width as u32, rect.height as u32),
        color,
    );
}
