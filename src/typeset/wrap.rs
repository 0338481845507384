use crate::core::config::{Alignment, TypesetConfig};
use crate::typeset::render::TextRenderer;

/// Collapse whitespace runs to single spaces and trim.
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Greedy word wrap. A line keeps taking words while its measured width stays
/// within `max_width`; a word too wide on its own gets a line to itself.
pub fn wrap_words(
    text: &str,
    max_width: u32,
    scale: f32,
    renderer: &dyn TextRenderer,
) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        if line.is_empty() {
            line.push_str(word);
            continue;
        }
        let candidate = format!("{} {}", line, word);
        if renderer.text_width(&candidate, scale) <= max_width {
            line = candidate;
        } else {
            lines.push(std::mem::take(&mut line));
            line.push_str(word);
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}

/// A wrapped block and the scale it was wrapped at.
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayout {
    pub lines: Vec<String>,
    pub scale: f32,
    pub line_height: u32,
    /// False when even the floor scale overflows the available height
    pub fits: bool,
}

impl TextLayout {
    pub fn block_height(&self) -> u32 {
        self.lines.len() as u32 * self.line_height
    }
}

/// Find the largest scale, stepping down from the biased start, at which the
/// wrapped block is no taller than `avail_height`. A word wider than
/// `avail_width` sits alone on its line and does not force a smaller scale.
/// Falls back to the floor scale.
pub fn wrap_and_scale(
    text: &str,
    avail_width: u32,
    avail_height: u32,
    config: &TypesetConfig,
    renderer: &dyn TextRenderer,
) -> TextLayout {
    let start = config.start_scale();
    // Stepping by index keeps the scale sequence free of float drift.
    let steps = ((start - config.min_scale) / config.scale_step + 1e-4).floor().max(0.0) as u32;

    for i in 0..=steps {
        let scale = start - i as f32 * config.scale_step;
        let lines = wrap_words(text, avail_width, scale, renderer);
        let line_height = renderer.line_height(scale);
        if lines.len() as u32 * line_height <= avail_height {
            return TextLayout {
                lines,
                scale,
                line_height,
                fits: true,
            };
        }
    }

    let scale = config.min_scale;
    TextLayout {
        lines: wrap_words(text, avail_width, scale, renderer),
        scale,
        line_height: renderer.line_height(scale),
        fits: false,
    }
}

/// Left edge of a line of `line_width` inside the padded box starting at
/// `left` with `avail_width` room.
pub fn align_x(line_width: u32, left: i32, avail_width: u32, alignment: Alignment) -> i32 {
    let slack = avail_width as i32 - line_width as i32;
    match alignment {
        Alignment::Left => left,
        Alignment::Center => left + slack.div_euclid(2),
        Alignment::Right => left + slack,
    }
}
