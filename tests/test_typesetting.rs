//! Integration tests for typesetting.
//!
//! Layout tests use block glyphs so their metrics do not depend on a font.
//! The bundled font is checked separately.

mod common;

use common::*;
use image::{Rgba, RgbaImage};
use scanlate::MemorySink;
use scanlate::typeset::{
    DEFAULT_FONT, FontRenderer, TextRenderer, align_x, normalize_whitespace, wrap_and_scale,
    wrap_words,
};

const PAD: i32 = 8;

fn translated(rect: Rect, text: &str) -> TranslatedBubble {
    TranslatedBubble {
        rect,
        text: text.to_string(),
        confidence: 0.9,
    }
}

fn pixels_matching(img: &RgbaImage, rect: Rect, color: [u8; 3]) -> Vec<(u32, u32)> {
    let mut found = Vec::new();
    for y in rect.y..rect.bottom() {
        for x in rect.x..rect.right() {
            let p = img.get_pixel(x as u32, y as u32);
            if p.0[..3] == color {
                found.push((x as u32, y as u32));
            }
        }
    }
    found
}

fn aligned(alignment: Alignment) -> TypesetConfig {
    TypesetConfig {
        alignment,
        ..TypesetConfig::default()
    }
}

#[test]
fn test_normalize_whitespace() {
    assert_eq!(normalize_whitespace("  a \n b\t\tc  "), "a b c");
    assert_eq!(normalize_whitespace(" \n\t "), "");
}

#[test]
fn test_wrap_accumulates_until_width() {
    let renderer = MonospaceRenderer::new(10.0, 20.0);

    let lines = wrap_words("aaa bbb ccc", 70, 1.0, &renderer);

    assert_eq!(lines, vec!["aaa bbb", "ccc"]);
}

#[test]
fn test_long_word_gets_its_own_line() {
    let renderer = MonospaceRenderer::new(10.0, 20.0);

    let lines = wrap_words("a supercalifragilistic b", 50, 1.0, &renderer);

    assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
}

#[test]
fn test_short_text_keeps_start_scale() {
    let config = TypesetConfig::default();
    let renderer = MonospaceRenderer::default();

    let layout = wrap_and_scale("Hi", 284, 64, &config, &renderer);

    assert!(layout.fits);
    assert_eq!(layout.scale, config.start_scale());
    assert_eq!(layout.lines, vec!["Hi"]);
}

#[test]
fn test_wrapped_lines_fit_available_width() {
    let config = TypesetConfig::default();
    let renderer = MonospaceRenderer::default();
    let text = "the quick brown fox jumps over the lazy dog";

    let layout = wrap_and_scale(text, 200, 100, &config, &renderer);

    assert!(layout.fits);
    assert!(layout.scale <= config.start_scale());
    assert!(layout.block_height() <= 100);
    for line in &layout.lines {
        assert!(renderer.text_width(line, layout.scale) <= 200, "{:?} too wide", line);
    }
    assert_eq!(layout.lines.join(" "), text);
}

#[test]
fn test_over_wide_word_does_not_shrink_the_scale() {
    let config = TypesetConfig::default();
    let renderer = MonospaceRenderer::new(10.0, 20.0);

    let layout = wrap_and_scale("a verylongword", 50, 200, &config, &renderer);

    assert!(layout.fits);
    assert_eq!(layout.scale, config.start_scale());
    assert_eq!(layout.lines, vec!["a", "verylongword"]);
}

#[test]
fn test_start_scale_never_below_floor() {
    let config = TypesetConfig {
        base_scale: 0.2,
        ..TypesetConfig::default()
    };
    let renderer = MonospaceRenderer::default();

    assert_eq!(config.start_scale(), config.min_scale);

    let layout = wrap_and_scale("Hi", 284, 64, &config, &renderer);
    assert!(layout.fits);
    assert_eq!(layout.scale, config.min_scale);
}

#[test]
fn test_overflow_renders_at_floor_scale() {
    let config = TypesetConfig::default();
    let renderer = MonospaceRenderer::default();
    let text = "word ".repeat(40);

    let layout = wrap_and_scale(&text, 50, 20, &config, &renderer);

    assert!(!layout.fits);
    assert_eq!(layout.scale, config.min_scale);
    assert!(!layout.lines.is_empty());
}

#[test]
fn test_align_x() {
    assert_eq!(align_x(40, 10, 100, Alignment::Left), 10);
    assert_eq!(align_x(40, 10, 100, Alignment::Center), 40);
    assert_eq!(align_x(40, 10, 100, Alignment::Right), 70);
}

#[test]
fn test_bubble_is_erased_and_text_drawn() {
    let page = blank_page(400, 200, GRAY);
    let rect = Rect::new(20, 20, 300, 80);
    let typesetter = block_typesetter(TypesetConfig::default());

    let (out, report) = typesetter.render(&page, &[translated(rect, "Hi")]);

    assert_eq!(report.rendered, 1);
    assert!(report.failures.is_empty());
    assert_eq!(*out.get_pixel(21, 21), Rgba([255, 255, 255, 255]));
    assert_eq!(*out.get_pixel(5, 5), Rgba([128, 128, 128, 255]));
    assert!(pixels_matching(&out, Rect::new(0, 0, 400, 200), [128, 128, 128])
        .iter()
        .all(|&(x, y)| !rect.contains(&Rect::new(x as i32, y as i32, 1, 1))));
    assert!(!pixels_matching(&out, rect, [0, 0, 0]).is_empty());
}

#[test]
fn test_left_alignment_starts_at_padding() {
    let page = blank_page(400, 200, GRAY);
    let rect = Rect::new(20, 20, 300, 80);

    let (out, _) = block_typesetter(aligned(Alignment::Left)).render(&page, &[translated(rect, "Hi")]);

    let min_x = pixels_matching(&out, rect, [0, 0, 0]).iter().map(|p| p.0).min();
    assert_eq!(min_x, Some((rect.x + PAD) as u32));
}

#[test]
fn test_right_alignment_ends_inside_padding() {
    let page = blank_page(400, 200, GRAY);
    let rect = Rect::new(20, 20, 300, 80);

    let (out, _) = block_typesetter(aligned(Alignment::Right)).render(&page, &[translated(rect, "Hi")]);

    let max_x = pixels_matching(&out, rect, [0, 0, 0])
        .iter()
        .map(|p| p.0)
        .max()
        .unwrap_or(0);
    assert!(max_x < (rect.right() - PAD) as u32);
    assert!(max_x > (rect.right() - PAD - 20) as u32);
}

#[test]
fn test_center_alignment_splits_slack() {
    let page = blank_page(400, 200, GRAY);
    let rect = Rect::new(20, 20, 300, 80);
    let renderer = MonospaceRenderer::default();
    let config = TypesetConfig::default();
    let width = renderer.text_width("Hi", config.start_scale()) as i32;
    let avail = rect.width - 2 * PAD;

    let (out, _) = block_typesetter(config).render(&page, &[translated(rect, "Hi")]);

    let min_x = pixels_matching(&out, rect, [0, 0, 0]).iter().map(|p| p.0).min();
    assert_eq!(min_x, Some((rect.x + PAD + (avail - width) / 2) as u32));
}

#[test]
fn test_empty_translation_still_covers_source() {
    let page = blank_page(300, 200, GRAY);
    let rect = Rect::new(10, 10, 120, 60);

    let (out, report) = block_typesetter(TypesetConfig::default())
        .render(&page, &[translated(rect, " \n\t ")]);

    assert_eq!(report.rendered, 0);
    assert_eq!(report.skipped_empty, 1);
    assert_eq!(pixels_matching(&out, rect, [255, 255, 255]).len(), rect.area() as usize);
}

#[test]
fn test_invalid_bubble_does_not_stop_the_page() {
    let page = blank_page(300, 200, GRAY);
    let bubbles = [
        translated(Rect::new(10, 10, 0, 20), "lost"),
        translated(Rect::new(50, 50, 200, 60), "ok"),
    ];

    let (out, report) = block_typesetter(TypesetConfig::default()).render(&page, &bubbles);

    assert_eq!(report.rendered, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 0);
    assert!(matches!(
        report.failures[0].error,
        RenderingError::InvalidBubbleDimensions { width: 0, .. }
    ));
    assert!(!pixels_matching(&out, bubbles[1].rect, [0, 0, 0]).is_empty());
}

#[test]
fn test_bubble_smaller_than_padding_is_filled_then_reported() {
    let page = blank_page(100, 100, GRAY);
    let rect = Rect::new(10, 10, 12, 12);

    let (out, report) = block_typesetter(TypesetConfig::default())
        .render(&page, &[translated(rect, "hey")]);

    assert_eq!(report.failures.len(), 1);
    assert_eq!(*out.get_pixel(11, 11), Rgba([255, 255, 255, 255]));
}

#[test]
fn test_bubble_outside_page_is_reported() {
    let page = blank_page(100, 100, GRAY);

    let (out, report) = block_typesetter(TypesetConfig::default())
        .render(&page, &[translated(Rect::new(500, 500, 50, 50), "far")]);

    assert!(matches!(
        report.failures[0].error,
        RenderingError::OutsidePage { x: 500, y: 500 }
    ));
    assert_eq!(out, page.to_rgba8());
}

#[test]
fn test_overflow_is_counted() {
    let page = blank_page(200, 200, GRAY);
    let rect = Rect::new(10, 10, 66, 36);
    let text = "word ".repeat(40);

    let (_, report) = block_typesetter(TypesetConfig::default()).render(&page, &[translated(rect, &text)]);

    assert_eq!(report.rendered, 1);
    assert_eq!(report.overflowed, 1);
}

#[test]
fn test_outline_is_stamped_around_text() {
    let page = blank_page(400, 200, GRAY);
    let rect = Rect::new(20, 20, 300, 80);
    let config = TypesetConfig {
        outline_width: 1,
        outline_color: [255, 0, 0],
        ..TypesetConfig::default()
    };

    let (out, _) = block_typesetter(config).render(&page, &[translated(rect, "Hi")]);

    assert!(!pixels_matching(&out, rect, [255, 0, 0]).is_empty());
    assert!(!pixels_matching(&out, rect, [0, 0, 0]).is_empty());
}

#[test]
fn test_render_is_deterministic() {
    let page = blank_page(400, 300, GRAY);
    let bubbles = [
        translated(Rect::new(20, 20, 200, 90), "Where did everyone go?"),
        translated(Rect::new(250, 150, 120, 120), "Over here!"),
    ];
    let typesetter = block_typesetter(TypesetConfig::default());

    let (first, _) = typesetter.render(&page, &bubbles);
    let (second, _) = typesetter.render(&page, &bubbles);

    assert_eq!(first, second);
}

#[test]
fn test_apply_persists_through_sink() -> anyhow::Result<()> {
    let page = blank_page(200, 100, GRAY);
    let sink = MemorySink::new();
    let typesetter = block_typesetter(TypesetConfig::default());

    let (id, report) = typesetter.apply(
        &page,
        &[translated(Rect::new(10, 10, 150, 60), "Hello")],
        &sink,
        "page01.png",
    )?;

    assert_eq!(id, "page01");
    assert_eq!(report.rendered, 1);
    let bytes = sink.get("page01.png").expect("page stored");
    let decoded = image::load_from_memory(&bytes)?;
    assert_eq!((decoded.width(), decoded.height()), (200, 100));
    Ok(())
}

#[test]
fn test_bad_font_is_rejected() {
    assert!(matches!(
        FontRenderer::from_bytes(vec![0, 1, 2, 3], 30.0),
        Err(RenderingError::FontLoad(_))
    ));

    let config = TypesetConfig {
        font_path: Some("/nonexistent/font.ttf".into()),
        ..TypesetConfig::default()
    };
    assert!(Typesetter::from_config(config).is_err());
    assert!(Typesetter::from_config(TypesetConfig::default()).is_ok());
}

#[test]
fn test_bundled_font_measures_text() -> anyhow::Result<()> {
    let renderer = FontRenderer::embedded(30.0)?;

    let short = renderer.text_width("Hi", 1.0);
    assert!(short > 0);
    assert!(renderer.text_width("Hi there", 1.0) > short);
    assert!(renderer.line_height(1.0) >= 30);
    assert!(!DEFAULT_FONT.is_empty());
    Ok(())
}

#[test]
fn test_default_typesetter_draws_glyphs_not_blocks() -> anyhow::Result<()> {
    let page = blank_page(300, 100, WHITE);
    let typesetter = Typesetter::from_config(TypesetConfig::default())?;

    let (canvas, report) =
        typesetter.render(&page, &[translated(Rect::new(0, 0, 300, 100), "Hi")]);
    assert_eq!(report.rendered, 1);

    let dark: Vec<(u32, u32)> = canvas
        .enumerate_pixels()
        .filter(|(_, _, p)| p.0[0] < 128)
        .map(|(x, y, _)| (x, y))
        .collect();
    assert!(!dark.is_empty());

    let (min_x, max_x) = (
        dark.iter().map(|p| p.0).min().unwrap_or(0),
        dark.iter().map(|p| p.0).max().unwrap_or(0),
    );
    let (min_y, max_y) = (
        dark.iter().map(|p| p.1).min().unwrap_or(0),
        dark.iter().map(|p| p.1).max().unwrap_or(0),
    );
    let box_area = (max_x - min_x + 1) * (max_y - min_y + 1);
    // Real letterforms leave most of their bounding box empty
    assert!(
        (dark.len() as f64) < box_area as f64 * 0.6,
        "{} dark pixels in a {} pixel box",
        dark.len(),
        box_area
    );

    let antialiased = canvas
        .pixels()
        .filter(|p| p.0[0] > 0 && p.0[0] < 255)
        .count();
    assert!(antialiased > 0);
    Ok(())
}
