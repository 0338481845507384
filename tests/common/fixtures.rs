use image::{DynamicImage, Rgb, RgbImage};
use imageproc::drawing::draw_filled_rect_mut;
use imageproc::rect::Rect as PixelRect;
use scanlate::core::config::{Config, TranslationConfig, TypesetConfig};
use scanlate::core::errors::{DetectionError, DetectionResult, TranslationError, TranslationResult};
use scanlate::detection::{RawText, TextDetector};
use scanlate::models::{Bubble, Detection, Quad, Rect};
use scanlate::translation::{TranslationContext, Translator};
use scanlate::typeset::{MonospaceRenderer, Typesetter};
use scanlate::PageTranslator;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const BLACK: Rgb<u8> = Rgb([0, 0, 0]);
pub const GRAY: Rgb<u8> = Rgb([128, 128, 128]);

/// Plain page filled with `color`.
pub fn blank_page(width: u32, height: u32, color: Rgb<u8>) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, color))
}

/// White page with a black hollow frame (4px stroke) around each rect.
pub fn page_with_frames(width: u32, height: u32, frames: &[Rect]) -> DynamicImage {
    let mut img = RgbImage::from_pixel(width, height, WHITE);
    for f in frames {
        draw_filled_rect_mut(
            &mut img,
            PixelRect::at(f.x, f.y).of_size(f.width as u32, f.height as u32),
            BLACK,
        );
        draw_filled_rect_mut(
            &mut img,
            PixelRect::at(f.x + 4, f.y + 4).of_size(f.width as u32 - 8, f.height as u32 - 8),
            WHITE,
        );
    }
    DynamicImage::ImageRgb8(img)
}

/// Save `image` as a PNG inside `dir`, returning its path.
pub fn write_page(dir: &TempDir, name: &str, image: &DynamicImage) -> std::path::PathBuf {
    let path = dir.path().join(name);
    image
        .save_with_format(&path, image::ImageFormat::Png)
        .expect("Failed to save test page");
    path
}

pub fn raw(x: i32, y: i32, w: i32, h: i32, text: &str, confidence: f32) -> RawText {
    RawText {
        quad: Quad::from_rect(&Rect::new(x, y, w, h)),
        text: text.to_string(),
        confidence,
    }
}

pub fn detection(x: i32, y: i32, w: i32, h: i32, text: &str) -> Detection {
    let rect = Rect::new(x, y, w, h);
    Detection {
        text: text.to_string(),
        confidence: 0.9,
        rect,
        raw_quad: Quad::from_rect(&rect),
    }
}

pub fn bubble(text: &str) -> Bubble {
    Bubble {
        rect: Rect::new(0, 0, 100, 40),
        member_indices: vec![0],
        text: text.to_string(),
    }
}

/// Detector returning the same results for every region.
#[derive(Default)]
pub struct StubDetector {
    pub results: Vec<RawText>,
    calls: AtomicUsize,
}

impl StubDetector {
    pub fn new(results: Vec<RawText>) -> Self {
        Self {
            results,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TextDetector for StubDetector {
    fn detect(&self, _region: &DynamicImage) -> DetectionResult<Vec<RawText>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.results.clone())
    }

    fn name(&self) -> &str {
        "stub"
    }
}

/// Detector whose engine always fails.
pub struct FailingDetector;

impl TextDetector for FailingDetector {
    fn detect(&self, _region: &DynamicImage) -> DetectionResult<Vec<RawText>> {
        Err(DetectionError::EngineFailed("engine offline".to_string()))
    }
}

/// Upper-cases every text after failing transiently `failures` times.
#[derive(Default)]
pub struct FlakyTranslator {
    pub failures: usize,
    /// Return only the first `keep` outputs when set
    pub keep: Option<usize>,
    calls: AtomicUsize,
}

impl FlakyTranslator {
    pub fn reliable() -> Self {
        Self::default()
    }

    pub fn failing_first(failures: usize) -> Self {
        Self {
            failures,
            ..Self::default()
        }
    }

    pub fn short(keep: usize) -> Self {
        Self {
            keep: Some(keep),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Translator for FlakyTranslator {
    fn translate(
        &self,
        texts: &[String],
        _target_lang: &str,
        _context: Option<&TranslationContext>,
    ) -> TranslationResult<Vec<String>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.failures {
            return Err(TranslationError::EngineFailed(format!("timeout #{}", call + 1)));
        }
        let keep = self.keep.unwrap_or(texts.len());
        Ok(texts.iter().take(keep).map(|t| t.to_uppercase()).collect())
    }

    fn name(&self) -> &str {
        "flaky"
    }
}

pub fn fast_translation_config() -> TranslationConfig {
    TranslationConfig {
        retry_delay_ms: 0,
        ..TranslationConfig::default()
    }
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.translation = fast_translation_config();
    config
}

pub fn block_typesetter(config: TypesetConfig) -> Typesetter {
    Typesetter::new(config, Arc::new(MonospaceRenderer::default()))
}

/// Page translator with the stub detector and an upper-casing translator.
pub fn stub_page_translator(config: &Config, detector: Arc<StubDetector>) -> PageTranslator {
    PageTranslator::new(
        config,
        detector,
        Arc::new(FlakyTranslator::reliable()),
        block_typesetter(config.typesetting.clone()),
    )
}
