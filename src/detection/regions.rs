use crate::core::config::ExtractionConfig;
use crate::core::errors::{DetectionError, DetectionResult};
use crate::detection::{RawText, TextDetector};
use crate::models::{Detection, Panel, Rect};
use image::{DynamicImage, GenericImageView};
use std::sync::Arc;
use tracing::{debug, warn};

/// An engine failure for one panel. The panel contributes no detections.
#[derive(Debug)]
pub struct PanelFailure {
    pub panel: Panel,
    pub error: DetectionError,
}

/// Page-scoped detections aggregated over every panel.
#[derive(Debug, Default)]
pub struct ExtractionOutcome {
    pub detections: Vec<Detection>,
    pub failures: Vec<PanelFailure>,
    /// The page had no panels and was scanned as one
    pub used_whole_page: bool,
}

/// Runs the detection engine once per panel crop and maps the results back
/// into page space.
pub struct RegionExtractor {
    detector: Arc<dyn TextDetector>,
    config: ExtractionConfig,
    whole_page_fallback: bool,
}

impl RegionExtractor {
    pub fn new(detector: Arc<dyn TextDetector>, config: ExtractionConfig) -> Self {
        Self {
            detector,
            config,
            whole_page_fallback: false,
        }
    }

    /// Scan the full page as a single panel when segmentation finds none.
    pub fn with_whole_page_fallback(mut self, enabled: bool) -> Self {
        self.whole_page_fallback = enabled;
        self
    }

    pub fn extract(&self, image: &DynamicImage, panels: &[Panel]) -> ExtractionOutcome {
        let (width, height) = image.dimensions();
        let page_area = width as i64 * height as i64;

        let mut outcome = ExtractionOutcome::default();
        let whole_page;
        let panels = if panels.is_empty() && self.whole_page_fallback {
            outcome.used_whole_page = true;
            whole_page = [Panel {
                rect: Rect::new(0, 0, width as i32, height as i32),
            }];
            &whole_page[..]
        } else {
            panels
        };

        for panel in panels {
            match self.extract_panel(image, panel, page_area) {
                Ok(mut found) => outcome.detections.append(&mut found),
                Err(error) => {
                    warn!(
                        engine = self.detector.name(),
                        x = panel.rect.x,
                        y = panel.rect.y,
                        "panel skipped: {}",
                        error
                    );
                    outcome.failures.push(PanelFailure {
                        panel: *panel,
                        error,
                    });
                }
            }
        }

        debug!(
            panels = panels.len(),
            detections = outcome.detections.len(),
            failures = outcome.failures.len(),
            "region extraction done"
        );
        outcome
    }

    fn extract_panel(
        &self,
        image: &DynamicImage,
        panel: &Panel,
        page_area: i64,
    ) -> DetectionResult<Vec<Detection>> {
        let (width, height) = image.dimensions();
        let crop_rect = panel.rect.clamp_to(width, height);
        if crop_rect.is_empty() {
            return Err(DetectionError::EmptyCrop {
                x: panel.rect.x,
                y: panel.rect.y,
            });
        }

        let crop = image.crop_imm(
            crop_rect.x as u32,
            crop_rect.y as u32,
            crop_rect.width as u32,
            crop_rect.height as u32,
        );
        let raw = self.detector.detect(&crop)?;

        Ok(raw
            .into_iter()
            .filter_map(|r| self.to_page_space(r, &crop_rect, page_area))
            .collect())
    }

    /// Offset a raw result into page space, then apply the filters in order:
    /// confidence floor, empty text, oversized box.
    fn to_page_space(&self, raw: RawText, crop: &Rect, page_area: i64) -> Option<Detection> {
        if raw.confidence < self.config.min_confidence {
            return None;
        }
        let text = raw.text.trim();
        if text.is_empty() {
            return None;
        }

        let raw_quad = raw.quad.translate(crop.x as f32, crop.y as f32);
        let rect = raw_quad.bounding_rect();
        if rect.area() as f64 > self.config.max_page_fraction as f64 * page_area as f64 {
            return None;
        }

        Some(Detection {
            text: text.to_string(),
            confidence: raw.confidence,
            rect,
            raw_quad,
        })
    }
}
