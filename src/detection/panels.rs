use crate::core::config::PanelConfig;
use crate::detection::contours;
use crate::detection::steps::{BlurStep, DilateStep, EdgeDetectionStep};
use crate::models::Panel;
use crate::pipeline::{DebugConfig, Pipeline};
use image::DynamicImage;
use std::sync::Arc;
use tracing::debug;

/// Segments a page into rectangular panels.
///
/// Blur, Canny and dilation run as a raster [`Pipeline`]; the external
/// contours of the resulting edge map become panels once their bounding rect
/// is larger than `min_area`. A page with no strong edges yields no panels.
pub struct PanelDetector {
    config: PanelConfig,
    pipeline: Pipeline,
}

impl PanelDetector {
    pub fn new(config: PanelConfig) -> Self {
        let pipeline = Pipeline::new()
            .add_step(Arc::new(BlurStep {
                sigma: config.blur_sigma,
            }))
            .add_step(Arc::new(EdgeDetectionStep {
                low_threshold: config.canny_low,
                high_threshold: config.canny_high,
            }))
            .add_step(Arc::new(DilateStep {
                radius: config.dilate_radius,
            }));
        Self { config, pipeline }
    }

    /// Dump each raster step's output for inspection
    pub fn with_debug(mut self, debug: DebugConfig) -> Self {
        self.pipeline = self.pipeline.with_debug(debug);
        self
    }

    pub fn config(&self) -> &PanelConfig {
        &self.config
    }

    pub fn detect(&self, img: &DynamicImage) -> Vec<Panel> {
        self.detect_named(img, "page")
    }

    /// Same as [`detect`](Self::detect); `page_name` labels debug dumps.
    pub fn detect_named(&self, img: &DynamicImage, page_name: &str) -> Vec<Panel> {
        let gray = img.to_luma8();
        let edges = self.pipeline.run(gray, page_name);
        let rects = contours::external_bounding_rects(&edges);
        let total = rects.len();

        let panels: Vec<Panel> = rects
            .into_iter()
            .filter(|r| r.area() > self.config.min_area)
            .map(|rect| Panel { rect })
            .collect();

        debug!(
            page = page_name,
            contours = total,
            panels = panels.len(),
            "panel segmentation done"
        );
        panels
    }
}

impl Default for PanelDetector {
    fn default() -> Self {
        Self::new(PanelConfig::default())
    }
}
