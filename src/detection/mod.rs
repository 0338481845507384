pub mod contours;
pub mod ocr;
pub mod panels;
pub mod regions;
pub mod steps;

use crate::core::errors::DetectionResult;
use crate::models::Quad;
use image::DynamicImage;
use std::sync::Arc;
use tokio::sync::Semaphore;

pub use ocr::OcrsDetector;
pub use panels::PanelDetector;
pub use regions::{ExtractionOutcome, PanelFailure, RegionExtractor};

/// One text instance as reported by a detection engine, in the coordinate
/// space of the image it was given.
#[derive(Debug, Clone, PartialEq)]
pub struct RawText {
    pub quad: Quad,
    pub text: String,
    pub confidence: f32,
}

/// Capability interface for a text-detection engine.
///
/// An empty result is a valid answer; `Err` means the engine itself failed.
pub trait TextDetector: Send + Sync {
    fn detect(&self, region: &DynamicImage) -> DetectionResult<Vec<RawText>>;

    fn name(&self) -> &str {
        "text detector"
    }
}

/// Caps concurrent calls into a shared detection engine.
pub struct LimitedDetector {
    inner: Arc<dyn TextDetector>,
    permits: Arc<Semaphore>,
}

impl LimitedDetector {
    pub fn new(inner: Arc<dyn TextDetector>, permits: Arc<Semaphore>) -> Self {
        Self { inner, permits }
    }
}

impl TextDetector for LimitedDetector {
    fn detect(&self, region: &DynamicImage) -> DetectionResult<Vec<RawText>> {
        // The semaphore is never closed, so acquire cannot fail.
        let _permit = futures::executor::block_on(self.permits.acquire()).ok();
        self.inner.detect(region)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}
