use crate::core::errors::{DetectionError, DetectionResult};
use crate::detection::{RawText, TextDetector};
use crate::models::{Point, Quad};
use image::DynamicImage;
use ocrs::{ImageSource, OcrEngine, OcrEngineParams, TextItem};
use rten::Model;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, info};

const DETECTION_MODEL: &str = "text-detection.rten";
const RECOGNITION_MODEL: &str = "text-recognition.rten";

/// Default model location used by `ocrs-cli`
pub fn default_model_dir() -> Option<PathBuf> {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .ok()?;
    Some(Path::new(&home).join(".cache/ocrs"))
}

/// Initialize OCR engine with models from `model_dir`
pub fn init_ocr_engine(model_dir: &Path) -> DetectionResult<OcrEngine> {
    let detection_model_path = model_dir.join(DETECTION_MODEL);
    let recognition_model_path = model_dir.join(RECOGNITION_MODEL);

    if !detection_model_path.exists() || !recognition_model_path.exists() {
        return Err(DetectionError::ModelsMissing {
            detection: detection_model_path,
            recognition: recognition_model_path,
        });
    }

    let detection_model = Model::load_file(&detection_model_path)
        .map_err(|e| DetectionError::EngineInit(e.to_string()))?;
    let recognition_model = Model::load_file(&recognition_model_path)
        .map_err(|e| DetectionError::EngineInit(e.to_string()))?;

    OcrEngine::new(OcrEngineParams {
        detection_model: Some(detection_model),
        recognition_model: Some(recognition_model),
        ..Default::default()
    })
    .map_err(|e| DetectionError::EngineInit(e.to_string()))
}

/// Text detector backed by the ocrs engine. One result per recognized line.
pub struct OcrsDetector {
    model_dir: Option<PathBuf>,
    assumed_confidence: f32,
    // Loaded on first use, shared afterwards
    engine: Mutex<Option<Arc<OcrEngine>>>,
}

impl OcrsDetector {
    pub fn new(model_dir: Option<PathBuf>, assumed_confidence: f32) -> Self {
        Self {
            model_dir,
            assumed_confidence,
            engine: Mutex::new(None),
        }
    }

    fn engine(&self) -> DetectionResult<Arc<OcrEngine>> {
        let mut guard = self
            .engine
            .lock()
            .map_err(|_| DetectionError::EngineInit("engine lock poisoned".to_string()))?;
        if let Some(engine) = guard.as_ref() {
            return Ok(engine.clone());
        }

        let dir = self
            .model_dir
            .clone()
            .or_else(default_model_dir)
            .ok_or_else(|| DetectionError::EngineInit("no model directory".to_string()))?;
        info!("Initializing OCR engine from {}", dir.display());
        let engine = Arc::new(init_ocr_engine(&dir)?);
        *guard = Some(engine.clone());
        Ok(engine)
    }
}

impl TextDetector for OcrsDetector {
    fn detect(&self, region: &DynamicImage) -> DetectionResult<Vec<RawText>> {
        let engine = self.engine()?;
        let failed = |e: &dyn std::fmt::Display| DetectionError::EngineFailed(e.to_string());

        let img = region.to_rgb8();
        let source = ImageSource::from_bytes(img.as_raw(), img.dimensions()).map_err(|e| failed(&e))?;
        let input = engine.prepare_input(source).map_err(|e| failed(&e))?;

        let words = engine.detect_words(&input).map_err(|e| failed(&e))?;
        let lines = engine.find_text_lines(&input, &words);
        let recognized = engine.recognize_text(&input, &lines).map_err(|e| failed(&e))?;

        let results: Vec<RawText> = recognized
            .into_iter()
            .flatten()
            .map(|line| {
                let corners = line.rotated_rect().corners();
                RawText {
                    quad: Quad {
                        points: corners.map(|c| Point { x: c.x, y: c.y }),
                    },
                    text: line.to_string(),
                    confidence: self.assumed_confidence,
                }
            })
            .collect();

        debug!(lines = results.len(), "ocrs detection done");
        Ok(results)
    }

    fn name(&self) -> &str {
        "ocrs"
    }
}
