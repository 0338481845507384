use crate::core::errors::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Panel segmentation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub blur_sigma: f32,
    pub canny_low: f32,
    pub canny_high: f32,
    /// Chebyshev radius of the dilation that bridges broken edges
    pub dilate_radius: u8,
    /// Bounding rects at or below this area (px²) are discarded
    pub min_area: i64,
    /// Treat the whole page as one panel when none are found
    pub whole_page_fallback: bool,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            blur_sigma: 1.5,
            canny_low: 50.0,
            canny_high: 150.0,
            dilate_radius: 2,
            min_area: 50_000,
            whole_page_fallback: false,
        }
    }
}

/// Region extraction configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub min_confidence: f32,
    /// Detections larger than this fraction of the page are background noise
    pub max_page_fraction: f32,
    /// Directory holding `text-detection.rten` and `text-recognition.rten`
    pub ocr_model_dir: Option<PathBuf>,
    /// Confidence reported for ocrs lines, which carry no score of their own
    pub assumed_confidence: f32,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.2,
            max_page_fraction: 0.10,
            ocr_model_dir: None,
            assumed_confidence: 0.9,
        }
    }
}

/// Bubble clustering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    pub margin_x: i32,
    pub margin_y: i32,
    /// Emit bubbles in reverse discovery order
    pub reverse_output: bool,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            margin_x: 10,
            margin_y: 10,
            reverse_output: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    Left,
    #[default]
    Center,
    Right,
}

/// Typesetting configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TypesetConfig {
    pub base_scale: f32,
    /// Upward bias applied to `base_scale` before the search starts
    pub scale_bias: f32,
    pub max_scale: f32,
    pub min_scale: f32,
    pub scale_step: f32,
    pub padding: u32,
    /// Pixel size of a glyph em at scale 1.0
    pub font_px_per_scale: f32,
    pub background: [u8; 3],
    pub text_color: [u8; 3],
    pub outline_color: [u8; 3],
    pub outline_width: u32,
    pub alignment: Alignment,
    pub font_path: Option<PathBuf>,
}

impl Default for TypesetConfig {
    fn default() -> Self {
        Self {
            base_scale: 0.7,
            scale_bias: 1.2,
            max_scale: 1.2,
            min_scale: 0.3,
            scale_step: 0.1,
            padding: 8,
            font_px_per_scale: 30.0,
            background: [255, 255, 255],
            text_color: [0, 0, 0],
            outline_color: [255, 255, 255],
            outline_width: 0,
            alignment: Alignment::Center,
            font_path: None,
        }
    }
}

impl TypesetConfig {
    /// Scale the wrap-and-scale search starts from, never below `min_scale`.
    pub fn start_scale(&self) -> f32 {
        (self.base_scale * self.scale_bias)
            .min(self.max_scale)
            .max(self.min_scale)
    }
}

/// Translation boundary configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationConfig {
    pub source_lang: Option<String>,
    pub target_lang: String,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
    /// Confidence attached to successful translations
    pub trust_score: f32,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            source_lang: None,
            target_lang: "en".to_string(),
            max_retries: 3,
            retry_delay_ms: 1000,
            trust_score: 0.9,
        }
    }
}

/// Multi-page job configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    pub max_concurrent_pages: usize,
    /// Concurrent calls allowed into the detection and translation engines
    pub engine_concurrency: usize,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_concurrent_pages: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            engine_concurrency: 4,
        }
    }
}

/// Full pipeline configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub panels: PanelConfig,
    pub extraction: ExtractionConfig,
    pub clustering: ClusterConfig,
    pub typesetting: TypesetConfig,
    pub translation: TranslationConfig,
    pub batch: BatchConfig,
}

impl Config {
    /// Load a (possibly partial) JSON config; missing keys keep their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&raw)?;
        Ok(config)
    }

    pub fn from_json_str(raw: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        let unit = |field: &'static str, value: f32| {
            if (0.0..=1.0).contains(&value) {
                Ok(())
            } else {
                Err(ConfigError::OutOfUnitRange { field, value })
            }
        };
        unit("extraction.min_confidence", self.extraction.min_confidence)?;
        unit("extraction.max_page_fraction", self.extraction.max_page_fraction)?;
        unit("extraction.assumed_confidence", self.extraction.assumed_confidence)?;
        unit("translation.trust_score", self.translation.trust_score)?;

        let p = &self.panels;
        if p.blur_sigma <= 0.0 {
            return Err(ConfigError::InvalidPanels(format!(
                "blur_sigma must be > 0, got {}",
                p.blur_sigma
            )));
        }
        if p.canny_low > p.canny_high {
            return Err(ConfigError::InvalidPanels(format!(
                "canny_low ({}) exceeds canny_high ({})",
                p.canny_low, p.canny_high
            )));
        }
        if p.min_area < 0 {
            return Err(ConfigError::InvalidPanels(format!(
                "min_area must be >= 0, got {}",
                p.min_area
            )));
        }

        let c = &self.clustering;
        if c.margin_x < 0 || c.margin_y < 0 {
            return Err(ConfigError::InvalidClustering(format!(
                "merge margins must be >= 0, got ({}, {})",
                c.margin_x, c.margin_y
            )));
        }

        let t = &self.typesetting;
        if t.min_scale <= 0.0 || t.scale_step <= 0.0 {
            return Err(ConfigError::InvalidTypesetting(format!(
                "min_scale and scale_step must be > 0, got {} and {}",
                t.min_scale, t.scale_step
            )));
        }
        if t.base_scale <= 0.0 || t.scale_bias <= 0.0 {
            return Err(ConfigError::InvalidTypesetting(format!(
                "base_scale and scale_bias must be > 0, got {} and {}",
                t.base_scale, t.scale_bias
            )));
        }
        if t.min_scale > t.max_scale {
            return Err(ConfigError::InvalidTypesetting(format!(
                "min_scale ({}) exceeds max_scale ({})",
                t.min_scale, t.max_scale
            )));
        }
        if t.font_px_per_scale <= 0.0 {
            return Err(ConfigError::InvalidTypesetting(format!(
                "font_px_per_scale must be > 0, got {}",
                t.font_px_per_scale
            )));
        }

        let b = &self.batch;
        if b.max_concurrent_pages == 0 || b.engine_concurrency == 0 {
            return Err(ConfigError::InvalidBatch(
                "max_concurrent_pages and engine_concurrency must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}
