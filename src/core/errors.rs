// Error taxonomy for the page pipeline.
//
// Only `PageError` ever aborts a page. The other enums are recorded in the
// per-stage outcome types and trigger the graceful fallbacks.

use std::path::PathBuf;
use thiserror::Error;

/// Text-detection engine errors
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("OCR models not found (expected {detection} and {recognition})")]
    ModelsMissing {
        detection: PathBuf,
        recognition: PathBuf,
    },

    #[error("Detection engine initialisation failed: {0}")]
    EngineInit(String),

    #[error("Detection engine failed: {0}")]
    EngineFailed(String),

    #[error("Empty crop for panel at ({x}, {y})")]
    EmptyCrop { x: i32, y: i32 },
}

/// Translation engine errors
#[derive(Debug, Error)]
pub enum TranslationError {
    #[error("Translation engine failed: {0}")]
    EngineFailed(String),

    #[error("No translation recorded for {0:?}")]
    MissingEntry(String),

    #[error("Gave up after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: String },

    #[error("Failed to read translation table {path}: {source}")]
    TableLoad {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid translation table: {0}")]
    TableFormat(#[from] serde_json::Error),
}

/// Per-bubble rendering errors
#[derive(Debug, Error)]
pub enum RenderingError {
    #[error("Invalid bubble dimensions: {width}x{height} with padding {padding}")]
    InvalidBubbleDimensions {
        width: i32,
        height: i32,
        padding: u32,
    },

    #[error("Bubble at ({x}, {y}) lies outside the page")]
    OutsidePage { x: i32, y: i32 },

    #[error("Font loading failed: {0}")]
    FontLoad(String),
}

/// Page-boundary I/O errors. These are the only fatal errors for a page.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("Cannot read page {name}: {source}")]
    ImageLoad {
        name: String,
        #[source]
        source: image::ImageError,
    },

    #[error("Cannot write page {name}: {reason}")]
    Persist { name: String, reason: String },

    #[error("Page worker for {name} failed: {reason}")]
    Worker { name: String, reason: String },
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{field} must be in [0.0, 1.0], got {value}")]
    OutOfUnitRange { field: &'static str, value: f32 },

    #[error("Invalid panel config: {0}")]
    InvalidPanels(String),

    #[error("Invalid clustering config: {0}")]
    InvalidClustering(String),

    #[error("Invalid typesetting config: {0}")]
    InvalidTypesetting(String),

    #[error("Invalid batch config: {0}")]
    InvalidBatch(String),
}

pub type DetectionResult<T> = Result<T, DetectionError>;
pub type TranslationResult<T> = Result<T, TranslationError>;
pub type RenderingResult<T> = Result<T, RenderingError>;
pub type PageResult<T> = Result<T, PageError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
