pub mod config;
pub mod errors;

pub use config::{
    Alignment, BatchConfig, ClusterConfig, Config, ExtractionConfig, PanelConfig,
    TranslationConfig, TypesetConfig,
};
pub use errors::{
    ConfigError, DetectionError, PageError, RenderingError, TranslationError,
};
