#![allow(dead_code)]

mod fixtures;
pub use fixtures::*;

// Re-export commonly used types from scanlate for tests
pub use scanlate::core::config::{
    Alignment, ClusterConfig, Config, ExtractionConfig, PanelConfig, TranslationConfig,
    TypesetConfig,
};
pub use scanlate::core::errors::{DetectionError, PageError, RenderingError, TranslationError};
pub use scanlate::detection::{RawText, RegionExtractor, TextDetector};
pub use scanlate::layout::BubbleClusterer;
pub use scanlate::models::{Bubble, Detection, Panel, Quad, Rect, TranslatedBubble};
pub use scanlate::translation::{TranslationContext, Translator};
pub use scanlate::typeset::{MonospaceRenderer, Typesetter};
