pub mod core;
pub mod detection;
pub mod layout;
pub mod models;
pub mod output;
pub mod pipeline;
pub mod translation;
pub mod typeset;

pub use crate::core::config::{Alignment, Config};
pub use models::{Bubble, Detection, Panel, Point, Quad, Rect, TranslatedBubble};
pub use output::{DirectorySink, MemorySink, OutputSink};
pub use pipeline::{
    BatchReport, BatchRunner, DebugConfig, PageReport, PageSource, PageTranslator, Pipeline,
    PipelineStep,
};
