pub mod context;

use crate::core::config::TranslationConfig;
use crate::core::errors::{TranslationError, TranslationResult};
use crate::models::{Bubble, TranslatedBubble};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

pub use context::ContextStore;

/// Metadata handed to the engine alongside the texts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranslationContext {
    pub source_lang: Option<String>,
    /// Merged series/chapter notes (title, glossary, character names, ...)
    pub notes: Map<String, Value>,
}

/// Capability interface for a translation engine.
///
/// Implementations return exactly one output per input, in input order.
pub trait Translator: Send + Sync {
    fn translate(
        &self,
        texts: &[String],
        target_lang: &str,
        context: Option<&TranslationContext>,
    ) -> TranslationResult<Vec<String>>;

    fn name(&self) -> &str {
        "translator"
    }

    /// Fixed trust reported by this engine, overriding the configured score.
    fn trust(&self) -> Option<f32> {
        None
    }
}

impl TranslationError {
    /// Whether another attempt could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, TranslationError::EngineFailed(_))
    }
}

/// Result of the translation boundary for one page.
#[derive(Debug, Default)]
pub struct TranslationOutcome {
    pub bubbles: Vec<TranslatedBubble>,
    pub attempts: u32,
    /// Set when every attempt failed and the source texts were echoed
    pub failure: Option<TranslationError>,
}

/// Translate bubble texts through `translator`, retrying transient failures
/// with exponential backoff.
///
/// When the engine gives up, every bubble keeps its source text with
/// confidence 0.0. A short response echoes the missing tail the same way;
/// surplus entries are dropped.
pub fn translate_bubbles(
    translator: &dyn Translator,
    bubbles: &[Bubble],
    config: &TranslationConfig,
    context: Option<&TranslationContext>,
) -> TranslationOutcome {
    if bubbles.is_empty() {
        return TranslationOutcome::default();
    }

    let texts: Vec<String> = bubbles.iter().map(|b| b.text.clone()).collect();
    let max_attempts = config.max_retries.max(1);
    let mut attempts = 0;
    let mut last_error = None;

    while attempts < max_attempts {
        if attempts > 0 {
            let delay = config.retry_delay_ms.saturating_mul(1 << (attempts - 1).min(16));
            std::thread::sleep(Duration::from_millis(delay));
        }
        attempts += 1;

        match translator.translate(&texts, &config.target_lang, context) {
            Ok(translated) => {
                let trust = translator.trust().unwrap_or(config.trust_score);
                return TranslationOutcome {
                    bubbles: merge_translations(bubbles, translated, trust),
                    attempts,
                    failure: None,
                };
            }
            Err(e) => {
                warn!(
                    engine = translator.name(),
                    attempt = attempts,
                    "translation attempt failed: {}",
                    e
                );
                let transient = e.is_transient();
                last_error = Some(e);
                if !transient {
                    break;
                }
            }
        }
    }

    let failure = match last_error {
        Some(e) if attempts > 1 => TranslationError::RetriesExhausted {
            attempts,
            last: e.to_string(),
        },
        Some(e) => e,
        None => TranslationError::EngineFailed("no attempt made".to_string()),
    };
    warn!("translation fell back to source text: {}", failure);

    TranslationOutcome {
        bubbles: echo(bubbles),
        attempts,
        failure: Some(failure),
    }
}

fn merge_translations(bubbles: &[Bubble], translated: Vec<String>, trust: f32) -> Vec<TranslatedBubble> {
    if translated.len() != bubbles.len() {
        warn!(
            expected = bubbles.len(),
            got = translated.len(),
            "translation count mismatch"
        );
    }

    let mut translated = translated.into_iter();
    bubbles
        .iter()
        .map(|b| match translated.next() {
            Some(text) => TranslatedBubble {
                rect: b.rect,
                text,
                confidence: trust,
            },
            None => TranslatedBubble {
                rect: b.rect,
                text: b.text.clone(),
                confidence: 0.0,
            },
        })
        .collect()
}

fn echo(bubbles: &[Bubble]) -> Vec<TranslatedBubble> {
    bubbles
        .iter()
        .map(|b| TranslatedBubble {
            rect: b.rect,
            text: b.text.clone(),
            confidence: 0.0,
        })
        .collect()
}

/// Returns its input unchanged. Useful for re-typesetting without an engine.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoTranslator;

impl Translator for EchoTranslator {
    fn translate(
        &self,
        texts: &[String],
        _target_lang: &str,
        _context: Option<&TranslationContext>,
    ) -> TranslationResult<Vec<String>> {
        Ok(texts.to_vec())
    }

    fn name(&self) -> &str {
        "echo"
    }

    fn trust(&self) -> Option<f32> {
        Some(0.0)
    }
}

/// Replays translations recorded in a JSON object of `source -> target`.
#[derive(Debug, Clone, Default)]
pub struct ReplayTranslator {
    table: HashMap<String, String>,
}

impl ReplayTranslator {
    pub fn new(table: HashMap<String, String>) -> Self {
        Self { table }
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> TranslationResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| TranslationError::TableLoad {
            path: path.to_path_buf(),
            source,
        })?;
        let table: HashMap<String, String> = serde_json::from_str(&raw)?;
        debug!(entries = table.len(), "loaded translation table");
        Ok(Self { table })
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl Translator for ReplayTranslator {
    fn translate(
        &self,
        texts: &[String],
        _target_lang: &str,
        _context: Option<&TranslationContext>,
    ) -> TranslationResult<Vec<String>> {
        texts
            .iter()
            .map(|t| {
                self.table
                    .get(t)
                    .cloned()
                    .ok_or_else(|| TranslationError::MissingEntry(t.clone()))
            })
            .collect()
    }

    fn name(&self) -> &str {
        "replay"
    }
}

/// Caps concurrent calls into a shared translation engine.
pub struct LimitedTranslator {
    inner: Arc<dyn Translator>,
    permits: Arc<Semaphore>,
}

impl LimitedTranslator {
    pub fn new(inner: Arc<dyn Translator>, permits: Arc<Semaphore>) -> Self {
        Self { inner, permits }
    }
}

impl Translator for LimitedTranslator {
    fn translate(
        &self,
        texts: &[String],
        target_lang: &str,
        context: Option<&TranslationContext>,
    ) -> TranslationResult<Vec<String>> {
        let _permit = futures::executor::block_on(self.permits.acquire()).ok();
        self.inner.translate(texts, target_lang, context)
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    fn trust(&self) -> Option<f32> {
        self.inner.trust()
    }
}
