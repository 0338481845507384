use crate::core::config::{Config, TranslationConfig};
use crate::core::errors::{PageError, PageResult};
use crate::detection::{LimitedDetector, PanelDetector, RegionExtractor, TextDetector};
use crate::layout::{BubbleClusterer, form_bubbles};
use crate::models::TranslatedBubble;
use crate::output::OutputSink;
use crate::translation::{LimitedTranslator, TranslationContext, Translator, translate_bubbles};
use crate::typeset::{RenderReport, Typesetter};
use anyhow::Result;
use image::{DynamicImage, GrayImage, RgbaImage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

/// Debug configuration for pipeline execution
#[derive(Clone, Debug)]
pub struct DebugConfig {
    /// Root directory for debug outputs
    pub output_dir: PathBuf,
    /// Whether debug mode is enabled
    pub enabled: bool,
}

impl DebugConfig {
    /// The directory must be empty or non-existent
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        if output_dir.exists() {
            let entries = std::fs::read_dir(&output_dir)?;
            if entries.count() > 0 {
                return Err(anyhow::anyhow!(
                    "Debug directory is not empty: {}",
                    output_dir.display()
                ));
            }
        } else {
            std::fs::create_dir_all(&output_dir)?;
        }

        Ok(Self {
            output_dir,
            enabled: true,
        })
    }

    /// Write `image` as `<step_dir>/<page stem>.png`. Failures are logged,
    /// never propagated.
    pub fn dump(&self, step_dir: &str, page_name: &str, image: &DynamicImage) {
        if !self.enabled {
            return;
        }
        if let Err(e) = self.try_dump(step_dir, page_name, image) {
            warn!(step = step_dir, page = page_name, "debug dump failed: {}", e);
        }
    }

    fn try_dump(&self, step_dir: &str, page_name: &str, image: &DynamicImage) -> Result<()> {
        let dir = self.output_dir.join(step_dir);
        std::fs::create_dir_all(&dir)?;
        let stem = Path::new(page_name)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| page_name.to_string());
        let path = dir.join(format!("{}.png", stem));
        image
            .save(&path)
            .map_err(|e| anyhow::anyhow!("Failed to save debug image: {}", e))?;
        debug!("debug: saved {}", path.display());
        Ok(())
    }
}

/// Step directory name, e.g. `02_edge_detection`
fn step_dir_name(index: usize, step_name: &str) -> String {
    format!(
        "{:02}_{}",
        index,
        step_name.to_lowercase().replace(' ', "_")
    )
}

/// One raster transform in a [`Pipeline`].
pub trait PipelineStep: Send + Sync {
    fn process(&self, image: GrayImage) -> GrayImage;

    /// Human-readable name for this step (used in logs and debug dumps)
    fn name(&self) -> &str;
}

/// Composable chain of grayscale raster steps.
#[derive(Clone, Default)]
pub struct Pipeline {
    steps: Vec<Arc<dyn PipelineStep>>,
    debug: Option<DebugConfig>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dump the input and every step's output under the debug directory
    pub fn with_debug(mut self, debug: DebugConfig) -> Self {
        self.debug = Some(debug);
        self
    }

    pub fn add_step(mut self, step: Arc<dyn PipelineStep>) -> Self {
        self.steps.push(step);
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step in order on `input`.
    pub fn run(&self, input: GrayImage, page_name: &str) -> GrayImage {
        if let Some(debug) = &self.debug {
            debug.dump("00_input", page_name, &DynamicImage::ImageLuma8(input.clone()));
        }

        let mut image = input;
        for (idx, step) in self.steps.iter().enumerate() {
            debug!(page = page_name, step = step.name(), "running step");
            image = step.process(image);

            if let Some(debug) = &self.debug {
                debug.dump(
                    &step_dir_name(idx + 1, step.name()),
                    page_name,
                    &DynamicImage::ImageLuma8(image.clone()),
                );
            }
        }
        image
    }
}

/// What happened to one page.
#[derive(Debug, Default)]
pub struct PageReport {
    pub name: String,
    /// Sink identifier of the persisted page
    pub output: Option<String>,
    pub panels: usize,
    pub used_whole_page: bool,
    pub detections: usize,
    pub panel_failures: usize,
    pub bubbles: Vec<TranslatedBubble>,
    pub translation_attempts: u32,
    /// Set when translation fell back to the source text
    pub translation_failure: Option<String>,
    pub render: RenderReport,
}

/// A page to translate.
#[derive(Debug, Clone)]
pub struct PageSource {
    pub name: String,
    pub path: PathBuf,
}

impl PageSource {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { name, path }
    }
}

/// Runs one page through every stage: panels, regions, bubbles,
/// translation, typesetting.
pub struct PageTranslator {
    panels: PanelDetector,
    extractor: RegionExtractor,
    clusterer: BubbleClusterer,
    translator: Arc<dyn Translator>,
    translation: TranslationConfig,
    context: Option<TranslationContext>,
    typesetter: Typesetter,
    debug: Option<DebugConfig>,
}

impl PageTranslator {
    pub fn new(
        config: &Config,
        detector: Arc<dyn TextDetector>,
        translator: Arc<dyn Translator>,
        typesetter: Typesetter,
    ) -> Self {
        Self {
            panels: PanelDetector::new(config.panels.clone()),
            extractor: RegionExtractor::new(detector, config.extraction.clone())
                .with_whole_page_fallback(config.panels.whole_page_fallback),
            clusterer: BubbleClusterer::new(config.clustering.clone()),
            translator,
            translation: config.translation.clone(),
            context: None,
            typesetter,
            debug: None,
        }
    }

    /// Notes passed to every translation call
    pub fn with_context(mut self, context: TranslationContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_debug(mut self, debug: DebugConfig) -> Self {
        self.panels = self.panels.with_debug(debug.clone());
        self.debug = Some(debug);
        self
    }

    /// Translate an in-memory page. Every stage degrades instead of failing,
    /// so this always yields an image.
    #[instrument(skip(self, image), fields(width = image.width(), height = image.height()))]
    pub fn process_image(&self, image: &DynamicImage, page_name: &str) -> (RgbaImage, PageReport) {
        let panels = self.panels.detect_named(image, page_name);
        let extraction = self.extractor.extract(image, &panels);
        let bubbles = form_bubbles(&extraction.detections, &self.clusterer);
        let translated = translate_bubbles(
            self.translator.as_ref(),
            &bubbles,
            &self.translation,
            self.context.as_ref(),
        );
        let (canvas, render) = self.typesetter.render(image, &translated.bubbles);

        if let Some(debug) = &self.debug {
            debug.dump("typeset", page_name, &DynamicImage::ImageRgba8(canvas.clone()));
        }

        let report = PageReport {
            name: page_name.to_string(),
            output: None,
            panels: panels.len(),
            used_whole_page: extraction.used_whole_page,
            detections: extraction.detections.len(),
            panel_failures: extraction.failures.len(),
            bubbles: translated.bubbles,
            translation_attempts: translated.attempts,
            translation_failure: translated.failure.map(|e| e.to_string()),
            render,
        };
        info!(
            page = page_name,
            panels = report.panels,
            detections = report.detections,
            bubbles = report.bubbles.len(),
            "page translated"
        );
        (canvas, report)
    }

    /// Load, translate and persist one page. Only reading the source or
    /// writing the result can fail.
    #[instrument(skip(self, source, sink), fields(page = %source.name))]
    pub fn process_page(&self, source: &PageSource, sink: &dyn OutputSink) -> PageResult<PageReport> {
        let image = image::open(&source.path).map_err(|e| PageError::ImageLoad {
            name: source.name.clone(),
            source: e,
        })?;

        let (canvas, mut report) = self.process_image(&image, &source.name);
        let id = sink
            .persist(&source.name, &canvas)
            .map_err(|e| PageError::Persist {
                name: source.name.clone(),
                reason: format!("{:#}", e),
            })?;
        report.output = Some(id);
        Ok(report)
    }
}

/// Wrap both engines so that at most `permits` calls run at once across
/// every page worker.
pub fn limit_engines(
    detector: Arc<dyn TextDetector>,
    translator: Arc<dyn Translator>,
    permits: usize,
) -> (Arc<dyn TextDetector>, Arc<dyn Translator>) {
    let semaphore = Arc::new(Semaphore::new(permits));
    (
        Arc::new(LimitedDetector::new(detector, semaphore.clone())),
        Arc::new(LimitedTranslator::new(translator, semaphore)),
    )
}

#[derive(Debug)]
pub struct PageOutcome {
    pub name: String,
    pub result: PageResult<PageReport>,
}

/// Per-page outcomes of a batch, in input order.
#[derive(Debug)]
pub struct BatchReport {
    pub job_id: Uuid,
    pub pages: Vec<PageOutcome>,
}

impl BatchReport {
    pub fn succeeded(&self) -> usize {
        self.pages.iter().filter(|p| p.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.pages.len() - self.succeeded()
    }
}

/// Translates many pages concurrently. Each page runs on a blocking worker;
/// a page's failure stays in its own outcome.
pub struct BatchRunner {
    translator: Arc<PageTranslator>,
    sink: Arc<dyn OutputSink>,
    permits: Arc<Semaphore>,
}

impl BatchRunner {
    pub fn new(
        translator: Arc<PageTranslator>,
        sink: Arc<dyn OutputSink>,
        max_concurrent_pages: usize,
    ) -> Self {
        Self {
            translator,
            sink,
            permits: Arc::new(Semaphore::new(max_concurrent_pages.max(1))),
        }
    }

    pub async fn run(&self, pages: Vec<PageSource>) -> BatchReport {
        let job_id = Uuid::new_v4();
        info!(%job_id, pages = pages.len(), "batch started");

        let tasks = pages.into_iter().map(|source| {
            let translator = self.translator.clone();
            let sink = self.sink.clone();
            let permits = self.permits.clone();
            async move {
                let name = source.name.clone();
                let result = match permits.acquire_owned().await {
                    Ok(_permit) => tokio::task::spawn_blocking(move || {
                        translator.process_page(&source, sink.as_ref())
                    })
                    .await
                    .unwrap_or_else(|e| {
                        Err(PageError::Worker {
                            name: name.clone(),
                            reason: e.to_string(),
                        })
                    }),
                    Err(e) => Err(PageError::Worker {
                        name: name.clone(),
                        reason: e.to_string(),
                    }),
                };
                if let Err(e) = &result {
                    warn!("page failed: {}", e);
                }
                PageOutcome { name, result }
            }
        });

        let pages = futures::future::join_all(tasks).await;
        let report = BatchReport { job_id, pages };
        info!(
            %job_id,
            succeeded = report.succeeded(),
            failed = report.failed(),
            "batch finished"
        );
        report
    }
}
