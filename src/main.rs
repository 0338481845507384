use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use scanlate::core::config::{Alignment, Config};
use scanlate::detection::{OcrsDetector, TextDetector};
use scanlate::pipeline::limit_engines;
use scanlate::translation::{ContextStore, EchoTranslator, ReplayTranslator, Translator};
use scanlate::typeset::Typesetter;
use scanlate::{BatchRunner, DebugConfig, DirectorySink, PageSource, PageTranslator};

#[derive(Parser)]
#[command(name = "scanlate")]
#[command(about = "Replace the text in comic pages with translations")]
struct Cli {
    /// Page images to translate
    #[arg(value_name = "IMAGE", required = true)]
    images: Vec<PathBuf>,

    /// Output directory for typeset pages
    #[arg(short, long, value_name = "DIR", default_value = "translated")]
    out: PathBuf,

    /// JSON config file; missing keys keep their defaults
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// TrueType/OpenType font for typesetting (bundled DejaVu Sans if unset)
    #[arg(long, value_name = "FILE")]
    font: Option<PathBuf>,

    /// Horizontal alignment of typeset lines
    #[arg(long, value_enum)]
    align: Option<Alignment>,

    /// Target language code
    #[arg(long, value_name = "LANG")]
    target_lang: Option<String>,

    /// JSON map of source text to translation (otherwise text is echoed)
    #[arg(long, value_name = "FILE")]
    translations: Option<PathBuf>,

    /// Translation memory file
    #[arg(long, value_name = "FILE")]
    context_store: Option<PathBuf>,

    /// Series key in the translation memory
    #[arg(long)]
    series: Option<String>,

    /// Chapter key in the translation memory
    #[arg(long)]
    chapter: Option<String>,

    /// Scan the whole page when no panels are found
    #[arg(long)]
    whole_page_fallback: bool,

    /// Save debug outputs to directory (must be empty)
    #[arg(long, value_name = "DIR")]
    debug_out: Option<PathBuf>,

    /// Pages processed concurrently
    #[arg(short, long)]
    jobs: Option<usize>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_env("SCANLATE_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose { "scanlate=debug" } else { "scanlate=info" })
    });
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(args: &Cli) -> anyhow::Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_json_file(path)?,
        None => Config::default(),
    };

    if let Some(font) = &args.font {
        config.typesetting.font_path = Some(font.clone());
    }
    if let Some(align) = args.align {
        config.typesetting.alignment = align;
    }
    if let Some(lang) = &args.target_lang {
        config.translation.target_lang = lang.clone();
    }
    if args.whole_page_fallback {
        config.panels.whole_page_fallback = true;
    }
    if let Some(jobs) = args.jobs {
        config.batch.max_concurrent_pages = jobs;
    }

    config.validate()?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_logging(args.verbose);

    let config = load_config(&args)?;

    let translator: Arc<dyn Translator> = match &args.translations {
        Some(path) => {
            let replay = ReplayTranslator::from_json_file(path)?;
            info!(entries = replay.len(), "replaying recorded translations");
            Arc::new(replay)
        }
        None => {
            info!("no translation table given, echoing source text");
            Arc::new(EchoTranslator)
        }
    };
    let detector: Arc<dyn TextDetector> = Arc::new(OcrsDetector::new(
        config.extraction.ocr_model_dir.clone(),
        config.extraction.assumed_confidence,
    ));
    let (detector, translator) =
        limit_engines(detector, translator, config.batch.engine_concurrency);

    let typesetter = Typesetter::from_config(config.typesetting.clone())?;
    let mut page = PageTranslator::new(&config, detector, translator, typesetter);

    if let Some(path) = &args.context_store {
        let store = ContextStore::open(path)?;
        page = page.with_context(store.context_for(
            args.series.as_deref(),
            args.chapter.as_deref(),
            config.translation.source_lang.as_deref(),
        ));
    }
    if let Some(dir) = &args.debug_out {
        page = page.with_debug(DebugConfig::new(dir.clone())?);
    }

    let sink = DirectorySink::new(args.out.clone())
        .with_context(|| format!("Cannot use output directory {}", args.out.display()))?;
    let runner = BatchRunner::new(
        Arc::new(page),
        Arc::new(sink),
        config.batch.max_concurrent_pages,
    );

    let pages = args.images.iter().map(PageSource::from_path).collect();
    let report = runner.run(pages).await;

    for outcome in &report.pages {
        match &outcome.result {
            Ok(page) => println!(
                "{}: {} bubbles -> {}",
                outcome.name,
                page.bubbles.len(),
                page.output.as_deref().unwrap_or("-")
            ),
            Err(e) => error!("{}: {}", outcome.name, e),
        }
    }
    println!(
        "\n{} of {} pages translated (job {})",
        report.succeeded(),
        report.pages.len(),
        report.job_id
    );

    if report.failed() > 0 {
        anyhow::bail!("{} page(s) failed", report.failed());
    }
    Ok(())
}
