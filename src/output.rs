use anyhow::{Context, Result};
use image::{ImageFormat, RgbaImage};
use std::collections::{BTreeMap, HashMap};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Where typeset pages end up. Returns an identifier for the stored page.
pub trait OutputSink: Send + Sync {
    fn persist(&self, page_name: &str, image: &RgbaImage) -> Result<String>;
}

fn page_stem(page_name: &str) -> String {
    Path::new(page_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| page_name.to_string())
}

/// Output names handed out so far, so two pages sharing a stem
/// (`p1.jpg`, `p1.png`) cannot overwrite each other.
#[derive(Debug, Default)]
struct NameClaims {
    owners: Mutex<HashMap<String, String>>,
}

impl NameClaims {
    fn claim(&self, key: &str, page_name: &str) -> Result<()> {
        let mut owners = self
            .owners
            .lock()
            .map_err(|_| anyhow::anyhow!("output name registry poisoned"))?;
        match owners.get(key) {
            Some(owner) if owner != page_name => {
                anyhow::bail!("{} would overwrite the output of {}", page_name, owner)
            }
            Some(_) => Ok(()),
            None => {
                owners.insert(key.to_string(), page_name.to_string());
                Ok(())
            }
        }
    }
}

/// Writes `<page-stem>.png` files into a directory. A second page with the
/// same stem is refused.
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
    claims: NameClaims,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create output directory {}", dir.display()))?;
        Ok(Self {
            dir,
            claims: NameClaims::default(),
        })
    }

    pub fn path_for(&self, page_name: &str) -> PathBuf {
        self.dir.join(format!("{}.png", page_stem(page_name)))
    }
}

impl OutputSink for DirectorySink {
    fn persist(&self, page_name: &str, image: &RgbaImage) -> Result<String> {
        let path = self.path_for(page_name);
        self.claims.claim(&page_stem(page_name), page_name)?;
        image
            .save_with_format(&path, ImageFormat::Png)
            .with_context(|| format!("Failed to save {}", path.display()))?;
        Ok(path.display().to_string())
    }
}

/// Keeps PNG-encoded pages in memory, keyed by page stem.
#[derive(Debug, Default)]
pub struct MemorySink {
    pages: Mutex<BTreeMap<String, Vec<u8>>>,
    claims: NameClaims,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, page_name: &str) -> Option<Vec<u8>> {
        self.pages.lock().ok()?.get(&page_stem(page_name)).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.pages
            .lock()
            .map(|p| p.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.pages.lock().map(|p| p.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OutputSink for MemorySink {
    fn persist(&self, page_name: &str, image: &RgbaImage) -> Result<String> {
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .context("Failed to encode page")?;

        let key = page_stem(page_name);
        self.claims.claim(&key, page_name)?;
        self.pages
            .lock()
            .map_err(|_| anyhow::anyhow!("memory sink poisoned"))?
            .insert(key.clone(), bytes);
        Ok(key)
    }
}
