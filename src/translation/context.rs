//! JSON-backed translation memory.
//!
//! The file holds one object:
//!
//! ```json
//! {
//!   "_global": { "tone": "casual" },
//!   "Some Series": {
//!     "_series": { "title": "Some Series" },
//!     "ch_001": { "recap": "..." }
//!   }
//! }
//! ```
//!
//! Lookups merge global, then series, then chapter keys, later levels
//! winning.

use crate::translation::TranslationContext;
use anyhow::{Context, Result};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

const GLOBAL_KEY: &str = "_global";
const SERIES_KEY: &str = "_series";

#[derive(Debug)]
pub struct ContextStore {
    path: PathBuf,
    data: Map<String, Value>,
}

impl ContextStore {
    /// Open the store at `path`, creating an empty one if the file is absent.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read context store {}", path.display()))?;
            let data: Map<String, Value> = serde_json::from_str(&raw)
                .with_context(|| format!("Invalid context store {}", path.display()))?;
            Ok(Self { path, data })
        } else {
            let mut data = Map::new();
            data.insert(GLOBAL_KEY.to_string(), Value::Object(Map::new()));
            let store = Self { path, data };
            store.save()?;
            Ok(store)
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Merged notes for a series and chapter.
    pub fn get(&self, series: Option<&str>, chapter: Option<&str>) -> Map<String, Value> {
        let mut merged = Map::new();
        extend(&mut merged, self.data.get(GLOBAL_KEY));

        if let Some(series) = series {
            let blob = self.data.get(series).and_then(Value::as_object);
            extend(&mut merged, blob.and_then(|b| b.get(SERIES_KEY)));
            if let Some(chapter) = chapter {
                extend(&mut merged, blob.and_then(|b| b.get(chapter)));
            }
        }
        merged
    }

    /// Merged notes wrapped for the translation boundary.
    pub fn context_for(
        &self,
        series: Option<&str>,
        chapter: Option<&str>,
        source_lang: Option<&str>,
    ) -> TranslationContext {
        TranslationContext {
            source_lang: source_lang.map(str::to_string),
            notes: self.get(series, chapter),
        }
    }

    /// Merge `entries` into the chapter level if given, else the series
    /// level, else global, and save.
    pub fn update(
        &mut self,
        series: Option<&str>,
        chapter: Option<&str>,
        entries: Map<String, Value>,
    ) -> Result<()> {
        let target = match series {
            Some(series) => {
                let blob = object_entry(&mut self.data, series);
                object_entry(blob, chapter.unwrap_or(SERIES_KEY))
            }
            None => object_entry(&mut self.data, GLOBAL_KEY),
        };
        target.extend(entries);
        self.save()
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let raw = serde_json::to_string_pretty(&self.data)?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("Failed to write context store {}", self.path.display()))
    }
}

fn extend(into: &mut Map<String, Value>, level: Option<&Value>) {
    if let Some(Value::Object(map)) = level {
        for (k, v) in map {
            into.insert(k.clone(), v.clone());
        }
    }
}

/// The object stored under `key`, replacing any non-object value.
fn object_entry<'a>(map: &'a mut Map<String, Value>, key: &str) -> &'a mut Map<String, Value> {
    let slot = map
        .entry(key.to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    if !slot.is_object() {
        *slot = Value::Object(Map::new());
    }
    match slot {
        Value::Object(inner) => inner,
        _ => unreachable!("slot was just set to an object"),
    }
}
