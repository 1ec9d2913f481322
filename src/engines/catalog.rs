//! Neural model catalog
//!
//! The catalog is piper's `voices.json`, cached next to the downloaded
//! models. Model identifiers have the form `piper/<language>/<voice key>`,
//! so the language is always the second path component.

use super::EngineError;
use log::{debug, info};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// Synthetic first entry of the language list, meaning "no filter"
pub const ALL_LANGUAGES: &str = "All Languages";

/// Prefix shared by every model identifier
const ID_PREFIX: &str = "piper";

/// Catalog file name inside the models directory
const CATALOG_FILE: &str = "voices.json";

#[derive(Debug, Deserialize)]
struct RawVoice {
    language: RawLanguage,
    #[serde(default)]
    files: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawLanguage {
    family: String,
}

/// One installable model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// piper voice key, e.g. "en_US-lessac-medium"
    pub key: String,
    /// Language family, e.g. "en"
    pub language: String,
    /// Remote paths of the model files, relative to the repository root
    pub files: Vec<String>,
}

impl CatalogEntry {
    /// Full model identifier
    pub fn id(&self) -> String {
        format!("{}/{}/{}", ID_PREFIX, self.language, self.key)
    }
}

/// Installable models and their local cache
pub struct ModelCatalog {
    /// Entries keyed by model identifier
    entries: BTreeMap<String, CatalogEntry>,

    /// Where model files are cached
    models_dir: PathBuf,

    /// Base URL model file paths are resolved against
    file_base_url: String,
}

impl ModelCatalog {
    /// Load the cached catalog, fetching it from `url` when absent
    pub fn load(url: &str, models_dir: &Path) -> Result<Self, EngineError> {
        let cache = models_dir.join(CATALOG_FILE);

        let json = if cache.exists() {
            debug!("Reading cached model catalog from {:?}", cache);
            std::fs::read_to_string(&cache)?
        } else {
            info!("Fetching model catalog from {}", url);
            let body = reqwest::blocking::get(url)
                .and_then(|r| r.error_for_status())
                .and_then(|r| r.text())
                .map_err(|e| EngineError::Download(format!("catalog {}: {}", url, e)))?;
            std::fs::create_dir_all(models_dir)?;
            std::fs::write(&cache, &body)?;
            body
        };

        Self::from_json(&json, models_dir, &file_base_url(url))
    }

    /// Parse a catalog document
    pub fn from_json(
        json: &str,
        models_dir: &Path,
        file_base_url: &str,
    ) -> Result<Self, EngineError> {
        let raw: HashMap<String, RawVoice> = serde_json::from_str(json)
            .map_err(|e| EngineError::Metadata(format!("catalog: {}", e)))?;

        let entries = raw
            .into_iter()
            .map(|(key, voice)| {
                let mut files: Vec<String> = voice.files.into_keys().collect();
                files.sort();
                let entry = CatalogEntry {
                    key,
                    language: voice.language.family,
                    files,
                };
                (entry.id(), entry)
            })
            .collect::<BTreeMap<_, _>>();

        debug!("Model catalog has {} entries", entries.len());

        Ok(Self {
            entries,
            models_dir: models_dir.to_path_buf(),
            file_base_url: file_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// All model identifiers, sorted
    pub fn ids(&self) -> Vec<String> {
        self.entries.keys().cloned().collect()
    }

    /// Look up a model by full identifier or bare voice key
    pub fn resolve(&self, model: &str) -> Option<&CatalogEntry> {
        self.entries
            .get(model)
            .or_else(|| self.entries.values().find(|e| e.key == model))
    }

    /// Local paths of a model's network and config files
    pub fn model_paths(&self, entry: &CatalogEntry) -> (PathBuf, PathBuf) {
        (
            self.models_dir.join(format!("{}.onnx", entry.key)),
            self.models_dir.join(format!("{}.onnx.json", entry.key)),
        )
    }

    /// Whether both model files are present locally
    pub fn is_cached(&self, model: &str) -> bool {
        match self.resolve(model) {
            Some(entry) => {
                let (onnx, config) = self.model_paths(entry);
                onnx.exists() && config.exists()
            }
            None => false,
        }
    }

    /// Download the network and config files of a model
    pub fn download(&self, entry: &CatalogEntry) -> Result<(), EngineError> {
        std::fs::create_dir_all(&self.models_dir)?;

        for remote in entry
            .files
            .iter()
            .filter(|p| p.ends_with(".onnx") || p.ends_with(".onnx.json"))
        {
            let filename = Path::new(remote)
                .file_name()
                .and_then(|f| f.to_str())
                .ok_or_else(|| EngineError::Metadata(format!("invalid file path {}", remote)))?;
            let url = format!("{}/{}", self.file_base_url, remote);
            info!("Downloading {}", url);

            let mut resp = reqwest::blocking::get(&url)
                .and_then(|r| r.error_for_status())
                .map_err(|e| EngineError::Download(format!("{}: {}", url, e)))?;

            // Write to a side file so an interrupted download never looks cached
            let dest = self.models_dir.join(filename);
            let partial = self.models_dir.join(format!("{}.part", filename));
            let mut file = std::fs::File::create(&partial)?;
            resp.copy_to(&mut file)
                .map_err(|e| EngineError::Download(format!("{}: {}", url, e)))?;
            std::fs::rename(&partial, &dest)?;
        }

        Ok(())
    }
}

/// Language component of a model identifier
pub fn language_of(model: &str) -> Option<&str> {
    model.split('/').nth(1)
}

/// Deduplicated, sorted languages of `models`, with [`ALL_LANGUAGES`] first
pub fn languages<'a>(models: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let unique: BTreeSet<&str> = models.into_iter().filter_map(language_of).collect();
    std::iter::once(ALL_LANGUAGES.to_string())
        .chain(unique.into_iter().map(str::to_string))
        .collect()
}

/// Directory that model file paths resolve against, given the catalog URL
///
/// Hugging Face serves raw text under `/raw/` but LFS blobs under `/resolve/`.
fn file_base_url(catalog_url: &str) -> String {
    let base = catalog_url
        .rsplit_once('/')
        .map(|(dir, _)| dir)
        .unwrap_or(catalog_url);
    base.replacen("/raw/", "/resolve/", 1)
}
