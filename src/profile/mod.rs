//! Template Profiles
//!
//! A profile is a YAML manifest listing extra claim templates to load, each
//! entry being either a local file path or an `http(s)://` URL:
//!
//! ```yaml
//! templates:
//!   - ./templates/volumeclaim.yaml
//!   - https://raw.githubusercontent.com/org/repo/main/vsphere-vm.yaml
//! ```
//!
//! `tenplates` is accepted as an alias of `templates` for manifests written
//! against older releases; both lists are concatenated, `templates` first.
//!
//! Manifest read and parse errors are returned. Every per-entry failure
//! (unreachable URL, failed download, missing file, invalid template) is
//! logged and the entry skipped.

pub mod fetch;

pub use fetch::{FetchError, RemoteFetcher};

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{info, warn};
use url::Url;

use crate::claim_template::{load_claim_template, ClaimTemplate};
use crate::config::FetchSettings;

/// Profile manifest as written on disk
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileManifest {
    #[serde(default)]
    pub templates: Vec<String>,

    /// Legacy spelling, merged after `templates`
    #[serde(default)]
    pub tenplates: Vec<String>,
}

impl ProfileManifest {
    /// All entries from both spellings, in manifest order.
    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.templates
            .iter()
            .chain(self.tenplates.iter())
            .map(|s| s.as_str())
    }
}

/// Where a profile entry points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateSource {
    Remote(Url),
    Local(PathBuf),
}

impl TemplateSource {
    /// Classify a trimmed, non-empty manifest entry.
    pub fn classify(entry: &str) -> Result<Self, url::ParseError> {
        let lower = entry.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            Url::parse(entry).map(TemplateSource::Remote)
        } else {
            Ok(TemplateSource::Local(PathBuf::from(entry)))
        }
    }
}

/// Templates loaded from a profile plus the entries they came from.
#[derive(Debug, Clone, Default)]
pub struct ProfileLoad {
    pub templates: Vec<ClaimTemplate>,
    /// Original manifest entry for each loaded template (same order)
    pub sources: Vec<String>,
}

/// Errors from profile loading. Only manifest-level failures surface here.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    #[error("open profile '{path}': {source}")]
    Open {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("parse profile yaml '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("parse profile yaml '{path}': no document")]
    Empty { path: String },

    #[error("build http client: {0}")]
    Client(#[source] FetchError),
}

/// Read and parse a profile manifest.
///
/// A file with no YAML document (empty, or only comments) is an error.
pub fn read_manifest(path: impl AsRef<Path>) -> Result<ProfileManifest, ProfileError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ProfileError::Open {
        path: path.display().to_string(),
        source: e,
    })?;
    if !has_document(&content) {
        return Err(ProfileError::Empty {
            path: path.display().to_string(),
        });
    }
    serde_yaml::from_str(&content).map_err(|e| ProfileError::Parse {
        path: path.display().to_string(),
        source: e,
    })
}

fn has_document(content: &str) -> bool {
    content.lines().any(|line| {
        let line = line.trim();
        !line.is_empty() && !line.starts_with('#') && line != "---" && line != "..."
    })
}

/// Load claim templates from a profile manifest.
///
/// Entries are resolved sequentially, in manifest order.
pub async fn load_templates_from_profile(
    path: impl AsRef<Path>,
    settings: &FetchSettings,
) -> Result<ProfileLoad, ProfileError> {
    let manifest = read_manifest(path)?;
    let fetcher = RemoteFetcher::new(settings).map_err(ProfileError::Client)?;

    let mut out = ProfileLoad::default();
    for entry in manifest.entries() {
        let entry = entry.trim();
        if entry.is_empty() {
            continue;
        }
        if let Some(template) = resolve_entry(entry, &fetcher).await {
            out.templates.push(template);
            out.sources.push(entry.to_string());
        }
    }

    info!(
        "Loaded {} of {} profile templates",
        out.templates.len(),
        manifest.entries().filter(|e| !e.trim().is_empty()).count()
    );
    Ok(out)
}

async fn resolve_entry(entry: &str, fetcher: &RemoteFetcher) -> Option<ClaimTemplate> {
    let source = match TemplateSource::classify(entry) {
        Ok(source) => source,
        Err(e) => {
            warn!("Skipping invalid URL {}: {}", entry, e);
            return None;
        }
    };

    let loaded = match source {
        TemplateSource::Remote(url) => {
            if let Err(e) = fetcher.validate(&url).await {
                warn!("Skipping unreachable URL {}: {}", entry, e);
                return None;
            }
            let file = match fetcher.download_to_temp(&url).await {
                Ok(file) => file,
                Err(e) => {
                    warn!("Failed to download {}: {} (skipping)", entry, e);
                    return None;
                }
            };
            // `file` is removed once parsed
            load_claim_template(file.path())
        }
        TemplateSource::Local(path) => {
            if let Err(e) = std::fs::metadata(&path) {
                warn!("Missing local template {}: {} (skipping)", entry, e);
                return None;
            }
            load_claim_template(&path)
        }
    };

    match loaded {
        Ok(template) => Some(template),
        Err(e) => {
            warn!("Failed to load template {}: {} (skipping)", entry, e);
            None
        }
    }
}
