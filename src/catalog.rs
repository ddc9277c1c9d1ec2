//! Template Catalog
//!
//! Immutable, name-keyed snapshot of every claim template known to the
//! process. Built once from the templates directory and an optional profile;
//! a rebuild produces a new `Catalog` rather than mutating an existing one.

use std::collections::BTreeMap;
use std::path::PathBuf;

use tracing::info;

use crate::claim_template::{load_all_templates, ClaimTemplate};
use crate::config::CatalogSettings;
use crate::profile::{load_templates_from_profile, ProfileError};

/// Errors that abort a catalog build
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("failed to read templates directory '{}': {source}", .path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Profile(#[from] ProfileError),
}

/// Claim templates indexed by `metadata.name`, iterated in name order
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    templates: BTreeMap<String, ClaimTemplate>,
}

/// Result of a full catalog build
#[derive(Debug, Clone)]
pub struct CatalogBuild {
    pub catalog: Catalog,
    /// Profile entries that produced a template, in manifest order
    pub profile_sources: Vec<String>,
}

impl Catalog {
    /// Merge directory and profile templates. Profile entries replace
    /// directory entries with the same name.
    pub fn merge(directory: Vec<ClaimTemplate>, profile: Vec<ClaimTemplate>) -> Self {
        Self::from_templates(directory.into_iter().chain(profile))
    }

    /// Later templates replace earlier ones with the same name.
    pub fn from_templates(templates: impl IntoIterator<Item = ClaimTemplate>) -> Self {
        let mut map = BTreeMap::new();
        for template in templates {
            map.insert(template.metadata.name.clone(), template);
        }
        Self { templates: map }
    }

    /// Load the templates directory and optional profile, then merge.
    pub async fn build(settings: &CatalogSettings) -> Result<CatalogBuild, CatalogError> {
        let dir = &settings.templates_dir;
        let dir_templates = load_all_templates(dir).map_err(|e| CatalogError::ReadDir {
            path: dir.clone(),
            source: e,
        })?;
        info!("Using templates directory: {}", dir.display());
        info!("Loaded {} templates from directory", dir_templates.len());

        let (profile_templates, profile_sources) = match &settings.profile_path {
            Some(profile) => {
                let load = load_templates_from_profile(profile, &settings.fetch).await?;
                info!(
                    "Loaded {} templates from profile {}",
                    load.templates.len(),
                    profile.display()
                );
                for source in &load.sources {
                    info!("  source: {}", source);
                }
                (load.templates, load.sources)
            }
            None => (Vec::new(), Vec::new()),
        };

        let catalog = Self::merge(dir_templates, profile_templates);
        info!("Templates in use ({}):", catalog.len());
        for name in catalog.names() {
            info!("  {}", name);
        }

        Ok(CatalogBuild {
            catalog,
            profile_sources,
        })
    }

    pub fn get(&self, name: &str) -> Option<&ClaimTemplate> {
        self.templates.get(name)
    }

    /// All templates sorted by name
    pub fn list(&self) -> Vec<&ClaimTemplate> {
        self.templates.values().collect()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
