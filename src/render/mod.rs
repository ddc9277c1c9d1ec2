//! Rendering claim templates with the KCL CLI.
//!
//! Each render spawns `kcl run <source> [--tag <tag>] -D key=value ...`,
//! waits for it under a timeout, and normalizes stdout. Failures come back as
//! [`RenderError`] with the captured stderr so the caller decides whether to
//! log, retry, or answer with a server error.

pub mod normalize;

pub use normalize::replace_triple_quotes;

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::claim_template::ClaimTemplate;
use crate::config::RenderSettings;
use crate::params::{value_to_string, ParamMap};

/// Errors from a render call
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to start renderer '{}': {source}", .binary.display())]
    Spawn {
        binary: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("KCL execution from source {source_ref} failed ({status}): {stderr}")]
    Failed {
        source_ref: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("KCL execution from source {source_ref} timed out after {after:?}")]
    Timeout { source_ref: String, after: Duration },

    #[error("rendering produced empty result for template {0}")]
    EmptyOutput(String),

    #[error("failed to write YAML to file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Something that turns a source reference and parameters into a document
#[async_trait]
pub trait ClaimRenderer: Send + Sync {
    async fn render(
        &self,
        source: &str,
        tag: Option<&str>,
        params: &ParamMap,
    ) -> Result<String, RenderError>;
}

/// Renderer backed by the `kcl` binary
#[derive(Debug, Clone)]
pub struct KclRenderer {
    binary: PathBuf,
    timeout: Duration,
}

impl KclRenderer {
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    pub fn from_settings(settings: &RenderSettings) -> Self {
        Self::new(settings.kcl_binary.clone(), settings.timeout)
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }
}

impl Default for KclRenderer {
    fn default() -> Self {
        Self::from_settings(&RenderSettings::default())
    }
}

/// Command-line arguments for one render, after the binary name.
pub fn build_args(source: &str, tag: Option<&str>, params: &ParamMap) -> Vec<String> {
    let mut args = vec!["run".to_string(), source.to_string()];
    if let Some(tag) = tag.filter(|t| !t.is_empty()) {
        args.push("--tag".to_string());
        args.push(tag.to_string());
    }
    for (key, value) in params {
        args.push("-D".to_string());
        args.push(format!("{}={}", key, value_to_string(value)));
    }
    args
}

#[async_trait]
impl ClaimRenderer for KclRenderer {
    async fn render(
        &self,
        source: &str,
        tag: Option<&str>,
        params: &ParamMap,
    ) -> Result<String, RenderError> {
        for (key, value) in params {
            debug!("{}={}", key, value_to_string(value));
        }

        let child = Command::new(&self.binary)
            .args(build_args(source, tag, params))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RenderError::Spawn {
                binary: self.binary.clone(),
                source: e,
            })?;

        // Dropping the future on timeout kills the child.
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| RenderError::Timeout {
                source_ref: source.to_string(),
                after: self.timeout,
            })?
            .map_err(|e| RenderError::Spawn {
                binary: self.binary.clone(),
                source: e,
            })?;

        if !output.status.success() {
            return Err(RenderError::Failed {
                source_ref: source.to_string(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(replace_triple_quotes(&stdout))
    }
}

/// Render `template` with already-resolved parameters.
///
/// Blank output is an error even when the renderer exits cleanly.
pub async fn render_template(
    renderer: &dyn ClaimRenderer,
    template: &ClaimTemplate,
    params: &ParamMap,
) -> Result<String, RenderError> {
    let rendered = renderer
        .render(&template.spec.source, template.spec.tag.as_deref(), params)
        .await?;
    if rendered.trim().is_empty() {
        return Err(RenderError::EmptyOutput(template.name().to_string()));
    }
    Ok(rendered)
}

/// Write a rendered document to `dest`.
pub async fn write_rendered(dest: impl AsRef<Path>, rendered: &str) -> Result<(), RenderError> {
    let dest = dest.as_ref();
    tokio::fs::write(dest, rendered)
        .await
        .map_err(|e| RenderError::Write {
            path: dest.to_path_buf(),
            source: e,
        })
}
