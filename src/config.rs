//! Service configuration
//!
//! Values come from the environment (after loading `.env` if present).
//! Binaries layer command-line flags on top of these.

use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TEMPLATES_DIR: &str = "templates";
pub const DEFAULT_KCL_BIN: &str = "kcl";
pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_RENDER_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_PROBE_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct Settings {
    pub catalog: CatalogSettings,
    pub render: RenderSettings,
    pub port: u16,
}

/// Where templates come from
#[derive(Debug, Clone)]
pub struct CatalogSettings {
    pub templates_dir: PathBuf,
    pub profile_path: Option<PathBuf>,
    pub fetch: FetchSettings,
}

/// Timeouts for remote profile entries
#[derive(Debug, Clone, Copy)]
pub struct FetchSettings {
    pub probe_timeout: Duration,
    pub download_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub kcl_binary: PathBuf,
    pub timeout: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            probe_timeout: Duration::from_secs(DEFAULT_PROBE_TIMEOUT_SECS),
            download_timeout: Duration::from_secs(DEFAULT_DOWNLOAD_TIMEOUT_SECS),
        }
    }
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            templates_dir: PathBuf::from(DEFAULT_TEMPLATES_DIR),
            profile_path: None,
            fetch: FetchSettings::default(),
        }
    }
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            kcl_binary: PathBuf::from(DEFAULT_KCL_BIN),
            timeout: Duration::from_secs(DEFAULT_RENDER_TIMEOUT_SECS),
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            catalog: CatalogSettings::default(),
            render: RenderSettings::default(),
            port: DEFAULT_PORT,
        }
    }
}

impl Settings {
    /// Load settings from environment variables
    ///
    /// - `TEMPLATES_DIR` (default `templates`)
    /// - `TEMPLATE_PROFILE_PATH` (optional)
    /// - `KCL_BIN` (default `kcl`)
    /// - `RENDER_TIMEOUT_SECS` (default 120)
    /// - `PROFILE_PROBE_TIMEOUT_SECS` (default 10)
    /// - `PROFILE_DOWNLOAD_TIMEOUT_SECS` (default 30)
    /// - `PORT` (default 8080)
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();

        Self {
            catalog: CatalogSettings {
                templates_dir: env_string("TEMPLATES_DIR")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_TEMPLATES_DIR)),
                profile_path: env_string("TEMPLATE_PROFILE_PATH").map(PathBuf::from),
                fetch: FetchSettings {
                    probe_timeout: env_secs("PROFILE_PROBE_TIMEOUT_SECS", DEFAULT_PROBE_TIMEOUT_SECS),
                    download_timeout: env_secs(
                        "PROFILE_DOWNLOAD_TIMEOUT_SECS",
                        DEFAULT_DOWNLOAD_TIMEOUT_SECS,
                    ),
                },
            },
            render: RenderSettings {
                kcl_binary: env_string("KCL_BIN")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_KCL_BIN)),
                timeout: env_secs("RENDER_TIMEOUT_SECS", DEFAULT_RENDER_TIMEOUT_SECS),
            },
            port: env_string("PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_PORT),
        }
    }
}

/// Whether `DEBUG` is set to a truthy value (`1`, `true`, `yes`).
pub fn debug_enabled() -> bool {
    env_string("DEBUG")
        .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Log filter used when `RUST_LOG` is unset.
pub fn default_log_filter() -> &'static str {
    if debug_enabled() {
        "info,claim_machinery=debug"
    } else {
        "info"
    }
}

/// Non-empty environment variable
fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_secs(key: &str, default: u64) -> Duration {
    Duration::from_secs(
        env_string(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let s = Settings::default();
        assert_eq!(s.catalog.templates_dir, PathBuf::from("templates"));
        assert!(s.catalog.profile_path.is_none());
        assert_eq!(s.catalog.fetch.probe_timeout, Duration::from_secs(10));
        assert_eq!(s.catalog.fetch.download_timeout, Duration::from_secs(30));
        assert_eq!(s.render.kcl_binary, PathBuf::from("kcl"));
        assert_eq!(s.render.timeout, Duration::from_secs(120));
        assert_eq!(s.port, 8080);
    }
}
