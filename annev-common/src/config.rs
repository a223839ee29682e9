//! Configuration loading for the review session
//!
//! Resolution priority for the API base URL:
//! 1. Explicit argument from the embedding application (highest)
//! 2. Environment variable (`ANNEV_API_BASE`)
//! 3. TOML config file (`<config-dir>/annev/config.toml`)
//! 4. Compiled default (fallback)
//!
//! A missing or malformed config file never terminates startup: it
//! degrades to the compiled defaults with a logged warning.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Compiled default backend base URL (the development backend)
pub const DEFAULT_API_BASE: &str = "http://localhost:8000";

/// Environment variable overriding the API base URL
pub const ENV_API_BASE: &str = "ANNEV_API_BASE";

/// What happens to in-memory annotation edits when the user switches
/// the annotation *version* of the same basename
///
/// Switching the basename always discards edits (a Document is
/// replaced wholesale across an identity change); whether a pure
/// version switch should behave the same way is a site policy, so it
/// is configuration rather than a hard-coded answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionSwitchPolicy {
    /// Version switch replaces the annotation set with the fetched one
    #[default]
    DiscardEdits,

    /// Keep the in-memory annotation set across a version switch of
    /// the same basename, but only when the fetched text is identical
    PreserveEditsIfTextUnchanged,
}

/// Session configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Backend base URL, no trailing slash
    pub api_base: String,

    /// Named reviewers whose sign-off flags are rendered and persisted
    pub reviewers: Vec<String>,

    /// Edit-retention policy for version switches
    pub version_switch: VersionSwitchPolicy,

    /// Push the live annotation set to the backend before applying a
    /// selection change (the empty-save guard still applies)
    pub autosave_on_switch: bool,

    /// Override for the last-selection state file location
    pub state_file: Option<PathBuf>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            reviewers: vec!["jirsi".to_string(), "judith".to_string()],
            version_switch: VersionSwitchPolicy::default(),
            autosave_on_switch: false,
            state_file: None,
        }
    }
}

/// On-disk schema of the optional config file; every field optional so
/// partial files merge over the defaults
#[derive(Debug, Default, Deserialize)]
struct TomlConfig {
    api_base: Option<String>,
    reviewers: Option<Vec<String>>,
    version_switch: Option<VersionSwitchPolicy>,
    autosave_on_switch: Option<bool>,
    state_file: Option<PathBuf>,
}

impl TomlConfig {
    fn parse(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }
}

impl SessionConfig {
    /// Resolve configuration from the standard locations
    pub fn load(explicit_api_base: Option<&str>) -> Self {
        Self::load_with_file(explicit_api_base, default_config_path().as_deref())
    }

    /// Resolve configuration against a specific config file path
    ///
    /// Split out of [`SessionConfig::load`] so tests can point at a
    /// temporary file instead of the platform config directory.
    pub fn load_with_file(explicit_api_base: Option<&str>, path: Option<&Path>) -> Self {
        let file = match path {
            Some(p) if p.exists() => match TomlConfig::parse(p) {
                Ok(parsed) => parsed,
                Err(e) => {
                    tracing::warn!(path = %p.display(), error = %e, "Ignoring malformed config file");
                    TomlConfig::default()
                }
            },
            _ => TomlConfig::default(),
        };

        let defaults = Self::default();

        // Priority: explicit argument > environment > config file > default
        let api_base = explicit_api_base
            .map(str::to_string)
            .or_else(|| std::env::var(ENV_API_BASE).ok().filter(|v| !v.is_empty()))
            .or(file.api_base)
            .unwrap_or(defaults.api_base);

        Self {
            api_base: api_base.trim_end_matches('/').to_string(),
            reviewers: file.reviewers.unwrap_or(defaults.reviewers),
            version_switch: file.version_switch.unwrap_or(defaults.version_switch),
            autosave_on_switch: file
                .autosave_on_switch
                .unwrap_or(defaults.autosave_on_switch),
            state_file: file.state_file,
        }
    }
}

/// Platform config file location, `<config-dir>/annev/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("annev").join("config.toml"))
}

/// Platform location for the last-selection state file
pub fn default_state_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("annev").join("selection.json"))
}
