//! Last-selection persistence
//!
//! Remembers the most recently applied `(id, version)` selection in a
//! small JSON state file so a restarted session reopens where the
//! reviewer left off. Strictly best-effort: every I/O failure is
//! logged and ignored, and the restored value is validated against the
//! freshly fetched lists before use.

use annev_common::config::SessionConfig;
use annev_common::model::SelectionKey;
use std::path::PathBuf;

/// Best-effort state file for the last applied selection
pub struct SelectionStore {
    path: PathBuf,
}

impl SelectionStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Enabled only when the configuration names a state file;
    /// `annev_common::config::default_state_path` gives the
    /// conventional platform location
    pub fn from_config(config: &SessionConfig) -> Option<Self> {
        config.state_file.clone().map(Self::new)
    }

    /// The persisted selection, if one can be read
    pub fn load(&self) -> Option<SelectionKey> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Could not read selection state");
                return None;
            }
        };
        match serde_json::from_str::<SelectionKey>(&raw) {
            Ok(key) => Some(key),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Ignoring malformed selection state");
                None
            }
        }
    }

    /// Persist an applied selection; failures are logged, never
    /// propagated
    pub fn save(&self, key: &SelectionKey) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!(path = %self.path.display(), error = %e, "Could not create state directory");
                return;
            }
        }
        let json = match serde_json::to_string(key) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!(error = %e, "Could not serialize selection state");
                return;
            }
        };
        if let Err(e) = std::fs::write(&self.path, json) {
            tracing::warn!(path = %self.path.display(), error = %e, "Could not write selection state");
        }
    }
}
