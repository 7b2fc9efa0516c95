//! `monalisa.toml` -- where the CLI keeps its data and how it reaches
//! verifiers.
//!
//! # Example
//!
//! ```toml
//! [store]
//! path = "monalisa-data.json"
//!
//! [blob]
//! root = "documents"
//! public_base_url = "https://files.bapas.example.go.id"
//!
//! [notifier]
//! webhook_url = "https://wa-gateway.example.com/send"
//! auth_token = "..."
//! timeout_secs = 10
//!
//! [workflow]
//! notify_on_resubmission = false
//! utc_offset_hours = 7
//! ```
//!
//! Relative paths resolve against the directory holding the config file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use monalisa_workflow::WorkflowConfig;

// ── Types ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonalisaConfig {
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub blob: BlobSettings,
    #[serde(default)]
    pub notifier: NotifierSettings,
    #[serde(default)]
    pub workflow: WorkflowSettings,
}

/// `[store]` -- the JSON document holding every table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

/// `[blob]` -- uploaded documents live under `root/<bucket>/<path>`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlobSettings {
    #[serde(default = "default_blob_root")]
    pub root: PathBuf,
    /// When set, document URLs are `<public_base_url>/<bucket>/<path>`
    /// instead of `file://` URLs.
    #[serde(default)]
    pub public_base_url: Option<String>,
}

/// `[notifier]` -- WhatsApp gateway webhook. Without a URL every send fails
/// as "not configured", which the workflow reports but tolerates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotifierSettings {
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub auth_token: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSettings {
    #[serde(default)]
    pub notify_on_resubmission: bool,
    /// Local offset used for timestamps and "today" in the slot check.
    #[serde(default)]
    pub utc_offset_hours: i8,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("monalisa-data.json")
}

fn default_blob_root() -> PathBuf {
    PathBuf::from("documents")
}

fn default_timeout_secs() -> u64 {
    10
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            path: default_store_path(),
        }
    }
}

impl Default for BlobSettings {
    fn default() -> Self {
        BlobSettings {
            root: default_blob_root(),
            public_base_url: None,
        }
    }
}

impl Default for NotifierSettings {
    fn default() -> Self {
        NotifierSettings {
            webhook_url: None,
            auth_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl WorkflowSettings {
    pub fn workflow_config(&self) -> WorkflowConfig {
        WorkflowConfig {
            notify_on_resubmission: self.notify_on_resubmission,
        }
    }
}

// ── Functions ─────────────────────────────────────────────────────────────────

/// Read and parse the config at `path`, resolving relative paths against
/// its directory. A missing file yields the defaults.
pub fn read_config(path: &Path) -> Result<MonalisaConfig, String> {
    let mut config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .map_err(|e| format!("could not read '{}': {}", path.display(), e))?;
        toml::from_str(&content)
            .map_err(|e| format!("could not parse '{}': {}", path.display(), e))?
    } else {
        MonalisaConfig::default()
    };

    let base = path.parent().unwrap_or_else(|| Path::new(""));
    config.store.path = base.join(&config.store.path);
    config.blob.root = base.join(&config.blob.root);
    Ok(config)
}

/// Contents written by `monalisa init`.
pub fn render_default_config() -> Result<String, String> {
    toml::to_string_pretty(&MonalisaConfig::default())
        .map_err(|e| format!("could not render default config: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_sections_take_defaults() {
        let config: MonalisaConfig = toml::from_str(
            r#"
            [notifier]
            webhook_url = "https://gateway.test/send"
            "#,
        )
        .unwrap();
        assert_eq!(config.store.path, PathBuf::from("monalisa-data.json"));
        assert_eq!(config.blob.root, PathBuf::from("documents"));
        assert_eq!(
            config.notifier.webhook_url.as_deref(),
            Some("https://gateway.test/send")
        );
        assert_eq!(config.notifier.timeout_secs, 10);
        assert!(!config.workflow.workflow_config().notify_on_resubmission);
    }

    #[test]
    fn relative_paths_follow_the_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monalisa.toml");
        std::fs::write(
            &path,
            "[store]\npath = \"data/state.json\"\n\n[workflow]\nnotify_on_resubmission = true\n",
        )
        .unwrap();

        let config = read_config(&path).unwrap();
        assert_eq!(config.store.path, dir.path().join("data/state.json"));
        assert_eq!(config.blob.root, dir.path().join("documents"));
        assert!(config.workflow.notify_on_resubmission);
    }

    #[test]
    fn default_config_round_trips_through_toml() {
        let rendered = render_default_config().unwrap();
        let parsed: MonalisaConfig = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, MonalisaConfig::default());
    }

    #[test]
    fn malformed_config_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("monalisa.toml");
        std::fs::write(&path, "[store\npath = 1").unwrap();
        let err = read_config(&path).unwrap_err();
        assert!(err.contains("could not parse"));
        assert!(err.contains("monalisa.toml"));
    }
}
