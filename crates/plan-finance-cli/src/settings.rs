//! Runtime settings for `bpf`.
//!
//! Read from an optional `bpf.toml` / `bpf.yaml` / `bpf.json` in the working
//! directory (or the file given with `--config`), then overridden by
//! `BPF__SECTION__KEY` environment variables.
use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use plan_finance_core::EngineConfig;
use serde::Deserialize;

const DEFAULT_SETTINGS_NAME: &str = "bpf";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Filter level for the `tracing` subscriber (error, warn, info, debug, trace)
    pub level: String,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Store {
    /// Directory holding one `<project_id>.json` per analysis
    pub dir: PathBuf,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("analyses"),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub log: Log,
    pub engine: EngineConfig,
    pub store: Store,
}

impl Settings {
    /// Load settings. An explicit `path` must exist; the default file is
    /// optional.
    pub fn new(path: Option<&str>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(p) => File::with_name(p),
            None => File::with_name(DEFAULT_SETTINGS_NAME).required(false),
        };
        let settings = Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix("BPF").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
